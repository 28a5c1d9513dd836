//! Declarative Dokku resources
//!
//! Each resource kind (app, config, port, storage, ...) is a serde model
//! plus a [`Controller`] with Create/Read/Update/Delete operations against
//! a [`dokkuflow_client::Remote`]. The [`Engine`] diffs declared resources
//! against the tracked [`GlobalState`] and drives the controllers.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │                  dokkuflow CLI                   │
//! │           (plan / apply / destroy)               │
//! └─────────────────┬───────────────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────────────┐
//! │              dokkuflow-resource                  │
//! │  ┌──────────────┐  ┌──────────────┐             │
//! │  │    Engine    │  │  State Mgmt  │             │
//! │  └──────┬───────┘  └──────────────┘             │
//! │  ┌──────▼───────────────────────────────────┐   │
//! │  │   AnyResource → trait Controller { .. }  │   │
//! │  └──────────────────────────────────────────┘   │
//! └─────────────────┬───────────────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────────────┐
//! │   dokkuflow-client (adapters, invoker)          │
//! └─────────────────────────────────────────────────┘
//! ```
//!
//! Controllers never return errors; failures are [`Diagnostics`], and an
//! operation that records an error commits nothing.

pub mod any;
pub mod controller;
pub mod diagnostics;
pub mod engine;
pub mod error;
pub mod plan;
pub mod resources;
pub mod state;
pub mod upload;
pub mod validate;

// Re-exports
pub use any::{AnyResource, Tier};
pub use controller::{Context, Controller, Model};
pub use diagnostics::{AttributePath, Diagnostic, DiagnosticKind, Diagnostics, Severity};
pub use engine::Engine;
pub use error::{ResourceError, Result};
pub use plan::{Action, ActionResult, ActionType, ApplyResult, Plan, PlanSummary};
pub use state::{GlobalState, ResourceState, StateLock, StateManager};
pub use upload::UploadSettings;
