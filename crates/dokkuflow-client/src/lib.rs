//! Dokku command client
//!
//! Typed access to the Dokku command shell over a [`Transport`]:
//!
//! - [`Invoker`]: serializes every command, redacts secrets, maps exit
//!   statuses to [`ClientError::Remote`]
//! - [`Capabilities`]: version probe run once per client
//! - [`adapter`]: one typed adapter per command namespace
//! - [`report`]: parsers for the `Key: value` report format
//!
//! ```ignore
//! let client = DokkuClient::new(Arc::new(transport), ClientOptions::default());
//! let cancel = CancellationToken::new();
//! let remote = client.remote(&cancel);
//! if !remote.apps().exists("web").await? {
//!     remote.apps().create("web").await?;
//! }
//! ```
//!
//! [`Transport`]: dokkuflow_ssh::Transport

pub mod adapter;
pub mod capability;
pub mod client;
pub mod command;
pub mod error;
pub mod invoker;
pub mod report;
pub mod secret;
pub mod sentinel;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use adapter::{
    ArchiveType, ChecksStatus, DeploySourceReport, DomainsReport, GlobalDomainsReport,
    HttpAuthReport, NetworkProperty, NginxScope, Phase, PluginInfo, PortMapping, ProxyReport,
    STORAGE_ROOT, ServiceKind, StorageMount,
};
pub use capability::Capabilities;
pub use client::{ClientOptions, DokkuClient, Remote};
pub use command::Invocation;
pub use error::{ClientError, Result};
pub use invoker::{Invoker, Output};
pub use report::Report;
pub use secret::REDACTED;
