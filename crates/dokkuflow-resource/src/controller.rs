//! Resource controller contract
//!
//! A resource kind is a plain data model ([`Model`]) plus the four
//! lifecycle operations ([`Controller`]). The generic drivers at the bottom
//! of this module wrap every operation with the steps shared by all kinds:
//! validation before create/update, the immutability check before update,
//! and logging.

use crate::diagnostics::{AttributePath, Diagnostic, DiagnosticKind, Diagnostics};
use crate::upload::UploadSettings;
use async_trait::async_trait;
use dokkuflow_client::{ClientError, DokkuClient, Remote};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt::Debug;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Shared handles for one apply
#[derive(Clone)]
pub struct Context {
    client: Arc<DokkuClient>,
    cancel: CancellationToken,
    upload: UploadSettings,
}

impl Context {
    pub fn new(client: Arc<DokkuClient>, cancel: CancellationToken) -> Self {
        Self {
            client,
            cancel,
            upload: UploadSettings::default(),
        }
    }

    pub fn with_upload(mut self, upload: UploadSettings) -> Self {
        self.upload = upload;
        self
    }

    pub fn client(&self) -> &Arc<DokkuClient> {
        &self.client
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn upload(&self) -> &UploadSettings {
        &self.upload
    }

    pub fn remote(&self) -> Remote<'_> {
        self.client.remote(&self.cancel)
    }
}

/// Declared attributes of one resource kind
pub trait Model:
    Clone + Debug + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// State key prefix (`app`, `config`, ...)
    const KIND: &'static str;

    /// Identity tuple rendered as a string, unique within the kind
    fn identity(&self) -> String;

    /// Cheap local checks; no remote calls
    fn validate(&self, diags: &mut Diagnostics);

    /// Immutable attributes that differ between `self` (prior) and `planned`
    fn immutable_changes(&self, planned: &Self) -> Vec<AttributePath>;

    /// Full state key
    fn key(&self) -> String {
        format!("{}:{}", Self::KIND, self.identity())
    }
}

/// Create/Read/Update/Delete against the remote
///
/// Operations record failures in `diags` instead of returning errors.
#[async_trait]
pub trait Controller: Model {
    /// Realize `self` (the plan); `None` when nothing may be committed
    async fn create(&self, ctx: &Context, diags: &mut Diagnostics) -> Option<Self>;

    /// Refresh `self` (the tracked state); `None` drops it from state
    async fn read(&self, ctx: &Context, diags: &mut Diagnostics) -> Option<Self>;

    /// Move from `prior` to `self` (the plan); immutables are already equal
    async fn update(&self, prior: &Self, ctx: &Context, diags: &mut Diagnostics) -> Option<Self>;

    /// Remove `self`; absent targets succeed silently
    async fn delete(&self, ctx: &Context, diags: &mut Diagnostics);
}

/// Record a changed immutable field
pub fn changed<T: PartialEq>(out: &mut Vec<AttributePath>, attr: &str, prior: &T, planned: &T) {
    if prior != planned {
        out.push(AttributePath::root(attr));
    }
}

/// Record a client error on an optional attribute
pub fn fail(diags: &mut Diagnostics, err: &ClientError, path: Option<&str>) {
    diags.client_error(err, path.map(AttributePath::root));
}

/// `already_exists` on the identity attribute
pub fn already_exists(diags: &mut Diagnostics, path: &str, what: impl std::fmt::Display) {
    diags.push(
        Diagnostic::error(DiagnosticKind::AlreadyExists, "Resource already exists")
            .with_detail(format!("{} already exists", what))
            .at(path),
    );
}

/// `precondition_failed` for an absent target
pub fn not_found(diags: &mut Diagnostics, path: &str, detail: impl Into<String>) {
    diags.push(
        Diagnostic::error(DiagnosticKind::NotFound, "Precondition failed")
            .with_detail(detail)
            .at(path),
    );
}

pub async fn create<R: Controller>(ctx: &Context, plan: &R) -> (Option<R>, Diagnostics) {
    let mut diags = Diagnostics::new();
    plan.validate(&mut diags);
    if diags.has_errors() {
        return (None, diags);
    }

    tracing::debug!(resource = %plan.key(), "Creating");
    let state = plan.create(ctx, &mut diags).await;
    if diags.has_errors() {
        return (None, diags);
    }
    (state, diags)
}

pub async fn read<R: Controller>(ctx: &Context, state: &R) -> (Option<R>, Diagnostics) {
    let mut diags = Diagnostics::new();
    tracing::debug!(resource = %state.key(), "Reading");
    let refreshed = state.read(ctx, &mut diags).await;
    if refreshed.is_none() && !diags.has_errors() {
        tracing::info!(resource = %state.key(), "Resource is gone from the remote");
    }
    (refreshed, diags)
}

pub async fn update<R: Controller>(ctx: &Context, prior: &R, plan: &R) -> (Option<R>, Diagnostics) {
    let mut diags = Diagnostics::new();
    plan.validate(&mut diags);

    for path in prior.immutable_changes(plan) {
        diags.push(
            Diagnostic::error(DiagnosticKind::ImmutableFieldChanged, "Immutable field changed")
                .with_detail(format!(
                    "{} cannot be changed in place; replace the resource instead",
                    path
                ))
                .at(path),
        );
    }
    if diags.has_errors() {
        return (None, diags);
    }

    tracing::debug!(resource = %plan.key(), "Updating");
    let state = plan.update(prior, ctx, &mut diags).await;
    if diags.has_errors() {
        return (None, diags);
    }
    (state, diags)
}

pub async fn delete<R: Controller>(ctx: &Context, state: &R) -> Diagnostics {
    let mut diags = Diagnostics::new();
    tracing::debug!(resource = %state.key(), "Deleting");
    state.delete(ctx, &mut diags).await;
    diags
}
