//! Resource kinds
//!
//! One module per kind. Each defines the model struct and implements
//! [`Model`](crate::controller::Model) and
//! [`Controller`](crate::controller::Controller) for it.

pub mod app;
pub mod checks;
pub mod config;
pub mod deploy;
pub mod docker_option;
pub mod domain;
pub mod git_auth;
pub mod global_domain;
pub mod http_auth;
pub mod letsencrypt;
pub mod network;
pub mod nginx;
pub mod plugin;
pub mod port;
pub mod proxy;
pub mod registry;
pub mod service;
pub mod service_link;
pub mod storage;

pub use app::App;
pub use checks::Checks;
pub use config::Config;
pub use deploy::{Deploy, DeploySource};
pub use docker_option::DockerOption;
pub use domain::Domain;
pub use git_auth::GitAuth;
pub use global_domain::GlobalDomain;
pub use http_auth::HttpAuth;
pub use letsencrypt::Letsencrypt;
pub use network::{Network, NetworkType};
pub use nginx::Nginx;
pub use plugin::Plugin;
pub use port::Port;
pub use proxy::Proxy;
pub use registry::Registry;
pub use service::Service;
pub use service_link::ServiceLink;
pub use storage::Storage;

use crate::diagnostics::Diagnostics;
use dokkuflow_client::ClientError;

/// Result of a refresh probe
pub(crate) enum Probe<T> {
    Found(T),
    /// The subject (or the app it belongs to) is gone
    Gone,
    /// The probe failed; keep the tracked state
    Failed,
}

pub(crate) fn probe<T>(result: Result<T, ClientError>, diags: &mut Diagnostics) -> Probe<T> {
    match result {
        Ok(value) => Probe::Found(value),
        Err(e) if e.is_not_found() => Probe::Gone,
        Err(e) => {
            diags.client_error(&e, None);
            Probe::Failed
        }
    }
}

/// Unwrap a client result, recording the error on `path`
pub(crate) fn ok_or_record<T>(
    result: Result<T, ClientError>,
    diags: &mut Diagnostics,
    path: Option<&str>,
) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            crate::controller::fail(diags, &e, path);
            None
        }
    }
}

/// Delete-side probe: absent subjects count as already deleted
pub(crate) fn present_or_gone<T>(
    result: Result<T, ClientError>,
    diags: &mut Diagnostics,
) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) if e.is_not_found() => None,
        Err(e) => {
            diags.client_error(&e, None);
            None
        }
    }
}
