//! Engine error types
//!
//! Controller failures are reported as diagnostics; these errors cover the
//! engine around them (state file, plan construction, uploads).

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ResourceError {
    #[error("Duplicate resource in manifest: {0}")]
    DuplicateResource(String),

    #[error("State file error: {0}")]
    StateError(String),

    #[error("Lock acquisition failed: {0}")]
    LockError(String),

    #[error("Upload failed: {0}")]
    Upload(String),

    #[error(transparent)]
    Client(#[from] dokkuflow_client::ClientError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ResourceError>;
