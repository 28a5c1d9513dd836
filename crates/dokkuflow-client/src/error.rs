//! Client error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    /// The remote reported the target absent through a known sentinel
    #[error("{0} does not exist")]
    NotFound(String),

    #[error("{0} already exists")]
    AlreadyExists(String),

    /// Non-zero exit status; `output` is already redacted
    #[error("Error [{status}]: {output}")]
    Remote { status: i32, output: String },

    #[error("transport error: {0}")]
    Transport(#[from] dokkuflow_ssh::SshError),

    #[error("operation cancelled")]
    Cancelled,

    #[error(
        "dokku {found} is outside the tested range {tested}; set fail_on_untested_version = false to continue anyway"
    )]
    UnsupportedVersion { found: String, tested: String },

    #[error(
        "the remote shell could not run `dokku` (exit status 127); check that ssh_user is the dokku user"
    )]
    MisconfiguredShell,

    #[error("unexpected output from `{command}`: {message}")]
    Parse { command: String, message: String },
}

impl ClientError {
    pub fn parse(command: impl Into<String>, message: impl Into<String>) -> Self {
        ClientError::Parse {
            command: command.into(),
            message: message.into(),
        }
    }

    /// Exit status for remote failures
    pub fn status(&self) -> Option<i32> {
        match self {
            ClientError::Remote { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Captured (redacted) output for remote failures
    pub fn output(&self) -> Option<&str> {
        match self {
            ClientError::Remote { output, .. } => Some(output),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ClientError::NotFound(_))
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, ClientError::Cancelled)
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
