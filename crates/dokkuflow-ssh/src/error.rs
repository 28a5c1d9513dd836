//! SSH transport error types

use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SshError {
    #[error("ssh not found. Please install the OpenSSH client")]
    SshNotFound,

    #[error("ssh connection failed: {0}")]
    ConnectionFailed(String),

    #[error("invalid ssh key: {0}")]
    InvalidKey(String),

    #[error("environment variable {0} is not set")]
    MissingEnvVar(String),

    /// A failure reported only as a message, e.g. `Process exited with status 1`
    #[error("{0}")]
    Remote(String),

    #[error("command timed out after {0:?}")]
    Timeout(Duration),

    #[error("interactive session closed: {0}")]
    SessionClosed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SshError {
    /// Whether the error happened before the remote command could run
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            SshError::SshNotFound | SshError::ConnectionFailed(_) | SshError::InvalidKey(_)
        )
    }

    /// Rewrite every message carried by the error; `Io` keeps its kind
    pub fn map_message(self, f: impl Fn(&str) -> String) -> Self {
        match self {
            SshError::ConnectionFailed(m) => SshError::ConnectionFailed(f(&m)),
            SshError::InvalidKey(m) => SshError::InvalidKey(f(&m)),
            SshError::Remote(m) => SshError::Remote(f(&m)),
            SshError::SessionClosed(m) => SshError::SessionClosed(f(&m)),
            SshError::Io(e) => SshError::Io(std::io::Error::new(e.kind(), f(&e.to_string()))),
            other => other,
        }
    }
}

pub type Result<T> = std::result::Result<T, SshError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_message_rewrites_text() {
        let err = SshError::ConnectionFailed("login bot hunter2".into())
            .map_message(|m| m.replace("hunter2", "***"));
        assert_eq!(err.to_string(), "ssh connection failed: login bot ***");
        assert!(err.is_connection_error());

        let err = SshError::Timeout(Duration::from_secs(3)).map_message(|_| String::new());
        assert!(matches!(err, SshError::Timeout(_)));
    }
}
