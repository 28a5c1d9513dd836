//! Transport trait definition

use crate::error::Result;
use async_trait::async_trait;

/// Captured result of one remote command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_status: i32,
}

impl CommandOutput {
    pub fn new(stdout: impl Into<String>, exit_status: i32) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: String::new(),
            exit_status,
        }
    }

    pub fn success(&self) -> bool {
        self.exit_status == 0
    }
}

/// Remote command execution
///
/// Implementations own connection handling and per-command timeouts.
/// Dropping a pending `exec` future must abort the remote command.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Run one command and wait for it to finish
    ///
    /// A non-zero exit status is not an error at this level; errors are
    /// reserved for failures to reach the remote command at all.
    async fn exec(&self, command: &str) -> Result<CommandOutput>;

    /// Start a long-running command and stream lines into its stdin
    async fn open_session(&self, command: &str) -> Result<Box<dyn InteractiveSession>>;
}

/// Stdin stream of a running remote command
#[async_trait]
pub trait InteractiveSession: Send {
    /// Write one line (a trailing newline is added)
    async fn send_line(&mut self, line: &str) -> Result<()>;

    /// Close stdin and wait for the command to exit
    async fn finish(self: Box<Self>) -> Result<CommandOutput>;
}
