//! Serialized command invoker
//!
//! Every remote command goes through one [`Invoker`]. It holds a mutex for
//! the whole call because Dokku's command surface is not safe under
//! concurrent mutation of the same subject, redacts secrets before anything
//! is logged or returned, and turns non-zero exit statuses into
//! [`ClientError::Remote`].

use crate::command::Invocation;
use crate::error::{ClientError, Result};
use crate::secret::redact;
use dokkuflow_ssh::{CommandOutput, SshError, Transport};
use regex::Regex;
use std::sync::{Arc, LazyLock};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

static EXIT_STATUS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^Process exited with status ([0-9]+)$").expect("static regex")
});

/// Successful command result
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Output {
    /// Redacted stdout without its trailing newline
    pub stdout: String,
    pub status: i32,
}

impl Output {
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.stdout.lines()
    }
}

/// Process-wide serialization point for remote commands
pub struct Invoker {
    transport: Arc<dyn Transport>,
    lock: Mutex<()>,
    log_commands: bool,
}

impl Invoker {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            lock: Mutex::new(()),
            log_commands: false,
        }
    }

    /// Log every command at ERROR level (audit mode)
    pub fn with_command_logging(mut self, enabled: bool) -> Self {
        self.log_commands = enabled;
        self
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    /// Run one command
    ///
    /// A cancellation observed before the lock is taken returns without
    /// taking it. A cancellation while the command is in flight drops the
    /// transport future, which aborts the remote command.
    pub async fn invoke(
        &self,
        invocation: &Invocation,
        cancel: &CancellationToken,
    ) -> Result<Output> {
        if cancel.is_cancelled() {
            return Err(ClientError::Cancelled);
        }

        let _guard = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(ClientError::Cancelled),
            guard = self.lock.lock() => guard,
        };

        let command = invocation.render();
        let secrets = invocation.secrets();
        let logged = redact(&command, secrets);
        self.log_command(&logged);

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::warn!(command = %logged, "Cancelled in-flight dokku command");
                return Err(ClientError::Cancelled);
            }
            result = self.transport.exec(&command) => result,
        };

        let output = match result {
            Ok(output) => output,
            Err(SshError::Remote(message)) => {
                let message = redact(&message, secrets);
                return match exit_status_from_message(&message) {
                    Some(status) => Err(ClientError::Remote {
                        status,
                        output: String::new(),
                    }),
                    None => Err(ClientError::Transport(SshError::Remote(message))),
                };
            }
            Err(e) => {
                let e = e.map_message(|m| redact(m, secrets));
                if e.is_connection_error() {
                    tracing::warn!(error = %e, "Cannot reach the dokku host");
                } else {
                    tracing::debug!(command = %logged, error = %e, "Transport failure");
                }
                return Err(ClientError::Transport(e));
            }
        };

        finish(&logged, output, secrets)
    }

    /// Run a command while streaming `lines` into its stdin
    ///
    /// The lock is held until the remote command exits. Lines are not
    /// logged individually.
    pub async fn invoke_interactive(
        &self,
        invocation: &Invocation,
        lines: &[String],
        cancel: &CancellationToken,
    ) -> Result<Output> {
        if cancel.is_cancelled() {
            return Err(ClientError::Cancelled);
        }

        let _guard = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(ClientError::Cancelled),
            guard = self.lock.lock() => guard,
        };

        let command = invocation.render();
        let secrets = invocation.secrets();
        let logged = redact(&command, secrets);
        self.log_command(&logged);
        tracing::debug!(command = %logged, lines = lines.len(), "Opening interactive session");

        let transport_error = |e: SshError| {
            let e = e.map_message(|m| redact(m, secrets));
            tracing::debug!(command = %logged, error = %e, "Interactive session failed");
            ClientError::Transport(e)
        };

        let mut session = self
            .transport
            .open_session(&command)
            .await
            .map_err(transport_error)?;
        for line in lines {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tracing::warn!(command = %logged, "Cancelled interactive session");
                    return Err(ClientError::Cancelled);
                }
                sent = session.send_line(line) => sent.map_err(transport_error)?,
            }
        }

        let output = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(ClientError::Cancelled),
            output = session.finish() => output.map_err(transport_error)?,
        };

        finish(&logged, output, secrets)
    }

    fn log_command(&self, logged: &str) {
        if self.log_commands {
            tracing::error!(command = %logged, "dokku command");
        } else {
            tracing::debug!(command = %logged, "dokku command");
        }
    }
}

fn finish(logged: &str, output: CommandOutput, secrets: &[String]) -> Result<Output> {
    let stdout = redact(trim_newline(&output.stdout), secrets);

    tracing::debug!(
        command = %logged,
        status = output.exit_status,
        bytes = stdout.len(),
        "dokku command finished"
    );

    if output.exit_status != 0 {
        return Err(ClientError::Remote {
            status: output.exit_status,
            output: stdout,
        });
    }

    Ok(Output {
        stdout,
        status: output.exit_status,
    })
}

/// Extract `N` from `Process exited with status N`
pub fn exit_status_from_message(message: &str) -> Option<i32> {
    EXIT_STATUS_RE
        .captures(message.trim())
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

fn trim_newline(text: &str) -> &str {
    text.strip_suffix("\r\n")
        .or_else(|| text.strip_suffix('\n'))
        .unwrap_or(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeTransport, Reply};
    use std::time::Duration;

    fn invoker(fake: &Arc<FakeTransport>) -> Invoker {
        Invoker::new(fake.clone())
    }

    #[test]
    fn test_exit_status_from_message() {
        assert_eq!(exit_status_from_message("Process exited with status 1"), Some(1));
        assert_eq!(
            exit_status_from_message("Process exited with status 127\n"),
            Some(127)
        );
        assert_eq!(exit_status_from_message("connection reset"), None);
        assert_eq!(
            exit_status_from_message("oops: Process exited with status 2"),
            None
        );
    }

    #[tokio::test]
    async fn test_quiet_flag_and_trailing_newline() {
        let fake = Arc::new(FakeTransport::new());
        fake.on("apps:list", Reply::ok("=====> My Apps\nweb\n"));

        let output = invoker(&fake)
            .invoke(&Invocation::new("apps:list"), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(output.stdout, "=====> My Apps\nweb");
        assert_eq!(fake.raw_commands(), vec!["--quiet apps:list".to_string()]);
    }

    #[tokio::test]
    async fn test_non_zero_exit_is_remote_error() {
        let fake = Arc::new(FakeTransport::new());
        fake.on("apps:create web", Reply::fail(" !     Name is already taken\n", 1));

        let err = invoker(&fake)
            .invoke(
                &Invocation::new("apps:create").arg("web"),
                &CancellationToken::new(),
            )
            .await
            .unwrap_err();

        assert_eq!(err.status(), Some(1));
        assert_eq!(err.to_string(), "Error [1]:  !     Name is already taken");
    }

    #[tokio::test]
    async fn test_secrets_redacted_in_output_and_error() {
        let fake = Arc::new(FakeTransport::new());
        fake.on(
            "registry:login",
            Reply::fail("login failed for bot:tok3n-value\n", 1),
        );

        let cmd = Invocation::new("registry:login")
            .arg("ghcr.io")
            .arg("bot")
            .secret_arg("tok3n-value");
        let err = invoker(&fake)
            .invoke(&cmd, &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(!err.to_string().contains("tok3n-value"));
        assert!(err.to_string().contains("*******"));
    }

    #[tokio::test]
    async fn test_secrets_redacted_in_transport_error() {
        let fake = Arc::new(FakeTransport::new());
        fake.on(
            "registry:login",
            Reply::unreachable("registry login bot tok3n-value rejected"),
        );

        let cmd = Invocation::new("registry:login")
            .arg("ghcr.io")
            .arg("bot")
            .secret_arg("tok3n-value");
        let err = invoker(&fake)
            .invoke(&cmd, &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, ClientError::Transport(_)));
        assert!(!err.to_string().contains("tok3n-value"));
        assert!(err.to_string().contains("*******"));
    }

    #[tokio::test]
    async fn test_secrets_redacted_in_interactive_failure() {
        let fake = Arc::new(FakeTransport::new());
        fake.on("enter", Reply::unreachable("session for s3cret-line dropped"));

        let err = invoker(&fake)
            .invoke_interactive(
                &Invocation::new("enter").arg("helper").secret_arg("s3cret-line"),
                &["exit".to_string()],
                &CancellationToken::new(),
            )
            .await
            .unwrap_err();

        assert!(!err.to_string().contains("s3cret-line"));
    }

    #[tokio::test]
    async fn test_message_only_failure() {
        let fake = Arc::new(FakeTransport::new());
        fake.on(
            "version",
            Reply::message("Process exited with status 127"),
        );

        let err = invoker(&fake)
            .invoke(&Invocation::new("version").loud(), &CancellationToken::new())
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(127));
    }

    #[tokio::test]
    async fn test_cancelled_before_lock_runs_nothing() {
        let fake = Arc::new(FakeTransport::new());
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = invoker(&fake)
            .invoke(&Invocation::new("apps:list"), &cancel)
            .await
            .unwrap_err();

        assert!(err.is_cancelled());
        assert!(fake.commands().is_empty());
    }

    #[tokio::test]
    async fn test_cancel_in_flight() {
        let fake = Arc::new(FakeTransport::new());
        fake.on("ps:rebuild", Reply::Hang);
        let invoker = Arc::new(invoker(&fake));
        let cancel = CancellationToken::new();

        let task = {
            let invoker = invoker.clone();
            let cancel = cancel.clone();
            tokio::spawn(async move {
                invoker
                    .invoke(&Invocation::new("ps:rebuild").arg("web"), &cancel)
                    .await
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        cancel.cancel();
        let err = task.await.unwrap().unwrap_err();
        assert!(err.is_cancelled());

        // The lock was released: the next command runs normally
        invoker
            .invoke(&Invocation::new("apps:list"), &CancellationToken::new())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_commands_are_serialized() {
        let fake = Arc::new(FakeTransport::new().with_delay(Duration::from_millis(5)));
        let invoker = Arc::new(invoker(&fake));

        let mut handles = Vec::new();
        for i in 0..8 {
            let invoker = invoker.clone();
            handles.push(tokio::spawn(async move {
                invoker
                    .invoke(
                        &Invocation::new("apps:exists").arg(format!("app-{}", i)),
                        &CancellationToken::new(),
                    )
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(fake.commands().len(), 8);
        assert_eq!(fake.max_concurrency(), 1);
    }

    #[tokio::test]
    async fn test_interactive_session_streams_lines() {
        let fake = Arc::new(FakeTransport::new());
        let lines = vec!["echo -n 'abc' >> /tmp/x".to_string(), "exit".to_string()];

        invoker(&fake)
            .invoke_interactive(
                &Invocation::new("enter").arg("helper").arg("web"),
                &lines,
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        assert_eq!(fake.session_lines(), lines);
        assert_eq!(fake.commands(), vec!["enter helper web".to_string()]);
    }
}
