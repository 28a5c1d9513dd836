//! Transport backed by the system `ssh` binary

use crate::error::{Result, SshError};
use crate::key::{HostKeyPolicy, KeySource, SshConfig};
use crate::transport::{CommandOutput, InteractiveSession, Transport};
use async_trait::async_trait;
use std::io::Write;
use std::path::PathBuf;
use std::process::Stdio;
use tempfile::NamedTempFile;
use tokio::io::AsyncWriteExt;
use tokio::process::{Child, ChildStdin, Command};

/// ssh reserves exit status 255 for its own failures
const SSH_FAILURE_STATUS: i32 = 255;

enum Materialized {
    Path(PathBuf),
    Temp(NamedTempFile),
}

impl Materialized {
    fn path(&self) -> PathBuf {
        match self {
            Materialized::Path(path) => path.clone(),
            Materialized::Temp(file) => file.path().to_path_buf(),
        }
    }
}

/// Runs commands through `ssh user@host -- <command>`
///
/// In-memory key material and pinned host keys are written to private
/// temporary files that live as long as the transport.
pub struct SshTransport {
    config: SshConfig,
    identity: Materialized,
    known_hosts: Option<Materialized>,
}

impl SshTransport {
    pub fn new(config: SshConfig) -> Result<Self> {
        let identity = match &config.key {
            KeySource::File(path) => {
                if !path.exists() {
                    return Err(SshError::InvalidKey(format!(
                        "key file {} does not exist",
                        path.display()
                    )));
                }
                Materialized::Path(path.clone())
            }
            KeySource::Inline(pem) => Materialized::Temp(write_private_file("key", pem)?),
        };

        let known_hosts = match &config.host_key {
            HostKeyPolicy::KnownHosts(path) => Some(Materialized::Path(path.clone())),
            HostKeyPolicy::Pinned(key) => {
                let line = format!("{} {}\n", config.known_hosts_pattern(), key.trim());
                Some(Materialized::Temp(write_private_file("known-hosts", &line)?))
            }
            HostKeyPolicy::Insecure => None,
        };

        tracing::debug!(
            host = %config.host,
            port = config.port,
            user = %config.user,
            "Configured ssh transport"
        );

        Ok(Self {
            config,
            identity,
            known_hosts,
        })
    }

    /// ssh arguments preceding the remote command
    pub fn ssh_args(&self) -> Vec<String> {
        let mut args = vec![
            "-T".to_string(),
            "-p".to_string(),
            self.config.port.to_string(),
            "-i".to_string(),
            self.identity.path().display().to_string(),
            "-o".to_string(),
            "BatchMode=yes".to_string(),
            "-o".to_string(),
            "IdentitiesOnly=yes".to_string(),
            "-o".to_string(),
            format!("ConnectTimeout={}", self.config.connect_timeout.as_secs()),
            "-o".to_string(),
            "LogLevel=ERROR".to_string(),
        ];

        match &self.known_hosts {
            Some(file) => {
                args.push("-o".to_string());
                args.push("StrictHostKeyChecking=yes".to_string());
                args.push("-o".to_string());
                args.push(format!("UserKnownHostsFile={}", file.path().display()));
            }
            None => {
                args.push("-o".to_string());
                args.push("StrictHostKeyChecking=no".to_string());
                args.push("-o".to_string());
                args.push("UserKnownHostsFile=/dev/null".to_string());
            }
        }

        args.push(self.config.destination());
        args.push("--".to_string());
        args
    }

    fn command(&self, remote: &str) -> Command {
        let mut cmd = Command::new(&self.config.program);
        cmd.args(self.ssh_args());
        cmd.arg(remote);
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        cmd.kill_on_drop(true);
        cmd
    }

    fn spawn(&self, mut cmd: Command) -> Result<Child> {
        cmd.spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                SshError::SshNotFound
            } else {
                SshError::Io(e)
            }
        })
    }
}

#[async_trait]
impl Transport for SshTransport {
    async fn exec(&self, command: &str) -> Result<CommandOutput> {
        let mut cmd = self.command(command);
        cmd.stdin(Stdio::null());
        let child = self.spawn(cmd)?;

        let output = match self.config.command_timeout {
            Some(limit) => tokio::time::timeout(limit, child.wait_with_output())
                .await
                .map_err(|_| SshError::Timeout(limit))??,
            None => child.wait_with_output().await?,
        };

        collect_output(output)
    }

    async fn open_session(&self, command: &str) -> Result<Box<dyn InteractiveSession>> {
        let mut cmd = self.command(command);
        cmd.stdin(Stdio::piped());
        let mut child = self.spawn(cmd)?;
        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| SshError::SessionClosed("stdin unavailable".to_string()))?;

        Ok(Box::new(SshSession {
            child,
            stdin: Some(stdin),
        }))
    }
}

struct SshSession {
    child: Child,
    stdin: Option<ChildStdin>,
}

#[async_trait]
impl InteractiveSession for SshSession {
    async fn send_line(&mut self, line: &str) -> Result<()> {
        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| SshError::SessionClosed("stdin already closed".to_string()))?;

        stdin
            .write_all(format!("{}\n", line).as_bytes())
            .await
            .map_err(|e| SshError::SessionClosed(e.to_string()))?;
        stdin
            .flush()
            .await
            .map_err(|e| SshError::SessionClosed(e.to_string()))?;
        Ok(())
    }

    async fn finish(mut self: Box<Self>) -> Result<CommandOutput> {
        // EOF on stdin ends the remote shell
        drop(self.stdin.take());
        let output = self.child.wait_with_output().await?;
        collect_output(output)
    }
}

fn collect_output(output: std::process::Output) -> Result<CommandOutput> {
    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let exit_status = output.status.code().unwrap_or(-1);

    if exit_status == SSH_FAILURE_STATUS {
        return Err(SshError::ConnectionFailed(stderr.trim().to_string()));
    }

    // Dokku writes its error messages to stderr; callers read one stream
    let stdout = if exit_status != 0 && !stderr.trim().is_empty() {
        if stdout.is_empty() {
            stderr.clone()
        } else {
            format!("{}\n{}", stdout.trim_end_matches('\n'), stderr)
        }
    } else {
        stdout
    };

    Ok(CommandOutput {
        stdout,
        stderr,
        exit_status,
    })
}

fn write_private_file(kind: &str, content: &str) -> Result<NamedTempFile> {
    let mut file = tempfile::Builder::new()
        .prefix(&format!("dokkuflow-{}-", kind))
        .tempfile()?;
    file.write_all(content.as_bytes())?;
    file.flush()?;
    Ok(file)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inline_config() -> SshConfig {
        SshConfig::new("dokku.example.com")
            .with_key(KeySource::Inline("-----BEGIN KEY-----\nabc\n".to_string()))
    }

    #[test]
    fn test_inline_key_is_materialized() {
        let transport = SshTransport::new(inline_config()).unwrap();
        let path = transport.identity.path();
        assert!(path.exists());
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("-----BEGIN KEY-----"));
    }

    #[test]
    fn test_missing_key_file() {
        let config = SshConfig::new("dokku.example.com")
            .with_key(KeySource::File(PathBuf::from("/nonexistent/id_rsa")));
        let result = SshTransport::new(config);
        assert!(matches!(result, Err(SshError::InvalidKey(_))));
    }

    #[test]
    fn test_args_with_pinned_host_key() {
        let config = inline_config()
            .with_port(2222)
            .with_host_key(HostKeyPolicy::Pinned("ssh-ed25519 AAAAC3Nza".to_string()));
        let transport = SshTransport::new(config).unwrap();
        let args = transport.ssh_args();

        assert!(args.contains(&"StrictHostKeyChecking=yes".to_string()));
        assert_eq!(args[args.len() - 2], "dokku@dokku.example.com");
        assert_eq!(args[args.len() - 1], "--");

        let known_hosts = transport.known_hosts.as_ref().unwrap().path();
        let content = std::fs::read_to_string(known_hosts).unwrap();
        assert_eq!(content, "[dokku.example.com]:2222 ssh-ed25519 AAAAC3Nza\n");
    }

    #[test]
    fn test_args_insecure() {
        let config = inline_config().with_host_key(HostKeyPolicy::Insecure);
        let transport = SshTransport::new(config).unwrap();
        let args = transport.ssh_args();

        assert!(args.contains(&"StrictHostKeyChecking=no".to_string()));
        assert!(args.contains(&"UserKnownHostsFile=/dev/null".to_string()));
        assert_eq!(args[0], "-T");
    }

    #[cfg(unix)]
    #[test]
    fn test_collect_output_merges_stderr_on_failure() {
        use std::os::unix::process::ExitStatusExt;

        let output = std::process::Output {
            status: std::process::ExitStatus::from_raw(1 << 8),
            stdout: Vec::new(),
            stderr: b" !     App web does not exist\n".to_vec(),
        };
        let result = collect_output(output).unwrap();
        assert_eq!(result.exit_status, 1);
        assert!(result.stdout.contains("App web does not exist"));
    }

    #[cfg(unix)]
    #[test]
    fn test_collect_output_ssh_failure() {
        use std::os::unix::process::ExitStatusExt;

        let output = std::process::Output {
            status: std::process::ExitStatus::from_raw(255 << 8),
            stdout: Vec::new(),
            stderr: b"Permission denied (publickey).\n".to_vec(),
        };
        let err = collect_output(output).unwrap_err();
        assert!(err.is_connection_error());
    }
}
