//! Scripted in-memory transport
//!
//! Replies are matched against the command with the `--quiet` prefix
//! removed. A rule matches when the command equals its prefix or continues
//! it with a space. One-shot replies are consumed before sticky rules, and
//! among sticky rules the most recently registered wins. Unmatched commands
//! succeed with empty output.

use crate::command::QUIET_FLAG;
use async_trait::async_trait;
use dokkuflow_ssh::{CommandOutput, InteractiveSession, Result, SshError, Transport};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Clone)]
pub enum Reply {
    /// Command ran; any exit status
    Output { stdout: String, status: i32 },
    /// Transport reported only a message
    Message(String),
    /// ssh itself failed (exit 255)
    Unreachable(String),
    /// Never completes (until the future is dropped)
    Hang,
}

impl Reply {
    pub fn ok(stdout: impl Into<String>) -> Self {
        Reply::Output {
            stdout: stdout.into(),
            status: 0,
        }
    }

    pub fn fail(stdout: impl Into<String>, status: i32) -> Self {
        Reply::Output {
            stdout: stdout.into(),
            status,
        }
    }

    pub fn message(message: impl Into<String>) -> Self {
        Reply::Message(message.into())
    }

    pub fn unreachable(message: impl Into<String>) -> Self {
        Reply::Unreachable(message.into())
    }
}

#[derive(Default)]
struct State {
    rules: Vec<(String, Reply)>,
    once: Vec<(String, Reply)>,
    commands: Vec<String>,
    session_lines: Vec<String>,
}

impl State {
    fn reply_for(&mut self, command: &str) -> Reply {
        if let Some(index) = self.once.iter().position(|(p, _)| matches_prefix(command, p)) {
            return self.once.remove(index).1;
        }
        self.rules
            .iter()
            .rev()
            .find(|(p, _)| matches_prefix(command, p))
            .map(|(_, reply)| reply.clone())
            .unwrap_or_else(|| Reply::ok(""))
    }
}

fn matches_prefix(command: &str, prefix: &str) -> bool {
    command == prefix
        || command
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with(' '))
}

/// Verb suffixes that only read remote state
const READ_SUFFIXES: [&str; 8] = [
    ":report", ":exists", ":get", ":list", ":info", ":linked", ":keys", ":installed",
];

fn is_read(command: &str) -> bool {
    let verb = command.split_whitespace().next().unwrap_or_default();
    verb == "version"
        || verb == "proxy:ports"
        || READ_SUFFIXES.iter().any(|suffix| verb.ends_with(suffix))
}

fn strip_quiet(command: &str) -> &str {
    command
        .strip_prefix(QUIET_FLAG)
        .map(str::trim_start)
        .unwrap_or(command)
}

#[derive(Default)]
pub struct FakeTransport {
    state: Arc<Mutex<State>>,
    delay: Option<Duration>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `version` like a host running `version`
    pub fn with_version(self, version: &str) -> Self {
        self.on("version", Reply::ok(format!("dokku version {}", version)));
        self
    }

    /// Sleep inside every `exec` (exposes interleaving)
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Register a sticky reply
    pub fn on(&self, prefix: &str, reply: Reply) -> &Self {
        self.lock().rules.push((prefix.to_string(), reply));
        self
    }

    /// Register a reply used by the next matching command only
    pub fn once(&self, prefix: &str, reply: Reply) -> &Self {
        self.lock().once.push((prefix.to_string(), reply));
        self
    }

    /// Executed commands without the quiet flag
    pub fn commands(&self) -> Vec<String> {
        self.lock()
            .commands
            .iter()
            .map(|c| strip_quiet(c).to_string())
            .collect()
    }

    /// Executed commands exactly as rendered
    pub fn raw_commands(&self) -> Vec<String> {
        self.lock().commands.clone()
    }

    /// Executed commands starting with `prefix`
    pub fn commands_matching(&self, prefix: &str) -> Vec<String> {
        self.commands()
            .into_iter()
            .filter(|c| matches_prefix(c, prefix))
            .collect()
    }

    /// Executed commands that change remote state (probes and reports left out)
    pub fn mutations(&self) -> Vec<String> {
        self.commands().into_iter().filter(|c| !is_read(c)).collect()
    }

    pub fn clear_commands(&self) {
        self.lock().commands.clear();
    }

    pub fn session_lines(&self) -> Vec<String> {
        self.lock().session_lines.clone()
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

struct InFlight(Arc<AtomicUsize>);

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

async fn resolve(reply: Reply) -> Result<CommandOutput> {
    match reply {
        Reply::Output { stdout, status } => Ok(CommandOutput::new(stdout, status)),
        Reply::Message(message) => Err(SshError::Remote(message)),
        Reply::Unreachable(message) => Err(SshError::ConnectionFailed(message)),
        Reply::Hang => std::future::pending().await,
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn exec(&self, command: &str) -> Result<CommandOutput> {
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        let _in_flight = InFlight(self.in_flight.clone());
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        let reply = {
            let mut state = self.lock();
            state.commands.push(command.to_string());
            state.reply_for(strip_quiet(command))
        };

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        resolve(reply).await
    }

    async fn open_session(&self, command: &str) -> Result<Box<dyn InteractiveSession>> {
        let reply = {
            let mut state = self.lock();
            state.commands.push(command.to_string());
            state.reply_for(strip_quiet(command))
        };
        Ok(Box::new(FakeSession {
            state: self.state.clone(),
            reply,
        }))
    }
}

struct FakeSession {
    state: Arc<Mutex<State>>,
    reply: Reply,
}

#[async_trait]
impl InteractiveSession for FakeSession {
    async fn send_line(&mut self, line: &str) -> Result<()> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .session_lines
            .push(line.to_string());
        Ok(())
    }

    async fn finish(self: Box<Self>) -> Result<CommandOutput> {
        resolve(self.reply).await
    }
}
