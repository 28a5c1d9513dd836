//! SSH connection settings and key material resolution

use crate::error::{Result, SshError};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

const PEM_PREFIX: &str = "-----BEGIN";

/// Where the private key comes from
#[derive(Clone, PartialEq, Eq)]
pub enum KeySource {
    /// Key stored in a file on the local machine
    File(PathBuf),
    /// Key material held in memory (never logged)
    Inline(String),
}

impl fmt::Debug for KeySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeySource::File(path) => f.debug_tuple("File").field(path).finish(),
            KeySource::Inline(_) => f.write_str("Inline(<redacted>)"),
        }
    }
}

impl KeySource {
    /// Parse a key source
    ///
    /// Supported forms:
    /// - `file:<path>` - key file (`~` is expanded)
    /// - `env:<VAR>` or `$VAR` - key material read from an environment variable
    /// - `raw:<pem>` - key material given inline
    /// - `-----BEGIN ...` - inline PEM block
    /// - anything else - path to a key file
    pub fn parse(spec: &str) -> Result<Self> {
        let spec = spec.trim();
        if spec.is_empty() {
            return Err(SshError::InvalidKey("empty key source".to_string()));
        }

        if let Some(path) = spec.strip_prefix("file:") {
            return Ok(KeySource::File(expand_home(path)));
        }
        if let Some(var) = spec.strip_prefix("env:") {
            return Self::from_env(var);
        }
        if let Some(var) = spec.strip_prefix('$') {
            return Self::from_env(var);
        }
        if let Some(raw) = spec.strip_prefix("raw:") {
            return Ok(KeySource::Inline(normalize_pem(raw)));
        }
        if spec.starts_with(PEM_PREFIX) {
            return Ok(KeySource::Inline(normalize_pem(spec)));
        }

        Ok(KeySource::File(expand_home(spec)))
    }

    fn from_env(var: &str) -> Result<Self> {
        let value =
            std::env::var(var).map_err(|_| SshError::MissingEnvVar(var.to_string()))?;
        if value.trim().is_empty() {
            return Err(SshError::InvalidKey(format!(
                "environment variable {} is empty",
                var
            )));
        }
        Ok(KeySource::Inline(normalize_pem(&value)))
    }

    /// Default key location (`~/.ssh/id_rsa`)
    pub fn default_path() -> Self {
        KeySource::File(expand_home("~/.ssh/id_rsa"))
    }
}

impl Default for KeySource {
    fn default() -> Self {
        Self::default_path()
    }
}

/// How the remote host key is verified
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostKeyPolicy {
    /// Verify against a known_hosts file
    KnownHosts(PathBuf),
    /// Verify against one pinned public key (`ssh-ed25519 AAAA...`)
    Pinned(String),
    /// Skip verification entirely (development only)
    Insecure,
}

impl Default for HostKeyPolicy {
    fn default() -> Self {
        HostKeyPolicy::KnownHosts(expand_home("~/.ssh/known_hosts"))
    }
}

/// Connection settings for one remote host
#[derive(Debug, Clone)]
pub struct SshConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub key: KeySource,
    pub host_key: HostKeyPolicy,
    pub connect_timeout: Duration,
    /// Per-command deadline; `None` waits forever
    pub command_timeout: Option<Duration>,
    /// ssh executable (overridable for tests and wrappers)
    pub program: String,
}

impl SshConfig {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: 22,
            user: "dokku".to_string(),
            key: KeySource::default(),
            host_key: HostKeyPolicy::default(),
            connect_timeout: Duration::from_secs(10),
            command_timeout: None,
            program: "ssh".to_string(),
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = user.into();
        self
    }

    pub fn with_key(mut self, key: KeySource) -> Self {
        self.key = key;
        self
    }

    pub fn with_host_key(mut self, policy: HostKeyPolicy) -> Self {
        self.host_key = policy;
        self
    }

    pub fn with_command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = Some(timeout);
        self
    }

    /// `user@host`
    pub fn destination(&self) -> String {
        format!("{}@{}", self.user, self.host)
    }

    /// Host pattern as written in a known_hosts file
    pub fn known_hosts_pattern(&self) -> String {
        if self.port == 22 {
            self.host.clone()
        } else {
            format!("[{}]:{}", self.host, self.port)
        }
    }
}

/// Expand a leading `~` to the home directory
pub fn expand_home(path: &str) -> PathBuf {
    if path == "~" {
        return dirs::home_dir().unwrap_or_else(|| PathBuf::from("~"));
    }
    if let Some(rest) = path.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    Path::new(path).to_path_buf()
}

// Keys pasted through env vars often carry literal "\n" sequences
fn normalize_pem(raw: &str) -> String {
    let mut pem = raw.trim().replace("\\n", "\n");
    if !pem.ends_with('\n') {
        pem.push('\n');
    }
    pem
}
