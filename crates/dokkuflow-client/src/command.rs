//! Command line construction for the Dokku shell

/// Flag that suppresses banners and progress output
pub const QUIET_FLAG: &str = "--quiet";

/// One remote command plus the values that must never be logged
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    args: Vec<String>,
    secrets: Vec<String>,
    quiet: bool,
}

impl Invocation {
    /// Start a command with a namespaced verb (`apps:create`)
    pub fn new(verb: impl Into<String>) -> Self {
        Self {
            args: vec![verb.into()],
            secrets: Vec::new(),
            quiet: true,
        }
    }

    /// Append an argument, quoting it for the remote shell when needed
    pub fn arg(mut self, arg: impl AsRef<str>) -> Self {
        self.args.push(shell_quote(arg.as_ref()));
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for arg in args {
            self.args.push(shell_quote(arg.as_ref()));
        }
        self
    }

    /// Append an argument only when `condition` holds
    pub fn arg_if(self, condition: bool, arg: impl AsRef<str>) -> Self {
        if condition { self.arg(arg) } else { self }
    }

    /// Append an argument whose value is redacted everywhere it is observed
    pub fn secret_arg(mut self, value: impl Into<String>) -> Self {
        let value = value.into();
        let quoted = shell_quote(&value);
        if quoted != value {
            self.secrets.push(quoted.clone());
        }
        self.args.push(quoted);
        self.secrets.push(value);
        self
    }

    /// Register a value to redact without adding it to the command
    pub fn redact(mut self, value: impl Into<String>) -> Self {
        self.secrets.push(value.into());
        self
    }

    /// Keep banner output (reports that need section headers)
    pub fn loud(mut self) -> Self {
        self.quiet = false;
        self
    }

    pub fn verb(&self) -> &str {
        &self.args[0]
    }

    pub fn secrets(&self) -> &[String] {
        &self.secrets
    }

    pub fn is_quiet(&self) -> bool {
        self.quiet
    }

    /// Full command string as sent to the transport
    pub fn render(&self) -> String {
        let body = self.args.join(" ");
        if self.quiet {
            format!("{} {}", QUIET_FLAG, body)
        } else {
            body
        }
    }
}

/// Single-quote an argument when it contains characters the remote shell
/// would interpret
pub fn shell_quote(arg: &str) -> String {
    if arg.is_empty() {
        return "''".to_string();
    }

    let safe = arg.chars().all(|c| {
        c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '/' | ':' | '=' | '@' | ',' | '+' | '%')
    });
    if safe {
        return arg.to_string();
    }

    format!("'{}'", arg.replace('\'', r"'\''"))
}
