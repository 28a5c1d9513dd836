//! Diagnostics
//!
//! Controllers never return errors. They record [`Diagnostic`]s, each
//! optionally attributed to an attribute path, and the enclosing apply
//! fails iff an error-severity diagnostic remains.

use dokkuflow_client::ClientError;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    Validation,
    /// Target absent where it must exist (`precondition_failed`)
    NotFound,
    AlreadyExists,
    ImmutableFieldChanged,
    DriftDetected,
    Remote,
    Transport,
    Cancelled,
    /// Non-fatal notes (warnings)
    Note,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DiagnosticKind::Validation => "validation",
            DiagnosticKind::NotFound => "precondition_failed",
            DiagnosticKind::AlreadyExists => "already_exists",
            DiagnosticKind::ImmutableFieldChanged => "immutable_field_changed",
            DiagnosticKind::DriftDetected => "drift_detected",
            DiagnosticKind::Remote => "remote",
            DiagnosticKind::Transport => "transport",
            DiagnosticKind::Cancelled => "cancelled",
            DiagnosticKind::Note => "note",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
enum Step {
    Attr(String),
    Key(String),
}

/// Path to an attribute (`status`, `users[b]`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributePath {
    steps: Vec<Step>,
}

impl AttributePath {
    pub fn root(attr: impl Into<String>) -> Self {
        Self {
            steps: vec![Step::Attr(attr.into())],
        }
    }

    pub fn attr(mut self, attr: impl Into<String>) -> Self {
        self.steps.push(Step::Attr(attr.into()));
        self
    }

    /// Map or set element
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.steps.push(Step::Key(key.into()));
        self
    }
}

impl fmt::Display for AttributePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, step) in self.steps.iter().enumerate() {
            match step {
                Step::Attr(name) if i == 0 => write!(f, "{}", name)?,
                Step::Attr(name) => write!(f, ".{}", name)?,
                Step::Key(key) => write!(f, "[{}]", key)?,
            }
        }
        Ok(())
    }
}

impl From<&str> for AttributePath {
    fn from(attr: &str) -> Self {
        AttributePath::root(attr)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub kind: DiagnosticKind,
    pub summary: String,
    pub detail: String,
    pub path: Option<AttributePath>,
    /// State key of the resource, filled in by the engine
    pub resource: Option<String>,
}

impl Diagnostic {
    pub fn error(kind: DiagnosticKind, summary: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            kind,
            summary: summary.into(),
            detail: String::new(),
            path: None,
            resource: None,
        }
    }

    pub fn warning(summary: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            kind: DiagnosticKind::Note,
            summary: summary.into(),
            detail: String::new(),
            path: None,
            resource: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = detail.into();
        self
    }

    pub fn at(mut self, path: impl Into<AttributePath>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    /// Map a client error to its diagnostic kind
    pub fn from_client_error(err: &ClientError) -> Self {
        let kind = match err {
            ClientError::NotFound(_) => DiagnosticKind::NotFound,
            ClientError::AlreadyExists(_) => DiagnosticKind::AlreadyExists,
            ClientError::Cancelled => DiagnosticKind::Cancelled,
            ClientError::Transport(_) | ClientError::MisconfiguredShell => {
                DiagnosticKind::Transport
            }
            ClientError::Remote { .. }
            | ClientError::UnsupportedVersion { .. }
            | ClientError::Parse { .. } => DiagnosticKind::Remote,
        };
        let summary = match kind {
            DiagnosticKind::NotFound => "Precondition failed",
            DiagnosticKind::AlreadyExists => "Resource already exists",
            DiagnosticKind::Cancelled => "Operation cancelled",
            DiagnosticKind::Transport => "Transport failure",
            _ => "Remote command failed",
        };
        Diagnostic::error(kind, summary).with_detail(err.to_string())
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.severity)?;
        if let Some(resource) = &self.resource {
            write!(f, " [{}]", resource)?;
        }
        if let Some(path) = &self.path {
            write!(f, " {}:", path)?;
        }
        write!(f, " {}", self.summary)?;
        if !self.detail.is_empty() {
            write!(f, ": {}", self.detail)?;
        }
        Ok(())
    }
}

/// Ordered diagnostics accumulator
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.items.push(diagnostic);
    }

    /// Record a client error, optionally on an attribute
    pub fn client_error(&mut self, err: &ClientError, path: Option<AttributePath>) {
        let mut diagnostic = Diagnostic::from_client_error(err);
        diagnostic.path = path;
        self.items.push(diagnostic);
    }

    pub fn validation(&mut self, path: impl Into<AttributePath>, summary: impl Into<String>) {
        self.items
            .push(Diagnostic::error(DiagnosticKind::Validation, summary).at(path));
    }

    pub fn warning(&mut self, summary: impl Into<String>) {
        self.items.push(Diagnostic::warning(summary));
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.items.extend(other.items);
    }

    /// Attribute every unattributed diagnostic to `resource`
    pub fn scoped(mut self, resource: &str) -> Self {
        for item in &mut self.items {
            if item.resource.is_none() {
                item.resource = Some(resource.to_string());
            }
        }
        self
    }

    pub fn has_errors(&self) -> bool {
        self.items.iter().any(Diagnostic::is_error)
    }

    pub fn is_cancelled(&self) -> bool {
        self.items
            .iter()
            .any(|d| d.kind == DiagnosticKind::Cancelled)
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter().filter(|d| d.is_error())
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter().filter(|d| !d.is_error())
    }

    /// First error on `path`
    pub fn error_at(&self, path: &str) -> Option<&Diagnostic> {
        self.errors()
            .find(|d| d.path.as_ref().is_some_and(|p| p.to_string() == path))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attribute_path_display() {
        assert_eq!(AttributePath::root("status").to_string(), "status");
        assert_eq!(AttributePath::root("users").key("b").to_string(), "users[b]");
        assert_eq!(
            AttributePath::root("source").attr("image").to_string(),
            "source.image"
        );
    }

    #[test]
    fn test_has_errors_ignores_warnings() {
        let mut diags = Diagnostics::new();
        diags.warning("config_options only apply at creation");
        assert!(!diags.has_errors());

        diags.validation("app_name", "invalid name");
        assert!(diags.has_errors());
        assert!(diags.error_at("app_name").is_some());
        assert!(diags.error_at("status").is_none());
    }

    #[test]
    fn test_client_error_mapping() {
        let mut diags = Diagnostics::new();
        diags.client_error(
            &ClientError::Remote {
                status: 1,
                output: "boom".into(),
            },
            Some(AttributePath::root("users").key("b")),
        );
        diags.client_error(&ClientError::Cancelled, None);

        let items: Vec<_> = diags.iter().collect();
        assert_eq!(items[0].kind, DiagnosticKind::Remote);
        assert_eq!(items[0].detail, "Error [1]: boom");
        assert!(diags.error_at("users[b]").is_some());
        assert!(diags.is_cancelled());
    }

    #[test]
    fn test_scoped_keeps_existing_resource() {
        let mut diags = Diagnostics::new();
        diags.warning("a");
        let mut tagged = Diagnostic::warning("b");
        tagged.resource = Some("app:api".into());
        diags.push(tagged);

        let scoped = diags.scoped("app:web");
        let resources: Vec<_> = scoped.iter().map(|d| d.resource.clone()).collect();
        assert_eq!(
            resources,
            vec![Some("app:web".to_string()), Some("app:api".to_string())]
        );
    }
}
