//! Input validation shared by the resource models

use crate::diagnostics::{AttributePath, Diagnostics};
use regex::Regex;
use std::sync::LazyLock;

static NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z][a-z0-9-]*$").expect("static regex"));

static ENV_KEY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z_][A-Z0-9_]*$").expect("static regex"));

static HOSTNAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\*\.)?[A-Za-z0-9]([A-Za-z0-9-]*[A-Za-z0-9])?(\.[A-Za-z0-9]([A-Za-z0-9-]*[A-Za-z0-9])?)*(:[0-9]+)?$")
        .expect("static regex")
});

/// App, service, network, storage and property names
pub fn name(diags: &mut Diagnostics, path: &str, value: &str) {
    if !NAME_RE.is_match(value) {
        diags.validation(
            path,
            format!(
                "invalid name '{}': must start with a lowercase letter and contain only lowercase letters, digits and '-'",
                value
            ),
        );
    }
}

/// Environment variable keys and link aliases
pub fn env_key(diags: &mut Diagnostics, path: &str, value: &str) {
    if !ENV_KEY_RE.is_match(value) {
        diags.validation(
            path,
            format!(
                "invalid key '{}': must contain only uppercase letters, digits and '_'",
                value
            ),
        );
    }
}

/// Domain names and registry/git hosts (`*.` wildcard and `:port` allowed)
pub fn hostname(diags: &mut Diagnostics, path: &str, value: &str) {
    if !HOSTNAME_RE.is_match(value) {
        diags.validation(path, format!("invalid host name '{}'", value));
    }
}

pub fn non_empty(diags: &mut Diagnostics, path: impl Into<AttributePath>, value: &str) {
    if value.trim().is_empty() {
        diags.validation(path, "must not be empty");
    }
}

pub fn absolute_path(diags: &mut Diagnostics, path: &str, value: &str) {
    if !value.starts_with('/') {
        diags.validation(path, format!("'{}' must be an absolute path", value));
    }
}

pub fn port(diags: &mut Diagnostics, path: &str, value: u16) {
    if value == 0 {
        diags.validation(path, "port must be between 1 and 65535");
    }
}

/// One of a fixed set of values
pub fn one_of(diags: &mut Diagnostics, path: &str, value: &str, allowed: &[&str]) {
    if !allowed.contains(&value) {
        diags.validation(
            path,
            format!("invalid value '{}', expected one of {}", value, allowed.join(", ")),
        );
    }
}
