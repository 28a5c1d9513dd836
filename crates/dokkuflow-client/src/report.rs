//! Parsers for the `Key: value` report format
//!
//! Reports look like
//!
//! ```text
//! =====> web domains information
//!        Domains app enabled:           true
//!        Domains app vhosts:            web.example.com
//! ```
//!
//! Keys are lowercased and whitespace-trimmed; banner lines and lines
//! without a `:` are skipped.

use std::collections::BTreeMap;

/// Banner prefixes emitted by the remote
pub const BANNER_PREFIXES: [&str; 2] = ["=====>", "----->"];

/// Parsed report
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    fields: BTreeMap<String, String>,
}

impl Report {
    pub fn parse(text: &str) -> Self {
        let mut fields = BTreeMap::new();
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || is_banner(line) {
                continue;
            }
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let key = normalize_key(key);
            if key.is_empty() {
                continue;
            }
            fields.insert(key, value.trim().to_string());
        }
        Self { fields }
    }

    /// Raw value of a field; keys are matched case-insensitively
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(&normalize_key(key)).map(String::as_str)
    }

    /// Value of a field, empty when missing
    pub fn value(&self, key: &str) -> String {
        self.get(key).unwrap_or_default().to_string()
    }

    /// Space-separated list field; missing or empty yields an empty list
    pub fn list(&self, key: &str) -> Vec<String> {
        self.get(key).map(split_list).unwrap_or_default()
    }

    /// Boolean field (`true`)
    pub fn flag(&self, key: &str) -> bool {
        self.get(key).is_some_and(parse_bool)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

pub fn is_banner(line: &str) -> bool {
    let line = line.trim_start();
    BANNER_PREFIXES.iter().any(|prefix| line.starts_with(prefix))
}

/// Split a space-separated list, dropping empty entries
pub fn split_list(value: &str) -> Vec<String> {
    value.split_whitespace().map(str::to_string).collect()
}

pub fn parse_bool(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "true" | "yes" | "1")
}

/// Non-banner, non-empty lines of a listing
pub fn list_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !is_banner(line))
        .map(str::to_string)
        .collect()
}

fn normalize_key(key: &str) -> String {
    key.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_ascii_lowercase()
}
