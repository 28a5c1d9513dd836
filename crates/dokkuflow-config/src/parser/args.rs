//! Typed access to a node's arguments and properties

use crate::error::{ConfigError, Result};
use kdl::{KdlNode, KdlValue};

pub(super) struct NodeArgs<'a> {
    node: &'a KdlNode,
}

impl<'a> NodeArgs<'a> {
    pub fn new(node: &'a KdlNode) -> Self {
        Self { node }
    }

    pub fn name(&self) -> &'a str {
        self.node.name().value()
    }

    pub fn error(&self, message: impl AsRef<str>) -> ConfigError {
        ConfigError::InvalidManifest(format!("{}: {}", self.name(), message.as_ref()))
    }

    fn positional(&self) -> impl Iterator<Item = &'a KdlValue> + use<'a> {
        self.node
            .entries()
            .iter()
            .filter(|e| e.name().is_none())
            .map(|e| e.value())
    }

    /// Last value given for property `key`
    fn prop(&self, key: &str) -> Option<&'a KdlValue> {
        self.node
            .entries()
            .iter()
            .rev()
            .find(|e| e.name().map(|n| n.value()) == Some(key))
            .map(|e| e.value())
    }

    /// Required positional string argument
    pub fn arg(&self, index: usize, what: &str) -> Result<String> {
        match self.positional().nth(index) {
            Some(value) => value
                .as_string()
                .map(str::to_string)
                .ok_or_else(|| self.error(format!("{} must be a string", what))),
            None => Err(self.error(format!("requires {}", what))),
        }
    }

    /// Every positional argument as a string
    pub fn strings(&self, what: &str) -> Result<Vec<String>> {
        self.positional()
            .map(|value| {
                value
                    .as_string()
                    .map(str::to_string)
                    .ok_or_else(|| self.error(format!("{} must be a string", what)))
            })
            .collect()
    }

    pub fn string(&self, key: &str) -> Result<Option<String>> {
        match self.prop(key) {
            Some(value) => value
                .as_string()
                .map(|s| Some(s.to_string()))
                .ok_or_else(|| self.error(format!("{} must be a string", key))),
            None => Ok(None),
        }
    }

    pub fn required(&self, key: &str) -> Result<String> {
        self.string(key)?
            .ok_or_else(|| self.error(format!("requires {}=", key)))
    }

    pub fn bool(&self, key: &str) -> Result<Option<bool>> {
        match self.prop(key) {
            Some(value) => value
                .as_bool()
                .map(Some)
                .ok_or_else(|| self.error(format!("{} must be #true or #false", key))),
            None => Ok(None),
        }
    }

    pub fn port(&self, key: &str) -> Result<Option<u16>> {
        match self.prop(key) {
            Some(value) => value
                .as_integer()
                .and_then(|n| u16::try_from(n).ok())
                .filter(|n| *n > 0)
                .map(Some)
                .ok_or_else(|| self.error(format!("{} must be a port number", key))),
            None => Ok(None),
        }
    }

    /// Reject properties outside `allowed`
    pub fn only(&self, allowed: &[&str]) -> Result<()> {
        for entry in self.node.entries() {
            if let Some(key) = entry.name()
                && !allowed.contains(&key.value())
            {
                return Err(self.error(format!("unknown property {}", key.value())));
            }
        }
        Ok(())
    }

    pub fn children(&self) -> impl Iterator<Item = NodeArgs<'a>> + use<'a> {
        self.node
            .children()
            .into_iter()
            .flat_map(|doc| doc.nodes())
            .map(NodeArgs::new)
    }

    /// Render a scalar as text (provider settings accept any scalar)
    pub fn scalar(&self, index: usize) -> Result<String> {
        let value = self
            .positional()
            .nth(index)
            .ok_or_else(|| self.error("requires a value"))?;
        if let Some(s) = value.as_string() {
            Ok(s.to_string())
        } else if let Some(n) = value.as_integer() {
            Ok(n.to_string())
        } else if let Some(b) = value.as_bool() {
            Ok(b.to_string())
        } else {
            Err(self.error("value must be a string, integer or boolean"))
        }
    }
}
