//! `plugin:*` (read-only: installing needs root on the host)

use crate::client::Remote;
use crate::command::Invocation;
use crate::error::{ClientError, Result};
use crate::report::list_lines;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginInfo {
    pub name: String,
    pub version: String,
    pub enabled: bool,
}

/// Parse `plugin:list` rows (`<name> <version> <enabled|disabled> <description>`)
pub fn parse_plugin_list(output: &str) -> Vec<PluginInfo> {
    list_lines(output)
        .iter()
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            let name = fields.next()?;
            let version = fields.next()?;
            let state = fields.next()?;
            Some(PluginInfo {
                name: name.to_string(),
                version: version.to_string(),
                enabled: state == "enabled",
            })
        })
        .collect()
}

pub struct Plugins<'a> {
    remote: Remote<'a>,
}

impl<'a> Plugins<'a> {
    pub fn new(remote: Remote<'a>) -> Self {
        Self { remote }
    }

    /// `plugin:installed` exits non-zero for absent plugins
    pub async fn installed(&self, name: &str) -> Result<bool> {
        match self
            .remote
            .run(Invocation::new("plugin:installed").arg(name))
            .await
        {
            Ok(_) => Ok(true),
            Err(ClientError::Remote { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    pub async fn list(&self) -> Result<Vec<PluginInfo>> {
        let output = self.remote.run(Invocation::new("plugin:list")).await?;
        Ok(parse_plugin_list(&output.stdout))
    }
}
