use crate::controller::{self, Context, Controller, Model};
use crate::diagnostics::{AttributePath, Diagnostics};
use crate::resources::{Probe, ok_or_record, probe};
use crate::validate;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Presence check for a host plugin
///
/// Installing plugins needs root on the host, so create only verifies and
/// delete leaves the plugin alone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plugin {
    pub name: String,
    #[serde(default)]
    pub url: String,
}

impl Model for Plugin {
    const KIND: &'static str = "plugin";

    fn identity(&self) -> String {
        self.name.clone()
    }

    fn validate(&self, diags: &mut Diagnostics) {
        validate::name(diags, "name", &self.name);
    }

    fn immutable_changes(&self, planned: &Self) -> Vec<AttributePath> {
        let mut out = Vec::new();
        controller::changed(&mut out, "name", &self.name, &planned.name);
        controller::changed(&mut out, "url", &self.url, &planned.url);
        out
    }
}

#[async_trait]
impl Controller for Plugin {
    async fn create(&self, ctx: &Context, diags: &mut Diagnostics) -> Option<Self> {
        let installed = ok_or_record(ctx.remote().plugins().installed(&self.name).await, diags, None)?;
        if !installed {
            let hint = if self.url.is_empty() {
                String::new()
            } else {
                format!(" (sudo dokku plugin:install {} --name {})", self.url, self.name)
            };
            controller::not_found(
                diags,
                "name",
                format!(
                    "plugin {} is not installed; install it on the host as root{}",
                    self.name, hint
                ),
            );
            return None;
        }
        Some(self.clone())
    }

    async fn read(&self, ctx: &Context, diags: &mut Diagnostics) -> Option<Self> {
        match probe(ctx.remote().plugins().installed(&self.name).await, diags) {
            Probe::Found(true) | Probe::Failed => Some(self.clone()),
            Probe::Found(false) | Probe::Gone => None,
        }
    }

    async fn update(&self, _prior: &Self, _ctx: &Context, _diags: &mut Diagnostics) -> Option<Self> {
        Some(self.clone())
    }

    async fn delete(&self, _ctx: &Context, _diags: &mut Diagnostics) {
        tracing::debug!(plugin = %self.name, "Plugins are never uninstalled");
    }
}
