use crate::controller::{self, Context, Controller, Model};
use crate::diagnostics::{AttributePath, Diagnostics};
use crate::resources::{Probe, ok_or_record, present_or_gone, probe};
use crate::validate;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One environment variable of an app
///
/// Exists iff the remote value is non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub app_name: String,
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub no_restart: bool,
}

impl Config {
    pub fn new(app_name: impl Into<String>, name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
            name: name.into(),
            value: value.into(),
            no_restart: false,
        }
    }
}

impl Model for Config {
    const KIND: &'static str = "config";

    fn identity(&self) -> String {
        format!("{}/{}", self.app_name, self.name)
    }

    fn validate(&self, diags: &mut Diagnostics) {
        validate::name(diags, "app_name", &self.app_name);
        validate::env_key(diags, "name", &self.name);
        validate::non_empty(diags, "value", &self.value);
    }

    fn immutable_changes(&self, planned: &Self) -> Vec<AttributePath> {
        let mut out = Vec::new();
        controller::changed(&mut out, "app_name", &self.app_name, &planned.app_name);
        controller::changed(&mut out, "name", &self.name, &planned.name);
        out
    }
}

#[async_trait]
impl Controller for Config {
    async fn create(&self, ctx: &Context, diags: &mut Diagnostics) -> Option<Self> {
        let config = ctx.remote().config();
        let current = ok_or_record(config.get(&self.app_name, &self.name).await, diags, None)?;
        if current.is_some() {
            controller::already_exists(
                diags,
                "name",
                format!("config {} on app {}", self.name, self.app_name),
            );
            return None;
        }
        ok_or_record(
            config
                .set(&self.app_name, &self.name, &self.value, self.no_restart)
                .await,
            diags,
            Some("value"),
        )?;
        Some(self.clone())
    }

    async fn read(&self, ctx: &Context, diags: &mut Diagnostics) -> Option<Self> {
        match probe(ctx.remote().config().get(&self.app_name, &self.name).await, diags) {
            Probe::Found(Some(value)) => Some(Self {
                value,
                ..self.clone()
            }),
            Probe::Found(None) | Probe::Gone => None,
            Probe::Failed => Some(self.clone()),
        }
    }

    async fn update(&self, _prior: &Self, ctx: &Context, diags: &mut Diagnostics) -> Option<Self> {
        let config = ctx.remote().config();
        let current = ok_or_record(config.get(&self.app_name, &self.name).await, diags, None)?;
        if current.is_none() {
            controller::not_found(
                diags,
                "name",
                format!("config {} is not set on app {}", self.name, self.app_name),
            );
            return None;
        }
        ok_or_record(
            config
                .set(&self.app_name, &self.name, &self.value, self.no_restart)
                .await,
            diags,
            Some("value"),
        )?;
        Some(self.clone())
    }

    async fn delete(&self, ctx: &Context, diags: &mut Diagnostics) {
        let config = ctx.remote().config();
        let Some(Some(_)) = present_or_gone(config.get(&self.app_name, &self.name).await, diags)
        else {
            return;
        };
        if let Err(e) = config
            .unset(&self.app_name, &self.name, self.no_restart)
            .await
        {
            diags.client_error(&e, None);
        }
    }
}
