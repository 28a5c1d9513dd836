use crate::controller::{self, Context, Controller, Model};
use crate::diagnostics::{AttributePath, Diagnostics};
use crate::resources::{Probe, ok_or_record, present_or_gone, probe};
use crate::validate;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Registry credentials, optionally bound to an app
///
/// Logins are host-wide and cannot be listed, so only the app binding is
/// refreshed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registry {
    pub server: String,
    pub username: String,
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_name: Option<String>,
}

impl Model for Registry {
    const KIND: &'static str = "registry";

    fn identity(&self) -> String {
        match &self.app_name {
            Some(app) => format!("{}/{}", self.server, app),
            None => self.server.clone(),
        }
    }

    fn validate(&self, diags: &mut Diagnostics) {
        validate::hostname(diags, "server", &self.server);
        validate::non_empty(diags, "username", &self.username);
        validate::non_empty(diags, "password", &self.password);
        if let Some(app) = &self.app_name {
            validate::name(diags, "app_name", app);
        }
    }

    fn immutable_changes(&self, planned: &Self) -> Vec<AttributePath> {
        let mut out = Vec::new();
        controller::changed(&mut out, "server", &self.server, &planned.server);
        controller::changed(&mut out, "app_name", &self.app_name, &planned.app_name);
        out
    }
}

#[async_trait]
impl Controller for Registry {
    async fn create(&self, ctx: &Context, diags: &mut Diagnostics) -> Option<Self> {
        let registry = ctx.remote().registry();
        ok_or_record(
            registry
                .login(&self.server, &self.username, &self.password)
                .await,
            diags,
            None,
        )?;
        if let Some(app) = &self.app_name {
            ok_or_record(
                registry.set_server(app, &self.server).await,
                diags,
                Some("app_name"),
            )?;
        }
        Some(self.clone())
    }

    async fn read(&self, ctx: &Context, diags: &mut Diagnostics) -> Option<Self> {
        let Some(app) = &self.app_name else {
            return Some(self.clone());
        };
        match probe(ctx.remote().registry().server(app).await, diags) {
            Probe::Found(server) if server == self.server => Some(self.clone()),
            Probe::Found(_) | Probe::Gone => None,
            Probe::Failed => Some(self.clone()),
        }
    }

    async fn update(&self, _prior: &Self, ctx: &Context, diags: &mut Diagnostics) -> Option<Self> {
        ok_or_record(
            ctx.remote()
                .registry()
                .login(&self.server, &self.username, &self.password)
                .await,
            diags,
            None,
        )?;
        Some(self.clone())
    }

    async fn delete(&self, ctx: &Context, diags: &mut Diagnostics) {
        let registry = ctx.remote().registry();
        if let Some(app) = &self.app_name {
            if present_or_gone(registry.server(app).await, diags).as_deref() == Some(self.server.as_str()) {
                if let Err(e) = registry.unset_server(app).await {
                    diags.client_error(&e, None);
                }
            }
        }
        if let Err(e) = registry.logout(&self.server).await {
            diags.client_error(&e, None);
        }
    }
}
