use crate::controller::{self, Context, Controller, Model};
use crate::diagnostics::{AttributePath, Diagnostics};
use crate::resources::{Probe, ok_or_record, present_or_gone, probe};
use crate::validate;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

fn default_enabled() -> bool {
    true
}

/// Proxy settings of an app
///
/// Every app has a proxy; deleting the resource re-enables it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proxy {
    pub app_name: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// `nginx`, `caddy`, ...; `None` leaves the host default
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub proxy_type: Option<String>,
}

impl Proxy {
    async fn apply(&self, prior: Option<&Self>, ctx: &Context, diags: &mut Diagnostics) -> Option<()> {
        let proxy = ctx.remote().proxy();
        if let Some(proxy_type) = &self.proxy_type {
            if prior.is_none_or(|p| p.proxy_type.as_ref() != Some(proxy_type)) {
                ok_or_record(
                    proxy.set_type(&self.app_name, proxy_type).await,
                    diags,
                    Some("type"),
                )?;
            }
        }
        if prior.is_none_or(|p| p.enabled != self.enabled) {
            let result = if self.enabled {
                proxy.enable(&self.app_name).await
            } else {
                proxy.disable(&self.app_name).await
            };
            ok_or_record(result, diags, Some("enabled"))?;
        }
        Some(())
    }
}

impl Model for Proxy {
    const KIND: &'static str = "proxy";

    fn identity(&self) -> String {
        self.app_name.clone()
    }

    fn validate(&self, diags: &mut Diagnostics) {
        validate::name(diags, "app_name", &self.app_name);
        if let Some(proxy_type) = &self.proxy_type {
            validate::name(diags, "type", proxy_type);
        }
    }

    fn immutable_changes(&self, planned: &Self) -> Vec<AttributePath> {
        let mut out = Vec::new();
        controller::changed(&mut out, "app_name", &self.app_name, &planned.app_name);
        out
    }
}

#[async_trait]
impl Controller for Proxy {
    async fn create(&self, ctx: &Context, diags: &mut Diagnostics) -> Option<Self> {
        self.apply(None, ctx, diags).await?;
        Some(self.clone())
    }

    async fn read(&self, ctx: &Context, diags: &mut Diagnostics) -> Option<Self> {
        match probe(ctx.remote().proxy().report(&self.app_name).await, diags) {
            Probe::Found(report) => Some(Self {
                enabled: report.enabled,
                proxy_type: match &self.proxy_type {
                    Some(_) if !report.proxy_type.is_empty() => Some(report.proxy_type),
                    tracked => tracked.clone(),
                },
                ..self.clone()
            }),
            Probe::Gone => None,
            Probe::Failed => Some(self.clone()),
        }
    }

    async fn update(&self, prior: &Self, ctx: &Context, diags: &mut Diagnostics) -> Option<Self> {
        self.apply(Some(prior), ctx, diags).await?;
        Some(self.clone())
    }

    async fn delete(&self, ctx: &Context, diags: &mut Diagnostics) {
        let proxy = ctx.remote().proxy();
        let Some(report) = present_or_gone(proxy.report(&self.app_name).await, diags) else {
            return;
        };
        if report.enabled {
            return;
        }
        if let Err(e) = proxy.enable(&self.app_name).await {
            diags.client_error(&e, None);
        }
    }
}
