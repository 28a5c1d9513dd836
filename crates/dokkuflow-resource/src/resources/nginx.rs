use crate::controller::{self, Context, Controller, Model};
use crate::diagnostics::{AttributePath, Diagnostics};
use crate::resources::{Probe, ok_or_record, present_or_gone, probe};
use crate::validate;
use async_trait::async_trait;
use dokkuflow_client::NginxScope;
use serde::{Deserialize, Serialize};

/// One nginx property, per app or global
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Nginx {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_name: Option<String>,
    pub property: String,
    pub value: String,
}

impl Nginx {
    pub fn scope(&self) -> NginxScope {
        match &self.app_name {
            Some(app) => NginxScope::App(app.clone()),
            None => NginxScope::Global,
        }
    }
}

impl Model for Nginx {
    const KIND: &'static str = "nginx";

    fn identity(&self) -> String {
        format!("{}/{}", self.scope(), self.property)
    }

    fn validate(&self, diags: &mut Diagnostics) {
        if let Some(app) = &self.app_name {
            validate::name(diags, "app_name", app);
        }
        validate::name(diags, "property", &self.property);
        validate::non_empty(diags, "value", &self.value);
    }

    fn immutable_changes(&self, planned: &Self) -> Vec<AttributePath> {
        let mut out = Vec::new();
        controller::changed(&mut out, "app_name", &self.app_name, &planned.app_name);
        controller::changed(&mut out, "property", &self.property, &planned.property);
        out
    }
}

#[async_trait]
impl Controller for Nginx {
    async fn create(&self, ctx: &Context, diags: &mut Diagnostics) -> Option<Self> {
        let nginx = ctx.remote().nginx();
        let scope = self.scope();
        let current = ok_or_record(nginx.get(&scope, &self.property).await, diags, None)?;
        if current.is_some() {
            controller::already_exists(
                diags,
                "property",
                format!("nginx property {} ({})", self.property, scope),
            );
            return None;
        }
        ok_or_record(
            nginx.set(&scope, &self.property, &self.value).await,
            diags,
            Some("value"),
        )?;
        Some(self.clone())
    }

    async fn read(&self, ctx: &Context, diags: &mut Diagnostics) -> Option<Self> {
        match probe(ctx.remote().nginx().get(&self.scope(), &self.property).await, diags) {
            Probe::Found(Some(value)) => Some(Self {
                value,
                ..self.clone()
            }),
            Probe::Found(None) | Probe::Gone => None,
            Probe::Failed => Some(self.clone()),
        }
    }

    async fn update(&self, _prior: &Self, ctx: &Context, diags: &mut Diagnostics) -> Option<Self> {
        ok_or_record(
            ctx.remote()
                .nginx()
                .set(&self.scope(), &self.property, &self.value)
                .await,
            diags,
            Some("value"),
        )?;
        Some(self.clone())
    }

    async fn delete(&self, ctx: &Context, diags: &mut Diagnostics) {
        let nginx = ctx.remote().nginx();
        let scope = self.scope();
        let Some(Some(_)) = present_or_gone(nginx.get(&scope, &self.property).await, diags) else {
            return;
        };
        if let Err(e) = nginx.unset(&scope, &self.property).await {
            diags.client_error(&e, None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::test_support::context;
    use dokkuflow_client::testing::{FakeTransport, Reply};
    use std::sync::Arc;

    fn body_size(app: Option<&str>, value: &str) -> Nginx {
        Nginx {
            app_name: app.map(str::to_string),
            property: "client-max-body-size".into(),
            value: value.into(),
        }
    }

    #[test]
    fn test_identity_names_scope() {
        assert_eq!(body_size(None, "1m").key(), "nginx:global/client-max-body-size");
        assert_eq!(
            body_size(Some("web"), "1m").key(),
            "nginx:web/client-max-body-size"
        );
    }

    #[tokio::test]
    async fn test_global_property_lifecycle() {
        let fake = Arc::new(FakeTransport::new());
        let ctx = context(&fake);

        let (state, diags) = controller::create(&ctx, &body_size(None, "20m")).await;
        assert!(!diags.has_errors());
        assert!(state.is_some());

        fake.on(
            "nginx:report --global",
            Reply::ok("=====> Global nginx information\n       Nginx global client max body size: 20m\n"),
        );
        let (state, _) = controller::read(&ctx, &body_size(None, "10m")).await;
        assert_eq!(state, Some(body_size(None, "20m")));

        let diags = controller::delete(&ctx, &body_size(None, "20m")).await;
        assert!(!diags.has_errors());
        assert_eq!(
            fake.mutations(),
            vec![
                "nginx:set --global client-max-body-size 20m",
                "nginx:set --global client-max-body-size",
            ]
        );
    }
}
