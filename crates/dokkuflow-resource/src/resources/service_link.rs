use crate::controller::{self, Context, Controller, Model};
use crate::diagnostics::{AttributePath, Diagnostics};
use crate::resources::{Probe, ok_or_record, probe};
use crate::validate;
use async_trait::async_trait;
use dokkuflow_client::ServiceKind;
use serde::{Deserialize, Serialize};

/// Link between a service and an app; fully immutable
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceLink {
    pub service_type: ServiceKind,
    pub service_name: String,
    pub app_name: String,
    /// Prefix of the injected env var (`<ALIAS>_URL`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
}

impl Model for ServiceLink {
    const KIND: &'static str = "service_link";

    fn identity(&self) -> String {
        format!("{}/{}/{}", self.service_type, self.service_name, self.app_name)
    }

    fn validate(&self, diags: &mut Diagnostics) {
        validate::name(diags, "service_name", &self.service_name);
        validate::name(diags, "app_name", &self.app_name);
        if let Some(alias) = &self.alias {
            validate::env_key(diags, "alias", alias);
        }
    }

    fn immutable_changes(&self, planned: &Self) -> Vec<AttributePath> {
        let mut out = Vec::new();
        controller::changed(&mut out, "service_type", &self.service_type, &planned.service_type);
        controller::changed(&mut out, "service_name", &self.service_name, &planned.service_name);
        controller::changed(&mut out, "app_name", &self.app_name, &planned.app_name);
        controller::changed(&mut out, "alias", &self.alias, &planned.alias);
        out
    }
}

#[async_trait]
impl Controller for ServiceLink {
    async fn create(&self, ctx: &Context, diags: &mut Diagnostics) -> Option<Self> {
        let services = ctx.remote().services();
        let kind = self.service_type;
        let linked = ok_or_record(
            services.linked(kind, &self.service_name, &self.app_name).await,
            diags,
            None,
        )?;
        if linked {
            controller::already_exists(
                diags,
                "app_name",
                format!("link from {} service {} to {}", kind, self.service_name, self.app_name),
            );
            return None;
        }
        ok_or_record(
            services
                .link(kind, &self.service_name, &self.app_name, self.alias.as_deref())
                .await,
            diags,
            None,
        )?;
        Some(self.clone())
    }

    async fn read(&self, ctx: &Context, diags: &mut Diagnostics) -> Option<Self> {
        let linked = ctx
            .remote()
            .services()
            .linked(self.service_type, &self.service_name, &self.app_name)
            .await;
        match probe(linked, diags) {
            Probe::Found(true) | Probe::Failed => Some(self.clone()),
            Probe::Found(false) | Probe::Gone => None,
        }
    }

    async fn update(&self, _prior: &Self, _ctx: &Context, _diags: &mut Diagnostics) -> Option<Self> {
        Some(self.clone())
    }

    async fn delete(&self, ctx: &Context, diags: &mut Diagnostics) {
        let unlinked = ctx
            .remote()
            .services()
            .unlink(self.service_type, &self.service_name, &self.app_name)
            .await;
        match unlinked {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {}
            Err(e) => diags.client_error(&e, None),
        }
    }
}
