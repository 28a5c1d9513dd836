//! Datastore services (`postgres`, `redis`, ...)

use crate::controller::{self, Context, Controller, Model};
use crate::diagnostics::{AttributePath, Diagnostics};
use crate::resources::{Probe, ok_or_record, present_or_gone, probe};
use crate::validate;
use async_trait::async_trait;
use dokkuflow_client::ServiceKind;
use serde::{Deserialize, Serialize};

/// Value the info report shows for a service without exposed ports
const NOT_EXPOSED: &str = "-";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    pub service_type: ServiceKind,
    pub service_name: String,
    /// `image[:tag]`; the plugin default when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// `port` or `ip:port`, space-separated for several
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expose: Option<String>,
    /// Passed to the datastore at creation only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_options: Option<String>,
}

impl Model for Service {
    const KIND: &'static str = "service";

    fn identity(&self) -> String {
        format!("{}/{}", self.service_type, self.service_name)
    }

    fn validate(&self, diags: &mut Diagnostics) {
        validate::name(diags, "service_name", &self.service_name);
        if let Some(image) = &self.image {
            validate::non_empty(diags, "image", image);
        }
        if let Some(expose) = &self.expose {
            validate::non_empty(diags, "expose", expose);
        }
    }

    fn immutable_changes(&self, planned: &Self) -> Vec<AttributePath> {
        let mut out = Vec::new();
        controller::changed(&mut out, "service_type", &self.service_type, &planned.service_type);
        controller::changed(&mut out, "service_name", &self.service_name, &planned.service_name);
        controller::changed(&mut out, "image", &self.image, &planned.image);
        out
    }
}

#[async_trait]
impl Controller for Service {
    async fn create(&self, ctx: &Context, diags: &mut Diagnostics) -> Option<Self> {
        let services = ctx.remote().services();
        let kind = self.service_type;
        let exists = ok_or_record(services.exists(kind, &self.service_name).await, diags, None)?;
        if exists {
            controller::already_exists(
                diags,
                "service_name",
                format!("{} service {}", kind, self.service_name),
            );
            return None;
        }

        ok_or_record(
            services
                .create(
                    kind,
                    &self.service_name,
                    self.image.as_deref(),
                    self.config_options.as_deref(),
                )
                .await,
            diags,
            None,
        )?;

        if let Some(expose) = &self.expose {
            if let Err(e) = services.expose(kind, &self.service_name, expose).await {
                controller::fail(diags, &e, Some("expose"));
                if !diags.is_cancelled() {
                    tracing::warn!(service = %self.identity(), "Expose failed, destroying service");
                    if let Err(e) = services.destroy(kind, &self.service_name).await {
                        diags.client_error(&e, None);
                    }
                }
                return None;
            }
        }
        Some(self.clone())
    }

    async fn read(&self, ctx: &Context, diags: &mut Diagnostics) -> Option<Self> {
        let services = ctx.remote().services();
        let kind = self.service_type;
        match probe(services.exists(kind, &self.service_name).await, diags) {
            Probe::Found(true) => {}
            Probe::Found(false) | Probe::Gone => return None,
            Probe::Failed => return Some(self.clone()),
        }
        // Only unexposure is detectable; the report formats exposed ports differently
        match probe(services.info(kind, &self.service_name).await, diags) {
            Probe::Found(info) if info.value("exposed ports") == NOT_EXPOSED => Some(Self {
                expose: None,
                ..self.clone()
            }),
            Probe::Gone => None,
            _ => Some(self.clone()),
        }
    }

    async fn update(&self, prior: &Self, ctx: &Context, diags: &mut Diagnostics) -> Option<Self> {
        let services = ctx.remote().services();
        let kind = self.service_type;

        if self.config_options != prior.config_options {
            diags.warning(format!(
                "config_options of {} only apply when the service is created",
                self.identity()
            ));
        }
        if self.expose != prior.expose {
            if prior.expose.is_some() {
                ok_or_record(
                    services.unexpose(kind, &self.service_name).await,
                    diags,
                    Some("expose"),
                )?;
            }
            if let Some(expose) = &self.expose {
                ok_or_record(
                    services.expose(kind, &self.service_name, expose).await,
                    diags,
                    Some("expose"),
                )?;
            }
        }
        Some(self.clone())
    }

    async fn delete(&self, ctx: &Context, diags: &mut Diagnostics) {
        let services = ctx.remote().services();
        let kind = self.service_type;
        if present_or_gone(services.exists(kind, &self.service_name).await, diags) != Some(true) {
            return;
        }
        match services.destroy(kind, &self.service_name).await {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {}
            Err(e) => diags.client_error(&e, None),
        }
    }
}
