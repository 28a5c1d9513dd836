use crate::controller::{self, Context, Controller, Model};
use crate::diagnostics::{AttributePath, Diagnostics};
use crate::resources::{Probe, ok_or_record, present_or_gone, probe};
use crate::validate;
use async_trait::async_trait;
use dokkuflow_client::Phase;
use serde::{Deserialize, Serialize};

/// One docker option in one phase
///
/// Presence is a substring match against the phase's joined option list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DockerOption {
    pub app_name: String,
    pub phase: Phase,
    pub value: String,
}

impl Model for DockerOption {
    const KIND: &'static str = "docker_option";

    fn identity(&self) -> String {
        format!("{}/{}/{}", self.app_name, self.phase, self.value)
    }

    fn validate(&self, diags: &mut Diagnostics) {
        validate::name(diags, "app_name", &self.app_name);
        validate::non_empty(diags, "value", &self.value);
    }

    fn immutable_changes(&self, planned: &Self) -> Vec<AttributePath> {
        let mut out = Vec::new();
        controller::changed(&mut out, "app_name", &self.app_name, &planned.app_name);
        controller::changed(&mut out, "phase", &self.phase, &planned.phase);
        controller::changed(&mut out, "value", &self.value, &planned.value);
        out
    }
}

#[async_trait]
impl Controller for DockerOption {
    async fn create(&self, ctx: &Context, diags: &mut Diagnostics) -> Option<Self> {
        let options = ctx.remote().docker_options();
        let present = ok_or_record(
            options.contains(&self.app_name, self.phase, &self.value).await,
            diags,
            None,
        )?;
        if present {
            controller::already_exists(
                diags,
                "value",
                format!("docker option '{}' in phase {}", self.value, self.phase),
            );
            return None;
        }
        ok_or_record(
            options.add(&self.app_name, &[self.phase], &self.value).await,
            diags,
            Some("value"),
        )?;
        Some(self.clone())
    }

    async fn read(&self, ctx: &Context, diags: &mut Diagnostics) -> Option<Self> {
        let options = ctx.remote().docker_options();
        match probe(options.contains(&self.app_name, self.phase, &self.value).await, diags) {
            Probe::Found(true) | Probe::Failed => Some(self.clone()),
            Probe::Found(false) | Probe::Gone => None,
        }
    }

    async fn update(&self, _prior: &Self, _ctx: &Context, _diags: &mut Diagnostics) -> Option<Self> {
        Some(self.clone())
    }

    async fn delete(&self, ctx: &Context, diags: &mut Diagnostics) {
        let options = ctx.remote().docker_options();
        let present = options.contains(&self.app_name, self.phase, &self.value).await;
        if present_or_gone(present, diags) != Some(true) {
            return;
        }
        if let Err(e) = options
            .remove(&self.app_name, &[self.phase], &self.value)
            .await
        {
            diags.client_error(&e, None);
        }
    }
}
