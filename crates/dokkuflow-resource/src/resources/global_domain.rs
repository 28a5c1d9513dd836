use crate::controller::{self, Context, Controller, Model};
use crate::diagnostics::{AttributePath, Diagnostics};
use crate::resources::{Probe, ok_or_record, probe};
use crate::validate;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Host-wide virtual host suffix
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalDomain {
    pub domain: String,
}

impl Model for GlobalDomain {
    const KIND: &'static str = "global_domain";

    fn identity(&self) -> String {
        self.domain.clone()
    }

    fn validate(&self, diags: &mut Diagnostics) {
        validate::hostname(diags, "domain", &self.domain);
    }

    fn immutable_changes(&self, planned: &Self) -> Vec<AttributePath> {
        let mut out = Vec::new();
        controller::changed(&mut out, "domain", &self.domain, &planned.domain);
        out
    }
}

#[async_trait]
impl Controller for GlobalDomain {
    async fn create(&self, ctx: &Context, diags: &mut Diagnostics) -> Option<Self> {
        let domains = ctx.remote().domains();
        let report = ok_or_record(domains.global_report().await, diags, None)?;
        if report.vhosts.contains(&self.domain) {
            controller::already_exists(diags, "domain", format!("global domain {}", self.domain));
            return None;
        }
        ok_or_record(domains.add_global(&self.domain).await, diags, Some("domain"))?;
        Some(self.clone())
    }

    async fn read(&self, ctx: &Context, diags: &mut Diagnostics) -> Option<Self> {
        match probe(ctx.remote().domains().global_report().await, diags) {
            Probe::Found(report) if report.vhosts.contains(&self.domain) => Some(self.clone()),
            Probe::Found(_) | Probe::Gone => None,
            Probe::Failed => Some(self.clone()),
        }
    }

    async fn update(&self, _prior: &Self, _ctx: &Context, _diags: &mut Diagnostics) -> Option<Self> {
        Some(self.clone())
    }

    async fn delete(&self, ctx: &Context, diags: &mut Diagnostics) {
        let domains = ctx.remote().domains();
        let report = match domains.global_report().await {
            Ok(report) => report,
            Err(e) => {
                diags.client_error(&e, None);
                return;
            }
        };
        if !report.vhosts.contains(&self.domain) {
            return;
        }
        if let Err(e) = domains.remove_global(&self.domain).await {
            diags.client_error(&e, None);
        }
    }
}
