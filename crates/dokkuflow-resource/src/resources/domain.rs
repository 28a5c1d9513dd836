use crate::controller::{self, Context, Controller, Model};
use crate::diagnostics::{AttributePath, Diagnostics};
use crate::resources::{Probe, ok_or_record, present_or_gone, probe};
use crate::validate;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Virtual host of one app
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Domain {
    pub app_name: String,
    pub domain: String,
}

impl Model for Domain {
    const KIND: &'static str = "domain";

    fn identity(&self) -> String {
        format!("{}/{}", self.app_name, self.domain)
    }

    fn validate(&self, diags: &mut Diagnostics) {
        validate::name(diags, "app_name", &self.app_name);
        validate::hostname(diags, "domain", &self.domain);
    }

    fn immutable_changes(&self, planned: &Self) -> Vec<AttributePath> {
        let mut out = Vec::new();
        controller::changed(&mut out, "app_name", &self.app_name, &planned.app_name);
        controller::changed(&mut out, "domain", &self.domain, &planned.domain);
        out
    }
}

#[async_trait]
impl Controller for Domain {
    async fn create(&self, ctx: &Context, diags: &mut Diagnostics) -> Option<Self> {
        let domains = ctx.remote().domains();
        let report = ok_or_record(domains.report(&self.app_name).await, diags, None)?;
        if report.app_vhosts.contains(&self.domain) {
            controller::already_exists(
                diags,
                "domain",
                format!("domain {} on app {}", self.domain, self.app_name),
            );
            return None;
        }
        ok_or_record(
            domains.add(&self.app_name, &self.domain).await,
            diags,
            Some("domain"),
        )?;
        Some(self.clone())
    }

    async fn read(&self, ctx: &Context, diags: &mut Diagnostics) -> Option<Self> {
        match probe(ctx.remote().domains().report(&self.app_name).await, diags) {
            Probe::Found(report) if report.app_vhosts.contains(&self.domain) => Some(self.clone()),
            Probe::Found(_) | Probe::Gone => None,
            Probe::Failed => Some(self.clone()),
        }
    }

    async fn update(&self, _prior: &Self, _ctx: &Context, _diags: &mut Diagnostics) -> Option<Self> {
        Some(self.clone())
    }

    async fn delete(&self, ctx: &Context, diags: &mut Diagnostics) {
        let domains = ctx.remote().domains();
        let Some(report) = present_or_gone(domains.report(&self.app_name).await, diags) else {
            return;
        };
        if !report.app_vhosts.contains(&self.domain) {
            return;
        }
        if let Err(e) = domains.remove(&self.app_name, &self.domain).await {
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

    const REPORT: &str = "=====> web domains information
       Domains app enabled:           true
       Domains app vhosts:            web.example.com www.example.com
       Domains global enabled:        true
       Domains global vhosts:         example.com
";

    fn domain(name: &str) -> Domain {
        Domain {
            app_name: "web".into(),
            domain: name.into(),
        }
    }

    #[tokio::test]
    async fn test_create_and_duplicate() {
        let fake = Arc::new(FakeTransport::new());
        fake.on("domains:report web", Reply::ok(REPORT));
        let ctx = context(&fake);

        let (state, diags) = controller::create(&ctx, &domain("api.example.com")).await;
        assert!(!diags.has_errors());
        assert!(state.is_some());

        let (state, diags) = controller::create(&ctx, &domain("www.example.com")).await;
        assert!(state.is_none());
        assert!(diags.error_at("domain").is_some());

        assert_eq!(fake.mutations(), vec!["domains:add web api.example.com"]);
    }

    #[tokio::test]
    async fn test_read_drops_removed_vhost() {
        let fake = Arc::new(FakeTransport::new());
        fake.on("domains:report web", Reply::ok(REPORT));
        let ctx = context(&fake);

        let (kept, _) = controller::read(&ctx, &domain("web.example.com")).await;
        let (dropped, _) = controller::read(&ctx, &domain("old.example.com")).await;
        assert!(kept.is_some());
        assert!(dropped.is_none());
    }

    #[tokio::test]
    async fn test_delete_skips_absent_vhost() {
        let fake = Arc::new(FakeTransport::new());
        fake.on("domains:report web", Reply::ok(REPORT));
        let ctx = context(&fake);

        let diags = controller::delete(&ctx, &domain("old.example.com")).await;
        assert!(diags.is_empty());
        assert!(fake.commands_matching("domains:remove").is_empty());
    }
}
