use crate::controller::{self, Context, Controller, Model};
use crate::diagnostics::{AttributePath, Diagnostic, DiagnosticKind, Diagnostics};
use crate::resources::{Probe, ok_or_record, present_or_gone, probe};
use crate::validate;
use async_trait::async_trait;
use dokkuflow_client::ChecksStatus;
use serde::{Deserialize, Serialize};

/// Zero-downtime checks of an app
///
/// The remote only records non-default statuses, so every app "has" checks
/// and deleting restores `enabled`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checks {
    pub app_name: String,
    pub status: ChecksStatus,
}

impl Model for Checks {
    const KIND: &'static str = "checks";

    fn identity(&self) -> String {
        self.app_name.clone()
    }

    fn validate(&self, diags: &mut Diagnostics) {
        validate::name(diags, "app_name", &self.app_name);
    }

    fn immutable_changes(&self, planned: &Self) -> Vec<AttributePath> {
        let mut out = Vec::new();
        controller::changed(&mut out, "app_name", &self.app_name, &planned.app_name);
        out
    }
}

#[async_trait]
impl Controller for Checks {
    async fn create(&self, ctx: &Context, diags: &mut Diagnostics) -> Option<Self> {
        let checks = ctx.remote().checks();
        ok_or_record(checks.set(&self.app_name, self.status).await, diags, Some("status"))?;
        Some(self.clone())
    }

    async fn read(&self, ctx: &Context, diags: &mut Diagnostics) -> Option<Self> {
        match probe(ctx.remote().checks().status(&self.app_name).await, diags) {
            Probe::Found(status) => Some(Self {
                status,
                ..self.clone()
            }),
            Probe::Gone => None,
            Probe::Failed => Some(self.clone()),
        }
    }

    async fn update(&self, prior: &Self, ctx: &Context, diags: &mut Diagnostics) -> Option<Self> {
        let checks = ctx.remote().checks();
        let current = ok_or_record(checks.status(&self.app_name).await, diags, None)?;
        if current != prior.status {
            diags.push(
                Diagnostic::error(DiagnosticKind::DriftDetected, "Checks status drifted")
                    .with_detail(format!(
                        "expected {} on the remote but found {}; refresh before applying",
                        prior.status, current
                    ))
                    .at("status"),
            );
            return None;
        }
        ok_or_record(checks.set(&self.app_name, self.status).await, diags, Some("status"))?;
        Some(self.clone())
    }

    async fn delete(&self, ctx: &Context, diags: &mut Diagnostics) {
        let checks = ctx.remote().checks();
        let Some(current) = present_or_gone(checks.status(&self.app_name).await, diags) else {
            return;
        };
        if current == ChecksStatus::Enabled {
            return;
        }
        if let Err(e) = checks.set(&self.app_name, ChecksStatus::Enabled).await {
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

    fn report(disabled: &str, skipped: &str) -> Reply {
        Reply::ok(format!(
            "=====> web checks information\n       Checks disabled list:          {}\n       Checks skipped list:           {}\n",
            disabled, skipped
        ))
    }

    fn checks(status: ChecksStatus) -> Checks {
        Checks {
            app_name: "web".into(),
            status,
        }
    }

    #[tokio::test]
    async fn test_update_refuses_drift() {
        let fake = Arc::new(FakeTransport::new());
        fake.on("checks:report web", report("none", "_all_"));
        let ctx = context(&fake);

        let prior = checks(ChecksStatus::Disabled);
        let (state, diags) = controller::update(&ctx, &prior, &checks(ChecksStatus::Disabled)).await;

        assert!(state.is_none());
        let err = diags.error_at("status").unwrap();
        assert_eq!(err.kind, DiagnosticKind::DriftDetected);
        assert!(fake.commands_matching("checks:disable").is_empty());
    }

    #[tokio::test]
    async fn test_update_without_drift() {
        let fake = Arc::new(FakeTransport::new());
        fake.on("checks:report web", report("_all_", "none"));
        let ctx = context(&fake);

        let prior = checks(ChecksStatus::Disabled);
        let (state, diags) = controller::update(&ctx, &prior, &checks(ChecksStatus::Skipped)).await;

        assert!(!diags.has_errors());
        assert_eq!(state.unwrap().status, ChecksStatus::Skipped);
        assert_eq!(fake.commands(), vec!["checks:report web", "checks:skip web"]);
    }

    #[tokio::test]
    async fn test_delete_restores_enabled() {
        let fake = Arc::new(FakeTransport::new());
        fake.on("checks:report web", report("_all_", "none"));
        let ctx = context(&fake);

        let diags = controller::delete(&ctx, &checks(ChecksStatus::Disabled)).await;
        assert!(!diags.has_errors());
        assert_eq!(fake.commands(), vec!["checks:report web", "checks:enable web"]);
    }
}
