use crate::controller::{self, Context, Controller, Model};
use crate::diagnostics::{AttributePath, Diagnostics};
use crate::resources::{Probe, ok_or_record, present_or_gone, probe};
use crate::validate;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Let's Encrypt certificate of an app; exists iff the app is listed as active
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Letsencrypt {
    pub app_name: String,
    pub email: String,
}

impl Model for Letsencrypt {
    const KIND: &'static str = "letsencrypt";

    fn identity(&self) -> String {
        self.app_name.clone()
    }

    fn validate(&self, diags: &mut Diagnostics) {
        validate::name(diags, "app_name", &self.app_name);
        if !self.email.contains('@') {
            diags.validation("email", format!("invalid email '{}'", self.email));
        }
    }

    fn immutable_changes(&self, planned: &Self) -> Vec<AttributePath> {
        let mut out = Vec::new();
        controller::changed(&mut out, "app_name", &self.app_name, &planned.app_name);
        out
    }
}

#[async_trait]
impl Controller for Letsencrypt {
    async fn create(&self, ctx: &Context, diags: &mut Diagnostics) -> Option<Self> {
        let letsencrypt = ctx.remote().letsencrypt();
        if ok_or_record(letsencrypt.active(&self.app_name).await, diags, None)? {
            controller::already_exists(
                diags,
                "app_name",
                format!("letsencrypt on app {}", self.app_name),
            );
            return None;
        }

        ok_or_record(
            letsencrypt.set_email(&self.app_name, &self.email).await,
            diags,
            Some("email"),
        )?;
        let enabled = match letsencrypt.enable(&self.app_name).await {
            Ok(()) => letsencrypt.add_cron_job().await,
            Err(e) => Err(e),
        };
        if let Err(e) = enabled {
            diags.client_error(&e, None);
            if !diags.is_cancelled() {
                tracing::warn!(app = %self.app_name, "Enabling letsencrypt failed, disabling");
                if let Err(e) = letsencrypt.disable(&self.app_name).await {
                    diags.client_error(&e, None);
                }
            }
            return None;
        }
        Some(self.clone())
    }

    async fn read(&self, ctx: &Context, diags: &mut Diagnostics) -> Option<Self> {
        let letsencrypt = ctx.remote().letsencrypt();
        match probe(letsencrypt.active(&self.app_name).await, diags) {
            Probe::Found(true) => {}
            Probe::Found(false) | Probe::Gone => return None,
            Probe::Failed => return Some(self.clone()),
        }
        match probe(letsencrypt.email(&self.app_name).await, diags) {
            Probe::Found(email) if !email.is_empty() => Some(Self {
                email,
                ..self.clone()
            }),
            Probe::Gone => None,
            _ => Some(self.clone()),
        }
    }

    async fn update(&self, prior: &Self, ctx: &Context, diags: &mut Diagnostics) -> Option<Self> {
        tracing::debug!(app = %self.app_name, from = %prior.email, "Setting letsencrypt email");
        ok_or_record(
            ctx.remote()
                .letsencrypt()
                .set_email(&self.app_name, &self.email)
                .await,
            diags,
            Some("email"),
        )?;
        Some(self.clone())
    }

    async fn delete(&self, ctx: &Context, diags: &mut Diagnostics) {
        let letsencrypt = ctx.remote().letsencrypt();
        if present_or_gone(letsencrypt.active(&self.app_name).await, diags) != Some(true) {
            return;
        }
        if let Err(e) = letsencrypt.disable(&self.app_name).await {
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

    const LIST_ACTIVE: &str = "-----> App name           Certificate Expiry        Time before expiry        Time before renewal
web                       2026-12-01 10:00:00       42d, 0h, 0m, 0s           12d, 0h, 0m, 0s
";

    fn plan() -> Letsencrypt {
        Letsencrypt {
            app_name: "web".into(),
            email: "ops@example.com".into(),
        }
    }

    #[tokio::test]
    async fn test_create_sequence() {
        let fake = Arc::new(FakeTransport::new());
        let ctx = context(&fake);

        let (state, diags) = controller::create(&ctx, &plan()).await;
        assert!(!diags.has_errors());
        assert_eq!(state, Some(plan()));
        assert_eq!(
            fake.mutations(),
            vec![
                "letsencrypt:set web email ops@example.com",
                "letsencrypt:enable web",
                "letsencrypt:cron-job --add",
            ]
        );
    }

    #[tokio::test]
    async fn test_failed_enable_is_compensated() {
        let fake = Arc::new(FakeTransport::new());
        fake.on("letsencrypt:enable web", Reply::fail("rate limited", 1));
        let ctx = context(&fake);

        let (state, diags) = controller::create(&ctx, &plan()).await;
        assert!(state.is_none());
        assert_eq!(diags.errors().count(), 1);
        assert_eq!(
            fake.mutations(),
            vec![
                "letsencrypt:set web email ops@example.com",
                "letsencrypt:enable web",
                "letsencrypt:disable web",
            ]
        );
    }

    #[tokio::test]
    async fn test_update_always_sets_email() {
        let fake = Arc::new(FakeTransport::new());
        let ctx = context(&fake);

        let (state, diags) = controller::update(&ctx, &plan(), &plan()).await;
        assert!(!diags.has_errors());
        assert_eq!(state, Some(plan()));
        assert_eq!(
            fake.mutations(),
            vec!["letsencrypt:set web email ops@example.com"]
        );
    }

    #[tokio::test]
    async fn test_read_and_delete() {
        let fake = Arc::new(FakeTransport::new());
        fake.on("letsencrypt:list", Reply::ok(LIST_ACTIVE));
        fake.on(
            "letsencrypt:report web",
            Reply::ok("=====> web letsencrypt information\n       Letsencrypt email:             admin@example.com\n"),
        );
        let ctx = context(&fake);

        let (state, _) = controller::read(&ctx, &plan()).await;
        assert_eq!(state.unwrap().email, "admin@example.com");

        let diags = controller::delete(&ctx, &plan()).await;
        assert!(!diags.has_errors());
        assert_eq!(fake.mutations(), vec!["letsencrypt:disable web"]);
    }
}
