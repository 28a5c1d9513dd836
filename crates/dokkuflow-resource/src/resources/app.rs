use crate::controller::{self, Context, Controller, Model};
use crate::diagnostics::{AttributePath, Diagnostics};
use crate::resources::{ok_or_record, present_or_gone};
use crate::validate;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct App {
    pub app_name: String,
}

impl App {
    pub fn new(app_name: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
        }
    }
}

impl Model for App {
    const KIND: &'static str = "app";

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
impl Controller for App {
    async fn create(&self, ctx: &Context, diags: &mut Diagnostics) -> Option<Self> {
        let apps = ctx.remote().apps();
        if ok_or_record(apps.exists(&self.app_name).await, diags, Some("app_name"))? {
            controller::already_exists(diags, "app_name", format!("app {}", self.app_name));
            return None;
        }
        ok_or_record(apps.create(&self.app_name).await, diags, None)?;
        Some(self.clone())
    }

    async fn read(&self, ctx: &Context, diags: &mut Diagnostics) -> Option<Self> {
        match ctx.remote().apps().exists(&self.app_name).await {
            Ok(true) => Some(self.clone()),
            Ok(false) => None,
            Err(e) => {
                diags.client_error(&e, None);
                Some(self.clone())
            }
        }
    }

    async fn update(&self, _prior: &Self, _ctx: &Context, _diags: &mut Diagnostics) -> Option<Self> {
        Some(self.clone())
    }

    async fn delete(&self, ctx: &Context, diags: &mut Diagnostics) {
        let apps = ctx.remote().apps();
        if present_or_gone(apps.exists(&self.app_name).await, diags) != Some(true) {
            return;
        }
        if let Err(e) = apps.destroy(&self.app_name).await {
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

    #[tokio::test]
    async fn test_create_rejects_existing_app() {
        let fake = Arc::new(FakeTransport::new());
        let ctx = context(&fake);

        let (state, diags) = controller::create(&ctx, &App::new("web")).await;
        assert!(state.is_none());
        assert!(diags.error_at("app_name").is_some());
        assert_eq!(fake.commands(), vec!["apps:exists web"]);
    }

    #[tokio::test]
    async fn test_create_validates_name() {
        let fake = Arc::new(FakeTransport::new());
        let ctx = context(&fake);

        let (state, diags) = controller::create(&ctx, &App::new("Web_App")).await;
        assert!(state.is_none());
        assert!(diags.error_at("app_name").is_some());
        assert!(fake.commands().is_empty());
    }

    #[tokio::test]
    async fn test_read_drops_destroyed_app() {
        let fake = Arc::new(FakeTransport::new());
        fake.on("apps:exists web", Reply::fail(" !     App web does not exist", 1));
        let ctx = context(&fake);

        let (state, diags) = controller::read(&ctx, &App::new("web")).await;
        assert!(state.is_none());
        assert!(diags.is_empty());
    }

    #[tokio::test]
    async fn test_delete_is_tolerant() {
        let fake = Arc::new(FakeTransport::new());
        fake.on("apps:exists web", Reply::fail(" !     App web does not exist", 1));
        let ctx = context(&fake);

        let diags = controller::delete(&ctx, &App::new("web")).await;
        assert!(!diags.has_errors());
        assert_eq!(fake.commands(), vec!["apps:exists web"]);
    }
}
