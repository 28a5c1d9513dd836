use crate::controller::{self, Context, Controller, Model};
use crate::diagnostics::{AttributePath, Diagnostics};
use crate::resources::ok_or_record;
use crate::validate;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Credentials for a git host used by `git:sync`
///
/// The host keeps no listing of stored credentials, so read trusts the
/// tracked state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitAuth {
    pub host: String,
    pub username: String,
    pub password: String,
}

impl Model for GitAuth {
    const KIND: &'static str = "git_auth";

    fn identity(&self) -> String {
        self.host.clone()
    }

    fn validate(&self, diags: &mut Diagnostics) {
        validate::hostname(diags, "host", &self.host);
        validate::non_empty(diags, "username", &self.username);
        validate::non_empty(diags, "password", &self.password);
    }

    fn immutable_changes(&self, planned: &Self) -> Vec<AttributePath> {
        let mut out = Vec::new();
        controller::changed(&mut out, "host", &self.host, &planned.host);
        out
    }
}

#[async_trait]
impl Controller for GitAuth {
    async fn create(&self, ctx: &Context, diags: &mut Diagnostics) -> Option<Self> {
        ok_or_record(
            ctx.remote()
                .git()
                .auth(&self.host, &self.username, &self.password)
                .await,
            diags,
            None,
        )?;
        Some(self.clone())
    }

    async fn read(&self, _ctx: &Context, _diags: &mut Diagnostics) -> Option<Self> {
        Some(self.clone())
    }

    async fn update(&self, _prior: &Self, ctx: &Context, diags: &mut Diagnostics) -> Option<Self> {
        self.create(ctx, diags).await
    }

    async fn delete(&self, ctx: &Context, diags: &mut Diagnostics) {
        if let Err(e) = ctx.remote().git().remove_auth(&self.host).await {
            diags.client_error(&e, None);
        }
    }
}
