//! HTTP basic auth of an app
//!
//! The remote never reports passwords, so refreshed state carries them
//! forward from the tracked state. Users added out of band come back with an
//! empty password and show up as a diff on the next plan.

use crate::controller::{self, Context, Controller, Model};
use crate::diagnostics::{AttributePath, Diagnostics};
use crate::resources::{Probe, ok_or_record, present_or_gone, probe};
use crate::validate;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpAuth {
    pub app_name: String,
    /// user → password, applied in user order
    pub users: BTreeMap<String, String>,
}

fn user_path(user: &str) -> AttributePath {
    AttributePath::root("users").key(user)
}

impl HttpAuth {
    /// Add `users` in order; the first failure is recorded on its user path
    async fn add_users<'u>(
        &self,
        ctx: &Context,
        users: impl Iterator<Item = (&'u String, &'u String)> + Send,
        diags: &mut Diagnostics,
    ) -> Option<()> {
        let http_auth = ctx.remote().http_auth();
        for (user, password) in users {
            if let Err(e) = http_auth.add_user(&self.app_name, user, password).await {
                diags.client_error(&e, Some(user_path(user)));
                return None;
            }
        }
        Some(())
    }
}

impl Model for HttpAuth {
    const KIND: &'static str = "http_auth";

    fn identity(&self) -> String {
        self.app_name.clone()
    }

    fn validate(&self, diags: &mut Diagnostics) {
        validate::name(diags, "app_name", &self.app_name);
        if self.users.is_empty() {
            diags.validation("users", "at least one user is required");
        }
        for (user, password) in &self.users {
            validate::non_empty(diags, user_path(user), user);
            validate::non_empty(diags, user_path(user), password);
        }
    }

    fn immutable_changes(&self, planned: &Self) -> Vec<AttributePath> {
        let mut out = Vec::new();
        controller::changed(&mut out, "app_name", &self.app_name, &planned.app_name);
        out
    }
}

#[async_trait]
impl Controller for HttpAuth {
    async fn create(&self, ctx: &Context, diags: &mut Diagnostics) -> Option<Self> {
        let http_auth = ctx.remote().http_auth();
        let report = ok_or_record(http_auth.report(&self.app_name).await, diags, None)?;
        if report.enabled {
            controller::already_exists(
                diags,
                "app_name",
                format!("http auth on app {}", self.app_name),
            );
            return None;
        }

        ok_or_record(http_auth.enable(&self.app_name).await, diags, None)?;
        if self.add_users(ctx, self.users.iter(), diags).await.is_none() {
            if !diags.is_cancelled() {
                tracing::warn!(app = %self.app_name, "Adding users failed, disabling http auth");
                if let Err(e) = http_auth.disable(&self.app_name).await {
                    diags.client_error(&e, None);
                }
            }
            return None;
        }
        Some(self.clone())
    }

    async fn read(&self, ctx: &Context, diags: &mut Diagnostics) -> Option<Self> {
        match probe(ctx.remote().http_auth().report(&self.app_name).await, diags) {
            Probe::Found(report) if report.enabled => {
                let users = report
                    .users
                    .into_iter()
                    .map(|user| {
                        let password = self.users.get(&user).cloned().unwrap_or_default();
                        (user, password)
                    })
                    .collect();
                Some(Self {
                    users,
                    ..self.clone()
                })
            }
            Probe::Found(_) | Probe::Gone => None,
            Probe::Failed => Some(self.clone()),
        }
    }

    async fn update(&self, prior: &Self, ctx: &Context, diags: &mut Diagnostics) -> Option<Self> {
        let http_auth = ctx.remote().http_auth();
        for user in prior.users.keys().filter(|u| !self.users.contains_key(*u)) {
            if let Err(e) = http_auth.remove_user(&self.app_name, user).await {
                diags.client_error(&e, Some(user_path(user)));
                return None;
            }
        }

        let additions = self
            .users
            .iter()
            .filter(|(user, password)| prior.users.get(*user) != Some(*password));
        self.add_users(ctx, additions, diags).await?;
        Some(self.clone())
    }

    async fn delete(&self, ctx: &Context, diags: &mut Diagnostics) {
        let http_auth = ctx.remote().http_auth();
        let Some(report) = present_or_gone(http_auth.report(&self.app_name).await, diags) else {
            return;
        };
        if !report.enabled {
            return;
        }
        if let Err(e) = http_auth.disable(&self.app_name).await {
            diags.client_error(&e, None);
        }
    }
}
