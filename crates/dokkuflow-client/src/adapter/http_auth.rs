//! `http-auth:*`
//!
//! The report lists user names only; passwords are never read back.

use crate::client::Remote;
use crate::command::Invocation;
use crate::error::Result;
use crate::report::Report;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HttpAuthReport {
    pub enabled: bool,
    pub users: Vec<String>,
}

pub struct HttpAuth<'a> {
    remote: Remote<'a>,
}

impl<'a> HttpAuth<'a> {
    pub fn new(remote: Remote<'a>) -> Self {
        Self { remote }
    }

    pub async fn report(&self, app: &str) -> Result<HttpAuthReport> {
        let output = self
            .remote
            .run_for_app(app, Invocation::new("http-auth:report").arg(app))
            .await?;
        let report = Report::parse(&output.stdout);
        Ok(HttpAuthReport {
            enabled: report.flag("http auth enabled"),
            users: report.list("http auth users"),
        })
    }

    pub async fn enable(&self, app: &str) -> Result<()> {
        self.remote
            .run_for_app(app, Invocation::new("http-auth:enable").arg(app))
            .await?;
        Ok(())
    }

    pub async fn disable(&self, app: &str) -> Result<()> {
        self.remote
            .run_for_app(app, Invocation::new("http-auth:disable").arg(app))
            .await?;
        Ok(())
    }

    pub async fn add_user(&self, app: &str, user: &str, password: &str) -> Result<()> {
        self.remote
            .run_for_app(
                app,
                Invocation::new("http-auth:add-user")
                    .arg(app)
                    .arg(user)
                    .secret_arg(password),
            )
            .await?;
        Ok(())
    }

    pub async fn remove_user(&self, app: &str, user: &str) -> Result<()> {
        self.remote
            .run_for_app(
                app,
                Invocation::new("http-auth:remove-user").arg(app).arg(user),
            )
            .await?;
        Ok(())
    }
}
