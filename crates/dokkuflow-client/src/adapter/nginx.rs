//! `nginx:*` properties, per app or global

use crate::client::Remote;
use crate::command::Invocation;
use crate::error::Result;
use crate::report::Report;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "scope", content = "app_name", rename_all = "lowercase")]
pub enum NginxScope {
    Global,
    App(String),
}

impl NginxScope {
    /// Command target (`<app>` or `--global`)
    fn target(&self) -> &str {
        match self {
            NginxScope::Global => "--global",
            NginxScope::App(app) => app,
        }
    }

    /// Report key holding `property` for this scope
    fn report_key(&self, property: &str) -> String {
        let words = property.replace('-', " ");
        match self {
            NginxScope::Global => format!("nginx global {}", words),
            NginxScope::App(_) => format!("nginx {}", words),
        }
    }
}

impl fmt::Display for NginxScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NginxScope::Global => f.write_str("global"),
            NginxScope::App(app) => f.write_str(app),
        }
    }
}

pub struct Nginx<'a> {
    remote: Remote<'a>,
}

impl<'a> Nginx<'a> {
    pub fn new(remote: Remote<'a>) -> Self {
        Self { remote }
    }

    async fn run(&self, scope: &NginxScope, invocation: Invocation) -> Result<String> {
        let output = match scope {
            NginxScope::Global => self.remote.run(invocation).await?,
            NginxScope::App(app) => self.remote.run_for_app(app, invocation).await?,
        };
        Ok(output.stdout)
    }

    /// Current value; empty values read as `None`
    pub async fn get(&self, scope: &NginxScope, property: &str) -> Result<Option<String>> {
        let stdout = self
            .run(scope, Invocation::new("nginx:report").arg(scope.target()))
            .await?;
        let value = Report::parse(&stdout).value(&scope.report_key(property));
        Ok((!value.is_empty()).then_some(value))
    }

    pub async fn set(&self, scope: &NginxScope, property: &str, value: &str) -> Result<()> {
        self.run(
            scope,
            Invocation::new("nginx:set")
                .arg(scope.target())
                .arg(property)
                .arg(value),
        )
        .await?;
        Ok(())
    }

    /// Setting a property without a value restores the default
    pub async fn unset(&self, scope: &NginxScope, property: &str) -> Result<()> {
        self.run(
            scope,
            Invocation::new("nginx:set").arg(scope.target()).arg(property),
        )
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::test_support::client;
    use crate::testing::{FakeTransport, Reply};
    use std::sync::Arc;
    use tokio_util::sync::CancellationToken;

    #[tokio::test]
    async fn test_get_app_and_global() {
        let fake = Arc::new(FakeTransport::new());
        fake.on(
            "nginx:report web",
            Reply::ok("=====> web nginx information\n       Nginx client max body size:    20m\n       Nginx proxy read timeout:\n"),
        );
        fake.on(
            "nginx:report --global",
            Reply::ok("=====> global nginx information\n       Nginx global client max body size: 1m\n"),
        );
        let client = client(&fake);
        let cancel = CancellationToken::new();
        let nginx = client.remote(&cancel).nginx();
        let app = NginxScope::App("web".to_string());

        assert_eq!(
            nginx.get(&app, "client-max-body-size").await.unwrap().as_deref(),
            Some("20m")
        );
        assert_eq!(nginx.get(&app, "proxy-read-timeout").await.unwrap(), None);
        assert_eq!(
            nginx
                .get(&NginxScope::Global, "client-max-body-size")
                .await
                .unwrap()
                .as_deref(),
            Some("1m")
        );
    }

    #[tokio::test]
    async fn test_set_and_unset() {
        let fake = Arc::new(FakeTransport::new());
        let client = client(&fake);
        let cancel = CancellationToken::new();
        let nginx = client.remote(&cancel).nginx();

        nginx
            .set(&NginxScope::Global, "client-max-body-size", "20m")
            .await
            .unwrap();
        nginx
            .unset(&NginxScope::App("web".to_string()), "client-max-body-size")
            .await
            .unwrap();
        assert_eq!(
            fake.commands(),
            vec![
                "nginx:set --global client-max-body-size 20m",
                "nginx:set web client-max-body-size"
            ]
        );
    }
}
