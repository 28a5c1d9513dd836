//! `network:*`

use crate::client::Remote;
use crate::command::Invocation;
use crate::error::Result;
use crate::report::Report;
use crate::sentinel;
use serde::{Deserialize, Serialize};
use std::fmt;

/// App-level network properties
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NetworkProperty {
    InitialNetwork,
    AttachPostCreate,
    AttachPostDeploy,
}

impl NetworkProperty {
    pub fn as_str(&self) -> &'static str {
        match self {
            NetworkProperty::InitialNetwork => "initial-network",
            NetworkProperty::AttachPostCreate => "attach-post-create",
            NetworkProperty::AttachPostDeploy => "attach-post-deploy",
        }
    }

    fn report_key(&self) -> String {
        format!("network {}", self.as_str().replace('-', " "))
    }
}

impl fmt::Display for NetworkProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub struct Network<'a> {
    remote: Remote<'a>,
}

impl<'a> Network<'a> {
    pub fn new(remote: Remote<'a>) -> Self {
        Self { remote }
    }

    /// Current value of a property; empty reads as `None`
    pub async fn property(&self, app: &str, property: NetworkProperty) -> Result<Option<String>> {
        let output = self
            .remote
            .run_for_app(app, Invocation::new("network:report").arg(app))
            .await?;
        let value = Report::parse(&output.stdout).value(&property.report_key());
        Ok((!value.is_empty()).then_some(value))
    }

    pub async fn set(&self, app: &str, property: NetworkProperty, network: &str) -> Result<()> {
        self.remote
            .run_for_app(
                app,
                Invocation::new("network:set")
                    .arg(app)
                    .arg(property.as_str())
                    .arg(network),
            )
            .await?;
        Ok(())
    }

    pub async fn unset(&self, app: &str, property: NetworkProperty) -> Result<()> {
        self.remote
            .run_for_app(
                app,
                Invocation::new("network:set").arg(app).arg(property.as_str()),
            )
            .await?;
        Ok(())
    }

    pub async fn exists(&self, network: &str) -> Result<bool> {
        self.remote
            .check(
                Invocation::new("network:exists").arg(network),
                sentinel::is_missing,
            )
            .await
    }

    pub async fn create(&self, network: &str) -> Result<()> {
        self.remote
            .run(Invocation::new("network:create").arg(network))
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
    async fn test_property() {
        let fake = Arc::new(FakeTransport::new());
        fake.on(
            "network:report web",
            Reply::ok("=====> web network information\n       Network attach post create:\n       Network attach post deploy:    backend\n       Network initial network:\n"),
        );
        let client = client(&fake);
        let cancel = CancellationToken::new();
        let network = client.remote(&cancel).network();

        assert_eq!(
            network
                .property("web", NetworkProperty::AttachPostDeploy)
                .await
                .unwrap()
                .as_deref(),
            Some("backend")
        );
        assert_eq!(
            network.property("web", NetworkProperty::InitialNetwork).await.unwrap(),
            None
        );
    }

    #[tokio::test]
    async fn test_exists() {
        let fake = Arc::new(FakeTransport::new());
        fake.on("network:exists backend", Reply::fail("Network does not exist", 1));
        let client = client(&fake);
        let cancel = CancellationToken::new();

        assert!(!client.remote(&cancel).network().exists("backend").await.unwrap());
        assert!(client.remote(&cancel).network().exists("bridge").await.unwrap());
    }
}
