use crate::controller::{self, Context, Controller, Model};
use crate::diagnostics::{AttributePath, Diagnostics};
use crate::resources::{Probe, ok_or_record, present_or_gone, probe};
use crate::validate;
use async_trait::async_trait;
use dokkuflow_client::NetworkProperty;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which app network property a [`Network`] manages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkType {
    /// Network the container starts on
    Initial,
    /// Network joined after deploy
    Attach,
}

impl NetworkType {
    pub fn property(&self) -> NetworkProperty {
        match self {
            NetworkType::Initial => NetworkProperty::InitialNetwork,
            NetworkType::Attach => NetworkProperty::AttachPostDeploy,
        }
    }
}

impl fmt::Display for NetworkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetworkType::Initial => f.write_str("initial"),
            NetworkType::Attach => f.write_str("attach"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Network {
    pub app_name: String,
    #[serde(rename = "type")]
    pub network_type: NetworkType,
    pub name: String,
}

impl Model for Network {
    const KIND: &'static str = "network";

    fn identity(&self) -> String {
        format!("{}/{}", self.app_name, self.network_type)
    }

    fn validate(&self, diags: &mut Diagnostics) {
        validate::name(diags, "app_name", &self.app_name);
        validate::name(diags, "name", &self.name);
    }

    fn immutable_changes(&self, planned: &Self) -> Vec<AttributePath> {
        let mut out = Vec::new();
        controller::changed(&mut out, "app_name", &self.app_name, &planned.app_name);
        controller::changed(&mut out, "type", &self.network_type, &planned.network_type);
        controller::changed(&mut out, "name", &self.name, &planned.name);
        out
    }
}

#[async_trait]
impl Controller for Network {
    async fn create(&self, ctx: &Context, diags: &mut Diagnostics) -> Option<Self> {
        let network = ctx.remote().network();
        let property = self.network_type.property();
        let current = ok_or_record(network.property(&self.app_name, property).await, diags, None)?;
        if current.is_some() {
            controller::already_exists(
                diags,
                "type",
                format!("{} network on app {}", self.network_type, self.app_name),
            );
            return None;
        }

        if !ok_or_record(network.exists(&self.name).await, diags, Some("name"))? {
            tracing::info!(network = %self.name, "Creating docker network");
            ok_or_record(network.create(&self.name).await, diags, Some("name"))?;
        }
        ok_or_record(
            network.set(&self.app_name, property, &self.name).await,
            diags,
            Some("name"),
        )?;
        Some(self.clone())
    }

    async fn read(&self, ctx: &Context, diags: &mut Diagnostics) -> Option<Self> {
        let network = ctx.remote().network();
        let property = self.network_type.property();
        match probe(network.property(&self.app_name, property).await, diags) {
            Probe::Found(Some(name)) => Some(Self {
                name,
                ..self.clone()
            }),
            Probe::Found(None) | Probe::Gone => None,
            Probe::Failed => Some(self.clone()),
        }
    }

    async fn update(&self, _prior: &Self, _ctx: &Context, _diags: &mut Diagnostics) -> Option<Self> {
        Some(self.clone())
    }

    /// Detaches the app; the docker network itself is left for other apps
    async fn delete(&self, ctx: &Context, diags: &mut Diagnostics) {
        let network = ctx.remote().network();
        let property = self.network_type.property();
        let current = network.property(&self.app_name, property).await;
        let Some(Some(_)) = present_or_gone(current, diags) else {
            return;
        };
        if let Err(e) = network.unset(&self.app_name, property).await {
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

    fn attach(name: &str) -> Network {
        Network {
            app_name: "web".into(),
            network_type: NetworkType::Attach,
            name: name.into(),
        }
    }

    #[tokio::test]
    async fn test_create_makes_missing_network() {
        let fake = Arc::new(FakeTransport::new());
        fake.on(
            "network:exists backend",
            Reply::fail("Network backend does not exist", 1),
        );
        let ctx = context(&fake);

        let (state, diags) = controller::create(&ctx, &attach("backend")).await;
        assert!(!diags.has_errors());
        assert!(state.is_some());
        assert_eq!(
            fake.mutations(),
            vec![
                "network:create backend",
                "network:set web attach-post-deploy backend",
            ]
        );
    }

    #[tokio::test]
    async fn test_renaming_is_a_replacement() {
        let fake = Arc::new(FakeTransport::new());
        let ctx = context(&fake);

        let (state, diags) =
            controller::update(&ctx, &attach("backend"), &attach("frontend")).await;
        assert!(state.is_none());
        assert!(diags.error_at("name").is_some());
        assert!(fake.commands().is_empty());
    }

    #[tokio::test]
    async fn test_read_refreshes_name() {
        let fake = Arc::new(FakeTransport::new());
        fake.on(
            "network:report web",
            Reply::ok("=====> web network information\n       Network attach post deploy:    shared\n       Network initial network:\n"),
        );
        let ctx = context(&fake);

        let (state, _) = controller::read(&ctx, &attach("backend")).await;
        assert_eq!(state, Some(attach("shared")));

        let initial = Network {
            network_type: NetworkType::Initial,
            ..attach("backend")
        };
        let (state, _) = controller::read(&ctx, &initial).await;
        assert!(state.is_none());
    }
}
