use crate::controller::{self, Context, Controller, Model};
use crate::diagnostics::{AttributePath, Diagnostics};
use crate::resources::{Probe, ok_or_record, present_or_gone, probe};
use crate::validate;
use async_trait::async_trait;
use dokkuflow_client::PortMapping;
use serde::{Deserialize, Serialize};

const SCHEMES: [&str; 4] = ["http", "https", "tcp", "udp"];

/// Proxy port mapping, unique per host port
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Port {
    pub app_name: String,
    pub scheme: String,
    pub host_port: u16,
    pub container_port: u16,
}

impl Port {
    fn mapping(&self) -> PortMapping {
        PortMapping::new(self.scheme.clone(), self.host_port, self.container_port)
    }

    fn find(&self, mappings: Vec<PortMapping>) -> Option<PortMapping> {
        mappings.into_iter().find(|m| m.host_port == self.host_port)
    }
}

impl Model for Port {
    const KIND: &'static str = "port";

    fn identity(&self) -> String {
        format!("{}/{}", self.app_name, self.host_port)
    }

    fn validate(&self, diags: &mut Diagnostics) {
        validate::name(diags, "app_name", &self.app_name);
        validate::one_of(diags, "scheme", &self.scheme, &SCHEMES);
        validate::port(diags, "host_port", self.host_port);
        validate::port(diags, "container_port", self.container_port);
    }

    fn immutable_changes(&self, planned: &Self) -> Vec<AttributePath> {
        let mut out = Vec::new();
        controller::changed(&mut out, "app_name", &self.app_name, &planned.app_name);
        controller::changed(&mut out, "host_port", &self.host_port, &planned.host_port);
        out
    }
}

#[async_trait]
impl Controller for Port {
    async fn create(&self, ctx: &Context, diags: &mut Diagnostics) -> Option<Self> {
        let ports = ctx.remote().ports();
        let mappings = ok_or_record(ports.list(&self.app_name).await, diags, None)?;
        if let Some(existing) = self.find(mappings) {
            controller::already_exists(
                diags,
                "host_port",
                format!("port mapping {} on app {}", existing, self.app_name),
            );
            return None;
        }
        ok_or_record(
            ports.add(&self.app_name, &[self.mapping()]).await,
            diags,
            Some("host_port"),
        )?;
        Some(self.clone())
    }

    async fn read(&self, ctx: &Context, diags: &mut Diagnostics) -> Option<Self> {
        match probe(ctx.remote().ports().list(&self.app_name).await, diags) {
            Probe::Found(mappings) => self.find(mappings).map(|m| Self {
                scheme: m.scheme,
                container_port: m.container_port,
                ..self.clone()
            }),
            Probe::Gone => None,
            Probe::Failed => Some(self.clone()),
        }
    }

    async fn update(&self, prior: &Self, ctx: &Context, diags: &mut Diagnostics) -> Option<Self> {
        let ports = ctx.remote().ports();
        ok_or_record(
            ports.remove(&self.app_name, &[prior.mapping()]).await,
            diags,
            Some("host_port"),
        )?;
        ok_or_record(
            ports.add(&self.app_name, &[self.mapping()]).await,
            diags,
            Some("host_port"),
        )?;
        Some(self.clone())
    }

    async fn delete(&self, ctx: &Context, diags: &mut Diagnostics) {
        let ports = ctx.remote().ports();
        let Some(mappings) = present_or_gone(ports.list(&self.app_name).await, diags) else {
            return;
        };
        let Some(existing) = self.find(mappings) else {
            return;
        };
        if let Err(e) = ports.remove(&self.app_name, &[existing]).await {
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

    const LISTING: &str = "-----> Port mappings for web
    -----> scheme  host port  container port
    http           80         5000
";

    fn port(scheme: &str, host: u16, container: u16) -> Port {
        Port {
            app_name: "web".into(),
            scheme: scheme.into(),
            host_port: host,
            container_port: container,
        }
    }

    #[tokio::test]
    async fn test_create_uses_version_specific_verb() {
        let legacy = Arc::new(FakeTransport::new().with_version("0.30.0"));
        let ctx = context(&legacy);
        let (_, diags) = controller::create(&ctx, &port("http", 8080, 5000)).await;
        assert!(!diags.has_errors());
        assert_eq!(legacy.mutations(), vec!["proxy:ports-add web http:8080:5000"]);

        let current = Arc::new(FakeTransport::new().with_version("0.34.4"));
        let ctx = context(&current);
        let (_, diags) = controller::create(&ctx, &port("http", 8080, 5000)).await;
        assert!(!diags.has_errors());
        assert_eq!(current.mutations(), vec!["ports:add web http:8080:5000"]);
    }

    #[tokio::test]
    async fn test_create_rejects_taken_host_port() {
        let fake = Arc::new(FakeTransport::new().with_version("0.34.4"));
        fake.on("ports:list web", Reply::ok(LISTING));
        let ctx = context(&fake);

        let (state, diags) = controller::create(&ctx, &port("https", 80, 5000)).await;
        assert!(state.is_none());
        assert!(diags.error_at("host_port").is_some());
    }

    #[tokio::test]
    async fn test_read_refreshes_container_port() {
        let fake = Arc::new(FakeTransport::new().with_version("0.34.4"));
        fake.on("ports:list web", Reply::ok(LISTING));
        let ctx = context(&fake);

        let (state, _) = controller::read(&ctx, &port("http", 80, 3000)).await;
        assert_eq!(state, Some(port("http", 80, 5000)));

        let (state, _) = controller::read(&ctx, &port("http", 443, 5000)).await;
        assert!(state.is_none());
    }

    #[tokio::test]
    async fn test_update_removes_then_adds() {
        let fake = Arc::new(FakeTransport::new().with_version("0.34.4"));
        let ctx = context(&fake);

        let (state, diags) =
            controller::update(&ctx, &port("http", 80, 5000), &port("http", 80, 8000)).await;
        assert!(!diags.has_errors());
        assert!(state.is_some());
        assert_eq!(
            fake.mutations(),
            vec!["ports:remove web http:80:5000", "ports:add web http:80:8000"]
        );
    }
}
