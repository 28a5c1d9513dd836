//! Simple services (`<plugin>:*`)
//!
//! Every datastore plugin exposes the same command family, so one adapter
//! serves them all, parametrized by [`ServiceKind`].

use crate::client::Remote;
use crate::command::Invocation;
use crate::error::{ClientError, Result};
use crate::report::Report;
use crate::sentinel;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceKind {
    Postgres,
    Mysql,
    Mongo,
    Redis,
    Rabbitmq,
    Elasticsearch,
    Clickhouse,
    Couchdb,
    Nats,
    Rethinkdb,
    Mariadb,
}

impl ServiceKind {
    pub const ALL: [ServiceKind; 11] = [
        ServiceKind::Postgres,
        ServiceKind::Mysql,
        ServiceKind::Mongo,
        ServiceKind::Redis,
        ServiceKind::Rabbitmq,
        ServiceKind::Elasticsearch,
        ServiceKind::Clickhouse,
        ServiceKind::Couchdb,
        ServiceKind::Nats,
        ServiceKind::Rethinkdb,
        ServiceKind::Mariadb,
    ];

    /// Plugin name and command namespace
    pub fn plugin(&self) -> &'static str {
        match self {
            ServiceKind::Postgres => "postgres",
            ServiceKind::Mysql => "mysql",
            ServiceKind::Mongo => "mongo",
            ServiceKind::Redis => "redis",
            ServiceKind::Rabbitmq => "rabbitmq",
            ServiceKind::Elasticsearch => "elasticsearch",
            ServiceKind::Clickhouse => "clickhouse",
            ServiceKind::Couchdb => "couchdb",
            ServiceKind::Nats => "nats",
            ServiceKind::Rethinkdb => "rethinkdb",
            ServiceKind::Mariadb => "mariadb",
        }
    }

    fn verb(&self, action: &str) -> String {
        format!("{}:{}", self.plugin(), action)
    }
}

impl fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.plugin())
    }
}

impl FromStr for ServiceKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        ServiceKind::ALL
            .into_iter()
            .find(|kind| kind.plugin() == s)
            .ok_or_else(|| format!("unknown service type '{}'", s))
    }
}

/// Split `image[:tag]` into `--image` / `--image-version` values
pub fn split_image(image: &str) -> (&str, Option<&str>) {
    // A colon before the last slash belongs to a registry port
    match image.rsplit_once(':') {
        Some((name, tag)) if !tag.contains('/') => (name, Some(tag)),
        _ => (image, None),
    }
}

pub struct Services<'a> {
    remote: Remote<'a>,
}

impl<'a> Services<'a> {
    pub fn new(remote: Remote<'a>) -> Self {
        Self { remote }
    }

    fn missing(kind: ServiceKind, name: &str, err: ClientError) -> ClientError {
        match err {
            ClientError::Remote { ref output, .. } if sentinel::is_service_missing(output, name) => {
                ClientError::NotFound(format!("{} service {}", kind, name))
            }
            other => other,
        }
    }

    pub async fn exists(&self, kind: ServiceKind, name: &str) -> Result<bool> {
        self.remote
            .check(Invocation::new(kind.verb("exists")).arg(name), |out| {
                sentinel::is_service_missing(out, name)
            })
            .await
    }

    pub async fn create(
        &self,
        kind: ServiceKind,
        name: &str,
        image: Option<&str>,
        config_options: Option<&str>,
    ) -> Result<()> {
        tracing::info!(service = %kind, name = %name, "Creating service");
        let mut invocation = Invocation::new(kind.verb("create")).arg(name);
        if let Some(image) = image {
            let (image, version) = split_image(image);
            invocation = invocation.arg("--image").arg(image);
            if let Some(version) = version {
                invocation = invocation.arg("--image-version").arg(version);
            }
        }
        if let Some(options) = config_options {
            invocation = invocation.arg("--config-options").arg(options);
        }
        self.remote.run(invocation).await?;
        Ok(())
    }

    pub async fn destroy(&self, kind: ServiceKind, name: &str) -> Result<()> {
        tracing::info!(service = %kind, name = %name, "Destroying service");
        self.remote
            .run(Invocation::new(kind.verb("destroy")).arg(name).arg("--force"))
            .await
            .map_err(|e| Self::missing(kind, name, e))?;
        Ok(())
    }

    pub async fn info(&self, kind: ServiceKind, name: &str) -> Result<Report> {
        let output = self
            .remote
            .run(Invocation::new(kind.verb("info")).arg(name))
            .await
            .map_err(|e| Self::missing(kind, name, e))?;
        Ok(Report::parse(&output.stdout))
    }

    pub async fn expose(&self, kind: ServiceKind, name: &str, ports: &str) -> Result<()> {
        self.remote
            .run(Invocation::new(kind.verb("expose")).arg(name).args(ports.split_whitespace()))
            .await
            .map_err(|e| Self::missing(kind, name, e))?;
        Ok(())
    }

    pub async fn unexpose(&self, kind: ServiceKind, name: &str) -> Result<()> {
        self.remote
            .run(Invocation::new(kind.verb("unexpose")).arg(name))
            .await
            .map_err(|e| Self::missing(kind, name, e))?;
        Ok(())
    }

    pub async fn link(
        &self,
        kind: ServiceKind,
        name: &str,
        app: &str,
        alias: Option<&str>,
    ) -> Result<()> {
        let mut invocation = Invocation::new(kind.verb("link")).arg(name).arg(app);
        if let Some(alias) = alias {
            invocation = invocation.arg("--alias").arg(alias);
        }
        self.remote
            .run_for_app(app, invocation)
            .await
            .map_err(|e| Self::missing(kind, name, e))?;
        Ok(())
    }

    /// Unlinking a link that is already gone succeeds
    pub async fn unlink(&self, kind: ServiceKind, name: &str, app: &str) -> Result<()> {
        match self
            .remote
            .run_for_app(app, Invocation::new(kind.verb("unlink")).arg(name).arg(app))
            .await
        {
            Ok(_) => Ok(()),
            Err(ClientError::Remote { output, .. }) if sentinel::is_not_linked(&output) => Ok(()),
            Err(e) => Err(Self::missing(kind, name, e)),
        }
    }

    pub async fn linked(&self, kind: ServiceKind, name: &str, app: &str) -> Result<bool> {
        match self
            .remote
            .run_for_app(app, Invocation::new(kind.verb("linked")).arg(name).arg(app))
            .await
        {
            Ok(_) => Ok(true),
            Err(ClientError::Remote { ref output, .. })
                if sentinel::is_service_missing(output, name) =>
            {
                Err(ClientError::NotFound(format!("{} service {}", kind, name)))
            }
            Err(ClientError::Remote { status, ref output })
                if sentinel::is_not_linked(output) || (status == 1 && output.trim().is_empty()) =>
            {
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::test_support::client;
    use crate::testing::{FakeTransport, Reply};
    use std::sync::Arc;
    use tokio_util::sync::CancellationToken;

    #[test]
    fn test_split_image() {
        assert_eq!(split_image("postgres:15"), ("postgres", Some("15")));
        assert_eq!(split_image("postgres"), ("postgres", None));
        assert_eq!(
            split_image("registry.local:5000/postgres"),
            ("registry.local:5000/postgres", None)
        );
        assert_eq!(
            split_image("registry.local:5000/postgres:15"),
            ("registry.local:5000/postgres", Some("15"))
        );
    }

    #[test]
    fn test_kind_round_trip_names() {
        for kind in ServiceKind::ALL {
            assert_eq!(kind.plugin().parse::<ServiceKind>(), Ok(kind));
        }
        assert!("memcached".parse::<ServiceKind>().is_err());
    }

    #[tokio::test]
    async fn test_exists_sentinel() {
        let fake = Arc::new(FakeTransport::new());
        fake.on(
            "postgres:exists db",
            Reply::fail(" !     Postgres service db does not exist", 1),
        );
        let client = client(&fake);
        let cancel = CancellationToken::new();

        let services = client.remote(&cancel).services();
        assert!(!services.exists(ServiceKind::Postgres, "db").await.unwrap());
        assert!(services.exists(ServiceKind::Redis, "cache").await.unwrap());
    }

    #[tokio::test]
    async fn test_create_with_image_and_options() {
        let fake = Arc::new(FakeTransport::new());
        let client = client(&fake);
        let cancel = CancellationToken::new();

        client
            .remote(&cancel)
            .services()
            .create(
                ServiceKind::Postgres,
                "db",
                Some("postgres:15"),
                Some("--max-connections 100"),
            )
            .await
            .unwrap();
        assert_eq!(
            fake.commands(),
            vec!["postgres:create db --image postgres --image-version 15 --config-options '--max-connections 100'"]
        );
    }

    #[tokio::test]
    async fn test_link_alias_and_linked() {
        let fake = Arc::new(FakeTransport::new());
        fake.on("redis:linked cache web", Reply::fail("", 1));
        let client = client(&fake);
        let cancel = CancellationToken::new();
        let services = client.remote(&cancel).services();

        assert!(!services.linked(ServiceKind::Redis, "cache", "web").await.unwrap());
        services
            .link(ServiceKind::Redis, "cache", "web", Some("PRIMARY"))
            .await
            .unwrap();
        assert_eq!(
            fake.commands(),
            vec!["redis:linked cache web", "redis:link cache web --alias PRIMARY"]
        );
    }

    #[tokio::test]
    async fn test_linked_propagates_unrelated_failures() {
        let fake = Arc::new(FakeTransport::new());
        fake.on("postgres:linked db web", Reply::fail("sudo: permission denied", 1));
        fake.on(
            "postgres:linked db api",
            Reply::fail(" !     Service db is not linked to api", 1),
        );
        let client = client(&fake);
        let cancel = CancellationToken::new();
        let services = client.remote(&cancel).services();

        let err = services
            .linked(ServiceKind::Postgres, "db", "web")
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(1));
        assert!(!err.is_not_found());
        assert!(!services.linked(ServiceKind::Postgres, "db", "api").await.unwrap());
    }

    #[tokio::test]
    async fn test_unlink_tolerates_missing_link() {
        let fake = Arc::new(FakeTransport::new());
        fake.on(
            "mysql:unlink db web",
            Reply::fail(" !     Service db is not linked to web", 1),
        );
        let client = client(&fake);
        let cancel = CancellationToken::new();

        client
            .remote(&cancel)
            .services()
            .unlink(ServiceKind::Mysql, "db", "web")
            .await
            .unwrap();
    }
}
