//! `apps:*`

use crate::client::Remote;
use crate::command::Invocation;
use crate::error::Result;
use crate::report::{Report, list_lines};
use crate::sentinel;

/// Deploy source recorded by `apps:report`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeploySourceReport {
    /// `docker-image`, `git-sync`, `tar`, ... (empty when never deployed)
    pub source: String,
    pub metadata: String,
}

pub struct Apps<'a> {
    remote: Remote<'a>,
}

impl<'a> Apps<'a> {
    pub fn new(remote: Remote<'a>) -> Self {
        Self { remote }
    }

    pub async fn exists(&self, app: &str) -> Result<bool> {
        self.remote
            .check(Invocation::new("apps:exists").arg(app), |out| {
                sentinel::is_app_missing(out, app)
            })
            .await
    }

    pub async fn create(&self, app: &str) -> Result<()> {
        tracing::info!(app = %app, "Creating app");
        self.remote.run(Invocation::new("apps:create").arg(app)).await?;
        Ok(())
    }

    pub async fn destroy(&self, app: &str) -> Result<()> {
        tracing::info!(app = %app, "Destroying app");
        self.remote
            .run(Invocation::new("apps:destroy").arg(app).arg("--force"))
            .await?;
        Ok(())
    }

    pub async fn list(&self) -> Result<Vec<String>> {
        let output = self.remote.run(Invocation::new("apps:list")).await?;
        Ok(list_lines(&output.stdout))
    }

    pub async fn report(&self, app: &str) -> Result<Report> {
        let output = self
            .remote
            .run_for_app(app, Invocation::new("apps:report").arg(app))
            .await?;
        Ok(Report::parse(&output.stdout))
    }

    pub async fn deploy_source(&self, app: &str) -> Result<DeploySourceReport> {
        let report = self.report(app).await?;
        Ok(DeploySourceReport {
            source: report.value("app deploy source"),
            metadata: report.value("app deploy source metadata"),
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::adapter::test_support::client;
    use crate::testing::{FakeTransport, Reply};
    use std::sync::Arc;
    use tokio_util::sync::CancellationToken;

    #[tokio::test]
    async fn test_exists_and_create() {
        let fake = Arc::new(FakeTransport::new());
        fake.on("apps:exists web", Reply::fail(" !     App web does not exist", 1));
        let client = client(&fake);
        let cancel = CancellationToken::new();
        let apps = client.remote(&cancel).apps();

        assert!(!apps.exists("web").await.unwrap());
        apps.create("web").await.unwrap();
        apps.destroy("web").await.unwrap();

        assert_eq!(
            fake.commands(),
            vec!["apps:exists web", "apps:create web", "apps:destroy web --force"]
        );
    }

    #[tokio::test]
    async fn test_list_skips_banner() {
        let fake = Arc::new(FakeTransport::new());
        fake.on("apps:list", Reply::ok("=====> My Apps\napi\nweb\n"));
        let client = client(&fake);
        let cancel = CancellationToken::new();

        let apps = client.remote(&cancel).apps().list().await.unwrap();
        assert_eq!(apps, vec!["api", "web"]);
    }

    #[tokio::test]
    async fn test_deploy_source() {
        let fake = Arc::new(FakeTransport::new());
        fake.on(
            "apps:report web",
            Reply::ok(
                "=====> web app information\n       App created at:  1700000000\n       App deploy source:  docker-image\n       App deploy source metadata:  nginx:1.25\n",
            ),
        );
        let client = client(&fake);
        let cancel = CancellationToken::new();

        let source = client.remote(&cancel).apps().deploy_source("web").await.unwrap();
        assert_eq!(source.source, "docker-image");
        assert_eq!(source.metadata, "nginx:1.25");
    }
}
