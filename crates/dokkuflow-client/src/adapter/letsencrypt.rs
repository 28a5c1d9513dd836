//! `letsencrypt:*`

use crate::client::Remote;
use crate::command::Invocation;
use crate::error::Result;
use crate::report::{Report, is_banner};

pub struct Letsencrypt<'a> {
    remote: Remote<'a>,
}

impl<'a> Letsencrypt<'a> {
    pub fn new(remote: Remote<'a>) -> Self {
        Self { remote }
    }

    /// Configured contact email; empty when unset
    pub async fn email(&self, app: &str) -> Result<String> {
        let output = self
            .remote
            .run_for_app(app, Invocation::new("letsencrypt:report").arg(app))
            .await?;
        Ok(Report::parse(&output.stdout).value("letsencrypt email"))
    }

    /// Whether the app has an active certificate
    pub async fn active(&self, app: &str) -> Result<bool> {
        let output = self.remote.run(Invocation::new("letsencrypt:list")).await?;
        Ok(active_apps(&output.stdout).iter().any(|a| a == app))
    }

    pub async fn set_email(&self, app: &str, email: &str) -> Result<()> {
        self.remote
            .run_for_app(
                app,
                Invocation::new("letsencrypt:set").arg(app).arg("email").arg(email),
            )
            .await?;
        Ok(())
    }

    pub async fn enable(&self, app: &str) -> Result<()> {
        self.remote
            .run_for_app(app, Invocation::new("letsencrypt:enable").arg(app))
            .await?;
        Ok(())
    }

    pub async fn disable(&self, app: &str) -> Result<()> {
        self.remote
            .run_for_app(app, Invocation::new("letsencrypt:disable").arg(app))
            .await?;
        Ok(())
    }

    /// Install the renewal cron job (idempotent on the remote)
    pub async fn add_cron_job(&self) -> Result<()> {
        self.remote
            .run(Invocation::new("letsencrypt:cron-job").arg("--add"))
            .await?;
        Ok(())
    }
}

/// First column of each `letsencrypt:list` row
fn active_apps(output: &str) -> Vec<String> {
    output
        .lines()
        .filter(|line| !is_banner(line))
        .filter_map(|line| line.split_whitespace().next())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use crate::adapter::test_support::client;
    use crate::testing::{FakeTransport, Reply};
    use std::sync::Arc;
    use tokio_util::sync::CancellationToken;

    #[tokio::test]
    async fn test_active_from_list() {
        let fake = Arc::new(FakeTransport::new());
        fake.on(
            "letsencrypt:list",
            Reply::ok("-----> App name           Certificate Expiry        Time before expiry        Time before renewal\nweb                        2026-12-01 10:00:00       42d, 1h, 2m, 3s           12d, 1h, 2m, 3s\n"),
        );
        let client = client(&fake);
        let cancel = CancellationToken::new();
        let le = client.remote(&cancel).letsencrypt();

        assert!(le.active("web").await.unwrap());
        assert!(!le.active("api").await.unwrap());
    }

    #[tokio::test]
    async fn test_email() {
        let fake = Arc::new(FakeTransport::new());
        fake.on(
            "letsencrypt:report web",
            Reply::ok("=====> web letsencrypt information\n       Letsencrypt email:             ops@example.com\n"),
        );
        let client = client(&fake);
        let cancel = CancellationToken::new();

        let email = client.remote(&cancel).letsencrypt().email("web").await.unwrap();
        assert_eq!(email, "ops@example.com");
    }
}
