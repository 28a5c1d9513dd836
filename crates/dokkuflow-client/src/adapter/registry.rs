//! `registry:*`
//!
//! The password is the last positional argument and is redacted.

use crate::client::Remote;
use crate::command::Invocation;
use crate::error::Result;
use crate::report::Report;

pub struct Registry<'a> {
    remote: Remote<'a>,
}

impl<'a> Registry<'a> {
    pub fn new(remote: Remote<'a>) -> Self {
        Self { remote }
    }

    pub async fn login(&self, server: &str, username: &str, password: &str) -> Result<()> {
        tracing::info!(server = %server, username = %username, "Logging in to registry");
        self.remote
            .run(
                Invocation::new("registry:login")
                    .arg(server)
                    .arg(username)
                    .secret_arg(password),
            )
            .await?;
        Ok(())
    }

    pub async fn logout(&self, server: &str) -> Result<()> {
        self.remote
            .run(Invocation::new("registry:logout").arg(server))
            .await?;
        Ok(())
    }

    /// Registry server an app pushes to and pulls from; empty when unset
    pub async fn server(&self, app: &str) -> Result<String> {
        let output = self
            .remote
            .run_for_app(app, Invocation::new("registry:report").arg(app))
            .await?;
        Ok(Report::parse(&output.stdout).value("registry server"))
    }

    pub async fn set_server(&self, app: &str, server: &str) -> Result<()> {
        self.remote
            .run_for_app(
                app,
                Invocation::new("registry:set").arg(app).arg("server").arg(server),
            )
            .await?;
        Ok(())
    }

    pub async fn unset_server(&self, app: &str) -> Result<()> {
        self.remote
            .run_for_app(app, Invocation::new("registry:set").arg(app).arg("server"))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::adapter::test_support::client;
    use crate::testing::FakeTransport;
    use std::sync::Arc;
    use tokio_util::sync::CancellationToken;

    #[tokio::test]
    async fn test_login_password_last() {
        let fake = Arc::new(FakeTransport::new());
        let client = client(&fake);
        let cancel = CancellationToken::new();

        client
            .remote(&cancel)
            .registry()
            .login("ghcr.io", "bot", "ghp_token")
            .await
            .unwrap();
        assert_eq!(fake.commands(), vec!["registry:login ghcr.io bot ghp_token"]);
    }
}
