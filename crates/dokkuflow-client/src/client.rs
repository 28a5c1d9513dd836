//! Dokku client and the cancellation-scoped `Remote` handle

use crate::adapter::{
    Apps, Checks, Config, DockerOptions, Domains, Git, HttpAuth, Letsencrypt, Network, Nginx,
    Plugins, Ports, Proxy, Registry, Services, Storage,
};
use crate::capability::{self, Capabilities};
use crate::command::Invocation;
use crate::error::{ClientError, Result};
use crate::invoker::{Invoker, Output};
use crate::sentinel;
use dokkuflow_ssh::Transport;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientOptions {
    /// Emit every command at ERROR level
    pub log_commands: bool,
    /// Refuse hosts outside the tested version range
    pub fail_on_untested_version: bool,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            log_commands: false,
            fail_on_untested_version: true,
        }
    }
}

/// Connection to one Dokku host
///
/// Owns the serialized invoker and the lazily probed capabilities. Build
/// one per remote target and share it (`Arc<DokkuClient>`) between every
/// resource operation against that target.
pub struct DokkuClient {
    invoker: Invoker,
    capabilities: OnceCell<Capabilities>,
    options: ClientOptions,
}

impl DokkuClient {
    pub fn new(transport: Arc<dyn Transport>, options: ClientOptions) -> Self {
        Self {
            invoker: Invoker::new(transport).with_command_logging(options.log_commands),
            capabilities: OnceCell::new(),
            options,
        }
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    pub fn invoker(&self) -> &Invoker {
        &self.invoker
    }

    /// Scope adapter calls to one cancellation token
    pub fn remote<'a>(&'a self, cancel: &'a CancellationToken) -> Remote<'a> {
        Remote {
            client: self,
            cancel,
        }
    }

    /// Capabilities of the host, probed on first call
    pub async fn capabilities(&self, cancel: &CancellationToken) -> Result<&Capabilities> {
        self.capabilities
            .get_or_try_init(|| {
                capability::probe(&self.invoker, cancel, self.options.fail_on_untested_version)
            })
            .await
    }
}

/// Client handle bound to a cancellation token
#[derive(Clone, Copy)]
pub struct Remote<'a> {
    client: &'a DokkuClient,
    cancel: &'a CancellationToken,
}

impl<'a> Remote<'a> {
    pub fn cancel_token(&self) -> &'a CancellationToken {
        self.cancel
    }

    pub async fn capabilities(&self) -> Result<&'a Capabilities> {
        self.client.capabilities(self.cancel).await
    }

    pub async fn run(&self, invocation: Invocation) -> Result<Output> {
        self.client.invoker.invoke(&invocation, self.cancel).await
    }

    /// Run a command whose failure may mean the subject is absent
    ///
    /// Returns `Ok(None)` when the failure output matches `missing`.
    pub async fn run_present(
        &self,
        invocation: Invocation,
        missing: impl Fn(&str) -> bool,
    ) -> Result<Option<Output>> {
        match self.run(invocation).await {
            Ok(output) => Ok(Some(output)),
            Err(ClientError::Remote { output, .. }) if missing(&output) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Run an existence check (`*:exists`, `*:installed`)
    ///
    /// Exit status 0 is presence. A failure counts as absence when it
    /// matches `missing`; any other failure is an error.
    pub async fn check(
        &self,
        invocation: Invocation,
        missing: impl Fn(&str) -> bool,
    ) -> Result<bool> {
        Ok(self.run_present(invocation, missing).await?.is_some())
    }

    /// Run a command against an app, turning the missing-app sentinel into
    /// [`ClientError::NotFound`]
    pub async fn run_for_app(&self, app: &str, invocation: Invocation) -> Result<Output> {
        self.run(invocation).await.map_err(|e| match e {
            ClientError::Remote { ref output, .. } if sentinel::is_app_missing(output, app) => {
                ClientError::NotFound(format!("App {}", app))
            }
            other => other,
        })
    }

    /// Run a command and stream `lines` into its stdin
    pub async fn interactive(&self, invocation: Invocation, lines: &[String]) -> Result<Output> {
        self.client
            .invoker
            .invoke_interactive(&invocation, lines, self.cancel)
            .await
    }

    pub fn apps(&self) -> Apps<'a> {
        Apps::new(*self)
    }

    pub fn config(&self) -> Config<'a> {
        Config::new(*self)
    }

    pub fn checks(&self) -> Checks<'a> {
        Checks::new(*self)
    }

    pub fn domains(&self) -> Domains<'a> {
        Domains::new(*self)
    }

    pub fn ports(&self) -> Ports<'a> {
        Ports::new(*self)
    }

    pub fn proxy(&self) -> Proxy<'a> {
        Proxy::new(*self)
    }

    pub fn storage(&self) -> Storage<'a> {
        Storage::new(*self)
    }

    pub fn docker_options(&self) -> DockerOptions<'a> {
        DockerOptions::new(*self)
    }

    pub fn http_auth(&self) -> HttpAuth<'a> {
        HttpAuth::new(*self)
    }

    pub fn letsencrypt(&self) -> Letsencrypt<'a> {
        Letsencrypt::new(*self)
    }

    pub fn nginx(&self) -> Nginx<'a> {
        Nginx::new(*self)
    }

    pub fn network(&self) -> Network<'a> {
        Network::new(*self)
    }

    pub fn plugins(&self) -> Plugins<'a> {
        Plugins::new(*self)
    }

    pub fn registry(&self) -> Registry<'a> {
        Registry::new(*self)
    }

    pub fn git(&self) -> Git<'a> {
        Git::new(*self)
    }

    pub fn services(&self) -> Services<'a> {
        Services::new(*self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeTransport, Reply};

    fn client(fake: &Arc<FakeTransport>) -> DokkuClient {
        DokkuClient::new(fake.clone(), ClientOptions::default())
    }

    #[tokio::test]
    async fn test_capabilities_probed_once() {
        let fake = Arc::new(FakeTransport::new().with_version("0.31.2"));
        let client = client(&fake);
        let cancel = CancellationToken::new();

        client.capabilities(&cancel).await.unwrap();
        client.capabilities(&cancel).await.unwrap();
        assert_eq!(fake.commands_matching("version").len(), 1);
    }

    #[tokio::test]
    async fn test_run_for_app_maps_missing_app() {
        let fake = Arc::new(FakeTransport::new());
        fake.on("apps:report web", Reply::fail(" !     App web does not exist", 1));
        let client = client(&fake);
        let cancel = CancellationToken::new();

        let err = client
            .remote(&cancel)
            .run_for_app("web", Invocation::new("apps:report").arg("web"))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "App web does not exist");
    }

    #[tokio::test]
    async fn test_check_distinguishes_absent_from_error() {
        let fake = Arc::new(FakeTransport::new());
        fake.on("apps:exists web", Reply::fail(" !     App web does not exist", 1));
        fake.on("apps:exists api", Reply::fail("permission denied", 1));
        let client = client(&fake);
        let cancel = CancellationToken::new();
        let remote = client.remote(&cancel);

        assert!(
            !remote
                .check(Invocation::new("apps:exists").arg("web"), sentinel::is_missing)
                .await
                .unwrap()
        );
        assert!(
            remote
                .check(Invocation::new("apps:exists").arg("api"), sentinel::is_missing)
                .await
                .is_err()
        );
    }
}
