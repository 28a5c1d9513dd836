use crate::GlobalArgs;
use anyhow::Context as _;
use dokkuflow_client::DokkuClient;
use dokkuflow_config::{Manifest, ProviderConfig, find_manifest, parse_manifest_file};
use dokkuflow_resource::{Context, Engine, GlobalState, StateLock, StateManager};
use dokkuflow_ssh::SshTransport;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Manifest, provider settings and state location for one invocation
pub struct Session {
    pub manifest_path: PathBuf,
    pub manifest: Manifest,
    pub provider: ProviderConfig,
    pub state: StateManager,
}

impl Session {
    /// Load the manifest and resolve provider settings; no remote calls
    pub fn load(args: &GlobalArgs) -> anyhow::Result<Self> {
        let manifest_path = match &args.config {
            Some(path) => path.clone(),
            None => find_manifest()?,
        };
        let manifest = parse_manifest_file(&manifest_path)
            .with_context(|| format!("failed to load {}", manifest_path.display()))?;

        let mut provider = manifest.provider.clone();
        provider.apply_env()?;
        apply_flags(&mut provider, args);

        let state_root = match &args.state_dir {
            Some(dir) => dir.clone(),
            None => manifest_path
                .parent()
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(".")),
        };

        tracing::debug!(
            manifest = %manifest_path.display(),
            resources = manifest.resources.len(),
            "Session loaded"
        );

        Ok(Self {
            manifest_path,
            manifest,
            provider,
            state: StateManager::new(state_root),
        })
    }

    pub fn client(&self) -> anyhow::Result<Arc<DokkuClient>> {
        let ssh = self.provider.ssh_config()?;
        tracing::debug!(destination = %ssh.destination(), port = ssh.port, "Connecting");
        let transport = SshTransport::new(ssh).context("failed to prepare the SSH transport")?;
        Ok(Arc::new(DokkuClient::new(
            Arc::new(transport),
            self.provider.client_options(),
        )))
    }

    pub fn engine(&self, cancel: CancellationToken) -> anyhow::Result<Engine> {
        let ctx = Context::new(self.client()?, cancel).with_upload(self.provider.upload_settings());
        Ok(Engine::new(ctx))
    }

    /// Lock and load the state file
    pub async fn open_state(&self) -> anyhow::Result<(StateLock, GlobalState)> {
        let lock = self
            .state
            .acquire_lock()
            .await
            .context("another dokkuflow run holds the state lock")?;
        let state = self.state.load().await.with_context(|| {
            format!("failed to read {}", self.state.state_path().display())
        })?;
        Ok((lock, state))
    }

    pub async fn save_state(&self, state: &GlobalState) -> anyhow::Result<()> {
        self.state
            .save(state)
            .await
            .with_context(|| format!("failed to write {}", self.state.state_path().display()))
    }
}

fn apply_flags(provider: &mut ProviderConfig, args: &GlobalArgs) {
    if let Some(host) = &args.ssh_host {
        provider.ssh_host = Some(host.clone());
    }
    if let Some(port) = args.ssh_port {
        provider.ssh_port = port;
    }
    if let Some(user) = &args.ssh_user {
        provider.ssh_user = user.clone();
    }
    if let Some(cert) = &args.ssh_cert {
        provider.ssh_cert = cert.clone();
    }
    if args.log_ssh_commands {
        provider.log_ssh_commands = true;
    }
}

/// Token cancelled on the first Ctrl-C
pub fn cancel_on_ctrl_c() -> CancellationToken {
    let cancel = CancellationToken::new();
    let token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, cancelling remaining operations");
            token.cancel();
        }
    });
    cancel
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_provider() {
        let mut provider = ProviderConfig {
            ssh_host: Some("manifest.example.com".into()),
            ..Default::default()
        };
        let args = GlobalArgs {
            ssh_host: Some("flag.example.com".into()),
            ssh_port: Some(2200),
            log_ssh_commands: true,
            ..Default::default()
        };
        apply_flags(&mut provider, &args);

        assert_eq!(provider.ssh_host.as_deref(), Some("flag.example.com"));
        assert_eq!(provider.ssh_port, 2200);
        assert_eq!(provider.ssh_user, "dokku");
        assert!(provider.log_ssh_commands);
    }

    #[test]
    fn test_load_resolves_state_next_to_manifest() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("dokku.kdl");
        std::fs::write(&path, "provider { ssh-host \"dokku.example.com\" }\napp \"web\"").unwrap();

        let args = GlobalArgs {
            config: Some(path.clone()),
            ..Default::default()
        };
        let session = temp_env::with_var_unset("DOKKU_SSH_HOST", || Session::load(&args)).unwrap();

        assert_eq!(session.manifest.resources.len(), 1);
        assert_eq!(session.provider.ssh_host().unwrap(), "dokku.example.com");
        assert_eq!(
            session.state.state_path(),
            temp_dir.path().join(".dokkuflow").join("state.json")
        );
    }
}
