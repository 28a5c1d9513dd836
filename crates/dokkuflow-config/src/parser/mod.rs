//! KDL manifest parser
//!
//! A manifest is a flat list of nodes, one per declared resource, plus an
//! optional `provider` block. Node handlers live in `app` (app-scoped
//! resources) and `shared` (host-wide resources and services).

mod app;
mod args;
mod shared;


use crate::error::{ConfigError, Result};
use crate::provider::ProviderConfig;
use args::NodeArgs;
use dokkuflow_resource::AnyResource;
use kdl::KdlDocument;
use std::fs;
use std::path::Path;

/// Parsed manifest: provider settings and resources in declaration order
#[derive(Debug, Clone, Default)]
pub struct Manifest {
    pub provider: ProviderConfig,
    pub resources: Vec<AnyResource>,
}

/// Parse a manifest file; relative paths inside resolve against its directory
pub fn parse_manifest_file<P: AsRef<Path>>(path: P) -> Result<Manifest> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
    tracing::debug!(path = %path.display(), "Parsing manifest");
    parse_manifest_str(&content, base_dir)
}

pub fn parse_manifest_str(content: &str, base_dir: &Path) -> Result<Manifest> {
    let doc: KdlDocument = content.parse()?;

    let mut manifest = Manifest::default();
    let mut seen_provider = false;

    for node in doc.nodes() {
        let args = NodeArgs::new(node);
        let resource = match args.name() {
            "provider" => {
                if seen_provider {
                    return Err(ConfigError::InvalidManifest(
                        "provider block is declared twice".to_string(),
                    ));
                }
                seen_provider = true;
                parse_provider(&args, &mut manifest.provider)?;
                continue;
            }
            "docker-option" => {
                manifest.resources.extend(app::parse_docker_option(&args)?);
                continue;
            }
            "app" => app::parse_app(&args)?,
            "config" => app::parse_config(&args)?,
            "checks" => app::parse_checks(&args)?,
            "deploy" => app::parse_deploy(&args)?,
            "domain" => app::parse_domain(&args)?,
            "port" => app::parse_port(&args)?,
            "proxy" => app::parse_proxy(&args)?,
            "storage" => app::parse_storage(&args, base_dir)?,
            "http-auth" => app::parse_http_auth(&args)?,
            "letsencrypt" => app::parse_letsencrypt(&args)?,
            "network" => app::parse_network(&args)?,
            "global-domain" => shared::parse_global_domain(&args)?,
            "nginx" => shared::parse_nginx(&args)?,
            "plugin" => shared::parse_plugin(&args)?,
            "registry" => shared::parse_registry(&args)?,
            "git-auth" => shared::parse_git_auth(&args)?,
            "service" => shared::parse_service(&args)?,
            "link" => shared::parse_link(&args)?,
            other => {
                return Err(ConfigError::InvalidManifest(format!(
                    "unknown node: {}",
                    other
                )));
            }
        };
        manifest.resources.push(resource);
    }

    tracing::debug!(resources = manifest.resources.len(), "Manifest parsed");
    Ok(manifest)
}

/// provider { ssh-host "dokku.example.com"; ssh-port 22 }
fn parse_provider(args: &NodeArgs, provider: &mut ProviderConfig) -> Result<()> {
    args.only(&[])?;
    for setting in args.children() {
        provider.set(setting.name(), &setting.scalar(0)?)?;
    }
    Ok(())
}
