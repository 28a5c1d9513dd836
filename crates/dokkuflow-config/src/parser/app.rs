//! Nodes scoped to one app

use super::args::NodeArgs;
use crate::error::Result;
use dokkuflow_client::{ArchiveType, ChecksStatus, Phase};
use dokkuflow_resource::AnyResource;
use dokkuflow_resource::resources::{
    App, Checks, Config, Deploy, DeploySource, DockerOption, Domain, HttpAuth, Letsencrypt,
    Network, NetworkType, Port, Proxy, Storage,
};
use std::collections::BTreeMap;
use std::path::Path;

/// app "web"
pub fn parse_app(args: &NodeArgs) -> Result<AnyResource> {
    args.only(&[])?;
    Ok(App::new(args.arg(0, "an app name")?).into())
}

/// config "web" "KEY" value="..." no-restart=#true
pub fn parse_config(args: &NodeArgs) -> Result<AnyResource> {
    args.only(&["value", "no-restart"])?;
    Ok(Config {
        app_name: args.arg(0, "an app name")?,
        name: args.arg(1, "a variable name")?,
        value: args.required("value")?,
        no_restart: args.bool("no-restart")?.unwrap_or(false),
    }
    .into())
}

/// checks "web" status="disabled"
pub fn parse_checks(args: &NodeArgs) -> Result<AnyResource> {
    args.only(&["status"])?;
    let status = args.required("status")?;
    Ok(Checks {
        app_name: args.arg(0, "an app name")?,
        status: status.parse::<ChecksStatus>().map_err(|e| args.error(e))?,
    }
    .into())
}

/// deploy "web" type="docker_image" image="nginx:1.25"
pub fn parse_deploy(args: &NodeArgs) -> Result<AnyResource> {
    args.only(&["type", "image", "archive-url", "archive-type", "url", "build", "ref"])?;
    let app_name = args.arg(0, "an app name")?;
    let source_type = args.required("type")?.replace('-', "_");

    let source = match source_type.as_str() {
        "docker_image" => DeploySource::DockerImage {
            image: args.required("image")?,
        },
        "archive" => DeploySource::Archive {
            archive_type: args
                .string("archive-type")?
                .map(|t| parse_archive_type(args, &t))
                .transpose()?,
            archive_url: args.required("archive-url")?,
        },
        "git_repository" => DeploySource::GitRepository {
            url: args.required("url")?,
            build: args.bool("build")?.unwrap_or(false),
            git_ref: args.string("ref")?,
        },
        other => {
            return Err(args.error(format!(
                "unknown type {}, expected docker_image, archive or git_repository",
                other
            )));
        }
    };

    Ok(Deploy { app_name, source }.into())
}

fn parse_archive_type(args: &NodeArgs, value: &str) -> Result<ArchiveType> {
    match value {
        "tar" => Ok(ArchiveType::Tar),
        "tar.gz" | "tar-gz" | "tgz" => Ok(ArchiveType::TarGz),
        "zip" => Ok(ArchiveType::Zip),
        other => Err(args.error(format!(
            "unknown archive-type {}, expected tar, tar.gz or zip",
            other
        ))),
    }
}

/// domain "web" "www.example.com"
pub fn parse_domain(args: &NodeArgs) -> Result<AnyResource> {
    args.only(&[])?;
    Ok(Domain {
        app_name: args.arg(0, "an app name")?,
        domain: args.arg(1, "a domain")?,
    }
    .into())
}

/// port "web" scheme="http" host=80 container=5000
pub fn parse_port(args: &NodeArgs) -> Result<AnyResource> {
    args.only(&["scheme", "host", "container"])?;
    let host_port = args
        .port("host")?
        .ok_or_else(|| args.error("requires host="))?;
    Ok(Port {
        app_name: args.arg(0, "an app name")?,
        scheme: args.string("scheme")?.unwrap_or_else(|| "http".to_string()),
        host_port,
        container_port: args.port("container")?.unwrap_or(host_port),
    }
    .into())
}

/// proxy "web" enabled=#true type="nginx"
pub fn parse_proxy(args: &NodeArgs) -> Result<AnyResource> {
    args.only(&["enabled", "type"])?;
    Ok(Proxy {
        app_name: args.arg(0, "an app name")?,
        enabled: args.bool("enabled")?.unwrap_or(true),
        proxy_type: args.string("type")?,
    }
    .into())
}

/// storage "web" "data" mount-path="/app/data" local-directory="./seed"
///
/// A relative `local-directory` is taken from the manifest's directory.
pub fn parse_storage(args: &NodeArgs, base_dir: &Path) -> Result<AnyResource> {
    args.only(&["mount-path", "local-directory"])?;
    Ok(Storage {
        app_name: args.arg(0, "an app name")?,
        name: args.arg(1, "a storage name")?,
        mount_path: args.required("mount-path")?,
        local_directory: args.string("local-directory")?.map(|dir| {
            let dir = Path::new(&dir);
            if dir.is_absolute() {
                dir.to_path_buf()
            } else {
                base_dir.join(dir)
            }
        }),
    }
    .into())
}

/// docker-option "web" value="--shm-size 256m" phase="run"
/// docker-option "web" value="..." { phase "build" "run" }
///
/// Expands into one resource per phase.
pub fn parse_docker_option(args: &NodeArgs) -> Result<Vec<AnyResource>> {
    args.only(&["value", "phase"])?;
    let app_name = args.arg(0, "an app name")?;
    let value = args.required("value")?;

    let mut names: Vec<String> = args.string("phase")?.into_iter().collect();
    for child in args.children() {
        match child.name() {
            "phase" => names.extend(child.strings("phase")?),
            other => return Err(args.error(format!("unknown child {}", other))),
        }
    }
    if names.is_empty() {
        return Err(args.error("requires at least one phase (build, deploy, run)"));
    }

    let mut phases: Vec<Phase> = names
        .iter()
        .map(|name| name.parse::<Phase>().map_err(|e| args.error(e)))
        .collect::<Result<_>>()?;
    phases.sort();
    phases.dedup();

    Ok(phases
        .into_iter()
        .map(|phase| {
            DockerOption {
                app_name: app_name.clone(),
                phase,
                value: value.clone(),
            }
            .into()
        })
        .collect())
}

/// http-auth "web" { user "admin" "s3cret" }
pub fn parse_http_auth(args: &NodeArgs) -> Result<AnyResource> {
    args.only(&[])?;
    let app_name = args.arg(0, "an app name")?;

    let mut users = BTreeMap::new();
    for child in args.children() {
        if child.name() != "user" {
            return Err(args.error(format!("unknown child {}", child.name())));
        }
        let user = child.arg(0, "a user name")?;
        let password = child.arg(1, "a password")?;
        if users.insert(user.clone(), password).is_some() {
            return Err(args.error(format!("user {} is declared twice", user)));
        }
    }

    Ok(HttpAuth { app_name, users }.into())
}

/// letsencrypt "web" email="ops@example.com"
pub fn parse_letsencrypt(args: &NodeArgs) -> Result<AnyResource> {
    args.only(&["email"])?;
    Ok(Letsencrypt {
        app_name: args.arg(0, "an app name")?,
        email: args.required("email")?,
    }
    .into())
}

/// network "web" type="attach" name="backend"
pub fn parse_network(args: &NodeArgs) -> Result<AnyResource> {
    args.only(&["type", "name"])?;
    let network_type = match args.required("type")?.as_str() {
        "initial" => NetworkType::Initial,
        "attach" => NetworkType::Attach,
        other => {
            return Err(args.error(format!(
                "unknown type {}, expected initial or attach",
                other
            )));
        }
    };
    Ok(Network {
        app_name: args.arg(0, "an app name")?,
        network_type,
        name: args.required("name")?,
    }
    .into())
}
