//! Host-wide nodes and service wiring

use super::args::NodeArgs;
use crate::error::Result;
use dokkuflow_client::ServiceKind;
use dokkuflow_resource::AnyResource;
use dokkuflow_resource::resources::{
    GitAuth, GlobalDomain, Nginx, Plugin, Registry, Service, ServiceLink,
};

fn parse_service_kind(args: &NodeArgs, value: &str) -> Result<ServiceKind> {
    value.parse().map_err(|e: String| args.error(e))
}

pub fn parse_global_domain(args: &NodeArgs) -> Result<AnyResource> {
    args.only(&[])?;
    Ok(GlobalDomain {
        domain: args.arg(0, "a domain")?,
    }
    .into())
}

/// nginx "client-max-body-size" "20m" app="web"
///
/// Without `app=` the property is set globally.
pub fn parse_nginx(args: &NodeArgs) -> Result<AnyResource> {
    args.only(&["app"])?;
    Ok(Nginx {
        app_name: args.string("app")?,
        property: args.arg(0, "a property name")?,
        value: args.arg(1, "a value")?,
    }
    .into())
}

pub fn parse_plugin(args: &NodeArgs) -> Result<AnyResource> {
    args.only(&["url"])?;
    Ok(Plugin {
        name: args.arg(0, "a plugin name")?,
        url: args.string("url")?.unwrap_or_default(),
    }
    .into())
}

/// registry "ghcr.io" username="bot" password="..." app="web"
pub fn parse_registry(args: &NodeArgs) -> Result<AnyResource> {
    args.only(&["username", "password", "app"])?;
    Ok(Registry {
        server: args.arg(0, "a registry server")?,
        username: args.required("username")?,
        password: args.required("password")?,
        app_name: args.string("app")?,
    }
    .into())
}

pub fn parse_git_auth(args: &NodeArgs) -> Result<AnyResource> {
    args.only(&["username", "password"])?;
    Ok(GitAuth {
        host: args.arg(0, "a git host")?,
        username: args.required("username")?,
        password: args.required("password")?,
    }
    .into())
}

/// service "postgres" "db" image="postgres:15" expose="5432" { config-options "..." }
pub fn parse_service(args: &NodeArgs) -> Result<AnyResource> {
    args.only(&["image", "expose", "config-options"])?;
    let kind = args.arg(0, "a service type")?;

    let mut config_options = args.string("config-options")?;
    for child in args.children() {
        match child.name() {
            "config-options" => config_options = Some(child.arg(0, "options")?),
            other => return Err(args.error(format!("unknown child {}", other))),
        }
    }

    Ok(Service {
        service_type: parse_service_kind(args, &kind)?,
        service_name: args.arg(1, "a service name")?,
        image: args.string("image")?,
        expose: args.string("expose")?,
        config_options,
    }
    .into())
}

/// link "postgres" "db" "web" alias="PRIMARY"
pub fn parse_link(args: &NodeArgs) -> Result<AnyResource> {
    args.only(&["alias"])?;
    let kind = args.arg(0, "a service type")?;
    Ok(ServiceLink {
        service_type: parse_service_kind(args, &kind)?,
        service_name: args.arg(1, "a service name")?,
        app_name: args.arg(2, "an app name")?,
        alias: args.string("alias")?,
    }
    .into())
}
