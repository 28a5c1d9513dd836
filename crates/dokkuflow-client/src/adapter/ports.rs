//! Port mappings
//!
//! Hosts before 0.31.0 only know the `proxy:ports-*` family; later hosts
//! use `ports:*`. The verb is chosen from the probed capabilities.

use crate::client::Remote;
use crate::command::Invocation;
use crate::error::{ClientError, Result};
use crate::report::is_banner;
use crate::sentinel;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One `<scheme>:<host>:<container>` mapping
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PortMapping {
    pub scheme: String,
    pub host_port: u16,
    pub container_port: u16,
}

impl PortMapping {
    pub fn new(scheme: impl Into<String>, host_port: u16, container_port: u16) -> Self {
        Self {
            scheme: scheme.into(),
            host_port,
            container_port,
        }
    }

    /// Command line token
    pub fn token(&self) -> String {
        format!("{}:{}:{}", self.scheme, self.host_port, self.container_port)
    }

    /// Parse one whitespace-separated listing row
    fn from_row(row: &str) -> Option<Self> {
        let mut fields = row.split_whitespace();
        let scheme = fields.next()?;
        let host = fields.next()?.parse().ok()?;
        let container = fields.next()?.parse().ok()?;
        if fields.next().is_some() {
            return None;
        }
        Some(Self::new(scheme, host, container))
    }
}

impl fmt::Display for PortMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.token())
    }
}

impl FromStr for PortMapping {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(':').collect();
        let [scheme, host, container] = parts.as_slice() else {
            return Err(format!("invalid port mapping '{}', expected scheme:host:container", s));
        };
        let host = host
            .parse()
            .map_err(|_| format!("invalid host port '{}'", host))?;
        let container = container
            .parse()
            .map_err(|_| format!("invalid container port '{}'", container))?;
        Ok(Self::new(*scheme, host, container))
    }
}

/// Parse `ports:list` / `proxy:ports` output
///
/// When a `----->` header is present only the rows after it count.
pub fn parse_port_list(output: &str) -> Vec<PortMapping> {
    if sentinel::is_no_port_mappings(output) {
        return Vec::new();
    }
    let lines: Vec<&str> = output.lines().collect();
    let start = lines
        .iter()
        .rposition(|line| is_banner(line))
        .map(|i| i + 1)
        .unwrap_or(0);
    lines[start..]
        .iter()
        .filter_map(|line| PortMapping::from_row(line))
        .collect()
}

pub struct Ports<'a> {
    remote: Remote<'a>,
}

impl<'a> Ports<'a> {
    pub fn new(remote: Remote<'a>) -> Self {
        Self { remote }
    }

    async fn verb(&self, action: &str) -> Result<String> {
        let capabilities = self.remote.capabilities().await?;
        Ok(if capabilities.has_ports_namespace_v2() {
            format!("ports:{}", action)
        } else if action == "list" {
            "proxy:ports".to_string()
        } else {
            format!("proxy:ports-{}", action)
        })
    }

    pub async fn list(&self, app: &str) -> Result<Vec<PortMapping>> {
        let invocation = Invocation::new(self.verb("list").await?).arg(app);
        match self.remote.run_for_app(app, invocation).await {
            Ok(output) => Ok(parse_port_list(&output.stdout)),
            Err(ClientError::Remote { output, .. }) if sentinel::is_no_port_mappings(&output) => {
                Ok(Vec::new())
            }
            Err(e) => Err(e),
        }
    }

    pub async fn add(&self, app: &str, mappings: &[PortMapping]) -> Result<()> {
        self.apply("add", app, mappings).await
    }

    pub async fn remove(&self, app: &str, mappings: &[PortMapping]) -> Result<()> {
        self.apply("remove", app, mappings).await
    }

    pub async fn set(&self, app: &str, mappings: &[PortMapping]) -> Result<()> {
        self.apply("set", app, mappings).await
    }

    pub async fn clear(&self, app: &str) -> Result<()> {
        let invocation = Invocation::new(self.verb("clear").await?).arg(app);
        self.remote.run_for_app(app, invocation).await?;
        Ok(())
    }

    async fn apply(&self, action: &str, app: &str, mappings: &[PortMapping]) -> Result<()> {
        if mappings.is_empty() {
            return Ok(());
        }
        let invocation = Invocation::new(self.verb(action).await?)
            .arg(app)
            .args(mappings.iter().map(PortMapping::token));
        self.remote.run_for_app(app, invocation).await?;
        Ok(())
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
    fn test_parse_port_list() {
        let output = "-----> scheme  host port  container port\nhttp           80         5000\nhttps          443        5000\n";
        assert_eq!(
            parse_port_list(output),
            vec![
                PortMapping::new("http", 80, 5000),
                PortMapping::new("https", 443, 5000)
            ]
        );
    }

    #[test]
    fn test_parse_port_list_empty() {
        assert!(parse_port_list("").is_empty());
        assert!(parse_port_list(" !     No port mappings configured for app web").is_empty());
    }

    #[test]
    fn test_mapping_from_str() {
        assert_eq!(
            "http:80:5000".parse::<PortMapping>(),
            Ok(PortMapping::new("http", 80, 5000))
        );
        assert!("http:80".parse::<PortMapping>().is_err());
        assert!("http:eighty:5000".parse::<PortMapping>().is_err());
    }

    #[tokio::test]
    async fn test_legacy_namespace() {
        let fake = Arc::new(FakeTransport::new().with_version("0.30.9"));
        let client = client(&fake);
        let cancel = CancellationToken::new();

        client
            .remote(&cancel)
            .ports()
            .add("web", &[PortMapping::new("http", 80, 5000)])
            .await
            .unwrap();
        assert_eq!(fake.mutations(), vec!["proxy:ports-add web http:80:5000"]);
    }

    #[tokio::test]
    async fn test_current_namespace() {
        let fake = Arc::new(FakeTransport::new().with_version("0.31.2"));
        let client = client(&fake);
        let cancel = CancellationToken::new();
        let ports = client.remote(&cancel).ports();

        ports.add("web", &[PortMapping::new("http", 80, 5000)]).await.unwrap();
        ports.list("web").await.unwrap();
        assert_eq!(
            fake.commands(),
            vec!["version", "ports:add web http:80:5000", "ports:list web"]
        );
    }

    #[tokio::test]
    async fn test_list_without_mappings() {
        let fake = Arc::new(FakeTransport::new().with_version("0.31.2"));
        fake.on(
            "ports:list web",
            Reply::fail(" !     No port mappings configured for app web", 1),
        );
        let client = client(&fake);
        let cancel = CancellationToken::new();

        assert!(client.remote(&cancel).ports().list("web").await.unwrap().is_empty());
    }
}
