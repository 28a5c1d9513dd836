//! Host capability probe
//!
//! The remote version is discovered once per client and exposed as named
//! predicates so adapters never compare versions themselves.

use crate::command::Invocation;
use crate::error::{ClientError, Result};
use crate::invoker::Invoker;
use regex::Regex;
use semver::{Version, VersionReq};
use std::sync::LazyLock;
use tokio_util::sync::CancellationToken;

/// Versions this client has been exercised against
pub const TESTED_RANGE: &str = ">=0.24.0, <0.36.0";

/// First version that ships the `ports:*` namespace
pub const PORTS_NAMESPACE_V2: Version = Version::new(0, 31, 0);

/// Exit status of a shell that cannot find the command
const COMMAND_NOT_FOUND: i32 = 127;

static VERSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)\.(\d+)\.(\d+)").expect("static regex"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capabilities {
    version: Version,
}

impl Capabilities {
    pub fn new(version: Version) -> Self {
        Self { version }
    }

    pub fn version(&self) -> &Version {
        &self.version
    }

    /// `ports:*` instead of `proxy:ports-*`
    pub fn has_ports_namespace_v2(&self) -> bool {
        self.version >= PORTS_NAMESPACE_V2
    }

    pub fn is_tested(&self) -> bool {
        tested_range().matches(&self.version)
    }
}

fn tested_range() -> VersionReq {
    VersionReq::parse(TESTED_RANGE).unwrap_or(VersionReq::STAR)
}

/// Extract the first `X.Y.Z` from `version` output
pub fn parse_version(output: &str) -> Option<Version> {
    let caps = VERSION_RE.captures(output)?;
    let part = |i: usize| caps.get(i).and_then(|m| m.as_str().parse::<u64>().ok());
    Some(Version::new(part(1)?, part(2)?, part(3)?))
}

/// Run the probe
///
/// An untested version is an error when `fail_on_untested` is set and a
/// warning otherwise.
pub async fn probe(
    invoker: &Invoker,
    cancel: &CancellationToken,
    fail_on_untested: bool,
) -> Result<Capabilities> {
    let output = match invoker.invoke(&Invocation::new("version").loud(), cancel).await {
        Ok(output) => output,
        Err(ClientError::Remote { status, .. }) if status == COMMAND_NOT_FOUND => {
            return Err(ClientError::MisconfiguredShell);
        }
        Err(e) => return Err(e),
    };

    let version = parse_version(&output.stdout)
        .ok_or_else(|| ClientError::parse("version", "no X.Y.Z version in output"))?;
    let capabilities = Capabilities::new(version);

    if capabilities.is_tested() {
        tracing::info!(version = %capabilities.version(), "Detected dokku");
    } else if fail_on_untested {
        return Err(ClientError::UnsupportedVersion {
            found: capabilities.version().to_string(),
            tested: TESTED_RANGE.to_string(),
        });
    } else {
        tracing::warn!(
            version = %capabilities.version(),
            tested = TESTED_RANGE,
            "dokku version is outside the tested range"
        );
    }

    Ok(capabilities)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeTransport, Reply};
    use std::sync::Arc;

    #[test]
    fn test_parse_version() {
        assert_eq!(
            parse_version("dokku version 0.31.2"),
            Some(Version::new(0, 31, 2))
        );
        assert_eq!(parse_version("v0.30.9\n"), Some(Version::new(0, 30, 9)));
        assert_eq!(parse_version("dokku version master"), None);
    }

    #[test]
    fn test_ports_namespace_boundary() {
        assert!(!Capabilities::new(Version::new(0, 30, 9)).has_ports_namespace_v2());
        assert!(Capabilities::new(Version::new(0, 31, 0)).has_ports_namespace_v2());
        assert!(Capabilities::new(Version::new(0, 31, 2)).has_ports_namespace_v2());
    }

    #[test]
    fn test_tested_range() {
        assert!(Capabilities::new(Version::new(0, 24, 0)).is_tested());
        assert!(Capabilities::new(Version::new(0, 35, 9)).is_tested());
        assert!(!Capabilities::new(Version::new(0, 23, 9)).is_tested());
        assert!(!Capabilities::new(Version::new(0, 36, 0)).is_tested());
    }

    #[tokio::test]
    async fn test_probe_runs_loud() {
        let fake = Arc::new(FakeTransport::new().with_version("0.31.2"));
        let invoker = Invoker::new(fake.clone());

        let caps = probe(&invoker, &CancellationToken::new(), true).await.unwrap();
        assert_eq!(caps.version(), &Version::new(0, 31, 2));
        assert_eq!(fake.raw_commands(), vec!["version".to_string()]);
    }

    #[tokio::test]
    async fn test_probe_status_127() {
        let fake = Arc::new(FakeTransport::new());
        fake.on("version", Reply::fail("bash: dokku: command not found", 127));
        let invoker = Invoker::new(fake);

        let err = probe(&invoker, &CancellationToken::new(), true).await.unwrap_err();
        assert!(matches!(err, ClientError::MisconfiguredShell));
    }

    #[tokio::test]
    async fn test_probe_untested_version() {
        let fake = Arc::new(FakeTransport::new().with_version("0.40.0"));
        let invoker = Invoker::new(fake);
        let cancel = CancellationToken::new();

        let err = probe(&invoker, &cancel, true).await.unwrap_err();
        assert!(matches!(err, ClientError::UnsupportedVersion { .. }));

        let caps = probe(&invoker, &cancel, false).await.unwrap();
        assert!(caps.has_ports_namespace_v2());
    }
}
