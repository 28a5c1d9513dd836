//! `checks:*`

use crate::client::Remote;
use crate::command::Invocation;
use crate::error::Result;
use crate::report::Report;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Marker for "every process type" in the checks lists
const ALL_PROCESSES: &str = "_all_";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChecksStatus {
    #[default]
    Enabled,
    Disabled,
    Skipped,
}

impl ChecksStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChecksStatus::Enabled => "enabled",
            ChecksStatus::Disabled => "disabled",
            ChecksStatus::Skipped => "skipped",
        }
    }

    /// Command that puts the app into this status
    pub fn verb(&self) -> &'static str {
        match self {
            ChecksStatus::Enabled => "checks:enable",
            ChecksStatus::Disabled => "checks:disable",
            ChecksStatus::Skipped => "checks:skip",
        }
    }

    /// Derive the status from a `checks:report`
    pub fn from_report(report: &Report) -> Self {
        if report.value("checks disabled list") == ALL_PROCESSES {
            ChecksStatus::Disabled
        } else if report.value("checks skipped list") == ALL_PROCESSES {
            ChecksStatus::Skipped
        } else {
            ChecksStatus::Enabled
        }
    }
}

impl fmt::Display for ChecksStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChecksStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "enabled" => Ok(ChecksStatus::Enabled),
            "disabled" => Ok(ChecksStatus::Disabled),
            "skipped" => Ok(ChecksStatus::Skipped),
            other => Err(format!(
                "invalid checks status '{}', expected one of enabled, disabled, skipped",
                other
            )),
        }
    }
}

pub struct Checks<'a> {
    remote: Remote<'a>,
}

impl<'a> Checks<'a> {
    pub fn new(remote: Remote<'a>) -> Self {
        Self { remote }
    }

    pub async fn status(&self, app: &str) -> Result<ChecksStatus> {
        let output = self
            .remote
            .run_for_app(app, Invocation::new("checks:report").arg(app))
            .await?;
        Ok(ChecksStatus::from_report(&Report::parse(&output.stdout)))
    }

    pub async fn set(&self, app: &str, status: ChecksStatus) -> Result<()> {
        tracing::debug!(app = %app, status = %status, "Setting checks status");
        self.remote
            .run_for_app(app, Invocation::new(status.verb()).arg(app))
            .await?;
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

    fn report(disabled: &str, skipped: &str) -> String {
        format!(
            "=====> web checks information\n       Checks disabled list:          {}\n       Checks skipped list:           {}\n",
            disabled, skipped
        )
    }

    #[test]
    fn test_status_from_report() {
        let cases = [
            ("_all_", "none", ChecksStatus::Disabled),
            ("_all_", "_all_", ChecksStatus::Disabled),
            ("none", "_all_", ChecksStatus::Skipped),
            ("web", "none", ChecksStatus::Enabled),
            ("none", "none", ChecksStatus::Enabled),
        ];
        for (disabled, skipped, expected) in cases {
            let parsed = Report::parse(&report(disabled, skipped));
            assert_eq!(ChecksStatus::from_report(&parsed), expected, "{} / {}", disabled, skipped);
        }
    }

    #[test]
    fn test_parse_status() {
        assert_eq!("skipped".parse::<ChecksStatus>(), Ok(ChecksStatus::Skipped));
        assert!("paused".parse::<ChecksStatus>().is_err());
    }

    #[tokio::test]
    async fn test_set_uses_verbs() {
        let fake = Arc::new(FakeTransport::new());
        fake.on("checks:report web", Reply::ok(report("none", "_all_")));
        let client = client(&fake);
        let cancel = CancellationToken::new();
        let checks = client.remote(&cancel).checks();

        assert_eq!(checks.status("web").await.unwrap(), ChecksStatus::Skipped);
        checks.set("web", ChecksStatus::Disabled).await.unwrap();
        checks.set("web", ChecksStatus::Enabled).await.unwrap();

        assert_eq!(
            fake.commands(),
            vec!["checks:report web", "checks:disable web", "checks:enable web"]
        );
    }
}
