//! `docker-options:*`

use crate::client::Remote;
use crate::command::Invocation;
use crate::error::Result;
use crate::report::Report;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Build,
    Deploy,
    Run,
}

impl Phase {
    pub const ALL: [Phase; 3] = [Phase::Build, Phase::Deploy, Phase::Run];

    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Build => "build",
            Phase::Deploy => "deploy",
            Phase::Run => "run",
        }
    }

    fn report_key(&self) -> String {
        format!("docker options {}", self.as_str())
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Phase {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "build" => Ok(Phase::Build),
            "deploy" => Ok(Phase::Deploy),
            "run" => Ok(Phase::Run),
            other => Err(format!(
                "invalid phase '{}', expected one of build, deploy, run",
                other
            )),
        }
    }
}

fn join_phases(phases: &[Phase]) -> String {
    phases
        .iter()
        .map(Phase::as_str)
        .collect::<Vec<_>>()
        .join(",")
}

pub struct DockerOptions<'a> {
    remote: Remote<'a>,
}

impl<'a> DockerOptions<'a> {
    pub fn new(remote: Remote<'a>) -> Self {
        Self { remote }
    }

    /// Space-joined options of one phase
    pub async fn report(&self, app: &str, phase: Phase) -> Result<String> {
        let output = self
            .remote
            .run_for_app(app, Invocation::new("docker-options:report").arg(app))
            .await?;
        Ok(Report::parse(&output.stdout).value(&phase.report_key()))
    }

    /// Substring match against the joined option list
    pub async fn contains(&self, app: &str, phase: Phase, value: &str) -> Result<bool> {
        Ok(self.report(app, phase).await?.contains(value))
    }

    pub async fn add(&self, app: &str, phases: &[Phase], value: &str) -> Result<()> {
        self.remote
            .run_for_app(
                app,
                Invocation::new("docker-options:add")
                    .arg(app)
                    .arg(join_phases(phases))
                    .arg(value),
            )
            .await?;
        Ok(())
    }

    pub async fn remove(&self, app: &str, phases: &[Phase], value: &str) -> Result<()> {
        self.remote
            .run_for_app(
                app,
                Invocation::new("docker-options:remove")
                    .arg(app)
                    .arg(join_phases(phases))
                    .arg(value),
            )
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

    const REPORT: &str = "=====> web docker options information
       Docker options build:          --shm-size 256m --build-arg X=1
       Docker options deploy:
       Docker options run:            --shm-size 256m
";

    #[tokio::test]
    async fn test_contains_is_substring_match() {
        let fake = Arc::new(FakeTransport::new());
        fake.on("docker-options:report web", Reply::ok(REPORT));
        let client = client(&fake);
        let cancel = CancellationToken::new();
        let options = client.remote(&cancel).docker_options();

        assert!(options.contains("web", Phase::Build, "--shm-size 256m").await.unwrap());
        assert!(!options.contains("web", Phase::Deploy, "--shm-size 256m").await.unwrap());
        assert_eq!(options.report("web", Phase::Deploy).await.unwrap(), "");
    }

    #[tokio::test]
    async fn test_add_quotes_value() {
        let fake = Arc::new(FakeTransport::new());
        let client = client(&fake);
        let cancel = CancellationToken::new();

        client
            .remote(&cancel)
            .docker_options()
            .add("web", &[Phase::Build, Phase::Run], "--shm-size 256m")
            .await
            .unwrap();
        assert_eq!(
            fake.commands(),
            vec!["docker-options:add web build,run '--shm-size 256m'"]
        );
    }
}
