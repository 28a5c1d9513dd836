//! `git:*` deploy sources and credentials

use crate::client::Remote;
use crate::command::Invocation;
use crate::error::Result;
use crate::report::Report;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArchiveType {
    #[default]
    Tar,
    TarGz,
    Zip,
}

impl ArchiveType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArchiveType::Tar => "tar",
            ArchiveType::TarGz => "tar.gz",
            ArchiveType::Zip => "zip",
        }
    }
}

impl fmt::Display for ArchiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub struct Git<'a> {
    remote: Remote<'a>,
}

impl<'a> Git<'a> {
    pub fn new(remote: Remote<'a>) -> Self {
        Self { remote }
    }

    /// Deploy a prebuilt image
    pub async fn from_image(&self, app: &str, image: &str) -> Result<()> {
        tracing::info!(app = %app, image = %image, "Deploying image");
        self.remote
            .run_for_app(app, Invocation::new("git:from-image").arg(app).arg(image))
            .await?;
        Ok(())
    }

    pub async fn from_archive(
        &self,
        app: &str,
        url: &str,
        archive_type: Option<ArchiveType>,
    ) -> Result<()> {
        tracing::info!(app = %app, url = %url, "Deploying archive");
        let mut invocation = Invocation::new("git:from-archive");
        if let Some(archive_type) = archive_type {
            invocation = invocation.arg("--archive-type").arg(archive_type.as_str());
        }
        self.remote
            .run_for_app(app, invocation.arg(app).arg(url))
            .await?;
        Ok(())
    }

    /// Clone a repository into the app, optionally building it
    pub async fn sync(&self, app: &str, url: &str, git_ref: Option<&str>, build: bool) -> Result<()> {
        tracing::info!(app = %app, url = %url, build, "Syncing repository");
        let mut invocation = Invocation::new("git:sync")
            .arg_if(build, "--build")
            .arg(app)
            .arg(url);
        if let Some(git_ref) = git_ref {
            invocation = invocation.arg(git_ref);
        }
        self.remote.run_for_app(app, invocation).await?;
        Ok(())
    }

    /// Store credentials for a git host
    pub async fn auth(&self, host: &str, username: &str, password: &str) -> Result<()> {
        self.remote
            .run(
                Invocation::new("git:auth")
                    .arg(host)
                    .arg(username)
                    .secret_arg(password),
            )
            .await?;
        Ok(())
    }

    /// Drop stored credentials for a git host
    pub async fn remove_auth(&self, host: &str) -> Result<()> {
        self.remote.run(Invocation::new("git:auth").arg(host)).await?;
        Ok(())
    }

    pub async fn report(&self, app: &str) -> Result<Report> {
        let output = self
            .remote
            .run_for_app(app, Invocation::new("git:report").arg(app))
            .await?;
        Ok(Report::parse(&output.stdout))
    }
}
