//! Deploy source of an app
//!
//! Every app has exactly one deploy source, so there is no existence probe;
//! create and update both (re)deploy. The source variant is fixed for the
//! lifetime of the resource.

use crate::controller::{self, Context, Controller, Model};
use crate::diagnostics::{AttributePath, Diagnostics};
use crate::resources::{Probe, ok_or_record, probe};
use crate::validate;
use async_trait::async_trait;
use dokkuflow_client::ArchiveType;
use serde::{Deserialize, Serialize};

/// `apps:report` source recorded after `git:from-image`
const DOCKER_IMAGE_SOURCE: &str = "docker-image";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DeploySource {
    Archive {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        archive_type: Option<ArchiveType>,
        archive_url: String,
    },
    DockerImage {
        image: String,
    },
    GitRepository {
        url: String,
        #[serde(default)]
        build: bool,
        #[serde(default, rename = "ref", skip_serializing_if = "Option::is_none")]
        git_ref: Option<String>,
    },
}

impl DeploySource {
    pub fn type_name(&self) -> &'static str {
        match self {
            DeploySource::Archive { .. } => "archive",
            DeploySource::DockerImage { .. } => "docker_image",
            DeploySource::GitRepository { .. } => "git_repository",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deploy {
    pub app_name: String,
    #[serde(flatten)]
    pub source: DeploySource,
}

impl Deploy {
    async fn deploy(&self, ctx: &Context, diags: &mut Diagnostics) -> Option<()> {
        let git = ctx.remote().git();
        let result = match &self.source {
            DeploySource::Archive {
                archive_type,
                archive_url,
            } => git.from_archive(&self.app_name, archive_url, *archive_type).await,
            DeploySource::DockerImage { image } => git.from_image(&self.app_name, image).await,
            DeploySource::GitRepository { url, build, git_ref } => {
                git.sync(&self.app_name, url, git_ref.as_deref(), *build)
                    .await
            }
        };
        ok_or_record(result, diags, None)
    }
}

impl Model for Deploy {
    const KIND: &'static str = "deploy";

    fn identity(&self) -> String {
        self.app_name.clone()
    }

    fn validate(&self, diags: &mut Diagnostics) {
        validate::name(diags, "app_name", &self.app_name);
        match &self.source {
            DeploySource::Archive { archive_url, .. } => {
                validate::non_empty(diags, "archive_url", archive_url)
            }
            DeploySource::DockerImage { image } => validate::non_empty(diags, "image", image),
            DeploySource::GitRepository { url, .. } => validate::non_empty(diags, "url", url),
        }
    }

    fn immutable_changes(&self, planned: &Self) -> Vec<AttributePath> {
        let mut out = Vec::new();
        controller::changed(&mut out, "app_name", &self.app_name, &planned.app_name);
        controller::changed(
            &mut out,
            "type",
            &self.source.type_name(),
            &planned.source.type_name(),
        );
        out
    }
}

#[async_trait]
impl Controller for Deploy {
    async fn create(&self, ctx: &Context, diags: &mut Diagnostics) -> Option<Self> {
        self.deploy(ctx, diags).await?;
        Some(self.clone())
    }

    async fn read(&self, ctx: &Context, diags: &mut Diagnostics) -> Option<Self> {
        match probe(ctx.remote().apps().deploy_source(&self.app_name).await, diags) {
            Probe::Found(report) => {
                let mut state = self.clone();
                if let DeploySource::DockerImage { image } = &mut state.source {
                    if report.source == DOCKER_IMAGE_SOURCE && !report.metadata.is_empty() {
                        *image = report.metadata;
                    }
                }
                Some(state)
            }
            Probe::Gone => None,
            Probe::Failed => Some(self.clone()),
        }
    }

    async fn update(&self, _prior: &Self, ctx: &Context, diags: &mut Diagnostics) -> Option<Self> {
        self.deploy(ctx, diags).await?;
        Some(self.clone())
    }

    async fn delete(&self, _ctx: &Context, _diags: &mut Diagnostics) {
        tracing::debug!(app = %self.app_name, "Deploy source left in place");
    }
}
