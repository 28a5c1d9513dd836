//! Persistent storage mounts
//!
//! `name` is either an absolute host path or a name under the storage root.
//! Only relative names get their directory ensured; absolute paths are the
//! operator's to prepare. Delete unmounts and never removes host data.

use crate::controller::{self, Context, Controller, Model};
use crate::diagnostics::{AttributePath, Diagnostic, DiagnosticKind, Diagnostics};
use crate::error::ResourceError;
use crate::resources::{Probe, ok_or_record, present_or_gone, probe};
use crate::upload;
use crate::validate;
use async_trait::async_trait;
use dokkuflow_client::adapter::storage::host_path;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Storage {
    pub app_name: String,
    pub name: String,
    pub mount_path: String,
    /// Local directory copied into the host path on create
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_directory: Option<PathBuf>,
}

impl Storage {
    pub fn host_path(&self) -> String {
        host_path(&self.name)
    }

    fn is_relative(&self) -> bool {
        !self.name.starts_with('/')
    }

    async fn upload(&self, ctx: &Context, diags: &mut Diagnostics) -> Option<()> {
        let local = self.local_directory.as_ref()?;
        match upload::sync_directory(ctx, local, &self.host_path()).await {
            Ok(()) => Some(()),
            Err(ResourceError::Client(e)) => {
                controller::fail(diags, &e, Some("local_directory"));
                None
            }
            Err(e) => {
                diags.push(
                    Diagnostic::error(DiagnosticKind::Validation, "Upload failed")
                        .with_detail(e.to_string())
                        .at("local_directory"),
                );
                None
            }
        }
    }
}

impl Model for Storage {
    const KIND: &'static str = "storage";

    fn identity(&self) -> String {
        format!("{}/{}", self.app_name, self.name)
    }

    fn validate(&self, diags: &mut Diagnostics) {
        validate::name(diags, "app_name", &self.app_name);
        if self.is_relative() {
            validate::name(diags, "name", &self.name);
        }
        validate::absolute_path(diags, "mount_path", &self.mount_path);
        if let Some(local) = &self.local_directory {
            if !local.is_dir() {
                diags.validation(
                    "local_directory",
                    format!("{} is not a directory", local.display()),
                );
            }
        }
    }

    fn immutable_changes(&self, planned: &Self) -> Vec<AttributePath> {
        let mut out = Vec::new();
        controller::changed(&mut out, "app_name", &self.app_name, &planned.app_name);
        controller::changed(&mut out, "name", &self.name, &planned.name);
        out
    }
}

#[async_trait]
impl Controller for Storage {
    async fn create(&self, ctx: &Context, diags: &mut Diagnostics) -> Option<Self> {
        let storage = ctx.remote().storage();
        let existing = ok_or_record(storage.find(&self.app_name, &self.name).await, diags, None)?;
        if let Some(mount) = existing {
            controller::already_exists(
                diags,
                "name",
                format!("mount {}:{} on app {}", mount.host_path, mount.mount_path, self.app_name),
            );
            return None;
        }

        let host = self.host_path();
        if self.is_relative() {
            ok_or_record(storage.ensure_directory(&self.name).await, diags, Some("name"))?;
        }
        ok_or_record(
            storage.mount(&self.app_name, &host, &self.mount_path).await,
            diags,
            Some("mount_path"),
        )?;

        if self.local_directory.is_some() && self.upload(ctx, diags).await.is_none() {
            if !diags.is_cancelled() {
                tracing::warn!(storage = %self.identity(), "Upload failed, unmounting");
                if let Err(e) = storage.unmount(&self.app_name, &host, &self.mount_path).await {
                    diags.client_error(&e, None);
                }
            }
            return None;
        }
        Some(self.clone())
    }

    async fn read(&self, ctx: &Context, diags: &mut Diagnostics) -> Option<Self> {
        match probe(ctx.remote().storage().find(&self.app_name, &self.name).await, diags) {
            Probe::Found(Some(mount)) => Some(Self {
                mount_path: mount.mount_path,
                ..self.clone()
            }),
            Probe::Found(None) | Probe::Gone => None,
            Probe::Failed => Some(self.clone()),
        }
    }

    async fn update(&self, prior: &Self, ctx: &Context, diags: &mut Diagnostics) -> Option<Self> {
        let storage = ctx.remote().storage();
        let host = self.host_path();
        if self.mount_path != prior.mount_path {
            ok_or_record(
                storage.unmount(&self.app_name, &host, &prior.mount_path).await,
                diags,
                Some("mount_path"),
            )?;
            ok_or_record(
                storage.mount(&self.app_name, &host, &self.mount_path).await,
                diags,
                Some("mount_path"),
            )?;
        }
        if self.local_directory.is_some() && self.local_directory != prior.local_directory {
            self.upload(ctx, diags).await?;
        }
        Some(self.clone())
    }

    async fn delete(&self, ctx: &Context, diags: &mut Diagnostics) {
        let storage = ctx.remote().storage();
        let Some(Some(mount)) = present_or_gone(storage.find(&self.app_name, &self.name).await, diags)
        else {
            return;
        };
        if let Err(e) = storage
            .unmount(&self.app_name, &mount.host_path, &mount.mount_path)
            .await
        {
            diags.client_error(&e, None);
        }
    }
}
