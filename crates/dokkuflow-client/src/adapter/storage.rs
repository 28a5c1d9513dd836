//! `storage:*`
//!
//! A storage name is either an absolute host path, used verbatim, or a
//! relative name resolved under [`STORAGE_ROOT`].

use crate::client::Remote;
use crate::command::Invocation;
use crate::error::Result;
use crate::report::list_lines;

/// Host directory that relative storage names live under
pub const STORAGE_ROOT: &str = "/var/lib/dokku/data/storage/";

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct StorageMount {
    /// Logical name (relative) or the absolute host path
    pub name: String,
    pub host_path: String,
    pub mount_path: String,
}

/// Host path for a storage name
pub fn host_path(name: &str) -> String {
    if name.starts_with('/') {
        name.to_string()
    } else {
        format!("{}{}", STORAGE_ROOT, name)
    }
}

/// Logical name for a host path
pub fn storage_name(host_path: &str) -> String {
    match host_path.strip_prefix(STORAGE_ROOT) {
        Some(name) if !name.is_empty() => name.trim_end_matches('/').to_string(),
        _ => host_path.to_string(),
    }
}

/// Parse `storage:list` output (`<host>:<container>` per line)
pub fn parse_mounts(output: &str) -> Vec<StorageMount> {
    list_lines(output)
        .iter()
        .filter(|line| line.starts_with('/'))
        .filter_map(|line| {
            let (host, container) = line.split_once(':')?;
            let host = host.trim();
            Some(StorageMount {
                name: storage_name(host),
                host_path: host.to_string(),
                mount_path: container.trim().to_string(),
            })
        })
        .collect()
}

pub struct Storage<'a> {
    remote: Remote<'a>,
}

impl<'a> Storage<'a> {
    pub fn new(remote: Remote<'a>) -> Self {
        Self { remote }
    }

    pub async fn list(&self, app: &str) -> Result<Vec<StorageMount>> {
        let output = self
            .remote
            .run_for_app(app, Invocation::new("storage:list").arg(app))
            .await?;
        Ok(parse_mounts(&output.stdout))
    }

    /// Mount with this logical name, if any
    pub async fn find(&self, app: &str, name: &str) -> Result<Option<StorageMount>> {
        let host = host_path(name);
        Ok(self
            .list(app)
            .await?
            .into_iter()
            .find(|mount| mount.host_path == host))
    }

    /// Create `STORAGE_ROOT/<name>` with the right ownership
    pub async fn ensure_directory(&self, name: &str) -> Result<()> {
        self.remote
            .run(Invocation::new("storage:ensure-directory").arg(name))
            .await?;
        Ok(())
    }

    pub async fn mount(&self, app: &str, host_path: &str, mount_path: &str) -> Result<()> {
        self.remote
            .run_for_app(
                app,
                Invocation::new("storage:mount")
                    .arg(app)
                    .arg(format!("{}:{}", host_path, mount_path)),
            )
            .await?;
        Ok(())
    }

    pub async fn unmount(&self, app: &str, host_path: &str, mount_path: &str) -> Result<()> {
        self.remote
            .run_for_app(
                app,
                Invocation::new("storage:unmount")
                    .arg(app)
                    .arg(format!("{}:{}", host_path, mount_path)),
            )
            .await?;
        Ok(())
    }
}
