//! Host-directory upload through a throwaway helper app
//!
//! The remote shell offers no file transfer, so a local directory reaches a
//! storage mount like this:
//!
//! 1. create `<prefix>-<token>`, mount the target at `/mnt`, deploy `busybox`
//! 2. tar the directory in memory, base64 it, split it into chunks of at
//!    most `split_bytes`
//! 3. append every chunk to `/tmp/x.tar.base64` inside the helper via an
//!    `enter` session, then decode and untar into `/mnt`
//! 4. destroy the helper, whatever happened before
//!
//! Long lines stall the remote session silently, which is why chunks are
//! bounded.

use crate::controller::Context;
use crate::error::{ResourceError, Result};
use dokkuflow_client::secret::encode_bytes;
use dokkuflow_client::{DokkuClient, Invocation};
use rand::Rng;
use std::path::{Path, PathBuf};
use tar::Builder;
use tokio_util::sync::CancellationToken;

pub const DEFAULT_APP_PREFIX: &str = "storage-sync";
pub const DEFAULT_SPLIT_BYTES: usize = 256;

const HELPER_IMAGE: &str = "busybox";
const HELPER_PROCESS: &str = "web";
const MOUNT_POINT: &str = "/mnt";
const REMOTE_BUFFER: &str = "/tmp/x.tar.base64";
const TOKEN_LEN: usize = 6;
const TOKEN_CHARS: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadSettings {
    pub app_prefix: String,
    pub split_bytes: usize,
}

impl Default for UploadSettings {
    fn default() -> Self {
        Self {
            app_prefix: DEFAULT_APP_PREFIX.to_string(),
            split_bytes: DEFAULT_SPLIT_BYTES,
        }
    }
}

impl UploadSettings {
    /// `<prefix>-<6 random lowercase alphanumerics>`
    pub fn helper_name(&self) -> String {
        let mut rng = rand::thread_rng();
        let token: String = (0..TOKEN_LEN)
            .map(|_| TOKEN_CHARS[rng.gen_range(0..TOKEN_CHARS.len())] as char)
            .collect();
        format!("{}-{}", self.app_prefix.trim_end_matches('-'), token)
    }
}

/// Tar a directory into memory
pub fn build_archive(dir: &Path) -> Result<Vec<u8>> {
    if !dir.is_dir() {
        return Err(ResourceError::Upload(format!(
            "{} is not a directory",
            dir.display()
        )));
    }

    let mut archive = Vec::new();
    {
        let mut tar = Builder::new(&mut archive);
        tar.follow_symlinks(false);
        tar.append_dir_all(".", dir)?;
        tar.finish()?;
    }
    tracing::debug!(dir = %dir.display(), bytes = archive.len(), "Built upload archive");
    Ok(archive)
}

/// Split base64 text into chunks of at most `size` bytes
pub fn chunk(encoded: &str, size: usize) -> Vec<String> {
    let size = size.max(1);
    encoded
        .as_bytes()
        .chunks(size)
        .map(|c| String::from_utf8_lossy(c).into_owned())
        .collect()
}

/// Shell lines that rebuild the archive inside the helper and unpack it
pub fn session_lines(encoded: &str, size: usize) -> Vec<String> {
    let mut lines: Vec<String> = chunk(encoded, size)
        .into_iter()
        .map(|c| format!("echo -n '{}' >> {}", c, REMOTE_BUFFER))
        .collect();
    lines.push(format!(
        "base64 -d {} | tar -x -C {}",
        REMOTE_BUFFER, MOUNT_POINT
    ));
    lines.push("exit".to_string());
    lines
}

/// Copy `local` into `host_path` on the remote
pub async fn sync_directory(ctx: &Context, local: &Path, host_path: &str) -> Result<()> {
    let helper = ctx.upload().helper_name();
    tracing::info!(
        helper = %helper,
        local = %local.display(),
        target = %host_path,
        "Uploading directory through helper app"
    );

    let result = run_helper(ctx, &helper, local, host_path).await;
    cleanup(ctx.client(), &helper).await;
    result
}

async fn run_helper(ctx: &Context, helper: &str, local: &Path, host_path: &str) -> Result<()> {
    let remote = ctx.remote();
    remote.apps().create(helper).await?;
    remote.storage().mount(helper, host_path, MOUNT_POINT).await?;
    remote.git().from_image(helper, HELPER_IMAGE).await?;

    let dir: PathBuf = local.to_path_buf();
    let archive = tokio::task::spawn_blocking(move || build_archive(&dir))
        .await
        .map_err(|e| ResourceError::Upload(format!("archive task failed: {}", e)))??;
    let encoded = encode_bytes(&archive);
    let lines = session_lines(&encoded, ctx.upload().split_bytes);
    tracing::debug!(chunks = lines.len() - 2, "Streaming archive");

    remote
        .interactive(
            Invocation::new("enter").arg(helper).arg(HELPER_PROCESS),
            &lines,
        )
        .await?;
    Ok(())
}

/// Destroy the helper with a token of its own so a cancelled apply still
/// cleans up
async fn cleanup(client: &DokkuClient, helper: &str) {
    let cancel = CancellationToken::new();
    if let Err(e) = client.remote(&cancel).apps().destroy(helper).await {
        tracing::warn!(helper = %helper, error = %e, "Failed to destroy upload helper app");
    }
}
