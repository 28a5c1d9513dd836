use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config directory not found")]
    ConfigDirNotFound,

    #[error(
        "Manifest not found. Looked in:\n\
        - DOKKUFLOW_CONFIG_PATH\n\
        - current directory: dokku.local.kdl, dokku.kdl\n\
        - ./.dokkuflow/dokku.kdl\n\
        - ~/.config/dokkuflow/dokku.kdl"
    )]
    ManifestNotFound,

    #[error("DOKKUFLOW_CONFIG_PATH points to a missing file: {0}")]
    ConfigPathMissing(PathBuf),

    #[error("KDL parse error: {0}")]
    KdlParse(#[from] kdl::KdlError),

    #[error("Invalid manifest: {0}")]
    InvalidManifest(String),

    #[error("ssh_host is not set (provider block, DOKKU_SSH_HOST or --ssh-host)")]
    MissingSshHost,

    #[error("Invalid value for {name}: {value}")]
    InvalidSetting { name: String, value: String },

    #[error("SSH settings error: {0}")]
    Ssh(#[from] dokkuflow_ssh::SshError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
