//! Provider settings and manifest loading for dokkuflow
//!
//! - [`ProviderConfig`]: how to reach the Dokku host (manifest `provider`
//!   block, then `DOKKU_*` environment variables)
//! - [`find_manifest`]: locate `dokku.kdl`
//! - [`parse_manifest_file`]: turn the KDL manifest into resources

pub mod discovery;
pub mod error;
pub mod parser;
pub mod provider;

pub use discovery::{CONFIG_PATH_ENV, find_manifest, get_config_dir};
pub use error::{ConfigError, Result};
pub use parser::{Manifest, parse_manifest_file, parse_manifest_str};
pub use provider::ProviderConfig;
