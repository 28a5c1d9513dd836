use crate::error::{ConfigError, Result};
use std::path::{Path, PathBuf};

pub const CONFIG_PATH_ENV: &str = "DOKKUFLOW_CONFIG_PATH";

const CANDIDATES: [&str; 2] = ["dokku.local.kdl", "dokku.kdl"];

/// Global config directory (`~/.config/dokkuflow`), created on demand
pub fn get_config_dir() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .ok_or(ConfigError::ConfigDirNotFound)?
        .join("dokkuflow");

    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir)?;
    }

    Ok(config_dir)
}

/// Locate the manifest
///
/// Search order:
/// 1. `DOKKUFLOW_CONFIG_PATH`
/// 2. current directory: `dokku.local.kdl`, `dokku.kdl`
/// 3. `./.dokkuflow/` with the same names
/// 4. `~/.config/dokkuflow/dokku.kdl`
pub fn find_manifest() -> Result<PathBuf> {
    if let Ok(config_path) = std::env::var(CONFIG_PATH_ENV)
        && !config_path.trim().is_empty()
    {
        let path = PathBuf::from(config_path);
        return if path.is_file() {
            Ok(path)
        } else {
            Err(ConfigError::ConfigPathMissing(path))
        };
    }

    let current_dir = std::env::current_dir()?;
    if let Some(path) = find_in(&current_dir) {
        return Ok(path);
    }

    let local_dir = current_dir.join(".dokkuflow");
    if local_dir.is_dir()
        && let Some(path) = find_in(&local_dir)
    {
        return Ok(path);
    }

    if let Some(config_dir) = dirs::config_dir() {
        let global = config_dir.join("dokkuflow").join("dokku.kdl");
        if global.is_file() {
            return Ok(global);
        }
    }

    Err(ConfigError::ManifestNotFound)
}

fn find_in(dir: &Path) -> Option<PathBuf> {
    CANDIDATES
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs;

    fn in_dir<T>(dir: &Path, f: impl FnOnce() -> T) -> T {
        let original = std::env::current_dir().unwrap();
        std::env::set_current_dir(dir).unwrap();
        let result = temp_env::with_var_unset(CONFIG_PATH_ENV, f);
        std::env::set_current_dir(original).unwrap();
        result
    }

    #[test]
    fn test_get_config_dir() {
        let config_dir = get_config_dir().unwrap();
        assert!(config_dir.ends_with("dokkuflow"));
        assert!(config_dir.exists());
    }

    #[test]
    #[serial]
    fn test_find_manifest_in_current_dir() {
        let temp_dir = tempfile::tempdir().unwrap();
        fs::write(temp_dir.path().join("dokku.kdl"), "// test").unwrap();

        let found = in_dir(temp_dir.path(), find_manifest).unwrap();
        assert!(found.ends_with("dokku.kdl"));
    }

    #[test]
    #[serial]
    fn test_local_manifest_takes_priority() {
        let temp_dir = tempfile::tempdir().unwrap();
        fs::write(temp_dir.path().join("dokku.kdl"), "// shared").unwrap();
        fs::write(temp_dir.path().join("dokku.local.kdl"), "// local").unwrap();

        let found = in_dir(temp_dir.path(), find_manifest).unwrap();
        assert!(found.ends_with("dokku.local.kdl"));
    }

    #[test]
    #[serial]
    fn test_find_manifest_in_dot_dir() {
        let temp_dir = tempfile::tempdir().unwrap();
        let local_dir = temp_dir.path().join(".dokkuflow");
        fs::create_dir(&local_dir).unwrap();
        fs::write(local_dir.join("dokku.kdl"), "// nested").unwrap();

        let found = in_dir(temp_dir.path(), find_manifest).unwrap();
        assert!(found.ends_with(".dokkuflow/dokku.kdl"));
    }

    #[test]
    #[serial]
    fn test_env_var_wins() {
        let temp_dir = tempfile::tempdir().unwrap();
        let custom = temp_dir.path().join("custom.kdl");
        fs::write(&custom, "// custom").unwrap();
        fs::write(temp_dir.path().join("dokku.kdl"), "// ignored").unwrap();

        let found = temp_env::with_var(CONFIG_PATH_ENV, Some(&custom), find_manifest).unwrap();
        assert_eq!(found, custom);
    }

    #[test]
    #[serial]
    fn test_env_var_pointing_nowhere_is_an_error() {
        let temp_dir = tempfile::tempdir().unwrap();
        let missing = temp_dir.path().join("missing.kdl");

        let err = temp_env::with_var(CONFIG_PATH_ENV, Some(&missing), find_manifest).unwrap_err();
        assert!(matches!(err, ConfigError::ConfigPathMissing(path) if path == missing));
    }
}
