//! Configuration management.
//!
//! This module resolves where settings live and produces the immutable
//! [`SyncConfig`] snapshot each command runs against.
//!
//! # Resolution
//!
//! Config file path, first match wins:
//! 1. `--config <path>` flag
//! 2. `ANKI_SYNC_CONFIG` environment variable
//! 3. `~/.anki-sync/config.json`
//!
//! After loading, `ANKI_CONNECT_URL` and `ANKI_SYNC_VAULT` override the
//! stored endpoint and vault path, and a `--vault` flag overrides both.

mod settings;
mod store;

pub use settings::{SyncConfig, DEFAULT_ANKI_CONNECT_URL, SETTING_KEYS};
pub use store::{JsonFileStore, SettingsStore};

use crate::error::{Error, Result};

use std::path::{Path, PathBuf};

/// Get the global anki-sync directory (`~/.anki-sync/`).
#[must_use]
pub fn global_config_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".anki-sync"))
}

/// Resolve the config file path.
///
/// Priority:
/// 1. If `explicit_path` is provided, use it directly
/// 2. `ANKI_SYNC_CONFIG` environment variable
/// 3. Global location: `~/.anki-sync/config.json`
///
/// # Errors
///
/// Returns `Error::Config` if no home directory can be determined.
pub fn resolve_config_path(explicit_path: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit_path {
        return Ok(path.to_path_buf());
    }

    if let Ok(path) = std::env::var("ANKI_SYNC_CONFIG") {
        if !path.trim().is_empty() {
            return Ok(PathBuf::from(path));
        }
    }

    global_config_dir()
        .map(|dir| dir.join("config.json"))
        .ok_or_else(|| Error::Config("Could not determine home directory".into()))
}

/// Apply environment overrides on top of stored settings.
fn apply_env_overrides(config: &mut SyncConfig) {
    if let Ok(url) = std::env::var("ANKI_CONNECT_URL") {
        if !url.trim().is_empty() {
            config.anki_connect_url = url.trim().to_string();
        }
    }

    if let Ok(vault) = std::env::var("ANKI_SYNC_VAULT") {
        if !vault.trim().is_empty() {
            config.vault_path = Some(PathBuf::from(vault.trim()));
        }
    }
}

/// Load the settings snapshot a command runs against.
///
/// # Errors
///
/// Returns an error if the config file exists but cannot be read or parsed.
pub fn load_snapshot(explicit_path: Option<&Path>, vault: Option<&Path>) -> Result<SyncConfig> {
    let store = JsonFileStore::new(resolve_config_path(explicit_path)?);
    let mut config = store.load()?;
    apply_env_overrides(&mut config);
    if let Some(vault) = vault {
        config.vault_path = Some(vault.to_path_buf());
    }
    Ok(config)
}

/// The vault root a command should scan.
///
/// # Errors
///
/// Returns `Error::Config` when neither the config nor the flags name one.
pub fn require_vault(config: &SyncConfig) -> Result<&Path> {
    config.vault_path.as_deref().ok_or_else(|| {
        Error::Config(
            "No vault configured: pass --vault or run `anki-sync config set vault_path <dir>`"
                .to_string(),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_config_path_with_explicit() {
        let explicit = PathBuf::from("/custom/anki-sync.json");
        let result = resolve_config_path(Some(explicit.as_path())).unwrap();
        assert_eq!(result, explicit);
    }

    #[test]
    fn test_resolve_config_path_default_name() {
        let result = resolve_config_path(None).unwrap();
        assert!(result.ends_with("config.json"));
    }

    #[test]
    fn test_vault_flag_overrides_config() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        let store = JsonFileStore::new(&path);
        store.set("vault_path", "/stored").unwrap();

        let config = load_snapshot(Some(path.as_path()), Some(Path::new("/flag"))).unwrap();
        assert_eq!(config.vault_path, Some(PathBuf::from("/flag")));
    }

    #[test]
    fn test_require_vault() {
        let mut config = SyncConfig::default();
        assert!(matches!(require_vault(&config), Err(Error::Config(_))));
        config.vault_path = Some(PathBuf::from("/notes"));
        assert_eq!(require_vault(&config).unwrap(), Path::new("/notes"));
    }
}
