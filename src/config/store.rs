//! Settings persistence.
//!
//! [`SettingsStore`] is the accessor contract between the sync engine's
//! configuration and wherever it lives. The CLI uses [`JsonFileStore`].

use std::fs;
use std::path::{Path, PathBuf};

use super::settings::SyncConfig;
use crate::error::{Error, Result};

/// Load / persist a [`SyncConfig`].
pub trait SettingsStore {
    /// Current settings (defaults when nothing is stored yet).
    fn load(&self) -> Result<SyncConfig>;

    /// Persist `config`, replacing what was stored.
    fn save(&self, config: &SyncConfig) -> Result<()>;

    /// Set a single key and persist the result.
    fn set(&self, key: &str, value: &str) -> Result<SyncConfig> {
        let mut config = self.load()?;
        config.set(key, value)?;
        self.save(&config)?;
        Ok(config)
    }
}

/// Settings stored as pretty-printed JSON on disk.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Store backed by the file at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the settings file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the settings file exists.
    #[must_use]
    pub fn exists(&self) -> bool {
        self.path.exists()
    }
}

impl SettingsStore for JsonFileStore {
    fn load(&self) -> Result<SyncConfig> {
        if !self.path.exists() {
            return Ok(SyncConfig::default());
        }

        let content = fs::read_to_string(&self.path)
            .map_err(|e| Error::Config(format!("Failed to read config file: {e}")))?;

        serde_json::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse config file: {e}")))
    }

    fn save(&self, config: &SyncConfig) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| Error::Config(format!("Failed to create config directory: {e}")))?;
        }

        let content = serde_json::to_string_pretty(config)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {e}")))?;

        fs::write(&self.path, content)
            .map_err(|e| Error::Config(format!("Failed to write config file: {e}")))?;

        Ok(())
    }
}
