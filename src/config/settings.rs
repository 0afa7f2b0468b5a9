//! Typed sync configuration.
//!
//! [`SyncConfig`] is loaded once per command and handed to every core
//! operation by reference. Nothing reads configuration from global state.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;

use crate::callout::CalloutFormat;
use crate::error::{Error, Result};

/// Default AnkiConnect address.
pub const DEFAULT_ANKI_CONNECT_URL: &str = "http://127.0.0.1:8765";

/// Keys accepted by [`SyncConfig::set`], in display order.
pub const SETTING_KEYS: &[&str] = &[
    "anki_connect_url",
    "request_timeout_secs",
    "deck_name",
    "model_name",
    "guid_property",
    "properties",
    "callouts",
    "include_tags",
    "exclude_tags",
    "auto_create_deck",
    "auto_create_model",
    "callout_format",
    "vault_path",
];

/// Settings for syncing notes into Anki.
///
/// Stored as JSON; missing keys fall back to their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// AnkiConnect endpoint.
    pub anki_connect_url: String,
    /// Per-request timeout applied by the HTTP transport.
    pub request_timeout_secs: u64,
    /// Target deck.
    pub deck_name: String,
    /// Target note type.
    pub model_name: String,
    /// Frontmatter key holding each note's identity; also the first field.
    pub guid_property: String,
    /// Frontmatter properties copied into fields, in field order.
    pub properties: Vec<String>,
    /// Callout labels copied into fields, after the properties.
    pub callouts: Vec<String>,
    /// Bulk sync only visits notes carrying one of these tags (if any).
    pub include_tags: Vec<String>,
    /// Bulk sync never visits notes carrying one of these tags.
    pub exclude_tags: Vec<String>,
    /// Create the deck when it does not exist.
    pub auto_create_deck: bool,
    /// Create the note type when it does not exist.
    pub auto_create_model: bool,
    /// How callout text is turned into field content.
    pub callout_format: CalloutFormat,
    /// Root of the markdown vault.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vault_path: Option<PathBuf>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            anki_connect_url: DEFAULT_ANKI_CONNECT_URL.to_string(),
            request_timeout_secs: 30,
            deck_name: "Obsidian".to_string(),
            model_name: "Obsidian Note".to_string(),
            guid_property: "anki-guid".to_string(),
            properties: Vec::new(),
            callouts: Vec::new(),
            include_tags: Vec::new(),
            exclude_tags: Vec::new(),
            auto_create_deck: true,
            auto_create_model: true,
            callout_format: CalloutFormat::Plain,
            vault_path: None,
        }
    }
}

impl SyncConfig {
    /// The ordered field list the note type must have.
    ///
    /// The identity property always comes first, then properties, then
    /// callouts.
    #[must_use]
    pub fn desired_fields(&self) -> Vec<String> {
        std::iter::once(self.guid_property.clone())
            .chain(self.properties.iter().cloned())
            .chain(self.callouts.iter().cloned())
            .collect()
    }

    /// Check the configuration before anything talks to Anki.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` for blank names, a malformed URL, or field
    /// names that collide between the identity property, properties and
    /// callouts.
    pub fn validate(&self) -> Result<()> {
        if !(self.anki_connect_url.starts_with("http://")
            || self.anki_connect_url.starts_with("https://"))
        {
            return Err(Error::Config(format!(
                "anki_connect_url must start with http:// or https:// (got '{}')",
                self.anki_connect_url
            )));
        }

        for (key, value) in [
            ("deck_name", &self.deck_name),
            ("model_name", &self.model_name),
            ("guid_property", &self.guid_property),
        ] {
            if value.trim().is_empty() {
                return Err(Error::Config(format!("{key} must not be blank")));
            }
        }

        if self.properties.iter().chain(&self.callouts).any(|f| f.trim().is_empty()) {
            return Err(Error::Config(
                "properties and callouts must not contain blank entries".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for field in self.desired_fields() {
            if !seen.insert(field.clone()) {
                return Err(Error::Config(format!(
                    "field name '{field}' collides: guid_property, properties and callouts \
                     must not share names"
                )));
            }
        }

        Ok(())
    }

    /// Set a single key from its string form.
    ///
    /// Lists are comma separated; an empty value clears a list or the vault
    /// path.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidArgument` for unknown keys or unparsable values.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "anki_connect_url" => self.anki_connect_url = value.trim().to_string(),
            "request_timeout_secs" => {
                self.request_timeout_secs = value.trim().parse().map_err(|_| {
                    Error::InvalidArgument(format!("request_timeout_secs: '{value}' is not a number"))
                })?;
            }
            "deck_name" => self.deck_name = value.to_string(),
            "model_name" => self.model_name = value.to_string(),
            "guid_property" => self.guid_property = value.to_string(),
            "properties" => self.properties = parse_list(value),
            "callouts" => self.callouts = parse_list(value),
            "include_tags" => self.include_tags = parse_list(value),
            "exclude_tags" => self.exclude_tags = parse_list(value),
            "auto_create_deck" => self.auto_create_deck = parse_bool(key, value)?,
            "auto_create_model" => self.auto_create_model = parse_bool(key, value)?,
            "callout_format" => {
                self.callout_format = value.parse().map_err(Error::InvalidArgument)?;
            }
            "vault_path" => {
                self.vault_path = (!value.trim().is_empty()).then(|| PathBuf::from(value.trim()));
            }
            _ => {
                return Err(Error::InvalidArgument(format!(
                    "unknown setting '{key}' (known: {})",
                    SETTING_KEYS.join(", ")
                )));
            }
        }
        Ok(())
    }
}

fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        _ => Err(Error::InvalidArgument(format!("{key}: '{value}' is not a boolean"))),
    }
}
