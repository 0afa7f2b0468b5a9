//! Config command implementations.

use crate::cli::ConfigCommands;
use crate::config::{
    load_snapshot, resolve_config_path, JsonFileStore, SettingsStore, SyncConfig, SETTING_KEYS,
};
use crate::error::{Error, Result};
use colored::Colorize;
use serde_json::Value as JsonValue;
use std::path::Path;

/// Execute config commands.
pub fn execute(
    command: &ConfigCommands,
    config_path: Option<&Path>,
    vault: Option<&Path>,
    json: bool,
) -> Result<()> {
    match command {
        ConfigCommands::Show => show(config_path, vault, json),
        ConfigCommands::Init { force } => init(config_path, *force, json),
        ConfigCommands::Set { key, value } => set(config_path, key, value, json),
        ConfigCommands::Validate => validate(config_path, vault, json),
    }
}

fn show(config_path: Option<&Path>, vault: Option<&Path>, json: bool) -> Result<()> {
    let path = resolve_config_path(config_path)?;
    let config = load_snapshot(Some(path.as_path()), vault)?;

    if json {
        let output = serde_json::json!({
            "path": path.display().to_string(),
            "exists": path.exists(),
            "config": config,
        });
        println!("{}", serde_json::to_string(&output)?);
        return Ok(());
    }

    let suffix = if path.exists() { "" } else { " (not created, showing defaults)" };
    println!("{} {}{}", "Config:".bold(), path.display(), suffix.dimmed());
    println!();
    print_settings(&config)?;
    Ok(())
}

/// Print every setting as an aligned `key  value` line.
fn print_settings(config: &SyncConfig) -> Result<()> {
    let values = serde_json::to_value(config)?;
    let width = SETTING_KEYS.iter().map(|k| k.len()).max().unwrap_or(0);

    for key in SETTING_KEYS {
        let display = match values.get(*key) {
            None | Some(JsonValue::Null) => "(unset)".dimmed().to_string(),
            Some(JsonValue::String(s)) => s.clone(),
            Some(JsonValue::Array(items)) if items.is_empty() => "(none)".dimmed().to_string(),
            Some(JsonValue::Array(items)) => items
                .iter()
                .map(|v| v.as_str().map_or_else(|| v.to_string(), str::to_string))
                .collect::<Vec<_>>()
                .join(", "),
            Some(other) => other.to_string(),
        };
        println!("  {}  {display}", format!("{key:<width$}").cyan());
    }
    Ok(())
}

fn init(config_path: Option<&Path>, force: bool, json: bool) -> Result<()> {
    let store = JsonFileStore::new(resolve_config_path(config_path)?);

    if store.exists() && !force {
        return Err(Error::InvalidArgument(format!(
            "Config file already exists: {} (use --force to overwrite)",
            store.path().display()
        )));
    }

    store.save(&SyncConfig::default())?;

    if json {
        let output = serde_json::json!({
            "success": true,
            "path": store.path().display().to_string(),
        });
        println!("{}", serde_json::to_string(&output)?);
    } else {
        println!("{} {}", "Created".green(), store.path().display());
        println!();
        println!("Next steps:");
        println!("  anki-sync config set vault_path <dir>");
        println!("  anki-sync config set properties title,authors");
        println!("  anki-sync schema ensure");
    }
    Ok(())
}

fn set(config_path: Option<&Path>, key: &str, value: &str, json: bool) -> Result<()> {
    let store = JsonFileStore::new(resolve_config_path(config_path)?);
    let config = store.set(key, value)?;

    if let Err(e) = config.validate() {
        tracing::warn!(error = %e, "Saved configuration does not validate");
    }

    if json {
        let values = serde_json::to_value(&config)?;
        let output = serde_json::json!({
            "success": true,
            "key": key,
            "value": values.get(key).cloned().unwrap_or(JsonValue::Null),
        });
        println!("{}", serde_json::to_string(&output)?);
    } else {
        println!("{} {key}", "Set".green());
    }
    Ok(())
}

fn validate(config_path: Option<&Path>, vault: Option<&Path>, json: bool) -> Result<()> {
    let config = load_snapshot(config_path, vault)?;
    config.validate()?;

    let fields = config.desired_fields();
    if json {
        let output = serde_json::json!({
            "valid": true,
            "fields": fields,
        });
        println!("{}", serde_json::to_string(&output)?);
    } else {
        println!("{} Configuration is valid", "✓".green());
        println!("  Note type fields: {}", fields.join(", "));
    }
    Ok(())
}
