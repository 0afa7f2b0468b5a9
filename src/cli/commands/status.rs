//! Status command implementation.

use crate::anki;
use crate::config::{load_snapshot, resolve_config_path};
use crate::error::{Error, Result};
use colored::Colorize;
use serde::Serialize;
use std::path::Path;

/// Output for status command.
#[derive(Serialize)]
struct StatusOutput {
    config_path: String,
    config_exists: bool,
    config_error: Option<String>,
    anki_connect_url: String,
    reachable: bool,
    api_version: Option<u32>,
    connection_error: Option<String>,
    deck_name: String,
    model_name: String,
    fields: Vec<String>,
    vault_path: Option<String>,
}

/// Execute status command.
///
/// Unreachable AnkiConnect or an invalid config are reported, not returned
/// as errors.
pub fn execute(config_path: Option<&Path>, vault: Option<&Path>, json: bool) -> Result<()> {
    let path = resolve_config_path(config_path)?;
    let config = load_snapshot(Some(path.as_path()), vault)?;
    let config_error = config.validate().err().map(|e| e.to_string());

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| Error::Other(format!("Failed to create async runtime: {e}")))?;
    let client = anki::connect(&config)?;
    let reply = rt.block_on(client.version());

    let output = StatusOutput {
        config_path: path.display().to_string(),
        config_exists: path.exists(),
        config_error,
        anki_connect_url: config.anki_connect_url.clone(),
        reachable: reply.is_ok(),
        api_version: reply.as_ref().ok().copied(),
        connection_error: reply.as_ref().err().map(ToString::to_string),
        deck_name: config.deck_name.clone(),
        model_name: config.model_name.clone(),
        fields: config.desired_fields(),
        vault_path: config.vault_path.as_ref().map(|p| p.display().to_string()),
    };

    if json {
        println!("{}", serde_json::to_string(&output)?);
        return Ok(());
    }

    println!("{}", "anki-sync status".bold());
    println!();
    let exists = if output.config_exists { "" } else { " (defaults)" };
    println!("  Config:      {}{}", output.config_path, exists.dimmed());
    match &output.config_error {
        Some(e) => println!("               {}", e.red()),
        None => println!("               {}", "valid".green()),
    }
    println!("  AnkiConnect: {}", output.anki_connect_url);
    match (output.api_version, &output.connection_error) {
        (Some(v), _) => println!("               {} (API v{v})", "reachable".green()),
        (None, Some(e)) => println!("               {} {}", "unreachable".red(), e.dimmed()),
        (None, None) => {}
    }
    println!("  Deck:        {}", output.deck_name);
    println!("  Note type:   {}", output.model_name);
    println!("  Fields:      {}", output.fields.join(", "));
    println!(
        "  Vault:       {}",
        output.vault_path.as_deref().unwrap_or("(not set)")
    );
    Ok(())
}
