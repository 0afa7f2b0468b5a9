//! Schema command implementations.

use crate::anki;
use crate::cli::SchemaCommands;
use crate::config::load_snapshot;
use crate::error::{Error, Result};
use crate::sync::{SchemaReport, SyncEngine};
use colored::Colorize;
use std::path::Path;

/// Execute schema commands.
pub fn execute(
    command: &SchemaCommands,
    config_path: Option<&Path>,
    vault: Option<&Path>,
    json: bool,
) -> Result<()> {
    match command {
        SchemaCommands::Ensure { no_create } => ensure(config_path, vault, !*no_create, json),
    }
}

fn ensure(
    config_path: Option<&Path>,
    vault: Option<&Path>,
    allow_create: bool,
    json: bool,
) -> Result<()> {
    let config = load_snapshot(config_path, vault)?;
    let client = anki::connect(&config)?;
    let engine = SyncEngine::new(&client, &config)?;

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| Error::Other(format!("Failed to create async runtime: {e}")))?;
    let report = rt.block_on(engine.ensure_schema(allow_create))?;

    if json {
        let output = serde_json::json!({
            "deck": { "name": config.deck_name, "outcome": report.deck },
            "model": {
                "name": config.model_name,
                "outcome": report.model,
                "fields": config.desired_fields(),
            },
        });
        println!("{}", serde_json::to_string(&output)?);
    } else {
        print_report(&report, &config.deck_name, &config.model_name);
    }
    Ok(())
}

/// Human-readable schema outcome, shared with `sync --ensure-schema`.
pub fn print_report(report: &SchemaReport, deck: &str, model: &str) {
    println!("  Deck {}: {}", deck.bold(), report.deck.to_string().cyan());
    println!("  Note type {}: {}", model.bold(), report.model.to_string().cyan());
}
