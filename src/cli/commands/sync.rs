//! Sync command implementations.
//!
//! `sync note` pushes one file; `sync all` walks the vault, applies the tag
//! filter and reports a tally. Ctrl-C during `sync all` stops after the note
//! in flight; a second Ctrl-C exits at once with status 130.

use crate::anki;
use crate::cli::commands::schema::print_report;
use crate::cli::SyncCommands;
use crate::config::{load_snapshot, require_vault, SyncConfig};
use crate::error::{Error, Result};
use crate::sync::{BulkReport, NoteSyncOutcome, SyncEngine};
use crate::vault::{load_vault, Note};
use colored::Colorize;
use serde::Serialize;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Execute sync commands.
pub fn execute(
    command: &SyncCommands,
    config_path: Option<&Path>,
    vault: Option<&Path>,
    json: bool,
) -> Result<()> {
    let config = load_snapshot(config_path, vault)?;
    match command {
        SyncCommands::Note {
            path,
            ensure_schema,
        } => note(&config, path, *ensure_schema, json),
        SyncCommands::All {
            ensure_schema,
            dry_run,
        } => all(&config, *ensure_schema, *dry_run, json),
    }
}

fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Runtime::new()
        .map_err(|e| Error::Other(format!("Failed to create async runtime: {e}")))
}

/// Resolve a note path as given, falling back to the vault for relative paths.
fn resolve_note_path(config: &SyncConfig, path: &Path) -> PathBuf {
    if path.exists() || path.is_absolute() {
        return path.to_path_buf();
    }
    match &config.vault_path {
        Some(vault) => vault.join(path),
        None => path.to_path_buf(),
    }
}

fn note(config: &SyncConfig, path: &Path, ensure_schema: bool, json: bool) -> Result<()> {
    let note = Note::load(&resolve_note_path(config, path))?;
    let client = anki::connect(config)?;
    let engine = SyncEngine::new(&client, config)?;
    let rt = runtime()?;

    let schema = if ensure_schema {
        Some(rt.block_on(engine.ensure_schema(true))?)
    } else {
        None
    };
    let outcome = rt.block_on(engine.sync_note(&note))?;

    if json {
        let output = serde_json::json!({
            "note": note.path.display().to_string(),
            "schema": schema,
            "outcome": outcome,
        });
        println!("{}", serde_json::to_string(&output)?);
        return Ok(());
    }

    if let Some(report) = &schema {
        print_report(report, &config.deck_name, &config.model_name);
    }
    let verb = match outcome {
        NoteSyncOutcome::Created { .. } => "Created".green(),
        NoteSyncOutcome::Updated { .. } => "Updated".cyan(),
    };
    println!("{verb} {} (note id {})", note.name.bold(), outcome.id());
    Ok(())
}

/// One entry of a `sync all --dry-run` listing.
#[derive(Serialize)]
struct PlannedNote {
    path: String,
    identity: Option<String>,
}

fn all(config: &SyncConfig, ensure_schema: bool, dry_run: bool, json: bool) -> Result<()> {
    let scan = load_vault(require_vault(config)?)?;
    let client = anki::connect(config)?;
    let engine = SyncEngine::new(&client, config)?;

    if dry_run {
        let planned: Vec<PlannedNote> = scan
            .notes
            .iter()
            .filter(|n| engine.passes_filter(n))
            .map(|n| PlannedNote {
                path: n.path.display().to_string(),
                identity: n.identity(&config.guid_property),
            })
            .collect();
        return print_plan(&planned, scan.notes.len(), json);
    }

    let rt = runtime()?;
    let cancel = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&cancel);
    rt.spawn(async move {
        if watch_interrupts(tokio::signal::ctrl_c, &flag).await {
            std::process::exit(130);
        }
    });

    let schema = if ensure_schema {
        Some(rt.block_on(engine.ensure_schema(true))?)
    } else {
        None
    };
    let report = rt.block_on(engine.sync_by_tags_until(&scan.notes, &cancel));

    if json {
        let unreadable: Vec<_> = scan
            .unreadable
            .iter()
            .map(|(path, message)| serde_json::json!({ "path": path.display().to_string(), "message": message }))
            .collect();
        let output = serde_json::json!({
            "schema": schema,
            "report": report,
            "unreadable": unreadable,
        });
        println!("{}", serde_json::to_string(&output)?);
    } else {
        if let Some(schema) = &schema {
            print_report(schema, &config.deck_name, &config.model_name);
        }
        print_bulk(&report, &scan.unreadable);
    }

    if report.failed > 0 {
        return Err(Error::SyncIncomplete {
            failed: report.failed,
            attempted: report.attempted(),
        });
    }
    Ok(())
}

/// Set `cancel` on the first interrupt. Returns true once a second
/// interrupt arrives, meaning the caller should quit without waiting.
async fn watch_interrupts<F, Fut>(mut interrupt: F, cancel: &AtomicBool) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::io::Result<()>>,
{
    if interrupt().await.is_err() {
        return false;
    }
    cancel.store(true, Ordering::Relaxed);
    eprintln!(
        "{}",
        "Stopping after the current note. Press Ctrl-C again to quit now.".yellow()
    );
    interrupt().await.is_ok()
}

fn print_plan(planned: &[PlannedNote], total: usize, json: bool) -> Result<()> {
    if json {
        let output = serde_json::json!({
            "dry_run": true,
            "total": total,
            "notes": planned,
        });
        println!("{}", serde_json::to_string(&output)?);
        return Ok(());
    }

    println!(
        "{} {} of {total} notes pass the tag filter:",
        "Dry run:".bold(),
        planned.len()
    );
    for entry in planned {
        match &entry.identity {
            Some(id) => println!("  {} {}", entry.path, format!("[{id}]").dimmed()),
            None => println!("  {} {}", entry.path, "(no identity, would be skipped)".yellow()),
        }
    }
    Ok(())
}

fn print_bulk(report: &BulkReport, unreadable: &[(PathBuf, String)]) {
    if report.cancelled {
        println!("{}", "Cancelled before all notes were synced.".yellow());
    }
    println!("{}", "Sync complete".bold());
    println!("  Created:      {}", report.created.to_string().green());
    println!("  Updated:      {}", report.updated.to_string().cyan());
    println!("  Skipped:      {} (no identity)", report.skipped);
    println!("  Filtered out: {}", report.filtered_out);
    if report.failed > 0 {
        println!("  Failed:       {}", report.failed.to_string().red());
        for failure in &report.failures {
            println!("    {} {}", failure.path.display(), failure.message.dimmed());
        }
    }
    if !unreadable.is_empty() {
        println!("  Unreadable:   {}", unreadable.len().to_string().yellow());
        for (path, message) in unreadable {
            println!("    {} {}", path.display(), message.dimmed());
        }
    }
}
