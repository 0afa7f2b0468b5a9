//! Assign-ids command implementation.
//!
//! Gives every tag-filtered vault note without an identity a fresh UUID
//! under the configured identity property, so it can be synced.

use crate::config::{load_snapshot, require_vault};
use crate::error::Result;
use crate::tags::{normalize_tags, should_sync};
use crate::vault::{load_vault, write_identity};
use colored::Colorize;
use serde::Serialize;
use std::path::Path;
use tracing::warn;

#[derive(Serialize)]
struct Assignment {
    path: String,
    identity: String,
}

#[derive(Serialize)]
struct AssignOutput {
    dry_run: bool,
    property: String,
    assigned: Vec<Assignment>,
    /// Notes that carry the property with an unusable value.
    skipped: Vec<String>,
}

/// Execute the assign-ids command.
///
/// # Errors
///
/// Returns an error if the vault cannot be read or a note cannot be rewritten.
pub fn execute(config_path: Option<&Path>, vault: Option<&Path>, dry_run: bool, json: bool) -> Result<()> {
    let config = load_snapshot(config_path, vault)?;
    config.validate()?;
    let scan = load_vault(require_vault(&config)?)?;
    let include = normalize_tags(&config.include_tags);
    let exclude = normalize_tags(&config.exclude_tags);
    let property = &config.guid_property;

    let mut output = AssignOutput {
        dry_run,
        property: property.clone(),
        assigned: Vec::new(),
        skipped: Vec::new(),
    };

    for note in &scan.notes {
        if note.identity(property).is_some() || !should_sync(&note.tags(), &include, &exclude) {
            continue;
        }
        if note.frontmatter.contains_key(property) {
            warn!(note = %note.path.display(), property = %property, "Identity property present but empty, leaving it alone");
            output.skipped.push(note.path.display().to_string());
            continue;
        }

        let identity = uuid::Uuid::new_v4().to_string();
        if !dry_run {
            write_identity(note, property, &identity)?;
        }
        output.assigned.push(Assignment {
            path: note.path.display().to_string(),
            identity,
        });
    }

    if json {
        println!("{}", serde_json::to_string(&output)?);
        return Ok(());
    }

    let verb = if dry_run { "Would assign" } else { "Assigned" };
    println!(
        "{} {} identities under '{}'",
        verb.bold(),
        output.assigned.len(),
        property
    );
    for assignment in &output.assigned {
        println!("  {} {}", assignment.path, assignment.identity.dimmed());
    }
    for path in &output.skipped {
        println!("  {} {}", path, "(empty identity value, fix by hand)".yellow());
    }
    Ok(())
}
