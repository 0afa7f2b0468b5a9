//! Deck and note type reconciliation.
//!
//! [`ensure_model`] brings a note type's field list to an exact desired
//! order using the smallest set of field operations it can plan locally.
//! [`ensure_deck`] makes sure the target deck exists.

use std::collections::HashSet;
use std::fmt;

use serde::Serialize;
use tracing::{debug, info};

use super::client::{AnkiClient, CardTemplate};
use super::transport::AnkiTransport;
use crate::error::{Error, Result};

/// What happened to a note type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaOutcome {
    Created,
    Updated,
    Unchanged,
    /// Absent and creation not allowed.
    Skipped,
}

/// What happened to a deck.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeckOutcome {
    Created,
    Unchanged,
    Skipped,
}

impl fmt::Display for SchemaOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Unchanged => "unchanged",
            Self::Skipped => "skipped",
        })
    }
}

impl fmt::Display for DeckOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Created => "created",
            Self::Unchanged => "unchanged",
            Self::Skipped => "skipped",
        })
    }
}

/// A single field edit on a note type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldOp {
    Remove { name: String },
    Add { name: String, index: usize },
    Reposition { name: String, index: usize },
}

/// Plan the field edits that turn `current` into `desired`.
///
/// Unwanted fields are removed from last to first, then every desired
/// field is added or moved into its slot in order. `desired` must not
/// contain duplicates.
///
/// Anki refuses to remove a note type's last field, so when `current`
/// shares no name with `desired` the first desired field is added before
/// anything is removed.
#[must_use]
pub fn plan_convergence(current: &[String], desired: &[String]) -> Vec<FieldOp> {
    let mut ops = Vec::new();
    let mut fields = current.to_vec();

    if let Some(first) = desired.first() {
        if !fields.is_empty() && !fields.iter().any(|f| desired.contains(f)) {
            fields.insert(0, first.clone());
            ops.push(FieldOp::Add {
                name: first.clone(),
                index: 0,
            });
        }
    }

    for i in (0..fields.len()).rev() {
        if !desired.contains(&fields[i]) {
            ops.push(FieldOp::Remove {
                name: fields.remove(i),
            });
        }
    }

    for (index, name) in desired.iter().enumerate() {
        match fields.iter().position(|f| f == name) {
            Some(pos) if pos == index => {}
            Some(pos) => {
                let field = fields.remove(pos);
                fields.insert(index, field);
                ops.push(FieldOp::Reposition {
                    name: name.clone(),
                    index,
                });
            }
            None => {
                fields.insert(index.min(fields.len()), name.clone());
                ops.push(FieldOp::Add {
                    name: name.clone(),
                    index,
                });
            }
        }
    }

    ops
}

fn validate_model_request(name: &str, desired: &[String]) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::Config("note type name must not be blank".into()));
    }
    if desired.is_empty() {
        return Err(Error::Config(format!("note type '{name}' needs at least one field")));
    }
    let mut seen = HashSet::new();
    for field in desired {
        if field.trim().is_empty() {
            return Err(Error::Config(format!("note type '{name}' has a blank field name")));
        }
        if !seen.insert(field.as_str()) {
            return Err(Error::Config(format!(
                "note type '{name}' lists field '{field}' more than once"
            )));
        }
    }
    Ok(())
}

/// Make sure note type `name` exists with exactly the `desired` fields in order.
///
/// # Errors
///
/// Returns `Error::Config` for an invalid request (before any remote call),
/// `Error::SchemaConflict` when a deck already uses the name, or the first
/// remote error. A failure midway leaves the note type partially converged;
/// running again finishes the job.
pub async fn ensure_model<T: AnkiTransport>(
    client: &AnkiClient<T>,
    name: &str,
    desired: &[String],
    allow_create: bool,
) -> Result<SchemaOutcome> {
    validate_model_request(name, desired)?;

    let models = client.model_names().await?;
    if !models.iter().any(|m| m == name) {
        if !allow_create {
            debug!(model = name, "Note type missing and creation disabled");
            return Ok(SchemaOutcome::Skipped);
        }
        if client.deck_names().await?.iter().any(|d| d == name) {
            return Err(Error::SchemaConflict {
                name: name.to_string(),
            });
        }

        let template = CardTemplate {
            name: "Card 1".to_string(),
            front: format!("{{{{{}}}}}", desired[0]),
            back: String::new(),
        };
        client.create_model(name, desired, &[template]).await?;
        info!(model = name, fields = desired.len(), "Created note type");
        return Ok(SchemaOutcome::Created);
    }

    let current = client.model_field_names(name).await?;
    let ops = plan_convergence(&current, desired);
    if ops.is_empty() {
        debug!(model = name, "Note type fields already match");
        return Ok(SchemaOutcome::Unchanged);
    }

    for op in &ops {
        debug!(model = name, ?op, "Applying field change");
        match op {
            FieldOp::Remove { name: field } => client.model_field_remove(name, field).await?,
            FieldOp::Add { name: field, index } => {
                client.model_field_add(name, field, *index).await?;
            }
            FieldOp::Reposition { name: field, index } => {
                client.model_field_reposition(name, field, *index).await?;
            }
        }
    }

    info!(model = name, changes = ops.len(), "Updated note type fields");
    Ok(SchemaOutcome::Updated)
}

/// Make sure deck `name` exists.
///
/// # Errors
///
/// Returns `Error::Config` for a blank name, `Error::SchemaConflict` when a
/// note type already uses the name, or a remote error.
pub async fn ensure_deck<T: AnkiTransport>(
    client: &AnkiClient<T>,
    name: &str,
    allow_create: bool,
) -> Result<DeckOutcome> {
    if name.trim().is_empty() {
        return Err(Error::Config("deck name must not be blank".into()));
    }

    if client.deck_names().await?.iter().any(|d| d == name) {
        return Ok(DeckOutcome::Unchanged);
    }
    if !allow_create {
        debug!(deck = name, "Deck missing and creation disabled");
        return Ok(DeckOutcome::Skipped);
    }
    if client.model_names().await?.iter().any(|m| m == name) {
        return Err(Error::SchemaConflict {
            name: name.to_string(),
        });
    }

    client.create_deck(name).await?;
    info!(deck = name, "Created deck");
    Ok(DeckOutcome::Created)
}
