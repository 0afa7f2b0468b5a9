//! Note sync orchestration.

use std::sync::atomic::{AtomicBool, Ordering};

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::types::{BulkReport, NoteSyncOutcome, SyncFailure};
use crate::anki::{
    ensure_deck, ensure_model, identity_query, AnkiClient, AnkiTransport, DeckOutcome, NewNote,
    SchemaOutcome,
};
use crate::callout::CalloutRenderer;
use crate::config::SyncConfig;
use crate::error::{Error, Result};
use crate::fields::project;
use crate::tags::{normalize_tags, should_sync};
use crate::vault::Note;

/// Result of reconciling the deck and note type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SchemaReport {
    pub deck: DeckOutcome,
    pub model: SchemaOutcome,
}

/// Syncs vault notes into one Anki deck and note type.
///
/// Holds a borrowed client and an immutable config snapshot; every
/// operation reads settings from that snapshot only.
pub struct SyncEngine<'a, T> {
    client: &'a AnkiClient<T>,
    config: &'a SyncConfig,
    renderer: &'a dyn CalloutRenderer,
    include: Vec<String>,
    exclude: Vec<String>,
}

impl<'a, T: AnkiTransport> SyncEngine<'a, T> {
    /// Create an engine after validating `config`.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the configuration is invalid. No remote
    /// call is made.
    pub fn new(client: &'a AnkiClient<T>, config: &'a SyncConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            client,
            config,
            renderer: config.callout_format.renderer(),
            include: normalize_tags(&config.include_tags),
            exclude: normalize_tags(&config.exclude_tags),
        })
    }

    /// Use a different callout renderer than the configured format.
    #[must_use]
    pub fn with_renderer(mut self, renderer: &'a dyn CalloutRenderer) -> Self {
        self.renderer = renderer;
        self
    }

    /// Make sure the deck and note type exist and match the configuration.
    ///
    /// Creation additionally requires `allow_create`; the configured
    /// `auto_create_*` switches still apply.
    ///
    /// # Errors
    ///
    /// Returns the first remote or schema conflict error.
    pub async fn ensure_schema(&self, allow_create: bool) -> Result<SchemaReport> {
        let deck = ensure_deck(
            self.client,
            &self.config.deck_name,
            allow_create && self.config.auto_create_deck,
        )
        .await?;
        let model = ensure_model(
            self.client,
            &self.config.model_name,
            &self.config.desired_fields(),
            allow_create && self.config.auto_create_model,
        )
        .await?;
        Ok(SchemaReport { deck, model })
    }

    /// Whether `note` passes the configured tag filter.
    pub fn passes_filter(&self, note: &Note) -> bool {
        should_sync(&note.tags(), &self.include, &self.exclude)
    }

    /// Create or update the Anki note for `note`.
    ///
    /// The remote note is located by identity in the configured deck. If
    /// found, all mapped fields are overwritten; otherwise a new note is
    /// added with the note's frontmatter tags.
    ///
    /// # Errors
    ///
    /// Returns `Error::MissingIdentity` before any remote call when the note
    /// has no identity, or the first remote error.
    pub async fn sync_note(&self, note: &Note) -> Result<NoteSyncOutcome> {
        let property = &self.config.guid_property;
        let identity = note
            .identity(property)
            .ok_or_else(|| Error::MissingIdentity {
                note: note.name.clone(),
                property: property.clone(),
            })?;

        let projection = project(note, self.config, self.renderer);
        for warning in &projection.warnings {
            warn!(note = %note.name, "{warning}");
        }

        let query = identity_query(&self.config.deck_name, property, &identity);
        let existing = self.client.find_notes(&query).await?;

        if let Some(&id) = existing.first() {
            if existing.len() > 1 {
                debug!(note = %note.name, matches = existing.len(), "Several notes share an identity, updating the first");
            }
            self.client
                .update_note_fields(id, &projection.fields)
                .await?;
            info!(note = %note.name, id, "Updated Anki note");
            return Ok(NoteSyncOutcome::Updated { id });
        }

        let tags = note.frontmatter_tags();
        let id = self
            .client
            .add_note(&NewNote {
                deck_name: &self.config.deck_name,
                model_name: &self.config.model_name,
                fields: &projection.fields,
                tags: &tags,
            })
            .await?;
        info!(note = %note.name, id, "Created Anki note");
        Ok(NoteSyncOutcome::Created { id })
    }

    /// Sync every note that passes the tag filter.
    ///
    /// Never fails as a whole: notes without an identity are counted as
    /// skipped, other errors as failed.
    pub async fn sync_by_tags(&self, notes: &[Note]) -> BulkReport {
        self.sync_by_tags_until(notes, &AtomicBool::new(false)).await
    }

    /// Like [`sync_by_tags`](Self::sync_by_tags), stopping before the next
    /// note once `cancel` is set.
    pub async fn sync_by_tags_until(&self, notes: &[Note], cancel: &AtomicBool) -> BulkReport {
        let mut report = BulkReport::default();

        for note in notes {
            if cancel.load(Ordering::Relaxed) {
                info!("Bulk sync cancelled");
                report.cancelled = true;
                break;
            }
            if !self.passes_filter(note) {
                report.filtered_out += 1;
                continue;
            }

            match self.sync_note(note).await {
                Ok(NoteSyncOutcome::Created { .. }) => report.created += 1,
                Ok(NoteSyncOutcome::Updated { .. }) => report.updated += 1,
                Err(e) if e.is_missing_identity() => {
                    debug!(note = %note.name, "No identity, skipping");
                    report.skipped += 1;
                }
                Err(e) => {
                    warn!(note = %note.path.display(), error = %e, "Sync failed");
                    report.failed += 1;
                    report.failures.push(SyncFailure {
                        path: note.path.clone(),
                        message: e.to_string(),
                    });
                }
            }
        }

        report.finished_at = Some(Utc::now());
        info!(
            created = report.created,
            updated = report.updated,
            failed = report.failed,
            skipped = report.skipped,
            filtered_out = report.filtered_out,
            "Bulk sync finished"
        );
        report
    }
}
