//! Vault to Anki sync.
//!
//! [`SyncEngine`] pushes notes into a single Anki deck and note type:
//!
//! - **Single note**: locate the Anki note by identity, then update it or add it
//! - **Bulk**: filter by tags, sync survivors one at a time, tally the results
//! - **Schema**: make sure the deck and note type match the configuration
//!
//! # Example
//!
//! ```ignore
//! use anki_sync::{anki, config, sync::SyncEngine, vault};
//!
//! let config = config::load_snapshot(None, None)?;
//! let client = anki::connect(&config)?;
//! let engine = SyncEngine::new(&client, &config)?;
//!
//! let scan = vault::load_vault(config::require_vault(&config)?)?;
//! let report = engine.sync_by_tags(&scan.notes).await;
//! println!("{} synced, {} failed", report.succeeded(), report.failed);
//! ```

mod engine;
mod types;

pub use engine::{SchemaReport, SyncEngine};
pub use types::{BulkReport, NoteSyncOutcome, SyncFailure};
