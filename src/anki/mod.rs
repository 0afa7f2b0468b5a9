//! AnkiConnect integration.
//!
//! - [`transport`] - the `invoke(action, params)` seam and its HTTP implementation
//! - [`client`] - typed wrappers for the actions the sync engine uses
//! - [`schema`] - deck and note type reconciliation

pub mod client;
pub mod schema;
pub mod transport;

#[cfg(test)]
pub(crate) mod mock;

pub use client::{identity_query, AnkiClient, CardTemplate, NewNote};
pub use schema::{ensure_deck, ensure_model, plan_convergence, DeckOutcome, FieldOp, SchemaOutcome};
pub use transport::{AnkiConnect, AnkiTransport, API_VERSION};

use std::time::Duration;

use crate::config::SyncConfig;
use crate::error::Result;

/// Build a client for the endpoint and timeout in `config`.
///
/// # Errors
///
/// Returns an error if the HTTP client cannot be built.
pub fn connect(config: &SyncConfig) -> Result<AnkiClient<AnkiConnect>> {
    let transport = AnkiConnect::new(
        config.anki_connect_url.clone(),
        Duration::from_secs(config.request_timeout_secs),
    )?;
    Ok(AnkiClient::new(transport))
}
