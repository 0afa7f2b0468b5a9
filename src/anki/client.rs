//! Typed AnkiConnect actions.
//!
//! One method per action the sync engine uses. Each call is a single
//! request; nothing is batched or cached.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value as JsonValue};

use super::transport::AnkiTransport;
use crate::error::{Error, Result};
use crate::fields::FieldMapping;

/// A card template for `createModel`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CardTemplate {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Front")]
    pub front: String,
    #[serde(rename = "Back")]
    pub back: String,
}

/// A note to add.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewNote<'a> {
    pub deck_name: &'a str,
    pub model_name: &'a str,
    pub fields: &'a FieldMapping,
    pub tags: &'a [String],
}

/// Typed client over an [`AnkiTransport`].
pub struct AnkiClient<T> {
    transport: T,
}

impl<T: AnkiTransport> AnkiClient<T> {
    /// Wrap a transport.
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    /// The underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    async fn call<R: DeserializeOwned>(&self, action: &str, params: Option<JsonValue>) -> Result<R> {
        let result = self.transport.invoke(action, params).await?;
        serde_json::from_value(result)
            .map_err(|e| Error::remote(action, format!("unexpected result: {e}")))
    }

    async fn call_unit(&self, action: &str, params: JsonValue) -> Result<()> {
        self.transport.invoke(action, Some(params)).await.map(|_| ())
    }

    /// AnkiConnect API version; doubles as a reachability check.
    pub async fn version(&self) -> Result<u32> {
        self.call("version", None).await
    }

    /// All deck names.
    pub async fn deck_names(&self) -> Result<Vec<String>> {
        self.call("deckNames", None).await
    }

    /// Create a deck, returning its id.
    pub async fn create_deck(&self, name: &str) -> Result<u64> {
        self.call("createDeck", Some(json!({ "deck": name }))).await
    }

    /// All note type names.
    pub async fn model_names(&self) -> Result<Vec<String>> {
        self.call("modelNames", None).await
    }

    /// Ordered field names of a note type.
    pub async fn model_field_names(&self, model: &str) -> Result<Vec<String>> {
        self.call("modelFieldNames", Some(json!({ "modelName": model })))
            .await
    }

    /// Create a note type with the given ordered fields and templates.
    pub async fn create_model(
        &self,
        model: &str,
        fields: &[String],
        templates: &[CardTemplate],
    ) -> Result<()> {
        self.call_unit(
            "createModel",
            json!({
                "modelName": model,
                "inOrderFields": fields,
                "isCloze": false,
                "cardTemplates": templates,
            }),
        )
        .await
    }

    /// Remove a field from a note type.
    pub async fn model_field_remove(&self, model: &str, field: &str) -> Result<()> {
        self.call_unit(
            "modelFieldRemove",
            json!({ "modelName": model, "fieldName": field }),
        )
        .await
    }

    /// Add a field to a note type at `index`.
    pub async fn model_field_add(&self, model: &str, field: &str, index: usize) -> Result<()> {
        self.call_unit(
            "modelFieldAdd",
            json!({ "modelName": model, "fieldName": field, "index": index }),
        )
        .await
    }

    /// Move an existing field of a note type to `index`.
    pub async fn model_field_reposition(&self, model: &str, field: &str, index: usize) -> Result<()> {
        self.call_unit(
            "modelFieldReposition",
            json!({ "modelName": model, "fieldName": field, "index": index }),
        )
        .await
    }

    /// Note ids matching an Anki search query.
    pub async fn find_notes(&self, query: &str) -> Result<Vec<u64>> {
        self.call("findNotes", Some(json!({ "query": query }))).await
    }

    /// Add a note, returning its id.
    pub async fn add_note(&self, note: &NewNote<'_>) -> Result<u64> {
        let id: Option<u64> = self.call("addNote", Some(json!({ "note": note }))).await?;
        id.ok_or_else(|| Error::remote("addNote", "note was not created"))
    }

    /// Overwrite the given fields of an existing note.
    ///
    /// Fields not present in `fields` keep their remote value.
    pub async fn update_note_fields(&self, id: u64, fields: &FieldMapping) -> Result<()> {
        self.call_unit(
            "updateNoteFields",
            json!({ "note": { "id": id, "fields": fields } }),
        )
        .await
    }
}

/// Search query locating the note with `identity` in `deck`.
///
/// Quotes inside the values are not escaped.
#[must_use]
pub fn identity_query(deck: &str, field: &str, identity: &str) -> String {
    format!("deck:\"{deck}\" \"{field}:{identity}\"")
}
