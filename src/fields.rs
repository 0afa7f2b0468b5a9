//! Field projection.
//!
//! Turns a note into the ordered field mapping sent to Anki. Field order
//! mirrors the note type's field order: identity, properties, callouts.

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value as JsonValue;

use crate::callout::{self, CalloutRenderer};
use crate::config::SyncConfig;
use crate::vault::Note;

/// Ordered `(field name, value)` pairs with unique names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldMapping {
    entries: Vec<(String, String)>,
}

impl FieldMapping {
    /// Empty mapping.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `name` to `value`.
    ///
    /// An existing name keeps its position and takes the new value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    /// Value for `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Field names in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    /// `(name, value)` pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no field is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for FieldMapping {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, value) in &self.entries {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Non-fatal problems found while projecting a note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectionWarning {
    /// A configured callout label has no block in the note; the field is empty.
    MissingCallout { label: String },
}

impl std::fmt::Display for ProjectionWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingCallout { label } => write!(f, "callout '{label}' not found"),
        }
    }
}

/// Fields for one note plus any warnings raised while building them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Projection {
    pub fields: FieldMapping,
    pub warnings: Vec<ProjectionWarning>,
}

/// Build the field mapping for `note`.
///
/// The identity field carries the note's identity (empty when missing;
/// callers that need an identity check it first). Properties are
/// stringified with lists joined by `", "`; absent properties and callouts
/// become empty strings.
#[must_use]
pub fn project(note: &Note, config: &SyncConfig, renderer: &dyn CalloutRenderer) -> Projection {
    let mut fields = FieldMapping::new();
    let mut warnings = Vec::new();

    fields.insert(
        config.guid_property.as_str(),
        note.identity(&config.guid_property).unwrap_or_default(),
    );

    for property in &config.properties {
        let value = note
            .frontmatter
            .get(property)
            .map(stringify_property)
            .unwrap_or_default();
        fields.insert(property.as_str(), value);
    }

    for label in &config.callouts {
        let value = match callout::extract(&note.content, label) {
            Some(content) => renderer.render(&content),
            None => {
                warnings.push(ProjectionWarning::MissingCallout {
                    label: label.clone(),
                });
                String::new()
            }
        };
        fields.insert(label.as_str(), value);
    }

    Projection { fields, warnings }
}

/// Stringify a frontmatter value for a field.
#[must_use]
pub fn stringify_property(value: &JsonValue) -> String {
    match value {
        JsonValue::Array(items) => items
            .iter()
            .map(stringify_scalar)
            .collect::<Vec<_>>()
            .join(", "),
        other => stringify_scalar(other),
    }
}

fn stringify_scalar(value: &JsonValue) -> String {
    match value {
        JsonValue::Null => String::new(),
        JsonValue::String(s) => s.clone(),
        JsonValue::Bool(b) => b.to_string(),
        JsonValue::Number(n) => n.to_string(),
        JsonValue::Array(_) | JsonValue::Object(_) => value.to_string(),
    }
}
