//! In-process AnkiConnect stand-in for tests.
//!
//! Keeps decks, note types and notes in memory, records every action it
//! receives, and can be told to fail specific actions or notes.

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use serde_json::{json, Value as JsonValue};

use super::transport::AnkiTransport;
use crate::error::{Error, Result};

#[derive(Debug, Clone)]
pub struct MockModel {
    pub name: String,
    pub fields: Vec<String>,
    pub templates: JsonValue,
}

#[derive(Debug, Clone)]
pub struct MockNote {
    pub id: u64,
    pub deck: String,
    pub model: String,
    pub fields: BTreeMap<String, String>,
    pub tags: Vec<String>,
}

#[derive(Debug, Default)]
struct MockState {
    decks: Vec<String>,
    models: Vec<MockModel>,
    notes: Vec<MockNote>,
    next_id: u64,
    calls: Vec<String>,
    failing_actions: HashMap<String, String>,
    failing_values: Vec<String>,
    overrides: HashMap<String, JsonValue>,
}

/// Simulated AnkiConnect.
#[derive(Debug, Default)]
pub struct MockAnki {
    state: Mutex<MockState>,
}

impl MockAnki {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MockState {
                next_id: 1_000,
                ..MockState::default()
            }),
        }
    }

    pub fn with_deck(self, name: &str) -> Self {
        self.lock().decks.push(name.to_string());
        self
    }

    pub fn with_model(self, name: &str, fields: &[&str]) -> Self {
        self.lock().models.push(MockModel {
            name: name.to_string(),
            fields: fields.iter().map(|f| (*f).to_string()).collect(),
            templates: json!([]),
        });
        self
    }

    /// Make every call to `action` fail with `message`.
    pub fn fail_action(&self, action: &str, message: &str) {
        self.lock()
            .failing_actions
            .insert(action.to_string(), message.to_string());
    }

    /// Make `addNote` / `updateNoteFields` fail for notes with a field equal to `value`.
    pub fn fail_notes_with_value(&self, value: &str) {
        self.lock().failing_values.push(value.to_string());
    }

    /// Drop all injected failures.
    pub fn clear_failures(&self) {
        let mut state = self.lock();
        state.failing_actions.clear();
        state.failing_values.clear();
    }

    /// Return `result` verbatim for `action`.
    pub fn override_result(&self, action: &str, result: JsonValue) {
        self.lock().overrides.insert(action.to_string(), result);
    }

    /// Actions received so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.lock().calls.clone()
    }

    pub fn count(&self, action: &str) -> usize {
        self.lock().calls.iter().filter(|c| *c == action).count()
    }

    pub fn model(&self, name: &str) -> Option<MockModel> {
        self.lock().models.iter().find(|m| m.name == name).cloned()
    }

    pub fn model_fields(&self, name: &str) -> Option<Vec<String>> {
        self.model(name).map(|m| m.fields)
    }

    pub fn decks(&self) -> Vec<String> {
        self.lock().decks.clone()
    }

    pub fn note(&self, id: u64) -> Option<MockNote> {
        self.lock().notes.iter().find(|n| n.id == id).cloned()
    }

    pub fn notes(&self) -> Vec<MockNote> {
        self.lock().notes.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state.lock().expect("mock state poisoned")
    }

    fn handle(&self, action: &str, params: &JsonValue) -> Result<JsonValue> {
        let mut state = self.lock();
        state.calls.push(action.to_string());

        if let Some(message) = state.failing_actions.get(action) {
            return Err(Error::remote(action, message.clone()));
        }
        if let Some(result) = state.overrides.get(action) {
            return Ok(result.clone());
        }

        let fail = |msg: &str| Error::remote(action, msg.to_string());

        match action {
            "version" => Ok(json!(6)),
            "deckNames" => Ok(json!(state.decks)),
            "createDeck" => {
                let deck = str_param(action, params, "deck")?;
                if !state.decks.iter().any(|d| d == deck) {
                    state.decks.push(deck.to_string());
                }
                Ok(json!(state.decks.len()))
            }
            "modelNames" => Ok(json!(state.models.iter().map(|m| &m.name).collect::<Vec<_>>())),
            "modelFieldNames" => {
                let name = str_param(action, params, "modelName")?;
                let model = find_model(&state.models, name).ok_or_else(|| fail("model was not found"))?;
                Ok(json!(model.fields))
            }
            "createModel" => {
                let name = str_param(action, params, "modelName")?;
                if find_model(&state.models, name).is_some() {
                    return Err(fail("Model name already exists"));
                }
                let fields: Vec<String> = serde_json::from_value(params["inOrderFields"].clone())
                    .map_err(|e| fail(&e.to_string()))?;
                state.models.push(MockModel {
                    name: name.to_string(),
                    fields,
                    templates: params["cardTemplates"].clone(),
                });
                Ok(json!({ "name": name }))
            }
            "modelFieldRemove" | "modelFieldAdd" | "modelFieldReposition" => {
                let name = str_param(action, params, "modelName")?.to_string();
                let field = str_param(action, params, "fieldName")?.to_string();
                let index = params["index"].as_u64().map(|i| usize::try_from(i).unwrap_or(usize::MAX));
                let model = state
                    .models
                    .iter_mut()
                    .find(|m| m.name == name)
                    .ok_or_else(|| fail("model was not found"))?;
                let position = model.fields.iter().position(|f| *f == field);

                match (action, position) {
                    ("modelFieldRemove", Some(_)) if model.fields.len() == 1 => {
                        return Err(fail("a note type must have at least one field"));
                    }
                    ("modelFieldRemove", Some(pos)) => {
                        model.fields.remove(pos);
                    }
                    ("modelFieldAdd", None) => {
                        let at = index.unwrap_or(model.fields.len()).min(model.fields.len());
                        model.fields.insert(at, field);
                    }
                    ("modelFieldReposition", Some(pos)) => {
                        model.fields.remove(pos);
                        let at = index.unwrap_or(0).min(model.fields.len());
                        model.fields.insert(at, field);
                    }
                    ("modelFieldAdd", Some(_)) => return Err(fail("field already exists")),
                    _ => return Err(fail("field was not found")),
                }
                Ok(JsonValue::Null)
            }
            "findNotes" => {
                let query = str_param(action, params, "query")?;
                let (deck, field, value) =
                    parse_identity_query(query).ok_or_else(|| fail("unsupported query"))?;
                let ids: Vec<u64> = state
                    .notes
                    .iter()
                    .filter(|n| n.deck == deck && n.fields.get(field).map(String::as_str) == Some(value))
                    .map(|n| n.id)
                    .collect();
                Ok(json!(ids))
            }
            "addNote" => {
                let note = &params["note"];
                let deck = str_param(action, note, "deckName")?.to_string();
                let model_name = str_param(action, note, "modelName")?.to_string();
                let fields: BTreeMap<String, String> = serde_json::from_value(note["fields"].clone())
                    .map_err(|e| fail(&e.to_string()))?;
                let tags: Vec<String> = serde_json::from_value(note["tags"].clone()).unwrap_or_default();

                if !state.decks.contains(&deck) {
                    return Err(fail("deck was not found"));
                }
                let model = find_model(&state.models, &model_name).ok_or_else(|| fail("model was not found"))?;
                if let Some(unknown) = fields.keys().find(|k| !model.fields.contains(*k)) {
                    return Err(fail(&format!("field '{unknown}' not in model")));
                }
                if fields.values().any(|v| state.failing_values.contains(v)) {
                    return Err(fail("simulated failure"));
                }
                let first = model.fields.first().and_then(|f| fields.get(f)).cloned();
                let duplicate = state.notes.iter().any(|n| {
                    n.model == model_name
                        && model.fields.first().and_then(|f| n.fields.get(f)).cloned() == first
                });
                if duplicate {
                    return Err(fail("cannot create note because it is a duplicate"));
                }

                state.next_id += 1;
                let id = state.next_id;
                state.notes.push(MockNote {
                    id,
                    deck,
                    model: model_name,
                    fields,
                    tags,
                });
                Ok(json!(id))
            }
            "updateNoteFields" => {
                let note = &params["note"];
                let id = note["id"].as_u64().ok_or_else(|| fail("missing note id"))?;
                let fields: BTreeMap<String, String> = serde_json::from_value(note["fields"].clone())
                    .map_err(|e| fail(&e.to_string()))?;
                if fields.values().any(|v| state.failing_values.contains(v)) {
                    return Err(fail("simulated failure"));
                }
                let existing = state
                    .notes
                    .iter_mut()
                    .find(|n| n.id == id)
                    .ok_or_else(|| fail("note was not found"))?;
                existing.fields.extend(fields);
                Ok(JsonValue::Null)
            }
            _ => Err(fail("unsupported action")),
        }
    }
}

impl AnkiTransport for MockAnki {
    async fn invoke(&self, action: &str, params: Option<JsonValue>) -> Result<JsonValue> {
        self.handle(action, &params.unwrap_or(JsonValue::Null))
    }
}

fn find_model<'a>(models: &'a [MockModel], name: &str) -> Option<&'a MockModel> {
    models.iter().find(|m| m.name == name)
}

fn str_param<'a>(action: &str, params: &'a JsonValue, key: &str) -> Result<&'a str> {
    params[key]
        .as_str()
        .ok_or_else(|| Error::remote(action, format!("missing parameter '{key}'")))
}

/// Parse `deck:"D" "F:V"` into its parts.
fn parse_identity_query(query: &str) -> Option<(&str, &str, &str)> {
    let rest = query.strip_prefix("deck:\"")?;
    let (deck, rest) = rest.split_once("\" \"")?;
    let term = rest.strip_suffix('"')?;
    let (field, value) = term.split_once(':')?;
    Some((deck, field, value))
}
