//! YAML frontmatter parsing.
//!
//! Parses the block at the very start of a markdown file:
//! ```markdown
//! ---
//! citation key: smith2021
//! tags: [paper, ml]
//! ---
//! ```
//!
//! Values are converted to `serde_json::Value` so callers can treat
//! strings, numbers and lists uniformly.

use serde_json::Value as JsonValue;
use std::collections::HashMap;

use crate::error::Result;

/// Parsed frontmatter as a map of string keys to JSON values.
pub type Frontmatter = HashMap<String, JsonValue>;

/// Byte range of the frontmatter block inside the raw text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Block {
    /// Start of the YAML body (after the opening `---` line).
    yaml_start: usize,
    /// End of the YAML body (start of the closing `---` line).
    yaml_end: usize,
}

fn locate(raw: &str) -> Option<Block> {
    let yaml_start = if raw.starts_with("---\n") {
        4
    } else if raw.starts_with("---\r\n") {
        5
    } else {
        return None;
    };

    let mut pos = yaml_start;
    for line in raw[yaml_start..].split_inclusive('\n') {
        if line.trim_end_matches(['\r', '\n']) == "---" {
            return Some(Block {
                yaml_start,
                yaml_end: pos,
            });
        }
        pos += line.len();
    }
    None
}

/// Split raw text into the frontmatter YAML (if any) and the body.
#[must_use]
pub fn split_frontmatter(raw: &str) -> (Option<&str>, &str) {
    let Some(block) = locate(raw) else {
        return (None, raw);
    };

    let yaml = &raw[block.yaml_start..block.yaml_end];
    let after = &raw[block.yaml_end..];
    let body = after
        .find('\n')
        .map_or("", |newline| &after[newline + 1..]);
    (Some(yaml), body)
}

/// Parse the frontmatter block of `raw`.
///
/// Notes without frontmatter yield an empty map. Malformed YAML is an error
/// so that a typo never silently drops a note's identity.
pub fn parse_frontmatter(raw: &str) -> Result<Frontmatter> {
    let Some(yaml) = split_frontmatter(raw).0 else {
        return Ok(Frontmatter::new());
    };
    if yaml.trim().is_empty() {
        return Ok(Frontmatter::new());
    }

    let value: serde_yaml::Value = serde_yaml::from_str(yaml)?;
    Ok(yaml_to_json_map(value))
}

fn yaml_to_json_map(value: serde_yaml::Value) -> Frontmatter {
    let serde_yaml::Value::Mapping(mapping) = value else {
        return Frontmatter::new();
    };
    mapping
        .into_iter()
        .filter_map(|(k, v)| yaml_key(&k).map(|key| (key, yaml_to_json(v))))
        .collect()
}

fn yaml_key(key: &serde_yaml::Value) -> Option<String> {
    match key {
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn yaml_to_json(value: serde_yaml::Value) -> JsonValue {
    match value {
        serde_yaml::Value::Null => JsonValue::Null,
        serde_yaml::Value::Bool(b) => JsonValue::Bool(b),
        serde_yaml::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                JsonValue::from(i)
            } else if let Some(u) = n.as_u64() {
                JsonValue::from(u)
            } else {
                n.as_f64().map_or(JsonValue::Null, JsonValue::from)
            }
        }
        serde_yaml::Value::String(s) => JsonValue::String(s),
        serde_yaml::Value::Sequence(seq) => {
            JsonValue::Array(seq.into_iter().map(yaml_to_json).collect())
        }
        serde_yaml::Value::Mapping(mapping) => JsonValue::Object(
            mapping
                .into_iter()
                .filter_map(|(k, v)| yaml_key(&k).map(|key| (key, yaml_to_json(v))))
                .collect(),
        ),
        serde_yaml::Value::Tagged(tagged) => yaml_to_json(tagged.value),
    }
}

/// Return `raw` with `key: value` added to its frontmatter.
///
/// The line is appended as the last entry of an existing block; a new block
/// is created when the note has none. The rest of the text is untouched.
pub fn insert_property(raw: &str, key: &str, value: &str) -> Result<String> {
    let mut entry = serde_yaml::Mapping::new();
    entry.insert(
        serde_yaml::Value::String(key.to_string()),
        serde_yaml::Value::String(value.to_string()),
    );
    let line = serde_yaml::to_string(&entry)?;

    match locate(raw) {
        Some(block) => {
            let (head, tail) = raw.split_at(block.yaml_end);
            let separator = if head.ends_with('\n') { "" } else { "\n" };
            Ok(format!("{head}{separator}{line}{tail}"))
        }
        None => Ok(format!("---\n{line}---\n{raw}")),
    }
}
