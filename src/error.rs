//! Error types for anki-sync.
//!
//! Provides structured error handling with:
//! - Machine-readable error codes (`ErrorCode`)
//! - Category-based exit codes (3=identity, 5=conflict, 6=remote or incomplete sync, 7=config, etc.)
//! - Retryability flags for scripted callers
//! - Context-aware recovery hints
//! - Structured JSON output for piped / non-TTY consumers

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for anki-sync operations.
pub type Result<T> = std::result::Result<T, Error>;

// ── Error Code ────────────────────────────────────────────────

/// Machine-readable error codes grouped by category.
///
/// Each code maps to a SCREAMING_SNAKE string and a category-based
/// exit code. Scripts match on the string or on the exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Note (exit 3)
    MissingIdentity,
    NoteNotFound,

    // Validation (exit 4)
    InvalidArgument,

    // Conflict (exit 5)
    SchemaConflict,

    // Remote (exit 6)
    RemoteCallFailed,
    SyncIncomplete,

    // Config (exit 7)
    ConfigError,

    // I/O (exit 8)
    IoError,
    JsonError,
    YamlError,

    // Internal (exit 1)
    InternalError,
}

impl ErrorCode {
    /// Machine-readable SCREAMING_SNAKE code string.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        match self {
            Self::MissingIdentity => "MISSING_IDENTITY",
            Self::NoteNotFound => "NOTE_NOT_FOUND",
            Self::InvalidArgument => "INVALID_ARGUMENT",
            Self::SchemaConflict => "SCHEMA_CONFLICT",
            Self::RemoteCallFailed => "REMOTE_CALL_FAILED",
            Self::SyncIncomplete => "SYNC_INCOMPLETE",
            Self::ConfigError => "CONFIG_ERROR",
            Self::IoError => "IO_ERROR",
            Self::JsonError => "JSON_ERROR",
            Self::YamlError => "YAML_ERROR",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }

    /// Category-based exit code (1-8).
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::InternalError => 1,
            Self::MissingIdentity | Self::NoteNotFound => 3,
            Self::InvalidArgument => 4,
            Self::SchemaConflict => 5,
            Self::RemoteCallFailed | Self::SyncIncomplete => 6,
            Self::ConfigError => 7,
            Self::IoError | Self::JsonError | Self::YamlError => 8,
        }
    }

    /// Whether re-running the same command can succeed without changes.
    ///
    /// Only remote failures qualify: Anki may simply not have been running.
    /// Nothing in this crate retries on its own.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::RemoteCallFailed | Self::SyncIncomplete)
    }
}

// ── Error Enum ────────────────────────────────────────────────

/// Errors that can occur in anki-sync operations.
#[derive(Error, Debug)]
pub enum Error {
    /// The note has no value under the configured identity property.
    ///
    /// Bulk sync treats this as a silent skip rather than a failure.
    #[error("Note '{note}' has no value for identity property '{property}'")]
    MissingIdentity { note: String, property: String },

    #[error("Note not found: {}", path.display())]
    NoteNotFound { path: PathBuf },

    #[error("AnkiConnect call '{action}' failed: {message}")]
    Remote { action: String, message: String },

    /// A bulk sync finished but some notes failed; the report lists them.
    #[error("{failed} of {attempted} notes failed to sync")]
    SyncIncomplete { failed: usize, attempted: usize },

    #[error("Name '{name}' is already used by an existing deck or note type")]
    SchemaConflict { name: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Build a remote failure for the given AnkiConnect action.
    pub fn remote(action: &str, message: impl Into<String>) -> Self {
        Self::Remote {
            action: action.to_string(),
            message: message.into(),
        }
    }

    /// Map this error to its structured `ErrorCode`.
    #[must_use]
    pub const fn error_code(&self) -> ErrorCode {
        match self {
            Self::MissingIdentity { .. } => ErrorCode::MissingIdentity,
            Self::NoteNotFound { .. } => ErrorCode::NoteNotFound,
            Self::Remote { .. } => ErrorCode::RemoteCallFailed,
            Self::SyncIncomplete { .. } => ErrorCode::SyncIncomplete,
            Self::SchemaConflict { .. } => ErrorCode::SchemaConflict,
            Self::Config(_) => ErrorCode::ConfigError,
            Self::InvalidArgument(_) => ErrorCode::InvalidArgument,
            Self::Io(_) => ErrorCode::IoError,
            Self::Json(_) => ErrorCode::JsonError,
            Self::Yaml(_) => ErrorCode::YamlError,
            Self::Other(_) => ErrorCode::InternalError,
        }
    }

    /// Category-based exit code, delegating to the `ErrorCode`.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        self.error_code().exit_code()
    }

    /// True for the identity error that bulk sync skips silently.
    #[must_use]
    pub const fn is_missing_identity(&self) -> bool {
        matches!(self, Self::MissingIdentity { .. })
    }

    /// Context-aware recovery hint.
    ///
    /// Returns `None` if no actionable suggestion exists.
    #[must_use]
    pub fn hint(&self) -> Option<String> {
        match self {
            Self::MissingIdentity { property, .. } => Some(format!(
                "Add a '{property}' property to the note's frontmatter, \
                 or run `anki-sync assign-ids` to generate one."
            )),

            Self::NoteNotFound { .. } => {
                Some("Check the path, or pass --vault to resolve relative paths.".to_string())
            }

            Self::Remote { .. } => Some(
                "Make sure Anki is running with the AnkiConnect add-on installed.\n  \
                 Check: anki-sync status"
                    .to_string(),
            ),

            Self::SyncIncomplete { .. } => Some(
                "Fix the failed notes listed above and run `anki-sync sync all` again; \
                 notes already synced are updated in place."
                    .to_string(),
            ),

            Self::SchemaConflict { name } => Some(format!(
                "Rename the deck or note type so they do not share the name '{name}' \
                 (anki-sync config set deck_name <name>)."
            )),

            Self::Config(msg) => {
                if msg.contains("collide") {
                    Some(
                        "Field names must be unique across guid_property, properties and callouts."
                            .to_string(),
                    )
                } else {
                    Some("Inspect the configuration with `anki-sync config show`.".to_string())
                }
            }

            Self::InvalidArgument(_)
            | Self::Io(_)
            | Self::Json(_)
            | Self::Yaml(_)
            | Self::Other(_) => None,
        }
    }

    /// Structured JSON representation for machine consumption.
    ///
    /// Includes error code, message, retryability, exit code, and
    /// optional recovery hint.
    #[must_use]
    pub fn to_structured_json(&self) -> serde_json::Value {
        let code = self.error_code();
        let mut obj = serde_json::json!({
            "error": {
                "code": code.as_str(),
                "message": self.to_string(),
                "retryable": code.is_retryable(),
                "exit_code": code.exit_code(),
            }
        });

        if let Some(hint) = self.hint() {
            obj["error"]["hint"] = serde_json::Value::String(hint);
        }

        obj
    }
}
