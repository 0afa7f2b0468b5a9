//! Sync result types.

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Outcome of syncing a single note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum NoteSyncOutcome {
    /// A new Anki note was added.
    Created { id: u64 },
    /// An existing Anki note had its fields overwritten.
    Updated { id: u64 },
}

impl NoteSyncOutcome {
    /// The Anki note id.
    #[must_use]
    pub const fn id(&self) -> u64 {
        match self {
            Self::Created { id } | Self::Updated { id } => *id,
        }
    }
}

impl fmt::Display for NoteSyncOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created { id } => write!(f, "created note {id}"),
            Self::Updated { id } => write!(f, "updated note {id}"),
        }
    }
}

/// A note that failed during bulk sync.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncFailure {
    pub path: PathBuf,
    pub message: String,
}

/// Tally of a bulk sync.
#[derive(Debug, Default, Clone, Serialize)]
pub struct BulkReport {
    /// Notes added to Anki.
    pub created: usize,
    /// Notes whose Anki fields were overwritten.
    pub updated: usize,
    /// Notes that failed for any reason other than a missing identity.
    pub failed: usize,
    /// Notes without an identity.
    pub skipped: usize,
    /// Notes rejected by the tag filter.
    pub filtered_out: usize,
    /// Per-note failure details, in processing order.
    pub failures: Vec<SyncFailure>,
    /// Stopped early on request.
    pub cancelled: bool,
    /// When the run ended.
    pub finished_at: Option<DateTime<Utc>>,
}

impl BulkReport {
    /// Notes that were created or updated.
    #[must_use]
    pub const fn succeeded(&self) -> usize {
        self.created + self.updated
    }

    /// Notes that reached the sync step (passed the filter).
    #[must_use]
    pub const fn attempted(&self) -> usize {
        self.created + self.updated + self.failed + self.skipped
    }

    /// True when nothing failed.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failed == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bulk_report_totals() {
        let report = BulkReport {
            created: 1,
            updated: 1,
            failed: 1,
            skipped: 1,
            filtered_out: 1,
            ..BulkReport::default()
        };
        assert_eq!(report.succeeded(), 2);
        assert_eq!(report.attempted(), 4);
        assert!(!report.is_clean());
    }

    #[test]
    fn test_outcome_serializes_with_action_tag() {
        let json = serde_json::to_value(NoteSyncOutcome::Created { id: 7 }).unwrap();
        assert_eq!(json, serde_json::json!({"action": "created", "id": 7}));
        assert_eq!(NoteSyncOutcome::Updated { id: 9 }.id(), 9);
    }
}
