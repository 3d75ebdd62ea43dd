//! Session history — append-only archive of completed analyses.
//!
//! Entries are immutable snapshots (deep copies, never live references),
//! ordered newest-first, and live only as long as the session: there is no
//! persistence across restarts and no update or delete operation.

use chrono::{DateTime, Utc};

use super::DreamContext;

// ---------------------------------------------------------------------------
// HistoryEntry
// ---------------------------------------------------------------------------

/// One archived analysis.  Created once, never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    /// Unique time-derived identifier.
    pub id: String,
    /// Snapshot of the dream as it read when the analysis completed.
    pub dream: DreamContext,
    /// The oracle's interpretation, as markdown text.
    pub analysis: String,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// HistoryStore
// ---------------------------------------------------------------------------

/// In-memory, append-only store of [`HistoryEntry`] values, newest first,
/// with at most one selected entry.
#[derive(Debug, Default)]
pub struct HistoryStore {
    entries: Vec<HistoryEntry>,
    selected: Option<String>,
    /// Monotonic suffix keeping ids unique when two analyses land in the
    /// same millisecond.
    seq: u64,
}

impl HistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Archive a completed analysis and mark it selected.
    ///
    /// The dream is deep-copied: later edits to the live context cannot
    /// reach the stored snapshot.
    pub fn record(&mut self, dream: &DreamContext, analysis: &str) -> &HistoryEntry {
        let created_at = Utc::now();
        self.seq += 1;
        let id = format!("{}-{}", created_at.timestamp_millis(), self.seq);

        self.entries.insert(
            0,
            HistoryEntry {
                id: id.clone(),
                dream: dream.clone(),
                analysis: analysis.to_string(),
                created_at,
            },
        );
        self.selected = Some(id);
        &self.entries[0]
    }

    /// Load an entry for replay into the editor.
    ///
    /// Returns owned copies of the stored snapshot, so the caller's edits
    /// cannot mutate the archive, and marks the entry selected.  `None`
    /// when `id` is unknown.
    pub fn select(&mut self, id: &str) -> Option<(DreamContext, String)> {
        let entry = self.entries.iter().find(|e| e.id == id)?;
        let result = (entry.dream.clone(), entry.analysis.clone());
        self.selected = Some(id.to_string());
        Some(result)
    }

    /// Start a new dream: deselect history and hand back a fresh editing
    /// context.  Stored entries are untouched.
    pub fn reset(&mut self) -> DreamContext {
        self.selected = None;
        DreamContext::default()
    }

    /// All entries, newest first.
    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn selected_id(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
