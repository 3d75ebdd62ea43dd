//! Data model — the dreamer, the dream, and what the oracle said about it.
//!
//! [`UserProfile`] is captured once at onboarding and immutable for the
//! session.  [`DreamContext`] is the live editing state, owned by the
//! embedding application and reset on "new dream".  Completed analyses are
//! archived as [`HistoryEntry`] snapshots in the [`HistoryStore`].

pub mod history;

pub use history::{HistoryEntry, HistoryStore};

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// UserProfile
// ---------------------------------------------------------------------------

/// Who is dreaming.  Filled in during onboarding; never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub full_name: String,
    /// Age in years.
    pub age: u32,
    pub birth_city: String,
    /// Date the session started, as the user's locale renders it.
    pub session_date: String,
}

// ---------------------------------------------------------------------------
// DreamContext
// ---------------------------------------------------------------------------

/// The live editing state of one dream: narrative, when it happened, loose
/// notes, and an optional attached image (base64).
///
/// `Default` is the "new dream" state — empty text, today's date, the
/// traditional 03:00 hour the original journal starts from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DreamContext {
    /// The dream narrative (hand-typed, dictated, or both).
    pub narrative: String,
    /// ISO date (`YYYY-MM-DD`) the dream occurred.
    pub dream_date: String,
    /// Wall-clock time (`HH:MM`) the dream occurred.
    pub dream_time: String,
    /// Loose fragments and sensations that did not fit the narrative.
    pub additional_notes: String,
    /// Optional attached image, base64-encoded.
    pub image: Option<String>,
}

impl Default for DreamContext {
    fn default() -> Self {
        Self {
            narrative: String::new(),
            dream_date: chrono::Local::now().format("%Y-%m-%d").to_string(),
            dream_time: "03:00".to_string(),
            additional_notes: String::new(),
            image: None,
        }
    }
}

// ---------------------------------------------------------------------------
// SymbolSearch
// ---------------------------------------------------------------------------

/// A web-grounded citation attached to a symbolism answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLink {
    pub title: String,
    pub uri: String,
}

/// Result of a grounded symbolism lookup: the model's summary plus the
/// ordered web sources it was grounded on (possibly empty).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolSearch {
    pub text: String,
    pub sources: Vec<SourceLink>,
}
