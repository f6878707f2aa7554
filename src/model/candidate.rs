//! Scored candidates and the presentation contract.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::entry::CalendarEntry;

/// A calendar entry paired with its relevance score for one resolution
/// request. Discarded after the turn unless cached in a session.
#[derive(Debug, Clone)]
pub struct Candidate {
    /// The underlying entry.
    pub entry: CalendarEntry,
    /// Composite relevance score.
    pub score: f64,
    /// Stable 1-based rank after sorting.
    pub rank: usize,
}

impl Candidate {
    /// Pair an entry with a score; rank is assigned by the ranker.
    pub fn new(entry: CalendarEntry, score: f64) -> Self {
        Self {
            entry,
            score,
            rank: 0,
        }
    }
}

/// One row of the numbered candidate list shown to the upstream
/// resolver/model. This is the only view it sees when emitting a choice.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateCard {
    /// 1-based position in the presented list.
    pub no: usize,
    pub title: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub is_all_day: bool,
    pub calendar: String,
    pub attendees: Vec<String>,
}

impl CandidateCard {
    /// Build the card for a ranked candidate.
    pub fn from_candidate(candidate: &Candidate) -> Self {
        let entry = &candidate.entry;
        Self {
            no: candidate.rank,
            title: entry.title.clone(),
            start: entry.start,
            end: entry.end,
            location: entry.location.clone(),
            is_all_day: entry.all_day,
            calendar: entry.calendar.clone(),
            attendees: entry.attendees.clone(),
        }
    }

    /// Render a ranked list in presentation order.
    pub fn list(ranked: &[Candidate]) -> Vec<Self> {
        ranked.iter().map(Self::from_candidate).collect()
    }
}

/// Successful outcome of an applied mutation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MutationResult {
    /// Identifier of the affected entry.
    pub id: String,
    /// Title after the mutation (original title for deletes).
    pub title: String,
    /// Start after the mutation.
    pub start: DateTime<Utc>,
    /// End after the mutation.
    pub end: DateTime<Utc>,
}

impl MutationResult {
    /// Snapshot the relevant fields of an entry.
    pub fn from_entry(entry: &CalendarEntry) -> Self {
        Self {
            id: entry.id.clone(),
            title: entry.title.clone(),
            start: entry.start,
            end: entry.end,
        }
    }
}
