//! Per-turn resolution session.
//!
//! Caches the ranked list keyed by normalized utterance so a later numeric
//! choice ("#2") resolves to the same list the user or model was shown.
//! The session is owned by the caller and passed per conversational turn;
//! starting a new turn clears the cache, so stale in-flight resolutions
//! simply become unreachable.

use tracing::debug;

use crate::model::Candidate;

/// Lifecycle of one resolution exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// No resolution attempted yet this turn.
    #[default]
    AwaitingResolution,
    /// Resolution ran and found nothing above threshold.
    NoMatch,
    /// A ranked list was presented for selection.
    CandidatesPresented,
    /// A candidate was chosen.
    SelectionMade,
    /// A mutation is in flight.
    Applying,
    /// The mutation succeeded.
    Applied,
    /// The mutation failed.
    ApplyFailed,
}

/// Mutable per-turn state for one conversational exchange.
#[derive(Debug, Default)]
pub struct ResolutionSession {
    key: Option<String>,
    ranked: Vec<Candidate>,
    state: SessionState,
}

impl ResolutionSession {
    /// Create a fresh session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new conversational turn, invalidating any cached list.
    pub fn begin_turn(&mut self) {
        if self.key.is_some() {
            debug!("clearing cached candidates for new turn");
        }
        self.key = None;
        self.ranked.clear();
        self.state = SessionState::AwaitingResolution;
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Advance the lifecycle state.
    pub fn set_state(&mut self, state: SessionState) {
        self.state = state;
    }

    /// Cache a ranked list under the utterance it was computed for.
    pub fn remember(&mut self, utterance: &str, ranked: Vec<Candidate>) {
        self.key = Some(normalize(utterance));
        self.ranked = ranked;
        self.state = if self.ranked.is_empty() {
            SessionState::NoMatch
        } else {
            SessionState::CandidatesPresented
        };
    }

    /// The cached list for this utterance, if it is the one cached.
    pub fn recall(&self, utterance: &str) -> Option<&[Candidate]> {
        match &self.key {
            Some(key) if *key == normalize(utterance) => Some(&self.ranked),
            _ => None,
        }
    }

    /// Resolve a 1-based choice index against the cached list.
    ///
    /// Returns `None` when the cache is cold, keyed to a different
    /// utterance, or the index is out of range; the caller then falls back
    /// to presenting a freshly computed list.
    pub fn select(&mut self, utterance: &str, choice: usize) -> Option<Candidate> {
        let ranked = self.recall(utterance)?;
        if choice == 0 || choice > ranked.len() {
            debug!(choice, cached = ranked.len(), "choice index out of range");
            return None;
        }
        let candidate = ranked[choice - 1].clone();
        self.state = SessionState::SelectionMade;
        Some(candidate)
    }
}

/// Case- and whitespace-insensitive cache key.
fn normalize(utterance: &str) -> String {
    utterance.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CalendarEntry;
    use chrono::{Duration, TimeZone, Utc};

    fn ranked_pair() -> Vec<Candidate> {
        let start = Utc.with_ymd_and_hms(2026, 3, 10, 14, 0, 0).unwrap();
        ["Project Sync", "Dentist"]
            .iter()
            .enumerate()
            .map(|(i, title)| {
                let mut c = Candidate::new(
                    CalendarEntry::with_id(
                        format!("e{i}"),
                        *title,
                        start,
                        start + Duration::hours(1),
                    ),
                    2.0 - i as f64,
                );
                c.rank = i + 1;
                c
            })
            .collect()
    }

    #[test]
    fn test_select_resolves_against_cached_list() {
        let mut session = ResolutionSession::new();
        session.remember("Move the sync", ranked_pair());
        assert_eq!(session.state(), SessionState::CandidatesPresented);

        // Same utterance modulo case and spacing.
        let chosen = session.select("  move THE sync ", 2).unwrap();
        assert_eq!(chosen.entry.title, "Dentist");
        assert_eq!(session.state(), SessionState::SelectionMade);
    }

    #[test]
    fn test_out_of_range_choice_falls_back() {
        let mut session = ResolutionSession::new();
        session.remember("move the sync", ranked_pair());
        assert!(session.select("move the sync", 0).is_none());
        assert!(session.select("move the sync", 3).is_none());
    }

    #[test]
    fn test_different_utterance_misses_cache() {
        let mut session = ResolutionSession::new();
        session.remember("move the sync", ranked_pair());
        assert!(session.recall("delete the dentist").is_none());
        assert!(session.select("delete the dentist", 1).is_none());
    }

    #[test]
    fn test_begin_turn_clears_cache() {
        let mut session = ResolutionSession::new();
        session.remember("move the sync", ranked_pair());
        session.begin_turn();
        assert_eq!(session.state(), SessionState::AwaitingResolution);
        assert!(session.recall("move the sync").is_none());
    }

    #[test]
    fn test_empty_list_is_no_match() {
        let mut session = ResolutionSession::new();
        session.remember("whatever", Vec::new());
        assert_eq!(session.state(), SessionState::NoMatch);
    }
}
