//! Candidate ranking: sort, threshold, truncate.

use crate::config::ResolutionConfig;
use crate::model::Candidate;

/// Sorts scored candidates and produces the bounded presentation list.
pub struct CandidateRanker {
    top_k: usize,
    epsilon: f64,
}

impl CandidateRanker {
    /// Create a ranker from the resolution configuration. `top_k` is
    /// clamped to the configured ceiling.
    pub fn new(config: &ResolutionConfig) -> Self {
        Self {
            top_k: config.top_k.min(config.max_top_k).max(1),
            epsilon: config.score_epsilon,
        }
    }

    /// Sort descending by score (stable, so ties keep retrieval order),
    /// drop effectively-zero scores, truncate to top-K, and assign ranks.
    pub fn rank(&self, mut candidates: Vec<Candidate>) -> Vec<Candidate> {
        candidates.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        candidates.retain(|c| c.score > self.epsilon);
        candidates.truncate(self.top_k);
        for (i, candidate) in candidates.iter_mut().enumerate() {
            candidate.rank = i + 1;
        }
        candidates
    }
}
