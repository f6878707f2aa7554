//! Hybrid candidate scoring.
//!
//! Each candidate's score is the sum of independent lexical components
//! (title hints, token overlap, attendees, location, time proximity,
//! all-day agreement) plus an optional semantic component from the
//! embedding collaborator. Semantic weighting adapts to how much the
//! utterance says about time: a time-blind utterance leans almost entirely
//! on meaning, a precisely-timed one mostly on the lexical signals.
//!
//! Embedding failures never abort scoring; the semantic component is
//! silently omitted for that request.

use std::sync::Arc;

use tracing::debug;

use crate::config::ResolutionConfig;
use crate::embedding::{cosine_similarity, EmbeddingProvider};
use crate::model::{CalendarEntry, Candidate, Locators};

use super::lexicon::{tokenize, SynonymLexicon};
use super::time_window::WindowExtraction;

/// Inputs shared by every candidate in one scoring pass.
pub struct ScoringContext<'a> {
    /// Raw user utterance.
    pub utterance: &'a str,
    /// Structured hints, when the upstream model supplied them.
    pub locators: Option<&'a Locators>,
    /// Windows produced by the extractor for this request.
    pub extraction: &'a WindowExtraction,
    /// Whether the utterance carries an explicit time cue.
    pub has_time_hint: bool,
}

/// Computes composite relevance scores for a candidate pool.
pub struct HybridScorer {
    config: ResolutionConfig,
    lexicon: SynonymLexicon,
    embedder: Option<Arc<dyn EmbeddingProvider>>,
}

impl HybridScorer {
    /// Create a scorer. The embedder is optional; without it scoring is
    /// lexical-only.
    pub fn new(
        config: ResolutionConfig,
        lexicon: SynonymLexicon,
        embedder: Option<Arc<dyn EmbeddingProvider>>,
    ) -> Self {
        Self {
            config,
            lexicon,
            embedder,
        }
    }

    /// Score a candidate pool, applying the semantic prefilter when the
    /// request is time-ambiguous. Returns unranked candidates.
    pub async fn score_pool(
        &self,
        ctx: &ScoringContext<'_>,
        pool: Vec<CalendarEntry>,
    ) -> Vec<Candidate> {
        let semantic = self.semantic_scores(ctx.utterance, &pool).await;

        let (pool, semantic) =
            if (!ctx.has_time_hint || ctx.extraction.used_fallback) && semantic.is_some() {
                semantic_prefilter(pool, semantic.unwrap(), self.config.prefilter_cap)
            } else {
                (pool, semantic)
            };

        let semantic_weight = self.semantic_weight(ctx);
        pool.into_iter()
            .enumerate()
            .map(|(i, entry)| {
                let mut score = self.lexical_score(ctx, &entry);
                if let Some(ref scores) = semantic {
                    score += scores[i] * semantic_weight;
                }
                Candidate::new(entry, score)
            })
            .collect()
    }

    /// Weight for the normalized semantic similarity.
    fn semantic_weight(&self, ctx: &ScoringContext<'_>) -> f64 {
        if !ctx.has_time_hint {
            self.config.semantic_weight_no_time
        } else if ctx.extraction.used_fallback {
            self.config.semantic_weight_fallback
        } else {
            self.config.semantic_weight_timed
        }
    }

    /// Sum of the lexical scoring components for one entry.
    fn lexical_score(&self, ctx: &ScoringContext<'_>, entry: &CalendarEntry) -> f64 {
        let cfg = &self.config;
        let title = entry.title.to_lowercase();
        let notes = entry
            .notes
            .as_deref()
            .map(str::to_lowercase)
            .unwrap_or_default();

        let mut score = 0.0;

        if let Some(loc) = ctx.locators {
            if !loc.title_hints.is_empty() && self.all_hints_match(&loc.title_hints, &title, &notes)
            {
                score += cfg.title_hint_bonus;
            }

            if !loc.attendee_names.is_empty() {
                let matches = attendee_matches(&loc.attendee_names, &entry.attendees);
                if matches > 0 {
                    score += cfg.attendee_cap.min(matches as f64);
                }
            }

            if let (Some(hint), Some(location)) = (&loc.location_hint, &entry.location) {
                if location.to_lowercase().contains(&hint.to_lowercase()) {
                    score += cfg.location_bonus;
                }
            }

            if let Some(phrase) = &loc.time_phrase {
                let phrase = phrase.to_lowercase();
                if phrase.contains("all day") || phrase.contains("all-day") {
                    score += if entry.all_day {
                        cfg.all_day_bonus
                    } else {
                        -cfg.all_day_penalty
                    };
                }
            }
        }

        for token in tokenize(ctx.utterance) {
            if self.lexicon.matches(&token, &title) {
                score += cfg.title_token_weight;
            } else if self.lexicon.matches(&token, &notes) {
                score += cfg.notes_token_weight;
            }
        }

        if ctx.has_time_hint {
            if let Some(center) = ctx.extraction.nearest_center(entry.start) {
                let hours = (entry.start - center).num_seconds().abs() as f64 / 3600.0;
                score += (cfg.time_decay_base - hours / cfg.time_decay_rate).max(0.0);
            }
        }

        score
    }

    /// Every hint token, after synonym expansion, must occur in the title
    /// or notes for the must-have bonus.
    fn all_hints_match(&self, hints: &[String], title: &str, notes: &str) -> bool {
        hints.iter().all(|hint| {
            tokenize(hint).iter().all(|token| {
                self.lexicon.matches(token, title) || self.lexicon.matches(token, notes)
            })
        })
    }

    /// Per-candidate semantic similarity against the utterance, normalized
    /// to [0, 1]. `None` whenever the provider is absent, fails, or returns
    /// a mismatched vector count.
    async fn semantic_scores(&self, utterance: &str, pool: &[CalendarEntry]) -> Option<Vec<f64>> {
        let embedder = self.embedder.as_ref()?;
        if pool.is_empty() || utterance.trim().is_empty() {
            return None;
        }

        let mut texts = Vec::with_capacity(pool.len() + 1);
        texts.push(utterance.to_string());
        texts.extend(pool.iter().map(candidate_text));

        let vectors = match embedder.embed(&texts).await {
            Ok(vectors) => vectors,
            Err(err) => {
                debug!(error = %err, "embedding failed, degrading to lexical-only scoring");
                return None;
            }
        };

        if vectors.len() != texts.len() {
            debug!(
                expected = texts.len(),
                got = vectors.len(),
                "embedding vector count mismatch, degrading to lexical-only scoring"
            );
            return None;
        }

        let (query, rest) = vectors.split_first()?;
        Some(
            rest.iter()
                .map(|v| ((cosine_similarity(query, v) + 1.0) / 2.0).clamp(0.0, 1.0))
                .collect(),
        )
    }
}

/// Cheap similarity-only pass that shrinks a time-ambiguous pool before
/// full scoring. Keeps the top `cap` entries by semantic score, returned
/// in first-seen order so downstream tie-breaks stay stable.
fn semantic_prefilter(
    pool: Vec<CalendarEntry>,
    scores: Vec<f64>,
    cap: usize,
) -> (Vec<CalendarEntry>, Option<Vec<f64>>) {
    if pool.len() <= cap {
        return (pool, Some(scores));
    }

    let mut paired: Vec<(usize, CalendarEntry, f64)> = pool
        .into_iter()
        .zip(scores)
        .enumerate()
        .map(|(i, (entry, score))| (i, entry, score))
        .collect();
    paired.sort_by(|a, b| b.2.partial_cmp(&a.2).unwrap_or(std::cmp::Ordering::Equal));
    paired.truncate(cap);
    paired.sort_by_key(|(i, _, _)| *i);
    debug!(cap, "semantic prefilter capped candidate pool");

    let (pool, scores) = paired
        .into_iter()
        .map(|(_, entry, score)| (entry, score))
        .unzip();
    (pool, Some(scores))
}

/// The text an entry is embedded as: title, notes, and location combined.
fn candidate_text(entry: &CalendarEntry) -> String {
    let mut text = entry.title.clone();
    if let Some(notes) = &entry.notes {
        text.push(' ');
        text.push_str(notes);
    }
    if let Some(location) = &entry.location {
        text.push(' ');
        text.push_str(location);
    }
    text
}

/// Normalized substring overlap in either direction, one point per locator
/// name with at least one matching attendee.
fn attendee_matches(wanted: &[String], attendees: &[String]) -> usize {
    wanted
        .iter()
        .map(|w| w.trim().to_lowercase())
        .filter(|w| !w.is_empty())
        .filter(|w| {
            attendees.iter().any(|a| {
                let a = a.trim().to_lowercase();
                !a.is_empty() && (a.contains(w.as_str()) || w.contains(a.as_str()))
            })
        })
        .count()
}
