//! Resolution engine orchestrating the full pipeline.
//!
//! Extractor → retriever → scorer → ranker → session → applier. One call
//! to [`EventResolver::resolve`] handles one utterance; the caller owns the
//! [`ResolutionSession`] and passes it back for follow-up choices within
//! the same conversational turn.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::config::Config;
use crate::embedding::EmbeddingProvider;
use crate::error::{AlmanacError, Result};
use crate::model::{Candidate, CandidateCard, EventIntent, IntentAction, MutationResult, ScopeHint};
use crate::mutation::MutationApplier;
use crate::store::EventStore;

use super::lexicon::SynonymLexicon;
use super::ranking::CandidateRanker;
use super::retrieval::CandidateRetriever;
use super::scoring::{HybridScorer, ScoringContext};
use super::session::{ResolutionSession, SessionState};
use super::time_window::TimeWindowExtractor;

/// Outcome of resolving an utterance.
#[derive(Debug)]
pub enum ResolveOutcome {
    /// Nothing scored above threshold; ask the user for more detail.
    NoMatch,
    /// Candidates were ranked and presented for selection.
    Presented(Vec<CandidateCard>),
    /// A single definite UPDATE candidate was applied directly.
    AutoApplied(MutationResult),
    /// An auto-apply was attempted and failed.
    ApplyFailed(String),
}

/// Outcome of resolving a numeric choice.
#[derive(Debug)]
pub enum ChooseOutcome {
    /// The choice mapped to a cached candidate.
    Selected(Box<Candidate>),
    /// Cache miss or out-of-range index: a fresh list was presented.
    Presented(Vec<CandidateCard>),
    /// The fresh resolution found nothing either.
    NoMatch,
}

/// Outcome of applying a confirmed mutation.
#[derive(Debug)]
pub enum ApplyOutcome {
    /// The mutation succeeded.
    Applied(MutationResult),
    /// The mutation failed; the message is user-presentable.
    Failed(String),
}

/// The natural-language event resolution engine.
pub struct EventResolver {
    extractor: TimeWindowExtractor,
    retriever: CandidateRetriever,
    scorer: HybridScorer,
    ranker: CandidateRanker,
    applier: MutationApplier,
}

impl EventResolver {
    /// Create a resolver over an event store, with optional semantic
    /// scoring.
    pub fn new(
        store: Arc<dyn EventStore>,
        embedder: Option<Arc<dyn EmbeddingProvider>>,
        config: Config,
    ) -> Self {
        Self::with_reference(store, embedder, config, Utc::now())
    }

    /// Create a resolver anchored to a specific reference instant, for
    /// deterministic relative-date handling.
    pub fn with_reference(
        store: Arc<dyn EventStore>,
        embedder: Option<Arc<dyn EmbeddingProvider>>,
        config: Config,
        reference: DateTime<Utc>,
    ) -> Self {
        let resolution = config.resolution;
        Self {
            extractor: TimeWindowExtractor::with_reference(reference)
                .with_fallback_days(resolution.fallback_days),
            retriever: CandidateRetriever::new(store.clone()),
            ranker: CandidateRanker::new(&resolution),
            scorer: HybridScorer::new(resolution, SynonymLexicon::default(), embedder),
            applier: MutationApplier::new(store),
        }
    }

    /// Resolve an utterance to a ranked candidate list, starting a new
    /// conversational turn.
    ///
    /// UPDATE intents with exactly one surviving candidate and concrete
    /// changes are applied directly; DELETE always requires an explicit
    /// selection step.
    pub async fn resolve(
        &self,
        session: &mut ResolutionSession,
        utterance: &str,
        intent: Option<&EventIntent>,
    ) -> Result<ResolveOutcome> {
        session.begin_turn();

        let ranked = self.rank_for(utterance, intent).await?;
        session.remember(utterance, ranked.clone());

        if ranked.is_empty() {
            info!(utterance, "no candidate above threshold");
            return Ok(ResolveOutcome::NoMatch);
        }

        if let Some(intent) = intent {
            let definite = ranked.len() == 1;
            let concrete_changes = intent
                .changes
                .as_ref()
                .is_some_and(|changes| !changes.is_empty());
            if intent.action == IntentAction::Update && definite && concrete_changes {
                let candidate = ranked[0].clone();
                debug!(id = %candidate.entry.id, "auto-applying single definite update");
                return match self.apply(session, intent, &candidate).await? {
                    ApplyOutcome::Applied(result) => Ok(ResolveOutcome::AutoApplied(result)),
                    ApplyOutcome::Failed(message) => Ok(ResolveOutcome::ApplyFailed(message)),
                };
            }
        }

        Ok(ResolveOutcome::Presented(CandidateCard::list(&ranked)))
    }

    /// Resolve a 1-based numeric choice against the list shown earlier.
    ///
    /// A cold cache or out-of-range index falls back to presenting a
    /// freshly computed list for manual selection.
    pub async fn choose(
        &self,
        session: &mut ResolutionSession,
        utterance: &str,
        choice: usize,
        intent: Option<&EventIntent>,
    ) -> Result<ChooseOutcome> {
        if let Some(candidate) = session.select(utterance, choice) {
            return Ok(ChooseOutcome::Selected(Box::new(candidate)));
        }

        debug!(choice, "choice did not resolve against cache, recomputing");
        let ranked = self.rank_for(utterance, intent).await?;
        session.remember(utterance, ranked.clone());
        if ranked.is_empty() {
            return Ok(ChooseOutcome::NoMatch);
        }
        Ok(ChooseOutcome::Presented(CandidateCard::list(&ranked)))
    }

    /// Apply the intent's mutation to a confirmed candidate.
    pub async fn apply(
        &self,
        session: &mut ResolutionSession,
        intent: &EventIntent,
        candidate: &Candidate,
    ) -> Result<ApplyOutcome> {
        session.set_state(SessionState::Applying);

        let outcome = match intent.action {
            IntentAction::Update => match &intent.changes {
                Some(changes) if !changes.is_empty() => {
                    self.applier.update(&candidate.entry.id, changes).await
                }
                _ => Err(crate::error::MutationError::InvalidInput(
                    "update requested without any changes".to_string(),
                )
                .into()),
            },
            IntentAction::Delete => {
                // A single-occurrence scope targets just this instance of a
                // recurring entry; anything else removes the entry whole.
                let occurrence = match intent.locators.scope_hint {
                    ScopeHint::Single => Some(candidate.entry.start),
                    _ => None,
                };
                self.applier.delete(&candidate.entry.id, occurrence).await
            }
        };

        match outcome {
            Ok(result) => {
                session.set_state(SessionState::Applied);
                Ok(ApplyOutcome::Applied(result))
            }
            Err(AlmanacError::Mutation(err)) => {
                session.set_state(SessionState::ApplyFailed);
                info!(error = %err, "mutation failed");
                Ok(ApplyOutcome::Failed(err.to_string()))
            }
            Err(other) => Err(other),
        }
    }

    /// Extract, retrieve, score, and rank for one utterance.
    async fn rank_for(
        &self,
        utterance: &str,
        intent: Option<&EventIntent>,
    ) -> Result<Vec<Candidate>> {
        let locators = intent.map(|i| &i.locators);
        let extraction = self.extractor.extract(locators, utterance);
        let pool = self.retriever.retrieve(&extraction.windows).await?;

        let ctx = ScoringContext {
            utterance,
            locators,
            extraction: &extraction,
            has_time_hint: self.extractor.has_explicit_time_hint(utterance),
        };
        let scored = self.scorer.score_pool(&ctx, pool).await;
        Ok(self.ranker.rank(scored))
    }
}
