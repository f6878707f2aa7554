//! Almanac: natural-language calendar event resolution engine.
//!
//! Given an ambiguous utterance that refers to an existing scheduled item
//! ("tomorrow afternoon's meeting, move it to 3pm"), Almanac identifies
//! which concrete calendar entry the user means, among potentially
//! hundreds of candidates, using temporal-range inference, lexical scoring
//! with synonym expansion, optional semantic-embedding similarity, and a
//! stateful confirm/apply protocol, then executes the confirmed UPDATE or
//! DELETE idempotently.
//!
//! The calendar store and the embedding provider are external
//! collaborators behind the [`store::EventStore`] and
//! [`embedding::EmbeddingProvider`] traits.

pub mod config;
pub mod embedding;
pub mod error;
pub mod model;
pub mod mutation;
pub mod resolve;
pub mod store;

pub use config::{ApiEmbeddingConfig, Config, EmbeddingConfig, ResolutionConfig};
pub use embedding::{cosine_similarity, ApiEmbeddingProvider, EmbeddingProvider};
pub use error::{
    AlmanacError, ConfigError, EmbeddingError, MutationError, ResolutionError, Result, StoreError,
};
pub use model::{
    CalendarEntry, Candidate, CandidateCard, Changes, EventIntent, IntentAction, Locators,
    MutationResult, ScopeHint, TimeWindow,
};
pub use mutation::MutationApplier;
pub use resolve::{
    ApplyOutcome, ChooseOutcome, EventResolver, HybridScorer, ResolutionSession, ResolveOutcome,
    SessionState, TimeWindowExtractor,
};
pub use store::{EventStore, MemoryEventStore, RemoveScope};
