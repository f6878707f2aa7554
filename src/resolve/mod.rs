//! Natural-language event resolution.
//!
//! Resolving "tomorrow afternoon's meeting, move it to 3pm" to one concrete
//! calendar entry runs through a fixed pipeline:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                       EventResolver                          │
//! │                                                              │
//! │  TimeWindowExtractor ──► CandidateRetriever ──► HybridScorer │
//! │   locators/utterance      store overlap +        lexical +   │
//! │   → time intervals        id-dedup pool          semantic    │
//! │                                                     │        │
//! │                     CandidateRanker ◄───────────────┘        │
//! │                      sort/threshold/top-K                    │
//! │                           │                                  │
//! │                    ResolutionSession                         │
//! │                     per-turn cache + state                   │
//! │                           │                                  │
//! │                     MutationApplier                          │
//! │                      UPDATE / DELETE                         │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each stage is side-effect-free up to the applier; the session is the
//! only per-turn mutable state and is owned by the caller.

mod engine;
mod lexicon;
mod ranking;
mod retrieval;
mod scoring;
mod session;
mod time_window;

pub use engine::{ApplyOutcome, ChooseOutcome, EventResolver, ResolveOutcome};
pub use lexicon::{tokenize, SynonymLexicon};
pub use ranking::CandidateRanker;
pub use retrieval::CandidateRetriever;
pub use scoring::{HybridScorer, ScoringContext};
pub use session::{ResolutionSession, SessionState};
pub use time_window::{TimeWindowExtractor, WindowExtraction};
