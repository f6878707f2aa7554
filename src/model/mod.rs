//! Core data model for event resolution.
//!
//! - [`CalendarEntry`]: an entry as read from the external store
//! - [`EventIntent`] / [`Locators`] / [`Changes`]: structured intent from
//!   the upstream model, decoded leniently
//! - [`Candidate`] / [`CandidateCard`]: scored entries and the numbered
//!   presentation contract
//! - [`MutationResult`]: the outcome of an applied mutation

mod candidate;
mod entry;
mod intent;

pub use candidate::{Candidate, CandidateCard, MutationResult};
pub use entry::CalendarEntry;
pub use intent::{Changes, EventIntent, IntentAction, Locators, ScopeHint, TimeWindow};
