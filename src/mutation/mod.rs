//! Mutation application against the event store.

mod applier;

pub use applier::MutationApplier;
