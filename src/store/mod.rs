//! Event-store collaborators.
//!
//! The external calendar store is abstracted behind [`EventStore`];
//! [`MemoryEventStore`] is an embedded implementation used in tests and
//! standalone deployments.

mod memory;
mod traits;

pub use memory::MemoryEventStore;
pub use traits::{EventStore, RemoveScope};
