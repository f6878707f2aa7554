//! Event-store trait definitions.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::model::CalendarEntry;

/// Removal scope for recurring entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveScope {
    /// Remove only the given occurrence.
    Occurrence,
    /// Remove the entry (or series) as a whole.
    Series,
}

/// Interface to the external calendar store.
///
/// The engine never owns storage; every component receives this capability
/// explicitly rather than reaching for a global.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Entries overlapping the half-open interval `[start, end)`.
    async fn query_overlapping(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<CalendarEntry>>;

    /// Look up an entry by identifier.
    async fn get_by_id(&self, id: &str) -> Result<Option<CalendarEntry>>;

    /// Persist an entry, replacing the stored one with the same identifier.
    async fn save(&self, entry: CalendarEntry) -> Result<()>;

    /// Remove an entry, or one occurrence of it.
    async fn remove(&self, entry: &CalendarEntry, scope: RemoveScope) -> Result<()>;
}
