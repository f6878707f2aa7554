//! In-memory event store.
//!
//! Backs tests and embedded deployments. Recurring occurrences are stored
//! as separate rows sharing one identifier, distinguished by start time.

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::debug;

use async_trait::async_trait;

use crate::error::Result;
use crate::model::CalendarEntry;

use super::traits::{EventStore, RemoveScope};

/// Simple in-memory [`EventStore`] implementation.
#[derive(Default)]
pub struct MemoryEventStore {
    entries: RwLock<Vec<CalendarEntry>>,
}

impl MemoryEventStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with entries.
    pub fn with_entries(entries: impl IntoIterator<Item = CalendarEntry>) -> Self {
        Self {
            entries: RwLock::new(entries.into_iter().collect()),
        }
    }

    /// Number of stored rows (occurrences count individually).
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Whether the store holds no rows.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl EventStore for MemoryEventStore {
    async fn query_overlapping(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<CalendarEntry>> {
        let entries = self.entries.read().await;
        let hits: Vec<CalendarEntry> = entries
            .iter()
            .filter(|e| e.overlaps(start, end))
            .cloned()
            .collect();
        debug!(
            from = %start,
            to = %end,
            hits = hits.len(),
            "queried overlapping entries"
        );
        Ok(hits)
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<CalendarEntry>> {
        let entries = self.entries.read().await;
        Ok(entries.iter().find(|e| e.id == id).cloned())
    }

    async fn save(&self, entry: CalendarEntry) -> Result<()> {
        let mut entries = self.entries.write().await;
        match entries.iter_mut().find(|e| e.id == entry.id) {
            Some(existing) => *existing = entry,
            None => entries.push(entry),
        }
        Ok(())
    }

    async fn remove(&self, entry: &CalendarEntry, scope: RemoveScope) -> Result<()> {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        match scope {
            RemoveScope::Occurrence => {
                entries.retain(|e| !(e.id == entry.id && e.start == entry.start));
            }
            RemoveScope::Series => {
                entries.retain(|e| e.id != entry.id);
            }
        }
        debug!(
            id = %entry.id,
            removed = before - entries.len(),
            ?scope,
            "removed entry"
        );
        Ok(())
    }
}
