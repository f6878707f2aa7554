//! Candidate retrieval from the event store.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::debug;

use crate::error::Result;
use crate::model::{CalendarEntry, TimeWindow};
use crate::store::EventStore;

/// Queries the event store over candidate windows and deduplicates the
/// results into a candidate pool.
pub struct CandidateRetriever {
    store: Arc<dyn EventStore>,
}

impl CandidateRetriever {
    /// Create a retriever over the given store.
    pub fn new(store: Arc<dyn EventStore>) -> Self {
        Self { store }
    }

    /// Fetch entries overlapping any window, deduplicated by entry
    /// identifier in first-seen order. No entry is scored twice even when
    /// windows overlap.
    pub async fn retrieve(&self, windows: &[TimeWindow]) -> Result<Vec<CalendarEntry>> {
        let mut seen: HashSet<String> = HashSet::new();
        let mut pool = Vec::new();

        for window in windows {
            let entries = self
                .store
                .query_overlapping(window.start, window.end)
                .await?;
            for entry in entries {
                if seen.insert(entry.id.clone()) {
                    pool.push(entry);
                }
            }
        }

        debug!(windows = windows.len(), pool = pool.len(), "retrieved candidate pool");
        Ok(pool)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryEventStore;
    use chrono::{Duration, TimeZone, Utc};

    fn entry(id: &str, hour: u32) -> CalendarEntry {
        let start = Utc.with_ymd_and_hms(2026, 3, 10, hour, 0, 0).unwrap();
        CalendarEntry::with_id(id, format!("Entry {id}"), start, start + Duration::hours(1))
    }

    fn window(from_hour: u32, to_hour: u32) -> TimeWindow {
        TimeWindow::new(
            Utc.with_ymd_and_hms(2026, 3, 10, from_hour, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2026, 3, 10, to_hour, 0, 0).unwrap(),
        )
    }

    #[tokio::test]
    async fn test_no_duplicates_across_overlapping_windows() {
        let store = Arc::new(MemoryEventStore::with_entries([
            entry("a", 9),
            entry("b", 14),
        ]));
        let retriever = CandidateRetriever::new(store);

        // Both windows cover entry "a".
        let pool = retriever
            .retrieve(&[window(8, 12), window(9, 16)])
            .await
            .unwrap();

        assert_eq!(pool.len(), 2);
        assert_eq!(pool[0].id, "a");
        assert_eq!(pool[1].id, "b");
    }

    #[tokio::test]
    async fn test_empty_pool_is_ok() {
        let store = Arc::new(MemoryEventStore::new());
        let retriever = CandidateRetriever::new(store);
        let pool = retriever.retrieve(&[window(8, 12)]).await.unwrap();
        assert!(pool.is_empty());
    }
}
