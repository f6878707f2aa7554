//! Mutation application: UPDATE and DELETE against a resolved entry.
//!
//! Mutations are serialized per entry identifier, and deletes are
//! idempotent: a delete key that already succeeded short-circuits to the
//! cached success without re-invoking the store.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::{MutationError, Result};
use crate::model::{CalendarEntry, Changes, MutationResult};
use crate::store::{EventStore, RemoveScope};

/// Tolerance in milliseconds when matching a recurring occurrence by start
/// time.
const OCCURRENCE_TOLERANCE_MS: i64 = 1000;

/// Applies confirmed mutations to the event store.
pub struct MutationApplier {
    store: Arc<dyn EventStore>,
    /// Successful deletes by idempotency key `entry_id|ISO(start)`.
    applied_deletes: Mutex<HashMap<String, MutationResult>>,
    /// Per-entry locks serializing mutations to the same identifier. A
    /// slot is dropped once no mutation holds it.
    entry_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl MutationApplier {
    /// Create an applier over the given store.
    pub fn new(store: Arc<dyn EventStore>) -> Self {
        Self {
            store,
            applied_deletes: Mutex::new(HashMap::new()),
            entry_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Apply field deltas to an entry.
    ///
    /// Only present fields are applied. When only a new start is given the
    /// original duration is preserved. Fails with `NotFound` for an
    /// unresolvable identifier, `InvalidInput` for an unparseable time
    /// string, and `Persistence` when the store write fails.
    pub async fn update(&self, entry_id: &str, changes: &Changes) -> Result<MutationResult> {
        let lock = self.lock_for(entry_id).await;
        let guard = lock.lock().await;
        let result = self.apply_update(entry_id, changes).await;
        drop(guard);
        drop(lock);
        self.release_lock(entry_id).await;
        result
    }

    async fn apply_update(&self, entry_id: &str, changes: &Changes) -> Result<MutationResult> {
        let mut entry = self
            .store
            .get_by_id(entry_id)
            .await?
            .ok_or_else(|| MutationError::NotFound(entry_id.to_string()))?;

        let new_start = changes.start.as_deref().map(parse_time).transpose()?;
        let new_end = changes.end.as_deref().map(parse_time).transpose()?;

        let original_duration = entry.duration();
        if let Some(start) = new_start {
            entry.start = start;
            entry.end = match new_end {
                Some(end) => end,
                // Start moved without an end: keep the original duration.
                None => start + original_duration,
            };
        } else if let Some(end) = new_end {
            entry.end = end;
        }

        if let Some(title) = &changes.title {
            entry.title = title.clone();
        }
        if let Some(location) = &changes.location {
            entry.location = Some(location.clone());
        }
        if let Some(notes) = &changes.notes {
            entry.notes = Some(notes.clone());
        }

        let result = MutationResult::from_entry(&entry);
        self.store
            .save(entry)
            .await
            .map_err(|e| MutationError::Persistence(e.to_string()))?;
        info!(id = %result.id, title = %result.title, "updated entry");
        Ok(result)
    }

    /// Remove an entry, or one occurrence of a recurring entry.
    ///
    /// With `occurrence_start`, entries within that day sharing the
    /// identifier are searched for a start within one second, and only
    /// that occurrence is removed. Without it the entry is removed as a
    /// whole. Repeating a delete whose key already succeeded returns the
    /// cached success without touching the store.
    pub async fn delete(
        &self,
        entry_id: &str,
        occurrence_start: Option<DateTime<Utc>>,
    ) -> Result<MutationResult> {
        let lock = self.lock_for(entry_id).await;
        let guard = lock.lock().await;
        let result = self.apply_delete(entry_id, occurrence_start).await;
        drop(guard);
        drop(lock);
        self.release_lock(entry_id).await;
        result
    }

    async fn apply_delete(
        &self,
        entry_id: &str,
        occurrence_start: Option<DateTime<Utc>>,
    ) -> Result<MutationResult> {
        if let Some(occ) = occurrence_start {
            let key = delete_key(entry_id, occ);
            if let Some(cached) = self.cached_delete(&key).await {
                debug!(key, "delete already applied, returning cached success");
                return Ok(cached);
            }

            let target = self
                .find_occurrence(entry_id, occ)
                .await?
                .ok_or_else(|| MutationError::NotFound(entry_id.to_string()))?;
            return self
                .remove_and_record(target, RemoveScope::Occurrence, key)
                .await;
        }

        match self.store.get_by_id(entry_id).await? {
            Some(entry) => {
                let key = delete_key(entry_id, entry.start);
                if let Some(cached) = self.cached_delete(&key).await {
                    debug!(key, "delete already applied, returning cached success");
                    return Ok(cached);
                }
                self.remove_and_record(entry, RemoveScope::Series, key).await
            }
            // The entry may be gone because this applier already deleted it.
            None => self
                .cached_delete_for_entry(entry_id)
                .await
                .ok_or_else(|| MutationError::NotFound(entry_id.to_string()).into()),
        }
    }

    async fn remove_and_record(
        &self,
        entry: CalendarEntry,
        scope: RemoveScope,
        key: String,
    ) -> Result<MutationResult> {
        let result = MutationResult::from_entry(&entry);
        self.store
            .remove(&entry, scope)
            .await
            .map_err(|e| MutationError::Persistence(e.to_string()))?;
        info!(id = %result.id, title = %result.title, ?scope, "deleted entry");
        self.applied_deletes
            .lock()
            .await
            .insert(key, result.clone());
        Ok(result)
    }

    /// Search the occurrence's day for an entry with the same identifier
    /// starting within the tolerance.
    async fn find_occurrence(
        &self,
        entry_id: &str,
        occurrence_start: DateTime<Utc>,
    ) -> Result<Option<CalendarEntry>> {
        let day_start = DateTime::from_naive_utc_and_offset(
            occurrence_start
                .date_naive()
                .and_hms_opt(0, 0, 0)
                .unwrap_or_default(),
            Utc,
        );
        let day_end = day_start + Duration::days(1);

        let entries = self.store.query_overlapping(day_start, day_end).await?;
        Ok(entries.into_iter().find(|e| {
            e.id == entry_id
                && (e.start - occurrence_start).num_milliseconds().abs()
                    <= OCCURRENCE_TOLERANCE_MS
        }))
    }

    async fn cached_delete(&self, key: &str) -> Option<MutationResult> {
        self.applied_deletes.lock().await.get(key).cloned()
    }

    /// Any cached delete for this identifier, regardless of occurrence.
    async fn cached_delete_for_entry(&self, entry_id: &str) -> Option<MutationResult> {
        let prefix = format!("{entry_id}|");
        self.applied_deletes
            .lock()
            .await
            .iter()
            .find(|(key, _)| key.starts_with(&prefix))
            .map(|(_, result)| result.clone())
    }

    async fn lock_for(&self, entry_id: &str) -> Arc<Mutex<()>> {
        self.entry_locks
            .lock()
            .await
            .entry(entry_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Drop the lock slot when the map holds the only remaining reference.
    async fn release_lock(&self, entry_id: &str) {
        let mut locks = self.entry_locks.lock().await;
        if locks
            .get(entry_id)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(entry_id);
        }
    }
}

/// Idempotency key for a delete.
fn delete_key(entry_id: &str, start: DateTime<Utc>) -> String {
    format!("{entry_id}|{}", start.to_rfc3339())
}

/// Parse a time string from the upstream model.
fn parse_time(value: &str) -> std::result::Result<DateTime<Utc>, MutationError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(DateTime::from_naive_utc_and_offset(ndt, Utc));
        }
    }
    Err(MutationError::InvalidInput(format!(
        "unparseable time: {value}"
    )))
}
