//! Calendar entry type as read from the external event store.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// A concrete calendar entry owned by the external event store.
///
/// The engine reads and writes entries through the [`EventStore`](crate::store::EventStore)
/// trait and never owns their persistence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarEntry {
    /// Unique identifier. Recurring series share one identifier across
    /// occurrences; an occurrence is distinguished by its start time.
    pub id: String,
    /// Entry title.
    pub title: String,
    /// Start time.
    pub start: DateTime<Utc>,
    /// End time.
    pub end: DateTime<Utc>,
    /// Whether this is an all-day entry.
    #[serde(default)]
    pub all_day: bool,
    /// Location, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Free-form notes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Name of the calendar the entry belongs to.
    #[serde(default)]
    pub calendar: String,
    /// Attendee display names (organizer included).
    #[serde(default)]
    pub attendees: Vec<String>,
}

impl CalendarEntry {
    /// Create a new entry with a random identifier.
    pub fn new(title: impl Into<String>, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self::with_id(uuid::Uuid::new_v4().to_string(), title, start, end)
    }

    /// Create an entry with a specific identifier.
    pub fn with_id(
        id: impl Into<String>,
        title: impl Into<String>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            start,
            end,
            all_day: false,
            location: None,
            notes: None,
            calendar: String::new(),
            attendees: Vec::new(),
        }
    }

    /// Set the location.
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Set the notes.
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Set the calendar name.
    pub fn in_calendar(mut self, calendar: impl Into<String>) -> Self {
        self.calendar = calendar.into();
        self
    }

    /// Add an attendee.
    pub fn with_attendee(mut self, attendee: impl Into<String>) -> Self {
        self.attendees.push(attendee.into());
        self
    }

    /// Mark as all-day.
    pub fn all_day_entry(mut self) -> Self {
        self.all_day = true;
        self
    }

    /// Duration of the entry.
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Check whether the entry overlaps the half-open interval `[start, end)`.
    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        self.start < end && self.end > start
    }
}
