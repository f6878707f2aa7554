//! Structured intent supplied by the upstream resolver/model.
//!
//! The upstream language model emits `{action, locators, changes?, missing?}`
//! as JSON. Locator fields are decoded leniently: a malformed field decodes
//! to "absent" rather than failing the whole intent, so the engine can fall
//! back to the utterance-only path.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::Result;

/// Action requested against an existing entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum IntentAction {
    /// Modify fields of the chosen entry.
    Update,
    /// Remove the chosen entry (or one occurrence of it).
    Delete,
}

/// An explicit time interval supplied as a locator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    /// Inclusive start of the interval.
    pub start: DateTime<Utc>,
    /// Exclusive end of the interval.
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    /// Create a window. No validation; see [`TimeWindow::is_valid`].
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// A window is usable only when the end is strictly after the start.
    pub fn is_valid(&self) -> bool {
        self.end > self.start
    }

    /// Midpoint of the interval.
    pub fn center(&self) -> DateTime<Utc> {
        self.start + (self.end - self.start) / 2
    }
}

/// How much of a recurring series the user means.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopeHint {
    /// One concrete occurrence.
    Single,
    /// The whole series.
    Series,
    /// This and following occurrences.
    Following,
    /// No scope stated.
    #[default]
    Unspecified,
}

/// Structured hints describing which entry is meant.
///
/// Every field is optional; absence is meaningful and triggers fallback
/// behavior in the extractor and scorer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Locators {
    /// Free-text time phrase (e.g. "tomorrow afternoon", "all day Friday").
    #[serde(deserialize_with = "lenient_opt")]
    pub time_phrase: Option<String>,
    /// Precise instant, when the model could pin one down.
    #[serde(deserialize_with = "lenient_opt")]
    pub time_iso: Option<DateTime<Utc>>,
    /// Explicit interval.
    #[serde(deserialize_with = "lenient_opt")]
    pub time_window: Option<TimeWindow>,
    /// Tokens that must appear in the entry title or notes.
    #[serde(deserialize_with = "lenient_vec")]
    pub title_hints: Vec<String>,
    /// Attendee names mentioned by the user.
    #[serde(deserialize_with = "lenient_vec")]
    pub attendee_names: Vec<String>,
    /// Location fragment mentioned by the user.
    #[serde(deserialize_with = "lenient_opt")]
    pub location_hint: Option<String>,
    /// Recurrence scope the user implied.
    #[serde(deserialize_with = "lenient_scope")]
    pub scope_hint: ScopeHint,
}

impl Locators {
    /// True when no hint of any kind is present.
    pub fn is_empty(&self) -> bool {
        self.time_phrase.is_none()
            && self.time_iso.is_none()
            && self.time_window.is_none()
            && self.title_hints.is_empty()
            && self.attendee_names.is_empty()
            && self.location_hint.is_none()
            && self.scope_hint == ScopeHint::Unspecified
    }
}

/// Field deltas to apply on UPDATE.
///
/// Time fields arrive as strings from the upstream model and are parsed at
/// apply time; an unparseable string is an `InvalidInput` mutation failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Changes {
    #[serde(deserialize_with = "lenient_opt")]
    pub title: Option<String>,
    #[serde(deserialize_with = "lenient_opt")]
    pub start: Option<String>,
    #[serde(deserialize_with = "lenient_opt")]
    pub end: Option<String>,
    #[serde(deserialize_with = "lenient_opt")]
    pub location: Option<String>,
    #[serde(deserialize_with = "lenient_opt")]
    pub notes: Option<String>,
}

impl Changes {
    /// True when no delta is present.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.start.is_none()
            && self.end.is_none()
            && self.location.is_none()
            && self.notes.is_none()
    }
}

/// A structured intent from the upstream resolver/model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventIntent {
    /// What to do with the resolved entry.
    pub action: IntentAction,
    /// Hints for locating the entry.
    #[serde(default)]
    pub locators: Locators,
    /// Deltas for UPDATE.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub changes: Option<Changes>,
    /// Fields the model flagged as missing from the utterance.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub missing: Vec<String>,
}

impl EventIntent {
    /// Decode an intent from JSON emitted by the upstream model.
    ///
    /// Only the `action` tag is strict; every locator and change field
    /// degrades to absent when malformed.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

// Lenient deserialization helpers: capture the raw value, then try the
// target type, mapping failure to the field's default instead of an error.

fn lenient_opt<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

fn lenient_vec<'de, D, T>(deserializer: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

fn lenient_scope<'de, D>(deserializer: D) -> std::result::Result<ScopeHint, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}
