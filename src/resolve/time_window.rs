//! Time window extraction from locators and raw utterances.
//!
//! Turns an utterance or structured locator into candidate time intervals
//! for retrieval. Never fails: when no cue produces a window, a default
//! window of `[today - N days, today + N days)` is used and flagged, which
//! widens retrieval and shifts semantic weighting downstream.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, Utc, Weekday};
use regex::Regex;
use tracing::debug;

use crate::model::{Locators, TimeWindow};

/// A named part of day mapped to a fixed hour range.
#[derive(Debug, Clone)]
struct PeriodRule {
    names: Vec<&'static str>,
    start_hour: u32,
    end_hour: u32,
}

/// The windows produced for one resolution request.
#[derive(Debug, Clone)]
pub struct WindowExtraction {
    /// Ordered candidate intervals; never empty.
    pub windows: Vec<TimeWindow>,
    /// True when the default fallback window was used.
    pub used_fallback: bool,
}

impl WindowExtraction {
    /// Center of the window nearest to the given instant, used for
    /// time-proximity scoring.
    pub fn nearest_center(&self, to: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.windows
            .iter()
            .map(|w| w.center())
            .min_by_key(|c| (*c - to).num_seconds().abs())
    }
}

/// Extracts candidate time intervals from locators or utterance text.
pub struct TimeWindowExtractor {
    reference: DateTime<Utc>,
    fallback_days: i64,
    periods: Vec<PeriodRule>,
    iso_date: Regex,
    slash_date: Regex,
    month_day: Regex,
    weekday: Regex,
    relative_day: Regex,
    hh_mm: Regex,
    am_pm: Regex,
    iso_fragment: Regex,
}

impl Default for TimeWindowExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeWindowExtractor {
    /// Create an extractor anchored to the current instant.
    pub fn new() -> Self {
        Self::with_reference(Utc::now())
    }

    /// Create an extractor anchored to a specific instant.
    pub fn with_reference(reference: DateTime<Utc>) -> Self {
        Self {
            reference,
            fallback_days: 3,
            periods: default_periods(),
            iso_date: Regex::new(r"\b(\d{4})-(\d{2})-(\d{2})\b").unwrap(),
            slash_date: Regex::new(r"\b(\d{1,2})/(\d{1,2})(?:/(\d{2,4}))?\b").unwrap(),
            month_day: Regex::new(
                r"(?i)\b(january|february|march|april|may|june|july|august|september|october|november|december|jan|feb|mar|apr|jun|jul|aug|sep|sept|oct|nov|dec)\.?\s+(\d{1,2})(?:st|nd|rd|th)?\b",
            )
            .unwrap(),
            weekday: Regex::new(
                r"(?i)\b(monday|tuesday|wednesday|thursday|friday|saturday|sunday)\b",
            )
            .unwrap(),
            relative_day: Regex::new(r"(?i)\b(today|tomorrow|yesterday)\b").unwrap(),
            hh_mm: Regex::new(r"\b\d{1,2}:\d{2}\b").unwrap(),
            am_pm: Regex::new(r"(?i)\b\d{1,2}\s*(?:am|pm)\b").unwrap(),
            iso_fragment: Regex::new(r"\b\d{4}-\d{2}-\d{2}T\d{2}").unwrap(),
        }
    }

    /// Set the fallback window half-width in days.
    pub fn with_fallback_days(mut self, days: i64) -> Self {
        self.fallback_days = days;
        self
    }

    /// True when the utterance carries any explicit time cue: a period
    /// word, a pattern-detected date, a weekday or relative-day word, an
    /// ISO-time fragment, an am/pm time, or an HH:MM-shaped substring.
    pub fn has_explicit_time_hint(&self, utterance: &str) -> bool {
        let lower = utterance.to_lowercase();
        self.periods
            .iter()
            .any(|p| p.names.iter().any(|n| phrase_match(&lower, n)))
            || self.iso_date.is_match(utterance)
            || self.slash_date.is_match(utterance)
            || self.month_day.is_match(utterance)
            || self.weekday.is_match(utterance)
            || self.relative_day.is_match(utterance)
            || self.iso_fragment.is_match(utterance)
            || self.hh_mm.is_match(utterance)
            || self.am_pm.is_match(utterance)
    }

    /// Produce the candidate windows for a request.
    ///
    /// Precedence: valid explicit window, then precise instant, then
    /// utterance parsing, then the fallback window. An explicit window with
    /// `end <= start` is rejected and the next rule applies.
    pub fn extract(&self, locators: Option<&Locators>, utterance: &str) -> WindowExtraction {
        if let Some(loc) = locators {
            if let Some(window) = loc.time_window {
                if window.is_valid() {
                    return WindowExtraction {
                        windows: vec![window],
                        used_fallback: false,
                    };
                }
                debug!(start = %window.start, end = %window.end, "rejecting inverted time window");
            }

            if let Some(instant) = loc.time_iso {
                return WindowExtraction {
                    windows: vec![TimeWindow::new(instant, instant + Duration::minutes(60))],
                    used_fallback: false,
                };
            }
        }

        let phrase = locators.and_then(|l| l.time_phrase.as_deref());
        let text = match phrase {
            Some(p) => format!("{utterance} {p}"),
            None => utterance.to_string(),
        };

        let windows = self.parse_text(&text);
        if !windows.is_empty() {
            return WindowExtraction {
                windows,
                used_fallback: false,
            };
        }

        let day = self.reference_day_start();
        let fallback = TimeWindow::new(
            day - Duration::days(self.fallback_days),
            day + Duration::days(self.fallback_days),
        );
        debug!(start = %fallback.start, end = %fallback.end, "no time cue, using fallback window");
        WindowExtraction {
            windows: vec![fallback],
            used_fallback: true,
        }
    }

    /// Parse dates and period words out of free text.
    fn parse_text(&self, text: &str) -> Vec<TimeWindow> {
        let lower = text.to_lowercase();
        let dates = self.detect_dates(text, &lower);

        let matched_periods: Vec<&PeriodRule> = self
            .periods
            .iter()
            .filter(|p| p.names.iter().any(|n| phrase_match(&lower, n)))
            .collect();

        if !matched_periods.is_empty() {
            // Periods anchor to the detected date, or to the reference day.
            let anchor = dates.first().copied().unwrap_or(self.reference_date());
            return matched_periods
                .iter()
                .map(|p| self.period_window(anchor, p))
                .collect();
        }

        dates.into_iter().map(|d| full_day_window(d)).collect()
    }

    /// Detect absolute and relative dates, in order of appearance priority:
    /// explicit forms first, then relative-day words, then weekday names.
    fn detect_dates(&self, text: &str, lower: &str) -> Vec<NaiveDate> {
        let mut dates = Vec::new();

        for caps in self.iso_date.captures_iter(text) {
            let (y, m, d) = (
                caps[1].parse::<i32>().unwrap_or(0),
                caps[2].parse::<u32>().unwrap_or(0),
                caps[3].parse::<u32>().unwrap_or(0),
            );
            if let Some(date) = NaiveDate::from_ymd_opt(y, m, d) {
                push_unique(&mut dates, date);
            }
        }

        for caps in self.slash_date.captures_iter(text) {
            let m = caps[1].parse::<u32>().unwrap_or(0);
            let d = caps[2].parse::<u32>().unwrap_or(0);
            let year = match caps.get(3) {
                Some(y) => {
                    let y = y.as_str().parse::<i32>().unwrap_or(0);
                    if y < 100 {
                        y + 2000
                    } else {
                        y
                    }
                }
                None => self.reference_date().year(),
            };
            if let Some(date) = NaiveDate::from_ymd_opt(year, m, d) {
                push_unique(&mut dates, date);
            }
        }

        for caps in self.month_day.captures_iter(text) {
            let month = month_number(&caps[1]);
            let day = caps[2].parse::<u32>().unwrap_or(0);
            if let Some(date) = NaiveDate::from_ymd_opt(self.reference_date().year(), month, day) {
                push_unique(&mut dates, date);
            }
        }

        for caps in self.relative_day.captures_iter(lower) {
            let offset = match &caps[1] {
                "tomorrow" => 1,
                "yesterday" => -1,
                _ => 0,
            };
            push_unique(&mut dates, self.reference_date() + Duration::days(offset));
        }

        for caps in self.weekday.captures_iter(lower) {
            if let Some(weekday) = parse_weekday(&caps[1]) {
                push_unique(&mut dates, self.next_weekday(weekday));
            }
        }

        dates
    }

    /// Period hour range anchored to a date. An end hour at or below the
    /// start hour spans past midnight with at least a one-hour duration.
    fn period_window(&self, anchor: NaiveDate, period: &PeriodRule) -> TimeWindow {
        let start = day_at_hour(anchor, period.start_hour);
        let end = if period.end_hour <= period.start_hour {
            let past_midnight = day_at_hour(anchor + Duration::days(1), period.end_hour);
            past_midnight.max(start + Duration::hours(1))
        } else {
            day_at_hour(anchor, period.end_hour)
        };
        TimeWindow::new(start, end)
    }

    /// Next occurrence of a weekday on or after the reference date.
    fn next_weekday(&self, weekday: Weekday) -> NaiveDate {
        let today = self.reference_date();
        let ahead = (weekday.num_days_from_monday() + 7 - today.weekday().num_days_from_monday())
            % 7;
        today + Duration::days(i64::from(ahead))
    }

    fn reference_date(&self) -> NaiveDate {
        self.reference.date_naive()
    }

    fn reference_day_start(&self) -> DateTime<Utc> {
        day_at_hour(self.reference_date(), 0)
    }
}

fn default_periods() -> Vec<PeriodRule> {
    vec![
        PeriodRule {
            names: vec!["dawn"],
            start_hour: 4,
            end_hour: 7,
        },
        PeriodRule {
            names: vec!["morning"],
            start_hour: 6,
            end_hour: 11,
        },
        PeriodRule {
            names: vec!["noon", "midday"],
            start_hour: 11,
            end_hour: 13,
        },
        PeriodRule {
            names: vec!["afternoon"],
            start_hour: 13,
            end_hour: 18,
        },
        PeriodRule {
            names: vec!["evening", "tonight"],
            start_hour: 18,
            end_hour: 22,
        },
        PeriodRule {
            names: vec!["late night"],
            start_hour: 22,
            end_hour: 2,
        },
    ]
}

/// Word-boundary phrase match in lowercased text.
fn phrase_match(lower: &str, phrase: &str) -> bool {
    let mut from = 0;
    while let Some(pos) = lower[from..].find(phrase) {
        let start = from + pos;
        let end = start + phrase.len();
        let before_ok = start == 0
            || !lower[..start]
                .chars()
                .next_back()
                .is_some_and(|c| c.is_alphanumeric());
        let after_ok = end == lower.len()
            || !lower[end..].chars().next().is_some_and(|c| c.is_alphanumeric());
        if before_ok && after_ok {
            return true;
        }
        from = end;
    }
    false
}

fn day_at_hour(date: NaiveDate, hour: u32) -> DateTime<Utc> {
    let ndt: NaiveDateTime = date.and_hms_opt(hour, 0, 0).unwrap_or_else(|| {
        // Hour out of range only happens with misconfigured period tables.
        date.and_hms_opt(0, 0, 0).unwrap()
    });
    DateTime::from_naive_utc_and_offset(ndt, Utc)
}

fn full_day_window(date: NaiveDate) -> TimeWindow {
    TimeWindow::new(day_at_hour(date, 0), day_at_hour(date + Duration::days(1), 0))
}

fn push_unique(dates: &mut Vec<NaiveDate>, date: NaiveDate) {
    if !dates.contains(&date) {
        dates.push(date);
    }
}

fn month_number(name: &str) -> u32 {
    match name.to_lowercase().as_str() {
        "january" | "jan" => 1,
        "february" | "feb" => 2,
        "march" | "mar" => 3,
        "april" | "apr" => 4,
        "may" => 5,
        "june" | "jun" => 6,
        "july" | "jul" => 7,
        "august" | "aug" => 8,
        "september" | "sep" | "sept" => 9,
        "october" | "oct" => 10,
        "november" | "nov" => 11,
        "december" | "dec" => 12,
        _ => 0,
    }
}

fn parse_weekday(name: &str) -> Option<Weekday> {
    match name {
        "monday" => Some(Weekday::Mon),
        "tuesday" => Some(Weekday::Tue),
        "wednesday" => Some(Weekday::Wed),
        "thursday" => Some(Weekday::Thu),
        "friday" => Some(Weekday::Fri),
        "saturday" => Some(Weekday::Sat),
        "sunday" => Some(Weekday::Sun),
        _ => None,
    }
}
