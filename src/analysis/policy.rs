//! Business rules applied while aggregating records.
//!
//! The sentinel substitution for missing classifications and the silent
//! exclusion of unparseable timestamps live here so the aggregator never
//! inlines them.

use crate::models::{RawTimestamp, Record};
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Utc};

/// Label substituted for a missing or empty classification.
pub const UNKNOWN_LABEL: &str = "Unknown";

/// `strftime` pattern for month bucket labels (`Jan 2024`).
///
/// chrono always renders `%b` in English, which pins the labels to one locale.
pub const MONTH_LABEL_FORMAT: &str = "%b %Y";

/// Naive date-time layouts accepted in addition to RFC 3339. Interpreted as UTC.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Date-only layouts.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];

/// Years that render as exactly four digits in a bucket label.
const LABEL_YEARS: std::ops::RangeInclusive<i32> = 0..=9999;

/// Resolve the label a record contributes to its classification table.
pub fn resolve_classification(record: &Record) -> &str {
    match record.classification.as_deref() {
        Some(label) if !label.is_empty() => label,
        _ => UNKNOWN_LABEL,
    }
}

/// Whether a record counts toward the highlight summary for `value`.
///
/// The raw field is compared exactly, except when `value` is the sentinel:
/// then any record that resolves to the sentinel matches.
pub fn matches_highlight(record: &Record, value: &str) -> bool {
    if value == UNKNOWN_LABEL {
        resolve_classification(record) == UNKNOWN_LABEL
    } else {
        record.classification.as_deref() == Some(value)
    }
}

/// Parse a raw timestamp into a UTC instant.
///
/// Returns `None` for anything unparseable or outside years 0000-9999;
/// callers drop such records from temporal aggregation instead of failing.
pub fn parse_timestamp(raw: &RawTimestamp) -> Option<DateTime<Utc>> {
    let instant = match raw {
        RawTimestamp::EpochMillis(ms) => DateTime::from_timestamp_millis(*ms),
        RawTimestamp::Text(text) => parse_timestamp_text(text.trim()),
    }?;

    LABEL_YEARS.contains(&instant.year()).then_some(instant)
}

fn parse_timestamp_text(text: &str) -> Option<DateTime<Utc>> {
    if text.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Some(naive.and_utc());
        }
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
        }
    }
    // Year-month only, e.g. `2024-01`.
    NaiveDate::parse_from_str(&format!("{}-01", text), "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// A calendar month. Orders chronologically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthBucket(NaiveDate);

impl MonthBucket {
    /// Bucket for the given year and month (1-12).
    pub fn new(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(Self)
    }

    /// Bucket containing the given instant.
    pub fn of(instant: &DateTime<Utc>) -> Self {
        // Day 1 exists in every month, so this cannot fail for a valid instant.
        Self(instant.date_naive().with_day(1).unwrap_or(instant.date_naive()))
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    pub fn month(&self) -> u32 {
        self.0.month()
    }

    /// Display label, e.g. `Jan 2024`.
    pub fn label(&self) -> String {
        self.0.format(MONTH_LABEL_FORMAT).to_string()
    }
}

/// Month bucket for a record, or `None` if it has no usable timestamp.
pub fn month_bucket(record: &Record) -> Option<MonthBucket> {
    record
        .timestamp
        .as_ref()
        .and_then(parse_timestamp)
        .map(|instant| MonthBucket::of(&instant))
}
