//! Data models for the dashboard engine.
//!
//! This module contains the core data structures used throughout
//! the application for representing records, per-category aggregates,
//! and reports.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A raw timestamp as it appeared in the source data.
///
/// Parsing is deferred to the aggregation policy so that a record with an
/// unparseable timestamp is still a valid record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawTimestamp {
    /// Date-like text, e.g. `2024-01-15` or `2024-01-15T10:30:00Z`.
    Text(String),
    /// Milliseconds since the Unix epoch.
    EpochMillis(i64),
}

impl fmt::Display for RawTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawTimestamp::Text(s) => write!(f, "{}", s),
            RawTimestamp::EpochMillis(ms) => write!(f, "{}ms", ms),
        }
    }
}

impl From<&str> for RawTimestamp {
    fn from(s: &str) -> Self {
        RawTimestamp::Text(s.to_string())
    }
}

/// A single business record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Grouping field (line of business).
    pub category: String,
    /// Secondary classification (infrastructure type).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classification: Option<String>,
    /// Creation time of the record.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<RawTimestamp>,
}

impl Record {
    /// Creates a record with only a category.
    pub fn new(category: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            classification: None,
            timestamp: None,
        }
    }

    /// Sets the classification.
    pub fn with_classification(mut self, classification: impl Into<String>) -> Self {
        self.classification = Some(classification.into());
        self
    }

    /// Sets the timestamp.
    pub fn with_timestamp(mut self, timestamp: impl Into<RawTimestamp>) -> Self {
        self.timestamp = Some(timestamp.into());
        self
    }
}

/// Classification label to record count. Missing labels mean zero.
pub type ClassificationCounts = BTreeMap<String, usize>;

/// Record count for one calendar month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyCount {
    /// Bucket label, e.g. `Jan 2024`.
    pub month: String,
    /// Number of records created in that month.
    pub count: usize,
}

/// Share of a category's records matching the highlighted classification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighlightSummary {
    /// Number of records in the category.
    pub total: usize,
    /// Number of those records matching the highlighted classification.
    pub matched: usize,
    /// `matched / total` as a rounded percentage, 0 when `total` is 0.
    pub percentage: u32,
}

/// All chart-ready aggregates for one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryBundle {
    pub category: String,
    /// Pie-chart series.
    pub classification: ClassificationCounts,
    /// Bar-chart series in chronological order.
    pub monthly: Vec<MonthlyCount>,
    /// KPI badge.
    pub summary: HighlightSummary,
}

/// Aggregates for every category in a record set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dashboard {
    /// Classification value the summaries were computed against.
    pub highlight: String,
    /// Number of records the dashboard was built from.
    pub total_records: usize,
    /// Bundles keyed by category name.
    pub categories: BTreeMap<String, CategoryBundle>,
}

impl Dashboard {
    /// Category names in ascending order.
    pub fn category_names(&self) -> Vec<&str> {
        self.categories.keys().map(String::as_str).collect()
    }

    /// Keeps only the named categories.
    pub fn retain_categories(&mut self, keep: &[String]) {
        self.categories.retain(|name, _| keep.contains(name));
    }

    /// Categories whose highlight percentage is below `threshold`.
    pub fn below_threshold(&self, threshold: u32) -> Vec<&CategoryBundle> {
        self.categories
            .values()
            .filter(|bundle| bundle.summary.percentage < threshold)
            .collect()
    }
}

/// Metadata about a generated report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// Path the records were loaded from.
    pub source: String,
    /// Date and time the report was generated.
    pub generated_at: DateTime<Utc>,
    /// Number of records loaded.
    pub records_loaded: usize,
    /// Number of source objects skipped during loading.
    pub records_skipped: usize,
    /// Number of files read.
    pub files_read: usize,
    /// Classification value of interest.
    pub highlight: String,
    /// Number of categories in the report.
    pub category_count: usize,
    /// Duration of loading and aggregation in seconds.
    pub duration_seconds: f64,
}

/// The complete dashboard report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub metadata: ReportMetadata,
    pub dashboard: Dashboard,
}
