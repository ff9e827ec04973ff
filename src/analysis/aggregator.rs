//! Per-category aggregation.
//!
//! Every function here is a pure function of its input slice: no caching,
//! no shared state, and identical input always yields identical output.

use super::policy::{matches_highlight, month_bucket, resolve_classification, MonthBucket};
use crate::models::{
    CategoryBundle, ClassificationCounts, Dashboard, HighlightSummary, MonthlyCount, Record,
};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, trace};

/// Distinct categories in ascending byte order.
pub fn categories(records: &[Record]) -> Vec<String> {
    records
        .iter()
        .map(|r| r.category.as_str())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(String::from)
        .collect()
}

fn in_category<'a>(records: &'a [Record], category: &'a str) -> impl Iterator<Item = &'a Record> {
    records.iter().filter(move |r| r.category == category)
}

/// Count records of `category` by resolved classification label.
pub fn classification_counts(records: &[Record], category: &str) -> ClassificationCounts {
    let mut counts = ClassificationCounts::new();

    for record in in_category(records, category) {
        *counts
            .entry(resolve_classification(record).to_string())
            .or_default() += 1;
    }

    counts
}

/// Count records of `category` per calendar month, oldest month first.
///
/// Records without a parseable timestamp are left out. Only months that
/// actually occur are emitted.
pub fn monthly_counts(records: &[Record], category: &str) -> Vec<MonthlyCount> {
    let mut buckets: BTreeMap<MonthBucket, usize> = BTreeMap::new();

    for record in in_category(records, category) {
        match month_bucket(record) {
            Some(bucket) => *buckets.entry(bucket).or_default() += 1,
            None => trace!(
                "Excluding record from monthly counts for {}: timestamp {:?}",
                category,
                record.timestamp
            ),
        }
    }

    buckets
        .into_iter()
        .map(|(bucket, count)| MonthlyCount {
            month: bucket.label(),
            count,
        })
        .collect()
}

/// Rounded percentage of `part` in `whole`, half away from zero. 0 for an empty whole.
pub fn percentage(part: usize, whole: usize) -> u32 {
    if whole == 0 {
        return 0;
    }
    let part = part.min(whole) as u128;
    let whole = whole as u128;
    // round(part * 100 / whole) in integer arithmetic
    ((part * 200 + whole) / (2 * whole)) as u32
}

/// Share of `category` records whose classification is `highlight`.
pub fn highlight_summary(records: &[Record], category: &str, highlight: &str) -> HighlightSummary {
    let (total, matched) = in_category(records, category).fold((0, 0), |(total, matched), r| {
        (total + 1, matched + usize::from(matches_highlight(r, highlight)))
    });

    HighlightSummary {
        total,
        matched,
        percentage: percentage(matched, total),
    }
}

/// Build the chart-ready bundle for one category.
pub fn category_bundle(records: &[Record], category: &str, highlight: &str) -> CategoryBundle {
    CategoryBundle {
        category: category.to_string(),
        classification: classification_counts(records, category),
        monthly: monthly_counts(records, category),
        summary: highlight_summary(records, category, highlight),
    }
}

/// Aggregate every category in `records`.
pub fn build_dashboard(records: &[Record], highlight: &str) -> Dashboard {
    let categories: BTreeMap<String, CategoryBundle> = categories(records)
        .into_iter()
        .map(|category| {
            let bundle = category_bundle(records, &category, highlight);
            debug!(
                "Category {}: {} records, {} labels, {} months, {}% {}",
                category,
                bundle.summary.total,
                bundle.classification.len(),
                bundle.monthly.len(),
                bundle.summary.percentage,
                highlight
            );
            (category, bundle)
        })
        .collect();

    Dashboard {
        highlight: highlight.to_string(),
        total_records: records.len(),
        categories,
    }
}
