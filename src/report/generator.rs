//! Markdown and JSON report generation.
//!
//! This module renders a dashboard report as a Markdown document or as
//! pretty-printed JSON.

use crate::analysis::percentage;
use crate::config::ReportConfig;
use crate::models::{CategoryBundle, Dashboard, MonthlyCount, Report, ReportMetadata};
use anyhow::Result;

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &Report, settings: &ReportConfig) -> String {
    let mut output = String::new();

    // Title
    output.push_str("# Line of Business Dashboard\n\n");

    output.push_str(&generate_metadata_section(&report.metadata));
    output.push_str(&generate_table_of_contents(&report.dashboard));
    output.push_str(&generate_overview_section(&report.dashboard));
    output.push_str(&generate_categories_section(&report.dashboard, settings));
    output.push_str(&generate_footer());

    output
}

/// Anchor for a category heading.
fn anchor(category: &str) -> String {
    let slug: String = category
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '_' {
                c
            } else {
                '-'
            }
        })
        .collect();
    format!("category-{}", slug.to_lowercase())
}

/// Make a value safe inside a table cell or heading: `|` is escaped and
/// line breaks collapse to spaces.
fn escape_cell(value: &str) -> String {
    value
        .replace("\r\n", " ")
        .replace(['\n', '\r'], " ")
        .replace('|', "\\|")
}

/// Make a value safe as link text.
fn escape_link_text(value: &str) -> String {
    escape_cell(value).replace('[', "\\[").replace(']', "\\]")
}

/// Generate the metadata section.
fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Source:** `{}`\n", metadata.source));
    section.push_str(&format!(
        "- **Generated:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!("- **Files Read:** {}\n", metadata.files_read));
    section.push_str(&format!(
        "- **Records Loaded:** {}\n",
        metadata.records_loaded
    ));
    if metadata.records_skipped > 0 {
        section.push_str(&format!(
            "- **Records Skipped:** {}\n",
            metadata.records_skipped
        ));
    }
    section.push_str(&format!("- **Highlight:** `{}`\n", metadata.highlight));
    section.push_str(&format!("- **Categories:** {}\n", metadata.category_count));
    section.push_str(&format!(
        "- **Duration:** {:.3}s\n",
        metadata.duration_seconds
    ));
    section.push('\n');

    section
}

/// Generate the table of contents.
fn generate_table_of_contents(dashboard: &Dashboard) -> String {
    let mut toc = String::new();

    toc.push_str("## Table of Contents\n\n");
    toc.push_str("- [Metadata](#metadata)\n");
    toc.push_str("- [Overview](#overview)\n");
    toc.push_str("- [Categories](#categories)\n");

    for name in dashboard.category_names() {
        toc.push_str(&format!("  - [{}](#{})\n", escape_link_text(name), anchor(name)));
    }

    toc.push('\n');

    toc
}

/// Generate the overview table: one KPI row per category.
fn generate_overview_section(dashboard: &Dashboard) -> String {
    let mut section = String::new();

    section.push_str("## Overview\n\n");

    if dashboard.categories.is_empty() {
        section.push_str("No records to report.\n\n");
        return section;
    }

    let highlight = escape_cell(&dashboard.highlight);
    section.push_str(&format!("| Category | Total | {} | {} % |\n", highlight, highlight));
    section.push_str("|:---|:---:|:---:|:---:|\n");

    for bundle in dashboard.categories.values() {
        section.push_str(&format!(
            "| {} | {} | {} | {}% |\n",
            escape_cell(&bundle.category),
            bundle.summary.total,
            bundle.summary.matched,
            bundle.summary.percentage
        ));
    }
    section.push('\n');

    section
}

/// Generate the per-category sections.
fn generate_categories_section(dashboard: &Dashboard, settings: &ReportConfig) -> String {
    let mut section = String::new();

    section.push_str("## Categories\n\n");

    for bundle in dashboard.categories.values() {
        section.push_str(&generate_category_block(bundle, &dashboard.highlight, settings));
    }

    section
}

/// Generate the block for a single category.
fn generate_category_block(
    bundle: &CategoryBundle,
    highlight: &str,
    settings: &ReportConfig,
) -> String {
    let mut block = String::new();

    block.push_str(&format!(
        "### {} {{#{}}}\n\n",
        escape_cell(&bundle.category),
        anchor(&bundle.category)
    ));
    block.push_str(&format!(
        "*Records: {} | {}: {} ({}%)*\n\n",
        bundle.summary.total,
        escape_cell(highlight),
        bundle.summary.matched,
        bundle.summary.percentage
    ));

    if settings.include_classification {
        block.push_str(&format!(
            "#### {}\n\n",
            escape_cell(&settings.classification_title_for(&bundle.category))
        ));
        block.push_str(&generate_classification_table(bundle));
    }

    if settings.include_monthly {
        block.push_str(&format!(
            "#### {}\n\n",
            escape_cell(&settings.monthly_title_for(&bundle.category))
        ));
        block.push_str(&generate_monthly_table(&bundle.monthly));
    }

    block.push_str("---\n\n");

    block
}

/// Classification distribution, largest share first.
fn generate_classification_table(bundle: &CategoryBundle) -> String {
    if bundle.classification.is_empty() {
        return "_No records._\n\n".to_string();
    }

    let mut table = String::new();
    table.push_str("| Type | Count | Share |\n");
    table.push_str("|:---|:---:|:---:|\n");

    let mut rows: Vec<_> = bundle.classification.iter().collect();
    rows.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));

    for (label, count) in rows {
        table.push_str(&format!(
            "| {} | {} | {}% |\n",
            escape_cell(label),
            count,
            percentage(*count, bundle.summary.total)
        ));
    }
    table.push('\n');

    table
}

/// Monthly counts in chronological order.
fn generate_monthly_table(monthly: &[MonthlyCount]) -> String {
    if monthly.is_empty() {
        return "_No dated records._\n\n".to_string();
    }

    let mut table = String::new();
    table.push_str("| Month | Items Created |\n");
    table.push_str("|:---|:---:|\n");

    for entry in monthly {
        table.push_str(&format!("| {} | {} |\n", entry.month, entry.count));
    }
    table.push('\n');

    table
}

/// Generate the report footer.
fn generate_footer() -> String {
    format!(
        "---\n\n*Report generated by lobdash v{}*\n",
        env!("CARGO_PKG_VERSION")
    )
}

/// Generate a JSON report.
pub fn generate_json_report(report: &Report) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::build_dashboard;
    use crate::models::Record;
    use chrono::Utc;

    fn create_test_report() -> Report {
        let records = vec![
            Record::new("Retail")
                .with_classification("FCVM")
                .with_timestamp("2024-02-03"),
            Record::new("Retail")
                .with_classification("VM")
                .with_timestamp("2024-01-09"),
            Record::new("Retail").with_classification("FCVM"),
            Record::new("Asset Mgmt"),
        ];
        let dashboard = build_dashboard(&records, "FCVM");

        let metadata = ReportMetadata {
            source: "records.json".to_string(),
            generated_at: Utc::now(),
            records_loaded: records.len(),
            records_skipped: 1,
            files_read: 1,
            highlight: "FCVM".to_string(),
            category_count: dashboard.categories.len(),
            duration_seconds: 0.01,
        };

        Report {
            metadata,
            dashboard,
        }
    }

    #[test]
    fn test_generate_markdown_report() {
        let report = create_test_report();
        let markdown = generate_markdown_report(&report, &ReportConfig::default());

        assert!(markdown.contains("# Line of Business Dashboard"));
        assert!(markdown.contains("## Metadata"));
        assert!(markdown.contains("## Overview"));
        assert!(markdown.contains("| Retail | 3 | 2 | 67% |"));
        assert!(markdown.contains("#### Retail - Infrastructure Types Distribution"));
        assert!(markdown.contains("#### Retail - Items Created Per Month"));
        assert!(markdown.contains("[Asset Mgmt](#category-asset-mgmt)"));
        assert!(markdown.contains("Records Skipped:"));
    }

    #[test]
    fn test_monthly_table_order() {
        let report = create_test_report();
        let markdown = generate_markdown_report(&report, &ReportConfig::default());

        let jan = markdown.find("| Jan 2024 | 1 |").unwrap();
        let feb = markdown.find("| Feb 2024 | 1 |").unwrap();
        assert!(jan < feb);
        assert!(markdown.contains("_No dated records._"));
    }

    #[test]
    fn test_classification_table_sorted_by_count() {
        let report = create_test_report();
        let table = generate_classification_table(&report.dashboard.categories["Retail"]);

        let fcvm = table.find("| FCVM | 2 | 67% |").unwrap();
        let vm = table.find("| VM | 1 | 33% |").unwrap();
        assert!(fcvm < vm);
    }

    #[test]
    fn test_sections_can_be_disabled() {
        let report = create_test_report();
        let settings = ReportConfig {
            include_monthly: false,
            ..ReportConfig::default()
        };
        let markdown = generate_markdown_report(&report, &settings);

        assert!(!markdown.contains("Items Created Per Month"));
        assert!(markdown.contains("Infrastructure Types Distribution"));
    }

    fn column_count(row: &str) -> usize {
        // Cells are separated by unescaped pipes; a row has one more pipe than cells.
        let bytes = row.as_bytes();
        let pipes = (0..bytes.len())
            .filter(|&i| bytes[i] == b'|' && (i == 0 || bytes[i - 1] != b'\\'))
            .count();
        pipes - 1
    }

    #[test]
    fn test_escape_cell() {
        assert_eq!(escape_cell("plain"), "plain");
        assert_eq!(escape_cell("FC|VM"), "FC\\|VM");
        assert_eq!(escape_cell("two\nlines\r\nhere"), "two lines here");
        assert_eq!(escape_link_text("a[b]|c"), "a\\[b\\]\\|c");
    }

    #[test]
    fn test_pipes_in_values_keep_table_shape() {
        let records = vec![Record::new("Retail|EU").with_classification("FC|VM")];
        let mut report = create_test_report();
        report.dashboard = build_dashboard(&records, "VM");

        let markdown = generate_markdown_report(&report, &ReportConfig::default());

        let overview_row = markdown
            .lines()
            .find(|line| line.starts_with("| Retail"))
            .unwrap();
        assert_eq!(overview_row, "| Retail\\|EU | 1 | 0 | 0% |");
        assert_eq!(column_count(overview_row), 4);

        let type_row = markdown
            .lines()
            .find(|line| line.starts_with("| FC"))
            .unwrap();
        assert_eq!(type_row, "| FC\\|VM | 1 | 100% |");
        assert_eq!(column_count(type_row), 3);

        assert!(markdown.contains("  - [Retail\\|EU](#category-retail-eu)"));
        assert!(markdown.contains("### Retail\\|EU {#category-retail-eu}"));
    }

    #[test]
    fn test_empty_dashboard() {
        let mut report = create_test_report();
        report.dashboard = build_dashboard(&[], "FCVM");

        let markdown = generate_markdown_report(&report, &ReportConfig::default());
        assert!(markdown.contains("No records to report."));
    }

    #[test]
    fn test_generate_json_report() {
        let report = create_test_report();
        let json = generate_json_report(&report).unwrap();

        assert!(json.contains("\"metadata\""));
        assert!(json.contains("\"dashboard\""));
        assert!(json.contains("\"monthly\""));
        assert!(json.contains("\"Jan 2024\""));

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(
            value["dashboard"]["categories"]["Retail"]["summary"]["percentage"],
            67
        );
    }
}
