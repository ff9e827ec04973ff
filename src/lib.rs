//! lobdash - Line-of-business dashboard aggregation.
//!
//! The [`analysis`] module is the engine: pure functions that turn a flat
//! list of [`models::Record`]s into per-category chart series and highlight
//! metrics. The remaining modules load records, read configuration, and
//! render reports for the `lobdash` binary.

pub mod analysis;
pub mod cli;
pub mod config;
pub mod ingest;
pub mod models;
pub mod report;

pub use analysis::build_dashboard;
pub use models::{CategoryBundle, Dashboard, HighlightSummary, MonthlyCount, Record};
