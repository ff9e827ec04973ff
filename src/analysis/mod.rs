//! Aggregation engine.
//!
//! `policy` holds the business rules (sentinel label, timestamp parsing,
//! month bucketing); `aggregator` applies them per category.

pub mod aggregator;
pub mod policy;

pub use aggregator::*;
