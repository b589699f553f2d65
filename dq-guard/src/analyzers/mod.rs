//! Local (in-memory) analysis.
//!
//! [`LocalAnalyzer`] materializes nothing beyond what the [`Dataset`](crate::dataset::Dataset)
//! already holds and runs each check column by column:
//!
//! - null ratios per column
//! - exact duplicate rows ([`duplicates`])
//! - descriptive statistics for numeric columns ([`statistics`])
//! - values after "now" in temporal columns ([`temporal`])
//!
//! Findings go through the shared [`IssueCollector`](crate::core::IssueCollector),
//! so the local and push-down paths report identical issue shapes.

pub mod duplicates;
pub mod local;
pub mod statistics;
pub mod temporal;

pub use duplicates::count_duplicate_rows;
pub use local::LocalAnalyzer;
pub use statistics::{describe_column, percentile, summarize, Summary};
pub use temporal::has_future_values;
