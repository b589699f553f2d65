//! Core result types shared by every analysis path.
//!
//! ## Overview
//!
//! - **[`DqResult`]**: the normalized output of one analysis
//! - **[`Issue`]**: a single finding with a [`Severity`]
//! - **[`IssueCollector`]** / [`dq_score`]: shared thresholding and scoring
//! - **[`DqConfig`]**: thresholds, with calibrated defaults
//! - **[`Clock`]**: injectable "now" for time-sensitive checks
//!
//! ```text
//! LocalAnalyzer ───┐
//!                  ├── IssueCollector ──► DqResult { issues, dq_score, ... }
//! PushdownParser ──┘
//! ```

pub mod clock;
pub mod config;
pub mod issue;
pub mod result;
pub mod scoring;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::DqConfig;
pub use issue::{Issue, IssueType, Severity, ALL_COLUMNS};
pub use result::{AnalysisError, AnalysisMethod, DqResult, NumericDistribution};
pub use scoring::{dq_score, null_ratio, IssueCollector, NullDetail};
