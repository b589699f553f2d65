//! Issue construction and the aggregate health score.
//!
//! Both analysis paths funnel their raw metrics through [`IssueCollector`] so
//! that thresholds, severities and wording stay identical between them.

use super::config::DqConfig;
use super::issue::{Issue, IssueType, Severity, ALL_COLUMNS};

/// Computes the 0–100 health score for a number of issues.
///
/// ```rust
/// use dq_guard::core::dq_score;
///
/// assert_eq!(dq_score(0, 5), 100);
/// assert_eq!(dq_score(3, 5), 85);
/// assert_eq!(dq_score(40, 5), 0);
/// ```
pub fn dq_score(issue_count: usize, penalty: u32) -> u8 {
    let deduction = (issue_count as u64).saturating_mul(u64::from(penalty));
    // 100 - deduction is at most 100, so the narrowing is lossless.
    100u64.saturating_sub(deduction) as u8
}

/// Fraction of null values; zero for an empty dataset.
pub fn null_ratio(null_count: u64, row_count: u64) -> f64 {
    if row_count == 0 {
        0.0
    } else {
        null_count as f64 / row_count as f64
    }
}

/// How much detail the null-ratio message carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NullDetail {
    /// `"10.0% of values are null."`
    RatioOnly,
    /// `"10.0% of values are null (10 of 100 rows)."`
    WithCounts,
}

/// Accumulates issues in detection order.
#[derive(Debug)]
pub struct IssueCollector<'a> {
    config: &'a DqConfig,
    issues: Vec<Issue>,
}

impl<'a> IssueCollector<'a> {
    pub fn new(config: &'a DqConfig) -> Self {
        Self {
            config,
            issues: Vec::new(),
        }
    }

    /// Flags a column whose null ratio exceeds the configured threshold.
    ///
    /// Returns true when an issue was recorded.
    pub fn check_null_ratio(
        &mut self,
        column: &str,
        null_count: u64,
        row_count: u64,
        detail: NullDetail,
    ) -> bool {
        let ratio = null_ratio(null_count, row_count);
        if ratio <= self.config.null_ratio_threshold {
            return false;
        }

        let severity = if ratio > self.config.null_ratio_high_threshold {
            Severity::High
        } else {
            Severity::Medium
        };
        let percent = ratio * 100.0;
        let details = match detail {
            NullDetail::RatioOnly => format!("{percent:.1}% of values are null."),
            NullDetail::WithCounts => {
                format!("{percent:.1}% of values are null ({null_count} of {row_count} rows).")
            }
        };
        self.push(Issue::new(IssueType::HighNullRatio, column, severity, details));
        true
    }

    /// Records exact duplicate rows, if any.
    pub fn check_duplicates(&mut self, duplicates: u64) -> bool {
        if duplicates == 0 {
            return false;
        }
        self.push(Issue::new(
            IssueType::DuplicateRows,
            ALL_COLUMNS,
            Severity::High,
            format!("Found {duplicates} duplicate rows."),
        ));
        true
    }

    /// Records a constant-valued column.
    pub fn zero_variance(&mut self, column: &str, details: impl Into<String>) {
        self.push(Issue::new(
            IssueType::ZeroVariance,
            column,
            Severity::Low,
            details,
        ));
    }

    /// Records a temporal column containing values after "now".
    pub fn future_dates(&mut self, column: &str) {
        self.push(Issue::new(
            IssueType::FutureDates,
            column,
            Severity::Medium,
            "Contains dates in the future.",
        ));
    }

    /// Records a column whose statistics could not be represented.
    pub fn non_finite(&mut self, column: &str, reason: impl std::fmt::Display) {
        self.push(Issue::new(
            IssueType::NonFiniteValues,
            column,
            Severity::Medium,
            format!("Distribution statistics omitted: {reason}."),
        ));
    }

    pub fn push(&mut self, issue: Issue) {
        self.issues.push(issue);
    }

    pub fn len(&self) -> usize {
        self.issues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    /// Consumes the collector, returning the issues and the score they imply.
    pub fn finish(self) -> (Vec<Issue>, u8) {
        let score = dq_score(self.issues.len(), self.config.issue_penalty);
        (self.issues, score)
    }
}
