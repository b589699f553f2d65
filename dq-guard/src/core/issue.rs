//! Issue records and their severities.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Column label used by issues that concern the whole dataset.
pub const ALL_COLUMNS: &str = "All";

/// The severity of a detected data-quality issue.
///
/// Ordered by impact: `High > Medium > Low`.
///
/// ```rust
/// use dq_guard::core::Severity;
///
/// assert!(Severity::High > Severity::Medium);
/// assert!(Severity::Medium > Severity::Low);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    /// Informational oddity, e.g. a constant column
    Low = 0,
    /// Should be investigated
    Medium = 1,
    /// Likely to break downstream consumers
    High = 2,
}

impl Severity {
    /// Returns the label used in reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "Low",
            Severity::Medium => "Medium",
            Severity::High => "High",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The kind of a detected issue.
///
/// Serialized as the human-readable labels downstream consumers match on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IssueType {
    #[serde(rename = "High Null Ratio")]
    HighNullRatio,
    #[serde(rename = "Duplicate Rows")]
    DuplicateRows,
    #[serde(rename = "Zero Variance")]
    ZeroVariance,
    #[serde(rename = "Future Dates Detected")]
    FutureDates,
    /// Statistics for a column could not be represented (NaN or infinite values).
    #[serde(rename = "Non-Finite Values")]
    NonFiniteValues,
}

impl IssueType {
    /// Returns the label used in reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueType::HighNullRatio => "High Null Ratio",
            IssueType::DuplicateRows => "Duplicate Rows",
            IssueType::ZeroVariance => "Zero Variance",
            IssueType::FutureDates => "Future Dates Detected",
            IssueType::NonFiniteValues => "Non-Finite Values",
        }
    }
}

impl fmt::Display for IssueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single data-quality finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    #[serde(rename = "type")]
    pub issue_type: IssueType,
    /// Column name, or [`ALL_COLUMNS`] for dataset-wide findings
    pub column: String,
    pub severity: Severity,
    /// Human-readable explanation
    pub details: String,
}

impl Issue {
    /// Creates a new issue.
    pub fn new(
        issue_type: IssueType,
        column: impl Into<String>,
        severity: Severity,
        details: impl Into<String>,
    ) -> Self {
        Self {
            issue_type,
            column: column.into(),
            severity,
            details: details.into(),
        }
    }

    /// Returns true when the issue concerns the whole dataset.
    pub fn is_dataset_wide(&self) -> bool {
        self.column == ALL_COLUMNS
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} on '{}': {}",
            self.severity, self.issue_type, self.column, self.details
        )
    }
}
