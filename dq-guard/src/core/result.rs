//! The normalized analysis result shared by every analysis path.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::issue::{Issue, IssueType};
use crate::error::DqError;
use crate::normalize::{serialize_finite_opt, MetricValue};

/// How a result was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AnalysisMethod {
    /// Rows were materialized and scanned in memory.
    Local,
    /// Aggregates were computed by the source engine.
    PushDown,
}

impl fmt::Display for AnalysisMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisMethod::Local => f.write_str("local"),
            AnalysisMethod::PushDown => f.write_str("push-down"),
        }
    }
}

/// Summary statistics for one numeric column.
///
/// `min` and `max` keep the column's native precision (integers stay exact).
/// The remaining statistics are absent when undefined, e.g. `std` for a
/// column with a single non-null value, or when the source did not compute
/// them (push-down results carry no std or quartiles).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericDistribution {
    /// Number of non-null values
    pub count: u64,
    pub min: MetricValue,
    pub max: MetricValue,
    #[serde(
        serialize_with = "serialize_finite_opt",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub mean: Option<f64>,
    #[serde(
        serialize_with = "serialize_finite_opt",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub std: Option<f64>,
    #[serde(
        rename = "25%",
        serialize_with = "serialize_finite_opt",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub p25: Option<f64>,
    #[serde(
        rename = "50%",
        serialize_with = "serialize_finite_opt",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub p50: Option<f64>,
    #[serde(
        rename = "75%",
        serialize_with = "serialize_finite_opt",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub p75: Option<f64>,
}

impl NumericDistribution {
    /// A distribution with only the extremes and count populated.
    pub fn from_extremes(count: u64, min: MetricValue, max: MetricValue) -> Self {
        Self {
            count,
            min,
            max,
            mean: None,
            std: None,
            p25: None,
            p50: None,
            p75: None,
        }
    }

    pub fn with_mean(mut self, mean: Option<f64>) -> Self {
        self.mean = mean;
        self
    }
}

/// Marker attached to degenerate results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisError {
    /// Stable error kind, e.g. `EmptyResult`
    pub kind: String,
    pub message: String,
}

impl From<&DqError> for AnalysisError {
    fn from(err: &DqError) -> Self {
        Self {
            kind: err.kind().to_string(),
            message: err.to_string(),
        }
    }
}

/// The outcome of one analysis invocation.
///
/// Produced by [`LocalAnalyzer`](crate::analyzers::LocalAnalyzer) and
/// [`PushdownParser`](crate::pushdown::PushdownParser). Maps are ordered by
/// column name so that serialized output is reproducible; `columns` preserves
/// the source column order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DqResult {
    pub row_count: u64,
    pub columns: Vec<String>,
    pub column_types: BTreeMap<String, String>,
    pub missing_values: BTreeMap<String, u64>,
    /// Exact duplicate rows. Always 0 for push-down results, where it means
    /// "not computed" rather than "none found".
    pub duplicates: u64,
    pub numeric_distribution: BTreeMap<String, NumericDistribution>,
    pub issues: Vec<Issue>,
    pub dq_score: u8,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub potential_keys: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub source_type: Option<String>,
    pub analysis_method: AnalysisMethod,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub error: Option<AnalysisError>,
}

impl DqResult {
    /// An empty result for the given method, before any metrics are filled in.
    pub(crate) fn empty(analysis_method: AnalysisMethod) -> Self {
        Self {
            row_count: 0,
            columns: Vec::new(),
            column_types: BTreeMap::new(),
            missing_values: BTreeMap::new(),
            duplicates: 0,
            numeric_distribution: BTreeMap::new(),
            issues: Vec::new(),
            dq_score: 100,
            potential_keys: None,
            source: None,
            source_type: None,
            analysis_method,
            error: None,
        }
    }

    /// A zero-score result tagged with the error that prevented analysis.
    pub fn degenerate(analysis_method: AnalysisMethod, error: &DqError) -> Self {
        Self {
            dq_score: 0,
            error: Some(AnalysisError::from(error)),
            ..Self::empty(analysis_method)
        }
    }

    /// Attaches provenance metadata.
    pub fn with_source(mut self, source: impl Into<String>, source_type: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self.source_type = Some(source_type.into());
        self
    }

    /// Returns true when the result carries an error tag instead of metrics.
    pub fn is_degenerate(&self) -> bool {
        self.error.is_some()
    }

    /// Issues of the given type, in detection order.
    pub fn issues_of(&self, issue_type: IssueType) -> impl Iterator<Item = &Issue> {
        self.issues
            .iter()
            .filter(move |issue| issue.issue_type == issue_type)
    }

    /// Returns true if an issue of the given type was raised for the column.
    pub fn has_issue(&self, issue_type: IssueType, column: &str) -> bool {
        self.issues_of(issue_type).any(|issue| issue.column == column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Severity, ALL_COLUMNS};

    #[test]
    fn test_degenerate_result() {
        let err = DqError::empty_result("statement returned no rows");
        let result = DqResult::degenerate(AnalysisMethod::PushDown, &err).with_source("main.sales.orders", "table");

        assert!(result.is_degenerate());
        assert_eq!(result.row_count, 0);
        assert_eq!(result.dq_score, 0);
        let tag = result.error.as_ref().unwrap();
        assert_eq!(tag.kind, "EmptyResult");
        assert_eq!(result.source.as_deref(), Some("main.sales.orders"));
    }

    #[test]
    fn test_serialized_shape() {
        let mut result = DqResult::empty(AnalysisMethod::Local);
        result.row_count = 2;
        result.columns = vec!["a".to_string()];
        result.missing_values.insert("a".to_string(), 0);
        result.numeric_distribution.insert(
            "a".to_string(),
            NumericDistribution::from_extremes(2, MetricValue::Long(1), MetricValue::Long(3))
                .with_mean(Some(2.0)),
        );

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["analysis_method"], "local");
        assert_eq!(json["numeric_distribution"]["a"]["min"], 1);
        assert_eq!(json["numeric_distribution"]["a"]["mean"], 2.0);
        assert!(json["numeric_distribution"]["a"].get("std").is_none());
        assert!(json.get("potential_keys").is_none());
        assert!(json.get("error").is_none());
    }

    #[test]
    fn test_serialization_rejects_nan_statistics() {
        let mut result = DqResult::empty(AnalysisMethod::Local);
        result.numeric_distribution.insert(
            "a".to_string(),
            NumericDistribution::from_extremes(1, MetricValue::Long(1), MetricValue::Long(1))
                .with_mean(Some(f64::NAN)),
        );
        assert!(serde_json::to_string(&result).is_err());
    }

    #[test]
    fn test_issue_queries() {
        let mut result = DqResult::empty(AnalysisMethod::Local);
        result.issues.push(Issue::new(
            IssueType::DuplicateRows,
            ALL_COLUMNS,
            Severity::High,
            "Found 1 duplicate rows.",
        ));
        assert!(result.has_issue(IssueType::DuplicateRows, ALL_COLUMNS));
        assert!(!result.has_issue(IssueType::ZeroVariance, ALL_COLUMNS));
        assert_eq!(result.issues_of(IssueType::DuplicateRows).count(), 1);
    }
}
