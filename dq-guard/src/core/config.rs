//! Thresholds used by the analyzers.

use serde::{Deserialize, Serialize};

use crate::error::{DqError, Result};

/// Thresholds and weights shared by the local and push-down analyzers.
///
/// The defaults are the values reports are calibrated against; changing them
/// makes scores incomparable with results produced under the defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DqConfig {
    /// Null ratio strictly above which a column is flagged
    pub null_ratio_threshold: f64,
    /// Null ratio strictly above which the flag is `High` instead of `Medium`
    pub null_ratio_high_threshold: f64,
    /// Score points deducted per issue
    pub issue_penalty: u32,
    /// Push-down only: minimum non-null count (exclusive) before a constant
    /// column is flagged
    pub pushdown_zero_variance_min_rows: u64,
    /// Push-down only: distinct/total ratio strictly above which a column is a
    /// potential key
    pub key_distinct_ratio: f64,
    /// Push-down only: minimum row count (exclusive) for key detection
    pub key_min_rows: u64,
}

impl Default for DqConfig {
    fn default() -> Self {
        Self {
            null_ratio_threshold: 0.05,
            null_ratio_high_threshold: 0.2,
            issue_penalty: 5,
            pushdown_zero_variance_min_rows: 10,
            key_distinct_ratio: 0.99,
            key_min_rows: 100,
        }
    }
}

impl DqConfig {
    /// Sets the null ratio thresholds.
    pub fn with_null_ratio_thresholds(mut self, flag: f64, high: f64) -> Self {
        self.null_ratio_threshold = flag;
        self.null_ratio_high_threshold = high;
        self
    }

    /// Sets the score penalty per issue.
    pub fn with_issue_penalty(mut self, penalty: u32) -> Self {
        self.issue_penalty = penalty;
        self
    }

    /// Sets the potential-key heuristic parameters.
    pub fn with_key_detection(mut self, distinct_ratio: f64, min_rows: u64) -> Self {
        self.key_distinct_ratio = distinct_ratio;
        self.key_min_rows = min_rows;
        self
    }

    /// Checks that ratios are within `[0, 1]` and ordered.
    pub fn validate(&self) -> Result<()> {
        let ratios = [
            ("null_ratio_threshold", self.null_ratio_threshold),
            ("null_ratio_high_threshold", self.null_ratio_high_threshold),
            ("key_distinct_ratio", self.key_distinct_ratio),
        ];
        for (name, value) in ratios {
            if !(0.0..=1.0).contains(&value) {
                return Err(DqError::Configuration(format!(
                    "{name} must be within [0, 1], got {value}"
                )));
            }
        }
        if self.null_ratio_high_threshold < self.null_ratio_threshold {
            return Err(DqError::Configuration(
                "null_ratio_high_threshold must not be below null_ratio_threshold".to_string(),
            ));
        }
        Ok(())
    }
}
