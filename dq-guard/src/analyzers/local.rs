//! In-memory analysis of a materialized [`Dataset`].

use arrow::array::Array;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use super::duplicates::count_duplicate_rows;
use super::statistics::describe_column;
use super::temporal::has_future_values;
use crate::core::{
    AnalysisMethod, Clock, DqConfig, DqResult, IssueCollector, NullDetail, SystemClock,
};
use crate::dataset::{ColumnKind, Dataset};
use crate::error::DqError;
use crate::log_column;
use crate::logging::LogConfig;

const CONSTANT_COLUMN: &str = "Column has constant value.";

/// Computes a [`DqResult`] by scanning every row of a dataset.
///
/// The analyzer holds no per-run state and can be shared across threads.
///
/// ```rust,ignore
/// use dq_guard::prelude::*;
///
/// let result = LocalAnalyzer::new().analyze(&dataset);
/// println!("score {} with {} issues", result.dq_score, result.issues.len());
/// ```
#[derive(Debug, Clone)]
pub struct LocalAnalyzer {
    config: DqConfig,
    clock: Arc<dyn Clock>,
    log: LogConfig,
}

impl Default for LocalAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalAnalyzer {
    pub fn new() -> Self {
        Self {
            config: DqConfig::default(),
            clock: Arc::new(SystemClock),
            log: LogConfig::default(),
        }
    }

    pub fn with_config(mut self, config: DqConfig) -> Self {
        self.config = config;
        self
    }

    /// Replaces the clock used for the future-date check.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_log_config(mut self, log: LogConfig) -> Self {
        self.log = log;
        self
    }

    pub fn config(&self) -> &DqConfig {
        &self.config
    }

    /// Analyzes the dataset.
    ///
    /// Never fails: problems confined to one column are reported as issues or
    /// logged and leave the other columns untouched.
    #[instrument(skip(self, dataset), fields(rows = dataset.num_rows(), columns = dataset.num_columns()))]
    pub fn analyze(&self, dataset: &Dataset) -> DqResult {
        let now = self.clock.now();
        let row_count = dataset.num_rows() as u64;
        let schema = dataset.schema();

        let mut result = DqResult::empty(AnalysisMethod::Local);
        if let Some((source, source_type)) = dataset.source() {
            result = result.with_source(source, source_type);
        }
        result.row_count = row_count;
        result.columns = dataset.column_names();
        for field in schema.fields() {
            result
                .column_types
                .insert(field.name().clone(), field.data_type().to_string());
        }

        let mut collector = IssueCollector::new(&self.config);

        for (index, field) in schema.fields().iter().enumerate() {
            let null_count: u64 = dataset
                .batches()
                .iter()
                .map(|batch| batch.column(index).logical_null_count() as u64)
                .sum();
            result.missing_values.insert(field.name().clone(), null_count);
            collector.check_null_ratio(field.name(), null_count, row_count, NullDetail::RatioOnly);
        }

        result.duplicates = match count_duplicate_rows(schema, dataset.batches()) {
            Ok(duplicates) => duplicates,
            Err(err) => {
                warn!(error = %err, "Duplicate detection failed, reporting none");
                0
            }
        };
        collector.check_duplicates(result.duplicates);

        for (index, field) in schema.fields().iter().enumerate() {
            let kind = dataset.column_kind(index);
            if !kind.is_numeric() {
                continue;
            }
            let column = field.name();
            let described = dataset
                .column(index)
                .and_then(|array| describe_column(column, &array, kind));
            match described {
                Ok(Some(distribution)) => {
                    log_column!(self.log, column = %column, count = distribution.count, std = ?distribution.std, "Described numeric column");
                    if distribution.std == Some(0.0) && row_count > 1 {
                        collector.zero_variance(column, CONSTANT_COLUMN);
                    }
                    result
                        .numeric_distribution
                        .insert(column.clone(), distribution);
                }
                Ok(None) => debug!(column = %column, "No non-null values to describe"),
                Err(err @ DqError::NonFiniteValue { .. }) => {
                    warn!(column = %column, error = %err, "Omitting distribution");
                    collector.non_finite(column, &err);
                }
                Err(err) => warn!(column = %column, error = %err, "Failed to describe column"),
            }
        }

        for (index, field) in schema.fields().iter().enumerate() {
            if dataset.column_kind(index) != ColumnKind::Timestamp {
                continue;
            }
            let column = field.name();
            let checked = dataset
                .column(index)
                .and_then(|array| has_future_values(array.as_ref(), now));
            match checked {
                Ok(Some(true)) => collector.future_dates(column),
                Ok(Some(false)) => {}
                Ok(None) => debug!(column = %column, "Skipping all-null temporal column"),
                Err(err) => warn!(column = %column, error = %err, "Future-date check failed"),
            }
        }

        let (issues, score) = collector.finish();
        result.issues = issues;
        result.dq_score = score;

        info!(
            rows = result.row_count,
            duplicates = result.duplicates,
            issues = result.issues.len(),
            score = result.dq_score,
            "Local analysis complete"
        );
        result
    }
}
