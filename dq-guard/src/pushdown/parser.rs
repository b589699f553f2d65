//! Turns one row of aggregate metrics into a [`DqResult`].

use serde_json::Value;
use std::collections::HashMap;
use tracing::{info, instrument, warn};

use super::plan::{suffix, ColumnSchema, TOTAL_ROWS};
use super::statement::StatementResult;
use crate::core::{AnalysisMethod, DqConfig, DqResult, IssueCollector, NullDetail, NumericDistribution};
use crate::error::DqError;
use crate::log_column;
use crate::logging::LogConfig;
use crate::normalize::MetricValue;

/// `source_type` recorded on push-down results.
pub const TABLE_SOURCE: &str = "table";

const CONSTANT_COLUMN: &str = "Column has constant value.";

/// Interprets the single row produced by the aggregate statement.
///
/// Parsing never fails. A missing row or manifest yields a degenerate result
/// tagged `EmptyResult` so callers can fall back to another source.
#[derive(Debug, Clone, Default)]
pub struct PushdownParser {
    config: DqConfig,
    log: LogConfig,
}

/// Metric lookup by result column name.
struct Metrics<'a> {
    values: HashMap<&'a str, MetricValue>,
}

impl<'a> Metrics<'a> {
    fn new(names: &'a [String], row: &[Value]) -> Self {
        let values = names
            .iter()
            .zip(row)
            .map(|(name, value)| (name.as_str(), MetricValue::from_json(value)))
            .collect();
        Self { values }
    }

    /// A present, non-null metric.
    fn get(&self, name: &str) -> Option<&MetricValue> {
        self.values.get(name).filter(|value| !value.is_null())
    }

    fn count(&self, name: &str) -> Option<u64> {
        let value = self.get(name)?;
        let count = value.as_count();
        if count.is_none() {
            warn!(metric = name, value = %value, "Ignoring metric that is not a count");
        }
        count
    }

    fn float(&self, name: &str) -> Option<f64> {
        let value = self.get(name)?;
        match value.as_f64() {
            Some(v) if v.is_finite() => Some(v),
            _ => {
                warn!(metric = name, value = %value, "Ignoring non-numeric metric");
                None
            }
        }
    }

    /// The value of a metric that reads as NaN or an infinity.
    fn non_finite(&self, name: &str) -> Option<f64> {
        self.get(name)?.as_f64().filter(|v| !v.is_finite())
    }

    /// A min/max style metric, with numeric strings resolved to numbers.
    fn extreme(&self, name: &str) -> Option<MetricValue> {
        let value = self.get(name)?;
        let resolved = match value {
            MetricValue::Long(_) | MetricValue::Timestamp(_) => Some(value.clone()),
            MetricValue::Double(v) => v.is_finite().then_some(value.clone()),
            MetricValue::String(s) => {
                let trimmed = s.trim();
                match trimmed.parse::<i64>() {
                    Ok(v) => Some(MetricValue::Long(v)),
                    Err(_) => trimmed
                        .parse::<f64>()
                        .ok()
                        .filter(|v| v.is_finite())
                        .map(MetricValue::Double),
                }
            }
            MetricValue::Boolean(_) | MetricValue::Null => None,
        };
        if resolved.is_none() {
            warn!(metric = name, value = %value, "Ignoring non-numeric extreme");
        }
        resolved
    }
}

impl PushdownParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut self, config: DqConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_log_config(mut self, log: LogConfig) -> Self {
        self.log = log;
        self
    }

    /// Parses the first row of a statement response.
    pub fn parse_statement(
        &self,
        statement: &StatementResult,
        columns: &[ColumnSchema],
        table_name: &str,
    ) -> DqResult {
        let names = statement.column_names();
        self.parse(statement.first_row(), &names, columns, table_name)
    }

    /// Parses one aggregate row whose values are named by `result_column_names`.
    #[instrument(skip(self, row, result_column_names, columns), fields(table = %table_name, columns = columns.len()))]
    pub fn parse(
        &self,
        row: Option<&[Value]>,
        result_column_names: &[String],
        columns: &[ColumnSchema],
        table_name: &str,
    ) -> DqResult {
        let row = match row {
            Some(row) if !row.is_empty() && !result_column_names.is_empty() => row,
            _ => {
                let err = DqError::empty_result(format!(
                    "aggregate query on {table_name} returned no rows or no columns"
                ));
                warn!(error = %err, "Returning degenerate push-down result");
                return DqResult::degenerate(AnalysisMethod::PushDown, &err)
                    .with_source(table_name, TABLE_SOURCE);
            }
        };
        if row.len() != result_column_names.len() {
            warn!(
                values = row.len(),
                names = result_column_names.len(),
                "Row width does not match manifest, unmatched metrics are ignored"
            );
        }

        let metrics = Metrics::new(result_column_names, row);
        let total_rows = metrics.count(TOTAL_ROWS).unwrap_or(0);

        let mut result = DqResult::empty(AnalysisMethod::PushDown).with_source(table_name, TABLE_SOURCE);
        result.row_count = total_rows;
        let mut potential_keys = Vec::new();
        let mut collector = IssueCollector::new(&self.config);

        for column in columns {
            let name = &column.name;
            let alias = column.alias();
            let metric = |tail: &str| format!("{alias}{tail}");

            result.columns.push(name.clone());
            result
                .column_types
                .insert(name.clone(), column.type_name.to_string());

            let non_null = metrics.count(&metric(suffix::NON_NULL)).unwrap_or(0);
            if non_null > total_rows {
                warn!(column = %name, non_null, total_rows, "Non-null count exceeds row count");
            }
            let null_count = total_rows.saturating_sub(non_null);
            result.missing_values.insert(name.clone(), null_count);
            collector.check_null_ratio(name, null_count, total_rows, NullDetail::WithCounts);

            if column.type_name.is_numeric() {
                let non_finite = [suffix::MIN, suffix::MAX, suffix::AVG]
                    .into_iter()
                    .map(&metric)
                    .find_map(|m| metrics.non_finite(&m).map(|v| DqError::non_finite(m, v)));
                if let Some(err) = non_finite {
                    warn!(column = %name, error = %err, "Omitting distribution");
                    collector.non_finite(name, &err);
                } else if let (Some(min), Some(max)) = (
                    metrics.extreme(&metric(suffix::MIN)),
                    metrics.extreme(&metric(suffix::MAX)),
                ) {
                    let constant = match (min.as_f64(), max.as_f64()) {
                        (Some(lo), Some(hi)) => lo == hi && lo != 0.0,
                        _ => false,
                    };
                    if constant && non_null > self.config.pushdown_zero_variance_min_rows {
                        collector.zero_variance(name, CONSTANT_COLUMN);
                    }
                    let mean = metrics.float(&metric(suffix::AVG));
                    result.numeric_distribution.insert(
                        name.clone(),
                        NumericDistribution::from_extremes(non_null, min, max).with_mean(mean),
                    );
                }
            }

            if column.type_name.is_temporal() {
                let has_future = metrics
                    .get(&metric(suffix::HAS_FUTURE))
                    .is_some_and(MetricValue::is_truthy);
                if has_future {
                    collector.future_dates(name);
                }
            }

            if let Some(distinct) = metrics.count(&metric(suffix::DISTINCT)) {
                if total_rows > self.config.key_min_rows
                    && distinct as f64 / total_rows as f64 > self.config.key_distinct_ratio
                {
                    potential_keys.push(name.clone());
                }
            }

            log_column!(self.log, column = %name, non_null, null_count, "Parsed column metrics");
        }

        let (issues, score) = collector.finish();
        result.issues = issues;
        result.dq_score = score;
        result.potential_keys = Some(potential_keys);

        info!(
            rows = result.row_count,
            issues = result.issues.len(),
            score = result.dq_score,
            "Push-down analysis complete"
        );
        result
    }
}
