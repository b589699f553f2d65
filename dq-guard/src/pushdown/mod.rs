//! Push-down analysis: aggregates computed by the source engine.
//!
//! Instead of transferring rows, [`SqlPlanGenerator`] builds one `SELECT`
//! that computes every metric in a single round trip, a [`QueryExecutor`]
//! runs it, and [`PushdownParser`] turns the returned row into a
//! [`DqResult`].
//!
//! ```text
//! (table, columns) ──► SqlPlanGenerator ──► SQL ──► QueryExecutor
//!                                                         │
//!                        DqResult ◄── PushdownParser ◄────┘ StatementResult
//! ```
//!
//! Duplicate rows cannot be derived from aggregates, so push-down results
//! always report `duplicates == 0`.

pub mod executor;
pub mod parser;
pub mod plan;
pub mod statement;

pub use executor::{batches_to_statement, DataFusionExecutor, QueryExecutor};
pub use parser::{PushdownParser, TABLE_SOURCE};
pub use plan::{sanitize_alias, ColumnSchema, ColumnTypeName, SqlPlanGenerator, TOTAL_ROWS};
pub use statement::{Manifest, ResultColumn, ResultData, ResultSchema, StatementResult};

use chrono::{DateTime, Utc};
use tracing::{info, instrument, warn};

use crate::analyzers::LocalAnalyzer;
use crate::core::{DqConfig, DqResult};
use crate::dataset::Dataset;
use crate::error::Result;
use crate::logging::LogConfig;
use crate::security::SqlSecurity;

/// Runs the full push-down flow against an executor.
#[derive(Debug, Clone)]
pub struct PushdownAnalyzer<E> {
    executor: E,
    generator: SqlPlanGenerator,
    parser: PushdownParser,
    require_qualified_tables: bool,
}

impl<E: QueryExecutor> PushdownAnalyzer<E> {
    pub fn new(executor: E) -> Self {
        let generator = SqlPlanGenerator::new(executor.dialect());
        Self {
            executor,
            generator,
            parser: PushdownParser::new(),
            require_qualified_tables: false,
        }
    }

    pub fn with_config(mut self, config: DqConfig) -> Self {
        self.parser = self.parser.with_config(config);
        self
    }

    pub fn with_log_config(mut self, log: LogConfig) -> Self {
        self.generator = self.generator.with_log_config(log.clone());
        self.parser = self.parser.with_log_config(log);
        self
    }

    /// Compares temporal columns against `now` instead of the engine clock.
    pub fn with_fixed_now(mut self, now: DateTime<Utc>) -> Self {
        self.generator = self.generator.with_fixed_now(now);
        self
    }

    /// Only accept `catalog.schema.table` paths.
    pub fn require_qualified_tables(mut self, required: bool) -> Self {
        self.require_qualified_tables = required;
        self
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// Generates, executes and parses the aggregate statement.
    ///
    /// Invalid table or column names and executor failures are errors; an
    /// empty response is a degenerate result.
    #[instrument(skip(self, columns), fields(table = %table_name))]
    pub async fn analyze(&self, table_name: &str, columns: &[ColumnSchema]) -> Result<DqResult> {
        if self.require_qualified_tables {
            SqlSecurity::validate_table_path(table_name)?;
        }
        let sql = self.generator.generate(table_name, columns)?;
        let statement = self.executor.execute(&sql).await?;
        Ok(self.parser.parse_statement(&statement, columns, table_name))
    }

    /// Runs push-down analysis and falls back to local analysis of `fallback`
    /// when it fails or comes back degenerate.
    ///
    /// A fallback result keeps the dataset's own provenance, or names
    /// `table_name` when the dataset has none.
    pub async fn analyze_or_fallback(
        &self,
        table_name: &str,
        columns: &[ColumnSchema],
        local: &LocalAnalyzer,
        fallback: &Dataset,
    ) -> DqResult {
        match self.analyze(table_name, columns).await {
            Ok(result) if !result.is_degenerate() => result,
            Ok(result) => {
                let kind = result.error.as_ref().map(|e| e.kind.as_str()).unwrap_or_default();
                warn!(table = %table_name, kind, "Push-down result is degenerate, analyzing fallback data");
                analyze_fallback(table_name, local, fallback)
            }
            Err(err) => {
                warn!(table = %table_name, error = %err, "Push-down analysis failed, analyzing fallback data");
                analyze_fallback(table_name, local, fallback)
            }
        }
    }
}

fn analyze_fallback(table_name: &str, local: &LocalAnalyzer, fallback: &Dataset) -> DqResult {
    let result = local.analyze(fallback);
    info!(rows = result.row_count, "Fallback analysis complete");
    if result.source.is_some() {
        result
    } else {
        result.with_source(table_name, TABLE_SOURCE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use crate::core::AnalysisMethod;
    use crate::error::DqError;
    use crate::security::SqlDialect;

    #[derive(Debug, Default)]
    struct RecordingExecutor {
        response: StatementResult,
        statements: Mutex<Vec<String>>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl QueryExecutor for RecordingExecutor {
        fn dialect(&self) -> SqlDialect {
            SqlDialect::Databricks
        }

        async fn execute(&self, sql: &str) -> Result<StatementResult> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.statements.lock().unwrap().push(sql.to_string());
            Ok(self.response.clone())
        }
    }

    struct FailingExecutor;

    #[async_trait]
    impl QueryExecutor for FailingExecutor {
        fn dialect(&self) -> SqlDialect {
            SqlDialect::Databricks
        }

        async fn execute(&self, _sql: &str) -> Result<StatementResult> {
            Err(DqError::data_source("warehouse", "connection refused"))
        }
    }

    fn fallback() -> Dataset {
        use arrow::array::Int64Array;
        use arrow::datatypes::{DataType, Field, Schema};
        use arrow::record_batch::RecordBatch;
        use std::sync::Arc;

        let schema = Arc::new(Schema::new(vec![Field::new("id", DataType::Int64, false)]));
        let batch =
            RecordBatch::try_new(schema, vec![Arc::new(Int64Array::from(vec![1, 2, 3]))]).unwrap();
        Dataset::from_batch(batch)
    }

    #[tokio::test]
    async fn test_analyze_uses_executor_dialect() {
        let executor = RecordingExecutor {
            response: StatementResult::new(
                vec!["total_rows".into(), "id_non_null".into()],
                vec![vec![json!("3"), json!("3")]],
            ),
            ..Default::default()
        };
        let analyzer = PushdownAnalyzer::new(executor);
        let result = analyzer
            .analyze("main.sales.orders", &[ColumnSchema::new("id", "LONG")])
            .await
            .unwrap();

        assert_eq!(result.row_count, 3);
        assert_eq!(result.analysis_method, AnalysisMethod::PushDown);
        let statements = analyzer.executor().statements.lock().unwrap();
        assert!(statements[0].contains("FROM `main`.`sales`.`orders`"));
    }

    #[tokio::test]
    async fn test_qualified_tables_are_enforced_before_execution() {
        let analyzer = PushdownAnalyzer::new(RecordingExecutor::default()).require_qualified_tables(true);
        let err = analyzer.analyze("orders", &[]).await.unwrap_err();
        assert!(matches!(err, DqError::SecurityError(_)));
        assert_eq!(analyzer.executor().calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_degenerate_result_falls_back_to_local() {
        let analyzer = PushdownAnalyzer::new(RecordingExecutor::default());
        let result = analyzer
            .analyze_or_fallback("main.sales.orders", &[], &LocalAnalyzer::new(), &fallback())
            .await;
        assert_eq!(result.analysis_method, AnalysisMethod::Local);
        assert_eq!(result.row_count, 3);
        assert_eq!(result.source.as_deref(), Some("main.sales.orders"));
        assert_eq!(result.source_type.as_deref(), Some(TABLE_SOURCE));
    }

    #[tokio::test]
    async fn test_executor_error_falls_back_to_local() {
        let analyzer = PushdownAnalyzer::new(FailingExecutor);
        let result = analyzer
            .analyze_or_fallback("main.sales.orders", &[], &LocalAnalyzer::new(), &fallback())
            .await;
        assert_eq!(result.analysis_method, AnalysisMethod::Local);
        assert!(!result.is_degenerate());
        assert_eq!(result.source.as_deref(), Some("main.sales.orders"));
    }

    #[tokio::test]
    async fn test_fallback_keeps_dataset_provenance() {
        let analyzer = PushdownAnalyzer::new(FailingExecutor);
        let data = fallback().with_source("exports/orders.parquet", "parquet");
        let result = analyzer
            .analyze_or_fallback("main.sales.orders", &[], &LocalAnalyzer::new(), &data)
            .await;
        assert_eq!(result.source.as_deref(), Some("exports/orders.parquet"));
        assert_eq!(result.source_type.as_deref(), Some("parquet"));
    }
}
