//! Execution of the aggregate statement.

use async_trait::async_trait;
use datafusion::arrow::record_batch::RecordBatch;
use datafusion::execution::context::SessionConfig;
use datafusion::prelude::*;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

use super::statement::StatementResult;
use crate::error::{DqError, Result};
use crate::normalize::MetricValue;
use crate::security::SqlDialect;

/// Runs SQL against a source engine and returns the response rows.
///
/// Implementations wrap a remote warehouse or a local engine. Timeouts and
/// retries belong to the implementation.
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    /// Quoting convention the engine expects.
    fn dialect(&self) -> SqlDialect;

    async fn execute(&self, sql: &str) -> Result<StatementResult>;
}

/// Executes statements on a DataFusion session.
///
/// Tables must be registered on the session beforehand, for example with
/// [`DataSource::register`](crate::sources::DataSource::register).
#[derive(Clone)]
pub struct DataFusionExecutor {
    ctx: SessionContext,
}

impl std::fmt::Debug for DataFusionExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataFusionExecutor")
            .field("session_id", &self.ctx.session_id())
            .finish()
    }
}

impl Default for DataFusionExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl DataFusionExecutor {
    pub fn new() -> Self {
        let config = SessionConfig::new()
            .with_information_schema(true)
            .with_batch_size(8192);
        Self {
            ctx: SessionContext::new_with_config(config),
        }
    }

    pub fn with_context(ctx: SessionContext) -> Self {
        Self { ctx }
    }

    pub fn context(&self) -> &SessionContext {
        &self.ctx
    }

    /// Registers an in-memory batch as a table.
    pub fn register_batch(&self, table_name: &str, batch: RecordBatch) -> Result<()> {
        self.ctx.register_batch(table_name, batch)?;
        Ok(())
    }
}

/// Converts query output into the statement response shape.
pub fn batches_to_statement(batches: &[RecordBatch]) -> Result<StatementResult> {
    let Some(first) = batches.first() else {
        return Ok(StatementResult::new(Vec::new(), Vec::new()));
    };
    let names = first
        .schema()
        .fields()
        .iter()
        .map(|field| field.name().clone())
        .collect();

    let mut rows = Vec::new();
    for batch in batches {
        let schema = batch.schema();
        for row in 0..batch.num_rows() {
            let values = schema
                .fields()
                .iter()
                .zip(batch.columns())
                .map(|(field, column)| {
                    cell_to_json(field.name(), MetricValue::from_arrow(column.as_ref(), row)?)
                })
                .collect::<Result<Vec<Value>>>()?;
            rows.push(values);
        }
    }
    Ok(StatementResult::new(names, rows))
}

/// One response cell. NaN and infinities become the text a warehouse
/// statement API returns for them, so the parser can flag the column.
fn cell_to_json(metric: &str, value: MetricValue) -> Result<Value> {
    match value {
        MetricValue::Double(v) if !v.is_finite() => {
            let text = if v.is_nan() {
                "NaN"
            } else if v > 0.0 {
                "Infinity"
            } else {
                "-Infinity"
            };
            warn!(metric, value = text, "Aggregate is not finite, passing it on as text");
            Ok(Value::String(text.to_string()))
        }
        other => other.to_json(),
    }
}

#[async_trait]
impl QueryExecutor for DataFusionExecutor {
    fn dialect(&self) -> SqlDialect {
        SqlDialect::Ansi
    }

    #[instrument(skip(self, sql))]
    async fn execute(&self, sql: &str) -> Result<StatementResult> {
        let df = self.ctx.sql(sql).await.map_err(|e| {
            DqError::data_source_with_source("datafusion", "Failed to plan statement", Box::new(e))
        })?;
        let batches = df.collect().await?;
        debug!(batches = batches.len(), "Statement executed");
        batches_to_statement(&batches)
    }
}

/// Shared executors are executors too.
#[async_trait]
impl<E: QueryExecutor + ?Sized> QueryExecutor for Arc<E> {
    fn dialect(&self) -> SqlDialect {
        (**self).dialect()
    }

    async fn execute(&self, sql: &str) -> Result<StatementResult> {
        (**self).execute(sql).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Float64Array, Int64Array};
    use arrow::datatypes::{DataType, Field, Schema};
    use serde_json::json;

    fn numbers() -> RecordBatch {
        let schema = Arc::new(Schema::new(vec![
            Field::new("n", DataType::Int64, true),
            Field::new("x", DataType::Float64, true),
        ]));
        RecordBatch::try_new(
            schema,
            vec![
                Arc::new(Int64Array::from(vec![Some(1), None, Some(3)])),
                Arc::new(Float64Array::from(vec![Some(0.5), Some(1.5), None])),
            ],
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_execute_aggregate() {
        let executor = DataFusionExecutor::new();
        executor.register_batch("numbers", numbers()).unwrap();

        let response = executor
            .execute(r#"SELECT COUNT(*) AS "total_rows", COUNT("n") AS "n_non_null", MAX("x") AS "x_max" FROM "numbers""#)
            .await
            .unwrap();

        assert_eq!(response.column_names(), vec!["total_rows", "n_non_null", "x_max"]);
        assert_eq!(response.first_row().unwrap(), &[json!(3), json!(2), json!(1.5)]);
    }

    #[tokio::test]
    async fn test_unknown_table_is_a_data_source_error() {
        let executor = DataFusionExecutor::new();
        let err = executor.execute("SELECT 1 FROM missing").await.unwrap_err();
        assert!(matches!(err, DqError::DataSource { .. }));
    }

    #[tokio::test]
    async fn test_non_finite_aggregates_become_text() {
        let schema = Arc::new(Schema::new(vec![Field::new("x", DataType::Float64, true)]));
        let batch = RecordBatch::try_new(
            schema,
            vec![Arc::new(Float64Array::from(vec![1.0, f64::NAN, f64::INFINITY]))],
        )
        .unwrap();
        let executor = DataFusionExecutor::new();
        executor.register_batch("readings", batch).unwrap();

        let response = executor
            .execute(r#"SELECT COUNT("x") AS "x_non_null", MIN("x") AS "x_min", AVG("x") AS "x_avg" FROM "readings""#)
            .await
            .unwrap();

        let row = response.first_row().unwrap();
        assert_eq!(row[0], json!(3));
        assert_eq!(row[1], json!(1.0));
        assert_eq!(row[2], json!("NaN"));
    }

    #[test]
    fn test_infinite_cells() {
        assert_eq!(
            cell_to_json("m", MetricValue::Double(f64::NEG_INFINITY)).unwrap(),
            json!("-Infinity")
        );
        assert_eq!(cell_to_json("m", MetricValue::Double(2.5)).unwrap(), json!(2.5));
    }

    #[test]
    fn test_no_batches() {
        let response = batches_to_statement(&[]).unwrap();
        assert!(response.first_row().is_none());
    }
}
