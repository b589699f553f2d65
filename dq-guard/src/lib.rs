//! # dq-guard - Data-quality profiling for tabular data
//!
//! dq-guard inspects a dataset and produces one normalized report: row count,
//! per-column null counts and Arrow types, exact duplicate rows, summary
//! statistics for numeric columns, a list of detected issues and a 0-100
//! health score.
//!
//! ## Two ways to analyze
//!
//! - **Local**: rows are loaded into Arrow [`RecordBatch`]es and scanned in
//!   memory by [`LocalAnalyzer`](analyzers::LocalAnalyzer).
//! - **Push-down**: [`SqlPlanGenerator`](pushdown::SqlPlanGenerator) emits a
//!   single aggregate `SELECT`, a [`QueryExecutor`](pushdown::QueryExecutor)
//!   runs it where the data lives, and
//!   [`PushdownParser`](pushdown::PushdownParser) rebuilds the report from the
//!   one returned row.
//!
//! Both paths share the thresholds in [`DqConfig`](core::DqConfig) and the
//! issue wording in [`IssueCollector`](core::IssueCollector), so their reports
//! can be compared directly. The differences are documented on each type:
//! push-down never counts duplicates and reports potential keys instead.
//!
//! ## Quick Start
//!
//! ```rust
//! use dq_guard::prelude::*;
//! use arrow::array::{Float64Array, Int64Array};
//! use arrow::datatypes::{DataType, Field, Schema};
//! use arrow::record_batch::RecordBatch;
//! use std::sync::Arc;
//!
//! # fn example() -> std::result::Result<(), Box<dyn std::error::Error>> {
//! let schema = Arc::new(Schema::new(vec![
//!     Field::new("id", DataType::Int64, false),
//!     Field::new("price", DataType::Float64, true),
//! ]));
//! let batch = RecordBatch::try_new(
//!     schema,
//!     vec![
//!         Arc::new(Int64Array::from(vec![1, 2, 3, 4])),
//!         Arc::new(Float64Array::from(vec![Some(9.5), None, Some(12.0), Some(7.25)])),
//!     ],
//! )?;
//!
//! let result = LocalAnalyzer::new().analyze(&Dataset::from_batch(batch));
//! assert_eq!(result.row_count, 4);
//! assert_eq!(result.missing_values["price"], 1);
//! // 25% nulls is a high-severity issue
//! assert_eq!(result.dq_score, 95);
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```
//!
//! ## Push-down with DataFusion
//!
//! ```rust,no_run
//! use dq_guard::prelude::*;
//! use dq_guard::sources::{CsvSource, DataSource};
//!
//! # async fn example() -> dq_guard::Result<()> {
//! let executor = DataFusionExecutor::new();
//! let source = CsvSource::new("data/sample.csv");
//! source.register(executor.context(), "sample").await?;
//!
//! let columns = source.load().await?.schema().fields().iter()
//!     .map(|field| ColumnSchema::from_arrow_field(field))
//!     .collect::<Vec<_>>();
//! let result = PushdownAnalyzer::new(executor).analyze("sample", &columns).await?;
//! println!("{}", JsonFormatter::new().format(&result, None)?);
//! # Ok(())
//! # }
//! ```
//!
//! ## Logging
//!
//! The crate emits `tracing` events and spans. Install a subscriber with
//! [`logging::setup::init_logging`] or your own; [`LogConfig`](logging::LogConfig)
//! controls how much column-level detail is recorded.
//!
//! [`RecordBatch`]: arrow::record_batch::RecordBatch

pub mod advisory;
pub mod analyzers;
pub mod core;
pub mod dataset;
pub mod error;
pub mod formatters;
pub mod logging;
pub mod normalize;
pub mod prelude;
pub mod pushdown;
pub mod security;
pub mod sources;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_fixtures;

pub use error::{DqError, Result};
