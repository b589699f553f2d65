//! File sources that feed the local analyzer and the DataFusion executor.
//!
//! Every source can be registered as a table on a DataFusion
//! [`SessionContext`], which makes it queryable by the push-down path, or
//! loaded into a [`Dataset`] for local analysis.

use async_trait::async_trait;
use datafusion::prelude::SessionContext;
use std::fmt::Debug;
use std::path::Path;
use tracing::debug;

use crate::dataset::Dataset;
use crate::error::{DqError, ErrorContext, Result};

mod csv;
mod parquet;

pub use csv::{CsvOptions, CsvSource};
pub use parquet::ParquetSource;

/// Table name used while materializing a source.
const LOAD_TABLE: &str = "dq_source";

/// A data source that can be registered with a DataFusion context.
///
/// ```rust,ignore
/// use dq_guard::sources::{CsvSource, DataSource};
///
/// let dataset = CsvSource::new("data/sample.csv").load().await?;
/// ```
#[async_trait]
pub trait DataSource: Debug + Send + Sync {
    /// Registers this source as `table_name` on the context.
    async fn register(&self, ctx: &SessionContext, table_name: &str) -> Result<()>;

    /// Returns a human-readable description of this data source.
    fn description(&self) -> String;

    /// Path or URI the rows are read from.
    fn location(&self) -> &str;

    /// Short source kind recorded on results, e.g. `"csv"`.
    fn source_type(&self) -> &'static str;

    /// Reads every row into memory.
    async fn load(&self) -> Result<Dataset> {
        let ctx = SessionContext::new();
        self.register(&ctx, LOAD_TABLE).await?;
        let df = ctx.table(LOAD_TABLE).await?;
        let schema = df.schema().inner().clone();
        let batches = df.collect().await?;
        let dataset = Dataset::try_new(schema, batches)
            .with_context(|| format!("Loading {}", self.description()))?
            .with_source(self.location(), self.source_type());
        debug!(
            source = %self.description(),
            rows = dataset.num_rows(),
            columns = dataset.num_columns(),
            "Loaded dataset"
        );
        Ok(dataset)
    }
}

/// Fails with a data source error when `path` does not exist.
pub(crate) fn ensure_exists(source_type: &str, path: &str) -> Result<()> {
    if Path::new(path).exists() {
        Ok(())
    } else {
        Err(DqError::data_source(source_type, format!("File not found: {path}")))
    }
}

/// The file extension of `path` including the leading dot, if any.
pub(crate) fn extension_of(path: &str) -> Option<String> {
    Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{ext}"))
}
