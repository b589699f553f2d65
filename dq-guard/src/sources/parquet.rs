//! Parquet file source.

use async_trait::async_trait;
use datafusion::prelude::*;
use tracing::{info, instrument};

use super::{ensure_exists, DataSource};
use crate::error::Result;

/// A Parquet file or a directory of Parquet files.
#[derive(Debug, Clone)]
pub struct ParquetSource {
    path: String,
}

impl ParquetSource {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

#[async_trait]
impl DataSource for ParquetSource {
    #[instrument(skip(self, ctx), fields(path = %self.path))]
    async fn register(&self, ctx: &SessionContext, table_name: &str) -> Result<()> {
        ensure_exists(self.source_type(), &self.path)?;
        ctx.register_parquet(table_name, &self.path, ParquetReadOptions::default())
            .await?;
        info!(table = table_name, "Registered Parquet source");
        Ok(())
    }

    fn description(&self) -> String {
        format!("Parquet file: {}", self.path)
    }

    fn location(&self) -> &str {
        &self.path
    }

    fn source_type(&self) -> &'static str {
        "parquet"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use datafusion::dataframe::DataFrameWriteOptions;

    #[tokio::test]
    async fn test_round_trip_through_parquet() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("orders.parquet");
        let path = path.to_string_lossy().to_string();

        let ctx = SessionContext::new();
        let df = ctx
            .sql("SELECT * FROM (VALUES (1, 'a'), (2, NULL), (3, 'c')) AS t(id, label)")
            .await
            .unwrap();
        df.write_parquet(
            &path,
            DataFrameWriteOptions::new().with_single_file_output(true),
            None,
        )
        .await
        .unwrap();

        let dataset = ParquetSource::new(&path).load().await.unwrap();
        assert_eq!(dataset.num_rows(), 3);
        assert_eq!(dataset.column_by_name("label").unwrap().null_count(), 1);
        assert_eq!(dataset.source(), Some((path.as_str(), "parquet")));
    }

    #[tokio::test]
    async fn test_missing_path() {
        assert!(ParquetSource::new("/no/such/dir").load().await.is_err());
    }
}
