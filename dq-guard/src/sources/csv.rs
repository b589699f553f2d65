//! CSV file source.

use async_trait::async_trait;
use datafusion::arrow::datatypes::Schema;
use datafusion::prelude::*;
use std::sync::Arc;
use tracing::{info, instrument};

use super::{ensure_exists, extension_of, DataSource};
use crate::error::Result;

/// Options for configuring CSV file reading.
#[derive(Debug, Clone)]
pub struct CsvOptions {
    /// Whether the CSV file has a header row
    pub has_header: bool,
    /// Field delimiter (default: ',')
    pub delimiter: u8,
    /// Quote character (default: '"')
    pub quote: u8,
    /// Schema to use (if None, will be inferred)
    pub schema: Option<Arc<Schema>>,
    /// Maximum records to read for schema inference
    pub schema_infer_max_records: usize,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            has_header: true,
            delimiter: b',',
            quote: b'"',
            schema: None,
            schema_infer_max_records: 1000,
        }
    }
}

/// A single CSV file.
///
/// ```rust,ignore
/// use dq_guard::sources::{CsvOptions, CsvSource};
///
/// let source = CsvSource::with_options(
///     "data/users.tsv",
///     CsvOptions { delimiter: b'\t', ..Default::default() },
/// );
/// ```
#[derive(Debug, Clone)]
pub struct CsvSource {
    path: String,
    options: CsvOptions,
}

impl CsvSource {
    pub fn new(path: impl Into<String>) -> Self {
        Self::with_options(path, CsvOptions::default())
    }

    pub fn with_options(path: impl Into<String>, options: CsvOptions) -> Self {
        Self {
            path: path.into(),
            options,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

#[async_trait]
impl DataSource for CsvSource {
    #[instrument(skip(self, ctx), fields(path = %self.path))]
    async fn register(&self, ctx: &SessionContext, table_name: &str) -> Result<()> {
        ensure_exists(self.source_type(), &self.path)?;

        let extension = extension_of(&self.path).unwrap_or_default();
        let mut read_options = CsvReadOptions::new()
            .has_header(self.options.has_header)
            .delimiter(self.options.delimiter)
            .quote(self.options.quote)
            .schema_infer_max_records(self.options.schema_infer_max_records)
            .file_extension(&extension);
        if let Some(schema) = &self.options.schema {
            read_options = read_options.schema(schema.as_ref());
        }

        ctx.register_csv(table_name, &self.path, read_options).await?;
        info!(table = table_name, "Registered CSV source");
        Ok(())
    }

    fn description(&self) -> String {
        format!("CSV file: {}", self.path)
    }

    fn location(&self) -> &str {
        &self.path
    }

    fn source_type(&self) -> &'static str {
        "csv"
    }
}
