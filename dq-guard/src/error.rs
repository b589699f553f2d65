//! Error types for dq-guard.
//!
//! All fallible operations in the crate return [`DqError`] through the
//! [`Result`] alias. Most data-quality conditions are *not* errors: they end up
//! as [`Issue`](crate::core::Issue) records inside a [`DqResult`](crate::core::DqResult).
//! Errors are reserved for inputs the engine cannot interpret at all.

use thiserror::Error;

/// The main error type for dq-guard.
#[derive(Error, Debug)]
pub enum DqError {
    /// The dataset handed to the local analyzer is structurally inconsistent.
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// A push-down query returned no rows or no column manifest.
    #[error("Empty result: {0}")]
    EmptyResult(String),

    /// A computed value cannot be represented in the canonical output.
    #[error("Non-finite value in {context}: {value}")]
    NonFiniteValue {
        /// Where the value was produced (e.g. `mean(price)`)
        context: String,
        /// Debug rendering of the offending value
        value: String,
    },

    /// Error from DataFusion operations.
    #[error("DataFusion error: {0}")]
    DataFusion(#[from] datafusion::error::DataFusionError),

    /// Error from Arrow operations.
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// Error from data source operations.
    #[error("Data source error: {message}")]
    DataSource {
        /// Type of data source (e.g., "CSV", "Parquet")
        source_type: String,
        /// Detailed error message
        message: String,
        /// Optional underlying error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Error from I/O operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Error related to configuration.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Error from serialization/deserialization operations.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Error when a required column is not found in the dataset.
    #[error("Column '{column}' not found in dataset")]
    ColumnNotFound { column: String },

    /// Security-related error (rejected identifiers, table names).
    #[error("Security error: {0}")]
    SecurityError(String),

    /// Generic internal error for unexpected conditions.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A type alias for `Result<T, DqError>`.
pub type Result<T> = std::result::Result<T, DqError>;

impl DqError {
    /// Creates a new malformed input error.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedInput(message.into())
    }

    /// Creates a new empty result error.
    pub fn empty_result(message: impl Into<String>) -> Self {
        Self::EmptyResult(message.into())
    }

    /// Creates a non-finite value error for the given context.
    pub fn non_finite(context: impl Into<String>, value: f64) -> Self {
        Self::NonFiniteValue {
            context: context.into(),
            value: format!("{value:?}"),
        }
    }

    /// Creates a new data source error.
    pub fn data_source(source_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self::DataSource {
            source_type: source_type.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Creates a new data source error with a source error.
    pub fn data_source_with_source(
        source_type: impl Into<String>,
        message: impl Into<String>,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        Self::DataSource {
            source_type: source_type.into(),
            message: message.into(),
            source: Some(source),
        }
    }

    /// Short, stable name of the error kind, used as the tag on degenerate results.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MalformedInput(_) => "MalformedInput",
            Self::EmptyResult(_) => "EmptyResult",
            Self::NonFiniteValue { .. } => "NonFiniteValue",
            Self::DataFusion(_) => "DataFusion",
            Self::Arrow(_) => "Arrow",
            Self::DataSource { .. } => "DataSource",
            Self::Io(_) => "Io",
            Self::Configuration(_) => "Configuration",
            Self::Serialization(_) => "Serialization",
            Self::ColumnNotFound { .. } => "ColumnNotFound",
            Self::SecurityError(_) => "SecurityError",
            Self::Internal(_) => "Internal",
        }
    }
}

impl From<std::fmt::Error> for DqError {
    fn from(err: std::fmt::Error) -> Self {
        Self::Internal(format!("Formatting failed: {err}"))
    }
}

impl From<serde_json::Error> for DqError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Extension trait for adding context to errors.
pub trait ErrorContext<T> {
    /// Adds context to an error.
    fn context(self, msg: &str) -> Result<T>;

    /// Adds context with a lazy message.
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ErrorContext<T> for std::result::Result<T, E>
where
    E: Into<DqError>,
{
    fn context(self, msg: &str) -> Result<T> {
        self.map_err(|e| wrap(msg, e.into()))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| wrap(&f(), e.into()))
    }
}

// Kinds that callers match on keep their variant; everything else is folded
// into `Internal` with the message prefixed.
fn wrap(msg: &str, err: DqError) -> DqError {
    match err {
        DqError::EmptyResult(inner) => DqError::EmptyResult(format!("{msg}: {inner}")),
        DqError::MalformedInput(inner) => DqError::MalformedInput(format!("{msg}: {inner}")),
        DqError::Internal(inner) => DqError::Internal(format!("{msg}: {inner}")),
        other => DqError::Internal(format!("{msg}: {other}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_malformed_input_error() {
        let err = DqError::malformed("batch 2 has 3 columns, expected 4");
        assert_eq!(
            err.to_string(),
            "Malformed input: batch 2 has 3 columns, expected 4"
        );
        assert_eq!(err.kind(), "MalformedInput");
    }

    #[test]
    fn test_non_finite_error() {
        let err = DqError::non_finite("mean(price)", f64::NAN);
        assert_eq!(err.to_string(), "Non-finite value in mean(price): NaN");
        assert_eq!(err.kind(), "NonFiniteValue");
    }

    #[test]
    fn test_data_source_error_with_source() {
        let source = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let err = DqError::data_source_with_source("CSV", "Could not open file", Box::new(source));
        assert_eq!(err.to_string(), "Data source error: Could not open file");
        assert!(err.source().is_some());
    }

    #[test]
    fn test_error_context_keeps_empty_result_kind() {
        let result: Result<()> = Err(DqError::empty_result("no rows"));
        let err = result.context("Parsing aggregate row").unwrap_err();
        assert_eq!(err.kind(), "EmptyResult");
        assert!(err.to_string().contains("Parsing aggregate row: no rows"));
    }

    #[test]
    fn test_error_context_wraps_other_kinds() {
        let result: std::result::Result<(), std::io::Error> = Err(std::io::Error::other("boom"));
        let err = result
            .with_context(|| "Reading sample.csv".to_string())
            .unwrap_err();
        assert_eq!(err.kind(), "Internal");
        assert!(err.to_string().contains("Reading sample.csv"));
    }
}
