//! In-memory datasets for the local analysis path.
//!
//! A [`Dataset`] is an Arrow schema plus the record batches holding its rows.
//! Arrow nulls are the missing-value marker. Column lengths inside a batch are
//! enforced by [`RecordBatch`] itself; [`Dataset::try_new`] additionally checks
//! that every batch matches the declared schema.

use arrow::array::ArrayRef;
use arrow::compute::concat;
use arrow::datatypes::{DataType, SchemaRef};
use arrow::record_batch::RecordBatch;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{DqError, Result};

/// Coarse classification of a column's element type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnKind {
    Integer,
    Float,
    String,
    Boolean,
    /// Timestamps of any unit and dates
    Timestamp,
    Other,
}

impl ColumnKind {
    /// Classifies an Arrow data type.
    pub fn of(data_type: &DataType) -> Self {
        match data_type {
            DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64 => ColumnKind::Integer,
            DataType::Float16
            | DataType::Float32
            | DataType::Float64
            | DataType::Decimal128(_, _)
            | DataType::Decimal256(_, _) => ColumnKind::Float,
            DataType::Utf8 | DataType::LargeUtf8 | DataType::Utf8View => ColumnKind::String,
            DataType::Boolean => ColumnKind::Boolean,
            DataType::Timestamp(_, _) | DataType::Date32 | DataType::Date64 => {
                ColumnKind::Timestamp
            }
            DataType::Dictionary(_, value) => ColumnKind::of(value),
            _ => ColumnKind::Other,
        }
    }

    /// Numeric columns get distribution statistics. Booleans are not numeric.
    pub fn is_numeric(&self) -> bool {
        matches!(self, ColumnKind::Integer | ColumnKind::Float)
    }
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ColumnKind::Integer => "integer",
            ColumnKind::Float => "float",
            ColumnKind::String => "string",
            ColumnKind::Boolean => "boolean",
            ColumnKind::Timestamp => "timestamp",
            ColumnKind::Other => "other",
        };
        f.write_str(label)
    }
}

/// A tabular dataset held in memory.
#[derive(Debug, Clone)]
pub struct Dataset {
    schema: SchemaRef,
    batches: Vec<RecordBatch>,
    num_rows: usize,
    /// Where the rows came from and what kind of source that is
    provenance: Option<(String, String)>,
}

impl Dataset {
    /// Creates a dataset from a schema and batches that must all match it.
    pub fn try_new(schema: SchemaRef, batches: Vec<RecordBatch>) -> Result<Self> {
        for (index, batch) in batches.iter().enumerate() {
            let batch_schema = batch.schema();
            if batch_schema.fields().len() != schema.fields().len() {
                return Err(DqError::malformed(format!(
                    "batch {index} has {} columns, expected {}",
                    batch_schema.fields().len(),
                    schema.fields().len()
                )));
            }
            for (expected, actual) in schema.fields().iter().zip(batch_schema.fields()) {
                if expected.name() != actual.name() || expected.data_type() != actual.data_type()
                {
                    return Err(DqError::malformed(format!(
                        "batch {index} column '{}' ({}) does not match schema column '{}' ({})",
                        actual.name(),
                        actual.data_type(),
                        expected.name(),
                        expected.data_type()
                    )));
                }
            }
        }

        let num_rows = batches.iter().map(RecordBatch::num_rows).sum();
        Ok(Self {
            schema,
            batches,
            num_rows,
            provenance: None,
        })
    }

    /// Creates a dataset from batches, taking the schema from the first one.
    pub fn from_batches(batches: Vec<RecordBatch>) -> Result<Self> {
        let schema = batches
            .first()
            .map(RecordBatch::schema)
            .ok_or_else(|| DqError::malformed("no record batches and no schema"))?;
        Self::try_new(schema, batches)
    }

    /// Creates a dataset from a single batch.
    pub fn from_batch(batch: RecordBatch) -> Self {
        Self {
            schema: batch.schema(),
            num_rows: batch.num_rows(),
            batches: vec![batch],
            provenance: None,
        }
    }

    /// A dataset with columns but no rows.
    pub fn empty(schema: SchemaRef) -> Self {
        Self {
            schema,
            batches: Vec::new(),
            num_rows: 0,
            provenance: None,
        }
    }

    /// Records where the rows were read from, e.g. a file path and `"csv"`.
    pub fn with_source(mut self, source: impl Into<String>, source_type: impl Into<String>) -> Self {
        self.provenance = Some((source.into(), source_type.into()));
        self
    }

    /// The `(source, source_type)` pair, when known.
    pub fn source(&self) -> Option<(&str, &str)> {
        self.provenance
            .as_ref()
            .map(|(source, source_type)| (source.as_str(), source_type.as_str()))
    }

    pub fn schema(&self) -> &SchemaRef {
        &self.schema
    }

    pub fn batches(&self) -> &[RecordBatch] {
        &self.batches
    }

    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    pub fn num_columns(&self) -> usize {
        self.schema.fields().len()
    }

    pub fn is_empty(&self) -> bool {
        self.num_rows == 0
    }

    /// Column names in schema order.
    pub fn column_names(&self) -> Vec<String> {
        self.schema
            .fields()
            .iter()
            .map(|field| field.name().clone())
            .collect()
    }

    /// The column kind at `index`.
    pub fn column_kind(&self, index: usize) -> ColumnKind {
        ColumnKind::of(self.schema.field(index).data_type())
    }

    /// The full column at `index`, concatenated across batches.
    pub fn column(&self, index: usize) -> Result<ArrayRef> {
        if index >= self.num_columns() {
            return Err(DqError::ColumnNotFound {
                column: format!("#{index}"),
            });
        }
        match self.batches.as_slice() {
            [] => Ok(arrow::array::new_empty_array(
                self.schema.field(index).data_type(),
            )),
            [single] => Ok(single.column(index).clone()),
            many => {
                let parts: Vec<&dyn arrow::array::Array> =
                    many.iter().map(|batch| batch.column(index).as_ref()).collect();
                Ok(concat(&parts)?)
            }
        }
    }

    /// The full column with the given name.
    pub fn column_by_name(&self, name: &str) -> Result<ArrayRef> {
        let index = self
            .schema
            .index_of(name)
            .map_err(|_| DqError::ColumnNotFound {
                column: name.to_string(),
            })?;
        self.column(index)
    }
}

impl From<RecordBatch> for Dataset {
    fn from(batch: RecordBatch) -> Self {
        Self::from_batch(batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Array, Int64Array, StringArray};
    use arrow::datatypes::{Field, Schema, TimeUnit};
    use std::sync::Arc;

    fn schema() -> SchemaRef {
        Arc::new(Schema::new(vec![
            Field::new("id", DataType::Int64, false),
            Field::new("name", DataType::Utf8, true),
        ]))
    }

    fn batch(ids: Vec<i64>, names: Vec<Option<&str>>) -> RecordBatch {
        RecordBatch::try_new(
            schema(),
            vec![
                Arc::new(Int64Array::from(ids)),
                Arc::new(StringArray::from(names)),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_column_kinds() {
        assert_eq!(ColumnKind::of(&DataType::UInt16), ColumnKind::Integer);
        assert_eq!(ColumnKind::of(&DataType::Decimal128(10, 2)), ColumnKind::Float);
        assert_eq!(ColumnKind::of(&DataType::Boolean), ColumnKind::Boolean);
        assert_eq!(ColumnKind::of(&DataType::Date32), ColumnKind::Timestamp);
        assert_eq!(
            ColumnKind::of(&DataType::Timestamp(TimeUnit::Nanosecond, Some("UTC".into()))),
            ColumnKind::Timestamp
        );
        assert_eq!(
            ColumnKind::of(&DataType::Dictionary(
                Box::new(DataType::Int32),
                Box::new(DataType::Date32)
            )),
            ColumnKind::Timestamp
        );
        assert_eq!(ColumnKind::of(&DataType::Binary), ColumnKind::Other);
        assert!(!ColumnKind::Boolean.is_numeric());
        assert!(ColumnKind::Float.is_numeric());
    }

    #[test]
    fn test_multi_batch_dataset_concatenates_columns() {
        let dataset = Dataset::try_new(
            schema(),
            vec![
                batch(vec![1, 2], vec![Some("a"), None]),
                batch(vec![3], vec![Some("c")]),
            ],
        )
        .unwrap();

        assert_eq!(dataset.num_rows(), 3);
        assert_eq!(dataset.column_names(), vec!["id", "name"]);
        let names = dataset.column_by_name("name").unwrap();
        assert_eq!(names.len(), 3);
        assert_eq!(names.null_count(), 1);
    }

    #[test]
    fn test_mismatched_batch_is_malformed() {
        let other_schema = Arc::new(Schema::new(vec![Field::new("id", DataType::Int64, false)]));
        let other = RecordBatch::try_new(other_schema, vec![Arc::new(Int64Array::from(vec![1]))])
            .unwrap();

        let err = Dataset::try_new(schema(), vec![other]).unwrap_err();
        assert!(matches!(err, DqError::MalformedInput(_)));
    }

    #[test]
    fn test_from_batches_requires_a_batch() {
        assert!(matches!(
            Dataset::from_batches(vec![]),
            Err(DqError::MalformedInput(_))
        ));
    }

    #[test]
    fn test_empty_dataset_columns() {
        let dataset = Dataset::empty(schema());
        assert!(dataset.is_empty());
        assert_eq!(dataset.column(0).unwrap().len(), 0);
        assert!(matches!(
            dataset.column_by_name("missing"),
            Err(DqError::ColumnNotFound { .. })
        ));
    }
}
