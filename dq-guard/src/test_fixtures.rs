//! Datasets for tests, benchmarks and demos.
//!
//! The canonical sample has 105 rows: `id` 0..100, `value` equal to the id
//! except for a null on every tenth row, `category` cycling `A, B, C, A`,
//! a daily `timestamp` starting 2023-01-01, and the first five rows appended
//! again as exact duplicates.

use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray, TimestampNanosecondArray};
use arrow::csv::WriterBuilder;
use arrow::datatypes::{DataType, Field, Schema, SchemaRef, TimeUnit};
use arrow::record_batch::RecordBatch;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use crate::dataset::Dataset;
use crate::error::{DqError, ErrorContext, Result};
use crate::pushdown::ColumnSchema;

/// Rows before the duplicates are appended.
pub const SAMPLE_BASE_ROWS: usize = 100;
/// Number of leading rows appended again.
pub const SAMPLE_DUPLICATES: usize = 5;

const NANOS_PER_DAY: i64 = 86_400_000_000_000;

pub fn sample_schema() -> SchemaRef {
    Arc::new(Schema::new(vec![
        Field::new("id", DataType::Int64, false),
        Field::new("value", DataType::Float64, true),
        Field::new("category", DataType::Utf8, false),
        Field::new(
            "timestamp",
            DataType::Timestamp(TimeUnit::Nanosecond, None),
            false,
        ),
    ]))
}

fn sample_row_ids() -> impl Iterator<Item = i64> {
    (0..SAMPLE_BASE_ROWS as i64).chain(0..SAMPLE_DUPLICATES as i64)
}

fn start_of_2023() -> Result<i64> {
    NaiveDate::from_ymd_opt(2023, 1, 1)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .and_then(|ts| ts.and_utc().timestamp_nanos_opt())
        .ok_or_else(|| DqError::Internal("invalid sample start date".to_string()))
}

/// The sample as a single record batch.
pub fn sample_batch() -> Result<RecordBatch> {
    let start = start_of_2023()?;
    let categories = ["A", "B", "C", "A"];

    let ids: Vec<i64> = sample_row_ids().collect();
    let values: Vec<Option<f64>> = ids
        .iter()
        .map(|&id| (id % 10 != 0).then_some(id as f64))
        .collect();
    let category: Vec<&str> = ids.iter().map(|&id| categories[id as usize % 4]).collect();
    let timestamps: Vec<i64> = ids.iter().map(|&id| start + id * NANOS_PER_DAY).collect();

    let columns: Vec<ArrayRef> = vec![
        Arc::new(Int64Array::from(ids)),
        Arc::new(Float64Array::from(values)),
        Arc::new(StringArray::from(category)),
        Arc::new(TimestampNanosecondArray::from(timestamps)),
    ];
    Ok(RecordBatch::try_new(sample_schema(), columns)?)
}

pub fn sample_dataset() -> Result<Dataset> {
    Ok(Dataset::from_batch(sample_batch()?))
}

/// Catalog columns for the sample table.
pub fn sample_columns() -> Vec<ColumnSchema> {
    sample_schema()
        .fields()
        .iter()
        .map(|field| ColumnSchema::from_arrow_field(field))
        .collect()
}

/// Writes the sample as CSV with a header row.
pub fn write_sample_csv(path: &Path) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    let mut writer = WriterBuilder::new().with_header(true).build(file);
    writer.write(&sample_batch()?)?;
    Ok(())
}

/// Catalog listing of a typical event table.
pub fn event_table_columns() -> Vec<ColumnSchema> {
    vec![
        ColumnSchema::new("id", "LONG"),
        ColumnSchema::new("created_at", "TIMESTAMP"),
        ColumnSchema::new("updated_at", "TIMESTAMP"),
        ColumnSchema::new("name", "STRING"),
        ColumnSchema::new("value", "DOUBLE"),
        ColumnSchema::new("category", "STRING"),
        ColumnSchema::new("is_active", "BOOLEAN"),
    ]
}

/// `rows` ids with `value` null on every tenth row and no duplicates.
pub fn null_every_tenth(rows: usize) -> Result<Dataset> {
    let schema = Arc::new(Schema::new(vec![
        Field::new("id", DataType::Int64, false),
        Field::new("value", DataType::Float64, true),
    ]));
    let ids: Vec<i64> = (0..rows as i64).collect();
    let values: Vec<Option<f64>> = ids
        .iter()
        .map(|&id| (id % 10 != 0).then_some(id as f64 * 1.5))
        .collect();
    let batch = RecordBatch::try_new(
        schema,
        vec![
            Arc::new(Int64Array::from(ids)),
            Arc::new(Float64Array::from(values)),
        ],
    )?;
    Ok(Dataset::from_batch(batch))
}

/// A single column `name` holding `value` on every one of `rows` rows,
/// alongside a unique `id`.
pub fn constant_column(name: &str, value: i64, rows: usize) -> Result<Dataset> {
    let schema = Arc::new(Schema::new(vec![
        Field::new("id", DataType::Int64, false),
        Field::new(name, DataType::Int64, false),
    ]));
    let batch = RecordBatch::try_new(
        schema,
        vec![
            Arc::new(Int64Array::from_iter_values(0..rows as i64)),
            Arc::new(Int64Array::from(vec![value; rows])),
        ],
    )?;
    Ok(Dataset::from_batch(batch))
}

/// Two timestamp columns relative to `now`: `event_at` has one value ten
/// years ahead, `deleted_at` is entirely null.
pub fn future_timestamps(now: DateTime<Utc>, rows: usize) -> Result<Dataset> {
    let to_nanos = |ts: DateTime<Utc>| {
        ts.timestamp_nanos_opt()
            .ok_or_else(|| DqError::Internal(format!("{ts} is outside the nanosecond range")))
    };
    let mut events = Vec::with_capacity(rows);
    for offset in 0..rows as i64 {
        events.push(to_nanos(now - Duration::days(offset + 1))?);
    }
    if let Some(last) = events.last_mut() {
        *last = to_nanos(now + Duration::days(3650))?;
    }

    let ts_type = DataType::Timestamp(TimeUnit::Nanosecond, None);
    let schema = Arc::new(Schema::new(vec![
        Field::new("id", DataType::Int64, false),
        Field::new("event_at", ts_type.clone(), false),
        Field::new("deleted_at", ts_type, true),
    ]));
    let batch = RecordBatch::try_new(
        schema,
        vec![
            Arc::new(Int64Array::from_iter_values(0..rows as i64)),
            Arc::new(TimestampNanosecondArray::from(events)),
            Arc::new(TimestampNanosecondArray::from(vec![None::<i64>; rows])),
        ],
    )?;
    Ok(Dataset::from_batch(batch))
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::Array;

    #[test]
    fn test_sample_shape() {
        let dataset = sample_dataset().unwrap();
        assert_eq!(dataset.num_rows(), 105);
        assert_eq!(dataset.column_names(), vec!["id", "value", "category", "timestamp"]);
        // ten nulls plus the duplicated row 0
        assert_eq!(dataset.column_by_name("value").unwrap().null_count(), 11);
    }

    #[test]
    fn test_sample_columns_match_catalog_types() {
        let types: Vec<String> = sample_columns()
            .iter()
            .map(|c| c.type_name.to_string())
            .collect();
        assert_eq!(types, vec!["LONG", "DOUBLE", "STRING", "TIMESTAMP_NTZ"]);
    }

    #[test]
    fn test_write_sample_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.csv");
        write_sample_csv(&path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("id,value,category,timestamp\n"));
        assert_eq!(text.lines().count(), 106);
    }
}
