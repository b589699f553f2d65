//! Shared builders for the integration tests.

#![allow(dead_code)]

use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray, TimestampNanosecondArray};
use arrow::datatypes::{Field, Schema};
use arrow::record_batch::RecordBatch;
use chrono::{DateTime, Duration, TimeZone, Utc};
use dq_guard::dataset::Dataset;
use dq_guard::pushdown::ColumnSchema;
use std::sync::Arc;

/// The instant every temporal test is evaluated against.
pub fn test_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
}

pub fn nanos(ts: DateTime<Utc>) -> i64 {
    ts.timestamp_nanos_opt().unwrap()
}

/// Builds a batch from named columns.
pub fn batch(columns: Vec<(&str, ArrayRef)>) -> RecordBatch {
    let fields: Vec<Field> = columns
        .iter()
        .map(|(name, array)| Field::new(*name, array.data_type().clone(), true))
        .collect();
    let arrays = columns.into_iter().map(|(_, array)| array).collect();
    RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays).unwrap()
}

/// 100 unique ids and a `value` column that is null on every tenth row.
pub fn null_every_tenth_batch() -> RecordBatch {
    let ids: Vec<i64> = (0..100).collect();
    let values: Vec<Option<f64>> = ids
        .iter()
        .map(|&id| (id % 10 != 0).then_some(id as f64 * 1.5))
        .collect();
    batch(vec![
        ("id", Arc::new(Int64Array::from(ids)) as ArrayRef),
        ("value", Arc::new(Float64Array::from(values))),
    ])
}

/// 100 unique rows followed by the first five rows again.
pub fn with_duplicates_batch() -> RecordBatch {
    let ids: Vec<i64> = (0..100).chain(0..5).collect();
    let labels: Vec<String> = ids.iter().map(|id| format!("item-{id}")).collect();
    batch(vec![
        ("id", Arc::new(Int64Array::from(ids)) as ArrayRef),
        ("label", Arc::new(StringArray::from(labels))),
    ])
}

/// A table that exercises every push-down metric: a unique key, a nullable
/// double, a low-cardinality string and a timestamp with one future value.
pub fn mixed_batch(rows: i64, now: DateTime<Utc>) -> RecordBatch {
    let ids: Vec<i64> = (0..rows).collect();
    let amounts: Vec<Option<f64>> = ids
        .iter()
        .map(|&id| (id % 10 != 0).then_some(id as f64 + 0.25))
        .collect();
    let categories: Vec<&str> = ids
        .iter()
        .map(|&id| ["north", "south", "east"][id as usize % 3])
        .collect();
    let mut events: Vec<i64> = ids
        .iter()
        .map(|&id| nanos(now - Duration::hours(id + 1)))
        .collect();
    if let Some(last) = events.last_mut() {
        *last = nanos(now + Duration::days(3650));
    }

    batch(vec![
        ("id", Arc::new(Int64Array::from(ids)) as ArrayRef),
        ("amount", Arc::new(Float64Array::from(amounts))),
        ("category", Arc::new(StringArray::from(categories))),
        ("event_at", Arc::new(TimestampNanosecondArray::from(events))),
    ])
}

pub fn columns_of(batch: &RecordBatch) -> Vec<ColumnSchema> {
    batch
        .schema()
        .fields()
        .iter()
        .map(|field| ColumnSchema::from_arrow_field(field))
        .collect()
}

pub fn dataset(batch: RecordBatch) -> Dataset {
    Dataset::from_batch(batch)
}
