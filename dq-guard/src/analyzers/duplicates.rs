//! Exact duplicate row detection.

use arrow::array::Array;
use arrow::datatypes::SchemaRef;
use arrow::error::ArrowError;
use arrow::record_batch::RecordBatch;
use arrow::row::{RowConverter, SortField};
use arrow::util::display::{ArrayFormatter, FormatOptions};
use std::collections::HashSet;
use tracing::debug;

use crate::error::Result;

/// Counts rows whose full value tuple equals an earlier row.
///
/// The first occurrence of a tuple is not counted; every later repeat counts
/// once. Nulls compare equal to nulls. Rows are encoded with Arrow's row
/// format, so the comparison is over the encoded bytes of every column. Types
/// the row format cannot encode (maps, unions) are compared by their
/// rendered values instead.
pub fn count_duplicate_rows(schema: &SchemaRef, batches: &[RecordBatch]) -> Result<u64> {
    if schema.fields().is_empty() {
        return Ok(0);
    }

    let fields: Vec<SortField> = schema
        .fields()
        .iter()
        .map(|field| SortField::new(field.data_type().clone()))
        .collect();
    if !RowConverter::supports_fields(&fields) {
        debug!("Row format cannot encode every column, comparing rendered rows");
        return count_rendered_duplicates(batches);
    }
    let converter = RowConverter::new(fields)?;

    let num_rows = batches.iter().map(RecordBatch::num_rows).sum();
    let mut rows = converter.empty_rows(num_rows, 0);
    for batch in batches {
        converter.append(&mut rows, batch.columns())?;
    }

    let mut seen = HashSet::with_capacity(rows.num_rows());
    let mut duplicates = 0u64;
    for row in rows.iter() {
        if !seen.insert(row) {
            duplicates += 1;
        }
    }
    Ok(duplicates)
}

// Each row keyed by the display string of every cell, None for nulls.
fn count_rendered_duplicates(batches: &[RecordBatch]) -> Result<u64> {
    let options = FormatOptions::default();
    let mut seen: HashSet<Vec<Option<String>>> = HashSet::new();
    let mut duplicates = 0u64;
    for batch in batches {
        let formatters = batch
            .columns()
            .iter()
            .map(|column| ArrayFormatter::try_new(column.as_ref(), &options))
            .collect::<std::result::Result<Vec<_>, ArrowError>>()?;
        for row in 0..batch.num_rows() {
            let key = batch
                .columns()
                .iter()
                .zip(&formatters)
                .map(|(column, formatter)| {
                    if column.is_null(row) {
                        Ok(None)
                    } else {
                        formatter.value(row).try_to_string().map(Some)
                    }
                })
                .collect::<std::result::Result<Vec<_>, ArrowError>>()?;
            if !seen.insert(key) {
                duplicates += 1;
            }
        }
    }
    Ok(duplicates)
}
