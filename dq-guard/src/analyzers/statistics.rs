//! Descriptive statistics for numeric columns.
//!
//! Mirrors the usual "describe" summary: count, mean, sample standard
//! deviation, min, linearly interpolated quartiles, and max, all over the
//! non-null values of the column.

use arrow::array::{Array, ArrayRef, AsArray};
use arrow::compute::{cast, max, min};
use arrow::datatypes::{DataType, Float64Type, Int64Type};

use crate::core::NumericDistribution;
use crate::dataset::ColumnKind;
use crate::error::{DqError, Result};
use crate::normalize::{finite, MetricValue};

/// Summary of a sample of finite values.
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub count: u64,
    pub mean: f64,
    /// Sample (n−1) standard deviation; `None` with fewer than two values.
    pub std: Option<f64>,
    pub min: f64,
    pub p25: f64,
    pub p50: f64,
    pub p75: f64,
    pub max: f64,
}

/// Summarizes `values`, or returns `None` when there are none.
///
/// Values must already be finite; the caller is responsible for rejecting
/// NaN and infinities.
pub fn summarize(values: &mut [f64]) -> Option<Summary> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(f64::total_cmp);

    let n = values.len();
    let mean = values.iter().sum::<f64>() / n as f64;
    let min = values[0];
    let max = values[n - 1];

    let std = if n < 2 {
        None
    } else if min == max {
        // Summation error must not turn a constant column into a tiny non-zero std.
        Some(0.0)
    } else {
        let squared: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
        Some((squared / (n as f64 - 1.0)).sqrt())
    };

    Some(Summary {
        count: n as u64,
        mean,
        std,
        min,
        p25: percentile(values, 0.25),
        p50: percentile(values, 0.5),
        p75: percentile(values, 0.75),
        max,
    })
}

/// Linear-interpolation percentile over sorted, non-empty values.
pub fn percentile(sorted: &[f64], q: f64) -> f64 {
    let position = q * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let fraction = position - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * fraction
}

/// Computes the distribution of a numeric column.
///
/// Returns `Ok(None)` for a column without non-null values, and
/// [`DqError::NonFiniteValue`] when the column holds NaN or infinite values
/// or its statistics overflow.
pub fn describe_column(column: &str, array: &ArrayRef, kind: ColumnKind) -> Result<Option<NumericDistribution>> {
    let floats = cast(array, &DataType::Float64)?;
    let floats = floats.as_primitive::<Float64Type>();

    let mut values = Vec::with_capacity(floats.len() - floats.null_count());
    for value in floats.iter().flatten() {
        values.push(finite(&format!("values of {column}"), value)?);
    }

    let Some(summary) = summarize(&mut values) else {
        return Ok(None);
    };

    let mean = finite(&format!("mean({column})"), summary.mean)?;
    let std = summary
        .std
        .map(|std| finite(&format!("std({column})"), std))
        .transpose()?;

    let (min_value, max_value) = match kind {
        ColumnKind::Integer => exact_integer_extremes(array)?
            .unwrap_or((MetricValue::Double(summary.min), MetricValue::Double(summary.max))),
        _ => (MetricValue::Double(summary.min), MetricValue::Double(summary.max)),
    };

    Ok(Some(NumericDistribution {
        count: summary.count,
        min: min_value,
        max: max_value,
        mean: Some(mean),
        std,
        p25: Some(summary.p25),
        p50: Some(summary.p50),
        p75: Some(summary.p75),
    }))
}

// Integer extremes as exact i64 values; None when the column does not fit in
// i64 (large unsigned values), in which case the float extremes are used.
fn exact_integer_extremes(array: &ArrayRef) -> Result<Option<(MetricValue, MetricValue)>> {
    let ints = cast(array, &DataType::Int64)?;
    if ints.null_count() != array.null_count() {
        return Ok(None);
    }
    let ints = ints.as_primitive::<Int64Type>();
    match (min(ints), max(ints)) {
        (Some(lo), Some(hi)) => Ok(Some((MetricValue::Long(lo), MetricValue::Long(hi)))),
        _ => Err(DqError::Internal(
            "integer column with values has no extremes".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Float64Array, Int32Array, UInt64Array};
    use std::sync::Arc;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_summarize_matches_describe() {
        let mut values = vec![4.0, 1.0, 3.0, 2.0];
        let summary = summarize(&mut values).unwrap();
        assert_eq!(summary.count, 4);
        assert_eq!(summary.mean, 2.5);
        assert!(approx(summary.std.unwrap(), 1.2909944487358056));
        assert_eq!(summary.min, 1.0);
        assert_eq!(summary.p25, 1.75);
        assert_eq!(summary.p50, 2.5);
        assert_eq!(summary.p75, 3.25);
        assert_eq!(summary.max, 4.0);
    }

    #[test]
    fn test_single_value_has_no_std() {
        let mut values = vec![9.0];
        let summary = summarize(&mut values).unwrap();
        assert_eq!(summary.std, None);
        assert_eq!(summary.p50, 9.0);
    }

    #[test]
    fn test_constant_values_have_exact_zero_std() {
        let mut values = vec![0.1; 30];
        let summary = summarize(&mut values).unwrap();
        assert_eq!(summary.std, Some(0.0));
    }

    #[test]
    fn test_summarize_empty() {
        assert!(summarize(&mut []).is_none());
    }

    #[test]
    fn test_describe_integer_column_keeps_exact_extremes() {
        let array: ArrayRef = Arc::new(Int32Array::from(vec![Some(3), None, Some(-7), Some(10)]));
        let dist = describe_column("n", &array, ColumnKind::Integer).unwrap().unwrap();
        assert_eq!(dist.count, 3);
        assert_eq!(dist.min, MetricValue::Long(-7));
        assert_eq!(dist.max, MetricValue::Long(10));
        assert_eq!(dist.mean, Some(2.0));
    }

    #[test]
    fn test_describe_large_unsigned_falls_back_to_float_extremes() {
        let array: ArrayRef = Arc::new(UInt64Array::from(vec![1, u64::MAX]));
        let dist = describe_column("n", &array, ColumnKind::Integer).unwrap().unwrap();
        assert_eq!(dist.min, MetricValue::Double(1.0));
        assert!(matches!(dist.max, MetricValue::Double(_)));
    }

    #[test]
    fn test_describe_all_null_column() {
        let array: ArrayRef = Arc::new(Float64Array::from(vec![None, None]));
        assert!(describe_column("f", &array, ColumnKind::Float).unwrap().is_none());
    }

    #[test]
    fn test_describe_rejects_nan() {
        let array: ArrayRef = Arc::new(Float64Array::from(vec![1.0, f64::NAN]));
        let err = describe_column("f", &array, ColumnKind::Float).unwrap_err();
        assert!(matches!(err, DqError::NonFiniteValue { .. }));
    }

    #[test]
    fn test_describe_rejects_overflowing_mean() {
        let array: ArrayRef = Arc::new(Float64Array::from(vec![f64::MAX, f64::MAX]));
        let err = describe_column("f", &array, ColumnKind::Float).unwrap_err();
        assert!(err.to_string().contains("mean(f)"));
    }
}
