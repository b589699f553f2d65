//! Timestamp sanity checks.

use arrow::array::{Array, AsArray};
use arrow::compute::{cast, max};
use arrow::datatypes::{
    DataType, Date32Type, Date64Type, TimeUnit, TimestampMicrosecondType,
    TimestampMillisecondType, TimestampNanosecondType, TimestampSecondType,
};
use chrono::{DateTime, Utc};

use crate::error::{DqError, Result};

const SECONDS_PER_DAY: i64 = 86_400;

/// Whether any value of a temporal column is strictly after `now`.
///
/// Returns `None` when the column has no non-null values. Values are compared
/// in the column's own unit; timestamps without a time zone are read as UTC
/// and dates as midnight UTC.
pub fn has_future_values(array: &dyn Array, now: DateTime<Utc>) -> Result<Option<bool>> {
    if let DataType::Dictionary(_, value_type) = array.data_type() {
        let values = cast(array, value_type)?;
        return has_future_values(values.as_ref(), now);
    }
    if array.null_count() == array.len() {
        return Ok(None);
    }

    // For integer-valued columns, `value > now` is equivalent to
    // `value > floor(now)` in the column's unit.
    let (latest, threshold) = match array.data_type() {
        DataType::Timestamp(TimeUnit::Second, _) => {
            (max(array.as_primitive::<TimestampSecondType>()), now.timestamp())
        }
        DataType::Timestamp(TimeUnit::Millisecond, _) => (
            max(array.as_primitive::<TimestampMillisecondType>()),
            now.timestamp_millis(),
        ),
        DataType::Timestamp(TimeUnit::Microsecond, _) => (
            max(array.as_primitive::<TimestampMicrosecondType>()),
            now.timestamp_micros(),
        ),
        DataType::Timestamp(TimeUnit::Nanosecond, _) => (
            max(array.as_primitive::<TimestampNanosecondType>()),
            // Past the nanosecond range nothing can be later.
            now.timestamp_nanos_opt().unwrap_or(i64::MAX),
        ),
        DataType::Date32 => (
            max(array.as_primitive::<Date32Type>()).map(i64::from),
            now.timestamp().div_euclid(SECONDS_PER_DAY),
        ),
        DataType::Date64 => (
            max(array.as_primitive::<Date64Type>()),
            now.timestamp_millis(),
        ),
        other => {
            return Err(DqError::Internal(format!(
                "future-date check on non-temporal type {other}"
            )))
        }
    };

    Ok(latest.map(|value| value > threshold))
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{
        Date32Array, DictionaryArray, Int32Array, Int64Array, TimestampMicrosecondArray,
        TimestampNanosecondArray, TimestampSecondArray,
    };
    use arrow::datatypes::Int32Type;
    use chrono::{Duration, TimeZone};
    use std::sync::Arc;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 15, 12, 30, 0).unwrap()
    }

    #[test]
    fn test_future_timestamp_detected() {
        let future = now() + Duration::days(3650);
        let array = TimestampMicrosecondArray::from(vec![
            Some(now().timestamp_micros() - 1),
            Some(future.timestamp_micros()),
        ]);
        assert_eq!(has_future_values(&array, now()).unwrap(), Some(true));
    }

    #[test]
    fn test_value_equal_to_now_is_not_future() {
        let array = TimestampNanosecondArray::from(vec![now().timestamp_nanos_opt().unwrap()]);
        assert_eq!(has_future_values(&array, now()).unwrap(), Some(false));
    }

    #[test]
    fn test_second_precision_with_fractional_now() {
        let now = now() + Duration::milliseconds(500);
        let array = TimestampSecondArray::from(vec![now.timestamp()]);
        assert_eq!(has_future_values(&array, now).unwrap(), Some(false));
        let array = TimestampSecondArray::from(vec![now.timestamp() + 1]);
        assert_eq!(has_future_values(&array, now).unwrap(), Some(true));
    }

    #[test]
    fn test_today_midnight_is_not_future() {
        let today = now().timestamp().div_euclid(SECONDS_PER_DAY) as i32;
        let array = Date32Array::from(vec![today]);
        assert_eq!(has_future_values(&array, now()).unwrap(), Some(false));
        let array = Date32Array::from(vec![today + 1]);
        assert_eq!(has_future_values(&array, now()).unwrap(), Some(true));
    }

    #[test]
    fn test_dictionary_encoded_dates() {
        let today = now().timestamp().div_euclid(SECONDS_PER_DAY) as i32;
        let values = Arc::new(Date32Array::from(vec![today - 30, today + 400]));
        let array =
            DictionaryArray::<Int32Type>::try_new(Int32Array::from(vec![0, 1, 0]), values.clone())
                .unwrap();
        assert_eq!(has_future_values(&array, now()).unwrap(), Some(true));

        // Only the keys in use count, not every dictionary entry.
        let array =
            DictionaryArray::<Int32Type>::try_new(Int32Array::from(vec![0, 0]), values).unwrap();
        assert_eq!(has_future_values(&array, now()).unwrap(), Some(false));
    }

    #[test]
    fn test_all_null_column_is_skipped() {
        let array = TimestampMicrosecondArray::from(vec![None, None]);
        assert_eq!(has_future_values(&array, now()).unwrap(), None);
    }

    #[test]
    fn test_non_temporal_column_is_rejected() {
        let array = Int64Array::from(vec![1]);
        assert!(has_future_values(&array, now()).is_err());
    }
}
