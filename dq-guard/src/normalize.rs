//! Canonical scalar values and the conversions into them.
//!
//! Metrics arrive in whatever shape their source produced: Arrow scalars from a
//! local DataFusion run, loosely typed JSON from a remote statement API (which
//! typically renders every cell as a string). [`MetricValue`] is the one
//! representation the rest of the crate works with, and it refuses to
//! serialize non-finite floats.

use arrow::array::{Array, AsArray};
use arrow::datatypes::{
    DataType, Date32Type, Date64Type, Decimal128Type, Decimal256Type, Float16Type, Float32Type,
    Float64Type, Int16Type, Int32Type, Int64Type, Int8Type, TimeUnit, TimestampMicrosecondType,
    TimestampMillisecondType, TimestampNanosecondType, TimestampSecondType, UInt16Type,
    UInt32Type, UInt64Type, UInt8Type,
};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Serialize, Serializer};
use std::fmt;

use crate::core::DqResult;
use crate::error::{DqError, Result};

/// A normalized scalar metric value.
#[derive(Debug, Clone, PartialEq)]
pub enum MetricValue {
    /// Exact integer.
    Long(i64),
    /// Floating point value. May hold a non-finite value, which fails on serialization.
    Double(f64),
    /// Text, including integers too large for `i64` and unparsed numerics.
    String(String),
    /// Boolean flag.
    Boolean(bool),
    /// Instant in UTC.
    Timestamp(DateTime<Utc>),
    /// Absent value.
    Null,
}

impl MetricValue {
    /// Returns true for [`MetricValue::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, MetricValue::Null)
    }

    /// Numeric view of the value. Numeric strings are parsed; booleans map to 0/1.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            MetricValue::Long(v) => Some(*v as f64),
            MetricValue::Double(v) => Some(*v),
            MetricValue::String(s) => s.trim().parse::<f64>().ok(),
            MetricValue::Boolean(b) => Some(if *b { 1.0 } else { 0.0 }),
            MetricValue::Timestamp(_) | MetricValue::Null => None,
        }
    }

    /// Integer view of the value.
    ///
    /// Doubles and numeric strings convert only when they carry no fractional
    /// part and fit in `i64`.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            MetricValue::Long(v) => Some(*v),
            MetricValue::Double(v) => float_to_i64(*v),
            MetricValue::String(s) => {
                let trimmed = s.trim();
                trimmed
                    .parse::<i64>()
                    .ok()
                    .or_else(|| trimmed.parse::<f64>().ok().and_then(float_to_i64))
            }
            MetricValue::Boolean(b) => Some(i64::from(*b)),
            MetricValue::Timestamp(_) | MetricValue::Null => None,
        }
    }

    /// Non-negative count view of the value.
    pub fn as_count(&self) -> Option<u64> {
        self.as_i64().and_then(|v| u64::try_from(v).ok())
    }

    /// Truthiness as used by flag-style aggregates (`1`, `true`, `"1"`).
    pub fn is_truthy(&self) -> bool {
        match self {
            MetricValue::Boolean(b) => *b,
            MetricValue::String(s) if s.eq_ignore_ascii_case("true") => true,
            other => other.as_f64().is_some_and(|v| v > 0.0),
        }
    }

    /// Converts a loosely typed JSON value.
    ///
    /// Nested arrays and objects have no scalar meaning and are kept as their
    /// compact JSON text.
    pub fn from_json(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => MetricValue::Null,
            serde_json::Value::Bool(b) => MetricValue::Boolean(*b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    MetricValue::Long(i)
                } else if let Some(u) = n.as_u64() {
                    MetricValue::String(u.to_string())
                } else {
                    n.as_f64().map_or(MetricValue::Null, MetricValue::Double)
                }
            }
            serde_json::Value::String(s) => MetricValue::String(s.clone()),
            other => MetricValue::String(other.to_string()),
        }
    }

    /// Reads one cell of an Arrow array.
    pub fn from_arrow(array: &dyn Array, row: usize) -> Result<Self> {
        if row >= array.len() {
            return Err(DqError::Internal(format!(
                "row {row} out of bounds for array of length {}",
                array.len()
            )));
        }
        if array.is_null(row) {
            return Ok(MetricValue::Null);
        }

        let value = match array.data_type() {
            DataType::Null => MetricValue::Null,
            DataType::Boolean => MetricValue::Boolean(array.as_boolean().value(row)),
            DataType::Int8 => MetricValue::Long(array.as_primitive::<Int8Type>().value(row).into()),
            DataType::Int16 => {
                MetricValue::Long(array.as_primitive::<Int16Type>().value(row).into())
            }
            DataType::Int32 => {
                MetricValue::Long(array.as_primitive::<Int32Type>().value(row).into())
            }
            DataType::Int64 => MetricValue::Long(array.as_primitive::<Int64Type>().value(row)),
            DataType::UInt8 => {
                MetricValue::Long(array.as_primitive::<UInt8Type>().value(row).into())
            }
            DataType::UInt16 => {
                MetricValue::Long(array.as_primitive::<UInt16Type>().value(row).into())
            }
            DataType::UInt32 => {
                MetricValue::Long(array.as_primitive::<UInt32Type>().value(row).into())
            }
            DataType::UInt64 => {
                let v = array.as_primitive::<UInt64Type>().value(row);
                i64::try_from(v).map_or_else(|_| MetricValue::String(v.to_string()), MetricValue::Long)
            }
            DataType::Float16 => {
                MetricValue::Double(array.as_primitive::<Float16Type>().value(row).to_f64())
            }
            DataType::Float32 => {
                MetricValue::Double(array.as_primitive::<Float32Type>().value(row).into())
            }
            DataType::Float64 => MetricValue::Double(array.as_primitive::<Float64Type>().value(row)),
            DataType::Decimal128(_, scale) => {
                let raw = array.as_primitive::<Decimal128Type>().value(row);
                MetricValue::Double(raw as f64 / 10f64.powi(i32::from(*scale)))
            }
            DataType::Decimal256(_, scale) => {
                let raw = array.as_primitive::<Decimal256Type>().value(row);
                let text = raw.to_string();
                let unscaled = text.parse::<f64>().map_err(|e| {
                    DqError::Internal(format!("cannot read Decimal256 value {text}: {e}"))
                })?;
                MetricValue::Double(unscaled / 10f64.powi(i32::from(*scale)))
            }
            DataType::Utf8 => MetricValue::String(array.as_string::<i32>().value(row).to_string()),
            DataType::LargeUtf8 => {
                MetricValue::String(array.as_string::<i64>().value(row).to_string())
            }
            DataType::Utf8View => {
                MetricValue::String(array.as_string_view().value(row).to_string())
            }
            DataType::Timestamp(unit, _) => {
                let micros = timestamp_micros(array, unit, row);
                timestamp_from_micros(micros)?
            }
            DataType::Date32 => {
                let days = array.as_primitive::<Date32Type>().value(row);
                timestamp_from_micros(i64::from(days) * MICROS_PER_DAY)?
            }
            DataType::Date64 => {
                let millis = array.as_primitive::<Date64Type>().value(row);
                timestamp_from_micros(millis.saturating_mul(1_000))?
            }
            other => {
                let formatter = arrow::util::display::ArrayFormatter::try_new(
                    array,
                    &arrow::util::display::FormatOptions::default(),
                )?;
                tracing::debug!(data_type = %other, "rendering unsupported arrow type as text");
                MetricValue::String(formatter.value(row).to_string())
            }
        };
        Ok(value)
    }

    /// Converts into a JSON value, failing on non-finite floats.
    pub fn to_json(&self) -> Result<serde_json::Value> {
        Ok(match self {
            MetricValue::Long(v) => serde_json::Value::from(*v),
            MetricValue::Double(v) => serde_json::Value::from(finite("metric value", *v)?),
            MetricValue::String(s) => serde_json::Value::String(s.clone()),
            MetricValue::Boolean(b) => serde_json::Value::Bool(*b),
            MetricValue::Timestamp(ts) => {
                serde_json::Value::String(ts.to_rfc3339_opts(SecondsFormat::AutoSi, true))
            }
            MetricValue::Null => serde_json::Value::Null,
        })
    }
}

const MICROS_PER_DAY: i64 = 86_400_000_000;

fn float_to_i64(v: f64) -> Option<i64> {
    // i64::MAX as f64 rounds up to 2^63, which is out of range.
    if v.is_finite() && v.fract() == 0.0 && v >= i64::MIN as f64 && v < i64::MAX as f64 {
        Some(v as i64)
    } else {
        None
    }
}

/// Microseconds since the Unix epoch for one timestamp cell.
pub(crate) fn timestamp_micros(array: &dyn Array, unit: &TimeUnit, row: usize) -> i64 {
    match unit {
        TimeUnit::Second => array
            .as_primitive::<TimestampSecondType>()
            .value(row)
            .saturating_mul(1_000_000),
        TimeUnit::Millisecond => array
            .as_primitive::<TimestampMillisecondType>()
            .value(row)
            .saturating_mul(1_000),
        TimeUnit::Microsecond => array.as_primitive::<TimestampMicrosecondType>().value(row),
        TimeUnit::Nanosecond => array.as_primitive::<TimestampNanosecondType>().value(row) / 1_000,
    }
}

fn timestamp_from_micros(micros: i64) -> Result<MetricValue> {
    DateTime::<Utc>::from_timestamp_micros(micros)
        .map(MetricValue::Timestamp)
        .ok_or_else(|| DqError::Internal(format!("timestamp {micros}us is out of range")))
}

/// Returns `value` unchanged if it is finite, otherwise a [`DqError::NonFiniteValue`].
pub fn finite(context: &str, value: f64) -> Result<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(DqError::non_finite(context, value))
    }
}

/// `serialize_with` helper for optional statistics.
pub(crate) fn serialize_finite_opt<S>(value: &Option<f64>, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match value {
        Some(v) if !v.is_finite() => Err(serde::ser::Error::custom(format!(
            "non-finite statistic {v:?} cannot be serialized"
        ))),
        Some(v) => serializer.serialize_f64(*v),
        None => serializer.serialize_none(),
    }
}

/// Converts a result to JSON, refusing to emit NaN or infinities.
///
/// Statistics are checked first so the error names the offending column.
pub fn to_canonical_json(result: &DqResult) -> Result<serde_json::Value> {
    for (column, dist) in &result.numeric_distribution {
        let stats = [
            ("min", dist.min.as_f64()),
            ("max", dist.max.as_f64()),
            ("mean", dist.mean),
            ("std", dist.std),
            ("25%", dist.p25),
            ("50%", dist.p50),
            ("75%", dist.p75),
        ];
        for (name, value) in stats {
            if let Some(value) = value {
                finite(&format!("numeric_distribution.{column}.{name}"), value)?;
            }
        }
    }
    Ok(serde_json::to_value(result)?)
}

impl Serialize for MetricValue {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            MetricValue::Long(v) => serializer.serialize_i64(*v),
            MetricValue::Double(v) if !v.is_finite() => Err(serde::ser::Error::custom(format!(
                "non-finite metric value {v:?} cannot be serialized"
            ))),
            MetricValue::Double(v) => serializer.serialize_f64(*v),
            MetricValue::String(s) => serializer.serialize_str(s),
            MetricValue::Boolean(b) => serializer.serialize_bool(*b),
            MetricValue::Timestamp(ts) => {
                serializer.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::AutoSi, true))
            }
            MetricValue::Null => serializer.serialize_none(),
        }
    }
}

impl<'de> serde::Deserialize<'de> for MetricValue {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = serde_json::Value::deserialize(deserializer)?;
        Ok(MetricValue::from_json(&value))
    }
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricValue::Long(v) => write!(f, "{v}"),
            MetricValue::Double(v) => {
                if v.is_finite() && v.fract() == 0.0 {
                    write!(f, "{v:.1}")
                } else {
                    write!(f, "{v}")
                }
            }
            MetricValue::String(s) => write!(f, "{s}"),
            MetricValue::Boolean(b) => write!(f, "{b}"),
            MetricValue::Timestamp(ts) => {
                write!(f, "{}", ts.to_rfc3339_opts(SecondsFormat::AutoSi, true))
            }
            MetricValue::Null => write!(f, "null"),
        }
    }
}

impl From<i64> for MetricValue {
    fn from(value: i64) -> Self {
        MetricValue::Long(value)
    }
}

impl From<f64> for MetricValue {
    fn from(value: f64) -> Self {
        MetricValue::Double(value)
    }
}

impl From<bool> for MetricValue {
    fn from(value: bool) -> Self {
        MetricValue::Boolean(value)
    }
}

impl From<&str> for MetricValue {
    fn from(value: &str) -> Self {
        MetricValue::String(value.to_string())
    }
}

impl From<String> for MetricValue {
    fn from(value: String) -> Self {
        MetricValue::String(value)
    }
}

impl From<DateTime<Utc>> for MetricValue {
    fn from(value: DateTime<Utc>) -> Self {
        MetricValue::Timestamp(value)
    }
}

impl<T: Into<MetricValue>> From<Option<T>> for MetricValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(MetricValue::Null, Into::into)
    }
}
