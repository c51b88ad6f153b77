//! Host field model

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Semantic type of a frame field. Every field the data source produces is
/// nullable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldType {
    NullableInt8,
    NullableInt16,
    NullableInt32,
    NullableInt64,
    NullableFloat32,
    NullableFloat64,
    NullableString,
    NullableBool,
    NullableTime,
    NullableJson,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::NullableInt8 => "nullable_int8",
            FieldType::NullableInt16 => "nullable_int16",
            FieldType::NullableInt32 => "nullable_int32",
            FieldType::NullableInt64 => "nullable_int64",
            FieldType::NullableFloat32 => "nullable_float32",
            FieldType::NullableFloat64 => "nullable_float64",
            FieldType::NullableString => "nullable_string",
            FieldType::NullableBool => "nullable_bool",
            FieldType::NullableTime => "nullable_time",
            FieldType::NullableJson => "nullable_json",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One converted cell, ready to be appended to a field.
///
/// `Some` carries a value (either the decoded payload or the category's zero
/// value when the driver supplied nothing); `None` is an explicit SQL NULL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldValue {
    Int8(Option<i8>),
    Int16(Option<i16>),
    Int32(Option<i32>),
    Int64(Option<i64>),
    Float32(Option<f32>),
    Float64(Option<f64>),
    String(Option<String>),
    Bool(Option<bool>),
    Time(Option<DateTime<Utc>>),
    Json(Option<serde_json::Value>),
    /// Untyped null; fits any field
    Null,
}

impl FieldValue {
    /// True for typed nulls and for [`FieldValue::Null`]
    pub fn is_null(&self) -> bool {
        match self {
            FieldValue::Int8(v) => v.is_none(),
            FieldValue::Int16(v) => v.is_none(),
            FieldValue::Int32(v) => v.is_none(),
            FieldValue::Int64(v) => v.is_none(),
            FieldValue::Float32(v) => v.is_none(),
            FieldValue::Float64(v) => v.is_none(),
            FieldValue::String(v) => v.is_none(),
            FieldValue::Bool(v) => v.is_none(),
            FieldValue::Time(v) => v.is_none(),
            FieldValue::Json(v) => v.is_none(),
            FieldValue::Null => true,
        }
    }

    /// The field type this value can be stored in, `None` for untyped nulls
    pub fn field_type(&self) -> Option<FieldType> {
        match self {
            FieldValue::Int8(_) => Some(FieldType::NullableInt8),
            FieldValue::Int16(_) => Some(FieldType::NullableInt16),
            FieldValue::Int32(_) => Some(FieldType::NullableInt32),
            FieldValue::Int64(_) => Some(FieldType::NullableInt64),
            FieldValue::Float32(_) => Some(FieldType::NullableFloat32),
            FieldValue::Float64(_) => Some(FieldType::NullableFloat64),
            FieldValue::String(_) => Some(FieldType::NullableString),
            FieldValue::Bool(_) => Some(FieldType::NullableBool),
            FieldValue::Time(_) => Some(FieldType::NullableTime),
            FieldValue::Json(_) => Some(FieldType::NullableJson),
            FieldValue::Null => None,
        }
    }
}

/// Zero timestamp used when a time column has no value at all:
/// `0001-01-01 00:00:00 UTC`.
pub fn zero_time() -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(1, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}
