//! Per-category conversion functions
//!
//! Every function follows the same tri-state contract:
//! - no input at all yields the category's zero value
//! - a nullable wrapper holding SQL NULL yields a typed null
//! - a matching payload yields the payload
//!
//! Anything else is an [`ConvertError::InvalidType`].

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use mcds_types::{zero_time, FieldValue, SourceValue};
use serde::{Serialize, Serializer};

use crate::ConvertError;

/// Signature shared by every type rule
pub type ConvertFn = fn(Option<&SourceValue>) -> Result<FieldValue, ConvertError>;

macro_rules! scalar_converter {
    ($fn_name:ident, $rule:literal, $plain:ident, $nullable:ident, $out:ident, $zero:expr) => {
        pub(crate) fn $fn_name(input: Option<&SourceValue>) -> Result<FieldValue, ConvertError> {
            match input {
                None => Ok(FieldValue::$out(Some($zero))),
                Some(SourceValue::$plain(v)) => Ok(FieldValue::$out(Some(v.clone()))),
                Some(SourceValue::$nullable(v)) => Ok(FieldValue::$out(v.get().cloned())),
                Some(other) => Err(ConvertError::invalid_type($rule, other)),
            }
        }
    };
}

scalar_converter!(convert_tinyint, "TINYINT", TinyInt, NullTinyInt, Int8, 0);
scalar_converter!(convert_smallint, "SMALLINT", SmallInt, NullSmallInt, Int16, 0);
scalar_converter!(convert_int, "INT", Int, NullInt, Int32, 0);
scalar_converter!(convert_bigint, "BIGINT", BigInt, NullBigInt, Int64, 0);
scalar_converter!(convert_float, "FLOAT", Float, NullFloat, Float32, 0.0);
scalar_converter!(convert_double, "DOUBLE", Double, NullDouble, Float64, 0.0);
scalar_converter!(convert_boolean, "BOOLEAN", Boolean, NullBoolean, Bool, false);
scalar_converter!(convert_string, "STRING", String, NullString, String, String::new());
scalar_converter!(convert_char, "CHAR", String, NullString, String, String::new());
scalar_converter!(convert_varchar, "VARCHAR", String, NullString, String, String::new());

// The driver only ever hands time columns over wrapped.
macro_rules! time_converter {
    ($fn_name:ident, $rule:literal, $nullable:ident) => {
        pub(crate) fn $fn_name(input: Option<&SourceValue>) -> Result<FieldValue, ConvertError> {
            match input {
                None => Ok(FieldValue::Time(Some(zero_time()))),
                Some(SourceValue::$nullable(v)) => Ok(FieldValue::Time(v.get().copied())),
                Some(other) => Err(ConvertError::invalid_type($rule, other)),
            }
        }
    };
}

time_converter!(convert_date, "DATE", NullDate);
time_converter!(convert_datetime, "DATETIME", NullDateTime);
time_converter!(convert_timestamp, "TIMESTAMP", NullTimestamp);

macro_rules! text_converter {
    ($fn_name:ident, $rule:literal, $variant:ident) => {
        pub(crate) fn $fn_name(input: Option<&SourceValue>) -> Result<FieldValue, ConvertError> {
            match input {
                None => Ok(FieldValue::String(Some(String::new()))),
                Some(SourceValue::$variant(text)) => Ok(FieldValue::String(Some(text.clone()))),
                Some(other) => Err(ConvertError::invalid_type($rule, other)),
            }
        }
    };
}

text_converter!(convert_map, "MAP", Map);
text_converter!(convert_array, "ARRAY", Array);
text_converter!(convert_struct, "STRUCT", Struct);
text_converter!(convert_interval_day_time, "INTERVAL_DAY_TIME", IntervalDayTime);
text_converter!(convert_interval_year_month, "INTERVAL_YEAR_MONTH", IntervalYearMonth);

pub(crate) fn convert_decimal(input: Option<&SourceValue>) -> Result<FieldValue, ConvertError> {
    match input {
        None => Ok(FieldValue::String(Some(String::new()))),
        Some(SourceValue::Decimal(v)) => Ok(FieldValue::String(v.get().cloned())),
        Some(other) => Err(ConvertError::invalid_type("DECIMAL", other)),
    }
}

/// Binary payloads are exposed as JSON. A missing value has no JSON zero,
/// so it becomes null like SQL NULL does.
pub(crate) fn convert_binary(input: Option<&SourceValue>) -> Result<FieldValue, ConvertError> {
    match input {
        None => Ok(FieldValue::Json(None)),
        Some(SourceValue::Binary(bytes)) => raw_json(bytes),
        Some(SourceValue::NullBinary(v)) => match v.get() {
            Some(bytes) => raw_json(bytes),
            None => Ok(FieldValue::Json(None)),
        },
        Some(other) => Err(ConvertError::invalid_type("BINARY", other)),
    }
}

pub(crate) fn convert_void(_input: Option<&SourceValue>) -> Result<FieldValue, ConvertError> {
    Ok(FieldValue::Null)
}

/// Bytes serialize as a standard base64 string.
struct Base64Bytes<'a>(&'a [u8]);

impl Serialize for Base64Bytes<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(self.0))
    }
}

fn raw_json(bytes: &[u8]) -> Result<FieldValue, ConvertError> {
    let encoded = serde_json::to_vec(&Base64Bytes(bytes))?;
    let raw: serde_json::Value = serde_json::from_slice(&encoded)?;
    Ok(FieldValue::Json(Some(raw)))
}
