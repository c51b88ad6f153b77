//! Values as decoded by the MaxCompute driver

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A decoded value carrying an explicit SQL NULL flag
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Nullable<T> {
    value: T,
    valid: bool,
}

impl<T> Nullable<T> {
    pub fn new(value: T) -> Self {
        Self { value, valid: true }
    }

    pub fn is_null(&self) -> bool {
        !self.valid
    }

    pub fn get(&self) -> Option<&T> {
        self.valid.then_some(&self.value)
    }

    pub fn into_option(self) -> Option<T> {
        self.valid.then_some(self.value)
    }
}

impl<T: Default> Nullable<T> {
    pub fn null() -> Self {
        Self {
            value: T::default(),
            valid: false,
        }
    }
}

impl<T> From<Option<T>> for Nullable<T>
where
    T: Default,
{
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Nullable::new(v),
            None => Nullable::null(),
        }
    }
}

/// One cell as handed over by the result cursor.
///
/// Plain variants are what the driver yields for non-nullable scans; the
/// `Null*` variants wrap the payload together with its NULL flag. Complex
/// types (maps, arrays, structs, intervals) arrive in the textual form the
/// driver renders for them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SourceValue {
    TinyInt(i8),
    SmallInt(i16),
    Int(i32),
    BigInt(i64),
    Float(f32),
    Double(f64),
    Boolean(bool),
    String(String),
    Binary(Vec<u8>),

    NullTinyInt(Nullable<i8>),
    NullSmallInt(Nullable<i16>),
    NullInt(Nullable<i32>),
    NullBigInt(Nullable<i64>),
    NullFloat(Nullable<f32>),
    NullDouble(Nullable<f64>),
    NullBoolean(Nullable<bool>),
    NullString(Nullable<String>),
    NullBinary(Nullable<Vec<u8>>),
    NullDate(Nullable<DateTime<Utc>>),
    NullDateTime(Nullable<DateTime<Utc>>),
    NullTimestamp(Nullable<DateTime<Utc>>),

    Decimal(Nullable<String>),
    Map(String),
    Array(String),
    Struct(String),
    IntervalDayTime(String),
    IntervalYearMonth(String),

    Void,
}

/// Runtime shape of a [`SourceValue`], without its payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceShape {
    TinyInt,
    SmallInt,
    Int,
    BigInt,
    Float,
    Double,
    Boolean,
    String,
    Binary,
    NullTinyInt,
    NullSmallInt,
    NullInt,
    NullBigInt,
    NullFloat,
    NullDouble,
    NullBoolean,
    NullString,
    NullBinary,
    NullDate,
    NullDateTime,
    NullTimestamp,
    Decimal,
    Map,
    Array,
    Struct,
    IntervalDayTime,
    IntervalYearMonth,
    Void,
}

impl SourceValue {
    pub fn shape(&self) -> SourceShape {
        match self {
            SourceValue::TinyInt(_) => SourceShape::TinyInt,
            SourceValue::SmallInt(_) => SourceShape::SmallInt,
            SourceValue::Int(_) => SourceShape::Int,
            SourceValue::BigInt(_) => SourceShape::BigInt,
            SourceValue::Float(_) => SourceShape::Float,
            SourceValue::Double(_) => SourceShape::Double,
            SourceValue::Boolean(_) => SourceShape::Boolean,
            SourceValue::String(_) => SourceShape::String,
            SourceValue::Binary(_) => SourceShape::Binary,
            SourceValue::NullTinyInt(_) => SourceShape::NullTinyInt,
            SourceValue::NullSmallInt(_) => SourceShape::NullSmallInt,
            SourceValue::NullInt(_) => SourceShape::NullInt,
            SourceValue::NullBigInt(_) => SourceShape::NullBigInt,
            SourceValue::NullFloat(_) => SourceShape::NullFloat,
            SourceValue::NullDouble(_) => SourceShape::NullDouble,
            SourceValue::NullBoolean(_) => SourceShape::NullBoolean,
            SourceValue::NullString(_) => SourceShape::NullString,
            SourceValue::NullBinary(_) => SourceShape::NullBinary,
            SourceValue::NullDate(_) => SourceShape::NullDate,
            SourceValue::NullDateTime(_) => SourceShape::NullDateTime,
            SourceValue::NullTimestamp(_) => SourceShape::NullTimestamp,
            SourceValue::Decimal(_) => SourceShape::Decimal,
            SourceValue::Map(_) => SourceShape::Map,
            SourceValue::Array(_) => SourceShape::Array,
            SourceValue::Struct(_) => SourceShape::Struct,
            SourceValue::IntervalDayTime(_) => SourceShape::IntervalDayTime,
            SourceValue::IntervalYearMonth(_) => SourceShape::IntervalYearMonth,
            SourceValue::Void => SourceShape::Void,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nullable_accessors() {
        let some = Nullable::new(42i64);
        assert!(!some.is_null());
        assert_eq!(some.get(), Some(&42));

        let none: Nullable<i64> = Nullable::null();
        assert!(none.is_null());
        assert_eq!(none.get(), None);
        assert_eq!(none.into_option(), None);
    }

    #[test]
    fn test_nullable_from_option() {
        let n: Nullable<String> = Some("abcd".to_string()).into();
        assert_eq!(n.into_option().as_deref(), Some("abcd"));

        let n: Nullable<String> = None.into();
        assert!(n.is_null());
    }

    #[test]
    fn test_shape() {
        assert_eq!(SourceValue::BigInt(3).shape(), SourceShape::BigInt);
        assert_eq!(
            SourceValue::Decimal(Nullable::new("3.5".to_string())).shape(),
            SourceShape::Decimal
        );
        assert_eq!(SourceValue::Void.shape(), SourceShape::Void);
    }
}
