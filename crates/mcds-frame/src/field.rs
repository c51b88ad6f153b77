//! Typed columnar storage

use chrono::{DateTime, Utc};
use mcds_types::{FieldType, FieldValue};
use serde::Serialize;

/// Values of one field, stored by type
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "values", rename_all = "lowercase")]
pub enum FieldVector {
    Int8(Vec<Option<i8>>),
    Int16(Vec<Option<i16>>),
    Int32(Vec<Option<i32>>),
    Int64(Vec<Option<i64>>),
    Float32(Vec<Option<f32>>),
    Float64(Vec<Option<f64>>),
    String(Vec<Option<String>>),
    Bool(Vec<Option<bool>>),
    Time(Vec<Option<DateTime<Utc>>>),
    Json(Vec<Option<serde_json::Value>>),
}

impl FieldVector {
    pub fn new(field_type: FieldType) -> Self {
        match field_type {
            FieldType::NullableInt8 => FieldVector::Int8(Vec::new()),
            FieldType::NullableInt16 => FieldVector::Int16(Vec::new()),
            FieldType::NullableInt32 => FieldVector::Int32(Vec::new()),
            FieldType::NullableInt64 => FieldVector::Int64(Vec::new()),
            FieldType::NullableFloat32 => FieldVector::Float32(Vec::new()),
            FieldType::NullableFloat64 => FieldVector::Float64(Vec::new()),
            FieldType::NullableString => FieldVector::String(Vec::new()),
            FieldType::NullableBool => FieldVector::Bool(Vec::new()),
            FieldType::NullableTime => FieldVector::Time(Vec::new()),
            FieldType::NullableJson => FieldVector::Json(Vec::new()),
        }
    }

    pub fn field_type(&self) -> FieldType {
        match self {
            FieldVector::Int8(_) => FieldType::NullableInt8,
            FieldVector::Int16(_) => FieldType::NullableInt16,
            FieldVector::Int32(_) => FieldType::NullableInt32,
            FieldVector::Int64(_) => FieldType::NullableInt64,
            FieldVector::Float32(_) => FieldType::NullableFloat32,
            FieldVector::Float64(_) => FieldType::NullableFloat64,
            FieldVector::String(_) => FieldType::NullableString,
            FieldVector::Bool(_) => FieldType::NullableBool,
            FieldVector::Time(_) => FieldType::NullableTime,
            FieldVector::Json(_) => FieldType::NullableJson,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            FieldVector::Int8(v) => v.len(),
            FieldVector::Int16(v) => v.len(),
            FieldVector::Int32(v) => v.len(),
            FieldVector::Int64(v) => v.len(),
            FieldVector::Float32(v) => v.len(),
            FieldVector::Float64(v) => v.len(),
            FieldVector::String(v) => v.len(),
            FieldVector::Bool(v) => v.len(),
            FieldVector::Time(v) => v.len(),
            FieldVector::Json(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Appends `value`, handing it back when its type does not fit.
    pub fn push(&mut self, value: FieldValue) -> Result<(), FieldValue> {
        match (self, value) {
            (FieldVector::Int8(v), FieldValue::Int8(x)) => v.push(x),
            (FieldVector::Int16(v), FieldValue::Int16(x)) => v.push(x),
            (FieldVector::Int32(v), FieldValue::Int32(x)) => v.push(x),
            (FieldVector::Int64(v), FieldValue::Int64(x)) => v.push(x),
            (FieldVector::Float32(v), FieldValue::Float32(x)) => v.push(x),
            (FieldVector::Float64(v), FieldValue::Float64(x)) => v.push(x),
            (FieldVector::String(v), FieldValue::String(x)) => v.push(x),
            (FieldVector::Bool(v), FieldValue::Bool(x)) => v.push(x),
            (FieldVector::Time(v), FieldValue::Time(x)) => v.push(x),
            (FieldVector::Json(v), FieldValue::Json(x)) => v.push(x),
            (vector, FieldValue::Null) => vector.push_null(),
            (_, other) => return Err(other),
        }
        Ok(())
    }

    fn push_null(&mut self) {
        match self {
            FieldVector::Int8(v) => v.push(None),
            FieldVector::Int16(v) => v.push(None),
            FieldVector::Int32(v) => v.push(None),
            FieldVector::Int64(v) => v.push(None),
            FieldVector::Float32(v) => v.push(None),
            FieldVector::Float64(v) => v.push(None),
            FieldVector::String(v) => v.push(None),
            FieldVector::Bool(v) => v.push(None),
            FieldVector::Time(v) => v.push(None),
            FieldVector::Json(v) => v.push(None),
        }
    }

    pub fn get(&self, idx: usize) -> Option<FieldValue> {
        match self {
            FieldVector::Int8(v) => v.get(idx).map(|x| FieldValue::Int8(*x)),
            FieldVector::Int16(v) => v.get(idx).map(|x| FieldValue::Int16(*x)),
            FieldVector::Int32(v) => v.get(idx).map(|x| FieldValue::Int32(*x)),
            FieldVector::Int64(v) => v.get(idx).map(|x| FieldValue::Int64(*x)),
            FieldVector::Float32(v) => v.get(idx).map(|x| FieldValue::Float32(*x)),
            FieldVector::Float64(v) => v.get(idx).map(|x| FieldValue::Float64(*x)),
            FieldVector::String(v) => v.get(idx).map(|x| FieldValue::String(x.clone())),
            FieldVector::Bool(v) => v.get(idx).map(|x| FieldValue::Bool(*x)),
            FieldVector::Time(v) => v.get(idx).map(|x| FieldValue::Time(*x)),
            FieldVector::Json(v) => v.get(idx).map(|x| FieldValue::Json(x.clone())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Field {
    pub name: String,
    pub values: FieldVector,
}

impl Field {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            values: FieldVector::new(field_type),
        }
    }

    pub fn field_type(&self) -> FieldType {
        self.values.field_type()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn at(&self, idx: usize) -> Option<FieldValue> {
        self.values.get(idx)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
}

/// Message attached to a frame for the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub severity: Severity,
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Frame {
    pub name: String,
    pub fields: Vec<Field>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub notices: Vec<Notice>,
}

impl Frame {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Number of rows, taken from the first field
    pub fn rows(&self) -> usize {
        self.fields.first().map(Field::len).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_matching_type() {
        let mut field = Field::new("n", FieldType::NullableInt64);
        field.values.push(FieldValue::Int64(Some(3))).unwrap();
        field.values.push(FieldValue::Int64(None)).unwrap();
        field.values.push(FieldValue::Null).unwrap();

        assert_eq!(field.len(), 3);
        assert_eq!(field.at(0), Some(FieldValue::Int64(Some(3))));
        assert_eq!(field.at(1), Some(FieldValue::Int64(None)));
        assert_eq!(field.at(2), Some(FieldValue::Int64(None)));
        assert_eq!(field.at(3), None);
    }

    #[test]
    fn test_push_wrong_type_is_rejected() {
        let mut vector = FieldVector::new(FieldType::NullableInt32);
        let rejected = vector.push(FieldValue::Int64(Some(1))).unwrap_err();
        assert_eq!(rejected, FieldValue::Int64(Some(1)));
        assert!(vector.is_empty());
    }

    #[test]
    fn test_frame_serializes() {
        let mut frame = Frame::new("A");
        let mut field = Field::new("s", FieldType::NullableString);
        field.values.push(FieldValue::String(Some("abcd".into()))).unwrap();
        frame.fields.push(field);

        let json = serde_json::to_value(&frame).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "name": "A",
                "fields": [{"name": "s", "values": {"type": "string", "values": ["abcd"]}}]
            })
        );
        assert_eq!(frame.rows(), 1);
    }
}
