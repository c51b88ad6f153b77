//! Frame construction from driver rows
//!
//! Each column of a result cursor is tagged with its MaxCompute type name.
//! [`frame_from_rows`] resolves a converter per column through the
//! [`TypeRegistry`], runs every cell through it and stores the result in a
//! typed [`Field`]. Columns without a converter are left out of the frame.

use mcds_registry::{ConvertError, ConvertFn, TypeRegistry};
use mcds_types::{ErrorSource, FieldType, SourceValue};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

mod field;
pub use field::*;

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("column {column}: {source}")]
    Convert {
        column: String,
        #[source]
        source: ConvertError,
    },

    #[error("column {column}: cannot store {actual:?} in a {expected} field")]
    TypeMismatch {
        column: String,
        expected: FieldType,
        actual: mcds_types::FieldValue,
    },

    #[error("row {row} has {actual} values, expected {expected}")]
    RowWidth {
        row: usize,
        expected: usize,
        actual: usize,
    },

    #[error("Failed to read rows: {0}")]
    Cursor(String),
}

impl FrameError {
    /// Cursor failures come from the executed SQL; everything else is ours.
    pub fn error_source(&self) -> ErrorSource {
        match self {
            FrameError::Cursor(_) => ErrorSource::Downstream,
            FrameError::Convert { .. }
            | FrameError::TypeMismatch { .. }
            | FrameError::RowWidth { .. } => ErrorSource::Plugin,
        }
    }
}

/// Name and MaxCompute type of a result column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDesc {
    pub name: String,
    pub type_name: String,
}

impl ColumnDesc {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
        }
    }
}

/// One row of decoded cells; `None` means the driver produced no value
pub type Row = Vec<Option<SourceValue>>;

/// Result cursor as seen by the frame builder
pub trait RowSource {
    fn columns(&self) -> &[ColumnDesc];

    fn next_row(&mut self) -> Result<Option<Row>, FrameError>;
}

/// Rows already held in memory
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryRows {
    pub columns: Vec<ColumnDesc>,
    pub rows: Vec<Row>,
    #[serde(skip)]
    cursor: usize,
}

impl MemoryRows {
    pub fn new(columns: Vec<ColumnDesc>, rows: Vec<Row>) -> Self {
        Self {
            columns,
            rows,
            cursor: 0,
        }
    }
}

impl RowSource for MemoryRows {
    fn columns(&self) -> &[ColumnDesc] {
        &self.columns
    }

    fn next_row(&mut self) -> Result<Option<Row>, FrameError> {
        let row = self.rows.get(self.cursor).cloned();
        if row.is_some() {
            self.cursor += 1;
        }
        Ok(row)
    }
}

struct ColumnPlan {
    index: usize,
    convert: ConvertFn,
    field: Field,
}

/// Build a frame from `rows`, reading at most `row_limit` rows.
///
/// When the cursor holds more rows than that, reading stops and a warning
/// notice is attached to the frame.
pub fn frame_from_rows<R: RowSource + ?Sized>(
    rows: &mut R,
    row_limit: usize,
    registry: &TypeRegistry,
) -> Result<Frame, FrameError> {
    let columns = rows.columns().to_vec();

    let mut plans = Vec::with_capacity(columns.len());
    for (index, column) in columns.iter().enumerate() {
        let converter = registry.converter(&column.type_name);
        match (converter.field_type, converter.convert) {
            (Some(field_type), Some(convert)) => plans.push(ColumnPlan {
                index,
                convert,
                field: Field::new(column.name.clone(), field_type),
            }),
            _ => debug!(
                column = %column.name,
                type_name = %column.type_name,
                "skipping column without converter"
            ),
        }
    }

    let mut frame = Frame::default();
    let mut count = 0usize;

    while let Some(row) = rows.next_row()? {
        if count == row_limit {
            warn!(row_limit, "row limit reached, truncating results");
            frame.notices.push(Notice {
                severity: Severity::Warning,
                text: format!(
                    "Results have been limited to {} because the SQL row limit was reached",
                    row_limit
                ),
            });
            break;
        }

        if row.len() != columns.len() {
            return Err(FrameError::RowWidth {
                row: count,
                expected: columns.len(),
                actual: row.len(),
            });
        }

        for plan in plans.iter_mut() {
            let value = (plan.convert)(row[plan.index].as_ref()).map_err(|source| {
                FrameError::Convert {
                    column: plan.field.name.clone(),
                    source,
                }
            })?;
            let expected = plan.field.field_type();
            plan.field
                .values
                .push(value)
                .map_err(|actual| FrameError::TypeMismatch {
                    column: plan.field.name.clone(),
                    expected,
                    actual,
                })?;
        }
        count += 1;
    }

    debug!(
        rows = count,
        fields = plans.len(),
        skipped = columns.len() - plans.len(),
        "built frame"
    );
    frame.fields = plans.into_iter().map(|plan| plan.field).collect();
    Ok(frame)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use mcds_types::{FieldValue, Nullable, SourceShape};

    /// One row covering every type the service hands back
    fn all_types() -> MemoryRows {
        let date = Utc.with_ymd_and_hms(2017, 11, 11, 0, 0, 0).unwrap();
        let columns = vec![
            ColumnDesc::new("tinyint", "TINYINT"),
            ColumnDesc::new("smallint", "SMALLINT"),
            ColumnDesc::new("int", "INT"),
            ColumnDesc::new("long", "BIGINT"),
            ColumnDesc::new("binary", "BINARY"),
            ColumnDesc::new("float", "FLOAT"),
            ColumnDesc::new("double", "DOUBLE"),
            ColumnDesc::new("decimal", "DECIMAL(38,18)"),
            ColumnDesc::new("varchar4", "VARCHAR(4)"),
            ColumnDesc::new("char4", "CHAR(4)"),
            ColumnDesc::new("string", "STRING"),
            ColumnDesc::new("date", "DATE"),
            ColumnDesc::new("bool", "BOOLEAN"),
            ColumnDesc::new("array", "ARRAY<STRUCT<col1:INT,col2:INT>>"),
            ColumnDesc::new("map", "MAP<STRING,STRING>"),
            ColumnDesc::new("struct", "STRUCT<x:INT,y:INT>"),
        ];
        let row = vec![
            Some(SourceValue::NullTinyInt(Nullable::new(1))),
            Some(SourceValue::NullSmallInt(Nullable::new(2))),
            Some(SourceValue::NullInt(Nullable::new(1000))),
            Some(SourceValue::NullBigInt(Nullable::new(3))),
            Some(SourceValue::Binary(vec![
                0xFA, 0x34, 0xE1, 0x02, 0x93, 0xCB, 0x42, 0x84, 0x85, 0x73, 0xA4, 0xE3, 0x99,
                0x37, 0xF4, 0x79,
            ])),
            Some(SourceValue::NullFloat(Nullable::new(3.14))),
            Some(SourceValue::NullDouble(Nullable::new(3.14))),
            Some(SourceValue::Decimal(Nullable::new("3.5".into()))),
            Some(SourceValue::NullString(Nullable::new("abcd".into()))),
            Some(SourceValue::NullString(Nullable::new("abcd".into()))),
            Some(SourceValue::NullString(Nullable::new("abcd".into()))),
            Some(SourceValue::NullDate(Nullable::new(date))),
            Some(SourceValue::NullBoolean(Nullable::new(true))),
            Some(SourceValue::Array(
                "array(struct<col1:1,col2:2>, struct<col1:3,col2:4>)".into(),
            )),
            Some(SourceValue::Map("map('k1', 'v1', 'k2', 'v2')".into())),
            Some(SourceValue::Struct("struct<x:1,y:2>".into())),
        ];
        MemoryRows::new(columns, vec![row])
    }

    #[test]
    fn test_frame_from_all_types() {
        let registry = TypeRegistry::default();
        let mut rows = all_types();

        let frame = frame_from_rows(&mut rows, 1, &registry).unwrap();
        assert_eq!(frame.fields.len(), 16);
        assert!(frame.notices.is_empty());

        let date = Utc.with_ymd_and_hms(2017, 11, 11, 0, 0, 0).unwrap();
        let expected = [
            (FieldType::NullableInt8, FieldValue::Int8(Some(1))),
            (FieldType::NullableInt16, FieldValue::Int16(Some(2))),
            (FieldType::NullableInt32, FieldValue::Int32(Some(1000))),
            (FieldType::NullableInt64, FieldValue::Int64(Some(3))),
            (
                FieldType::NullableJson,
                FieldValue::Json(Some(serde_json::json!("+jThApPLQoSFc6TjmTf0eQ=="))),
            ),
            (FieldType::NullableFloat32, FieldValue::Float32(Some(3.14))),
            (FieldType::NullableFloat64, FieldValue::Float64(Some(3.14))),
            (FieldType::NullableString, FieldValue::String(Some("3.5".into()))),
            (FieldType::NullableString, FieldValue::String(Some("abcd".into()))),
            (FieldType::NullableString, FieldValue::String(Some("abcd".into()))),
            (FieldType::NullableString, FieldValue::String(Some("abcd".into()))),
            (FieldType::NullableTime, FieldValue::Time(Some(date))),
            (FieldType::NullableBool, FieldValue::Bool(Some(true))),
            (
                FieldType::NullableString,
                FieldValue::String(Some(
                    "array(struct<col1:1,col2:2>, struct<col1:3,col2:4>)".into(),
                )),
            ),
            (
                FieldType::NullableString,
                FieldValue::String(Some("map('k1', 'v1', 'k2', 'v2')".into())),
            ),
            (
                FieldType::NullableString,
                FieldValue::String(Some("struct<x:1,y:2>".into())),
            ),
        ];

        for (i, (field_type, value)) in expected.into_iter().enumerate() {
            let field = &frame.fields[i];
            assert_eq!(field.field_type(), field_type, "[{}] {}", i, field.name);
            assert_eq!(field.at(0), Some(value), "[{}] {}", i, field.name);
        }
    }

    #[test]
    fn test_unknown_columns_are_dropped() {
        let registry = TypeRegistry::default();
        let mut rows = MemoryRows::new(
            vec![
                ColumnDesc::new("id", "BIGINT"),
                ColumnDesc::new("blob", "FROBNICATE"),
                ColumnDesc::new("name", "STRING"),
            ],
            vec![vec![
                Some(SourceValue::BigInt(1)),
                Some(SourceValue::String("ignored".into())),
                Some(SourceValue::String("a".into())),
            ]],
        );

        let frame = frame_from_rows(&mut rows, 10, &registry).unwrap();
        let names: Vec<&str> = frame.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["id", "name"]);
        assert!(frame.field("blob").is_none());
    }

    #[test]
    fn test_nulls_and_missing_values() {
        let registry = TypeRegistry::default();
        let mut rows = MemoryRows::new(
            vec![ColumnDesc::new("n", "BIGINT"), ColumnDesc::new("v", "VOID")],
            vec![
                vec![Some(SourceValue::NullBigInt(Nullable::null())), Some(SourceValue::Void)],
                vec![None, None],
            ],
        );

        let frame = frame_from_rows(&mut rows, 10, &registry).unwrap();
        let n = frame.field("n").unwrap();
        assert_eq!(n.at(0), Some(FieldValue::Int64(None)));
        assert_eq!(n.at(1), Some(FieldValue::Int64(Some(0))));

        let v = frame.field("v").unwrap();
        assert_eq!(v.field_type(), FieldType::NullableBool);
        assert_eq!(v.at(0), Some(FieldValue::Bool(None)));
        assert_eq!(v.at(1), Some(FieldValue::Bool(None)));
    }

    #[test]
    fn test_invalid_shape_aborts() {
        let registry = TypeRegistry::default();
        let mut rows = MemoryRows::new(
            vec![ColumnDesc::new("n", "BIGINT")],
            vec![
                vec![Some(SourceValue::BigInt(1))],
                vec![Some(SourceValue::String("oops".into()))],
            ],
        );

        let err = frame_from_rows(&mut rows, 10, &registry).unwrap_err();
        match &err {
            FrameError::Convert { column, source } => {
                assert_eq!(column, "n");
                assert!(matches!(
                    source,
                    ConvertError::InvalidType {
                        rule: "BIGINT",
                        actual: SourceShape::String
                    }
                ));
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(err.error_source(), ErrorSource::Plugin);
    }

    #[test]
    fn test_row_limit() {
        let registry = TypeRegistry::default();
        let rows: Vec<Row> = (0..5).map(|i| vec![Some(SourceValue::BigInt(i))]).collect();

        let mut source = MemoryRows::new(vec![ColumnDesc::new("n", "BIGINT")], rows.clone());
        let frame = frame_from_rows(&mut source, 3, &registry).unwrap();
        assert_eq!(frame.rows(), 3);
        assert_eq!(frame.notices.len(), 1);
        assert_eq!(frame.notices[0].severity, Severity::Warning);
        assert!(frame.notices[0].text.contains("limited to 3"));

        // exactly at the limit is not a truncation
        let mut source = MemoryRows::new(vec![ColumnDesc::new("n", "BIGINT")], rows);
        let frame = frame_from_rows(&mut source, 5, &registry).unwrap();
        assert_eq!(frame.rows(), 5);
        assert!(frame.notices.is_empty());
    }

    #[test]
    fn test_row_width_mismatch() {
        let registry = TypeRegistry::default();
        let mut rows = MemoryRows::new(
            vec![ColumnDesc::new("a", "INT"), ColumnDesc::new("b", "INT")],
            vec![vec![Some(SourceValue::Int(1))]],
        );

        let err = frame_from_rows(&mut rows, 10, &registry).unwrap_err();
        assert!(matches!(
            err,
            FrameError::RowWidth {
                row: 0,
                expected: 2,
                actual: 1
            }
        ));
    }

    #[test]
    fn test_memory_rows_from_json() {
        let mut rows: MemoryRows = serde_json::from_value(serde_json::json!({
            "columns": [{"name": "n", "type_name": "INT"}],
            "rows": [[{"Int": 7}], [null]]
        }))
        .unwrap();

        let frame = frame_from_rows(&mut rows, 10, &TypeRegistry::default()).unwrap();
        let n = frame.field("n").unwrap();
        assert_eq!(n.at(0), Some(FieldValue::Int32(Some(7))));
        assert_eq!(n.at(1), Some(FieldValue::Int32(Some(0))));
    }
}
