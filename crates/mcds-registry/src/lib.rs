//! Type registry: maps MaxCompute column types onto host field types
//!
//! A source type name (as reported by the driver, e.g. `BIGINT` or
//! `VARCHAR(10)`) resolves to a [`TypeRule`] in two steps:
//! 1. exact match on the canonical rule name
//! 2. the first rule, in registration order, whose anchored pattern matches
//!
//! Names that resolve to nothing get an empty [`Converter`], and the frame
//! builder skips those columns.

use mcds_types::{FieldType, FieldValue, SourceShape, SourceValue};
use regex::Regex;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

mod convert;
pub use convert::ConvertFn;
use convert::*;

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("invalid type - {rule} (got {actual:?})")]
    InvalidType {
        rule: &'static str,
        actual: SourceShape,
    },

    #[error("failed to encode value as JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl ConvertError {
    fn invalid_type(rule: &'static str, actual: &SourceValue) -> Self {
        ConvertError::InvalidType {
            rule,
            actual: actual.shape(),
        }
    }
}

/// Conversion rule for one canonical MaxCompute type
#[derive(Clone)]
pub struct TypeRule {
    name: &'static str,
    field_type: FieldType,
    pattern: Option<Regex>,
    source_shape: Option<SourceShape>,
    convert: ConvertFn,
}

impl TypeRule {
    fn new(name: &'static str, field_type: FieldType, convert: ConvertFn) -> Self {
        Self {
            name,
            field_type,
            pattern: None,
            source_shape: None,
            convert,
        }
    }

    fn with_pattern(mut self, pattern: &str) -> Self {
        self.pattern = Some(Regex::new(pattern).expect("built-in type pattern should compile"));
        self
    }

    fn with_shape(mut self, shape: SourceShape) -> Self {
        self.source_shape = Some(shape);
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn field_type(&self) -> FieldType {
        self.field_type
    }

    pub fn pattern(&self) -> Option<&Regex> {
        self.pattern.as_ref()
    }

    /// Shape the driver is expected to decode this type into
    pub fn source_shape(&self) -> Option<SourceShape> {
        self.source_shape
    }

    /// True when the rule's pattern accepts `type_name`
    pub fn matches(&self, type_name: &str) -> bool {
        self.pattern
            .as_ref()
            .is_some_and(|pattern| pattern.is_match(type_name))
    }

    pub fn convert(&self, value: Option<&SourceValue>) -> Result<FieldValue, ConvertError> {
        (self.convert)(value)
    }

    pub fn to_converter(&self) -> Converter {
        Converter {
            name: self.name,
            input_type_name: self.name,
            input_type_pattern: self.pattern.clone(),
            input_source_shape: self.source_shape,
            field_type: Some(self.field_type),
            convert: Some(self.convert),
        }
    }
}

impl fmt::Debug for TypeRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeRule")
            .field("name", &self.name)
            .field("field_type", &self.field_type)
            .field("pattern", &self.pattern.as_ref().map(Regex::as_str))
            .field("source_shape", &self.source_shape)
            .finish_non_exhaustive()
    }
}

/// The `(field type, convert fn)` pair handed to the frame builder.
///
/// The default value is the no-op converter used for unknown source types.
#[derive(Clone, Default)]
pub struct Converter {
    pub name: &'static str,
    pub input_type_name: &'static str,
    pub input_type_pattern: Option<Regex>,
    pub input_source_shape: Option<SourceShape>,
    pub field_type: Option<FieldType>,
    pub convert: Option<ConvertFn>,
}

impl fmt::Debug for Converter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Converter")
            .field("name", &self.name)
            .field("input_type_pattern", &self.input_type_pattern.as_ref().map(Regex::as_str))
            .field("input_source_shape", &self.input_source_shape)
            .field("field_type", &self.field_type)
            .finish_non_exhaustive()
    }
}

impl Converter {
    pub fn is_empty(&self) -> bool {
        self.convert.is_none()
    }
}

/// Immutable after construction; share it behind an [`Arc`].
pub struct TypeRegistry {
    rules: Vec<TypeRule>,
    by_name: HashMap<&'static str, usize>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            rules: Vec::new(),
            by_name: HashMap::new(),
        };
        registry.register_builtins();
        registry
    }

    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    fn register_builtins(&mut self) {
        use FieldType::*;

        // Integers and floats, one rule per width
        self.register(TypeRule::new("BIGINT", NullableInt64, convert_bigint));
        self.register(TypeRule::new("INT", NullableInt32, convert_int));
        self.register(TypeRule::new("SMALLINT", NullableInt16, convert_smallint));
        self.register(TypeRule::new("TINYINT", NullableInt8, convert_tinyint));
        self.register(TypeRule::new("DOUBLE", NullableFloat64, convert_double));
        self.register(TypeRule::new("FLOAT", NullableFloat32, convert_float));

        // Strings. VARCHAR has to be registered ahead of CHAR.
        self.register(TypeRule::new("STRING", NullableString, convert_string));
        self.register(
            TypeRule::new("VARCHAR", NullableString, convert_varchar).with_pattern(r"^VARCHAR"),
        );
        self.register(TypeRule::new("CHAR", NullableString, convert_char).with_pattern(r"^CHAR"));

        self.register(TypeRule::new("BINARY", NullableJson, convert_binary));
        self.register(TypeRule::new("BOOLEAN", NullableBool, convert_boolean));

        // Temporal
        self.register(TypeRule::new("DATE", NullableTime, convert_date));
        self.register(TypeRule::new("DATETIME", NullableTime, convert_datetime));
        self.register(TypeRule::new("TIMESTAMP", NullableTime, convert_timestamp));

        // Rendered as text
        self.register(
            TypeRule::new("DECIMAL", NullableString, convert_decimal)
                .with_pattern(r"^DECIMAL")
                .with_shape(SourceShape::Decimal),
        );
        self.register(
            TypeRule::new("MAP", NullableString, convert_map)
                .with_pattern(r"^MAP<.*>")
                .with_shape(SourceShape::Map),
        );
        self.register(
            TypeRule::new("ARRAY", NullableString, convert_array)
                .with_pattern(r"^ARRAY<.*>")
                .with_shape(SourceShape::Array),
        );
        self.register(
            TypeRule::new("STRUCT", NullableString, convert_struct)
                .with_pattern(r"^STRUCT<.*>")
                .with_shape(SourceShape::Struct),
        );
        self.register(
            TypeRule::new("INTERVAL_DAY_TIME", NullableString, convert_interval_day_time)
                .with_shape(SourceShape::IntervalDayTime),
        );
        self.register(
            TypeRule::new("INTERVAL_YEAR_MONTH", NullableString, convert_interval_year_month)
                .with_shape(SourceShape::IntervalYearMonth),
        );

        self.register(
            TypeRule::new("VOID", NullableBool, convert_void).with_shape(SourceShape::Void),
        );
    }

    /// A second rule under an existing name replaces the first in place.
    fn register(&mut self, rule: TypeRule) {
        match self.by_name.get(rule.name) {
            Some(&idx) => self.rules[idx] = rule,
            None => {
                self.by_name.insert(rule.name, self.rules.len());
                self.rules.push(rule);
            }
        }
    }

    pub fn resolve(&self, type_name: &str) -> Option<&TypeRule> {
        if let Some(rule) = self.by_name.get(type_name).and_then(|&idx| self.rules.get(idx)) {
            return Some(rule);
        }

        let rule = self.rules.iter().find(|rule| rule.matches(type_name));
        match rule {
            Some(rule) => debug!(type_name, rule = rule.name, "resolved source type by pattern"),
            None => debug!(type_name, "no converter for source type"),
        }
        rule
    }

    /// Converter for `type_name`, or the empty converter when nothing matches
    pub fn converter(&self, type_name: &str) -> Converter {
        self.resolve(type_name)
            .map(TypeRule::to_converter)
            .unwrap_or_default()
    }

    /// Every converter, in registration order
    pub fn converters(&self) -> Vec<Converter> {
        self.rules.iter().map(TypeRule::to_converter).collect()
    }

    pub fn rules(&self) -> &[TypeRule] {
        &self.rules
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.rules.iter().map(TypeRule::name))
            .finish()
    }
}
