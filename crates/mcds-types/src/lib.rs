//! Shared value model for the MaxCompute data source
//!
//! Two sides of every conversion live here: the values the driver decodes
//! from a result cursor ([`SourceValue`]) and the typed field model the host
//! stores in its frames ([`FieldType`], [`FieldValue`]).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

mod field;
mod source;

pub use field::*;
pub use source::*;

/// Who is to blame for a failed query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorSource {
    /// The query author; the message is shown to them as-is
    Downstream,
    /// The plugin or the driver underneath it
    Plugin,
}

/// Inclusive `[from, to]` bounds attached to a query by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl TimeRange {
    pub fn new(from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        Self { from, to }
    }
}
