//! SQL macros for the MaxCompute data source
//!
//! Query authors write placeholders such as `$__timeFilter(time)` in their
//! SQL. [`interpolate`] finds them and asks the [`MacroTable`] to expand each
//! one against the query's [`TimeRange`].
//!
//! Built-in macros:
//! - `$__timeFilter(column)` - `column >= '<from>' AND column <= '<to>'`
//! - `$__timeFrom(column)` - `column >= '<from>'`
//! - `$__timeTo(column)` - `column <= '<to>'`
//! - `$__timeGroup(column, period)` - `datepart` projections from `period`
//!   up to the year

pub use mcds_types::ErrorSource;
use mcds_types::TimeRange;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

mod interpolate;
mod time;

pub use interpolate::interpolate;
pub use time::{time_filter, time_from, time_group, time_to, GROUP_PERIODS};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MacroError {
    #[error("unexpected number of arguments to $__{name}: expected {expected} argument(s), received {received}")]
    BadArgumentCount {
        name: &'static str,
        expected: usize,
        received: usize,
    },

    #[error("undefined macro: $__{0}")]
    UnknownMacro(String),

    #[error("missing closing parenthesis in $__{0}(...)")]
    Unterminated(String),
}

impl MacroError {
    /// Every macro failure stems from the query text.
    pub fn error_source(&self) -> ErrorSource {
        match self {
            MacroError::BadArgumentCount { .. }
            | MacroError::UnknownMacro(_)
            | MacroError::Unterminated(_) => ErrorSource::Downstream,
        }
    }
}

/// Names of the built-in macros, as written after `$__`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MacroName {
    TimeFilter,
    TimeFrom,
    TimeTo,
    TimeGroup,
}

impl MacroName {
    pub const ALL: [MacroName; 4] = [
        MacroName::TimeFilter,
        MacroName::TimeFrom,
        MacroName::TimeTo,
        MacroName::TimeGroup,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MacroName::TimeFilter => "timeFilter",
            MacroName::TimeFrom => "timeFrom",
            MacroName::TimeTo => "timeTo",
            MacroName::TimeGroup => "timeGroup",
        }
    }
}

impl fmt::Display for MacroName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MacroName {
    type Err = MacroError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MacroName::ALL
            .into_iter()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| MacroError::UnknownMacro(s.to_string()))
    }
}

/// Body of a macro: time range plus the already-split arguments
pub type MacroFn = fn(&TimeRange, &[String]) -> Result<String, MacroError>;

/// Fixed name-to-function table handed to the interpolation host
#[derive(Clone)]
pub struct MacroTable {
    entries: Vec<(MacroName, MacroFn)>,
}

impl MacroTable {
    pub fn new() -> Self {
        Self {
            entries: vec![
                (MacroName::TimeFilter, time_filter as MacroFn),
                (MacroName::TimeFrom, time_from),
                (MacroName::TimeTo, time_to),
                (MacroName::TimeGroup, time_group),
            ],
        }
    }

    pub fn get(&self, name: &str) -> Option<MacroFn> {
        self.entries
            .iter()
            .find(|(entry, _)| entry.as_str() == name)
            .map(|(_, func)| *func)
    }

    pub fn names(&self) -> impl Iterator<Item = MacroName> + '_ {
        self.entries.iter().map(|(name, _)| *name)
    }

    /// Expand one macro by name
    pub fn expand(
        &self,
        name: &str,
        range: &TimeRange,
        args: &[String],
    ) -> Result<String, MacroError> {
        let func = self
            .get(name)
            .ok_or_else(|| MacroError::UnknownMacro(name.to_string()))?;
        func(range, args)
    }
}

impl Default for MacroTable {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MacroTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

/// Fails with [`MacroError::BadArgumentCount`] unless exactly `expected`
/// arguments were given.
pub(crate) fn expect_args(name: MacroName, args: &[String], expected: usize) -> Result<(), MacroError> {
    if args.len() != expected {
        return Err(MacroError::BadArgumentCount {
            name: name.as_str(),
            expected,
            received: args.len(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn range() -> TimeRange {
        TimeRange::new(
            Utc.with_ymd_and_hms(2014, 11, 12, 11, 45, 26).unwrap(),
            Utc.with_ymd_and_hms(2015, 11, 12, 11, 45, 26).unwrap(),
        )
    }

    #[test]
    fn test_table_lookup() {
        let table = MacroTable::default();

        for name in MacroName::ALL {
            assert!(table.get(name.as_str()).is_some(), "{}", name);
        }
        assert!(table.get("timeShift").is_none());
        assert!(table.get("TimeFilter").is_none());
    }

    #[test]
    fn test_expand_by_name() {
        let table = MacroTable::default();

        let sql = table.expand("timeTo", &range(), &["time".to_string()]).unwrap();
        assert_eq!(sql, "time <= '2015-11-12 11:45:26'");

        let err = table.expand("nope", &range(), &[]).unwrap_err();
        assert_eq!(err, MacroError::UnknownMacro("nope".to_string()));
    }

    #[test]
    fn test_macro_name_round_trip() {
        for name in MacroName::ALL {
            assert_eq!(name.as_str().parse::<MacroName>().unwrap(), name);
        }
        assert!("timefilter".parse::<MacroName>().is_err());
    }

    #[test]
    fn test_errors_are_downstream() {
        let errors = [
            MacroError::BadArgumentCount {
                name: "timeFilter",
                expected: 1,
                received: 0,
            },
            MacroError::UnknownMacro("x".to_string()),
            MacroError::Unterminated("timeFilter".to_string()),
        ];
        for err in errors {
            assert_eq!(err.error_source(), ErrorSource::Downstream);
        }
    }
}
