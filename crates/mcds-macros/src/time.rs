//! Time-range macros
//!
//! Bounds are rendered in UTC with second precision, e.g.
//! `2006-01-02 15:04:05`. Arguments are spliced in verbatim.

use chrono::{DateTime, Utc};
use mcds_types::TimeRange;

use crate::{expect_args, MacroError, MacroName};

const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// `timeGroup` periods, finest first, with their `datepart` format
pub const GROUP_PERIODS: [(&str, &str); 5] = [
    ("minute", "mi"),
    ("hour", "hh"),
    ("day", "dd"),
    ("month", "mm"),
    ("year", "yyyy"),
];

fn format_bound(instant: &DateTime<Utc>) -> String {
    instant.format(DATETIME_FORMAT).to_string()
}

/// `$__timeFilter(time)` => `time >= '2006-01-02 15:04:05' AND time <= '2006-01-02 15:04:05'`
pub fn time_filter(range: &TimeRange, args: &[String]) -> Result<String, MacroError> {
    expect_args(MacroName::TimeFilter, args, 1)?;

    let column = &args[0];
    Ok(format!(
        "{column} >= '{}' AND {column} <= '{}'",
        format_bound(&range.from),
        format_bound(&range.to)
    ))
}

/// `$__timeFrom(time)` => `time >= '2006-01-02 15:04:05'`
pub fn time_from(range: &TimeRange, args: &[String]) -> Result<String, MacroError> {
    expect_args(MacroName::TimeFrom, args, 1)?;

    Ok(format!("{} >= '{}'", args[0], format_bound(&range.from)))
}

/// `$__timeTo(time)` => `time <= '2006-01-02 15:04:05'`
pub fn time_to(range: &TimeRange, args: &[String]) -> Result<String, MacroError> {
    expect_args(MacroName::TimeTo, args, 1)?;

    Ok(format!("{} <= '{}'", args[0], format_bound(&range.to)))
}

/// `$__timeGroup(time, month)` => `datepart(time, 'mm') as time_month,datepart(time, 'yyyy') as time_year`
///
/// Every coarser period is included as well. An unknown period expands to
/// nothing.
pub fn time_group(_range: &TimeRange, args: &[String]) -> Result<String, MacroError> {
    expect_args(MacroName::TimeGroup, args, 2)?;

    let column = &args[0];
    let period = args[1].as_str();

    let Some(start) = GROUP_PERIODS.iter().position(|(unit, _)| *unit == period) else {
        tracing::debug!(period, "unknown timeGroup period, expanding to nothing");
        return Ok(String::new());
    };

    Ok(GROUP_PERIODS[start..]
        .iter()
        .map(|(unit, part)| format!("datepart({column}, '{part}') as {column}_{unit}"))
        .collect::<Vec<_>>()
        .join(","))
}
