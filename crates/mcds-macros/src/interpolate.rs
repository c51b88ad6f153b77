//! Placeholder scanning
//!
//! Finds `$__name` and `$__name(arg, ...)` tokens in raw SQL and replaces
//! each with the expansion of the named macro. Arguments may contain nested
//! parentheses and single-quoted literals; they are split on top-level
//! commas and trimmed.

use mcds_types::TimeRange;
use tracing::trace;

use crate::{MacroError, MacroTable};

const PREFIX: &str = "$__";

pub fn interpolate(sql: &str, range: &TimeRange, macros: &MacroTable) -> Result<String, MacroError> {
    let mut out = String::with_capacity(sql.len());
    let mut rest = sql;

    while let Some(start) = rest.find(PREFIX) {
        out.push_str(&rest[..start]);
        let after = &rest[start + PREFIX.len()..];

        let name_len = after
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(after.len());
        let name = &after[..name_len];
        if name.is_empty() {
            out.push_str(PREFIX);
            rest = after;
            continue;
        }

        let tail = &after[name_len..];
        let (args, consumed) = if tail.starts_with('(') {
            let close =
                closing_paren(tail).ok_or_else(|| MacroError::Unterminated(name.to_string()))?;
            (split_args(&tail[1..close]), close + 1)
        } else {
            (Vec::new(), 0)
        };

        let expanded = macros.expand(name, range, &args)?;
        trace!(name, ?args, %expanded, "expanded macro");
        out.push_str(&expanded);
        rest = &tail[consumed..];
    }

    out.push_str(rest);
    Ok(out)
}

/// Byte offset of the `)` matching the `(` that opens `s`
fn closing_paren(s: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut quoted = false;

    for (idx, c) in s.char_indices() {
        match c {
            '\'' => quoted = !quoted,
            '(' if !quoted => depth += 1,
            ')' if !quoted => {
                depth -= 1;
                if depth == 0 {
                    return Some(idx);
                }
            }
            _ => {}
        }
    }
    None
}

fn split_args(inner: &str) -> Vec<String> {
    if inner.trim().is_empty() {
        return Vec::new();
    }

    let mut args = Vec::new();
    let mut depth = 0usize;
    let mut quoted = false;
    let mut start = 0;

    for (idx, c) in inner.char_indices() {
        match c {
            '\'' => quoted = !quoted,
            '(' if !quoted => depth += 1,
            ')' if !quoted => depth = depth.saturating_sub(1),
            ',' if !quoted && depth == 0 => {
                args.push(inner[start..idx].trim().to_string());
                start = idx + 1;
            }
            _ => {}
        }
    }
    args.push(inner[start..].trim().to_string());
    args
}
