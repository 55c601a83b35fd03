//! Lenient column readers.
//!
//! Rows may have been written by older clients or edited by hand, so stored
//! values are read as raw SQLite values and coerced here instead of failing
//! the whole query on one bad cell.

use chrono::NaiveDate;
use rusqlite::types::Value as SqlValue;

use crate::models::Vnd;

/// Text content of a cell. Numbers are rendered; NULL and blobs give `None`.
pub(super) fn text(value: &SqlValue) -> Option<String> {
    match value {
        SqlValue::Text(s) => Some(s.clone()),
        SqlValue::Integer(n) => Some(n.to_string()),
        SqlValue::Real(n) => Some(n.to_string()),
        SqlValue::Null | SqlValue::Blob(_) => None,
    }
}

/// `YYYY-MM-DD` date, also accepted as the prefix of a full timestamp.
pub(super) fn date(value: &SqlValue) -> Option<NaiveDate> {
    let SqlValue::Text(s) = value else {
        return None;
    };
    let trimmed = s.trim();
    let date_part = trimmed.get(..10).unwrap_or(trimmed);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

/// Money amount; anything unreadable counts as 0. Fractions truncate.
pub(super) fn money(value: &SqlValue) -> Vnd {
    match value {
        SqlValue::Integer(n) => *n,
        SqlValue::Real(n) if n.is_finite() => n.trunc() as Vnd,
        SqlValue::Text(s) => {
            let s = s.trim();
            s.parse::<Vnd>()
                .ok()
                .or_else(|| {
                    s.parse::<f64>()
                        .ok()
                        .filter(|n| n.is_finite())
                        .map(|n| n.trunc() as Vnd)
                })
                .unwrap_or(0)
        }
        _ => 0,
    }
}

/// Boolean flag; only a non-zero number or `"true"` counts as set.
pub(super) fn flag(value: &SqlValue) -> bool {
    match value {
        SqlValue::Integer(n) => *n != 0,
        SqlValue::Real(n) => *n != 0.0,
        SqlValue::Text(s) => {
            let s = s.trim();
            s.eq_ignore_ascii_case("true") || s.parse::<i64>().is_ok_and(|n| n != 0)
        }
        _ => false,
    }
}
