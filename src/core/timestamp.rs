// LogSlice - core/timestamp.rs
//
// Timestamp codec: parses the leading instant of a segment line and compares
// instants. Everything is normalised to UTC before comparison so records
// written with different offsets still order correctly.

use crate::util::constants::DEBUG_MAX_LINE_PREVIEW;
use crate::util::error::TimestampError;
use chrono::{DateTime, NaiveDateTime, Utc};
use std::cmp::Ordering;

/// Naive layouts accepted after RFC 3339. A missing offset means UTC.
/// `%.f` also matches when the fractional part is absent.
const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Parse an instant.
///
/// Accepts RFC 3339 with `Z` or a numeric offset, then the naive layouts in
/// `NAIVE_FORMATS`. Surrounding whitespace is ignored.
pub fn parse_instant(text: &str) -> Result<DateTime<Utc>, TimestampError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(TimestampError::Empty);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.with_timezone(&Utc));
    }

    for format in NAIVE_FORMATS {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(ndt.and_utc());
        }
    }

    Err(TimestampError::Invalid {
        raw: preview(trimmed),
    })
}

/// Total order over instants.
pub fn compare(a: &DateTime<Utc>, b: &DateTime<Utc>) -> Ordering {
    a.cmp(b)
}

/// The timestamp field of a segment line: everything before the first comma,
/// or the whole line when it has none.
pub fn leading_field(line: &str) -> &str {
    line.split_once(',').map_or(line, |(field, _)| field)
}

/// Parse the instant a segment line starts with.
pub fn line_instant(line: &str) -> Result<DateTime<Utc>, TimestampError> {
    parse_instant(leading_field(line))
}

fn preview(raw: &str) -> String {
    match raw.char_indices().nth(DEBUG_MAX_LINE_PREVIEW) {
        Some((cut, _)) => format!("{}...", &raw[..cut]),
        None => raw.to_string(),
    }
}
