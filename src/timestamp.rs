//! ISO-8601 UTC timestamp parsing/formatting for TIMESTAMP columns.

use crate::err_at;
use crate::error::{Error, Result};
use chrono::{DateTime, NaiveDateTime, Utc};

/// Parse an ISO-8601 timestamp (as produced by the pattern extractor's
/// `timestamp` kind) into UNIX seconds.
pub fn parse_unix_seconds(s: &str) -> Result<i64> {
    let trimmed = s.trim_end_matches('Z');
    let parsed = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S"));
    match parsed {
        Ok(naive) => Ok(naive.and_utc().timestamp()),
        Err(err) => err_at!(TimestampParseError, msg: "{}: {}", s, err),
    }
}

/// Format UNIX seconds back to ISO-8601 UTC (`%Y-%m-%dT%H:%M:%SZ`).
pub fn format_unix_seconds(secs: i64) -> String {
    let dt: DateTime<Utc> = DateTime::from_timestamp(secs, 0).unwrap_or_else(|| DateTime::from_timestamp(0, 0).unwrap());
    dt.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}
