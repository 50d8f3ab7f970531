use crate::{Error, Result};
use chrono::{DateTime, Utc};
use std::path::Path;

/// Seconds since the Unix epoch; sub-second precision is dropped.
pub fn to_unix_seconds(dt: &DateTime<Utc>) -> i64 {
    dt.timestamp()
}

pub fn from_unix_seconds(secs: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp(secs, 0).ok_or(Error::InvalidTimestamp(secs))
}

/// Parse a user-supplied timestamp: RFC 3339, `YYYY-MM-DD HH:MM:SS` (UTC)
/// or plain unix seconds.
pub fn parse_timestamp(input: &str) -> Option<DateTime<Utc>> {
    let input = input.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(input, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc());
    }
    input
        .parse::<i64>()
        .ok()
        .and_then(|secs| from_unix_seconds(secs).ok())
}

/// File name component of a path, or an empty string when there is none.
pub fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}
