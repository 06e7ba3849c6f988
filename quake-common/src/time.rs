//! Timestamp utilities
//!
//! Stored timestamps are fixed-width, zero-padded `YYYY/MM/DD HH:MM:SS`
//! strings (crowd reports append `.fff`). Because of the fixed width, plain
//! string comparison orders them chronologically.

pub use chrono::NaiveDateTime;

/// chrono format of the first 19 characters of a stored timestamp
pub const TIMESTAMP_FORMAT: &str = "%Y/%m/%d %H:%M:%S";

/// Length of the `YYYY/MM/DD HH:MM:SS` prefix
pub const TIMESTAMP_LEN: usize = 19;

/// Parse the `YYYY/MM/DD HH:MM:SS` prefix of a stored timestamp
///
/// Fractional seconds and anything else after the first 19 characters are
/// ignored. Returns `None` for shorter or malformed input.
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let prefix = value.get(..TIMESTAMP_LEN)?;
    NaiveDateTime::parse_from_str(prefix, TIMESTAMP_FORMAT).ok()
}
