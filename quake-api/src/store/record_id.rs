//! Store-native record identifiers

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Number of hex digits in an identifier (12 bytes)
pub const RECORD_ID_LEN: usize = 24;

/// 24-hex-digit document identifier, held in lowercase
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordId(String);

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid record id: {0:?}")]
pub struct InvalidRecordId(pub String);

impl RecordId {
    pub fn parse(value: &str) -> Result<Self, InvalidRecordId> {
        if value.len() == RECORD_ID_LEN && value.bytes().all(|b| b.is_ascii_hexdigit()) {
            Ok(Self(value.to_ascii_lowercase()))
        } else {
            Err(InvalidRecordId(value.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for RecordId {
    type Err = InvalidRecordId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
