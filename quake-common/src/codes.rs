//! Record codes and bulletin enumerations
//!
//! Every stored document carries an integer `code` naming its kind. Agency
//! bulletins and crowd reports share one collection and are told apart only
//! by this code.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Agency earthquake bulletin
pub const QUAKE: i64 = 551;
/// Agency tsunami bulletin
pub const TSUNAMI: i64 = 552;
/// Crowd "felt it" report
pub const USER_QUAKE: i64 = 561;
/// Earthquake bulletin evaluation entry in the history log
pub const QUAKE_EVALUATION: i64 = 5510;
/// Tsunami bulletin evaluation entry in the history log
pub const TSUNAMI_EVALUATION: i64 = 5520;
/// Cluster of crowd reports, synthesized at query time and never stored
pub const USER_QUAKE_CLUSTER: i64 = 5610;
/// Last-evaluation marker
pub const LAST_EVALUATION: i64 = 9611;

/// Seismic intensity scale values accepted by scale filters
///
/// The numeric value is the one stored in documents (e.g. 45 = 5-lower).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Scale(i64);

impl Scale {
    /// All valid scale values in ascending order
    pub const VALUES: [i64; 9] = [10, 20, 30, 40, 45, 50, 55, 60, 70];

    /// Create a scale, rejecting values outside the enumeration
    pub fn new(value: i64) -> Option<Self> {
        Self::VALUES.contains(&value).then_some(Self(value))
    }

    /// Stored numeric value
    pub fn value(self) -> i64 {
        self.0
    }
}

impl TryFrom<i64> for Scale {
    type Error = String;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Scale::new(value).ok_or_else(|| format!("invalid scale: {}", value))
    }
}

impl From<Scale> for i64 {
    fn from(scale: Scale) -> Self {
        scale.0
    }
}

/// Issue type of an earthquake bulletin (`issue.type`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QuakeType {
    ScalePrompt,
    Destination,
    ScaleAndDestination,
    DetailScale,
    Foreign,
    Other,
}

impl QuakeType {
    pub const ALL: [QuakeType; 6] = [
        QuakeType::ScalePrompt,
        QuakeType::Destination,
        QuakeType::ScaleAndDestination,
        QuakeType::DetailScale,
        QuakeType::Foreign,
        QuakeType::Other,
    ];

    /// Tag as stored in documents
    pub fn as_str(self) -> &'static str {
        match self {
            QuakeType::ScalePrompt => "ScalePrompt",
            QuakeType::Destination => "Destination",
            QuakeType::ScaleAndDestination => "ScaleAndDestination",
            QuakeType::DetailScale => "DetailScale",
            QuakeType::Foreign => "Foreign",
            QuakeType::Other => "Other",
        }
    }
}

impl fmt::Display for QuakeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuakeType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        QuakeType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("invalid quake type: {}", s))
    }
}
