//! Coarse proximity tiers reported by the ranging platform.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Bucketed distance classification of a ranged beacon.
///
/// The integer tags match the platform enumeration and are what the flat
/// record stores. Note that the tag order is not the distance order: use
/// [`Proximity::cmp_distance`] to rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Proximity {
    #[default]
    Unknown,
    Immediate,
    Near,
    Far,
}

/// Error returned when a proximity name or tag is not recognized.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("unknown proximity: {0}")]
pub struct ParseProximityError(pub String);

impl Proximity {
    /// Integer tag stored in the flat record.
    pub const fn tag(self) -> i64 {
        match self {
            Proximity::Unknown => 0,
            Proximity::Immediate => 1,
            Proximity::Near => 2,
            Proximity::Far => 3,
        }
    }

    /// Inverse of [`Proximity::tag`].
    pub fn from_tag(tag: i64) -> Option<Self> {
        match tag {
            0 => Some(Proximity::Unknown),
            1 => Some(Proximity::Immediate),
            2 => Some(Proximity::Near),
            3 => Some(Proximity::Far),
            _ => None,
        }
    }

    /// Position in the closest-first ranking. Unknown sorts last.
    const fn rank(self) -> u8 {
        match self {
            Proximity::Immediate => 0,
            Proximity::Near => 1,
            Proximity::Far => 2,
            Proximity::Unknown => 3,
        }
    }

    /// Compare two tiers, closest first.
    pub fn cmp_distance(self, other: Proximity) -> Ordering {
        self.rank().cmp(&other.rank())
    }
}

impl fmt::Display for Proximity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Proximity::Unknown => "unknown",
            Proximity::Immediate => "immediate",
            Proximity::Near => "near",
            Proximity::Far => "far",
        };
        f.write_str(name)
    }
}

impl FromStr for Proximity {
    type Err = ParseProximityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "unknown" => Ok(Proximity::Unknown),
            "immediate" => Ok(Proximity::Immediate),
            "near" => Ok(Proximity::Near),
            "far" => Ok(Proximity::Far),
            _ => Err(ParseProximityError(s.to_string())),
        }
    }
}
