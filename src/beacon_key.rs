//! Identity triple for proximity beacons.
//!
//! A beacon is "the same beacon" across callbacks exactly when its
//! `(uuid, major, minor)` triple matches. This module gives that triple its own
//! hashable type so it can key lookup tables.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// The `(uuid, major, minor)` triple identifying one beacon.
///
/// The uuid is compared as an exact, case-sensitive string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BeaconKey {
    pub uuid: String,
    pub major: u16,
    pub minor: u16,
}

impl BeaconKey {
    pub fn new(uuid: impl Into<String>, major: u16, minor: u16) -> Self {
        Self {
            uuid: uuid.into(),
            major,
            minor,
        }
    }
}

impl fmt::Display for BeaconKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.uuid, self.major, self.minor)
    }
}

/// Errors returned when parsing a `UUID:major:minor` string.
#[derive(Error, Debug, PartialEq)]
pub enum ParseKeyError {
    #[error("invalid beacon key: expected UUID:major:minor")]
    MissingPart,
    #[error("invalid beacon key: uuid is empty")]
    EmptyUuid,
    #[error("invalid beacon key: '{0}' is not a 16-bit unsigned integer")]
    InvalidNumber(String),
}

impl FromStr for BeaconKey {
    type Err = ParseKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // The uuid itself never contains ':', so split from the right.
        let mut parts = s.rsplitn(3, ':');
        let minor = parts.next().ok_or(ParseKeyError::MissingPart)?;
        let major = parts.next().ok_or(ParseKeyError::MissingPart)?;
        let uuid = parts.next().ok_or(ParseKeyError::MissingPart)?;

        if uuid.is_empty() {
            return Err(ParseKeyError::EmptyUuid);
        }

        let parse = |part: &str| {
            part.parse::<u16>()
                .map_err(|_| ParseKeyError::InvalidNumber(part.to_string()))
        };

        Ok(BeaconKey {
            uuid: uuid.to_string(),
            major: parse(major)?,
            minor: parse(minor)?,
        })
    }
}
