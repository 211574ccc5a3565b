//! Boundary types for the beacon producers.
//!
//! The platform's monitoring API describes beacon families as region
//! descriptors; its ranging API reports live samples. Both are modeled here
//! as plain owned structs, and converted into [`BeaconInfo`] exactly once, at
//! this boundary. That is where platform placeholders ("unknown" accuracy)
//! become `None` and where the UUID gets its canonical string form.

pub mod json_lines;

use crate::beacon_info::BeaconInfo;
use crate::proximity::Proximity;
use crate::record::normalize_accuracy;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;
use uuid::Uuid;

/// Error types for reading beacon events.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SourceError {
    /// A line could not be decoded as an event
    #[error("Invalid event on line {line}: {reason}")]
    InvalidEvent { line: usize, reason: String },
    /// The input could not be opened or read
    #[error("Read error: {0}")]
    Io(String),
}

impl From<std::io::Error> for SourceError {
    fn from(err: std::io::Error) -> Self {
        SourceError::Io(err.to_string())
    }
}

/// Convenience alias for decoded events or decode errors.
pub type EventResult = Result<BeaconEvent, SourceError>;

/// Channel buffer size for event results.
pub const EVENT_CHANNEL_BUFFER_SIZE: usize = 100;

/// A beacon family the device is configured to watch for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionDescriptor {
    #[serde(rename = "uuid")]
    pub proximity_uuid: Uuid,
    pub identifier: String,
    /// Absent for regions matching every major value.
    #[serde(default)]
    pub major: Option<u16>,
    /// Absent for regions matching every minor value.
    #[serde(default)]
    pub minor: Option<u16>,
}

/// A live observation of one beacon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangingSample {
    #[serde(rename = "uuid")]
    pub proximity_uuid: Uuid,
    pub major: u16,
    pub minor: u16,
    /// Estimated distance in meters; negative when the platform cannot tell.
    pub accuracy: f64,
    pub proximity: Proximity,
    /// Signal strength in dBm.
    pub rssi: i64,
}

/// One callback delivery from either producer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BeaconEvent {
    Region(RegionDescriptor),
    Ranging(RangingSample),
}

/// Canonical string form of a beacon UUID: hyphenated, uppercase.
pub fn canonical_uuid(uuid: &Uuid) -> String {
    uuid.hyphenated()
        .encode_upper(&mut Uuid::encode_buffer())
        .to_string()
}

impl From<&RegionDescriptor> for BeaconInfo {
    fn from(region: &RegionDescriptor) -> Self {
        BeaconInfo {
            identifier: Some(region.identifier.clone()),
            ..BeaconInfo::new(
                canonical_uuid(&region.proximity_uuid),
                region.major.unwrap_or(0),
                region.minor.unwrap_or(0),
            )
        }
    }
}

impl From<&RangingSample> for BeaconInfo {
    fn from(sample: &RangingSample) -> Self {
        BeaconInfo {
            accuracy: normalize_accuracy(sample.accuracy),
            proximity: Some(sample.proximity),
            rssi: Some(sample.rssi),
            ..BeaconInfo::new(
                canonical_uuid(&sample.proximity_uuid),
                sample.major,
                sample.minor,
            )
        }
    }
}

impl From<&BeaconEvent> for BeaconInfo {
    fn from(event: &BeaconEvent) -> Self {
        match event {
            BeaconEvent::Region(region) => region.into(),
            BeaconEvent::Ranging(sample) => sample.into(),
        }
    }
}

/// Where events are read from.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Input {
    #[default]
    Stdin,
    File(PathBuf),
}

impl std::fmt::Display for Input {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Input::Stdin => write!(f, "-"),
            Input::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Parse an input argument. `-` means standard input.
pub fn parse_input(src: &str) -> Result<Input, String> {
    match src.trim() {
        "" => Err("empty input path".to_string()),
        "-" => Ok(Input::Stdin),
        path => Ok(Input::File(PathBuf::from(path))),
    }
}

/// Decode a single event from one line of JSON.
///
/// # Arguments
/// * `line` - 1-based line number, used in error messages
/// * `text` - The JSON object text
pub fn decode_event(line: usize, text: &str) -> EventResult {
    serde_json::from_str(text).map_err(|e| SourceError::InvalidEvent {
        line,
        reason: e.to_string(),
    })
}
