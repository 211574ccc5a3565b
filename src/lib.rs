//! `beacon-info` library.
//!
//! Turns transient proximity-beacon observations into stable values that can
//! be compared, merged, ranked by distance and persisted. The core is
//! [`BeaconInfo`]; [`source`] converts platform region descriptors and ranging
//! samples into it, and [`tracker::BeaconTable`] keeps one merged composite
//! per beacon.
//!
//! The binary (`src/main.rs`) is responsible for CLI parsing and process exit
//! codes. The run loop lives in [`crate::app`] where it can be tested with an
//! injected event source and injected output streams.

pub mod app;
pub mod beacon_info;
pub mod beacon_key;
pub mod logging;
pub mod output;
pub mod proximity;
pub mod record;
pub mod source;
pub mod state;
pub mod throttle;
pub mod tracker;

#[cfg(test)]
mod test_utils;

// Re-export commonly used types at the crate root
pub use beacon_info::{BeaconInfo, IdentityMismatch, by_distance};
pub use beacon_key::{BeaconKey, ParseKeyError};
pub use output::{Format, FormatError, OutputFormatter};
pub use proximity::{ParseProximityError, Proximity};
pub use record::{BeaconRecord, MalformedRecord, RecordValue};
pub use source::{BeaconEvent, RangingSample, RegionDescriptor, SourceError};
pub use throttle::{Throttle, parse_duration};
pub use tracker::BeaconTable;
