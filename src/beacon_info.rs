//! Stable beacon identity value object.
//!
//! The ranging platform hands out fresh objects on every callback, so two
//! observations of the same physical beacon never share an address. A
//! [`BeaconInfo`] captures the fields of one observation in an owned value
//! whose equality and hash depend only on the `(uuid, major, minor)` triple.
//! Region descriptors contribute the `identifier`; ranging samples contribute
//! `accuracy`, `proximity` and `rssi`. Merging one into the other yields a
//! composite record carrying both.

use crate::beacon_key::BeaconKey;
use crate::proximity::Proximity;
use std::cmp::Ordering;
use std::hash::{Hash, Hasher};
use thiserror::Error;
use tracing::{debug, warn};

/// A normalized snapshot (or merged composite) of one beacon.
///
/// Equality and hashing consider only `uuid`, `major` and `minor`. Two values
/// with the same triple are the same beacon even if every other field differs.
/// Use [`BeaconInfo::same_fields`] to compare field-for-field.
///
/// `BeaconInfo` deliberately does not implement `Ord`: distance ranking is
/// not consistent with identity equality. Sort with
/// [`BeaconInfo::compare_by_distance`] instead.
#[derive(Debug, Clone)]
pub struct BeaconInfo {
    /// Canonical string form of the beacon family UUID.
    pub uuid: String,
    /// Region label. Only set from a region descriptor.
    pub identifier: Option<String>,
    pub major: u16,
    pub minor: u16,
    /// Estimated distance in meters. Only set from a ranging sample, and never
    /// holds the platform's "unknown" placeholder.
    pub accuracy: Option<f64>,
    /// Only set from a ranging sample.
    pub proximity: Option<Proximity>,
    /// Signal strength in dBm. Only set from a ranging sample.
    pub rssi: Option<i64>,
}

/// Returned by [`BeaconInfo::try_merge_with_new_info`] when the incoming
/// record describes a different beacon.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("cannot merge beacon {incoming} into {existing}")]
pub struct IdentityMismatch {
    pub existing: BeaconKey,
    pub incoming: BeaconKey,
}

impl BeaconInfo {
    /// Create a record carrying only identity fields.
    pub fn new(uuid: impl Into<String>, major: u16, minor: u16) -> Self {
        Self {
            uuid: uuid.into(),
            identifier: None,
            major,
            minor,
            accuracy: None,
            proximity: None,
            rssi: None,
        }
    }

    /// The identity triple of this record.
    pub fn key(&self) -> BeaconKey {
        BeaconKey::new(self.uuid.clone(), self.major, self.minor)
    }

    /// Whether `other` has the same `(uuid, major, minor)` triple.
    pub fn same_identity(&self, other: &BeaconInfo) -> bool {
        self.uuid == other.uuid && self.major == other.major && self.minor == other.minor
    }

    /// Field-for-field comparison, including the optional fields.
    pub fn same_fields(&self, other: &BeaconInfo) -> bool {
        self.same_identity(other)
            && self.identifier == other.identifier
            && self.accuracy == other.accuracy
            && self.proximity == other.proximity
            && self.rssi == other.rssi
    }

    /// Whether any ranging-sample field is present.
    pub fn is_ranged(&self) -> bool {
        self.accuracy.is_some() || self.proximity.is_some() || self.rssi.is_some()
    }

    /// Whether the region label is present.
    pub fn is_region(&self) -> bool {
        self.identifier.is_some()
    }

    /// Fold the fields of a newer observation into this record.
    ///
    /// Every optional field present on `new_info` overwrites the field here;
    /// fields absent on `new_info` are left alone. The identity fields are
    /// always taken from `new_info`.
    ///
    /// The identity of `new_info` is not checked. Merging a different beacon
    /// replaces this record's identity; a warning is logged when that happens.
    /// Use [`BeaconInfo::try_merge_with_new_info`] to reject such merges.
    ///
    /// Merging reads and writes several fields non-atomically. Shared
    /// composites need external synchronization.
    pub fn merge_with_new_info(&mut self, new_info: &BeaconInfo) {
        if !self.same_identity(new_info) {
            warn!(
                existing = %self.key(),
                incoming = %new_info.key(),
                "merging beacon with a different identity"
            );
        }

        self.uuid.clone_from(&new_info.uuid);
        self.major = new_info.major;
        self.minor = new_info.minor;

        if let Some(identifier) = &new_info.identifier {
            self.identifier = Some(identifier.clone());
        }
        if new_info.accuracy.is_some() {
            self.accuracy = new_info.accuracy;
        }
        if new_info.proximity.is_some() {
            self.proximity = new_info.proximity;
        }
        if new_info.rssi.is_some() {
            self.rssi = new_info.rssi;
        }

        debug!(beacon = %self.key(), "merged beacon info");
    }

    /// Like [`BeaconInfo::merge_with_new_info`], but leaves this record
    /// untouched and fails when `new_info` has a different identity triple.
    pub fn try_merge_with_new_info(
        &mut self,
        new_info: &BeaconInfo,
    ) -> Result<(), IdentityMismatch> {
        if !self.same_identity(new_info) {
            return Err(IdentityMismatch {
                existing: self.key(),
                incoming: new_info.key(),
            });
        }
        self.merge_with_new_info(new_info);
        Ok(())
    }

    /// Compare by estimated distance.
    ///
    /// Returns `Ordering::Less` if this beacon is closer than `other`. The
    /// proximity tier decides first (`immediate < near < far < unknown`, with
    /// a missing tier treated as unknown). Within a tier the smaller accuracy
    /// wins, and a missing accuracy sorts after any concrete value.
    ///
    /// This may not reflect real-world distance: transmit power, interference
    /// and room layout all skew the estimate. Comparisons between beacons in
    /// closer tiers are more likely to be right.
    pub fn compare_by_distance(&self, other: &BeaconInfo) -> Ordering {
        let tier = |info: &BeaconInfo| info.proximity.unwrap_or(Proximity::Unknown);

        tier(self)
            .cmp_distance(tier(other))
            .then_with(|| match (self.accuracy, other.accuracy) {
                (Some(a), Some(b)) => a.total_cmp(&b),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            })
    }
}

impl PartialEq for BeaconInfo {
    fn eq(&self, other: &Self) -> bool {
        self.same_identity(other)
    }
}

impl Eq for BeaconInfo {}

impl Hash for BeaconInfo {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.uuid.hash(state);
        self.major.hash(state);
        self.minor.hash(state);
    }
}

/// Closest-first ordering for use with `sort_by`.
pub fn by_distance(a: &BeaconInfo, b: &BeaconInfo) -> Ordering {
    a.compare_by_distance(b)
}
