//! Caller-side tracking table of beacon composites.
//!
//! Holds one long-lived [`BeaconInfo`] per identity triple and folds every
//! new snapshot into it. The table is owned by a single caller and mutated
//! through `&mut self`, which keeps merges on one composite serialized.

use crate::beacon_info::BeaconInfo;
use crate::beacon_key::BeaconKey;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use tracing::debug;

/// Up-to-date composites keyed by identity.
#[derive(Debug, Clone, Default)]
pub struct BeaconTable {
    beacons: HashMap<BeaconKey, BeaconInfo>,
}

impl BeaconTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge a snapshot into the composite for its beacon, creating the
    /// composite on first sight. Returns the updated composite.
    pub fn observe(&mut self, snapshot: BeaconInfo) -> &BeaconInfo {
        match self.beacons.entry(snapshot.key()) {
            Entry::Occupied(entry) => {
                let composite = entry.into_mut();
                composite.merge_with_new_info(&snapshot);
                composite
            }
            Entry::Vacant(entry) => {
                debug!(beacon = %entry.key(), "tracking new beacon");
                entry.insert(snapshot)
            }
        }
    }

    pub fn get(&self, key: &BeaconKey) -> Option<&BeaconInfo> {
        self.beacons.get(key)
    }

    /// Stop tracking a beacon, e.g. after it leaves range.
    pub fn remove(&mut self, key: &BeaconKey) -> Option<BeaconInfo> {
        self.beacons.remove(key)
    }

    pub fn clear(&mut self) {
        self.beacons.clear();
    }

    pub fn len(&self) -> usize {
        self.beacons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.beacons.is_empty()
    }

    /// Composites in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &BeaconInfo> {
        self.beacons.values()
    }

    /// Composites sorted closest first.
    ///
    /// Beacons at an equal distance are ordered by identity so the result is
    /// deterministic.
    pub fn ranked(&self) -> Vec<&BeaconInfo> {
        let mut ranked: Vec<&BeaconInfo> = self.beacons.values().collect();
        ranked.sort_by(|a, b| rank(a, b));
        ranked
    }

    /// The closest tracked beacon, if any.
    pub fn nearest(&self) -> Option<&BeaconInfo> {
        self.beacons.values().min_by(|a, b| rank(a, b))
    }
}

fn rank(a: &BeaconInfo, b: &BeaconInfo) -> Ordering {
    a.compare_by_distance(b)
        .then_with(|| (&a.uuid, a.major, a.minor).cmp(&(&b.uuid, b.major, b.minor)))
}

impl FromIterator<BeaconInfo> for BeaconTable {
    fn from_iter<I: IntoIterator<Item = BeaconInfo>>(iter: I) -> Self {
        let mut table = BeaconTable::new();
        for info in iter {
            table.observe(info);
        }
        table
    }
}
