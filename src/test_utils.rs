use crate::beacon_info::BeaconInfo;
use crate::proximity::Proximity;

/// A stable beacon family UUID for unit tests, in canonical uppercase form.
pub const TEST_UUID: &str = "E2C56DB5-DFFB-48D2-B060-D0F5A71096E0";

/// Build a `BeaconInfo` as a region descriptor would produce it.
pub fn region(uuid: &str, major: u16, minor: u16, identifier: &str) -> BeaconInfo {
    BeaconInfo {
        identifier: Some(identifier.to_string()),
        ..BeaconInfo::new(uuid, major, minor)
    }
}

/// Build a `BeaconInfo` as a ranging sample would produce it.
pub fn ranged(
    uuid: &str,
    major: u16,
    minor: u16,
    accuracy: f64,
    proximity: Proximity,
    rssi: i64,
) -> BeaconInfo {
    BeaconInfo {
        accuracy: Some(accuracy),
        proximity: Some(proximity),
        rssi: Some(rssi),
        ..BeaconInfo::new(uuid, major, minor)
    }
}

/// Build a fully populated composite.
pub fn composite(
    uuid: &str,
    major: u16,
    minor: u16,
    identifier: &str,
    accuracy: f64,
    proximity: Proximity,
    rssi: i64,
) -> BeaconInfo {
    BeaconInfo {
        identifier: Some(identifier.to_string()),
        ..ranged(uuid, major, minor, accuracy, proximity, rssi)
    }
}

/// Deterministic spread of valid accuracies: uniform values in `[0, 100)`
/// interleaved with arbitrary finite non-negative bit patterns.
pub fn accuracy_samples(count: usize) -> Vec<f64> {
    let mut state: u64 = 0x9E37_79B9_7F4A_7C15;
    let mut next = move || {
        // splitmix64
        state = state.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = state;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    };

    let mut samples = Vec::with_capacity(count);
    while samples.len() < count {
        let bits = next();
        let value = if samples.len() % 2 == 0 {
            (bits >> 11) as f64 / (1u64 << 53) as f64 * 100.0
        } else {
            f64::from_bits(bits >> 1)
        };
        if value.is_finite() {
            samples.push(value);
        }
    }
    samples
}
