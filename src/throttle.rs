//! Per-beacon output throttling.
//!
//! Ranging callbacks arrive about once a second for every beacon in range.
//! The throttle limits how often each individual beacon's composite is
//! written out, without holding back other beacons.

use crate::beacon_key::BeaconKey;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// A throttle that limits the rate of events per beacon.
///
/// Each beacon is tracked independently, allowing at most one event per
/// `interval`. The first event for a beacon is always allowed.
///
/// One timestamp is kept per beacon ever allowed through. Call
/// [`Throttle::forget`] when a beacon stops being tracked, or
/// [`Throttle::prune`] periodically on long runs.
#[derive(Debug)]
pub struct Throttle {
    interval: Duration,
    last_emitted: HashMap<BeaconKey, Instant>,
}

impl Throttle {
    /// Create a new throttle with the specified minimum interval between events.
    ///
    /// # Example
    /// ```
    /// use std::time::Duration;
    /// use beacon_info::throttle::Throttle;
    ///
    /// let throttle = Throttle::new(Duration::from_secs(3));
    /// ```
    pub fn new(interval: Duration) -> Self {
        Throttle {
            interval,
            last_emitted: HashMap::new(),
        }
    }

    /// Check if an event for the given beacon should be allowed.
    ///
    /// Returns `true` if at least `interval` has passed since the last allowed
    /// event for this beacon, or if this is its first event. Only allowed
    /// events restart the beacon's timer.
    pub fn should_emit(&mut self, key: &BeaconKey) -> bool {
        let now = Instant::now();

        match self.last_emitted.get(key) {
            Some(last) if now.duration_since(*last) < self.interval => false,
            _ => {
                self.last_emitted.insert(key.clone(), now);
                true
            }
        }
    }

    /// Drop the timer for a beacon; its next event is allowed.
    pub fn forget(&mut self, key: &BeaconKey) {
        self.last_emitted.remove(key);
    }

    /// Drop every timer whose interval has already elapsed. Those beacons
    /// would be allowed through anyway, so behavior is unchanged.
    pub fn prune(&mut self) {
        let now = Instant::now();
        let interval = self.interval;
        self.last_emitted.retain(|_, last| now.duration_since(*last) < interval);
    }

    /// Number of beacons with a running timer.
    pub fn tracked(&self) -> usize {
        self.last_emitted.len()
    }
}

/// Parse a duration from a human-readable string.
///
/// Supports `ms`, `s`, `m` and `h` suffixes. A bare number is seconds.
///
/// # Examples
/// ```
/// use beacon_info::throttle::parse_duration;
/// use std::time::Duration;
///
/// assert_eq!(parse_duration("3s").unwrap(), Duration::from_secs(3));
/// assert_eq!(parse_duration("1m").unwrap(), Duration::from_secs(60));
/// assert_eq!(parse_duration("500ms").unwrap(), Duration::from_millis(500));
/// ```
pub fn parse_duration(src: &str) -> Result<Duration, String> {
    // "ms" has to be tried before "m" and "s".
    const UNITS: [(&str, &str, u64); 4] = [
        ("ms", "milliseconds", 1),
        ("h", "hours", 3_600_000),
        ("m", "minutes", 60_000),
        ("s", "seconds", 1_000),
    ];

    let src = src.trim();
    if src.is_empty() {
        return Err("empty duration string".to_string());
    }

    let (number, unit, millis_per_unit) = UNITS
        .iter()
        .find_map(|(suffix, unit, millis)| {
            src.strip_suffix(suffix).map(|n| (n.trim(), *unit, *millis))
        })
        .unwrap_or((src, "seconds", 1_000));

    let value: u64 = number
        .parse()
        .map_err(|_| format!("invalid {unit}: {number}"))?;

    value
        .checked_mul(millis_per_unit)
        .map(Duration::from_millis)
        .ok_or_else(|| format!("duration too large: {src}"))
}
