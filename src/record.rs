//! Flat key-value record form of [`BeaconInfo`].
//!
//! This is the persisted/transported layout: a single-level mapping from
//! field name to value, with absent optional fields omitted entirely. Keys
//! are `uuid`, `identifier`, `major`, `minor`, `accuracy`, `proximity` (the
//! integer tag) and `rssi`. Unknown keys are ignored on decode so consumers
//! tolerate additive changes.
//!
//! `BeaconInfo` serializes through this record, so its serde form (for
//! example, its JSON) is exactly the flat mapping.

use crate::beacon_info::BeaconInfo;
use crate::proximity::Proximity;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

pub const KEY_UUID: &str = "uuid";
pub const KEY_IDENTIFIER: &str = "identifier";
pub const KEY_MAJOR: &str = "major";
pub const KEY_MINOR: &str = "minor";
pub const KEY_ACCURACY: &str = "accuracy";
pub const KEY_PROXIMITY: &str = "proximity";
pub const KEY_RSSI: &str = "rssi";

/// A single value in a flat record.
///
/// Known keys only ever hold `Integer`, `Real` or `String`. `Other` keeps
/// whatever an unknown key carries (booleans, null, arrays, nested objects)
/// so that decoding the mapping never fails on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordValue {
    Integer(i64),
    Real(f64),
    String(String),
    Other(serde_json::Value),
}

impl RecordValue {
    fn kind(&self) -> &'static str {
        match self {
            RecordValue::Integer(_) => "an integer",
            RecordValue::Real(_) => "a real number",
            RecordValue::String(_) => "a string",
            RecordValue::Other(serde_json::Value::Null) => "null",
            RecordValue::Other(serde_json::Value::Bool(_)) => "a boolean",
            RecordValue::Other(serde_json::Value::Array(_)) => "an array",
            RecordValue::Other(serde_json::Value::Object(_)) => "an object",
            RecordValue::Other(_) => "a number",
        }
    }
}

impl fmt::Display for RecordValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordValue::Integer(i) => write!(f, "{i}"),
            RecordValue::Real(r) => write!(f, "{r}"),
            RecordValue::String(s) => write!(f, "\"{s}\""),
            RecordValue::Other(value) => write!(f, "{value}"),
        }
    }
}

/// Flat mapping of field name to value.
pub type BeaconRecord = BTreeMap<String, RecordValue>;

/// Decoding a record failed. No partially decoded value is produced.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MalformedRecord {
    #[error("malformed record: missing required key `{0}`")]
    MissingKey(&'static str),
    #[error("malformed record: `{key}` must be {expected}, got {found}")]
    InvalidValue {
        key: &'static str,
        expected: &'static str,
        found: String,
    },
    #[error("malformed record: {0}")]
    Json(String),
}

impl From<serde_json::Error> for MalformedRecord {
    fn from(err: serde_json::Error) -> Self {
        MalformedRecord::Json(err.to_string())
    }
}

fn invalid(key: &'static str, expected: &'static str, found: &RecordValue) -> MalformedRecord {
    MalformedRecord::InvalidValue {
        key,
        expected,
        found: format!("{} ({found})", found.kind()),
    }
}

fn required<'a>(
    record: &'a BeaconRecord,
    key: &'static str,
) -> Result<&'a RecordValue, MalformedRecord> {
    record.get(key).ok_or(MalformedRecord::MissingKey(key))
}

fn as_string(key: &'static str, value: &RecordValue) -> Result<String, MalformedRecord> {
    match value {
        RecordValue::String(s) => Ok(s.clone()),
        other => Err(invalid(key, "a string", other)),
    }
}

fn as_u16(key: &'static str, value: &RecordValue) -> Result<u16, MalformedRecord> {
    match value {
        RecordValue::Integer(i) => {
            u16::try_from(*i).map_err(|_| invalid(key, "an integer in 0..=65535", value))
        }
        other => Err(invalid(key, "an integer in 0..=65535", other)),
    }
}

fn as_integer(key: &'static str, value: &RecordValue) -> Result<i64, MalformedRecord> {
    match value {
        RecordValue::Integer(i) => Ok(*i),
        other => Err(invalid(key, "an integer", other)),
    }
}

fn as_accuracy(value: &RecordValue) -> Result<Option<f64>, MalformedRecord> {
    let meters = match value {
        RecordValue::Real(r) => *r,
        // Whole-meter accuracies come back from JSON as integers.
        RecordValue::Integer(i) => *i as f64,
        other => return Err(invalid(KEY_ACCURACY, "a number", other)),
    };
    Ok(normalize_accuracy(meters))
}

/// Map the platform's "unknown distance" placeholder (any negative or
/// non-finite value) to `None`.
pub fn normalize_accuracy(meters: f64) -> Option<f64> {
    (meters.is_finite() && meters >= 0.0).then_some(meters)
}

impl BeaconInfo {
    /// Encode as a flat record, omitting absent optional fields.
    ///
    /// An accuracy holding the "unknown distance" placeholder is omitted as
    /// well, since it decodes as absent.
    pub fn plist_object(&self) -> BeaconRecord {
        let mut record = BeaconRecord::new();

        record.insert(KEY_UUID.into(), RecordValue::String(self.uuid.clone()));
        record.insert(KEY_MAJOR.into(), RecordValue::Integer(i64::from(self.major)));
        record.insert(KEY_MINOR.into(), RecordValue::Integer(i64::from(self.minor)));

        if let Some(identifier) = &self.identifier {
            record.insert(KEY_IDENTIFIER.into(), RecordValue::String(identifier.clone()));
        }
        if let Some(accuracy) = self.accuracy.and_then(normalize_accuracy) {
            record.insert(KEY_ACCURACY.into(), RecordValue::Real(accuracy));
        }
        if let Some(proximity) = self.proximity {
            record.insert(KEY_PROXIMITY.into(), RecordValue::Integer(proximity.tag()));
        }
        if let Some(rssi) = self.rssi {
            record.insert(KEY_RSSI.into(), RecordValue::Integer(rssi));
        }

        record
    }

    /// Decode a flat record produced by [`BeaconInfo::plist_object`].
    ///
    /// # Errors
    /// Returns [`MalformedRecord`] if `uuid`, `major` or `minor` is missing, or
    /// if any known key holds a value of the wrong type or range.
    pub fn from_plist_object(record: &BeaconRecord) -> Result<Self, MalformedRecord> {
        let uuid = as_string(KEY_UUID, required(record, KEY_UUID)?)?;
        let major = as_u16(KEY_MAJOR, required(record, KEY_MAJOR)?)?;
        let minor = as_u16(KEY_MINOR, required(record, KEY_MINOR)?)?;

        let identifier = record
            .get(KEY_IDENTIFIER)
            .map(|v| as_string(KEY_IDENTIFIER, v))
            .transpose()?;

        let accuracy = match record.get(KEY_ACCURACY) {
            Some(v) => as_accuracy(v)?,
            None => None,
        };

        let proximity = record
            .get(KEY_PROXIMITY)
            .map(|v| {
                as_integer(KEY_PROXIMITY, v).and_then(|tag| {
                    Proximity::from_tag(tag)
                        .ok_or_else(|| invalid(KEY_PROXIMITY, "a tag in 0..=3", v))
                })
            })
            .transpose()?;

        let rssi = record
            .get(KEY_RSSI)
            .map(|v| as_integer(KEY_RSSI, v))
            .transpose()?;

        Ok(BeaconInfo {
            uuid,
            identifier,
            major,
            minor,
            accuracy,
            proximity,
            rssi,
        })
    }

    /// Encode as a JSON object string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.plist_object())
    }

    /// Decode a JSON object string.
    pub fn from_json(json: &str) -> Result<Self, MalformedRecord> {
        let record: BeaconRecord = serde_json::from_str(json)?;
        Self::from_plist_object(&record)
    }
}

impl From<BeaconInfo> for BeaconRecord {
    fn from(info: BeaconInfo) -> Self {
        info.plist_object()
    }
}

impl TryFrom<BeaconRecord> for BeaconInfo {
    type Error = MalformedRecord;

    fn try_from(record: BeaconRecord) -> Result<Self, Self::Error> {
        BeaconInfo::from_plist_object(&record)
    }
}

impl Serialize for BeaconInfo {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.plist_object().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for BeaconInfo {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let record = BeaconRecord::deserialize(deserializer)?;
        BeaconInfo::from_plist_object(&record).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{TEST_UUID, accuracy_samples, composite, ranged, region};

    fn lobby_record() -> BeaconRecord {
        composite("A1", 1, 5, "lobby", 2.3, Proximity::Near, -60).plist_object()
    }

    #[test]
    fn test_composite_encodes_all_seven_keys() {
        let record = lobby_record();

        assert_eq!(record.len(), 7);
        assert_eq!(record["uuid"], RecordValue::String("A1".into()));
        assert_eq!(record["identifier"], RecordValue::String("lobby".into()));
        assert_eq!(record["major"], RecordValue::Integer(1));
        assert_eq!(record["minor"], RecordValue::Integer(5));
        assert_eq!(record["accuracy"], RecordValue::Real(2.3));
        assert_eq!(record["proximity"], RecordValue::Integer(2));
        assert_eq!(record["rssi"], RecordValue::Integer(-60));
    }

    #[test]
    fn test_composite_round_trip() {
        let original = composite("A1", 1, 5, "lobby", 2.3, Proximity::Near, -60);
        let decoded = BeaconInfo::from_plist_object(&original.plist_object()).unwrap();
        assert!(decoded.same_fields(&original));
    }

    #[test]
    fn test_absent_fields_are_omitted() {
        let record = region(TEST_UUID, 1, 5, "lobby").plist_object();
        let keys: Vec<&str> = record.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["identifier", "major", "minor", "uuid"]);

        let record = ranged(TEST_UUID, 1, 5, 2.3, Proximity::Far, -70).plist_object();
        assert!(!record.contains_key("identifier"));
        assert_eq!(record.len(), 6);
    }

    #[test]
    fn test_partial_records_round_trip() {
        for info in [
            BeaconInfo::new(TEST_UUID, 0, 0),
            region(TEST_UUID, 65535, 65535, ""),
            ranged(TEST_UUID, 1, 5, 0.0, Proximity::Unknown, 0),
            BeaconInfo {
                rssi: Some(-100),
                ..BeaconInfo::new(TEST_UUID, 3, 4)
            },
        ] {
            let decoded = BeaconInfo::from_plist_object(&info.plist_object()).unwrap();
            assert!(decoded.same_fields(&info), "{info:?} != {decoded:?}");
        }
    }

    #[test]
    fn test_missing_required_key_is_malformed() {
        for key in [KEY_UUID, KEY_MAJOR, KEY_MINOR] {
            let mut record = lobby_record();
            record.remove(key);
            assert_eq!(
                BeaconInfo::from_plist_object(&record),
                Err(MalformedRecord::MissingKey(key))
            );
        }
    }

    #[test]
    fn test_missing_minor_error_message() {
        let mut record = lobby_record();
        record.remove("minor");
        let err = BeaconInfo::from_plist_object(&record).unwrap_err();
        assert_eq!(err.to_string(), "malformed record: missing required key `minor`");
    }

    #[test]
    fn test_unknown_keys_are_ignored() {
        let mut record = lobby_record();
        record.insert("battery".into(), RecordValue::Integer(87));
        record.insert("vendor".into(), RecordValue::String("acme".into()));

        let decoded = BeaconInfo::from_plist_object(&record).unwrap();
        assert!(decoded.same_fields(&BeaconInfo::from_plist_object(&lobby_record()).unwrap()));
    }

    #[test]
    fn test_wrong_types_are_malformed() {
        let mut record = lobby_record();
        record.insert("major".into(), RecordValue::String("1".into()));
        assert!(matches!(
            BeaconInfo::from_plist_object(&record),
            Err(MalformedRecord::InvalidValue { key: "major", .. })
        ));

        let mut record = lobby_record();
        record.insert("uuid".into(), RecordValue::Integer(1));
        assert!(matches!(
            BeaconInfo::from_plist_object(&record),
            Err(MalformedRecord::InvalidValue { key: "uuid", .. })
        ));

        let mut record = lobby_record();
        record.insert("rssi".into(), RecordValue::Real(-60.5));
        assert!(matches!(
            BeaconInfo::from_plist_object(&record),
            Err(MalformedRecord::InvalidValue { key: "rssi", .. })
        ));
    }

    #[test]
    fn test_out_of_range_values_are_malformed() {
        let mut record = lobby_record();
        record.insert("minor".into(), RecordValue::Integer(65536));
        assert!(matches!(
            BeaconInfo::from_plist_object(&record),
            Err(MalformedRecord::InvalidValue { key: "minor", .. })
        ));

        let mut record = lobby_record();
        record.insert("proximity".into(), RecordValue::Integer(7));
        assert!(matches!(
            BeaconInfo::from_plist_object(&record),
            Err(MalformedRecord::InvalidValue { key: "proximity", .. })
        ));
    }

    #[test]
    fn test_placeholder_accuracy_decodes_as_absent() {
        let mut record = lobby_record();
        record.insert("accuracy".into(), RecordValue::Real(-1.0));
        let decoded = BeaconInfo::from_plist_object(&record).unwrap();
        assert_eq!(decoded.accuracy, None);
    }

    #[test]
    fn test_normalize_accuracy() {
        assert_eq!(normalize_accuracy(-1.0), None);
        assert_eq!(normalize_accuracy(f64::NAN), None);
        assert_eq!(normalize_accuracy(f64::INFINITY), None);
        assert_eq!(normalize_accuracy(0.0), Some(0.0));
        assert_eq!(normalize_accuracy(12.5), Some(12.5));
    }

    #[test]
    fn test_json_round_trip() {
        let original = composite("A1", 1, 5, "lobby", 2.3, Proximity::Near, -60);
        let json = original.to_json().unwrap();
        assert_eq!(
            json,
            r#"{"accuracy":2.3,"identifier":"lobby","major":1,"minor":5,"proximity":2,"rssi":-60,"uuid":"A1"}"#
        );
        assert!(BeaconInfo::from_json(&json).unwrap().same_fields(&original));
    }

    #[test]
    fn test_json_round_trip_preserves_every_accuracy() {
        for accuracy in accuracy_samples(20_000) {
            let info = ranged(TEST_UUID, 1, 5, accuracy, Proximity::Near, -60);
            let decoded = BeaconInfo::from_json(&info.to_json().unwrap()).unwrap();
            assert_eq!(
                decoded.accuracy.map(f64::to_bits),
                Some(accuracy.to_bits()),
                "accuracy {accuracy:?} decoded as {:?}",
                decoded.accuracy
            );
        }
    }

    #[test]
    fn test_placeholder_accuracy_is_not_encoded() {
        for placeholder in [-1.0, f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let info = BeaconInfo {
                accuracy: Some(placeholder),
                ..ranged(TEST_UUID, 1, 5, 0.0, Proximity::Unknown, 0)
            };

            let record = info.plist_object();
            assert!(!record.contains_key(KEY_ACCURACY), "{placeholder} was encoded");

            let json = info.to_json().unwrap();
            assert!(!json.contains("null"), "{json}");
            let decoded = BeaconInfo::from_json(&json).unwrap();
            assert_eq!(decoded.accuracy, None);
            assert_eq!(decoded.proximity, Some(Proximity::Unknown));
        }
    }

    #[test]
    fn test_json_unknown_keys_of_any_type_are_ignored() {
        let expected = BeaconInfo::new("A1", 1, 5);
        for extra in [
            r#""flag":true"#,
            r#""meta":null"#,
            r#""tags":["a"]"#,
            r#""loc":{"x":1}"#,
            r#""big":18446744073709551615"#,
        ] {
            let json = format!(r#"{{"uuid":"A1","major":1,"minor":5,{extra}}}"#);
            let decoded = BeaconInfo::from_json(&json)
                .unwrap_or_else(|e| panic!("{json} failed to decode: {e}"));
            assert!(decoded.same_fields(&expected), "{json}");
        }
    }

    #[test]
    fn test_known_key_with_non_scalar_value_is_malformed() {
        let err = BeaconInfo::from_json(r#"{"uuid":"A1","major":true,"minor":5}"#).unwrap_err();
        assert_eq!(
            err,
            MalformedRecord::InvalidValue {
                key: "major",
                expected: "an integer in 0..=65535",
                found: "a boolean (true)".to_string(),
            }
        );

        assert!(matches!(
            BeaconInfo::from_json(r#"{"uuid":null,"major":1,"minor":5}"#),
            Err(MalformedRecord::InvalidValue { key: "uuid", .. })
        ));
        assert!(matches!(
            BeaconInfo::from_json(r#"{"uuid":"A1","major":1,"minor":5,"identifier":["x"]}"#),
            Err(MalformedRecord::InvalidValue { key: "identifier", .. })
        ));
    }

    #[test]
    fn test_json_whole_meter_accuracy() {
        let decoded = BeaconInfo::from_json(r#"{"uuid":"A1","major":1,"minor":5,"accuracy":3}"#)
            .unwrap();
        assert_eq!(decoded.accuracy, Some(3.0));
    }

    #[test]
    fn test_json_missing_minor_is_malformed() {
        let err = BeaconInfo::from_json(r#"{"uuid":"A1","major":1}"#).unwrap_err();
        assert_eq!(err, MalformedRecord::MissingKey("minor"));
    }

    #[test]
    fn test_json_not_an_object_is_malformed() {
        assert!(matches!(
            BeaconInfo::from_json("[1, 2]"),
            Err(MalformedRecord::Json(_))
        ));
    }

    #[test]
    fn test_serde_goes_through_record() {
        let original = composite("A1", 1, 5, "lobby", 2.3, Proximity::Near, -60);
        let value = serde_json::to_value(&original).unwrap();
        assert_eq!(value["proximity"], 2);
        assert_eq!(value["identifier"], "lobby");

        let decoded: BeaconInfo = serde_json::from_value(value).unwrap();
        assert!(decoded.same_fields(&original));

        let err = serde_json::from_str::<BeaconInfo>(r#"{"uuid":"A1","minor":1}"#).unwrap_err();
        assert!(err.to_string().contains("missing required key `major`"));
    }
}
