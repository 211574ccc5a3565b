//! InfluxDB line protocol output formatter.
//!
//! The identity triple becomes the tag set, so every beacon is its own
//! series. The region label and live metrics become fields; absent fields
//! are left out. No timestamp is written, the collector assigns one on
//! arrival.

use crate::beacon_info::BeaconInfo;
use crate::output::{FormatError, OutputFormatter};
use crate::record::normalize_accuracy;
use std::collections::BTreeMap;
use std::fmt;

/// Field values for InfluxDB line protocol
#[derive(Debug, PartialEq)]
pub enum FieldValue {
    Float(f64),
    Integer(i64),
    String(String),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FieldValue::Float(num) => write!(f, "{num}"),
            FieldValue::Integer(num) => write!(f, "{num}i"),
            FieldValue::String(s) => write!(f, "\"{}\"", escape_field_string(s)),
        }
    }
}

/// Escape commas, equals signs and spaces in a tag value.
fn escape_tag(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, ',' | '=' | ' ') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Escape double quotes and backslashes in a string field value.
fn escape_field_string(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Data point in InfluxDB line protocol
#[derive(Debug)]
pub struct DataPoint {
    pub measurement: String,
    pub tag_set: BTreeMap<String, String>,
    pub field_set: BTreeMap<String, FieldValue>,
}

impl fmt::Display for DataPoint {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(fmt, "{}", self.measurement)?;
        for (key, value) in &self.tag_set {
            write!(fmt, ",{}={}", key, escape_tag(value))?;
        }
        write!(fmt, " ")?;
        for (i, (key, value)) in self.field_set.iter().enumerate() {
            if i > 0 {
                write!(fmt, ",")?;
            }
            write!(fmt, "{}={}", key, value)?;
        }
        Ok(())
    }
}

/// InfluxDB line protocol formatter with a configurable measurement name.
pub struct InfluxDbFormatter {
    measurement_name: String,
}

impl InfluxDbFormatter {
    pub fn new(measurement_name: String) -> Self {
        Self { measurement_name }
    }

    fn tag_set(&self, info: &BeaconInfo) -> BTreeMap<String, String> {
        BTreeMap::from([
            ("uuid".to_string(), info.uuid.clone()),
            ("major".to_string(), info.major.to_string()),
            ("minor".to_string(), info.minor.to_string()),
        ])
    }

    fn field_set(&self, info: &BeaconInfo) -> BTreeMap<String, FieldValue> {
        let mut fields = BTreeMap::new();

        if let Some(identifier) = &info.identifier {
            fields.insert("identifier".into(), FieldValue::String(identifier.clone()));
        }
        if let Some(accuracy) = info.accuracy.and_then(normalize_accuracy) {
            fields.insert("accuracy".into(), FieldValue::Float(accuracy));
        }
        if let Some(proximity) = info.proximity {
            fields.insert("proximity".into(), FieldValue::String(proximity.to_string()));
        }
        if let Some(rssi) = info.rssi {
            fields.insert("rssi".into(), FieldValue::Integer(rssi));
        }

        fields
    }

    fn to_data_point(&self, info: &BeaconInfo) -> DataPoint {
        DataPoint {
            measurement: self.measurement_name.clone(),
            tag_set: self.tag_set(info),
            field_set: self.field_set(info),
        }
    }
}

impl OutputFormatter for InfluxDbFormatter {
    fn format(&self, info: &BeaconInfo) -> Result<String, FormatError> {
        Ok(self.to_data_point(info).to_string())
    }
}
