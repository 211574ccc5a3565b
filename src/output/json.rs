//! JSON output: the flat record, one object per line.

use crate::beacon_info::BeaconInfo;
use crate::output::{FormatError, OutputFormatter};

#[derive(Debug, Default, Clone, Copy)]
pub struct JsonFormatter;

impl OutputFormatter for JsonFormatter {
    fn format(&self, info: &BeaconInfo) -> Result<String, FormatError> {
        Ok(info.to_json()?)
    }
}
