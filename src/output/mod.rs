//! Output formatters for beacon composites.
//!
//! Each formatter turns one [`BeaconInfo`] into one line of output. JSON
//! writes the flat record; InfluxDB writes line protocol for Telegraf-style
//! collectors.

pub mod influxdb;
pub mod json;

use crate::beacon_info::BeaconInfo;
use thiserror::Error;

/// A composite could not be formatted.
#[derive(Error, Debug)]
pub enum FormatError {
    #[error("Cannot encode beacon record: {0}")]
    Json(#[from] serde_json::Error),
}

/// Trait for formatting beacon composites into output lines.
pub trait OutputFormatter: Send + Sync {
    /// Format a composite as a single line, without the trailing newline.
    fn format(&self, info: &BeaconInfo) -> Result<String, FormatError>;
}

/// Available output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Format {
    /// One flat JSON record per line
    #[default]
    Json,
    /// InfluxDB line protocol
    Influxdb,
}

impl Format {
    /// Build the formatter for this format.
    ///
    /// `measurement_name` is only used by the InfluxDB formatter.
    pub fn formatter(self, measurement_name: String) -> Box<dyn OutputFormatter> {
        match self {
            Format::Json => Box::new(json::JsonFormatter),
            Format::Influxdb => Box::new(influxdb::InfluxDbFormatter::new(measurement_name)),
        }
    }
}
