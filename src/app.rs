//! Core application runner (business logic) for `beacon-info`.
//!
//! This module is decoupled from CLI parsing and process exit codes so it can
//! be tested deterministically with an injected event source and output
//! streams.

use crate::beacon_info::BeaconInfo;
use crate::output::{Format, FormatError};
use crate::source::{EventResult, Input, SourceError};
use crate::state::{self, StateError};
use crate::throttle::Throttle;
use crate::tracker::BeaconTable;
use clap::Parser;
use std::future::Future;
use std::io;
use std::io::Write;
use std::path::PathBuf;
use std::pin::Pin;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::info;

/// Configuration for the core run loop.
#[derive(Parser, Debug, Clone)]
#[command(author, about, version)]
pub struct Options {
    /// Newline-delimited JSON beacon events to read. `-` reads standard input.
    #[arg(long, default_value = "-", value_parser = crate::source::parse_input)]
    pub input: Input,

    /// Output format for merged beacon records
    #[arg(long, value_enum, default_value_t)]
    pub format: Format,

    /// The name of the measurement in InfluxDB line protocol.
    #[arg(long, default_value = "beacon_measurement")]
    pub influxdb_measurement: String,

    /// Verbose output, print errors for undecodable events and debug logs
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,

    /// Throttle output per beacon to at most one line per interval.
    /// Accepts duration with suffix: 3s, 1m, 500ms, 2h.
    /// Without suffix, value is interpreted as seconds.
    #[arg(long, value_parser = crate::throttle::parse_duration)]
    pub throttle: Option<Duration>,

    /// Restore tracked beacons from this file on start and save them on exit
    #[arg(long, value_name = "PATH")]
    pub state: Option<PathBuf>,

    /// After input ends, print all tracked beacons ranked closest first
    #[arg(long)]
    pub summary: bool,
}

/// Errors returned by the core run loop.
#[derive(Error, Debug)]
pub enum RunError {
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error(transparent)]
    State(#[from] StateError),
    #[error(transparent)]
    Format(#[from] FormatError),
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Future returned by [`EventSource::start`].
pub type StartFuture<'a> =
    Pin<Box<dyn Future<Output = Result<mpsc::Receiver<EventResult>, SourceError>> + Send + 'a>>;

/// Event source abstraction to enable deterministic unit tests without real input.
pub trait EventSource: Send + Sync {
    fn start(&self, input: Input, verbose: bool) -> StartFuture<'_>;
}

/// Real event source that reads newline-delimited JSON.
#[derive(Debug, Default, Clone, Copy)]
pub struct RealEventSource;

impl EventSource for RealEventSource {
    fn start(&self, input: Input, verbose: bool) -> StartFuture<'_> {
        Box::pin(async move { crate::source::json_lines::start_read(input, verbose).await })
    }
}

/// Run the core processing loop, writing formatted output to `out` and verbose errors to `err`.
///
/// - Each decoded event is merged into the tracking table; the resulting
///   composite is optionally throttled, formatted and written to `out`.
/// - On decode errors, the error is written to `err` only when `options.verbose` is true.
/// - A read error ends the run with `RunError::Source`; the state file is not saved.
/// - With `--summary`, every tracked composite is written closest first once input ends.
/// - With `--state`, the table is restored before reading and saved afterwards.
pub async fn run_with_io(
    options: Options,
    source: &dyn EventSource,
    out: &mut dyn Write,
    err: &mut dyn Write,
) -> Result<(), RunError> {
    let formatter = options.format.formatter(options.influxdb_measurement);

    let mut table = match &options.state {
        Some(path) => state::load(path)?,
        None => BeaconTable::new(),
    };

    let mut throttle = options.throttle.map(Throttle::new);

    info!(input = %options.input, "reading beacon events");
    let mut events = source.start(options.input, options.verbose).await?;

    while let Some(result) = events.recv().await {
        match result {
            Ok(event) => {
                let composite = table.observe(BeaconInfo::from(&event));

                let should_emit = throttle
                    .as_mut()
                    .is_none_or(|t: &mut Throttle| t.should_emit(&composite.key()));

                if should_emit {
                    writeln!(out, "{}", formatter.format(composite)?)?;
                }
            }
            Err(read_err @ SourceError::Io(_)) => return Err(read_err.into()),
            Err(source_err) => {
                if options.verbose {
                    writeln!(err, "{source_err}")?;
                }
            }
        }
    }

    if options.summary {
        for composite in table.ranked() {
            writeln!(out, "{}", formatter.format(composite)?)?;
        }
    }

    if let Some(path) = &options.state {
        state::save(path, &table)?;
    }

    Ok(())
}
