//! Persist and restore the tracking table.
//!
//! The state file is a JSON array of flat beacon records, closest first.

use crate::beacon_info::BeaconInfo;
use crate::tracker::BeaconTable;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

/// Errors reading or writing the state file.
#[derive(Error, Debug)]
pub enum StateError {
    #[error("State file error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Malformed state file {}: {reason}", .path.display())]
    Malformed { path: PathBuf, reason: String },
}

/// Load a tracking table. A missing file yields an empty table.
pub fn load(path: &Path) -> Result<BeaconTable, StateError> {
    if !path.exists() {
        return Ok(BeaconTable::new());
    }

    let content = std::fs::read_to_string(path)?;
    let beacons: Vec<BeaconInfo> =
        serde_json::from_str(&content).map_err(|e| StateError::Malformed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

    info!(path = %path.display(), beacons = beacons.len(), "restored beacon state");
    Ok(beacons.into_iter().collect())
}

/// Save a tracking table, creating parent directories as needed.
pub fn save(path: &Path, table: &BeaconTable) -> Result<(), StateError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }

    let content = serde_json::to_string_pretty(&table.ranked()).map_err(|e| {
        StateError::Malformed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        }
    })?;
    std::fs::write(path, content)?;

    info!(path = %path.display(), beacons = table.len(), "saved beacon state");
    Ok(())
}
