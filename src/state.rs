//! Snapshot persisted between the runs.

use std::{fmt::Debug, fs, io::ErrorKind, path::Path};

use crate::{core::snapshot::EngineResult, prelude::*};

/// Read the stored snapshot, if any.
///
/// An unreadable or corrupted file is treated as absent.
#[instrument(name = "Reading the state…")]
pub fn read_from<P: AsRef<Path> + Debug>(path: P) -> Option<EngineResult> {
    match try_read_from(path.as_ref()) {
        Ok(snapshot) => snapshot,
        Err(error) => {
            warn!("ignoring the state file: {error:#}");
            None
        }
    }
}

fn try_read_from(path: &Path) -> Result<Option<EngineResult>> {
    let contents = match fs::read(path) {
        Ok(contents) => contents,
        Err(error) if error.kind() == ErrorKind::NotFound => return Ok(None),
        Err(error) => {
            return Err(error).with_context(|| format!("failed to read `{}`", path.display()));
        }
    };
    serde_json::from_slice(&contents)
        .map(Some)
        .with_context(|| format!("failed to parse `{}`", path.display()))
}

/// Store the snapshot, logging failures.
#[instrument(skip(snapshot), name = "Writing the state…")]
pub fn write_to<P: AsRef<Path> + Debug>(path: P, snapshot: &EngineResult) {
    if let Err(error) = try_write_to(path.as_ref(), snapshot) {
        error!("failed to store the state: {error:#}");
    }
}

fn try_write_to(path: &Path, snapshot: &EngineResult) -> Result {
    fs::write(path, serde_json::to_vec_pretty(snapshot)?)
        .with_context(|| format!("failed to write `{}`", path.display()))
}
