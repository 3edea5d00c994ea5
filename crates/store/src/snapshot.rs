// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Card-cache snapshots.
//!
//! The cache only accelerates restarts; everything in it can be recomputed
//! from line storage. So durability is one-sided: writes are atomic (temp
//! file, fsync, rename, directory fsync) and never leave a torn snapshot,
//! while an unreadable snapshot is set aside as `<name>.corrupt` for
//! inspection and reported as an empty cache.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, ErrorKind};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

/// Errors reading or writing a snapshot.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot IO failure at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("snapshot encoding failed: {0}")]
    Encode(#[from] serde_json::Error),
}

fn io_at(path: &Path, source: io::Error) -> SnapshotError {
    SnapshotError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Save a value atomically as zstd-compressed JSON.
pub fn save<T: Serialize>(path: &Path, value: &T) -> Result<(), SnapshotError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| io_at(path, e))?;
    }

    let tmp_path = path.with_extension("tmp");
    {
        let file = File::create(&tmp_path).map_err(|e| io_at(&tmp_path, e))?;
        let mut encoder =
            zstd::Encoder::new(BufWriter::new(file), 0).map_err(|e| io_at(&tmp_path, e))?;
        serde_json::to_writer(&mut encoder, value)?;
        let writer = encoder.finish().map_err(|e| io_at(&tmp_path, e))?;
        let file = writer
            .into_inner()
            .map_err(|e| io_at(&tmp_path, e.into_error()))?;
        file.sync_all().map_err(|e| io_at(&tmp_path, e))?;
    }
    fs::rename(&tmp_path, path).map_err(|e| io_at(path, e))?;

    // Make the rename durable across power loss.
    if let Some(parent) = path.parent() {
        if let Ok(dir) = File::open(parent) {
            let _ = dir.sync_all();
        }
    }

    Ok(())
}

/// Load a snapshot if present.
///
/// Returns `Ok(None)` when the file doesn't exist or doesn't decode. A bad
/// snapshot is renamed to `<name>.corrupt` (replacing any earlier one) so
/// the next save starts clean and the evidence survives.
pub fn load<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, SnapshotError> {
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(io_at(path, e)),
    };

    let decoded = zstd::Decoder::new(BufReader::new(file))
        .map_err(|e| io_at(path, e))
        .and_then(|decoder| serde_json::from_reader(decoder).map_err(SnapshotError::Encode));

    match decoded {
        Ok(value) => Ok(Some(value)),
        Err(e) => {
            let corrupt_path = path.with_extension("corrupt");
            warn!(
                error = %e,
                path = %path.display(),
                set_aside = %corrupt_path.display(),
                "unreadable snapshot, rebuilding cache from line storage",
            );
            fs::rename(path, &corrupt_path).map_err(|e| io_at(path, e))?;
            Ok(None)
        }
    }
}

#[cfg(test)]
#[path = "snapshot_tests.rs"]
mod tests;
