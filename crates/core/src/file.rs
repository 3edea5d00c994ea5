// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session file kinds and naming rules.
//!
//! A session owns one primary transcript (`<session>.jsonl`) and any number
//! of sidechain files (`agent-<short>.jsonl`) living in the same directory.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Maximum size of a single transcript line (read-side and wire-side cap).
pub const MAX_LINE_BYTES: usize = 10 * 1024 * 1024;

/// The kind of a tail-able session file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileKind {
    /// The primary session transcript.
    Transcript,
    /// An auxiliary agent/sidechain transcript.
    Sidechain,
}

impl std::fmt::Display for FileKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FileKind::Transcript => write!(f, "transcript"),
            FileKind::Sidechain => write!(f, "sidechain"),
        }
    }
}

/// Classify a session file by its leaf name.
///
/// `agent-*.jsonl` files are sidechains; everything else is treated as a
/// primary transcript.
pub fn file_kind_for(name: &str) -> FileKind {
    if name.starts_with("agent-") && name.ends_with(".jsonl") {
        FileKind::Sidechain
    } else {
        FileKind::Transcript
    }
}

/// Errors produced by [`validate_file_name`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FileNameError {
    #[error("file name is empty")]
    Empty,
    #[error("file name {0:?} contains a path separator")]
    PathSeparator(String),
    #[error("file name {0:?} is a relative path component")]
    Relative(String),
}

/// Validate that a wire file name is a plain leaf name.
///
/// File names travel over the wire and are joined onto the server's data
/// directory, so anything that could escape the session's directory is
/// rejected.
pub fn validate_file_name(name: &str) -> Result<(), FileNameError> {
    if name.is_empty() {
        return Err(FileNameError::Empty);
    }
    if name.contains('/') || name.contains('\\') {
        return Err(FileNameError::PathSeparator(name.to_string()));
    }
    if name == "." || name == ".." {
        return Err(FileNameError::Relative(name.to_string()));
    }
    Ok(())
}

#[cfg(test)]
#[path = "file_tests.rs"]
mod tests;
