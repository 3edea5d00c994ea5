// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session file discovery.
//!
//! A session's files live in one directory: the primary transcript
//! `<session>.jsonl` plus zero or more sidechain files named
//! `agent-<short>.jsonl`. Sidechains can appear at any point mid-session, so
//! discovery runs on every tick.

use confab_core::FileKind;
use std::path::{Path, PathBuf};

/// A discovered tail-able session file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionFile {
    /// Leaf file name (the wire identity of the file).
    pub name: String,
    pub kind: FileKind,
    pub path: PathBuf,
}

/// Enumerate the session's files: the primary transcript first, then
/// sidechains sorted by name.
///
/// The primary is always listed even when not yet on disk (the host may not
/// have written it); sidechains are listed only once they exist.
pub fn discover_files(transcript_path: &Path) -> Vec<SessionFile> {
    let mut files = Vec::new();

    let primary_name = transcript_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    if !primary_name.is_empty() {
        files.push(SessionFile {
            name: primary_name.clone(),
            kind: FileKind::Transcript,
            path: transcript_path.to_path_buf(),
        });
    }

    let Some(dir) = transcript_path.parent() else {
        return files;
    };
    let Ok(entries) = std::fs::read_dir(dir) else {
        return files;
    };

    let mut sidechains: Vec<SessionFile> = entries
        .filter_map(|e| e.ok())
        .filter_map(|e| {
            let name = e.file_name().to_string_lossy().into_owned();
            let is_sidechain = name.starts_with("agent-") && name.ends_with(".jsonl");
            (is_sidechain && name != primary_name).then(|| SessionFile {
                name,
                kind: FileKind::Sidechain,
                path: e.path(),
            })
        })
        .collect();
    sidechains.sort_by(|a, b| a.name.cmp(&b.name));
    files.extend(sidechains);

    files
}

#[cfg(test)]
#[path = "discover_tests.rs"]
mod tests;
