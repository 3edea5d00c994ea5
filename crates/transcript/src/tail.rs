// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Incremental line tailer for append-only files.
//!
//! A [`TailPosition`] pairs a line count with the byte offset just past the
//! newline of the last counted line. Tailing resumes from the byte offset and
//! only consumes newline-terminated lines; a partial trailing line is left
//! for the next pass, once the writer terminates it.

use confab_core::MAX_LINE_BYTES;
use std::fs::File;
use std::io::{BufRead, BufReader, ErrorKind, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors reading new lines from a session file.
#[derive(Debug, Error)]
pub enum TailError {
    #[error("file missing: {}", .0.display())]
    Missing(PathBuf),
    #[error("permission denied: {}", .0.display())]
    Permission(PathBuf),
    #[error("file shrank below the synced position: {}", .0.display())]
    Truncated(PathBuf),
    #[error("line {line} of {} is {bytes} bytes (cap {MAX_LINE_BYTES})", .path.display())]
    LineTooLarge {
        path: PathBuf,
        line: u64,
        bytes: usize,
    },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A resumable read position: `lines` complete lines consumed, ending at
/// byte offset `bytes`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TailPosition {
    pub lines: u64,
    pub bytes: u64,
}

/// Result of one tail pass: the new complete lines (without their trailing
/// newline) and the position after them.
#[derive(Debug, Default)]
pub struct TailChunk {
    pub lines: Vec<String>,
    pub pos: TailPosition,
}

fn open_checked(path: &Path) -> Result<File, TailError> {
    File::open(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => TailError::Missing(path.to_path_buf()),
        ErrorKind::PermissionDenied => TailError::Permission(path.to_path_buf()),
        _ => TailError::Io(e),
    })
}

/// Read all complete lines appended since `pos`.
///
/// The file is opened once per call. Returns [`TailError::Truncated`] when
/// the file is now shorter than `pos.bytes` (the writer rewrote history,
/// which the protocol forbids) and [`TailError::LineTooLarge`] when a line
/// exceeds the cap: the caller fails the chunk rather than truncating.
pub fn tail_from(path: &Path, pos: TailPosition) -> Result<TailChunk, TailError> {
    let file = open_checked(path)?;
    let len = file.metadata()?.len();
    if len < pos.bytes {
        return Err(TailError::Truncated(path.to_path_buf()));
    }
    if len == pos.bytes {
        return Ok(TailChunk {
            lines: Vec::new(),
            pos,
        });
    }

    let mut reader = BufReader::new(file);
    reader.seek(SeekFrom::Start(pos.bytes))?;

    let mut lines = Vec::new();
    let mut cur = pos;
    let mut buf = Vec::new();
    loop {
        buf.clear();
        let n = reader.read_until(b'\n', &mut buf)?;
        if n == 0 {
            break;
        }
        if buf.last() != Some(&b'\n') {
            // Partial trailing line: picked up next pass once terminated.
            break;
        }
        if n > MAX_LINE_BYTES {
            return Err(TailError::LineTooLarge {
                path: path.to_path_buf(),
                line: cur.lines + 1,
                bytes: n,
            });
        }
        cur.bytes += n as u64;
        cur.lines += 1;

        let mut end = buf.len() - 1;
        if end > 0 && buf[end - 1] == b'\r' {
            end -= 1;
        }
        lines.push(String::from_utf8_lossy(&buf[..end]).into_owned());
    }

    Ok(TailChunk { lines, pos: cur })
}

/// Locate the position after `line` complete lines.
///
/// Scans from the start of the file. If the file holds fewer complete lines,
/// the returned position stops early; callers compare `pos.lines` against
/// the requested cursor.
pub fn position_at_line(path: &Path, line: u64) -> Result<TailPosition, TailError> {
    let file = open_checked(path)?;
    let mut reader = BufReader::new(file);

    let mut pos = TailPosition::default();
    let mut buf = Vec::new();
    while pos.lines < line {
        buf.clear();
        let n = reader.read_until(b'\n', &mut buf)?;
        if n == 0 || buf.last() != Some(&b'\n') {
            break;
        }
        pos.bytes += n as u64;
        pos.lines += 1;
    }
    Ok(pos)
}

#[cfg(test)]
#[path = "tail_tests.rs"]
mod tests;
