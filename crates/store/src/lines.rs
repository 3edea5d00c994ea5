// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Append-only line files: the durable storage behind per-file cursors.
//!
//! Appends are fsynced before the caller commits its in-memory cursor, so a
//! crash can only leave a torn trailing line. [`recover`] truncates such a
//! tail on open and returns the count of complete lines, which is by
//! construction the stored cursor.

use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::Path;

/// Append `lines` (newline-terminated) and fsync.
pub fn append_lines(path: &Path, lines: &[String]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    let mut buf = Vec::with_capacity(lines.iter().map(|l| l.len() + 1).sum());
    for line in lines {
        buf.extend_from_slice(line.as_bytes());
        buf.push(b'\n');
    }
    file.write_all(&buf)?;
    file.sync_all()?;
    Ok(())
}

/// Count complete lines and the byte offset just past the last one.
pub fn count_complete_lines(path: &Path) -> io::Result<(u64, u64)> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    let mut lines = 0u64;
    let mut bytes = 0u64;
    let mut buf = Vec::new();
    loop {
        buf.clear();
        let n = reader.read_until(b'\n', &mut buf)?;
        if n == 0 || buf.last() != Some(&b'\n') {
            break;
        }
        lines += 1;
        bytes += n as u64;
    }
    Ok((lines, bytes))
}

/// Recover a line file after a possible crash: truncate any torn trailing
/// line and return the number of complete lines stored.
pub fn recover(path: &Path) -> io::Result<u64> {
    let (lines, bytes) = count_complete_lines(path)?;
    let len = std::fs::metadata(path)?.len();
    if len > bytes {
        tracing::warn!(
            path = %path.display(),
            torn_bytes = len - bytes,
            "truncating torn trailing line"
        );
        let file = OpenOptions::new().write(true).open(path)?;
        file.set_len(bytes)?;
        file.sync_all()?;
    }
    Ok(lines)
}

/// Read the first `count` stored lines (a cursor-snapshot prefix).
///
/// Whole prefixes are the only retrieval shape the store needs: analytics
/// always materializes lines 1..=cursor, so reads stay linear in the lines
/// returned without any per-line offset index. A file holding fewer than
/// `count` complete lines yields what it has.
pub fn read_prefix(path: &Path, count: u64) -> io::Result<Vec<String>> {
    if count == 0 {
        return Ok(Vec::new());
    }
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    let mut out = Vec::new();
    let mut buf = Vec::new();
    while (out.len() as u64) < count {
        buf.clear();
        let n = reader.read_until(b'\n', &mut buf)?;
        if n == 0 || buf.last() != Some(&b'\n') {
            break;
        }
        out.push(String::from_utf8_lossy(&buf[..buf.len() - 1]).into_owned());
    }
    Ok(out)
}

#[cfg(test)]
#[path = "lines_tests.rs"]
mod tests;
