// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::io::Write;
use tempfile::TempDir;

fn write_file(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).unwrap();
    path
}

fn append(path: &Path, content: &str) {
    let mut f = std::fs::OpenOptions::new().append(true).open(path).unwrap();
    write!(f, "{}", content).unwrap();
}

#[test]
fn tails_complete_lines_from_start() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "s.jsonl", "one\ntwo\nthree\n");

    let chunk = tail_from(&path, TailPosition::default()).unwrap();
    assert_eq!(chunk.lines, vec!["one", "two", "three"]);
    assert_eq!(chunk.pos.lines, 3);
    assert_eq!(chunk.pos.bytes, 14);
}

#[test]
fn excludes_partial_trailing_line() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "s.jsonl", "one\ntwo\npart");

    let chunk = tail_from(&path, TailPosition::default()).unwrap();
    assert_eq!(chunk.lines, vec!["one", "two"]);
    assert_eq!(chunk.pos.lines, 2);

    // Terminating the line makes it visible on the next pass.
    append(&path, "ial\nnext\n");
    let chunk = tail_from(&path, chunk.pos).unwrap();
    assert_eq!(chunk.lines, vec!["partial", "next"]);
    assert_eq!(chunk.pos.lines, 4);
}

#[test]
fn resumes_from_position() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "s.jsonl", "a\nb\n");
    let first = tail_from(&path, TailPosition::default()).unwrap();

    append(&path, "c\nd\n");
    let second = tail_from(&path, first.pos).unwrap();
    assert_eq!(second.lines, vec!["c", "d"]);
    assert_eq!(second.pos.lines, 4);
}

#[test]
fn no_growth_returns_empty() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "s.jsonl", "a\n");
    let first = tail_from(&path, TailPosition::default()).unwrap();

    let second = tail_from(&path, first.pos).unwrap();
    assert!(second.lines.is_empty());
    assert_eq!(second.pos, first.pos);
}

#[test]
fn missing_file_is_distinct_error() {
    let dir = TempDir::new().unwrap();
    let err = tail_from(&dir.path().join("gone.jsonl"), TailPosition::default()).unwrap_err();
    assert!(matches!(err, TailError::Missing(_)));
}

#[test]
fn shrunken_file_is_truncated_error() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "s.jsonl", "aaaa\nbbbb\n");
    let first = tail_from(&path, TailPosition::default()).unwrap();

    std::fs::write(&path, "a\n").unwrap();
    let err = tail_from(&path, first.pos).unwrap_err();
    assert!(matches!(err, TailError::Truncated(_)));
}

#[test]
fn crlf_lines_are_stripped() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "s.jsonl", "one\r\ntwo\r\n");
    let chunk = tail_from(&path, TailPosition::default()).unwrap();
    assert_eq!(chunk.lines, vec!["one", "two"]);
    // Byte offsets still account for the CRLF.
    assert_eq!(chunk.pos.bytes, 10);
}

#[test]
fn empty_lines_are_counted() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "s.jsonl", "a\n\nb\n");
    let chunk = tail_from(&path, TailPosition::default()).unwrap();
    assert_eq!(chunk.lines, vec!["a", "", "b"]);
    assert_eq!(chunk.pos.lines, 3);
}

#[test]
fn position_at_line_finds_byte_offset() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "s.jsonl", "aa\nbbb\ncccc\n");

    let pos = position_at_line(&path, 2).unwrap();
    assert_eq!(pos, TailPosition { lines: 2, bytes: 7 });

    let chunk = tail_from(&path, pos).unwrap();
    assert_eq!(chunk.lines, vec!["cccc"]);
}

#[test]
fn position_at_line_clamps_to_available_lines() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "s.jsonl", "aa\npartial");

    let pos = position_at_line(&path, 5).unwrap();
    assert_eq!(pos.lines, 1);
    assert_eq!(pos.bytes, 3);
}
