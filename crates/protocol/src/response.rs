// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Response bodies.

use confab_core::{ExternalId, SessionId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-file sync cursor as known to the server.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileCursor {
    /// Number of lines already stored (equivalently: the 1-based line number
    /// of the last stored line).
    pub last_synced_line: u64,
}

/// Body of a successful `POST /sync/init`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitResponse {
    pub session_id: SessionId,
    /// Known files and their cursors; empty for a brand-new session.
    #[serde(default)]
    pub files: BTreeMap<String, FileCursor>,
}

/// Body of a successful `POST /sync/chunk`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkResponse {
    pub new_cursor: u64,
}

/// Body of a successful `POST /sessions/check`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckResponse {
    pub existing: Vec<ExternalId>,
    pub missing: Vec<ExternalId>,
}

/// Body of `GET /auth/validate` (always status 200).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidateResponse {
    pub valid: bool,
}

/// Body of `GET /sessions/{id}/analytics`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyticsResponse {
    /// When this read was answered (RFC 3339).
    pub computed_at: String,
    /// Total stored lines across the session's files at the snapshot.
    pub computed_lines: u64,
    /// Card payloads by kind tag.
    pub cards: BTreeMap<String, serde_json::Value>,
    /// Analyzer failures by kind tag, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card_errors: Option<BTreeMap<String, String>>,
}

/// Structured error body for 4xx/5xx responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Machine-readable code (see [`crate::error_code`]).
    pub code: String,
    /// Human-readable message.
    pub error: String,
    /// For cursor conflicts: the server's stored cursor for the file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cursor: Option<u64>,
}

impl ErrorBody {
    pub fn new(code: &str, error: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            error: error.into(),
            cursor: None,
        }
    }

    /// A cursor-conflict body telling the client what `first_line` must be.
    pub fn cursor_conflict(stored: u64) -> Self {
        Self {
            code: crate::error_code::CURSOR_CONFLICT.to_string(),
            error: format!("first_line must be {}", stored + 1),
            cursor: Some(stored),
        }
    }
}
