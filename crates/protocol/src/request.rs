// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Request bodies.

use confab_core::{ExternalId, FileKind, GitInfo, SessionId};
use serde::{Deserialize, Serialize};

/// `POST /sync/init`: create or resume a session.
///
/// Idempotent: repeated calls with the same external ID return the same
/// internal session ID and the current per-file cursors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitRequest {
    pub external_id: ExternalId,
    pub transcript_path: String,
    pub cwd: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git_info: Option<GitInfo>,
}

/// `POST /sync/chunk`: append a contiguous run of new lines to one file.
///
/// `first_line` is 1-based and must equal the server's stored cursor plus
/// one; anything else is answered with a 409 carrying the stored cursor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkRequest {
    pub session_id: SessionId,
    pub file_name: String,
    pub file_kind: FileKind,
    pub first_line: u64,
    pub lines: Vec<String>,
}

/// `POST /sessions/check`: partition external IDs into known and unknown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckRequest {
    pub external_ids: Vec<ExternalId>,
}
