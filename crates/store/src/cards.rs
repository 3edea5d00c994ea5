// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cached analytics cards.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A cached per-session analytics artifact of one kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredCard {
    /// Kind tag (e.g. `usage`).
    pub kind: String,
    /// Schema version of the analyzer that produced the payload.
    pub version: u32,
    pub computed_at: DateTime<Utc>,
    /// Total stored line count across the session's files at compute time.
    pub up_to_line: u64,
    pub payload: serde_json::Value,
}
