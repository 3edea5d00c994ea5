// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Backend storage for synced sessions.
//!
//! Line content is the durable source of truth: each session file's lines
//! live in an append-only JSONL file under `<data>/lines/<session>/`, fsynced
//! before the in-memory cursor moves. Session records are small JSON files
//! under `<data>/sessions/`; the analytics card cache is a zstd snapshot that
//! only accelerates restarts.

pub mod cards;
pub mod lines;
pub mod snapshot;
pub mod store;

pub use cards::StoredCard;
pub use snapshot::SnapshotError;
pub use store::{FileRecord, SessionRecord, StoreError, SyncStore};
