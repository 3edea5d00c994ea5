// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The sync API surface the daemon programs against.
//!
//! The trait seam exists so the daemon's tick loop is testable against
//! [`crate::fake::FakeSyncApi`] without a network.

use async_trait::async_trait;
use confab_protocol::{CheckResponse, ChunkRequest, ChunkResponse, InitRequest, InitResponse};
use thiserror::Error;

/// Errors surfaced by sync API operations.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Credentials rejected. Fatal: the daemon exits rather than retry.
    #[error("authentication rejected by backend")]
    Auth,
    /// Connection/transport failure or 5xx. Retried with backoff.
    #[error("transient network failure: {0}")]
    Transient(String),
    /// The server's cursor disagrees with ours; carries the server's value.
    #[error("cursor conflict: server cursor is {cursor}")]
    CursorConflict { cursor: u64 },
    /// A 4xx other than auth/conflict. Fatal to the current chunk.
    #[error("request rejected ({code}): {message}")]
    Rejected { code: String, message: String },
    /// Malformed request or response body.
    #[error("protocol error: {0}")]
    Protocol(String),
}

/// Operations the daemon performs against the backend.
#[async_trait]
pub trait SyncApi: Send + Sync {
    /// Create or resume a session; idempotent per external ID.
    async fn init(&self, req: &InitRequest) -> Result<InitResponse, ApiError>;

    /// Append a contiguous run of lines to one file.
    async fn upload_chunk(&self, req: &ChunkRequest) -> Result<ChunkResponse, ApiError>;

    /// Partition external IDs into already-ingested and unknown.
    async fn check_existing(
        &self,
        external_ids: &[confab_core::ExternalId],
    ) -> Result<CheckResponse, ApiError>;

    /// Probe whether the configured credentials are accepted.
    async fn validate(&self) -> Result<bool, ApiError>;
}
