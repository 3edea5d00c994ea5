// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory [`SyncApi`] for daemon tests: scripted failures, inspectable
//! server-side state, and a way to move cursors out from under the client.

use crate::api::{ApiError, SyncApi};
use async_trait::async_trait;
use confab_core::{ExternalId, SessionId};
use confab_protocol::{
    CheckResponse, ChunkRequest, ChunkResponse, FileCursor, InitRequest, InitResponse,
};
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};

#[derive(Default)]
struct FakeState {
    sessions: HashMap<ExternalId, SessionId>,
    files: HashMap<String, Vec<String>>,
    transient_failures: u32,
    auth_failed: bool,
    init_calls: u32,
    chunk_calls: u32,
}

/// Scriptable in-memory backend.
#[derive(Default)]
pub struct FakeSyncApi {
    state: Mutex<FakeState>,
}

impl FakeSyncApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next `n` API calls with a transient error.
    pub fn fail_transient(&self, n: u32) {
        self.state.lock().transient_failures = n;
    }

    /// All subsequent calls fail with an auth error.
    pub fn fail_auth(&self) {
        self.state.lock().auth_failed = true;
    }

    /// Overwrite the server's stored lines for a file, simulating another
    /// writer having advanced the cursor.
    pub fn set_server_lines(&self, file: &str, lines: Vec<String>) {
        self.state.lock().files.insert(file.to_string(), lines);
    }

    pub fn lines(&self, file: &str) -> Vec<String> {
        self.state.lock().files.get(file).cloned().unwrap_or_default()
    }

    pub fn cursor(&self, file: &str) -> u64 {
        self.state
            .lock()
            .files
            .get(file)
            .map(|l| l.len() as u64)
            .unwrap_or(0)
    }

    pub fn init_calls(&self) -> u32 {
        self.state.lock().init_calls
    }

    pub fn chunk_calls(&self) -> u32 {
        self.state.lock().chunk_calls
    }

    fn gate(state: &mut FakeState) -> Result<(), ApiError> {
        if state.auth_failed {
            return Err(ApiError::Auth);
        }
        if state.transient_failures > 0 {
            state.transient_failures -= 1;
            return Err(ApiError::Transient("scripted failure".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl SyncApi for FakeSyncApi {
    async fn init(&self, req: &InitRequest) -> Result<InitResponse, ApiError> {
        let mut state = self.state.lock();
        Self::gate(&mut state)?;
        state.init_calls += 1;

        let session_id = state
            .sessions
            .entry(req.external_id.clone())
            .or_insert_with(|| SessionId::new(format!("fake-{}", req.external_id)))
            .clone();

        let files: BTreeMap<String, FileCursor> = state
            .files
            .iter()
            .map(|(name, lines)| {
                (
                    name.clone(),
                    FileCursor {
                        last_synced_line: lines.len() as u64,
                    },
                )
            })
            .collect();

        Ok(InitResponse { session_id, files })
    }

    async fn upload_chunk(&self, req: &ChunkRequest) -> Result<ChunkResponse, ApiError> {
        let mut state = self.state.lock();
        Self::gate(&mut state)?;
        state.chunk_calls += 1;

        let stored = state.files.entry(req.file_name.clone()).or_default();
        let cursor = stored.len() as u64;
        if req.first_line != cursor + 1 {
            return Err(ApiError::CursorConflict { cursor });
        }
        stored.extend(req.lines.iter().cloned());
        Ok(ChunkResponse {
            new_cursor: stored.len() as u64,
        })
    }

    async fn check_existing(
        &self,
        external_ids: &[ExternalId],
    ) -> Result<CheckResponse, ApiError> {
        let state = self.state.lock();
        let mut resp = CheckResponse::default();
        for id in external_ids {
            if state.sessions.contains_key(id) {
                resp.existing.push(id.clone());
            } else {
                resp.missing.push(id.clone());
            }
        }
        Ok(resp)
    }

    async fn validate(&self) -> Result<bool, ApiError> {
        Ok(!self.state.lock().auth_failed)
    }
}
