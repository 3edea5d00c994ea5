// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The sync loop: discover, tail, redact, upload.
//!
//! Each tick re-discovers the session's files (sidechains appear
//! mid-session), tails each from its cached position, and uploads the delta.
//! Per-file uploads run in parallel under a bounded pool, while uploads for
//! one file stay strictly ordered (one task per file). A cursor conflict
//! adopts the server's cursor and re-tails on the next tick; transient
//! failures abandon the file until the next tick; auth failure is fatal.

use crate::spawn::SpawnContext;
use confab_client::{ApiError, SyncApi};
use confab_core::{file_kind_for, ExternalId, FileKind, Redactor, SessionId};
use confab_protocol::{ChunkRequest, InitRequest};
use confab_transcript::{discover_files, position_at_line, tail_from, TailError, TailPosition};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

/// Upper bound on lines per upload request.
const MAX_CHUNK_LINES: usize = 500;

/// Concurrent per-file uploads within a tick.
const UPLOAD_CONCURRENCY: usize = 4;

/// Per-file sync state carried between ticks.
#[derive(Debug, Clone)]
struct FileSync {
    kind: FileKind,
    path: PathBuf,
    /// Lines confirmed stored by the server.
    cursor: u64,
    /// Cached tail position; `None` forces a rescan from `cursor`.
    pos: Option<TailPosition>,
    /// Set after an unrecoverable per-file error (oversized line, rejected
    /// chunk). The file is skipped until the daemon restarts.
    poisoned: bool,
}

/// What one tick accomplished.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TickReport {
    pub uploaded_lines: u64,
    pub conflicts: u32,
    pub transient_failures: u32,
}

enum FileOutcome {
    Synced { uploaded: u64 },
    Skipped,
    Conflict { server: u64 },
    Transient(String),
    Poisoned(String),
    Auth,
}

/// Per-session sync driver.
pub struct SyncDaemon<A> {
    api: Arc<A>,
    redactor: Option<Arc<Redactor>>,
    external_id: ExternalId,
    session_id: SessionId,
    transcript_path: PathBuf,
    files: HashMap<String, FileSync>,
    tick_interval: Duration,
}

impl<A: SyncApi + 'static> SyncDaemon<A> {
    /// Perform the protocol init and seed per-file cursors.
    pub async fn init(
        api: Arc<A>,
        ctx: &SpawnContext,
        redactor: Option<Redactor>,
    ) -> Result<Self, ApiError> {
        let resp = api
            .init(&InitRequest {
                external_id: ctx.external_id.clone(),
                transcript_path: ctx.transcript_path.display().to_string(),
                cwd: ctx.cwd.display().to_string(),
                git_info: None,
            })
            .await?;

        let dir = ctx
            .transcript_path
            .parent()
            .map(PathBuf::from)
            .unwrap_or_default();
        let files = resp
            .files
            .into_iter()
            .map(|(name, cursor)| {
                let state = FileSync {
                    kind: file_kind_for(&name),
                    path: dir.join(&name),
                    cursor: cursor.last_synced_line,
                    pos: None,
                    poisoned: false,
                };
                (name, state)
            })
            .collect();

        info!(
            external_id = %ctx.external_id,
            session_id = %resp.session_id,
            "sync session initialized"
        );

        Ok(Self {
            api,
            redactor: redactor.map(Arc::new),
            external_id: ctx.external_id.clone(),
            session_id: resp.session_id,
            transcript_path: ctx.transcript_path.clone(),
            files,
            tick_interval: crate::env::tick_interval(),
        })
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    /// One sync pass. Only auth failure is an error; everything else is
    /// reported and retried on the next tick.
    pub async fn tick(&mut self) -> Result<TickReport, ApiError> {
        for file in discover_files(&self.transcript_path) {
            self.files.entry(file.name).or_insert(FileSync {
                kind: file.kind,
                path: file.path,
                cursor: 0,
                pos: None,
                poisoned: false,
            });
        }

        let semaphore = Arc::new(Semaphore::new(UPLOAD_CONCURRENCY));
        let mut join = JoinSet::new();
        for (name, state) in &self.files {
            if state.poisoned {
                continue;
            }
            let api = Arc::clone(&self.api);
            let redactor = self.redactor.clone();
            let session_id = self.session_id.clone();
            let name = name.clone();
            let state = state.clone();
            let semaphore = Arc::clone(&semaphore);
            join.spawn(async move {
                // The semaphore is never closed; a failed acquire only means
                // the task runs unthrottled.
                let _permit = semaphore.acquire_owned().await.ok();
                let (state, outcome) =
                    sync_file(api.as_ref(), &session_id, redactor.as_deref(), &name, state)
                        .await;
                (name, state, outcome)
            });
        }

        let mut report = TickReport::default();
        let mut auth_failed = false;
        while let Some(joined) = join.join_next().await {
            let Ok((name, mut state, outcome)) = joined else {
                continue;
            };
            match outcome {
                FileOutcome::Synced { uploaded } => {
                    if uploaded > 0 {
                        debug!(file = %name, uploaded, "synced");
                    }
                    report.uploaded_lines += uploaded;
                }
                FileOutcome::Skipped => {}
                FileOutcome::Conflict { server } => {
                    info!(file = %name, server, "cursor conflict, re-tailing from server cursor");
                    report.conflicts += 1;
                }
                FileOutcome::Transient(message) => {
                    warn!(file = %name, error = %message, "transient failure, will retry next tick");
                    report.transient_failures += 1;
                }
                FileOutcome::Poisoned(message) => {
                    error!(file = %name, error = %message, "file sync failed, not retrying");
                    state.poisoned = true;
                }
                FileOutcome::Auth => auth_failed = true,
            }
            self.files.insert(name, state);
        }

        if auth_failed {
            return Err(ApiError::Auth);
        }
        Ok(report)
    }

    /// Main loop: tick until stopped, then flush once more and exit.
    ///
    /// Stop triggers: the stop channel (hook-delivered signal) or the host
    /// agent's PID disappearing.
    pub async fn run(
        &mut self,
        mut stop_rx: mpsc::Receiver<()>,
        host_pid: Option<u32>,
    ) -> Result<(), ApiError> {
        let mut ticker = tokio::time::interval(self.tick_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // interval fires immediately; the first tick is the initial flush.
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.tick().await?;
                    if let Some(pid) = host_pid {
                        if !crate::state::process_exists(pid) {
                            info!(host_pid = pid, "host process gone, final flush");
                            self.tick().await?;
                            break;
                        }
                    }
                }
                _ = stop_rx.recv() => {
                    info!(external_id = %self.external_id, "stop requested, final flush");
                    self.tick().await?;
                    break;
                }
            }
        }
        Ok(())
    }
}

/// Sync one file: tail from the cached position, redact, upload in order.
///
/// Returns the updated state plus an outcome for reporting. The updated
/// state always keeps `cursor` truthful to what the server confirmed.
async fn sync_file<A: SyncApi>(
    api: &A,
    session_id: &SessionId,
    redactor: Option<&Redactor>,
    name: &str,
    mut state: FileSync,
) -> (FileSync, FileOutcome) {
    // Establish a tail position matching the confirmed cursor.
    if state.pos.map(|p| p.lines) != Some(state.cursor) {
        match position_at_line(&state.path, state.cursor) {
            Ok(pos) => {
                if pos.lines < state.cursor {
                    // File on disk is behind the server; nothing to send.
                    debug!(file = %name, on_disk = pos.lines, cursor = state.cursor, "file behind server cursor");
                    return (state, FileOutcome::Skipped);
                }
                state.pos = Some(pos);
            }
            Err(TailError::Missing(_)) => return (state, FileOutcome::Skipped),
            Err(e) => return (state, tail_outcome(e)),
        }
    }

    let chunk = match tail_from(&state.path, state.pos.unwrap_or_default()) {
        Ok(chunk) => chunk,
        Err(TailError::Missing(_)) => return (state, FileOutcome::Skipped),
        Err(TailError::Truncated(path)) => {
            warn!(file = %name, path = %path.display(), "file shrank; transcripts must be append-only");
            state.pos = None;
            return (state, FileOutcome::Skipped);
        }
        Err(e) => return (state, tail_outcome(e)),
    };

    if chunk.lines.is_empty() {
        return (state, FileOutcome::Synced { uploaded: 0 });
    }

    let lines: Vec<String> = match redactor {
        Some(r) => chunk.lines.iter().map(|l| r.redact_line(l)).collect(),
        None => chunk.lines,
    };

    let mut uploaded = 0u64;
    for batch in lines.chunks(MAX_CHUNK_LINES) {
        let req = ChunkRequest {
            session_id: session_id.clone(),
            file_name: name.to_string(),
            file_kind: state.kind,
            first_line: state.cursor + 1,
            lines: batch.to_vec(),
        };
        match api.upload_chunk(&req).await {
            Ok(resp) => {
                state.cursor = resp.new_cursor;
                uploaded += batch.len() as u64;
            }
            Err(ApiError::CursorConflict { cursor }) => {
                state.cursor = cursor;
                state.pos = None;
                return (state, FileOutcome::Conflict { server: cursor });
            }
            Err(ApiError::Auth) => {
                state.pos = None;
                return (state, FileOutcome::Auth);
            }
            Err(ApiError::Transient(message)) => {
                state.pos = None;
                return (state, FileOutcome::Transient(message));
            }
            Err(e) => {
                state.pos = None;
                return (state, FileOutcome::Poisoned(e.to_string()));
            }
        }
    }

    state.pos = Some(chunk.pos);
    (state, FileOutcome::Synced { uploaded })
}

fn tail_outcome(error: TailError) -> FileOutcome {
    match error {
        TailError::LineTooLarge { .. } => FileOutcome::Poisoned(error.to_string()),
        other => FileOutcome::Transient(other.to_string()),
    }
}

#[cfg(test)]
#[path = "sync_tests.rs"]
mod tests;
