// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session registry and the chunk append path.

use crate::cards::StoredCard;
use crate::lines;
use crate::snapshot::{self, SnapshotError};
use chrono::{DateTime, Utc};
use confab_core::{
    file_kind_for, validate_file_name, ExternalId, FileKind, GitInfo, SessionId, MAX_LINE_BYTES,
};
use confab_protocol::{CheckResponse, ChunkRequest, FileCursor, InitRequest, InitResponse};
use confab_transcript::{FileCollection, FileLines};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

/// Errors from store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("unknown session {0}")]
    UnknownSession(String),
    #[error("cursor conflict: stored cursor is {stored}")]
    CursorConflict { stored: u64 },
    #[error("invalid chunk: {0}")]
    InvalidChunk(String),
    #[error("line {line} is {bytes} bytes (cap {MAX_LINE_BYTES})")]
    LineTooLarge { line: u64, bytes: usize },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
}

/// A synced session as known to the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: SessionId,
    pub external_id: ExternalId,
    pub transcript_path: String,
    pub cwd: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git_info: Option<GitInfo>,
    pub created_at: DateTime<Utc>,
}

/// Per-file sync state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    pub name: String,
    pub kind: FileKind,
    /// Number of lines stored; never decreases.
    pub cursor: u64,
    pub updated_at: DateTime<Utc>,
}

struct SessionEntry {
    record: SessionRecord,
    files: BTreeMap<String, FileRecord>,
    cards: HashMap<String, StoredCard>,
}

#[derive(Default)]
struct StoreState {
    sessions: HashMap<SessionId, SessionEntry>,
    by_external: HashMap<ExternalId, SessionId>,
}

/// Card cache snapshot, keyed by session ID then kind.
#[derive(Default, Serialize, Deserialize)]
struct CardsSnapshot {
    cards: HashMap<String, HashMap<String, StoredCard>>,
}

/// The backend store.
///
/// In-memory cursors are committed only after the line file append is
/// durable, and per-`(session, file)` async locks serialize appenders, so a
/// racing second writer observes a cursor conflict instead of corruption.
pub struct SyncStore {
    data_dir: PathBuf,
    state: Mutex<StoreState>,
    append_locks: Mutex<HashMap<(SessionId, String), Arc<tokio::sync::Mutex<()>>>>,
}

impl SyncStore {
    /// Open a store, recovering state from disk.
    ///
    /// Session records and line files are the source of truth; cursors are
    /// recounted from the line files (truncating any torn trailing line).
    /// The card cache snapshot is best-effort.
    pub fn open(data_dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let data_dir = data_dir.into();
        let sessions_dir = data_dir.join("sessions");
        std::fs::create_dir_all(&sessions_dir)?;
        std::fs::create_dir_all(data_dir.join("lines"))?;

        let mut state = StoreState::default();

        for entry in std::fs::read_dir(&sessions_dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().is_none_or(|e| e != "json") {
                continue;
            }
            let record: SessionRecord = match std::fs::read_to_string(&path)
                .map_err(StoreError::Io)
                .and_then(|c| serde_json::from_str(&c).map_err(StoreError::Json))
            {
                Ok(r) => r,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "skipping unreadable session record");
                    continue;
                }
            };
            state.by_external.insert(record.external_id.clone(), record.id.clone());
            state.sessions.insert(
                record.id.clone(),
                SessionEntry {
                    record,
                    files: BTreeMap::new(),
                    cards: HashMap::new(),
                },
            );
        }

        for (id, entry) in state.sessions.iter_mut() {
            let dir = data_dir.join("lines").join(id.as_str());
            let Ok(read) = std::fs::read_dir(&dir) else {
                continue;
            };
            for file in read.filter_map(|e| e.ok()) {
                let name = file.file_name().to_string_lossy().into_owned();
                let cursor = match lines::recover(&file.path()) {
                    Ok(c) => c,
                    Err(e) => {
                        warn!(path = %file.path().display(), error = %e, "failed to recover line file");
                        continue;
                    }
                };
                let updated_at = file
                    .metadata()
                    .ok()
                    .and_then(|m| m.modified().ok())
                    .map(DateTime::<Utc>::from)
                    .unwrap_or_else(Utc::now);
                entry.files.insert(
                    name.clone(),
                    FileRecord {
                        kind: file_kind_for(&name),
                        name,
                        cursor,
                        updated_at,
                    },
                );
            }
        }

        let cards_path = data_dir.join("cards.json.zst");
        if let Some(cards) = snapshot::load::<CardsSnapshot>(&cards_path)? {
            for (session_id, by_kind) in cards.cards {
                if let Some(entry) = state.sessions.get_mut(&SessionId::new(session_id)) {
                    entry.cards = by_kind;
                }
            }
        }

        info!(
            sessions = state.sessions.len(),
            data_dir = %data_dir.display(),
            "store opened"
        );

        Ok(Self {
            data_dir,
            state: Mutex::new(state),
            append_locks: Mutex::new(HashMap::new()),
        })
    }

    fn line_path(&self, id: &SessionId, file_name: &str) -> PathBuf {
        self.data_dir.join("lines").join(id.as_str()).join(file_name)
    }

    fn session_path(&self, id: &SessionId) -> PathBuf {
        self.data_dir
            .join("sessions")
            .join(format!("{}.json", id.as_str()))
    }

    fn append_lock(&self, id: &SessionId, file: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut map = self.append_locks.lock();
        map.entry((id.clone(), file.to_string()))
            .or_default()
            .clone()
    }

    /// Create or look up a session by external ID. Idempotent.
    pub fn init_session(&self, req: &InitRequest) -> Result<InitResponse, StoreError> {
        let mut state = self.state.lock();

        if let Some(id) = state.by_external.get(&req.external_id).cloned() {
            let files = state
                .sessions
                .get(&id)
                .map(cursors_of)
                .unwrap_or_default();
            return Ok(InitResponse {
                session_id: id,
                files,
            });
        }

        let record = SessionRecord {
            id: SessionId::generate(),
            external_id: req.external_id.clone(),
            transcript_path: req.transcript_path.clone(),
            cwd: req.cwd.clone(),
            git_info: req.git_info.clone(),
            created_at: Utc::now(),
        };
        write_json_atomic(&self.session_path(&record.id), &record)?;

        let id = record.id.clone();
        state.by_external.insert(record.external_id.clone(), id.clone());
        state.sessions.insert(
            id.clone(),
            SessionEntry {
                record,
                files: BTreeMap::new(),
                cards: HashMap::new(),
            },
        );
        info!(session_id = %id, external_id = %req.external_id, "session created");

        Ok(InitResponse {
            session_id: id,
            files: BTreeMap::new(),
        })
    }

    /// Append a chunk to one file. Returns the new cursor.
    ///
    /// Atomic per chunk: the lines are fsynced to the file before the cursor
    /// commits, and a crash in between is healed by recovery truncation.
    pub async fn append_chunk(&self, req: &ChunkRequest) -> Result<u64, StoreError> {
        validate_file_name(&req.file_name)
            .map_err(|e| StoreError::InvalidChunk(e.to_string()))?;
        for (i, line) in req.lines.iter().enumerate() {
            if line.len() > MAX_LINE_BYTES {
                return Err(StoreError::LineTooLarge {
                    line: req.first_line + i as u64,
                    bytes: line.len(),
                });
            }
            if line.contains('\n') {
                return Err(StoreError::InvalidChunk(format!(
                    "line {} contains an embedded newline",
                    req.first_line + i as u64
                )));
            }
        }

        if !self.state.lock().sessions.contains_key(&req.session_id) {
            return Err(StoreError::UnknownSession(req.session_id.to_string()));
        }

        // One writer at a time per (session, file).
        let lock = self.append_lock(&req.session_id, &req.file_name);
        let _guard = lock.lock().await;

        let stored = {
            let state = self.state.lock();
            state
                .sessions
                .get(&req.session_id)
                .ok_or_else(|| StoreError::UnknownSession(req.session_id.to_string()))?
                .files
                .get(&req.file_name)
                .map(|f| f.cursor)
                .unwrap_or(0)
        };

        if req.first_line != stored + 1 {
            return Err(StoreError::CursorConflict { stored });
        }
        if req.lines.is_empty() {
            return Ok(stored);
        }

        lines::append_lines(&self.line_path(&req.session_id, &req.file_name), &req.lines)?;

        let new_cursor = stored + req.lines.len() as u64;
        let mut state = self.state.lock();
        let entry = state
            .sessions
            .get_mut(&req.session_id)
            .ok_or_else(|| StoreError::UnknownSession(req.session_id.to_string()))?;
        let file = entry
            .files
            .entry(req.file_name.clone())
            .or_insert_with(|| FileRecord {
                name: req.file_name.clone(),
                kind: req.file_kind,
                cursor: 0,
                updated_at: Utc::now(),
            });
        file.cursor = new_cursor;
        file.updated_at = Utc::now();
        // Cards are not touched here: staleness is lazy, evaluated at read
        // time against the new line count.
        Ok(new_cursor)
    }

    /// Partition external IDs into known and unknown.
    pub fn check_existing(&self, external_ids: &[ExternalId]) -> CheckResponse {
        let state = self.state.lock();
        let mut resp = CheckResponse::default();
        for id in external_ids {
            if state.by_external.contains_key(id) {
                resp.existing.push(id.clone());
            } else {
                resp.missing.push(id.clone());
            }
        }
        resp
    }

    pub fn session(&self, id: &SessionId) -> Option<SessionRecord> {
        self.state.lock().sessions.get(id).map(|e| e.record.clone())
    }

    pub fn session_by_external(&self, external_id: &ExternalId) -> Option<SessionRecord> {
        let state = self.state.lock();
        let id = state.by_external.get(external_id)?;
        state.sessions.get(id).map(|e| e.record.clone())
    }

    /// Current per-file cursors for a session.
    pub fn file_cursors(
        &self,
        id: &SessionId,
    ) -> Result<BTreeMap<String, FileCursor>, StoreError> {
        let state = self.state.lock();
        let entry = state
            .sessions
            .get(id)
            .ok_or_else(|| StoreError::UnknownSession(id.to_string()))?;
        Ok(cursors_of(entry))
    }

    /// Total stored lines across the session's files.
    pub fn total_lines(&self, id: &SessionId) -> Result<u64, StoreError> {
        let state = self.state.lock();
        let entry = state
            .sessions
            .get(id)
            .ok_or_else(|| StoreError::UnknownSession(id.to_string()))?;
        Ok(entry.files.values().map(|f| f.cursor).sum())
    }

    /// Materialize the session's stored lines for analytics.
    ///
    /// Cursors are snapshotted once, then each file is read up to its
    /// snapshotted cursor, so the collection is consistent even while
    /// appends continue.
    pub fn collect_files(&self, id: &SessionId) -> Result<FileCollection, StoreError> {
        let (record, files) = {
            let state = self.state.lock();
            let entry = state
                .sessions
                .get(id)
                .ok_or_else(|| StoreError::UnknownSession(id.to_string()))?;
            (entry.record.clone(), entry.files.clone())
        };

        let mut primary: Option<FileLines> = None;
        let mut sidechains = Vec::new();
        for (name, file) in files {
            let content = if file.cursor == 0 {
                Vec::new()
            } else {
                lines::read_prefix(&self.line_path(id, &name), file.cursor)?
            };
            let file_lines = FileLines::new(name, file.kind, content);
            if primary.is_none() && file.kind == FileKind::Transcript {
                primary = Some(file_lines);
            } else {
                sidechains.push(file_lines);
            }
        }

        let primary = primary.unwrap_or_else(|| {
            let name = Path::new(&record.transcript_path)
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "transcript.jsonl".to_string());
            FileLines::new(name, FileKind::Transcript, Vec::new())
        });

        Ok(FileCollection::new(primary, sidechains))
    }

    pub fn card(&self, id: &SessionId, kind: &str) -> Option<StoredCard> {
        self.state
            .lock()
            .sessions
            .get(id)?
            .cards
            .get(kind)
            .cloned()
    }

    pub fn put_card(&self, id: &SessionId, card: StoredCard) -> Result<(), StoreError> {
        let mut state = self.state.lock();
        let entry = state
            .sessions
            .get_mut(id)
            .ok_or_else(|| StoreError::UnknownSession(id.to_string()))?;
        entry.cards.insert(card.kind.clone(), card);
        Ok(())
    }

    /// Persist the card cache snapshot.
    pub fn save_cards(&self) -> Result<(), SnapshotError> {
        let cards = {
            let state = self.state.lock();
            CardsSnapshot {
                cards: state
                    .sessions
                    .iter()
                    .filter(|(_, e)| !e.cards.is_empty())
                    .map(|(id, e)| (id.to_string(), e.cards.clone()))
                    .collect(),
            }
        };
        snapshot::save(&self.data_dir.join("cards.json.zst"), &cards)
    }
}

fn cursors_of(entry: &SessionEntry) -> BTreeMap<String, FileCursor> {
    entry
        .files
        .iter()
        .map(|(name, f)| {
            (
                name.clone(),
                FileCursor {
                    last_synced_line: f.cursor,
                },
            )
        })
        .collect()
}

/// Write a small JSON file atomically (temp + rename).
fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("tmp");
    std::fs::write(&tmp, serde_json::to_vec_pretty(value)?)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
