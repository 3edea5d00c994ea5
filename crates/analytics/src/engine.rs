// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lazy recompute engine.
//!
//! An analytics read snapshots the session's stored lines once, serves every
//! card whose cached copy is still valid, recomputes and upserts the rest,
//! and records per-kind errors without failing the read.

use crate::{analyzers, Analyzer};
use chrono::{DateTime, Utc};
use confab_core::SessionId;
use confab_store::{StoreError, StoredCard, SyncStore};
use std::collections::BTreeMap;
use tracing::warn;

/// Result of one analytics read.
#[derive(Debug, Clone)]
pub struct AnalyticsResult {
    pub computed_at: DateTime<Utc>,
    /// Total stored lines across the session's files at the snapshot.
    pub computed_lines: u64,
    pub cards: BTreeMap<String, serde_json::Value>,
    pub errors: BTreeMap<String, String>,
}

/// Per-session card reader/recomputer.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnalyticsEngine;

impl AnalyticsEngine {
    pub fn new() -> Self {
        Self
    }

    /// Read all cards for a session, recomputing stale ones.
    pub fn read(
        &self,
        store: &SyncStore,
        session_id: &SessionId,
    ) -> Result<AnalyticsResult, StoreError> {
        self.read_with(analyzers(), store, session_id)
    }

    /// [`Self::read`] against an explicit analyzer set.
    pub fn read_with(
        &self,
        analyzers: &[&dyn Analyzer],
        store: &SyncStore,
        session_id: &SessionId,
    ) -> Result<AnalyticsResult, StoreError> {
        let files = store.collect_files(session_id)?;
        let total = files.total_lines();
        let now = Utc::now();

        let mut cards = BTreeMap::new();
        let mut errors = BTreeMap::new();

        for analyzer in analyzers {
            let kind = analyzer.kind();
            let stored = store.card(session_id, kind);

            if let Some(card) = stored
                .as_ref()
                .filter(|c| card_is_valid(c, *analyzer, total, now))
            {
                cards.insert(kind.to_string(), card.payload.clone());
                continue;
            }

            match analyzer.analyze(&files) {
                Ok(payload) => {
                    store.put_card(
                        session_id,
                        StoredCard {
                            kind: kind.to_string(),
                            version: analyzer.version(),
                            computed_at: now,
                            up_to_line: total,
                            payload: payload.clone(),
                        },
                    )?;
                    cards.insert(kind.to_string(), payload);
                }
                Err(e) => {
                    warn!(session_id = %session_id, kind, error = %e, "analyzer failed");
                    errors.insert(kind.to_string(), e.to_string());
                    // The previous card, if any, is retained untouched.
                    if let Some(prev) = stored {
                        cards.insert(kind.to_string(), prev.payload);
                    }
                }
            }
        }

        Ok(AnalyticsResult {
            computed_at: now,
            computed_lines: total,
            cards,
            errors,
        })
    }
}

/// Validity predicate: version must match, and the card must either cover
/// the current line count or fall inside the analyzer's freshness window.
pub fn card_is_valid(
    card: &StoredCard,
    analyzer: &dyn Analyzer,
    total_lines: u64,
    now: DateTime<Utc>,
) -> bool {
    if card.version != analyzer.version() {
        return false;
    }
    if card.up_to_line == total_lines {
        return true;
    }
    analyzer
        .freshness()
        .is_some_and(|window| now - card.computed_at <= window)
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
