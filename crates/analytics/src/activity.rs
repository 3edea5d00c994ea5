// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Activity card: tool invocation counts extracted from assistant messages.

use crate::{Analyzer, AnalyzerError};
use confab_transcript::FileCollection;
use serde::Serialize;
use std::collections::BTreeMap;

const VERSION: u32 = 1;

/// Scanning every content block of every assistant message makes this the
/// most expensive card, so a freshly computed one is served for a while even
/// as lines keep arriving.
const FRESHNESS_HOURS: i64 = 1;

#[derive(Debug, Default, Serialize)]
struct ActivityCard {
    file_reads: u64,
    file_writes: u64,
    file_edits: u64,
    commands: u64,
    tool_calls: BTreeMap<String, u64>,
}

/// `activity` card analyzer.
pub struct ActivityAnalyzer;

impl Analyzer for ActivityAnalyzer {
    fn kind(&self) -> &'static str {
        "activity"
    }

    fn version(&self) -> u32 {
        VERSION
    }

    fn freshness(&self) -> Option<chrono::Duration> {
        Some(chrono::Duration::hours(FRESHNESS_HOURS))
    }

    fn analyze(&self, files: &FileCollection) -> Result<serde_json::Value, AnalyzerError> {
        let mut card = ActivityCard::default();
        for record in files.records() {
            for tool_use in record.tool_uses() {
                *card.tool_calls.entry(tool_use.name.to_string()).or_default() += 1;
                match tool_use.name {
                    "Read" => card.file_reads += 1,
                    "Write" => card.file_writes += 1,
                    "Edit" | "NotebookEdit" => card.file_edits += 1,
                    "Bash" => card.commands += 1,
                    _ => {}
                }
            }
        }
        Ok(serde_json::to_value(card)?)
    }
}

#[cfg(test)]
#[path = "activity_tests.rs"]
mod tests;
