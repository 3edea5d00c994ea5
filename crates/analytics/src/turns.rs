// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Turns card: conversation shape from the primary transcript.

use crate::{Analyzer, AnalyzerError};
use confab_transcript::FileCollection;
use serde::Serialize;

const VERSION: u32 = 1;

#[derive(Debug, Default, Serialize)]
struct TurnsCard {
    /// Assistant messages in the primary transcript.
    turns: u64,
    /// User messages in the primary transcript.
    user_prompts: u64,
    sidechains: u64,
    total_lines: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    first_timestamp: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_timestamp: Option<String>,
}

/// `turns` card analyzer.
pub struct TurnsAnalyzer;

impl Analyzer for TurnsAnalyzer {
    fn kind(&self) -> &'static str {
        "turns"
    }

    fn version(&self) -> u32 {
        VERSION
    }

    fn analyze(&self, files: &FileCollection) -> Result<serde_json::Value, AnalyzerError> {
        let mut card = TurnsCard {
            sidechains: files.sidechains.len() as u64,
            total_lines: files.total_lines(),
            ..Default::default()
        };

        for record in files.primary_records() {
            if record.is_assistant() {
                card.turns += 1;
            } else if record.is_user() {
                card.user_prompts += 1;
            }
            if let Some(ts) = record.timestamp() {
                if card.first_timestamp.is_none() {
                    card.first_timestamp = Some(ts.to_string());
                }
                card.last_timestamp = Some(ts.to_string());
            }
        }

        Ok(serde_json::to_value(card)?)
    }
}

#[cfg(test)]
#[path = "turns_tests.rs"]
mod tests;
