// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Token usage card: totals and per-model breakdown from assistant records.

use crate::{Analyzer, AnalyzerError};
use confab_transcript::FileCollection;
use serde::Serialize;
use std::collections::BTreeMap;

const VERSION: u32 = 1;

#[derive(Debug, Default, Clone, Serialize)]
struct Totals {
    input_tokens: u64,
    output_tokens: u64,
    cache_creation_input_tokens: u64,
    cache_read_input_tokens: u64,
}

impl Totals {
    fn add(&mut self, usage: &confab_transcript::TokenUsage) {
        self.input_tokens += usage.input_tokens;
        self.output_tokens += usage.output_tokens;
        self.cache_creation_input_tokens += usage.cache_creation_input_tokens;
        self.cache_read_input_tokens += usage.cache_read_input_tokens;
    }
}

#[derive(Debug, Default, Serialize)]
struct UsageCard {
    #[serde(flatten)]
    totals: Totals,
    assistant_messages: u64,
    by_model: BTreeMap<String, Totals>,
}

/// `usage` card analyzer.
pub struct UsageAnalyzer;

impl Analyzer for UsageAnalyzer {
    fn kind(&self) -> &'static str {
        "usage"
    }

    fn version(&self) -> u32 {
        VERSION
    }

    fn analyze(&self, files: &FileCollection) -> Result<serde_json::Value, AnalyzerError> {
        let mut card = UsageCard::default();
        for record in files.records() {
            if !record.is_assistant() {
                continue;
            }
            card.assistant_messages += 1;
            let Some(usage) = record.usage() else {
                continue;
            };
            card.totals.add(&usage);
            if let Some(model) = record.model() {
                card.by_model.entry(model.to_string()).or_default().add(&usage);
            }
        }
        Ok(serde_json::to_value(card)?)
    }
}

#[cfg(test)]
#[path = "usage_tests.rs"]
mod tests;
