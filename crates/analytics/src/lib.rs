// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Per-session analytics cards, computed lazily over stored transcript lines.
//!
//! Each card kind has one analyzer: a pure function of the session's
//! [`FileCollection`] with a schema version baked into the code. Analyzers
//! are wired up in an explicit list ([`analyzers`]); adding a kind means
//! adding an analyzer there, and changing a payload schema means bumping
//! that analyzer's version constant, which invalidates cached cards.

pub mod activity;
pub mod engine;
pub mod turns;
pub mod usage;

use confab_transcript::FileCollection;
use thiserror::Error;

pub use engine::{AnalyticsEngine, AnalyticsResult};

/// Failure of a single analyzer. Never fatal to the analytics read: the
/// engine records the error against the kind and keeps the previous card.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct AnalyzerError(pub String);

impl From<serde_json::Error> for AnalyzerError {
    fn from(e: serde_json::Error) -> Self {
        Self(e.to_string())
    }
}

/// A card analyzer: pure, no I/O, bounded time on bounded input.
pub trait Analyzer: Send + Sync {
    /// Kind tag, unique across the registry.
    fn kind(&self) -> &'static str;

    /// Schema version of the payload this analyzer produces.
    fn version(&self) -> u32;

    /// Optional freshness window: a cached card within this window is served
    /// even when the line count moved on. For kinds whose recompute cost
    /// outweighs exactness.
    fn freshness(&self) -> Option<chrono::Duration> {
        None
    }

    fn analyze(&self, files: &FileCollection) -> Result<serde_json::Value, AnalyzerError>;
}

/// The card registry.
pub fn analyzers() -> &'static [&'static dyn Analyzer] {
    &[
        &usage::UsageAnalyzer,
        &activity::ActivityAnalyzer,
        &turns::TurnsAnalyzer,
    ]
}
