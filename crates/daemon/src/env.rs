// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the daemon crate.

use std::path::PathBuf;
use std::time::Duration;

/// Default tick interval between sync passes.
pub const DEFAULT_TICK: Duration = Duration::from_secs(30);

/// Resolve the log directory: `CONFAB_LOG_DIR` > `<home>/.confab/logs`.
pub fn log_dir() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var("CONFAB_LOG_DIR") {
        return Some(PathBuf::from(dir));
    }
    confab_client::confab_home().ok().map(|h| h.join("logs"))
}

/// Directory holding per-session daemon state files.
pub fn daemons_dir() -> Option<PathBuf> {
    confab_client::confab_home().ok().map(|h| h.join("daemons"))
}

/// Tick interval override: `CONFAB_TICK_MS` (used mainly by tests).
pub fn tick_interval() -> Duration {
    std::env::var("CONFAB_TICK_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(DEFAULT_TICK)
}

/// Daemon binary override: `CONFAB_DAEMON_BINARY`.
pub fn daemon_binary() -> Option<String> {
    std::env::var("CONFAB_DAEMON_BINARY").ok()
}
