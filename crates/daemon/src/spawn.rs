// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Detached daemon spawning.
//!
//! The hook command forks `confabd` into its own process group with null
//! stdio and hands it the session metadata over a stdin pipe: nothing
//! sensitive rides on argv. The child announces readiness by writing its
//! state file; the parent waits a bounded time for it.

use crate::state::StateStore;
use confab_core::ExternalId;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::os::unix::process::CommandExt;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};
use thiserror::Error;

/// How long the parent waits for the child's state file.
const SPAWN_WAIT: Duration = Duration::from_secs(10);
const SPAWN_POLL: Duration = Duration::from_millis(50);

/// Session metadata handed to the daemon over its stdin pipe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnContext {
    pub external_id: ExternalId,
    pub transcript_path: PathBuf,
    pub cwd: PathBuf,
    /// PID of the host agent process; the daemon exits when it disappears.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_pid: Option<u32>,
}

/// Errors spawning the daemon.
#[derive(Debug, Error)]
pub enum SpawnError {
    #[error("failed to spawn {}: {source}", .binary.display())]
    Spawn {
        binary: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write spawn context: {0}")]
    Pipe(#[from] std::io::Error),
    #[error("daemon exited during startup with {0}")]
    Exited(std::process::ExitStatus),
    #[error("daemon did not write its state file within {SPAWN_WAIT:?}")]
    Timeout,
}

/// Locate the `confabd` binary.
///
/// `CONFAB_DAEMON_BINARY` > sibling of the current executable > `PATH`.
pub fn find_daemon_binary() -> PathBuf {
    if let Some(path) = crate::env::daemon_binary() {
        return PathBuf::from(path);
    }

    if let Ok(exe) = std::env::current_exe() {
        if let Some(dir) = exe.parent() {
            let sibling = dir.join("confabd");
            if sibling.exists() {
                return sibling;
            }
        }
    }

    PathBuf::from("confabd")
}

/// Spawn a detached daemon for the session and wait for its state file.
///
/// Returns the child PID. The caller is expected to have checked that no
/// live daemon exists; the daemon's own file lock is the authoritative
/// guard, so a lost race just means the child exits "already running".
pub fn spawn_daemon(store: &StateStore, ctx: &SpawnContext) -> Result<u32, SpawnError> {
    let binary = find_daemon_binary();

    let mut child = Command::new(&binary)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .process_group(0)
        .spawn()
        .map_err(|source| SpawnError::Spawn {
            binary: binary.clone(),
            source,
        })?;

    if let Some(mut stdin) = child.stdin.take() {
        let payload = serde_json::to_vec(ctx).map_err(std::io::Error::other)?;
        stdin.write_all(&payload)?;
        // Dropping stdin closes the pipe; the child sees EOF.
    }

    let pid = child.id();
    let start = Instant::now();
    while start.elapsed() < SPAWN_WAIT {
        if let Some(state) = store.load(&ctx.external_id) {
            if crate::state::process_exists(state.pid) {
                return Ok(state.pid);
            }
        }
        if let Ok(Some(status)) = child.try_wait() {
            if !status.success() {
                return Err(SpawnError::Exited(status));
            }
        }
        std::thread::sleep(SPAWN_POLL);
    }

    tracing::warn!(%pid, "daemon did not report ready in time");
    Err(SpawnError::Timeout)
}

#[cfg(test)]
#[path = "spawn_tests.rs"]
mod tests;
