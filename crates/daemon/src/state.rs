// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon state files and liveness probes.
//!
//! One JSON file per session under the daemons directory. The file is
//! created by the daemon after it takes its exclusive lock, deleted by the
//! daemon on clean exit, and pruned by enumerators once the PID is verified
//! dead. Liveness pairs a null signal with a process start-time comparison
//! so a recycled PID does not masquerade as a running daemon.

use confab_core::ExternalId;
use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::warn;

/// Allowed skew between the recorded start time and the one read from the
/// process table.
const START_TIME_TOLERANCE_SECS: u64 = 5;

/// On-disk record of a running (or crashed) per-session daemon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaemonState {
    pub external_id: ExternalId,
    pub pid: u32,
    /// Unix seconds at daemon start.
    pub started_at: u64,
    pub transcript_path: PathBuf,
}

impl DaemonState {
    pub fn for_current_process(external_id: ExternalId, transcript_path: PathBuf) -> Self {
        Self {
            external_id,
            pid: std::process::id(),
            started_at: unix_now(),
            transcript_path,
        }
    }
}

pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Store for per-session daemon state files.
#[derive(Debug, Clone)]
pub struct StateStore {
    dir: PathBuf,
}

impl StateStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Store under the default daemons directory.
    pub fn open_default() -> Option<Self> {
        crate::env::daemons_dir().map(Self::new)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn state_path(&self, id: &ExternalId) -> PathBuf {
        self.dir.join(format!("{id}.json"))
    }

    /// Lock file guarding the at-most-one-daemon invariant for a session.
    pub fn lock_path(&self, id: &ExternalId) -> PathBuf {
        self.dir.join(format!("{id}.lock"))
    }

    /// Write a state file atomically (temp + rename).
    pub fn save(&self, state: &DaemonState) -> io::Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.state_path(&state.external_id);
        let tmp = path.with_extension("tmp");
        std::fs::write(&tmp, serde_json::to_vec_pretty(state).map_err(io::Error::other)?)?;
        std::fs::rename(&tmp, path)
    }

    /// Load a session's state, `None` if absent or unreadable.
    pub fn load(&self, id: &ExternalId) -> Option<DaemonState> {
        let content = std::fs::read_to_string(self.state_path(id)).ok()?;
        match serde_json::from_str(&content) {
            Ok(state) => Some(state),
            Err(e) => {
                warn!(external_id = %id, error = %e, "unreadable daemon state file");
                None
            }
        }
    }

    pub fn remove(&self, id: &ExternalId) -> io::Result<()> {
        match std::fs::remove_file(self.state_path(id)) {
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            other => other,
        }
    }

    /// All parseable state files in the directory.
    pub fn list_all(&self) -> Vec<DaemonState> {
        let Ok(entries) = std::fs::read_dir(&self.dir) else {
            return Vec::new();
        };
        let mut states: Vec<DaemonState> = entries
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().is_some_and(|x| x == "json"))
            .filter_map(|e| {
                let content = std::fs::read_to_string(e.path()).ok()?;
                serde_json::from_str(&content).ok()
            })
            .collect();
        states.sort_by(|a: &DaemonState, b: &DaemonState| a.external_id.cmp(&b.external_id));
        states
    }

    /// Remove state files whose daemon is verifiably dead. Returns the
    /// external IDs that were pruned.
    pub fn prune_stale(&self) -> Vec<ExternalId> {
        let mut pruned = Vec::new();
        for state in self.list_all() {
            if !is_live(&state) {
                if self.remove(&state.external_id).is_ok() {
                    pruned.push(state.external_id);
                }
            }
        }
        pruned
    }
}

/// Execute kill with the given signal and PID.
fn kill_signal(signal: &str, pid: u32) -> bool {
    Command::new("kill")
        .args([signal, &pid.to_string()])
        .stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Null-signal probe: is the PID signalable?
pub fn process_exists(pid: u32) -> bool {
    kill_signal("-0", pid)
}

/// Ask the daemon to stop (it final-flushes and removes its own state).
pub fn signal_stop(pid: u32) -> bool {
    kill_signal("-15", pid)
}

/// A daemon is live when its PID is signalable and, where the process table
/// exposes start times, the start time matches the recorded one.
pub fn is_live(state: &DaemonState) -> bool {
    if !process_exists(state.pid) {
        return false;
    }
    match process_start_time(state.pid) {
        Some(start) => start.abs_diff(state.started_at) <= START_TIME_TOLERANCE_SECS,
        None => true,
    }
}

/// Process start time in unix seconds, via `/proc` on Linux.
#[cfg(target_os = "linux")]
pub fn process_start_time(pid: u32) -> Option<u64> {
    // Field 22 of /proc/<pid>/stat is the start time in clock ticks since
    // boot. The comm field (2) may contain spaces, so split after the
    // closing paren.
    let stat = std::fs::read_to_string(format!("/proc/{pid}/stat")).ok()?;
    let rest = &stat[stat.rfind(')')? + 1..];
    let start_ticks: u64 = rest.split_whitespace().nth(19)?.parse().ok()?;

    let boot_time = std::fs::read_to_string("/proc/stat")
        .ok()?
        .lines()
        .find_map(|l| l.strip_prefix("btime "))
        .and_then(|v| v.trim().parse::<u64>().ok())?;

    // USER_HZ is 100 on every mainstream Linux configuration.
    Some(boot_time + start_ticks / 100)
}

#[cfg(not(target_os = "linux"))]
pub fn process_start_time(_pid: u32) -> Option<u64> {
    None
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
