// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `confab hook` - host-agent hook entry points.
//!
//! The host agent invokes these with a JSON object on stdin and parses one
//! JSON object from stdout. Whatever goes wrong, the response is written and
//! the exit code is zero: the hook must never block or fail the host.
//! Diagnostics go to stderr only.

use anyhow::{anyhow, bail, Result};
use clap::{Args, Subcommand};
use confab_core::ExternalId;
use confab_daemon::spawn::{spawn_daemon, SpawnContext};
use confab_daemon::state::{is_live, signal_stop, StateStore};
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::PathBuf;

#[derive(Args)]
pub struct HookArgs {
    #[command(subcommand)]
    pub command: HookCommand,
}

#[derive(Subcommand)]
pub enum HookCommand {
    /// Session start: ensure a sync daemon is running for this session
    Start,
    /// Session stop: ask the daemon to final-flush and exit
    Stop,
}

/// Input written by the host agent to our stdin.
#[derive(Debug, Default, Deserialize)]
struct HookInput {
    #[serde(default)]
    session_id: String,
    #[serde(default)]
    transcript_path: String,
    #[serde(default)]
    cwd: String,
    /// Why the hook fired; informational only.
    #[serde(default)]
    #[allow(dead_code)]
    reason: String,
}

/// Output the host agent expects on our stdout.
#[derive(Serialize)]
struct HookResponse {
    #[serde(rename = "continue")]
    continue_: bool,
    #[serde(rename = "stopReason")]
    stop_reason: String,
    #[serde(rename = "suppressOutput")]
    suppress_output: bool,
}

/// Literal fallback should serialization itself fail.
const FALLBACK_RESPONSE: &str = r#"{"continue":true,"stopReason":"","suppressOutput":true}"#;

pub fn run(args: HookArgs) -> Result<()> {
    let input = read_hook_input();
    let outcome = match args.command {
        HookCommand::Start => handle_start(&input),
        HookCommand::Stop => handle_stop(&input),
    };
    if let Err(e) = outcome {
        eprintln!("confab hook: {e}");
    }
    println!("{}", response_line());
    Ok(())
}

/// Read and parse stdin, falling back to defaults on any failure.
fn read_hook_input() -> HookInput {
    let mut raw = String::new();
    if std::io::stdin().read_to_string(&mut raw).is_err() {
        return HookInput::default();
    }
    parse_hook_input(&raw)
}

fn parse_hook_input(raw: &str) -> HookInput {
    serde_json::from_str(raw).unwrap_or_default()
}

fn response_line() -> String {
    serde_json::to_string(&HookResponse {
        continue_: true,
        stop_reason: String::new(),
        suppress_output: true,
    })
    .unwrap_or_else(|_| FALLBACK_RESPONSE.to_string())
}

fn handle_start(input: &HookInput) -> Result<()> {
    if input.session_id.is_empty() || input.transcript_path.is_empty() {
        bail!("start hook input missing session_id or transcript_path");
    }
    let external_id = ExternalId::new(&input.session_id);
    if !external_id.is_path_safe() {
        bail!("session_id {:?} is not a safe file name", input.session_id);
    }
    let store = StateStore::open_default()
        .ok_or_else(|| anyhow!("could not determine daemons directory"))?;

    if let Some(state) = store.load(&external_id) {
        if is_live(&state) {
            eprintln!("confab hook: daemon already running (pid {})", state.pid);
            return Ok(());
        }
        // Crashed daemon left its state behind.
        let _ = store.remove(&external_id);
    }

    let ctx = SpawnContext {
        external_id,
        transcript_path: PathBuf::from(&input.transcript_path),
        cwd: PathBuf::from(&input.cwd),
        // Our parent is the host agent; the daemon watches it.
        host_pid: Some(std::os::unix::process::parent_id()),
    };
    let pid = spawn_daemon(&store, &ctx)?;
    eprintln!("confab hook: daemon started (pid {pid})");
    Ok(())
}

fn handle_stop(input: &HookInput) -> Result<()> {
    if input.session_id.is_empty() {
        bail!("stop hook input missing session_id");
    }
    let external_id = ExternalId::new(&input.session_id);
    if !external_id.is_path_safe() {
        bail!("session_id {:?} is not a safe file name", input.session_id);
    }
    let store = StateStore::open_default()
        .ok_or_else(|| anyhow!("could not determine daemons directory"))?;

    let Some(state) = store.load(&external_id) else {
        return Ok(());
    };
    if is_live(&state) {
        // The daemon final-flushes and removes its own state file. We do
        // not wait: background upload continues after the host exits.
        signal_stop(state.pid);
        eprintln!("confab hook: stop signaled (pid {})", state.pid);
    } else {
        let _ = store.remove(&external_id);
    }
    Ok(())
}

#[cfg(test)]
#[path = "hook_tests.rs"]
mod tests;
