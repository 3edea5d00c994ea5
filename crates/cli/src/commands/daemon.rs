// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `confab daemon` - sync daemon management.

use anyhow::{anyhow, Result};
use clap::{Args, Subcommand};
use confab_core::ExternalId;
use confab_daemon::state::{is_live, process_exists, signal_stop, StateStore};
use std::time::Duration;

/// How long `daemon stop` waits for a clean exit before reporting.
const STOP_WAIT: Duration = Duration::from_secs(5);

#[derive(Args)]
pub struct DaemonArgs {
    #[command(subcommand)]
    pub command: DaemonCommand,
}

#[derive(Subcommand)]
pub enum DaemonCommand {
    /// List sync daemons and their liveness
    List,
    /// Stop the sync daemon for a session
    Stop {
        /// External session ID
        session_id: String,
    },
}

pub async fn run(args: DaemonArgs) -> Result<()> {
    let store = StateStore::open_default()
        .ok_or_else(|| anyhow!("could not determine daemons directory"))?;
    match args.command {
        DaemonCommand::List => list(&store),
        DaemonCommand::Stop { session_id } => stop(&store, &session_id).await,
    }
}

fn list(store: &StateStore) -> Result<()> {
    let states = store.list_all();
    if states.is_empty() {
        println!("no sync daemons");
        return Ok(());
    }
    for state in states {
        let liveness = if is_live(&state) { "running" } else { "stale" };
        println!(
            "{}  pid {}  {}  {}",
            state.external_id,
            state.pid,
            liveness,
            state.transcript_path.display()
        );
    }
    Ok(())
}

async fn stop(store: &StateStore, session_id: &str) -> Result<()> {
    let external_id = ExternalId::new(session_id);
    let Some(state) = store.load(&external_id) else {
        println!("no daemon for {session_id}");
        return Ok(());
    };

    if !is_live(&state) {
        store.remove(&external_id)?;
        println!("removed stale state for {session_id}");
        return Ok(());
    }

    signal_stop(state.pid);

    // The daemon deletes its own state after the final flush.
    let start = std::time::Instant::now();
    while start.elapsed() < STOP_WAIT {
        if !process_exists(state.pid) {
            println!("daemon stopped");
            return Ok(());
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    println!("stop signaled (pid {}), still flushing", state.pid);
    Ok(())
}
