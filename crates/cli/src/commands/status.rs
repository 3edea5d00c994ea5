// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `confab status` - sync health overview.

use anyhow::Result;
use confab_client::{Config, HttpSyncClient, SyncApi};
use confab_daemon::state::StateStore;

pub async fn run() -> Result<()> {
    print_backend_status().await;
    print_hook_status();
    print_daemon_status();
    Ok(())
}

async fn print_backend_status() {
    let config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            println!("backend:  not configured ({e})");
            return;
        }
    };
    println!("backend:  {}", config.backend_url);

    match HttpSyncClient::new(&config) {
        Ok(client) => match client.validate().await {
            Ok(true) => println!("auth:     valid"),
            Ok(false) => println!("auth:     INVALID (check api_key)"),
            Err(e) => println!("auth:     unreachable ({e})"),
        },
        Err(e) => println!("auth:     {e}"),
    }
}

/// Best-effort: look for a confab hook in the host agent's settings.
fn print_hook_status() {
    let installed = dirs::home_dir()
        .map(|h| h.join(".claude").join("settings.json"))
        .and_then(|p| std::fs::read_to_string(p).ok())
        .is_some_and(|content| content.contains("confab"));
    println!(
        "hooks:    {}",
        if installed { "installed" } else { "not detected" }
    );
}

fn print_daemon_status() {
    let Some(store) = StateStore::open_default() else {
        println!("daemons:  state directory unavailable");
        return;
    };

    let pruned = store.prune_stale();
    for id in &pruned {
        println!("daemons:  pruned stale state for {id}");
    }

    let running = store.list_all();
    if running.is_empty() {
        println!("daemons:  none running");
        return;
    }
    println!("daemons:  {} running", running.len());
    for state in running {
        println!(
            "  {}  pid {}  {}",
            state.external_id,
            state.pid,
            state.transcript_path.display()
        );
    }
}
