// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Confab backend server
//!
//! Accepts transcript sync uploads and serves per-session analytics.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

use clap::Parser;
use confab_analytics::AnalyticsEngine;
use confab_server::{build_router, AppState};
use confab_store::SyncStore;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal::unix::{signal, SignalKind};
use tracing::{info, warn};

/// Interval between card-cache snapshots.
const SNAPSHOT_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Parser)]
#[command(
    name = "confab-server",
    version,
    about = "Confab backend - ingests transcript sync uploads and serves analytics"
)]
struct Args {
    /// Address to listen on
    #[arg(long, default_value = "127.0.0.1:8787")]
    listen: SocketAddr,

    /// Data directory for session records and line storage
    #[arg(long, default_value = "confab-data")]
    data_dir: PathBuf,

    /// Bearer token clients must present
    #[arg(long, env = "CONFAB_SERVER_API_KEY")]
    api_key: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let store = Arc::new(SyncStore::open(&args.data_dir)?);
    let state = AppState {
        store: Arc::clone(&store),
        engine: AnalyticsEngine::new(),
        api_key: Arc::new(args.api_key),
    };

    spawn_snapshot_task(Arc::clone(&store));

    let listener = tokio::net::TcpListener::bind(args.listen).await?;
    info!(listen = %args.listen, data_dir = %args.data_dir.display(), "confab-server ready");

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Final snapshot so a restart serves cached cards immediately.
    if let Err(e) = store.save_cards() {
        warn!("failed to save final card snapshot: {e}");
    }
    info!("confab-server stopped");
    Ok(())
}

/// Periodically persist the card cache. Losing it only costs a recompute.
fn spawn_snapshot_task(store: Arc<SyncStore>) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SNAPSHOT_INTERVAL);
        interval.tick().await; // first tick fires immediately
        loop {
            interval.tick().await;
            if let Err(e) = store.save_cards() {
                warn!("card snapshot failed: {e}");
            }
        }
    });
}

async fn shutdown_signal() {
    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(s) => s,
        Err(_) => return std::future::pending().await,
    };
    let mut sigint = match signal(SignalKind::interrupt()) {
        Ok(s) => s,
        Err(_) => return std::future::pending().await,
    };
    tokio::select! {
        _ = sigterm.recv() => info!("received SIGTERM, shutting down"),
        _ = sigint.recv() => info!("received SIGINT, shutting down"),
    }
}
