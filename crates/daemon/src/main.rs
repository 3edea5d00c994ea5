// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Confab sync daemon (confabd)
//!
//! Detached per-session process that tails the session's transcript files
//! and streams new lines to the backend. Spawned by `confab hook start`
//! with its session metadata on stdin; stopped by SIGTERM from
//! `confab hook stop` (one final flush, then exit).

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

use confab_client::{Config, HttpSyncClient};
use confab_core::Redactor;
use confab_daemon::spawn::SpawnContext;
use confab_daemon::state::{DaemonState, StateStore};
use confab_daemon::sync::SyncDaemon;
use fs2::FileExt;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use thiserror::Error;
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::mpsc;
use tracing::{error, info};

/// Daemon startup/runtime errors.
#[derive(Debug, Error)]
enum DaemonError {
    #[error("could not determine state directories (no home?)")]
    NoStateDir,

    #[error("no spawn context on stdin: {0}")]
    NoContext(String),

    #[error("failed to acquire session lock: daemon already running?")]
    LockFailed(#[source] std::io::Error),

    #[error("config error: {0}")]
    Config(#[from] confab_client::ConfigError),

    #[error("redaction config error: {0}")]
    Redaction(#[from] confab_core::RedactError),

    #[error("sync error: {0}")]
    Api(#[from] confab_client::ApiError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[tokio::main]
async fn main() -> ExitCode {
    if let Some(arg) = std::env::args().nth(1) {
        match arg.as_str() {
            "--version" | "-V" | "-v" => {
                println!("confabd {}", env!("CARGO_PKG_VERSION"));
                return ExitCode::SUCCESS;
            }
            "--help" | "-h" | "help" => {
                println!("confabd {}", env!("CARGO_PKG_VERSION"));
                println!("Confab sync daemon - streams one session's transcript to the backend");
                println!();
                println!("The daemon is spawned by `confab hook start` and reads its session");
                println!("context as JSON from stdin. It should not be invoked directly.");
                return ExitCode::SUCCESS;
            }
            _ => {
                eprintln!("error: unexpected argument '{arg}'");
                eprintln!("Usage: confabd [--help | --version]");
                return ExitCode::FAILURE;
            }
        }
    }

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            // Stderr is usually /dev/null for a detached daemon; the log
            // file carries the real diagnostics.
            eprintln!("confabd: {e}");
            error!("daemon failed: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), DaemonError> {
    let ctx = read_spawn_context()?;

    let log_dir = confab_daemon::env::log_dir().ok_or(DaemonError::NoStateDir)?;
    let log_path = log_dir.join("confab.log");
    rotate_log_if_needed(&log_path);
    let _log_guard = setup_logging(&log_path)?;

    info!(
        external_id = %ctx.external_id,
        transcript = %ctx.transcript_path.display(),
        pid = std::process::id(),
        "confabd starting"
    );

    let store = StateStore::open_default().ok_or(DaemonError::NoStateDir)?;
    std::fs::create_dir_all(store.dir())?;

    // The exclusive lock is the at-most-one-daemon guard; it is held for
    // the daemon's lifetime and released by the OS on exit, so a crashed
    // daemon never blocks a new one.
    let lock_file = acquire_session_lock(&store, &ctx)?;

    let state = DaemonState::for_current_process(
        ctx.external_id.clone(),
        ctx.transcript_path.clone(),
    );
    store.save(&state)?;

    let result = run_sync(&ctx).await;

    if let Err(e) = store.remove(&ctx.external_id) {
        error!("failed to remove daemon state: {e}");
    }
    drop(lock_file);

    match &result {
        Ok(()) => info!(external_id = %ctx.external_id, "confabd exiting cleanly"),
        Err(e) => error!(external_id = %ctx.external_id, "confabd exiting with error: {e}"),
    }
    result
}

async fn run_sync(ctx: &SpawnContext) -> Result<(), DaemonError> {
    let config = Config::load()?;
    let client = Arc::new(HttpSyncClient::new(&config)?);

    // Read once at startup: mid-run edits must not produce uploads with
    // mixed redaction policies.
    let confab_home = confab_client::confab_home()?;
    let redactor = Redactor::from_config_dir(&confab_home)?;
    if redactor.is_some() {
        info!("redaction enabled");
    }

    let mut daemon = SyncDaemon::init(client, ctx, redactor).await?;
    info!(session_id = %daemon.session_id(), "init complete");

    let (stop_tx, stop_rx) = mpsc::channel(1);
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;
    tokio::spawn(async move {
        tokio::select! {
            _ = sigterm.recv() => info!("received SIGTERM"),
            _ = sigint.recv() => info!("received SIGINT"),
        }
        let _ = stop_tx.send(()).await;
    });

    daemon.run(stop_rx, ctx.host_pid).await?;
    Ok(())
}

/// Read the spawn context JSON from stdin (closed by the parent after
/// writing, so this terminates immediately).
fn read_spawn_context() -> Result<SpawnContext, DaemonError> {
    let mut input = String::new();
    std::io::stdin()
        .read_to_string(&mut input)
        .map_err(|e| DaemonError::NoContext(e.to_string()))?;
    let ctx: SpawnContext =
        serde_json::from_str(&input).map_err(|e| DaemonError::NoContext(e.to_string()))?;
    // The external ID names our state and lock files.
    if !ctx.external_id.is_path_safe() {
        return Err(DaemonError::NoContext(format!(
            "external id {:?} is not a safe file name",
            ctx.external_id.as_str()
        )));
    }
    Ok(ctx)
}

fn acquire_session_lock(store: &StateStore, ctx: &SpawnContext) -> Result<File, DaemonError> {
    // Avoid truncating: the file belongs to the running daemon if the lock
    // is held elsewhere.
    let lock_file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(store.lock_path(&ctx.external_id))?;
    lock_file
        .try_lock_exclusive()
        .map_err(DaemonError::LockFailed)?;
    Ok(lock_file)
}

/// Maximum log file size before rotation (10 MB).
const MAX_LOG_SIZE: u64 = 10 * 1024 * 1024;

/// Number of rotated log files to keep (confab.log.1, .2, .3).
const MAX_ROTATED_LOGS: u32 = 3;

/// Rotate the log file if it exceeds [`MAX_LOG_SIZE`].
///
/// Shifts `confab.log` → `confab.log.1` → `confab.log.2` → `confab.log.3`,
/// deleting the oldest. Best-effort: rotation failures must not stop the
/// daemon from starting.
fn rotate_log_if_needed(log_path: &Path) {
    let size = match std::fs::metadata(log_path) {
        Ok(m) => m.len(),
        Err(_) => return,
    };
    if size < MAX_LOG_SIZE {
        return;
    }

    let log_str = log_path.display().to_string();
    for i in (1..MAX_ROTATED_LOGS).rev() {
        let from = format!("{log_str}.{i}");
        let to = format!("{log_str}.{}", i + 1);
        let _ = std::fs::rename(&from, &to);
    }
    let _ = std::fs::rename(log_path, format!("{log_str}.1"));
}

fn setup_logging(
    log_path: &Path,
) -> Result<tracing_appender::non_blocking::WorkerGuard, DaemonError> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let dir = log_path.parent().map(PathBuf::from).unwrap_or_default();
    std::fs::create_dir_all(&dir)?;

    let file_name = log_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "confab.log".to_string());
    let file_appender = tracing_appender::rolling::never(&dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(non_blocking))
        .init();

    Ok(guard)
}
