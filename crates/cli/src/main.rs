// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! confab - transcript sync CLI

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{daemon, hook, status};

#[derive(Parser)]
#[command(
    name = "confab",
    version,
    about = "Confab - streams agent session transcripts to your backend"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Host-agent hook entry points (reads JSON from stdin)
    Hook(hook::HookArgs),
    /// Show sync health: config, auth, running daemons
    Status,
    /// Sync daemon management
    Daemon(daemon::DaemonArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Hook(args) => hook::run(args),
        Commands::Status => status::run().await,
        Commands::Daemon(args) => daemon::run(args).await,
    }
}
