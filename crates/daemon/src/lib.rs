// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Per-session sync daemon (`confabd`).
//!
//! One daemon per agent session: it tails the session's transcript and
//! sidechain files and streams new lines to the backend until the session
//! ends. The CLI's hook commands spawn and stop it; the state store under
//! `<home>/.confab/daemons/` is how everyone else finds it.

pub mod env;
pub mod spawn;
pub mod state;
pub mod sync;

pub use spawn::{find_daemon_binary, spawn_daemon, SpawnContext, SpawnError};
pub use state::{is_live, process_exists, signal_stop, DaemonState, StateStore};
pub use sync::{SyncDaemon, TickReport};
