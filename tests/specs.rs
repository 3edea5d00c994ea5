//! Behavioral specifications for the Confab sync system.
//!
//! These tests are black-box where it matters: they run the real binaries
//! against an in-process backend with a hermetic `$HOME`, and verify the
//! wire protocol end to end.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

#[path = "specs/prelude.rs"]
mod prelude;

// sync/
#[path = "specs/sync/cold_start.rs"]
mod sync_cold_start;
#[path = "specs/sync/conflict.rs"]
mod sync_conflict;
#[path = "specs/sync/resume.rs"]
mod sync_resume;
#[path = "specs/sync/sidechain.rs"]
mod sync_sidechain;

// daemon/
#[path = "specs/daemon/hooks.rs"]
mod daemon_hooks;
#[path = "specs/daemon/lifecycle.rs"]
mod daemon_lifecycle;

#[path = "specs/analytics.rs"]
mod analytics;
#[path = "specs/redaction.rs"]
mod redaction;
