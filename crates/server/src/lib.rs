// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Confab backend HTTP endpoint.
//!
//! Bearer-auth JSON API over the sync store and analytics engine. Request
//! bodies may arrive zstd-compressed; a middleware transparently inflates
//! them before extraction.

pub mod auth;
pub mod body;
pub mod routes;

pub use routes::{build_router, AppState};
