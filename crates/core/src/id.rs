// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session identities.
//!
//! Every session has two names: the opaque ID the host agent tool assigned
//! it ([`ExternalId`]) and the identity the backend minted for it at init
//! ([`SessionId`]). The external ID is the join key of the whole system: it
//! names the daemon state and lock files on disk and resolves to the same
//! internal session on every init.

use serde::{Deserialize, Serialize};

/// Internal session identity assigned by the backend (a UUID string).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Mint the identity for a newly created session.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque session identifier assigned by the host agent tool.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExternalId(String);

impl ExternalId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the ID may name files under the daemons directory.
    ///
    /// External IDs arrive from the host agent's hook input and become
    /// `<id>.json` / `<id>.lock` leaf names, so anything that could escape
    /// the directory is rejected before it touches disk.
    pub fn is_path_safe(&self) -> bool {
        crate::file::validate_file_name(&self.0).is_ok()
    }
}

impl std::fmt::Display for ExternalId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
