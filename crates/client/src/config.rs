// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Client configuration: `<home>/.confab/config.json`.

use serde::{Deserialize, Serialize};
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Environment override for the config file path (used mainly by tests).
pub const CONFIG_PATH_ENV: &str = "CONFAB_CONFIG_PATH";

/// Errors resolving or loading the client config.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not determine home directory")]
    NoHome,
    #[error("config not found at {} (run setup first)", .0.display())]
    Missing(PathBuf),
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid config {}: {message}", .path.display())]
    Malformed { path: PathBuf, message: String },
    #[error("invalid backend_url {0:?}")]
    InvalidUrl(String),
}

/// Client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub backend_url: String,
    pub api_key: String,
}

/// The Confab state directory: `<home>/.confab`.
pub fn confab_home() -> Result<PathBuf, ConfigError> {
    dirs::home_dir()
        .map(|h| h.join(".confab"))
        .ok_or(ConfigError::NoHome)
}

/// Resolve the config file path: `CONFAB_CONFIG_PATH` > `<home>/.confab/config.json`.
pub fn config_path() -> Result<PathBuf, ConfigError> {
    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        return Ok(PathBuf::from(path));
    }
    Ok(confab_home()?.join("config.json"))
}

impl Config {
    /// Load from the resolved config path.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&config_path()?)
    }

    /// Load from an explicit path.
    pub fn load_from(path: &std::path::Path) -> Result<Self, ConfigError> {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(ConfigError::Missing(path.to_path_buf()))
            }
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        serde_json::from_str(&content).map_err(|e| ConfigError::Malformed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
