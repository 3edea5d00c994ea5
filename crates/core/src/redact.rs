// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Line redaction applied before transcript content leaves the host.
//!
//! Two pattern kinds are supported:
//!
//! - **Capture**: a regex whose capture group (default: the whole match) is
//!   replaced with the placeholder in the raw line text.
//! - **Field**: a regex matched against JSON object keys; the value under any
//!   matching key is replaced wholesale, at any nesting depth.
//!
//! For any line that parses as JSON, the redacted output parses as JSON too.
//! If a capture substitution would break that, the entire line is replaced by
//! a JSON string placeholder instead.
//!
//! The config file is read once at daemon start. Editing it mid-run has no
//! effect until the next session; this keeps a single upload stream from
//! mixing redaction policies.

use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Token substituted for redacted content.
pub const REDACTION_PLACEHOLDER: &str = "[REDACTED]";

/// Leaf name of the redaction config file. Presence enables redaction;
/// renaming to `redaction.json.disabled` turns it off without losing it.
pub const REDACTION_CONFIG_FILE: &str = "redaction.json";

/// Errors loading a redaction config.
#[derive(Debug, Error)]
pub enum RedactError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid redaction config {}: {message}", .path.display())]
    Invalid { path: PathBuf, message: String },
}

#[derive(Deserialize)]
struct RawConfig {
    #[serde(default)]
    patterns: Vec<RawPattern>,
}

#[derive(Deserialize)]
struct RawPattern {
    #[serde(default)]
    regex: Option<String>,
    #[serde(default)]
    group: Option<usize>,
    #[serde(default)]
    field: Option<String>,
}

/// A compiled redaction pattern.
#[derive(Debug, Clone)]
pub enum RedactionPattern {
    /// Replace capture group `group` of every match with the placeholder.
    Capture { regex: Regex, group: usize },
    /// Replace the value of every JSON object key matching `regex`.
    Field { regex: Regex },
}

/// Compiled redaction pipeline.
#[derive(Debug, Clone, Default)]
pub struct Redactor {
    patterns: Vec<RedactionPattern>,
}

impl Redactor {
    pub fn new(patterns: Vec<RedactionPattern>) -> Self {
        Self { patterns }
    }

    /// Load the redactor for a config directory.
    ///
    /// Returns `Ok(None)` when `redaction.json` is absent (redaction off).
    /// A present-but-invalid config is an error: uploading unredacted lines
    /// when the user asked for redaction is not an acceptable fallback.
    pub fn from_config_dir(dir: &Path) -> Result<Option<Self>, RedactError> {
        let path = dir.join(REDACTION_CONFIG_FILE);
        if !path.exists() {
            return Ok(None);
        }
        Self::load(&path).map(Some)
    }

    /// Load and compile a redaction config file.
    pub fn load(path: &Path) -> Result<Self, RedactError> {
        let content = std::fs::read_to_string(path).map_err(|source| RedactError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let raw: RawConfig =
            serde_json::from_str(&content).map_err(|e| RedactError::Invalid {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;

        let invalid = |message: String| RedactError::Invalid {
            path: path.to_path_buf(),
            message,
        };

        let mut patterns = Vec::with_capacity(raw.patterns.len());
        for entry in raw.patterns {
            let pattern = match (entry.regex, entry.field) {
                (Some(re), None) => RedactionPattern::Capture {
                    regex: Regex::new(&re).map_err(|e| invalid(e.to_string()))?,
                    group: entry.group.unwrap_or(0),
                },
                (None, Some(re)) => RedactionPattern::Field {
                    regex: Regex::new(&re).map_err(|e| invalid(e.to_string()))?,
                },
                (Some(_), Some(_)) => {
                    return Err(invalid(
                        "pattern must set either \"regex\" or \"field\", not both".to_string(),
                    ))
                }
                (None, None) => {
                    return Err(invalid(
                        "pattern must set \"regex\" or \"field\"".to_string(),
                    ))
                }
            };
            patterns.push(pattern);
        }

        Ok(Self { patterns })
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Redact a single line.
    pub fn redact_line(&self, line: &str) -> String {
        if self.patterns.is_empty() {
            return line.to_string();
        }

        let was_json = serde_json::from_str::<Value>(line).is_ok();

        let mut out = line.to_string();
        for pattern in &self.patterns {
            if let RedactionPattern::Capture { regex, group } = pattern {
                out = substitute_group(regex, *group, &out);
            }
        }

        // A capture substitution that breaks a previously-valid JSON line is
        // collapsed to a bare placeholder string. Over-redacting beats leaking.
        if was_json && serde_json::from_str::<Value>(&out).is_err() {
            return format!("\"{REDACTION_PLACEHOLDER}\"");
        }

        let field_patterns: Vec<&Regex> = self
            .patterns
            .iter()
            .filter_map(|p| match p {
                RedactionPattern::Field { regex } => Some(regex),
                RedactionPattern::Capture { .. } => None,
            })
            .collect();
        if field_patterns.is_empty() {
            return out;
        }

        match serde_json::from_str::<Value>(&out) {
            Ok(mut value) => {
                redact_fields(&mut value, &field_patterns);
                value.to_string()
            }
            // Field patterns only apply to JSON lines.
            Err(_) => out,
        }
    }
}

/// Replace capture group `group` of every non-overlapping match.
///
/// Matches where the group did not participate are left untouched.
fn substitute_group(regex: &Regex, group: usize, input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut last = 0;
    for caps in regex.captures_iter(input) {
        let Some(m) = caps.get(group) else {
            continue;
        };
        if m.start() < last {
            continue;
        }
        out.push_str(&input[last..m.start()]);
        out.push_str(REDACTION_PLACEHOLDER);
        last = m.end();
    }
    out.push_str(&input[last..]);
    out
}

/// Walk a JSON value tree, replacing values under matching keys.
fn redact_fields(value: &mut Value, patterns: &[&Regex]) {
    match value {
        Value::Object(map) => {
            for (key, val) in map.iter_mut() {
                if patterns.iter().any(|r| r.is_match(key)) {
                    *val = Value::String(REDACTION_PLACEHOLDER.to_string());
                } else {
                    redact_fields(val, patterns);
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                redact_fields(item, patterns);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
#[path = "redact_tests.rs"]
mod tests;
