// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Typed accessors over a single transcript JSONL record.
//!
//! Transcript lines are host-tool JSON whose schema evolves out from under
//! us; accessors return `Option` and unknown shapes are ignored, never fatal.

use serde_json::Value;

/// Extract a string value from a JSON object by key.
fn get_str<'a>(obj: &'a Value, key: &str) -> Option<&'a str> {
    obj.get(key).and_then(|v| v.as_str())
}

/// Token usage reported on an assistant message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub cache_creation_input_tokens: u64,
    pub cache_read_input_tokens: u64,
}

/// A tool invocation found in an assistant message's content blocks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolUse<'a> {
    pub name: &'a str,
    pub input: Option<&'a Value>,
}

/// One parsed transcript line.
#[derive(Debug, Clone)]
pub struct LineRecord {
    value: Value,
}

impl LineRecord {
    /// Parse a line; `None` for anything that is not a JSON object.
    pub fn parse(line: &str) -> Option<Self> {
        let value: Value = serde_json::from_str(line.trim()).ok()?;
        value.is_object().then_some(Self { value })
    }

    pub fn record_type(&self) -> Option<&str> {
        get_str(&self.value, "type")
    }

    pub fn is_assistant(&self) -> bool {
        self.record_type() == Some("assistant")
    }

    pub fn is_user(&self) -> bool {
        self.record_type() == Some("user")
    }

    fn message(&self) -> Option<&Value> {
        self.value.get("message")
    }

    pub fn timestamp(&self) -> Option<&str> {
        get_str(&self.value, "timestamp")
            .or_else(|| self.message().and_then(|m| get_str(m, "created_at")))
    }

    pub fn model(&self) -> Option<&str> {
        self.message().and_then(|m| get_str(m, "model"))
    }

    pub fn stop_reason(&self) -> Option<&str> {
        self.message().and_then(|m| get_str(m, "stop_reason"))
    }

    /// Token usage from `message.usage`, if this is an assistant record that
    /// carries it.
    pub fn usage(&self) -> Option<TokenUsage> {
        if !self.is_assistant() {
            return None;
        }
        let usage = self.message()?.get("usage")?;
        let count = |key: &str| usage.get(key).and_then(|v| v.as_u64()).unwrap_or(0);
        Some(TokenUsage {
            input_tokens: count("input_tokens"),
            output_tokens: count("output_tokens"),
            cache_creation_input_tokens: count("cache_creation_input_tokens"),
            cache_read_input_tokens: count("cache_read_input_tokens"),
        })
    }

    /// `tool_use` content blocks on an assistant message.
    pub fn tool_uses(&self) -> Vec<ToolUse<'_>> {
        let Some(content) = self
            .message()
            .and_then(|m| m.get("content"))
            .and_then(|c| c.as_array())
        else {
            return Vec::new();
        };
        content
            .iter()
            .filter(|block| get_str(block, "type") == Some("tool_use"))
            .filter_map(|block| {
                Some(ToolUse {
                    name: get_str(block, "name")?,
                    input: block.get("input"),
                })
            })
            .collect()
    }
}

#[cfg(test)]
#[path = "record_tests.rs"]
mod tests;
