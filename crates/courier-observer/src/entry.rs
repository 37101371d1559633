// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Log entry types stored in the observer ring buffer.

use courier_core::EventType;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Severity of a log entry.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Warn,
    Error,
    Debug,
}

/// What part of the relay an entry belongs to.
///
/// Webhook entries carry their event tag; everything else is either general
/// system activity or an AI provider call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogScope {
    System,
    AiCall,
    #[serde(untagged)]
    Event(EventType),
}

impl std::fmt::Display for LogScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogScope::System => f.write_str("system"),
            LogScope::AiCall => f.write_str("ai_call"),
            LogScope::Event(event) => write!(f, "{event}"),
        }
    }
}

/// A single entry in the observer's bounded log ring.
#[derive(Debug, Clone, Serialize)]
pub struct LogEntry {
    /// Random identifier for correlating entries in the monitoring UI.
    pub id: String,
    /// ISO 8601 timestamp.
    pub timestamp: String,
    pub level: LogLevel,
    pub scope: LogScope,
    pub message: String,
    /// Structured context attached to the entry.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    /// Wall-clock duration of the operation, when timed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
}
