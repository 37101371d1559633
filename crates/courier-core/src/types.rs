// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared across the Courier workspace.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// The closed set of webhook event tags the relay recognizes.
///
/// Validation and dispatch both key off this enum, so an envelope that
/// passes validation always has a matching dispatch arm.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    ConversationCreated,
    ConversationUpdated,
    ConversationStatusChanged,
    MessageCreated,
    MessageUpdated,
    WebwidgetTriggered,
    ConversationTypingOn,
    ConversationTypingOff,
}

impl EventType {
    /// All recognized event tags, in the order the platform documents them.
    pub const ALL: [EventType; 8] = [
        EventType::ConversationCreated,
        EventType::ConversationUpdated,
        EventType::ConversationStatusChanged,
        EventType::MessageCreated,
        EventType::MessageUpdated,
        EventType::WebwidgetTriggered,
        EventType::ConversationTypingOn,
        EventType::ConversationTypingOff,
    ];
}

/// The uniform response envelope returned by every webhook entry point.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookResponse {
    /// Whether the event was processed successfully.
    pub success: bool,

    /// Human-readable status message (or the AI reply for message events).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Best-effort conversation identifier extracted from the payload.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<i64>,

    /// Short error description on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Extended failure detail (e.g. the aggregated dispatch error).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,

    /// ISO 8601 timestamp of when the envelope was produced.
    pub timestamp: String,
}

impl WebhookResponse {
    /// Build a success envelope.
    pub fn ok(message: impl Into<String>, conversation_id: Option<i64>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            conversation_id,
            error: None,
            details: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Build a failure envelope.
    pub fn failure(error: impl Into<String>, details: Option<String>) -> Self {
        Self {
            success: false,
            message: None,
            conversation_id: None,
            error: Some(error.into()),
            details,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}
