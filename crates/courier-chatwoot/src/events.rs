// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chatwoot webhook payload shapes.
//!
//! Deliberately lenient: every field the relay touches is optional, because
//! the platform only guarantees fields per event variant and real payloads
//! drift. Nothing here assumes more than the variant's documented shape.

use courier_core::EventType;
use serde::Deserialize;

/// Chatwoot account reference.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AccountRef {
    pub id: Option<i64>,
    pub name: Option<String>,
}

/// Conversation reference as embedded in message events.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ConversationRef {
    pub id: Option<i64>,
    pub status: Option<String>,
}

/// Message sender (a contact or an agent).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SenderRef {
    pub id: Option<i64>,
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub sender_type: Option<String>,
}

/// The `message_type` discriminant. Chatwoot sends it as a string in
/// webhook payloads and as a numeric code on the REST API (0 = incoming,
/// 1 = outgoing).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum MessageTypeTag {
    Name(String),
    Code(i64),
}

impl MessageTypeTag {
    /// True for messages sent by the end user (the only kind the relay
    /// answers; everything else would loop on our own outgoing replies).
    pub fn is_incoming(&self) -> bool {
        match self {
            MessageTypeTag::Name(name) => name == "incoming",
            MessageTypeTag::Code(code) => *code == 0,
        }
    }
}

/// Payload of a `message_created` event.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MessageCreatedPayload {
    pub id: Option<i64>,
    pub content: Option<String>,
    pub message_type: Option<MessageTypeTag>,
    pub conversation: Option<ConversationRef>,
    pub account: Option<AccountRef>,
    pub sender: Option<SenderRef>,
}

impl MessageCreatedPayload {
    pub fn conversation_id(&self) -> Option<i64> {
        self.conversation.as_ref().and_then(|c| c.id)
    }

    pub fn account_id(&self) -> Option<i64> {
        self.account.as_ref().and_then(|a| a.id)
    }
}

/// Best-effort conversation id extraction for a recognized event.
///
/// Conversation events spread the conversation attributes at the top level,
/// widget events nest them under `current_conversation`, and message/typing
/// events embed a `conversation` object.
pub fn best_effort_conversation_id(event: EventType, payload: &serde_json::Value) -> Option<i64> {
    match event {
        EventType::ConversationCreated
        | EventType::ConversationUpdated
        | EventType::ConversationStatusChanged => payload
            .get("id")
            .and_then(serde_json::Value::as_i64)
            .or_else(|| payload.pointer("/conversation/id").and_then(serde_json::Value::as_i64)),
        EventType::WebwidgetTriggered => payload
            .pointer("/current_conversation/id")
            .and_then(serde_json::Value::as_i64),
        _ => payload
            .pointer("/conversation/id")
            .and_then(serde_json::Value::as_i64)
            .or_else(|| payload.get("id").and_then(serde_json::Value::as_i64)),
    }
}
