// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chatwoot integration for the Courier webhook relay: the inbound payload
//! shapes the platform sends, and the outbound client that posts AI replies
//! back into the originating conversation.

pub mod client;
pub mod events;

pub use client::ChatwootClient;
pub use events::{
    AccountRef, ConversationRef, MessageCreatedPayload, MessageTypeTag, SenderRef,
    best_effort_conversation_id,
};
