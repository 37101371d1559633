// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The `message_created` pipeline: ignore non-incoming messages, require AI
//! configuration, dispatch to the provider, then deliver the reply
//! best-effort.
//!
//! Reply delivery is intentionally non-fatal: the webhook caller is
//! acknowledged with the generated text even when posting back to the
//! platform fails. The failure is still recorded for operators.

use axum::http::StatusCode;
use courier_chatwoot::MessageCreatedPayload;
use courier_core::WebhookResponse;
use courier_observer::LogScope;
use courier_providers::DEFAULT_MAX_ATTEMPTS;
use tracing::debug;

use crate::GatewayState;

/// Handle a validated `message_created` event.
pub async fn handle_message(
    state: &GatewayState,
    raw: &serde_json::Value,
) -> (StatusCode, WebhookResponse) {
    let payload: MessageCreatedPayload = match serde_json::from_value(raw.clone()) {
        Ok(payload) => payload,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                WebhookResponse::failure(
                    "malformed message_created payload",
                    Some(e.to_string()),
                ),
            );
        }
    };

    // Only end-user messages get answered. Replying to our own outgoing
    // messages (or an agent's) would loop the relay against itself.
    let incoming = payload
        .message_type
        .as_ref()
        .is_some_and(|t| t.is_incoming());
    if !incoming {
        debug!("ignoring non-incoming message");
        return (
            StatusCode::OK,
            WebhookResponse::ok("ignored non-incoming message", payload.conversation_id()),
        );
    }

    let content = payload.content.as_deref().unwrap_or("").trim();
    if content.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            WebhookResponse::failure(
                "invalid message payload",
                Some("message has no content".to_string()),
            ),
        );
    }

    if !state.config.ai.is_configured() {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            WebhookResponse::failure(
                "AI not configured",
                Some("set ai.url and ai.token (or AI_API_URL / AI_API_TOKEN)".to_string()),
            ),
        );
    }

    let reply = match state
        .dispatcher
        .dispatch(content, &state.config.ai, DEFAULT_MAX_ATTEMPTS, &state.observer)
        .await
    {
        Ok(reply) => reply,
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                WebhookResponse::failure("AI call failed", Some(e.to_string())),
            );
        }
    };

    match (payload.account_id(), payload.conversation_id()) {
        (Some(account_id), Some(conversation_id)) => {
            // Outcome deliberately ignored; the client records failures.
            let _ = state
                .chatwoot
                .send_reply(account_id, conversation_id, &reply)
                .await;
        }
        (account_id, conversation_id) => {
            state.observer.error(
                "reply delivery skipped: payload missing account or conversation id",
                Some(serde_json::json!({
                    "account_id": account_id,
                    "conversation_id": conversation_id,
                })),
                LogScope::System,
            );
        }
    }

    (
        StatusCode::OK,
        WebhookResponse::ok(reply, payload.conversation_id()),
    )
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use courier_config::CourierConfig;
    use courier_observer::Observer;

    use super::*;

    fn state_with(config: CourierConfig) -> GatewayState {
        GatewayState::new(Arc::new(config), Arc::new(Observer::new())).unwrap()
    }

    #[tokio::test]
    async fn outgoing_messages_are_ignored() {
        let state = state_with(CourierConfig::default());
        let raw = serde_json::json!({
            "event": "message_created",
            "content": "bot echo",
            "message_type": "outgoing",
            "conversation": {"id": 5},
        });
        let (status, envelope) = handle_message(&state, &raw).await;
        assert_eq!(status, StatusCode::OK);
        assert!(envelope.success);
        assert_eq!(envelope.message.as_deref(), Some("ignored non-incoming message"));
        assert_eq!(envelope.conversation_id, Some(5));
        // The dispatcher was never invoked.
        assert_eq!(state.observer.metrics().ai_calls_count, 0);
    }

    #[tokio::test]
    async fn template_messages_are_ignored() {
        let state = state_with(CourierConfig::default());
        let raw = serde_json::json!({
            "event": "message_created",
            "content": "welcome!",
            "message_type": "template",
        });
        let (_, envelope) = handle_message(&state, &raw).await;
        assert!(envelope.success);
        assert_eq!(state.observer.metrics().ai_calls_count, 0);
    }

    #[tokio::test]
    async fn incoming_without_ai_config_is_a_configuration_error() {
        let state = state_with(CourierConfig::default());
        let raw = serde_json::json!({
            "event": "message_created",
            "content": "hi",
            "message_type": "incoming",
        });
        let (status, envelope) = handle_message(&state, &raw).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(envelope.error.as_deref(), Some("AI not configured"));
        assert!(envelope.details.unwrap().contains("ai.url"));
        assert_eq!(state.observer.metrics().ai_calls_count, 0);
    }

    #[tokio::test]
    async fn empty_content_is_rejected() {
        let state = state_with(CourierConfig::default());
        let raw = serde_json::json!({
            "event": "message_created",
            "content": "   ",
            "message_type": "incoming",
        });
        let (status, envelope) = handle_message(&state, &raw).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(envelope.error.as_deref(), Some("invalid message payload"));
    }
}
