// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Envelope validation and event dispatch.
//!
//! Validation and dispatch key off the same [`EventType`] enum, so an
//! envelope that passes validation always has a dispatch arm; the
//! "unknown tag" failure lives in exactly one place.

use std::time::Instant;

use axum::http::StatusCode;
use courier_chatwoot::best_effort_conversation_id;
use courier_core::{EventType, WebhookResponse};
use courier_observer::{LogLevel, LogScope};
use tracing::debug;

use crate::GatewayState;
use crate::message;

/// Validate a raw webhook body and dispatch it by event tag.
///
/// Returns the HTTP status alongside the uniform response envelope.
/// Malformed or unrecognized envelopes fail fast with 400 and never reach
/// the AI dispatcher.
pub async fn route_event(
    state: &GatewayState,
    raw: &serde_json::Value,
) -> (StatusCode, WebhookResponse) {
    let started = Instant::now();

    let Some(body) = raw.as_object() else {
        state.observer.warn(
            "rejected webhook: body is not a JSON object",
            None,
            LogScope::System,
        );
        return (
            StatusCode::BAD_REQUEST,
            WebhookResponse::failure(
                "invalid event envelope",
                Some("request body must be a JSON object".to_string()),
            ),
        );
    };

    let Some(tag) = body.get("event").and_then(|v| v.as_str()) else {
        state.observer.warn(
            "rejected webhook: missing `event` field",
            None,
            LogScope::System,
        );
        return (
            StatusCode::BAD_REQUEST,
            WebhookResponse::failure(
                "invalid event envelope",
                Some("missing `event` field".to_string()),
            ),
        );
    };

    let Ok(event) = tag.parse::<EventType>() else {
        state.observer.warn(
            format!("rejected webhook: unsupported event tag `{tag}`"),
            None,
            LogScope::System,
        );
        return (
            StatusCode::BAD_REQUEST,
            WebhookResponse::failure("unsupported event type", Some(tag.to_string())),
        );
    };

    debug!(%event, "routing webhook event");

    let (status, envelope) = match event {
        EventType::MessageCreated => message::handle_message(state, raw).await,
        other => {
            let conversation_id = best_effort_conversation_id(other, raw);
            (
                StatusCode::OK,
                WebhookResponse::ok(acknowledgement(other), conversation_id),
            )
        }
    };

    let level = if envelope.success {
        LogLevel::Info
    } else {
        LogLevel::Error
    };
    state.observer.record_event(
        event,
        raw,
        level,
        Some(started.elapsed().as_millis() as u64),
    );

    (status, envelope)
}

/// Canned status message for events the relay acknowledges without acting on.
fn acknowledgement(event: EventType) -> &'static str {
    match event {
        EventType::ConversationCreated => "conversation created",
        EventType::ConversationUpdated => "conversation updated",
        EventType::ConversationStatusChanged => "conversation status changed",
        EventType::MessageUpdated => "message update acknowledged",
        EventType::WebwidgetTriggered => "web widget triggered",
        EventType::ConversationTypingOn | EventType::ConversationTypingOff => {
            "typing indicator acknowledged"
        }
        // Handled by the message pipeline, never acknowledged from here.
        EventType::MessageCreated => "message received",
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use courier_config::CourierConfig;
    use courier_observer::Observer;

    use super::*;

    fn test_state() -> GatewayState {
        GatewayState::new(Arc::new(CourierConfig::default()), Arc::new(Observer::new())).unwrap()
    }

    #[tokio::test]
    async fn non_object_body_is_rejected() {
        let state = test_state();
        let (status, envelope) = route_event(&state, &serde_json::json!([1, 2, 3])).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(!envelope.success);
        assert_eq!(envelope.error.as_deref(), Some("invalid event envelope"));
    }

    #[tokio::test]
    async fn missing_event_field_is_rejected() {
        let state = test_state();
        let (status, envelope) = route_event(&state, &serde_json::json!({"content": "hi"})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(envelope.details.unwrap().contains("event"));
    }

    #[tokio::test]
    async fn unknown_event_tag_is_rejected() {
        let state = test_state();
        let (status, envelope) =
            route_event(&state, &serde_json::json!({"event": "conversation_resolved"})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(envelope.error.as_deref(), Some("unsupported event type"));
        assert_eq!(envelope.details.as_deref(), Some("conversation_resolved"));
        // Nothing was counted: validation failures never reach the event counters.
        assert_eq!(state.observer.metrics().total_requests, 0);
    }

    #[tokio::test]
    async fn conversation_created_is_acknowledged_with_top_level_id() {
        let state = test_state();
        let payload = serde_json::json!({"event": "conversation_created", "id": 42});
        let (status, envelope) = route_event(&state, &payload).await;
        assert_eq!(status, StatusCode::OK);
        assert!(envelope.success);
        assert_eq!(envelope.message.as_deref(), Some("conversation created"));
        assert_eq!(envelope.conversation_id, Some(42));
        assert_eq!(state.observer.metrics().event_counts["conversation_created"], 1);
    }

    #[tokio::test]
    async fn typing_events_are_acknowledged() {
        let state = test_state();
        for tag in ["conversation_typing_on", "conversation_typing_off"] {
            let payload = serde_json::json!({"event": tag, "conversation": {"id": 3}});
            let (status, envelope) = route_event(&state, &payload).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(envelope.conversation_id, Some(3));
            assert_eq!(
                envelope.message.as_deref(),
                Some("typing indicator acknowledged")
            );
        }
    }

    #[tokio::test]
    async fn every_recognized_tag_has_a_dispatch_arm() {
        // message_created takes the AI path (and fails here on missing
        // config); all other tags must produce a success acknowledgement.
        let state = test_state();
        for event in EventType::ALL {
            let payload = serde_json::json!({"event": event.to_string()});
            let (status, _envelope) = route_event(&state, &payload).await;
            assert_ne!(
                status,
                StatusCode::BAD_REQUEST,
                "validated tag {event} must never be re-rejected at dispatch"
            );
        }
    }
}
