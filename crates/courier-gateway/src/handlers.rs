// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the relay's REST surface.
//!
//! Every entry point catches its own failures and converts them into the
//! uniform envelope (webhook) or a `{success, ...}` JSON body (monitoring);
//! nothing below this layer surfaces an uncaught error to the client.

use std::str::FromStr;
use std::time::Instant;

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use courier_core::{EventType, WebhookResponse};
use courier_observer::{HealthLevel, LogLevel, LogScope};
use courier_providers::{DEFAULT_MAX_ATTEMPTS, Provider};
use serde::Deserialize;

use crate::GatewayState;
use crate::router;

/// POST /webhook
///
/// Accepts a raw body so that non-JSON input maps to the envelope-shaped
/// 400 instead of a framework rejection. Everything downstream of the parse
/// goes through the event router.
pub async fn post_webhook(State(state): State<GatewayState>, body: String) -> Response {
    let raw: serde_json::Value = match serde_json::from_str(&body) {
        Ok(value) => value,
        Err(e) => {
            state.observer.warn(
                format!("rejected webhook: body is not valid JSON: {e}"),
                None,
                LogScope::System,
            );
            return (
                StatusCode::BAD_REQUEST,
                Json(WebhookResponse::failure(
                    "invalid request body",
                    Some("request body must be valid JSON".to_string()),
                )),
            )
                .into_response();
        }
    };

    let (status, envelope) = router::route_event(&state, &raw).await;
    (status, Json(envelope)).into_response()
}

/// GET /webhook
///
/// Configuration introspection for operators. Reports what is configured
/// and the active provider parameters; secret tokens never appear here.
pub async fn get_webhook(State(state): State<GatewayState>) -> Json<serde_json::Value> {
    let ai = &state.config.ai;
    let provider = Provider::resolve(ai.provider.as_deref(), ai.url.as_deref());

    Json(serde_json::json!({
        "ai_configured": ai.is_configured(),
        "platform_configured": state.chatwoot.is_configured(),
        "has_ai_url": ai.url.as_deref().is_some_and(|u| !u.is_empty()),
        "has_ai_token": ai.token.as_deref().is_some_and(|t| !t.is_empty()),
        "provider": provider.name(),
        "model": provider.effective_model(ai),
        "supported_models": provider.supported_models(),
        "supported_events": EventType::ALL,
        "max_tokens": ai.max_tokens,
        "temperature": ai.temperature,
        "max_attempts": DEFAULT_MAX_ATTEMPTS,
    }))
}

/// GET /health
///
/// Static liveness payload; the aggregated health checks live under
/// `/monitoring?action=health`.
pub async fn get_health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "courier-webhook-relay",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

/// Query parameters for the monitoring endpoint.
#[derive(Debug, Deserialize)]
pub struct MonitoringQuery {
    pub action: Option<String>,
    pub limit: Option<usize>,
    pub level: Option<String>,
    pub event: Option<String>,
}

/// GET /monitoring?action=metrics|logs|health
pub async fn get_monitoring(
    State(state): State<GatewayState>,
    Query(query): Query<MonitoringQuery>,
) -> Response {
    let timestamp = chrono::Utc::now().to_rfc3339();

    match query.action.as_deref().unwrap_or("metrics") {
        "metrics" => Json(serde_json::json!({
            "success": true,
            "data": state.observer.metrics(),
            "timestamp": timestamp,
        }))
        .into_response(),

        "logs" => {
            let level = match query.level.as_deref().map(LogLevel::from_str) {
                None => None,
                Some(Ok(level)) => Some(level),
                Some(Err(_)) => {
                    return (
                        StatusCode::BAD_REQUEST,
                        Json(serde_json::json!({
                            "success": false,
                            "error": "unknown log level",
                            "supported_levels": ["info", "warn", "error", "debug"],
                        })),
                    )
                        .into_response();
                }
            };
            Json(serde_json::json!({
                "success": true,
                "data": state.observer.logs(query.limit, level, query.event.as_deref()),
                "timestamp": timestamp,
            }))
            .into_response()
        }

        "health" => {
            let report = state.observer.health();
            let status = if report.status == HealthLevel::Error {
                StatusCode::INTERNAL_SERVER_ERROR
            } else {
                StatusCode::OK
            };
            (
                status,
                Json(serde_json::json!({
                    "success": true,
                    "data": report,
                    "timestamp": timestamp,
                })),
            )
                .into_response()
        }

        other => (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({
                "success": false,
                "error": format!("unsupported action `{other}`"),
                "supported_actions": ["metrics", "logs", "health"],
            })),
        )
            .into_response(),
    }
}

/// DELETE /monitoring?action=logs|metrics
pub async fn delete_monitoring(
    State(state): State<GatewayState>,
    Query(query): Query<MonitoringQuery>,
) -> Response {
    let timestamp = chrono::Utc::now().to_rfc3339();

    match query.action.as_deref() {
        Some("logs") => {
            state.observer.clear_logs();
            Json(serde_json::json!({
                "success": true,
                "message": "logs cleared",
                "timestamp": timestamp,
            }))
            .into_response()
        }
        Some("metrics") => {
            state.observer.reset_metrics();
            Json(serde_json::json!({
                "success": true,
                "message": "metrics reset",
                "timestamp": timestamp,
            }))
            .into_response()
        }
        _ => (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({
                "success": false,
                "error": "unsupported action",
                "supported_actions": ["logs", "metrics"],
            })),
        )
            .into_response(),
    }
}

/// GET /debug
///
/// Diagnostics snapshot for troubleshooting a deployment: which keys are
/// present (booleans only, never values) and the request path template the
/// reply sender uses.
pub async fn get_debug(State(state): State<GatewayState>) -> Json<serde_json::Value> {
    let ai = &state.config.ai;
    let provider = Provider::resolve(ai.provider.as_deref(), ai.url.as_deref());

    Json(serde_json::json!({
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "config": {
            "has_ai_url": ai.url.as_deref().is_some_and(|u| !u.is_empty()),
            "has_ai_token": ai.token.as_deref().is_some_and(|t| !t.is_empty()),
            "has_chatwoot_url": state.config.chatwoot.base_url.is_some(),
            "has_chatwoot_token": state.config.chatwoot.bot_token.is_some(),
            "provider": ai.provider.as_deref().unwrap_or("auto-detect"),
            "model": ai.model.as_deref().unwrap_or("default"),
        },
        "resolved_provider": {
            "name": provider.name(),
            "model": provider.effective_model(ai),
            "default_endpoint": provider.base_url(),
        },
        "chatwoot": {
            "api_path_format":
                "/api/v1/accounts/{account_id}/conversations/{conversation_id}/messages",
            "note": "account_id and conversation_id come from the webhook payload",
        },
    }))
}

/// Body for POST /debug.
#[derive(Debug, Deserialize)]
pub struct DebugTestRequest {
    pub message: Option<String>,
}

/// POST /debug
///
/// Fires a test AI call with the supplied message and reports the outcome
/// with timing. Useful for verifying credentials without involving the
/// chat platform.
pub async fn post_debug(
    State(state): State<GatewayState>,
    Json(body): Json<DebugTestRequest>,
) -> Response {
    let Some(message) = body.message.filter(|m| !m.trim().is_empty()) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({
                "success": false,
                "error": "a test message is required",
            })),
        )
            .into_response();
    };

    let ai = &state.config.ai;
    let provider = Provider::resolve(ai.provider.as_deref(), ai.url.as_deref());
    let started = Instant::now();
    let result = state
        .dispatcher
        .dispatch(&message, ai, DEFAULT_MAX_ATTEMPTS, &state.observer)
        .await;
    let duration_ms = started.elapsed().as_millis() as u64;

    let payload = match result {
        Ok(reply) => serde_json::json!({
            "success": true,
            "reply": reply,
            "duration_ms": duration_ms,
            "provider": provider.name(),
            "model": provider.effective_model(ai),
            "timestamp": chrono::Utc::now().to_rfc3339(),
        }),
        Err(e) => serde_json::json!({
            "success": false,
            "error": e.to_string(),
            "duration_ms": duration_ms,
            "provider": provider.name(),
            "model": provider.effective_model(ai),
            "timestamp": chrono::Utc::now().to_rfc3339(),
        }),
    };

    Json(payload).into_response()
}
