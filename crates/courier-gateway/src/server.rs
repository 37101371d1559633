// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Relay HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state.

use axum::{
    Router,
    routing::{get, post},
};
use courier_config::ServerConfig;
use courier_core::CourierError;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::GatewayState;
use crate::handlers;

/// Build the relay's router.
///
/// Routes:
/// - `POST /webhook` — event intake
/// - `GET /webhook` — config introspection
/// - `GET /health` — static liveness
/// - `GET|DELETE /monitoring` — observability sink access
/// - `GET|POST /debug` — deployment diagnostics and test AI calls
pub fn build_router(state: GatewayState) -> Router {
    Router::new()
        .route(
            "/webhook",
            post(handlers::post_webhook).get(handlers::get_webhook),
        )
        .route("/health", get(handlers::get_health))
        .route(
            "/monitoring",
            get(handlers::get_monitoring).delete(handlers::delete_monitoring),
        )
        .route(
            "/debug",
            get(handlers::get_debug).post(handlers::post_debug),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind to the configured host:port and serve until the process exits.
pub async fn start_server(config: &ServerConfig, state: GatewayState) -> Result<(), CourierError> {
    let app = build_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| CourierError::Platform {
            message: format!("failed to bind relay to {addr}: {e}"),
            source: Some(Box::new(e)),
        })?;

    tracing::info!("courier relay listening on {addr}");

    axum::serve(listener, app)
        .await
        .map_err(|e| CourierError::Platform {
            message: format!("relay server error: {e}"),
            source: Some(Box::new(e)),
        })?;

    Ok(())
}
