// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `courier serve` command implementation.
//!
//! Builds the observability sink, wires the gateway state, and runs the
//! axum server until a shutdown signal arrives.

use std::sync::Arc;

use courier_config::CourierConfig;
use courier_core::CourierError;
use courier_gateway::{GatewayState, server};
use courier_observer::{LogScope, Observer};
use courier_providers::Provider;
use tracing::{info, warn};

/// Runs the `courier serve` command.
pub async fn run_serve(config: CourierConfig) -> Result<(), CourierError> {
    init_tracing(&config.server.log_level);

    info!("starting courier relay");

    let provider = Provider::resolve(config.ai.provider.as_deref(), config.ai.url.as_deref());
    info!(
        provider = provider.name(),
        model = provider.effective_model(&config.ai),
        "active AI provider"
    );

    if !config.ai.is_configured() {
        warn!("ai.url or ai.token missing; message events will return a configuration error");
    }
    if !config.chatwoot.is_configured() {
        warn!("chatwoot.base_url or chatwoot.bot_token missing; replies will not be delivered");
    }

    let config = Arc::new(config);
    let observer = Arc::new(Observer::new());
    observer.info(
        "courier relay starting",
        Some(serde_json::json!({
            "provider": provider.name(),
            "ai_configured": config.ai.is_configured(),
            "platform_configured": config.chatwoot.is_configured(),
        })),
        LogScope::System,
    );

    let state = GatewayState::new(Arc::clone(&config), Arc::clone(&observer))?;

    tokio::select! {
        result = server::start_server(&config.server, state) => result,
        _ = tokio::signal::ctrl_c() => {
            info!("shutdown signal received, stopping relay");
            Ok(())
        }
    }
}

/// Initialize the tracing subscriber, honoring `RUST_LOG` when set and the
/// configured level otherwise.
fn init_tracing(level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
