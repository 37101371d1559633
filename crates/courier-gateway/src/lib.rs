// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP gateway for the Courier webhook relay.
//!
//! Exposes the webhook intake, config introspection, health, monitoring,
//! and debug endpoints over axum. The event router validates inbound
//! envelopes and dispatches by event tag; `message_created` events flow
//! through the AI dispatcher and the best-effort reply sender.

pub mod handlers;
pub mod message;
pub mod router;
pub mod server;

use std::sync::Arc;

use courier_chatwoot::ChatwootClient;
use courier_config::CourierConfig;
use courier_core::CourierError;
use courier_observer::Observer;
use courier_providers::Dispatcher;

/// Shared state for axum request handlers.
///
/// Everything in here is cheap to clone: configuration and the observer are
/// behind `Arc`s, and both HTTP clients pool connections internally.
#[derive(Clone)]
pub struct GatewayState {
    pub config: Arc<CourierConfig>,
    pub observer: Arc<Observer>,
    pub dispatcher: Dispatcher,
    pub chatwoot: ChatwootClient,
}

impl GatewayState {
    /// Wire up the dispatcher and platform client from configuration.
    pub fn new(config: Arc<CourierConfig>, observer: Arc<Observer>) -> Result<Self, CourierError> {
        let dispatcher = Dispatcher::new()?;
        let chatwoot = ChatwootClient::new(&config.chatwoot, Arc::clone(&observer))?;
        Ok(Self {
            config,
            observer,
            dispatcher,
            chatwoot,
        })
    }
}
