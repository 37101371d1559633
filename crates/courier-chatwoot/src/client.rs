// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbound reply delivery to the Chatwoot REST API.
//!
//! Reply delivery is a best-effort side channel: [`ChatwootClient::send_reply`]
//! returns `false` instead of propagating any error, and nothing here
//! retries. The webhook handler's response does not depend on the outcome.

use std::sync::Arc;
use std::time::Duration;

use courier_config::ChatwootConfig;
use courier_core::CourierError;
use courier_observer::{LogScope, Observer};
use tracing::{info, warn};

/// How much of a rejection body is kept in the log entry.
const BODY_SNIPPET_CHARS: usize = 200;

/// Client for posting agent-bot messages back into a conversation.
#[derive(Clone)]
pub struct ChatwootClient {
    http: reqwest::Client,
    base_url: Option<String>,
    bot_token: Option<String>,
    observer: Arc<Observer>,
}

impl ChatwootClient {
    /// Build the client. Missing platform configuration is not an error
    /// here — the relay still serves webhooks, it just skips delivery.
    pub fn new(config: &ChatwootConfig, observer: Arc<Observer>) -> Result<Self, CourierError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| CourierError::Platform {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            http,
            base_url: config
                .base_url
                .clone()
                .filter(|u| !u.is_empty())
                .map(|u| u.trim_end_matches('/').to_string()),
            bot_token: config.bot_token.clone().filter(|t| !t.is_empty()),
            observer,
        })
    }

    /// Whether both base URL and bot token are present.
    pub fn is_configured(&self) -> bool {
        self.base_url.is_some() && self.bot_token.is_some()
    }

    /// Post `content` into the conversation as an outgoing, public message.
    ///
    /// Returns `true` only when the platform accepted the post. Every
    /// failure path logs enough context to diagnose (status, body snippet,
    /// identifiers) and returns `false`; nothing is raised and nothing is
    /// retried.
    pub async fn send_reply(&self, account_id: i64, conversation_id: i64, content: &str) -> bool {
        let (Some(base_url), Some(bot_token)) = (&self.base_url, &self.bot_token) else {
            warn!(account_id, conversation_id, "reply delivery skipped: platform not configured");
            self.observer.error(
                "reply delivery skipped: chatwoot.base_url or chatwoot.bot_token not configured",
                Some(serde_json::json!({
                    "account_id": account_id,
                    "conversation_id": conversation_id,
                })),
                LogScope::System,
            );
            return false;
        };

        let url = format!(
            "{base_url}/api/v1/accounts/{account_id}/conversations/{conversation_id}/messages"
        );
        let body = serde_json::json!({
            "content": content,
            "message_type": "outgoing",
            "private": false,
        });

        let response = match self
            .http
            .post(&url)
            .header("api_access_token", bot_token)
            .json(&body)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                self.observer.error(
                    format!("reply delivery failed: {e}"),
                    Some(serde_json::json!({
                        "account_id": account_id,
                        "conversation_id": conversation_id,
                    })),
                    LogScope::System,
                );
                return false;
            }
        };

        let status = response.status();
        if !status.is_success() {
            let snippet: String = response
                .text()
                .await
                .unwrap_or_default()
                .chars()
                .take(BODY_SNIPPET_CHARS)
                .collect();
            self.observer.error(
                format!("reply delivery rejected with HTTP {}", status.as_u16()),
                Some(serde_json::json!({
                    "account_id": account_id,
                    "conversation_id": conversation_id,
                    "status": status.as_u16(),
                    "body": snippet,
                })),
                LogScope::System,
            );
            return false;
        }

        info!(account_id, conversation_id, "reply delivered");
        self.observer.info(
            "reply delivered",
            Some(serde_json::json!({
                "account_id": account_id,
                "conversation_id": conversation_id,
                "content_chars": content.chars().count(),
            })),
            LogScope::System,
        );
        true
    }
}
