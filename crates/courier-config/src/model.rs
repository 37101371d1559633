// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Courier webhook relay.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Courier configuration.
///
/// Loaded from TOML files following the XDG hierarchy, with environment
/// variable overrides. All sections are optional and default to sensible
/// values; a relay with no AI credentials starts fine but answers message
/// events with a configuration error.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CourierConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// AI completion provider settings.
    #[serde(default)]
    pub ai: AiConfig,

    /// Chatwoot platform settings for outbound reply delivery.
    #[serde(default)]
    pub chatwoot: ChatwootConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_string()
}

/// AI completion provider configuration.
///
/// `max_tokens` and `temperature` are passed through to the vendor as-is;
/// vendor-specific bounds are not enforced here.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AiConfig {
    /// Completion endpoint URL. `None` falls back to the resolved
    /// provider's default endpoint.
    #[serde(default)]
    pub url: Option<String>,

    /// Secret API token. `None` disables AI handling.
    #[serde(default)]
    pub token: Option<String>,

    /// System prompt prepended to every completion request.
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,

    /// Explicit provider override (openai, azure, zhipu, baidu, qwen).
    /// `None` auto-detects from the endpoint URL.
    #[serde(default)]
    pub provider: Option<String>,

    /// Model identifier override. `None` uses the provider's default model.
    #[serde(default)]
    pub model: Option<String>,

    /// Maximum tokens to generate per reply.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Sampling temperature.
    #[serde(default = "default_temperature")]
    pub temperature: f64,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            url: None,
            token: None,
            system_prompt: default_system_prompt(),
            provider: None,
            model: None,
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
        }
    }
}

impl AiConfig {
    /// Whether both the endpoint URL and the token are present.
    pub fn is_configured(&self) -> bool {
        self.url.as_deref().is_some_and(|u| !u.is_empty())
            && self.token.as_deref().is_some_and(|t| !t.is_empty())
    }
}

fn default_system_prompt() -> String {
    "You are a professional customer support assistant. \
     Answer user questions in a friendly, professional tone."
        .to_string()
}

fn default_max_tokens() -> u32 {
    1000
}

fn default_temperature() -> f64 {
    0.7
}

/// Chatwoot platform configuration.
///
/// Both values are required for reply delivery; when either is missing the
/// relay still acknowledges webhooks but skips posting replies back.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ChatwootConfig {
    /// Base URL of the Chatwoot installation.
    #[serde(default)]
    pub base_url: Option<String>,

    /// Agent-bot access token used for the outbound messages API.
    #[serde(default)]
    pub bot_token: Option<String>,
}

impl ChatwootConfig {
    /// Whether both the base URL and the bot token are present.
    pub fn is_configured(&self) -> bool {
        self.base_url.as_deref().is_some_and(|u| !u.is_empty())
            && self.bot_token.as_deref().is_some_and(|t| !t.is_empty())
    }
}
