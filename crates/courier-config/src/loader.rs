// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./courier.toml` > `~/.config/courier/courier.toml`
//! > `/etc/courier/courier.toml` with environment variable overrides via the
//! `COURIER_` prefix, plus the bare legacy variable names the original
//! deployment recognized (`AI_API_URL`, `CHATWOOT_URL`, ...).

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::CourierConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/courier/courier.toml` (system-wide)
/// 3. `~/.config/courier/courier.toml` (user XDG config)
/// 4. `./courier.toml` (local directory)
/// 5. `COURIER_*` environment variables
/// 6. Bare legacy environment variables (`AI_API_URL`, `CHATWOOT_URL`, ...)
pub fn load_config() -> Result<CourierConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(CourierConfig::default()))
        .merge(Toml::file("/etc/courier/courier.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("courier/courier.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("courier.toml"))
        .merge(env_provider())
        .merge(legacy_env_provider())
        .extract()
}

/// Load configuration from a TOML string only (no file lookup, no env vars).
///
/// Used for testing and explicit config specification.
pub fn load_config_from_str(toml_content: &str) -> Result<CourierConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(CourierConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<CourierConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(CourierConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .merge(legacy_env_provider())
        .extract()
}

/// Create the `COURIER_`-prefixed environment provider.
///
/// Uses explicit `map()` rather than `Env::split("_")` to avoid ambiguity
/// with underscore-containing key names: `COURIER_AI_SYSTEM_PROMPT` must map
/// to `ai.system_prompt`, not `ai.system.prompt`.
fn env_provider() -> Env {
    Env::prefixed("COURIER_").map(|key| {
        // `key` is the lowercased env var name with the prefix stripped.
        // Example: COURIER_CHATWOOT_BOT_TOKEN -> "chatwoot_bot_token"
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("server_", "server.", 1)
            .replacen("ai_", "ai.", 1)
            .replacen("chatwoot_", "chatwoot.", 1);
        mapped.into()
    })
}

/// Create the legacy environment provider for the variable names the
/// original deployment used, mapped into their config sections.
///
/// These are merged last so an operator's existing `AI_API_URL` keeps
/// winning over any `COURIER_*` value during migration.
fn legacy_env_provider() -> Env {
    Env::raw()
        .only(&[
            "ai_api_url",
            "ai_api_token",
            "ai_system_prompt",
            "ai_provider",
            "ai_model",
            "ai_max_tokens",
            "ai_temperature",
            "chatwoot_url",
            "chatwoot_bot_token",
        ])
        .map(|key| {
            let mapped = match key.as_str() {
                "ai_api_url" => "ai.url",
                "ai_api_token" => "ai.token",
                "ai_system_prompt" => "ai.system_prompt",
                "ai_provider" => "ai.provider",
                "ai_model" => "ai.model",
                "ai_max_tokens" => "ai.max_tokens",
                "ai_temperature" => "ai.temperature",
                "chatwoot_url" => "chatwoot.base_url",
                "chatwoot_bot_token" => "chatwoot.bot_token",
                other => other,
            };
            mapped.to_string().into()
        })
}
