// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde
//! attributes. AI parameters such as `max_tokens` and `temperature` are
//! deliberately not checked against vendor bounds; the vendor rejects
//! out-of-range values itself.

use crate::diagnostic::ConfigError;
use crate::model::CourierConfig;

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &CourierConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    // Validate host is not empty
    let host = config.server.host.trim();
    if host.is_empty() {
        errors.push(ConfigError::Validation {
            message: "server.host must not be empty".to_string(),
        });
    } else {
        // Accept valid IPv4, IPv6, or hostname patterns
        let is_valid_ip = host.parse::<std::net::IpAddr>().is_ok();
        let is_valid_hostname = host
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-' || c == ':');
        if !is_valid_ip && !is_valid_hostname {
            errors.push(ConfigError::Validation {
                message: format!(
                    "server.host `{host}` is not a valid IP address or hostname"
                ),
            });
        }
    }

    // Validate endpoint URLs are http(s) when present
    if let Some(url) = config.ai.url.as_deref()
        && !url.is_empty()
        && !is_http_url(url)
    {
        errors.push(ConfigError::Validation {
            message: format!("ai.url `{url}` must start with http:// or https://"),
        });
    }

    if let Some(url) = config.chatwoot.base_url.as_deref()
        && !url.is_empty()
        && !is_http_url(url)
    {
        errors.push(ConfigError::Validation {
            message: format!("chatwoot.base_url `{url}` must start with http:// or https://"),
        });
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

fn is_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}
