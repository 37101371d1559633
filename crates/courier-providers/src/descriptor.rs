// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Static provider descriptors and the pure resolver.
//!
//! Each variant describes one vendor's completion API: default endpoint and
//! model, request body shape, reply extraction path, and auth headers. The
//! resolver picks a variant from explicit configuration or URL substrings;
//! it holds no state and performs no I/O.

use courier_config::AiConfig;
use courier_core::CourierError;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue, USER_AGENT};
use strum::{Display, EnumString};
use tracing::debug;

const USER_AGENT_VALUE: &str = concat!("courier-webhook-relay/", env!("CARGO_PKG_VERSION"));

/// A supported AI completion vendor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Provider {
    OpenAi,
    Azure,
    Zhipu,
    Baidu,
    Qwen,
}

impl Provider {
    /// Resolve a provider from explicit configuration or a URL hint.
    ///
    /// An explicit, recognized name wins. An unrecognized explicit name
    /// falls through to URL detection rather than failing — existing
    /// deployments rely on this. URL substrings are checked
    /// case-insensitively in fixed priority order; no match defaults to the
    /// generic OpenAI-compatible descriptor.
    pub fn resolve(explicit: Option<&str>, url_hint: Option<&str>) -> Provider {
        if let Some(name) = explicit {
            if let Ok(provider) = name.to_ascii_lowercase().parse() {
                return provider;
            }
            debug!(provider = name, "unrecognized provider name, detecting from URL");
        }

        if let Some(url) = url_hint {
            let url = url.to_ascii_lowercase();
            if url.contains("openai.azure.com") {
                return Provider::Azure;
            }
            if url.contains("bigmodel.cn") {
                return Provider::Zhipu;
            }
            if url.contains("baidubce.com") {
                return Provider::Baidu;
            }
            if url.contains("dashscope.aliyuncs.com") {
                return Provider::Qwen;
            }
        }

        Provider::OpenAi
    }

    /// Human-readable vendor name, used in log and error messages.
    pub fn name(self) -> &'static str {
        match self {
            Provider::OpenAi => "OpenAI",
            Provider::Azure => "Azure OpenAI",
            Provider::Zhipu => "Zhipu AI",
            Provider::Baidu => "Baidu Ernie",
            Provider::Qwen => "Qwen",
        }
    }

    /// Default completion endpoint. Azure has none; its endpoint is
    /// deployment-specific and must come from configuration.
    pub fn base_url(self) -> Option<&'static str> {
        match self {
            Provider::OpenAi => Some("https://api.openai.com/v1/chat/completions"),
            Provider::Azure => None,
            Provider::Zhipu => Some("https://open.bigmodel.cn/api/paas/v4/chat/completions"),
            Provider::Baidu => Some(
                "https://aip.baidubce.com/rpc/2.0/ai_custom/v1/wenxinworkshop/chat/completions",
            ),
            Provider::Qwen => Some(
                "https://dashscope.aliyuncs.com/api/v1/services/aigc/text-generation/generation",
            ),
        }
    }

    /// Model used when the configuration does not override it.
    pub fn default_model(self) -> &'static str {
        match self {
            Provider::OpenAi => "gpt-3.5-turbo",
            Provider::Azure => "gpt-35-turbo",
            Provider::Zhipu => "glm-4",
            Provider::Baidu => "ernie-bot",
            Provider::Qwen => "qwen-turbo",
        }
    }

    /// Models the vendor is known to accept. Informational only; nothing is
    /// rejected for using a model outside this list.
    pub fn supported_models(self) -> &'static [&'static str] {
        match self {
            Provider::OpenAi => &["gpt-3.5-turbo", "gpt-4", "gpt-4-turbo", "gpt-4o"],
            Provider::Azure => &["gpt-35-turbo", "gpt-4", "gpt-4-32k"],
            Provider::Zhipu => &["glm-4", "glm-3-turbo"],
            Provider::Baidu => &["ernie-bot", "ernie-bot-turbo"],
            Provider::Qwen => &["qwen-turbo", "qwen-plus", "qwen-max"],
        }
    }

    /// The model a call with this configuration will request.
    pub fn effective_model(self, config: &AiConfig) -> String {
        config
            .model
            .clone()
            .unwrap_or_else(|| self.default_model().to_string())
    }

    /// Build the vendor request body for one user message.
    ///
    /// `max_tokens` and `temperature` pass through unvalidated; vendor
    /// bounds are the vendor's problem.
    pub fn format_request(self, message: &str, config: &AiConfig) -> serde_json::Value {
        let model = self.effective_model(config);
        let system = &config.system_prompt;

        match self {
            Provider::OpenAi | Provider::Zhipu => serde_json::json!({
                "model": model,
                "messages": [
                    {"role": "system", "content": system},
                    {"role": "user", "content": message},
                ],
                "max_tokens": config.max_tokens,
                "temperature": config.temperature,
            }),
            // Azure routes the model via the deployment URL, not the body.
            Provider::Azure => serde_json::json!({
                "messages": [
                    {"role": "system", "content": system},
                    {"role": "user", "content": message},
                ],
                "max_tokens": config.max_tokens,
                "temperature": config.temperature,
            }),
            // Ernie has no system role; the prompt is folded into the user turn.
            Provider::Baidu => serde_json::json!({
                "messages": [
                    {"role": "user", "content": format!("{system}\n\n{message}")},
                ],
                "max_output_tokens": config.max_tokens,
                "temperature": config.temperature,
            }),
            Provider::Qwen => serde_json::json!({
                "model": model,
                "input": {
                    "messages": [
                        {"role": "system", "content": system},
                        {"role": "user", "content": message},
                    ],
                },
                "parameters": {
                    "max_tokens": config.max_tokens,
                    "temperature": config.temperature,
                },
            }),
        }
    }

    /// Extract the reply text from a parsed vendor response body.
    ///
    /// Returns `None` when the expected path is absent, not a string, or
    /// empty; the dispatcher treats all of those as a retryable failure.
    pub fn parse_response(self, data: &serde_json::Value) -> Option<String> {
        let text = match self {
            Provider::OpenAi => data
                .pointer("/choices/0/message/content")
                .or_else(|| data.get("response"))
                .or_else(|| data.get("text"))
                .or_else(|| data.get("content"))
                .and_then(|v| v.as_str()),
            Provider::Azure | Provider::Zhipu => data
                .pointer("/choices/0/message/content")
                .and_then(|v| v.as_str()),
            Provider::Baidu => data.get("result").and_then(|v| v.as_str()),
            Provider::Qwen => data
                .pointer("/output/text")
                .or_else(|| data.pointer("/output/choices/0/message/content"))
                .and_then(|v| v.as_str()),
        };
        text.filter(|t| !t.is_empty()).map(str::to_string)
    }

    /// Build the auth and content headers for this vendor.
    pub fn headers(self, token: &str) -> Result<HeaderMap, CourierError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));

        let auth = |value: String| {
            HeaderValue::from_str(&value).map_err(|e| {
                CourierError::Config(format!("invalid AI token header value: {e}"))
            })
        };

        match self {
            Provider::OpenAi | Provider::Zhipu | Provider::Qwen => {
                headers.insert(AUTHORIZATION, auth(format!("Bearer {token}"))?);
            }
            Provider::Azure => {
                headers.insert(HeaderName::from_static("api-key"), auth(token.to_string())?);
            }
            // Ernie authenticates via an access_token query parameter on the
            // endpoint URL, supplied by the operator in ai.url.
            Provider::Baidu => {}
        }

        Ok(headers)
    }
}
