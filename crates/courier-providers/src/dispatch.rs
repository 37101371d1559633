// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The AI dispatch engine: one HTTP call per attempt with a hard timeout,
//! capped exponential backoff between attempts, and one observer record per
//! failed attempt plus a final success/exhausted record.

use std::time::{Duration, Instant};

use courier_config::AiConfig;
use courier_core::{AttemptError, CourierError};
use courier_observer::{LogScope, Observer};
use tracing::{debug, warn};

use crate::descriptor::Provider;

/// Attempts made before giving up, unless the caller overrides it.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Hard per-attempt timeout. reqwest aborts the in-flight request on expiry.
const ATTEMPT_TIMEOUT: Duration = Duration::from_secs(30);

const BACKOFF_BASE_MS: u64 = 1000;
const BACKOFF_CAP_MS: u64 = 5000;

/// How much of a raw vendor body is embedded in error messages.
const BODY_SNIPPET_CHARS: usize = 200;

/// Stateless dispatcher owning the pooled HTTP client.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    client: reqwest::Client,
}

impl Dispatcher {
    /// Create a dispatcher with the hard per-attempt timeout baked into the
    /// HTTP client.
    pub fn new() -> Result<Self, CourierError> {
        let client = reqwest::Client::builder()
            .timeout(ATTEMPT_TIMEOUT)
            .build()
            .map_err(|e| CourierError::Provider {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;
        Ok(Self { client })
    }

    /// Send `message` to the configured AI provider, retrying transient
    /// failures with capped exponential backoff.
    ///
    /// Returns the trimmed reply text, or a single aggregated error after
    /// all attempts are spent. Worst case this blocks its caller for
    /// roughly `max_attempts * 30s` plus backoff; callers apply their own
    /// outer timeout if they need a tighter bound.
    pub async fn dispatch(
        &self,
        message: &str,
        config: &AiConfig,
        max_attempts: u32,
        observer: &Observer,
    ) -> Result<String, CourierError> {
        let provider = Provider::resolve(config.provider.as_deref(), config.url.as_deref());
        let model = provider.effective_model(config);
        let started = Instant::now();

        observer.info(
            format!("dispatching AI call via {}", provider.name()),
            Some(serde_json::json!({
                "provider": provider.name(),
                "model": model,
                "message_chars": message.chars().count(),
            })),
            LogScope::AiCall,
        );

        let endpoint = config
            .url
            .clone()
            .filter(|u| !u.is_empty())
            .or_else(|| provider.base_url().map(str::to_string));
        let Some(endpoint) = endpoint else {
            let detail = format!(
                "{} has no default endpoint; set ai.url in the configuration",
                provider.name()
            );
            observer.record_ai_call(
                false,
                started.elapsed().as_millis() as u64,
                provider.name(),
                &model,
                Some(&detail),
            );
            return Err(CourierError::Provider {
                message: detail,
                source: None,
            });
        };
        let token = config.token.clone().unwrap_or_default();

        let mut last_error: Option<AttemptError> = None;
        let mut attempts_made = 0;

        for attempt in 1..=max_attempts {
            attempts_made = attempt;
            let attempt_started = Instant::now();

            match self
                .attempt(&endpoint, provider, message, config, &token)
                .await
            {
                Ok(content) => {
                    observer.record_ai_call(
                        true,
                        started.elapsed().as_millis() as u64,
                        provider.name(),
                        &model,
                        None,
                    );
                    return Ok(content);
                }
                Err(err) => {
                    let fatal = matches!(err, AttemptError::Fatal(_));
                    warn!(
                        provider = provider.name(),
                        attempt,
                        max_attempts,
                        "AI call attempt failed: {err}"
                    );
                    observer.warn(
                        format!(
                            "{} call failed (attempt {attempt}/{max_attempts}): {err}",
                            provider.name()
                        ),
                        Some(serde_json::json!({
                            "provider": provider.name(),
                            "model": model,
                            "attempt": attempt,
                            "duration_ms": attempt_started.elapsed().as_millis() as u64,
                        })),
                        LogScope::AiCall,
                    );
                    last_error = Some(err);
                    if fatal {
                        break;
                    }
                    if attempt < max_attempts {
                        let delay = backoff_delay(attempt);
                        debug!(delay_ms = delay.as_millis() as u64, "backing off before retry");
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }

        let detail = last_error
            .map(|e| e.message().to_string())
            .unwrap_or_else(|| "unknown error".to_string());
        let aggregated = format!(
            "{} failed after {attempts_made} attempts: {detail}",
            provider.name()
        );
        observer.record_ai_call(
            false,
            started.elapsed().as_millis() as u64,
            provider.name(),
            &model,
            Some(&aggregated),
        );
        Err(CourierError::Provider {
            message: aggregated,
            source: None,
        })
    }

    /// One HTTP round trip: build, post, read raw, check status, parse,
    /// extract. Every failure mode maps to an explicit [`AttemptError`].
    async fn attempt(
        &self,
        endpoint: &str,
        provider: Provider,
        message: &str,
        config: &AiConfig,
        token: &str,
    ) -> Result<String, AttemptError> {
        let body = provider.format_request(message, config);
        let headers = provider
            .headers(token)
            .map_err(|e| AttemptError::Fatal(e.to_string()))?;

        let response = self
            .client
            .post(endpoint)
            .headers(headers)
            .json(&body)
            .send()
            .await
            .map_err(|e| AttemptError::Retryable(format!("HTTP request failed: {e}")))?;

        let status = response.status();
        // The raw body is read regardless of status so error snippets can
        // embed what the vendor actually said.
        let raw = response
            .text()
            .await
            .map_err(|e| AttemptError::Retryable(format!("failed to read response body: {e}")))?;

        if !status.is_success() {
            return Err(AttemptError::Retryable(format!(
                "{} API error {} {}: {}",
                provider.name(),
                status.as_u16(),
                status.canonical_reason().unwrap_or("unknown"),
                snippet(&raw),
            )));
        }

        let data: serde_json::Value = serde_json::from_str(&raw)
            .map_err(|_| AttemptError::Retryable(format!("response parse failure: {}", snippet(&raw))))?;

        let content = provider
            .parse_response(&data)
            .ok_or_else(|| AttemptError::Retryable("invalid response: no reply text".to_string()))?;

        Ok(content.trim().to_string())
    }
}

/// Backoff before the retry following `attempt` (1-based):
/// 1s, 2s, 4s, ... capped at 5s.
fn backoff_delay(attempt: u32) -> Duration {
    let exp = attempt.saturating_sub(1).min(63);
    let ms = BACKOFF_BASE_MS
        .saturating_mul(1u64 << exp)
        .min(BACKOFF_CAP_MS);
    Duration::from_millis(ms)
}

fn snippet(raw: &str) -> String {
    raw.chars().take(BODY_SNIPPET_CHARS).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config(url: &str) -> AiConfig {
        AiConfig {
            url: Some(url.to_string()),
            token: Some("test-token".into()),
            system_prompt: "Be helpful.".into(),
            provider: None,
            model: None,
            max_tokens: 1000,
            temperature: 0.7,
        }
    }

    fn completion_body(text: &str) -> serde_json::Value {
        serde_json::json!({"choices": [{"message": {"content": text}}]})
    }

    #[tokio::test]
    async fn dispatch_returns_trimmed_content_on_first_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("  hello back  ")))
            .expect(1)
            .mount(&server)
            .await;

        let dispatcher = Dispatcher::new().unwrap();
        let observer = Observer::new();
        let result = dispatcher
            .dispatch("hi", &test_config(&server.uri()), 3, &observer)
            .await
            .unwrap();

        assert_eq!(result, "hello back");
        assert_eq!(observer.metrics().ai_calls_success, 1);
    }

    #[tokio::test]
    async fn dispatch_recovers_after_two_transient_failures() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(500).set_body_string("upstream broke"))
            .up_to_n_times(2)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("third time lucky")))
            .mount(&server)
            .await;

        let dispatcher = Dispatcher::new().unwrap();
        let observer = Observer::new();
        let result = dispatcher
            .dispatch("hi", &test_config(&server.uri()), 3, &observer)
            .await
            .unwrap();

        assert_eq!(result, "third time lucky");
        assert_eq!(server.received_requests().await.unwrap().len(), 3);
        assert_eq!(observer.metrics().ai_calls_success, 1);
    }

    #[tokio::test]
    async fn dispatch_exhausts_attempts_with_backoff() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
            .expect(3)
            .mount(&server)
            .await;

        let dispatcher = Dispatcher::new().unwrap();
        let observer = Observer::new();
        let started = Instant::now();
        let err = dispatcher
            .dispatch("hi", &test_config(&server.uri()), 3, &observer)
            .await
            .unwrap_err();

        // Backoff between three attempts is 1s + 2s.
        assert!(
            started.elapsed() >= Duration::from_secs(3),
            "expected >= 3s of backoff, took {:?}",
            started.elapsed()
        );

        let message = err.to_string();
        assert!(message.contains("failed after 3 attempts"), "got: {message}");
        assert!(message.contains("503"), "got: {message}");
        assert!(message.contains("overloaded"), "got: {message}");
        assert_eq!(observer.metrics().ai_calls_failed, 1);
    }

    #[tokio::test]
    async fn non_json_success_body_is_a_parse_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
            .expect(1)
            .mount(&server)
            .await;

        let dispatcher = Dispatcher::new().unwrap();
        let observer = Observer::new();
        let err = dispatcher
            .dispatch("hi", &test_config(&server.uri()), 1, &observer)
            .await
            .unwrap_err();

        let message = err.to_string();
        assert!(message.contains("response parse failure"), "got: {message}");
        assert!(message.contains("not json"), "got: {message}");
    }

    #[tokio::test]
    async fn json_body_without_reply_text_is_invalid() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"choices": []})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let dispatcher = Dispatcher::new().unwrap();
        let observer = Observer::new();
        let err = dispatcher
            .dispatch("hi", &test_config(&server.uri()), 1, &observer)
            .await
            .unwrap_err();

        assert!(err.to_string().contains("invalid response"), "got: {err}");
    }

    #[tokio::test]
    async fn error_snippet_is_capped_at_200_chars() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(500).set_body_string("e".repeat(5000)))
            .mount(&server)
            .await;

        let dispatcher = Dispatcher::new().unwrap();
        let observer = Observer::new();
        let err = dispatcher
            .dispatch("hi", &test_config(&server.uri()), 1, &observer)
            .await
            .unwrap_err();

        let message = err.to_string();
        assert!(message.contains(&"e".repeat(200)), "snippet missing");
        assert!(!message.contains(&"e".repeat(201)), "snippet not capped");
    }

    #[tokio::test]
    async fn vendor_headers_and_body_reach_the_wire() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/"))
            .and(header("authorization", "Bearer test-token"))
            .and(header("content-type", "application/json"))
            .and(body_partial_json(serde_json::json!({
                "model": "gpt-3.5-turbo",
                "max_tokens": 1000,
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("ok")))
            .expect(1)
            .mount(&server)
            .await;

        let dispatcher = Dispatcher::new().unwrap();
        let observer = Observer::new();
        let result = dispatcher
            .dispatch("hi", &test_config(&server.uri()), 1, &observer)
            .await;
        assert!(result.is_ok(), "headers/body should match: {result:?}");
    }

    #[tokio::test]
    async fn azure_without_endpoint_fails_without_any_request() {
        let mut config = test_config("");
        config.url = None;
        config.provider = Some("azure".into());

        let dispatcher = Dispatcher::new().unwrap();
        let observer = Observer::new();
        let err = dispatcher.dispatch("hi", &config, 3, &observer).await.unwrap_err();
        assert!(err.to_string().contains("no default endpoint"), "got: {err}");
        assert_eq!(observer.metrics().ai_calls_failed, 1);
    }

    #[test]
    fn backoff_grows_exponentially_and_caps_at_5s() {
        assert_eq!(backoff_delay(1), Duration::from_millis(1000));
        assert_eq!(backoff_delay(2), Duration::from_millis(2000));
        assert_eq!(backoff_delay(3), Duration::from_millis(4000));
        assert_eq!(backoff_delay(4), Duration::from_millis(5000));
        assert_eq!(backoff_delay(50), Duration::from_millis(5000));
    }
}
