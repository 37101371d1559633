// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The observability sink: a bounded in-memory log ring plus running
//! request/AI-call counters.
//!
//! One `Observer` is constructed at process start and threaded through
//! component constructors as an `Arc`. All counters are atomics and the log
//! ring is behind a plain mutex; no lock is held across await points or
//! network calls. Every entry is mirrored to `tracing`.

use std::collections::{BTreeMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

use courier_core::EventType;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::entry::{LogEntry, LogLevel, LogScope};

/// Maximum number of log entries retained; the oldest are evicted beyond this.
pub const MAX_LOG_ENTRIES: usize = 1000;

/// Activity within this window counts as "recent" for the health check.
const RECENT_ACTIVITY_WINDOW_MS: i64 = 5 * 60 * 1000;

/// Snapshot of the running counters, serialized for `GET /monitoring`.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
    pub average_response_time_ms: f64,
    pub ai_calls_count: u64,
    pub ai_calls_success: u64,
    pub ai_calls_failed: u64,
    pub last_activity: String,
    pub uptime_ms: u64,
    pub event_counts: BTreeMap<String, u64>,
}

/// Traffic-light health status for operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthLevel {
    Healthy,
    Warning,
    Error,
}

/// Aggregated health report from the three operator checks.
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub status: HealthLevel,
    pub checks: BTreeMap<String, bool>,
    pub message: String,
}

/// Append-only log ring and running counters.
pub struct Observer {
    logs: Mutex<VecDeque<LogEntry>>,
    total_requests: AtomicU64,
    successful_requests: AtomicU64,
    failed_requests: AtomicU64,
    response_time_total_ms: AtomicU64,
    timed_requests: AtomicU64,
    ai_calls_count: AtomicU64,
    ai_calls_success: AtomicU64,
    ai_calls_failed: AtomicU64,
    event_counts: [AtomicU64; 8],
    last_activity_ms: AtomicI64,
    started_at_ms: AtomicI64,
}

impl Observer {
    /// Create an empty observer. `last_activity` starts at construction time
    /// so a freshly booted relay reports healthy.
    pub fn new() -> Self {
        let now = now_ms();
        Self {
            logs: Mutex::new(VecDeque::with_capacity(MAX_LOG_ENTRIES)),
            total_requests: AtomicU64::new(0),
            successful_requests: AtomicU64::new(0),
            failed_requests: AtomicU64::new(0),
            response_time_total_ms: AtomicU64::new(0),
            timed_requests: AtomicU64::new(0),
            ai_calls_count: AtomicU64::new(0),
            ai_calls_success: AtomicU64::new(0),
            ai_calls_failed: AtomicU64::new(0),
            event_counts: Default::default(),
            last_activity_ms: AtomicI64::new(now),
            started_at_ms: AtomicI64::new(now),
        }
    }

    /// Record an info entry.
    pub fn info(&self, message: impl Into<String>, data: Option<serde_json::Value>, scope: LogScope) {
        self.push(LogLevel::Info, scope, message.into(), data, None, None, None);
    }

    /// Record a warning entry.
    pub fn warn(&self, message: impl Into<String>, data: Option<serde_json::Value>, scope: LogScope) {
        self.push(LogLevel::Warn, scope, message.into(), data, None, None, None);
    }

    /// Record an error entry. Errors count toward the failed-request rate.
    pub fn error(&self, message: impl Into<String>, data: Option<serde_json::Value>, scope: LogScope) {
        self.failed_requests.fetch_add(1, Ordering::Relaxed);
        self.push(LogLevel::Error, scope, message.into(), data, None, None, None);
    }

    /// Record a debug entry.
    pub fn debug(&self, message: impl Into<String>, data: Option<serde_json::Value>, scope: LogScope) {
        self.push(LogLevel::Debug, scope, message.into(), data, None, None, None);
    }

    /// Record an inbound webhook event and update the request counters.
    ///
    /// `payload` is the raw event body; identifying fields are extracted
    /// best-effort and never assumed to exist. The full payload is attached
    /// only to error-level entries.
    pub fn record_event(
        &self,
        event: EventType,
        payload: &serde_json::Value,
        level: LogLevel,
        duration_ms: Option<u64>,
    ) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        self.last_activity_ms.store(now_ms(), Ordering::Relaxed);
        self.event_counts[event_index(event)].fetch_add(1, Ordering::Relaxed);

        if level == LogLevel::Info {
            self.successful_requests.fetch_add(1, Ordering::Relaxed);
        }
        if let Some(ms) = duration_ms {
            self.response_time_total_ms.fetch_add(ms, Ordering::Relaxed);
            self.timed_requests.fetch_add(1, Ordering::Relaxed);
        }

        let conversation_id = payload
            .pointer("/conversation/id")
            .and_then(|v| v.as_i64())
            .or_else(|| payload.get("id").and_then(|v| v.as_i64()));
        let user_id = payload
            .pointer("/sender/id")
            .and_then(|v| v.as_i64())
            .or_else(|| payload.pointer("/user/id").and_then(|v| v.as_i64()));
        let sender_name = payload
            .pointer("/sender/name")
            .or_else(|| payload.pointer("/contact/name"))
            .and_then(|v| v.as_str());

        let mut message = format!("webhook event: {event}");
        match event {
            EventType::MessageCreated => {
                if let Some(content) = payload.get("content").and_then(|v| v.as_str()) {
                    let preview = truncate(content, 50);
                    let sender = sender_name.unwrap_or("unknown user");
                    message.push_str(&format!(" | sender: {sender} | content: \"{preview}\""));
                }
            }
            EventType::ConversationCreated => message.push_str(" | new conversation"),
            EventType::ConversationStatusChanged => {
                let status = payload
                    .get("status")
                    .and_then(|v| v.as_str())
                    .unwrap_or("unknown");
                message.push_str(&format!(" | status: {status}"));
            }
            _ => {}
        }

        let mut data = serde_json::json!({
            "event": event,
            "conversation_id": conversation_id,
            "user_id": user_id,
            "content": payload.get("content"),
            "message_type": payload.get("message_type"),
            "sender_name": sender_name,
            "status": payload.get("status"),
        });
        if level == LogLevel::Error
            && let Some(obj) = data.as_object_mut()
        {
            obj.insert("full_payload".to_string(), payload.clone());
        }

        self.push(
            level,
            LogScope::Event(event),
            message,
            Some(data),
            duration_ms,
            conversation_id,
            user_id,
        );
    }

    /// Record the final outcome of an AI dispatch (or one failed attempt).
    pub fn record_ai_call(
        &self,
        success: bool,
        duration_ms: u64,
        provider: &str,
        model: &str,
        error_detail: Option<&str>,
    ) {
        self.ai_calls_count.fetch_add(1, Ordering::Relaxed);

        let data = serde_json::json!({
            "provider": provider,
            "model": model,
            "duration_ms": duration_ms,
            "success": success,
            "error": error_detail,
        });

        if success {
            self.ai_calls_success.fetch_add(1, Ordering::Relaxed);
            self.info(
                format!("AI call succeeded | {provider} {model} | {duration_ms}ms"),
                Some(data),
                LogScope::AiCall,
            );
        } else {
            self.ai_calls_failed.fetch_add(1, Ordering::Relaxed);
            let detail = error_detail.unwrap_or("unknown error");
            self.error(
                format!("AI call failed | {provider} {model} | {duration_ms}ms | {detail}"),
                Some(data),
                LogScope::AiCall,
            );
        }
    }

    /// Return log entries, newest first, optionally filtered.
    pub fn logs(
        &self,
        limit: Option<usize>,
        level: Option<LogLevel>,
        scope: Option<&str>,
    ) -> Vec<LogEntry> {
        let logs = self.logs.lock().unwrap_or_else(|e| e.into_inner());
        let filtered = logs
            .iter()
            .rev()
            .filter(|entry| level.is_none_or(|l| entry.level == l))
            .filter(|entry| scope.is_none_or(|s| entry.scope.to_string() == s));
        match limit {
            Some(n) => filtered.take(n).cloned().collect(),
            None => filtered.cloned().collect(),
        }
    }

    /// Snapshot the running counters.
    pub fn metrics(&self) -> MetricsSnapshot {
        let timed = self.timed_requests.load(Ordering::Relaxed);
        let average = if timed == 0 {
            0.0
        } else {
            self.response_time_total_ms.load(Ordering::Relaxed) as f64 / timed as f64
        };

        let mut event_counts = BTreeMap::new();
        for event in EventType::ALL {
            event_counts.insert(
                event.to_string(),
                self.event_counts[event_index(event)].load(Ordering::Relaxed),
            );
        }

        MetricsSnapshot {
            total_requests: self.total_requests.load(Ordering::Relaxed),
            successful_requests: self.successful_requests.load(Ordering::Relaxed),
            failed_requests: self.failed_requests.load(Ordering::Relaxed),
            average_response_time_ms: average,
            ai_calls_count: self.ai_calls_count.load(Ordering::Relaxed),
            ai_calls_success: self.ai_calls_success.load(Ordering::Relaxed),
            ai_calls_failed: self.ai_calls_failed.load(Ordering::Relaxed),
            last_activity: ms_to_rfc3339(self.last_activity_ms.load(Ordering::Relaxed)),
            uptime_ms: (now_ms() - self.started_at_ms.load(Ordering::Relaxed)).max(0) as u64,
            event_counts,
        }
    }

    /// Aggregate the three operator checks into a traffic-light status:
    /// recent activity within 5 minutes, error rate below 10%, AI success
    /// rate above 80%. One failed check is a warning, two or more an error.
    pub fn health(&self) -> HealthReport {
        let total = self.total_requests.load(Ordering::Relaxed);
        let failed = self.failed_requests.load(Ordering::Relaxed);
        let ai_total = self.ai_calls_count.load(Ordering::Relaxed);
        let ai_success = self.ai_calls_success.load(Ordering::Relaxed);

        let recent_activity =
            now_ms() - self.last_activity_ms.load(Ordering::Relaxed) < RECENT_ACTIVITY_WINDOW_MS;
        let low_error_rate = total == 0 || (failed as f64 / total as f64) < 0.1;
        let ai_calls_working = ai_total == 0 || (ai_success as f64 / ai_total as f64) > 0.8;

        let mut checks = BTreeMap::new();
        checks.insert("recent_activity".to_string(), recent_activity);
        checks.insert("low_error_rate".to_string(), low_error_rate);
        checks.insert("ai_calls_working".to_string(), ai_calls_working);

        let failed_checks: Vec<&str> = checks
            .iter()
            .filter(|(_, passed)| !**passed)
            .map(|(name, _)| name.as_str())
            .collect();

        let (status, message) = match failed_checks.len() {
            0 => (HealthLevel::Healthy, "all checks passing".to_string()),
            1 => (
                HealthLevel::Warning,
                format!("checks failed: {}", failed_checks.join(", ")),
            ),
            _ => (
                HealthLevel::Error,
                format!("checks failed: {}", failed_checks.join(", ")),
            ),
        };

        HealthReport {
            status,
            checks,
            message,
        }
    }

    /// Drop all retained log entries. Counters are unaffected.
    pub fn clear_logs(&self) {
        self.logs.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }

    /// Reset every counter and restart the uptime clock.
    pub fn reset_metrics(&self) {
        let now = now_ms();
        self.total_requests.store(0, Ordering::Relaxed);
        self.successful_requests.store(0, Ordering::Relaxed);
        self.failed_requests.store(0, Ordering::Relaxed);
        self.response_time_total_ms.store(0, Ordering::Relaxed);
        self.timed_requests.store(0, Ordering::Relaxed);
        self.ai_calls_count.store(0, Ordering::Relaxed);
        self.ai_calls_success.store(0, Ordering::Relaxed);
        self.ai_calls_failed.store(0, Ordering::Relaxed);
        for counter in &self.event_counts {
            counter.store(0, Ordering::Relaxed);
        }
        self.last_activity_ms.store(now, Ordering::Relaxed);
        self.started_at_ms.store(now, Ordering::Relaxed);
    }

    #[allow(clippy::too_many_arguments)]
    fn push(
        &self,
        level: LogLevel,
        scope: LogScope,
        message: String,
        data: Option<serde_json::Value>,
        duration_ms: Option<u64>,
        conversation_id: Option<i64>,
        user_id: Option<i64>,
    ) {
        match level {
            LogLevel::Info => info!(target: "courier::observer", %scope, "{message}"),
            LogLevel::Warn => warn!(target: "courier::observer", %scope, "{message}"),
            LogLevel::Error => error!(target: "courier::observer", %scope, "{message}"),
            LogLevel::Debug => debug!(target: "courier::observer", %scope, "{message}"),
        }

        let entry = LogEntry {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            level,
            scope,
            message,
            data,
            duration_ms,
            conversation_id,
            user_id,
        };

        let mut logs = self.logs.lock().unwrap_or_else(|e| e.into_inner());
        logs.push_back(entry);
        while logs.len() > MAX_LOG_ENTRIES {
            logs.pop_front();
        }
    }
}

impl Default for Observer {
    fn default() -> Self {
        Self::new()
    }
}

fn event_index(event: EventType) -> usize {
    EventType::ALL
        .iter()
        .position(|e| *e == event)
        .unwrap_or_default()
}

fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

fn ms_to_rfc3339(ms: i64) -> String {
    chrono::DateTime::from_timestamp_millis(ms)
        .map(|dt| dt.to_rfc3339())
        .unwrap_or_default()
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let truncated: String = text.chars().take(max_chars).collect();
        format!("{truncated}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_ring_never_exceeds_cap() {
        let observer = Observer::new();
        for i in 0..5000 {
            observer.info(format!("entry {i}"), None, LogScope::System);
        }
        let logs = observer.logs(None, None, None);
        assert_eq!(logs.len(), MAX_LOG_ENTRIES);
    }

    #[test]
    fn oldest_entries_are_evicted_first() {
        let observer = Observer::new();
        for i in 0..1500 {
            observer.info(format!("entry {i}"), None, LogScope::System);
        }
        let logs = observer.logs(None, None, None);
        // Newest first: entry 1499 leads, entry 500 is the oldest survivor.
        assert_eq!(logs.first().unwrap().message, "entry 1499");
        assert_eq!(logs.last().unwrap().message, "entry 500");
    }

    #[test]
    fn logs_filter_by_level_and_scope() {
        let observer = Observer::new();
        observer.info("ok", None, LogScope::System);
        observer.error("broken", None, LogScope::AiCall);
        observer.warn("hm", None, LogScope::Event(EventType::MessageCreated));

        let errors = observer.logs(None, Some(LogLevel::Error), None);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "broken");

        let ai = observer.logs(None, None, Some("ai_call"));
        assert_eq!(ai.len(), 1);

        let events = observer.logs(None, None, Some("message_created"));
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].message, "hm");
    }

    #[test]
    fn logs_respect_limit() {
        let observer = Observer::new();
        for i in 0..10 {
            observer.info(format!("entry {i}"), None, LogScope::System);
        }
        let logs = observer.logs(Some(3), None, None);
        assert_eq!(logs.len(), 3);
        assert_eq!(logs[0].message, "entry 9");
    }

    #[test]
    fn record_event_updates_counters() {
        let observer = Observer::new();
        let payload = serde_json::json!({
            "event": "message_created",
            "content": "hello there",
            "message_type": "incoming",
            "conversation": {"id": 456},
            "sender": {"id": 7, "name": "Ada"},
        });
        observer.record_event(EventType::MessageCreated, &payload, LogLevel::Info, Some(120));
        observer.record_event(EventType::ConversationCreated, &payload, LogLevel::Info, None);

        let metrics = observer.metrics();
        assert_eq!(metrics.total_requests, 2);
        assert_eq!(metrics.successful_requests, 2);
        assert_eq!(metrics.event_counts["message_created"], 1);
        assert_eq!(metrics.event_counts["conversation_created"], 1);
        assert_eq!(metrics.event_counts["message_updated"], 0);
        assert_eq!(metrics.average_response_time_ms, 120.0);

        let logs = observer.logs(Some(1), None, Some("message_created"));
        assert_eq!(logs[0].conversation_id, Some(456));
        assert_eq!(logs[0].user_id, Some(7));
        assert!(logs[0].message.contains("Ada"));
    }

    #[test]
    fn message_preview_is_truncated() {
        let observer = Observer::new();
        let long = "x".repeat(80);
        let payload = serde_json::json!({"content": long, "sender": {"name": "Bo"}});
        observer.record_event(EventType::MessageCreated, &payload, LogLevel::Info, None);
        let logs = observer.logs(Some(1), None, None);
        assert!(logs[0].message.contains(&format!("{}...", "x".repeat(50))));
    }

    #[test]
    fn ai_call_counters_track_success_and_failure() {
        let observer = Observer::new();
        observer.record_ai_call(true, 800, "OpenAI", "gpt-4o", None);
        observer.record_ai_call(false, 30000, "OpenAI", "gpt-4o", Some("timeout"));

        let metrics = observer.metrics();
        assert_eq!(metrics.ai_calls_count, 2);
        assert_eq!(metrics.ai_calls_success, 1);
        assert_eq!(metrics.ai_calls_failed, 1);
        // The failed AI call is logged at error level and counts as a failed request.
        assert_eq!(metrics.failed_requests, 1);
    }

    #[test]
    fn health_is_healthy_on_fresh_observer() {
        let observer = Observer::new();
        let report = observer.health();
        assert_eq!(report.status, HealthLevel::Healthy);
        assert!(report.checks.values().all(|passed| *passed));
    }

    #[test]
    fn health_degrades_with_error_rate_and_ai_failures() {
        let observer = Observer::new();
        let payload = serde_json::json!({});
        // 10 requests, 5 of them errors -> error rate 50%.
        for _ in 0..5 {
            observer.record_event(EventType::MessageCreated, &payload, LogLevel::Info, None);
            observer.record_event(EventType::MessageCreated, &payload, LogLevel::Error, None);
            observer.error("boom", None, LogScope::System);
        }
        let report = observer.health();
        assert_ne!(report.status, HealthLevel::Healthy);
        assert!(!report.checks["low_error_rate"]);

        // Also fail the AI check -> two failed checks -> error status.
        for _ in 0..5 {
            observer.record_ai_call(false, 10, "OpenAI", "gpt-4o", Some("nope"));
        }
        let report = observer.health();
        assert_eq!(report.status, HealthLevel::Error);
        assert!(!report.checks["ai_calls_working"]);
    }

    #[test]
    fn reset_metrics_zeroes_counters_but_keeps_logs() {
        let observer = Observer::new();
        observer.record_event(
            EventType::MessageCreated,
            &serde_json::json!({}),
            LogLevel::Info,
            Some(50),
        );
        observer.record_ai_call(true, 100, "OpenAI", "gpt-4o", None);
        observer.reset_metrics();

        let metrics = observer.metrics();
        assert_eq!(metrics.total_requests, 0);
        assert_eq!(metrics.ai_calls_count, 0);
        assert_eq!(metrics.average_response_time_ms, 0.0);
        assert_eq!(metrics.event_counts["message_created"], 0);
        // Logs survive a metrics reset; clearing them is a separate action.
        assert!(!observer.logs(None, None, None).is_empty());

        observer.clear_logs();
        assert!(observer.logs(None, None, None).is_empty());
    }
}
