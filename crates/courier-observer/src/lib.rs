// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Observability sink for the Courier webhook relay.
//!
//! Keeps the most recent log entries in a bounded in-memory ring and tracks
//! running request and AI-call counters. The sink is deliberately not a
//! global: one [`Observer`] is built at startup and injected into each
//! component. State lives only in memory and resets on restart; the
//! `/monitoring` endpoint reads and clears it.

pub mod entry;
pub mod sink;

pub use entry::{LogEntry, LogLevel, LogScope};
pub use sink::{HealthLevel, HealthReport, MAX_LOG_ENTRIES, MetricsSnapshot, Observer};
