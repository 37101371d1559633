// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Courier webhook relay.

use thiserror::Error;

/// The primary error type used across all Courier crates.
#[derive(Debug, Error)]
pub enum CourierError {
    /// Configuration errors (invalid TOML, missing required keys, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Inbound payload failed envelope validation (malformed or unsupported event).
    #[error("validation error: {0}")]
    Validation(String),

    /// AI provider errors (non-2xx response, unparseable body, empty reply).
    #[error("provider error: {message}")]
    Provider {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Chat platform errors (reply delivery failure, bad bind address).
    #[error("platform error: {message}")]
    Platform {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

/// The outcome of a single AI dispatch attempt.
///
/// The retry loop inspects this explicitly instead of relying on error
/// propagation for control flow: `Retryable` failures are eligible for
/// backoff-and-retry, `Fatal` failures abort the loop immediately.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptError {
    /// Transient failure (non-2xx status, timeout, unparseable or empty body).
    Retryable(String),
    /// Failure no retry can fix (e.g. the request body cannot be built).
    Fatal(String),
}

impl AttemptError {
    /// The human-readable failure description, regardless of variant.
    pub fn message(&self) -> &str {
        match self {
            AttemptError::Retryable(msg) | AttemptError::Fatal(msg) => msg,
        }
    }
}

impl std::fmt::Display for AttemptError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}
