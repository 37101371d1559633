// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Courier webhook relay.
//!
//! This crate provides the error types, the recognized event-tag enum, and
//! the uniform response envelope used by every other crate in the workspace.

pub mod error;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::{AttemptError, CourierError};
pub use types::{EventType, WebhookResponse};
