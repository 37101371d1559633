// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! AI provider abstraction for the Courier webhook relay.
//!
//! [`Provider`] is a fixed set of vendor descriptors behind one shape —
//! request formatter, response parser, header builder — selected by a pure
//! resolver. [`Dispatcher`] performs the actual HTTP call with a hard
//! per-attempt timeout and capped exponential backoff.

pub mod descriptor;
pub mod dispatch;

pub use descriptor::Provider;
pub use dispatch::{DEFAULT_MAX_ATTEMPTS, Dispatcher};
