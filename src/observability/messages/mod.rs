// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Centralized message types for structured logging.
//!
//! Each message is a plain struct implementing `Display` (the human-readable
//! line) and [`StructuredLog`] (the `tracing` emission with structured
//! fields). Call sites construct the struct and call `.log()` instead of
//! formatting strings inline.

use tracing::Span;

pub mod engine;
pub mod validation;

/// Emits a message through `tracing` with structured fields attached.
pub trait StructuredLog {
    /// Logs the message at its appropriate level.
    fn log(&self);

    /// Creates a span carrying the message's fields.
    fn span(&self, name: &str) -> Span;
}
