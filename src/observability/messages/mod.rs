// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Centralized message types for structured logging.
//!
//! # Organization
//!
//! * `expression` - submission lifecycle, validation and traversal events
//! * `dispatch` - processor and algorithm selection events
//! * `engine` - task graph execution and device queue events

use tracing::Span;

pub mod dispatch;
pub mod engine;
pub mod expression;

/// A log message that knows its level and structured fields.
pub trait StructuredLog {
    /// Emit the event at the message's level.
    fn log(&self);

    /// Open a span carrying the message's fields.
    fn span(&self, name: &str) -> Span;
}
