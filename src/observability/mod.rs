// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Observability module for structured logging and tracing.
//!
//! Every diagnostic line in the crate comes from a message type in
//! [`messages`]. Each message implements `Display` for the human-readable text and
//! [`StructuredLog`](messages::StructuredLog) to emit the same event with typed
//! `tracing` fields. This keeps log wording out of the engine code and keeps field
//! names consistent across subsystems.
//!
//! # Usage
//!
//! ```rust
//! use spla_flow::observability::messages::expression::SubmissionStarted;
//! use spla_flow::observability::messages::StructuredLog;
//!
//! SubmissionStarted {
//!     label: "bfs-step",
//!     node_count: 4,
//! }
//! .log();
//! ```

pub mod messages;
