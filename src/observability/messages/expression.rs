// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for expression submission, validation and traversal.

use crate::errors::SplaError;
use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use std::time::Duration;
use tracing::Span;

/// Submission accepted and validation is starting.
///
/// # Log Level
/// `info!` - Important operational event
pub struct SubmissionStarted<'a> {
    pub label: &'a str,
    pub node_count: usize,
}

impl Display for SubmissionStarted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Submitting expression '{}' with {} nodes",
            self.label, self.node_count
        )
    }
}

impl StructuredLog for SubmissionStarted<'_> {
    fn log(&self) {
        tracing::info!(
            label = self.label,
            node_count = self.node_count,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "submission",
            span_name = name,
            label = self.label,
            node_count = self.node_count,
        )
    }
}

/// Expression evaluated successfully.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use spla_flow::observability::messages::expression::ExpressionEvaluated;
/// use std::time::Duration;
///
/// let msg = ExpressionEvaluated {
///     label: "bfs-step",
///     node_count: 3,
///     duration: Duration::from_millis(12),
/// };
///
/// tracing::info!("{}", msg);
/// ```
pub struct ExpressionEvaluated<'a> {
    pub label: &'a str,
    pub node_count: usize,
    pub duration: Duration,
}

impl Display for ExpressionEvaluated<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Expression '{}' evaluated: {} nodes in {:?}",
            self.label, self.node_count, self.duration
        )
    }
}

impl StructuredLog for ExpressionEvaluated<'_> {
    fn log(&self) {
        tracing::info!(
            label = self.label,
            node_count = self.node_count,
            duration_ms = self.duration.as_millis() as u64,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "expression_evaluated",
            span_name = name,
            label = self.label,
            node_count = self.node_count,
            duration = ?self.duration,
        )
    }
}

/// Submission rejected or failed.
///
/// # Log Level
/// `error!` - Failure requiring attention
pub struct ExpressionFailed<'a> {
    pub label: &'a str,
    pub error: &'a SplaError,
}

impl Display for ExpressionFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Expression '{}' failed: {}", self.label, self.error)
    }
}

impl StructuredLog for ExpressionFailed<'_> {
    fn log(&self) {
        tracing::error!(
            label = self.label,
            kind = self.error.kind(),
            error = %self.error,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "expression_failed",
            span_name = name,
            label = self.label,
            kind = self.error.kind(),
        )
    }
}

/// Cyclic dependency detected between nodes.
///
/// # Log Level
/// `error!` - Failure requiring attention
///
/// # Example
/// ```
/// use spla_flow::observability::messages::expression::CyclicDependencyDetected;
///
/// let cycle = vec![1, 2, 3, 1];
/// let msg = CyclicDependencyDetected {
///     label: "broken",
///     cycle: &cycle,
/// };
///
/// assert_eq!(msg.to_string(), "Cyclic dependency detected in expression 'broken': 1 -> 2 -> 3 -> 1");
/// ```
pub struct CyclicDependencyDetected<'a> {
    pub label: &'a str,
    pub cycle: &'a [usize],
}

impl CyclicDependencyDetected<'_> {
    fn path(&self) -> String {
        self.cycle
            .iter()
            .map(|idx| idx.to_string())
            .collect::<Vec<_>>()
            .join(" -> ")
    }
}

impl Display for CyclicDependencyDetected<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Cyclic dependency detected in expression '{}': {}",
            self.label,
            self.path()
        )
    }
}

impl StructuredLog for CyclicDependencyDetected<'_> {
    fn log(&self) {
        tracing::error!(
            label = self.label,
            cycle = self.path(),
            cycle_length = self.cycle.len(),
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "cyclic_dependency",
            span_name = name,
            label = self.label,
            cycle = self.path(),
        )
    }
}

/// Processing order computed.
///
/// # Log Level
/// `debug!` - Detailed diagnostic information
pub struct TraversalDefined<'a> {
    pub label: &'a str,
    pub start_nodes: &'a [usize],
    pub end_nodes: &'a [usize],
    pub order: &'a [usize],
}

impl Display for TraversalDefined<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Traversal for expression '{}': start={:?} end={:?} order={:?}",
            self.label, self.start_nodes, self.end_nodes, self.order
        )
    }
}

impl StructuredLog for TraversalDefined<'_> {
    fn log(&self) {
        tracing::debug!(
            label = self.label,
            start_nodes = ?self.start_nodes,
            end_nodes = ?self.end_nodes,
            order = ?self.order,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "traversal",
            span_name = name,
            label = self.label,
            node_count = self.order.len(),
        )
    }
}
