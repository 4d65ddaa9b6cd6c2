// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for processor and algorithm selection.

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// A processor was selected for a node.
///
/// # Log Level
/// `debug!` - Detailed diagnostic information
pub struct ProcessorSelected<'a> {
    pub node: usize,
    pub operation: &'a str,
    pub processor: &'a str,
}

impl Display for ProcessorSelected<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Node {} (op={}) handled by processor '{}'",
            self.node, self.operation, self.processor
        )
    }
}

impl StructuredLog for ProcessorSelected<'_> {
    fn log(&self) {
        tracing::debug!(
            node = self.node,
            operation = self.operation,
            processor = self.processor,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "processor_selected",
            span_name = name,
            node = self.node,
            operation = self.operation,
            processor = self.processor,
        )
    }
}

/// An algorithm was selected for a parameter set.
///
/// # Log Level
/// `debug!` - Detailed diagnostic information
///
/// # Example
/// ```
/// use spla_flow::observability::messages::dispatch::AlgorithmSelected;
///
/// let msg = AlgorithmSelected {
///     algorithm: "VxMCOO",
///     algorithm_type: "VxM",
///     device: 1,
/// };
///
/// assert_eq!(msg.to_string(), "Algorithm 'VxMCOO' selected for VxM on device 1");
/// ```
pub struct AlgorithmSelected<'a> {
    pub algorithm: &'a str,
    pub algorithm_type: &'a str,
    pub device: usize,
}

impl Display for AlgorithmSelected<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Algorithm '{}' selected for {} on device {}",
            self.algorithm, self.algorithm_type, self.device
        )
    }
}

impl StructuredLog for AlgorithmSelected<'_> {
    fn log(&self) {
        tracing::debug!(
            algorithm = self.algorithm,
            algorithm_type = self.algorithm_type,
            device = self.device,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "algorithm",
            span_name = name,
            algorithm = self.algorithm,
            algorithm_type = self.algorithm_type,
            device = self.device,
        )
    }
}

/// No candidate matched.
///
/// # Log Level
/// `warn!` - The submission will fail with `InvalidState`
pub struct NoCandidateMatched<'a> {
    /// "processor" or "algorithm"
    pub candidate_kind: &'a str,
    pub key: &'a str,
    pub candidates: usize,
}

impl Display for NoCandidateMatched<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "None of {} registered {} candidates matched for op={}",
            self.candidates, self.candidate_kind, self.key
        )
    }
}

impl StructuredLog for NoCandidateMatched<'_> {
    fn log(&self) {
        tracing::warn!(
            candidate_kind = self.candidate_kind,
            key = self.key,
            candidates = self.candidates,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "no_candidate",
            span_name = name,
            candidate_kind = self.candidate_kind,
            key = self.key,
        )
    }
}
