// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use crate::algo::AlgorithmManager;
use crate::device::DeviceManager;
use crate::engine::TaskGraph;
use crate::errors::{SplaError, SplaResult};
use crate::expression::context::ExpressionContext;
use crate::expression::expression::{Expression, ExpressionState};
use crate::expression::node::Operation;
use crate::expression::{processors, traversal, validation};
use crate::observability::messages::dispatch::{NoCandidateMatched, ProcessorSelected};
use crate::observability::messages::expression::{
    CyclicDependencyDetected, ExpressionEvaluated, ExpressionFailed, SubmissionStarted,
    TraversalDefined,
};
use crate::observability::messages::StructuredLog;
use crate::traits::{NodeProcessor, TaskExecutor};

type ProcessorList = Vec<Arc<dyn NodeProcessor>>;

/// Validates expressions, picks a processor per node and composes the task graph.
///
/// Processors are kept per operation in registration order; the first registered
/// processor whose predicate matches a node handles it.
#[derive(Default)]
pub struct ExpressionManager {
    processors: HashMap<Operation, ProcessorList>,
}

impl ExpressionManager {
    /// Empty manager without any processors.
    pub fn new() -> Self {
        Self::default()
    }

    /// Manager with one built-in processor per operation.
    pub fn with_builtin() -> Self {
        let mut manager = Self::new();
        processors::register_builtin(&mut manager);
        manager
    }

    /// Append `processor` to the candidates of its operation.
    pub fn register(&mut self, processor: Arc<dyn NodeProcessor>) {
        self.processors
            .entry(processor.operation_type())
            .or_default()
            .push(processor);
    }

    /// Total number of registered candidates across all kinds.
    pub fn registered_count(&self) -> usize {
        self.processors.values().map(Vec::len).sum()
    }

    pub fn candidate_count(&self, op: Operation) -> usize {
        self.processors.get(&op).map(Vec::len).unwrap_or(0)
    }

    /// First registered processor of the node's operation that selects it.
    pub fn select_processor(
        &self,
        idx: usize,
        context: &ExpressionContext,
    ) -> SplaResult<&Arc<dyn NodeProcessor>> {
        let op = context.node(idx).operation();
        let candidates = self
            .processors
            .get(&op)
            .filter(|list| !list.is_empty())
            .ok_or_else(|| SplaError::invalid_state(format!("No processors for such op={}", op)))?;

        candidates
            .iter()
            .find(|processor| processor.select(idx, context))
            .ok_or_else(|| {
                NoCandidateMatched {
                    candidate_kind: "processor",
                    key: op.name(),
                    candidates: candidates.len(),
                }
                .log();
                SplaError::invalid_state(format!(
                    "Failed to find suitable processor for node {} op={}",
                    idx, op
                ))
            })
    }

    /// Validate `expression` and build its task graph without running anything.
    pub fn prepare(
        &self,
        expression: &Expression,
        devices: Arc<DeviceManager>,
        algorithms: Arc<AlgorithmManager>,
    ) -> SplaResult<TaskGraph> {
        let label = expression.label();
        let mut context = ExpressionContext::new(expression, devices, algorithms);

        context.start_nodes = validation::find_start_nodes(expression.nodes());
        if context.start_nodes.is_empty() {
            return Err(SplaError::invalid_argument(format!(
                "No start nodes to run computation in expression={}; Possibly have some dependency cycle?",
                label
            )));
        }

        context.end_nodes = validation::find_end_nodes(expression.nodes());
        if context.end_nodes.is_empty() {
            return Err(SplaError::invalid_argument(format!(
                "No end nodes in expression={}; Possibly have some dependency cycle?",
                label
            )));
        }

        if let Some(cycle) = validation::find_cycle(expression.nodes(), &context.start_nodes) {
            CyclicDependencyDetected {
                label,
                cycle: &cycle,
            }
            .log();
            return Err(SplaError::invalid_argument(format!(
                "Provided expression={} has dependency cycle",
                label
            )));
        }

        context.traversal = traversal::define_traversal_path(expression.nodes(), &context.start_nodes);
        TraversalDefined {
            label,
            start_nodes: context.start_nodes(),
            end_nodes: context.end_nodes(),
            order: context.traversal(),
        }
        .log();

        for position in 0..context.traversal.len() {
            let idx = context.traversal[position];
            let processor = Arc::clone(self.select_processor(idx, &context)?);

            ProcessorSelected {
                node: idx,
                operation: context.node(idx).operation().name(),
                processor: processor.name(),
            }
            .log();

            processor.process(idx, &mut context)?;
        }

        context.compose()
    }

    /// Submit `expression` and wait for every node to finish.
    ///
    /// The expression must be in [`ExpressionState::Default`]; otherwise it is left
    /// untouched. Any later failure moves it to [`ExpressionState::Failed`].
    pub async fn submit(
        &self,
        expression: &mut Expression,
        devices: Arc<DeviceManager>,
        algorithms: Arc<AlgorithmManager>,
        executor: &dyn TaskExecutor,
    ) -> SplaResult<()> {
        if expression.state() != ExpressionState::Default {
            return Err(SplaError::invalid_argument(format!(
                "Passed expression={} must be in `Default` state before evaluation",
                expression.label()
            )));
        }

        let started = Instant::now();
        SubmissionStarted {
            label: expression.label(),
            node_count: expression.len(),
        }
        .log();

        expression.set_state(ExpressionState::Submitted);

        // Nothing to schedule
        if expression.is_empty() {
            expression.set_state(ExpressionState::Evaluated);
            return Ok(());
        }

        let result = match self.prepare(expression, devices, algorithms) {
            Ok(graph) => executor.run(graph).await.map_err(SplaError::from),
            Err(error) => Err(error),
        };

        match result {
            Ok(()) => {
                expression.set_state(ExpressionState::Evaluated);
                ExpressionEvaluated {
                    label: expression.label(),
                    node_count: expression.len(),
                    duration: started.elapsed(),
                }
                .log();
                Ok(())
            }
            Err(error) => {
                expression.set_state(ExpressionState::Failed);
                ExpressionFailed {
                    label: expression.label(),
                    error: &error,
                }
                .log();
                Err(error)
            }
        }
    }
}

impl std::fmt::Debug for ExpressionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<_> = self
            .processors
            .iter()
            .map(|(op, list)| (op.name(), list.iter().map(|p| p.name()).collect::<Vec<_>>()))
            .collect();
        names.sort();
        f.debug_struct("ExpressionManager")
            .field("processors", &names)
            .finish()
    }
}
