// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::Arc;

use crate::algo::AlgorithmManager;
use crate::device::DeviceManager;
use crate::engine::{Subflow, TaskGraph};
use crate::errors::{SplaError, SplaResult};
use crate::expression::expression::Expression;
use crate::expression::node::ExpressionNode;

/// Per-submission scratch state shared by validation, traversal and processors.
///
/// Lives only for the duration of one graph construction.
pub struct ExpressionContext<'a> {
    expression: &'a Expression,
    devices: Arc<DeviceManager>,
    algorithms: Arc<AlgorithmManager>,
    pub(crate) start_nodes: Vec<usize>,
    pub(crate) end_nodes: Vec<usize>,
    pub(crate) traversal: Vec<usize>,
    node_flows: Vec<Option<Subflow>>,
}

impl<'a> ExpressionContext<'a> {
    pub fn new(
        expression: &'a Expression,
        devices: Arc<DeviceManager>,
        algorithms: Arc<AlgorithmManager>,
    ) -> Self {
        let node_flows = std::iter::repeat_with(|| None)
            .take(expression.len())
            .collect();
        Self {
            expression,
            devices,
            algorithms,
            start_nodes: Vec::new(),
            end_nodes: Vec::new(),
            traversal: Vec::new(),
            node_flows,
        }
    }

    pub fn expression(&self) -> &'a Expression {
        self.expression
    }

    /// Node `idx`; indices come from the expression itself.
    pub fn node(&self, idx: usize) -> &'a ExpressionNode {
        &self.expression.nodes()[idx]
    }

    pub fn devices(&self) -> &Arc<DeviceManager> {
        &self.devices
    }

    pub fn algorithms(&self) -> &Arc<AlgorithmManager> {
        &self.algorithms
    }

    pub fn start_nodes(&self) -> &[usize] {
        &self.start_nodes
    }

    pub fn end_nodes(&self) -> &[usize] {
        &self.end_nodes
    }

    pub fn traversal(&self) -> &[usize] {
        &self.traversal
    }

    /// Store the units that compute node `idx`.
    pub fn set_node_flow(&mut self, idx: usize, flow: Subflow) {
        self.node_flows[idx] = Some(flow);
    }

    pub fn has_node_flow(&self, idx: usize) -> bool {
        self.node_flows.get(idx).map_or(false, Option::is_some)
    }

    /// Wrap every node's sub-flow as a module and mirror the node edges.
    pub fn compose(self) -> SplaResult<TaskGraph> {
        let mut graph = TaskGraph::new(self.expression.label());
        let nodes = self.expression.nodes();

        let mut modules = Vec::with_capacity(nodes.len());
        for (idx, flow) in self.node_flows.into_iter().enumerate() {
            let flow = flow.ok_or_else(|| {
                SplaError::invalid_state(format!(
                    "Node {} of expression={} was not processed",
                    idx,
                    self.expression.label()
                ))
            })?;
            let name = format!("{}#{}", nodes[idx].operation(), idx);
            modules.push(graph.composed_of(name, idx, flow));
        }

        for &idx in &self.traversal {
            for &next in nodes[idx].next() {
                graph.precede(modules[idx], modules[next])?;
            }
        }

        Ok(graph)
    }
}
