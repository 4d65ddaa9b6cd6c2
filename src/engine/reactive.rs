// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc, Semaphore};
use tokio_util::sync::CancellationToken;

use crate::engine::task_graph::{Module, ModuleId, TaskGraph};
use crate::errors::ExecutionError;
use crate::observability::messages::engine::{
    ExecutionCompleted, ExecutionFailed, ExecutionStarted, ModuleCompleted,
};
use crate::observability::messages::StructuredLog;
use crate::traits::executor::TaskExecutor;

/// Event-driven executor for composed task graphs.
///
/// Every module gets its own async task and a channel. A module waits until it has
/// received one completion event per predecessor, acquires a concurrency permit and
/// runs its units on tokio's blocking pool (units may block on device queues). When
/// it finishes it notifies its successors directly, so independent branches never
/// wait on each other.
///
/// The first failing module cancels every module that has not started yet. Running
/// modules finish normally, and the first real failure is returned.
#[derive(Debug)]
pub struct ReactiveExecutor {
    /// Maximum number of modules running at once
    max_concurrency: usize,
}

/// Notification sent from a finished module to each of its successors
#[derive(Debug, Clone, Copy)]
struct DependencyCompleted {
    #[allow(dead_code)]
    dependency: ModuleId,
}

/// Per-module state moved into the module's task
struct ModuleNode {
    module: Module,
    receiver: mpsc::UnboundedReceiver<DependencyCompleted>,
    successors: Vec<ModuleId>,
    pending_dependencies: usize,
}

impl ReactiveExecutor {
    pub fn new(max_concurrency: usize) -> Self {
        Self {
            max_concurrency: max_concurrency.max(1),
        }
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    /// Reject graphs in which some module can never become ready.
    fn check_completes(graph: &TaskGraph) -> Result<(), ExecutionError> {
        let count = graph.module_count();
        let mut pending: Vec<usize> = (0..count)
            .map(|i| graph.predecessor_count(ModuleId(i)))
            .collect();
        let mut ready = graph.entry_modules();
        let mut released = 0;

        while let Some(id) = ready.pop() {
            released += 1;
            for succ in graph.successors(id) {
                pending[succ.0] -= 1;
                if pending[succ.0] == 0 {
                    ready.push(*succ);
                }
            }
        }

        if released == count {
            Ok(())
        } else {
            Err(ExecutionError::InvalidGraph {
                label: graph.label().to_string(),
                message: format!("{} of {} modules can never start", count - released, count),
            })
        }
    }

    fn build_notification_network(
        graph: TaskGraph,
    ) -> (String, Vec<mpsc::UnboundedSender<DependencyCompleted>>, Vec<ModuleNode>) {
        let (label, modules, successors, predecessors) = graph.into_parts();

        let mut senders = Vec::with_capacity(modules.len());
        let mut nodes = Vec::with_capacity(modules.len());

        for ((module, successors), pending_dependencies) in
            modules.into_iter().zip(successors).zip(predecessors)
        {
            let (sender, receiver) = mpsc::unbounded_channel();
            senders.push(sender);
            nodes.push(ModuleNode {
                module,
                receiver,
                successors,
                pending_dependencies,
            });
        }

        (label, senders, nodes)
    }

    async fn run_module(
        id: ModuleId,
        mut node: ModuleNode,
        senders: Arc<Vec<mpsc::UnboundedSender<DependencyCompleted>>>,
        semaphore: Arc<Semaphore>,
        cancellation_token: CancellationToken,
    ) -> Result<(), ExecutionError> {
        let cancelled = |node: &ModuleNode| ExecutionError::Cancelled {
            module: node.module.name.clone(),
        };

        while node.pending_dependencies > 0 {
            tokio::select! {
                _ = cancellation_token.cancelled() => {
                    return Err(cancelled(&node));
                }
                event = node.receiver.recv() => {
                    match event {
                        Some(DependencyCompleted { .. }) => node.pending_dependencies -= 1,
                        None => return Err(cancelled(&node)),
                    }
                }
            }
        }

        let _permit = tokio::select! {
            _ = cancellation_token.cancelled() => return Err(cancelled(&node)),
            permit = semaphore.acquire() => permit.map_err(|_| cancelled(&node))?,
        };
        if cancellation_token.is_cancelled() {
            return Err(cancelled(&node));
        }

        let name = node.module.name.clone();
        let node_idx = node.module.node;
        let unit_count = node.module.units.len();

        let handles: Vec<_> = node
            .module
            .units
            .drain(..)
            .map(tokio::task::spawn_blocking)
            .collect();

        let mut failure = None;
        for handle in handles {
            let outcome = match handle.await {
                Ok(Ok(())) => continue,
                Ok(Err(e)) => ExecutionError::NodeFailed {
                    node: node_idx,
                    label: name.clone(),
                    message: e.to_string(),
                },
                Err(e) => ExecutionError::TaskJoin(format!("module '{}': {}", name, e)),
            };
            failure.get_or_insert(outcome);
        }

        if let Some(error) = failure {
            cancellation_token.cancel();
            return Err(error);
        }

        ModuleCompleted {
            module: &name,
            units: unit_count,
            successors: node.successors.len(),
        }
        .log();

        for succ in &node.successors {
            // A closed receiver means the successor already gave up after cancellation.
            let _ = senders[succ.0].send(DependencyCompleted { dependency: id });
        }

        Ok(())
    }
}

impl Default for ReactiveExecutor {
    /// Concurrency equal to the number of available CPU cores.
    fn default() -> Self {
        let concurrency = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4);
        Self::new(concurrency)
    }
}

#[async_trait]
impl TaskExecutor for ReactiveExecutor {
    async fn run(&self, graph: TaskGraph) -> Result<(), ExecutionError> {
        let started = Instant::now();
        let module_count = graph.module_count();

        ExecutionStarted {
            executor: self.name(),
            module_count,
            max_concurrency: self.max_concurrency,
        }
        .log();

        if let Err(error) = Self::check_completes(&graph) {
            ExecutionFailed {
                executor: self.name(),
                error: &error,
            }
            .log();
            return Err(error);
        }

        let (_label, senders, nodes) = Self::build_notification_network(graph);
        let senders = Arc::new(senders);
        let semaphore = Arc::new(Semaphore::new(self.max_concurrency));
        let cancellation_token = CancellationToken::new();

        let tasks: Vec<_> = nodes
            .into_iter()
            .enumerate()
            .map(|(i, node)| {
                tokio::spawn(Self::run_module(
                    ModuleId(i),
                    node,
                    senders.clone(),
                    semaphore.clone(),
                    cancellation_token.clone(),
                ))
            })
            .collect();

        let mut module_error = None;
        let mut other_errors = Vec::new();

        for task in tasks {
            match task.await {
                Ok(Ok(())) => {}
                Ok(Err(e @ ExecutionError::Cancelled { .. })) => other_errors.push(e),
                Ok(Err(e)) => {
                    // Prioritize real failures over the cancellations they caused
                    module_error.get_or_insert(e);
                }
                Err(e) => other_errors.push(ExecutionError::TaskJoin(e.to_string())),
            }
        }

        if let Some(error) = module_error.or_else(|| other_errors.into_iter().next()) {
            ExecutionFailed {
                executor: self.name(),
                error: &error,
            }
            .log();
            return Err(error);
        }

        ExecutionCompleted {
            executor: self.name(),
            module_count,
            duration: started.elapsed(),
        }
        .log();

        Ok(())
    }

    fn name(&self) -> &'static str {
        "Reactive"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::task_graph::{SubTask, Subflow};
    use crate::errors::SplaError;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Duration;

    fn recording(log: &Arc<Mutex<Vec<&'static str>>>, name: &'static str) -> Subflow {
        let log = log.clone();
        let unit: SubTask = Box::new(move || {
            log.lock().push(name);
            Ok(())
        });
        vec![unit]
    }

    fn position(log: &[&str], name: &str) -> usize {
        log.iter().position(|n| *n == name).unwrap()
    }

    #[tokio::test]
    async fn test_executor_creation() {
        assert_eq!(ReactiveExecutor::new(4).max_concurrency(), 4);
        assert_eq!(ReactiveExecutor::new(0).max_concurrency(), 1);
        assert!(ReactiveExecutor::default().max_concurrency() >= 1);
    }

    #[tokio::test]
    async fn test_empty_graph_completes() {
        let executor = ReactiveExecutor::new(2);
        executor.run(TaskGraph::new("empty")).await.unwrap();
    }

    #[tokio::test]
    async fn test_linear_chain_runs_in_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut graph = TaskGraph::new("chain");
        let a = graph.composed_of("a", 0, recording(&log, "a"));
        let b = graph.composed_of("b", 1, recording(&log, "b"));
        let c = graph.composed_of("c", 2, recording(&log, "c"));
        graph.precede(b, c).unwrap();
        graph.precede(a, b).unwrap();

        ReactiveExecutor::new(4).run(graph).await.unwrap();

        assert_eq!(*log.lock(), vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_diamond_respects_all_edges() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut graph = TaskGraph::new("diamond");
        let a = graph.composed_of("a", 0, recording(&log, "a"));
        let b = graph.composed_of("b", 1, recording(&log, "b"));
        let c = graph.composed_of("c", 2, recording(&log, "c"));
        let d = graph.composed_of("d", 3, recording(&log, "d"));
        graph.precede(a, b).unwrap();
        graph.precede(a, c).unwrap();
        graph.precede(b, d).unwrap();
        graph.precede(c, d).unwrap();

        ReactiveExecutor::new(4).run(graph).await.unwrap();

        let log = log.lock();
        assert_eq!(log.len(), 4);
        assert_eq!(position(&log, "a"), 0);
        assert_eq!(position(&log, "d"), 3);
    }

    fn timed_units(active: &Arc<AtomicUsize>, peak: &Arc<AtomicUsize>) -> Subflow {
        let active = active.clone();
        let peak = peak.clone();
        let unit: SubTask = Box::new(move || {
            let now = active.fetch_add(1, Ordering::SeqCst) + 1;
            peak.fetch_max(now, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(50));
            active.fetch_sub(1, Ordering::SeqCst);
            Ok(())
        });
        vec![unit]
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_independent_modules_overlap() {
        let active = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let mut graph = TaskGraph::new("parallel");
        for i in 0..4 {
            graph.composed_of(format!("m{}", i), i, timed_units(&active, &peak));
        }

        ReactiveExecutor::new(4).run(graph).await.unwrap();

        assert!(peak.load(Ordering::SeqCst) >= 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrency_limit_is_respected() {
        let active = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let mut graph = TaskGraph::new("serial");
        for i in 0..3 {
            graph.composed_of(format!("m{}", i), i, timed_units(&active, &peak));
        }

        ReactiveExecutor::new(1).run(graph).await.unwrap();

        assert_eq!(peak.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failure_skips_dependents() {
        let ran = Arc::new(AtomicBool::new(false));
        let ran_clone = ran.clone();

        let failing: SubTask = Box::new(|| Err(SplaError::invalid_argument("bad operand")));
        let dependent: SubTask = Box::new(move || {
            ran_clone.store(true, Ordering::SeqCst);
            Ok(())
        });

        let mut graph = TaskGraph::new("failing");
        let a = graph.composed_of("a", 0, vec![failing]);
        let b = graph.composed_of("b", 1, vec![dependent]);
        graph.precede(a, b).unwrap();

        let result = ReactiveExecutor::new(2).run(graph).await;

        match result {
            Err(ExecutionError::NodeFailed { node, label, message }) => {
                assert_eq!(node, 0);
                assert_eq!(label, "a");
                assert_eq!(message, "Invalid argument: bad operand");
            }
            other => panic!("expected NodeFailed, got {:?}", other),
        }
        assert!(!ran.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_panicking_unit_reports_join_error() {
        let unit: SubTask = Box::new(|| -> crate::errors::SplaResult<()> { panic!("kernel exploded") });
        let mut graph = TaskGraph::new("panic");
        graph.composed_of("boom", 0, vec![unit]);

        let result = ReactiveExecutor::new(1).run(graph).await;

        assert!(matches!(result, Err(ExecutionError::TaskJoin(_))));
    }

    #[tokio::test]
    async fn test_cyclic_graph_rejected() {
        let mut graph = TaskGraph::new("loop");
        let a = graph.composed_of("a", 0, Vec::new());
        let b = graph.composed_of("b", 1, Vec::new());
        graph.precede(a, b).unwrap();
        graph.precede(b, a).unwrap();

        let result = ReactiveExecutor::new(1).run(graph).await;

        assert!(matches!(result, Err(ExecutionError::InvalidGraph { .. })));
    }
}
