// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for task graph execution and device queues.

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// Library constructed and ready for submissions.
///
/// # Log Level
/// `info!` - Important operational event
pub struct LibraryInitialized {
    pub devices: usize,
    pub max_concurrency: usize,
    pub processors: usize,
    pub algorithms: usize,
}

impl Display for LibraryInitialized {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Library initialized: {} devices, {} processors, {} algorithms, max_concurrency={}",
            self.devices, self.processors, self.algorithms, self.max_concurrency
        )
    }
}

impl StructuredLog for LibraryInitialized {
    fn log(&self) {
        tracing::info!(
            devices = self.devices,
            max_concurrency = self.max_concurrency,
            processors = self.processors,
            algorithms = self.algorithms,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!("library", span_name = name, devices = self.devices)
    }
}

/// Task graph handed to the executor.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use spla_flow::observability::messages::engine::ExecutionStarted;
///
/// let msg = ExecutionStarted {
///     executor: "Reactive",
///     module_count: 5,
///     max_concurrency: 4,
/// };
///
/// tracing::info!("{}", msg);
/// ```
pub struct ExecutionStarted<'a> {
    pub executor: &'a str,
    pub module_count: usize,
    pub max_concurrency: usize,
}

impl Display for ExecutionStarted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Running task graph with {} executor: {} modules, max_concurrency={}",
            self.executor, self.module_count, self.max_concurrency
        )
    }
}

impl StructuredLog for ExecutionStarted<'_> {
    fn log(&self) {
        tracing::info!(
            executor = self.executor,
            module_count = self.module_count,
            max_concurrency = self.max_concurrency,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "execution",
            span_name = name,
            executor = self.executor,
            module_count = self.module_count,
            max_concurrency = self.max_concurrency,
        )
    }
}

/// Every module finished.
///
/// # Log Level
/// `info!` - Important operational event
pub struct ExecutionCompleted<'a> {
    pub executor: &'a str,
    pub module_count: usize,
    pub duration: std::time::Duration,
}

impl Display for ExecutionCompleted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Task graph completed with {} executor: {} modules in {:?}",
            self.executor, self.module_count, self.duration
        )
    }
}

impl StructuredLog for ExecutionCompleted<'_> {
    fn log(&self) {
        tracing::info!(
            executor = self.executor,
            module_count = self.module_count,
            duration_ms = self.duration.as_millis() as u64,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "execution_completed",
            span_name = name,
            executor = self.executor,
            module_count = self.module_count,
            duration = ?self.duration,
        )
    }
}

/// Execution failed with error.
///
/// # Log Level
/// `error!` - Failure requiring attention
pub struct ExecutionFailed<'a> {
    pub executor: &'a str,
    pub error: &'a dyn std::error::Error,
}

impl Display for ExecutionFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Task graph failed with {} executor: {}",
            self.executor, self.error
        )
    }
}

impl StructuredLog for ExecutionFailed<'_> {
    fn log(&self) {
        tracing::error!(
            executor = self.executor,
            error = %self.error,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "execution_failed",
            span_name = name,
            executor = self.executor,
            error = %self.error,
        )
    }
}

/// A module finished running all of its units.
///
/// # Log Level
/// `trace!` - Per-module detail
pub struct ModuleCompleted<'a> {
    pub module: &'a str,
    pub units: usize,
    pub successors: usize,
}

impl Display for ModuleCompleted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Module '{}' completed {} units, releasing {} successors",
            self.module, self.units, self.successors
        )
    }
}

impl StructuredLog for ModuleCompleted<'_> {
    fn log(&self) {
        tracing::trace!(
            module = self.module,
            units = self.units,
            successors = self.successors,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::trace_span!(
            "module",
            span_name = name,
            module = self.module,
            units = self.units,
        )
    }
}

/// A device queue was forced to completion.
///
/// # Log Level
/// `trace!` when the finish succeeded, `warn!` when the device was lost
pub struct QueueFinished<'a> {
    pub device: &'a str,
    pub submitted: u64,
    pub completed: u64,
    pub ok: bool,
}

impl Display for QueueFinished<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        if self.ok {
            write!(
                f,
                "Queue on {} finished ({} of {} commands completed)",
                self.device, self.completed, self.submitted
            )
        } else {
            write!(f, "Queue on {} could not be finished: device lost", self.device)
        }
    }
}

impl StructuredLog for QueueFinished<'_> {
    fn log(&self) {
        if self.ok {
            tracing::trace!(
                device = self.device,
                submitted = self.submitted,
                completed = self.completed,
                "{}", self
            );
        } else {
            tracing::warn!(device = self.device, "{}", self);
        }
    }

    fn span(&self, name: &str) -> Span {
        tracing::trace_span!(
            "queue_finished",
            span_name = name,
            device = self.device,
        )
    }
}

/// A device command panicked. The worker keeps serving its queue.
///
/// # Log Level
/// `warn!`
pub struct CommandPanicked<'a> {
    pub device: &'a str,
    pub message: &'a str,
}

impl Display for CommandPanicked<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Command on {} panicked: {}", self.device, self.message)
    }
}

impl StructuredLog for CommandPanicked<'_> {
    fn log(&self) {
        tracing::warn!(device = self.device, panic = self.message, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "command_panicked",
            span_name = name,
            device = self.device,
        )
    }
}
