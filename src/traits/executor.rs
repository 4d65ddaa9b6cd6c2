// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;

use crate::engine::TaskGraph;
use crate::errors::ExecutionError;

/// Runs a composed task graph to completion.
///
/// Implementations must never start a module before every module preceding it
/// has finished. Unrelated modules may run in any order or in parallel.
#[async_trait]
pub trait TaskExecutor: Send + Sync {
    /// Run every module of `graph`.
    ///
    /// Returns the first module failure, if any. Once a module fails, modules that
    /// have not started are not started.
    async fn run(&self, graph: TaskGraph) -> Result<(), ExecutionError>;

    fn name(&self) -> &'static str;
}
