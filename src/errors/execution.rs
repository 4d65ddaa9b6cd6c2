// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use thiserror::Error;

/// Errors that can occur while a composed task graph is running.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExecutionError {
    /// A node's sub-task returned an error.
    #[error("Node {node} ('{label}') failed: {message}")]
    NodeFailed {
        node: usize,
        label: String,
        message: String,
    },

    /// A spawned unit panicked or was aborted by the runtime.
    #[error("Task join error: {0}")]
    TaskJoin(String),

    /// A module was cancelled because another module failed first.
    #[error("Module '{module}' cancelled due to failure in another module")]
    Cancelled { module: String },

    /// The graph handed to the executor cannot complete (it contains a cycle).
    #[error("Invalid task graph '{label}': {message}")]
    InvalidGraph { label: String, message: String },

    /// A command panicked on a device. The device itself keeps running.
    #[error("Command on device {device} panicked: {message}")]
    DevicePanic { device: usize, message: String },

    /// A device worker stopped accepting commands.
    #[error("Device {device} is no longer accepting commands")]
    DeviceLost { device: usize },
}
