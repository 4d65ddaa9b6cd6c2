// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod reactive;
pub mod task_graph;

pub use reactive::ReactiveExecutor;
pub use task_graph::{Module, ModuleId, SubTask, Subflow, TaskGraph};
pub use crate::traits::TaskExecutor;
