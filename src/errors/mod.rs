// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod config;
mod execution;
mod spla;

pub use config::ConfigError;
pub use execution::ExecutionError;
pub use spla::{SplaError, SplaResult};
