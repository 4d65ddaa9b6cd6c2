// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod consts;
mod loader;
pub mod pipeline;

pub use loader::{
    load_config, parse_config, ConfigFormat, DeviceOptions, ExecutorOptions, LibraryConfig,
};
pub use pipeline::{BuiltExpression, ExpressionFile, NodeSpec, Object, ObjectSpec};
