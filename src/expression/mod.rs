// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod context;
#[allow(clippy::module_inception)]
pub mod expression;
pub mod manager;
pub mod node;
pub mod processors;
pub mod traversal;
pub mod validation;

pub use context::ExpressionContext;
pub use expression::{Expression, ExpressionState};
pub use manager::ExpressionManager;
pub use node::{ExpressionNode, NodeArgs, Operation};
