// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::errors::SplaResult;
use crate::expression::{ExpressionContext, Operation};

/// Handler bound to one operation kind.
///
/// Processors are registered with the
/// [`ExpressionManager`](crate::expression::ExpressionManager) in priority order.
/// For each node the first processor of the node's operation whose
/// [`select`](Self::select) returns true is asked to [`process`](Self::process) it.
pub trait NodeProcessor: Send + Sync {
    /// Operation kind this processor handles.
    fn operation_type(&self) -> Operation;

    /// Diagnostic name.
    fn name(&self) -> &'static str;

    /// Whether this processor can handle node `idx`.
    fn select(&self, _idx: usize, _context: &ExpressionContext) -> bool {
        true
    }

    /// Validate node `idx` and store its sub-flow in the context.
    ///
    /// Called during graph construction, before anything runs. Errors returned here
    /// fail the whole submission.
    fn process(&self, idx: usize, context: &mut ExpressionContext) -> SplaResult<()>;
}
