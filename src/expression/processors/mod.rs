// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Built-in node processors, one per operation.
//!
//! Every processor validates its node's operands while the graph is being built
//! and emits a single-unit sub-flow. The unit reads the operand blocks when it
//! runs, so it sees whatever its predecessors published.

mod assign;
mod data_write;
mod ewise_add;
mod mxm;
mod reduce;
mod transpose;
mod vxm;

use std::sync::Arc;

pub use assign::VectorAssignProcessor;
pub use data_write::{MatrixDataWriteProcessor, VectorDataWriteProcessor};
pub use ewise_add::{MatrixEWiseAddProcessor, VectorEWiseAddProcessor};
pub use mxm::MxMProcessor;
pub use reduce::VectorReduceProcessor;
pub use transpose::MatrixTransposeProcessor;
pub use vxm::VxMProcessor;

use crate::algo::AlgorithmType;
use crate::engine::{SubTask, Subflow};
use crate::errors::{SplaError, SplaResult};
use crate::expression::context::ExpressionContext;
use crate::expression::manager::ExpressionManager;
use crate::expression::node::ExpressionNode;
use crate::storage::{Matrix, MatrixBlock, MatrixCoo, Vector, VectorBlock, VectorCoo};
use crate::types::{FunctionBinary, Type};

/// Register the built-in processors. Order defines priority.
pub fn register_builtin(manager: &mut ExpressionManager) {
    manager.register(Arc::new(MatrixDataWriteProcessor));
    manager.register(Arc::new(VectorDataWriteProcessor));
    manager.register(Arc::new(MatrixEWiseAddProcessor));
    manager.register(Arc::new(VectorEWiseAddProcessor));
    manager.register(Arc::new(MxMProcessor));
    manager.register(Arc::new(VxMProcessor));
    manager.register(Arc::new(VectorAssignProcessor));
    manager.register(Arc::new(MatrixTransposeProcessor));
    manager.register(Arc::new(VectorReduceProcessor));
}

pub(crate) fn single_unit(unit: impl FnOnce() -> SplaResult<()> + Send + 'static) -> Subflow {
    let unit: SubTask = Box::new(unit);
    vec![unit]
}

pub(crate) fn unexpected_args(processor: &str, node: &ExpressionNode) -> SplaError {
    SplaError::invalid_state(format!(
        "Processor {} cannot handle node {} op={}",
        processor,
        node.idx(),
        node.operation()
    ))
}

/// Fail with `InvalidArgument` unless `ok`.
pub(crate) fn ensure(ok: bool, node: usize, message: impl FnOnce() -> String) -> SplaResult<()> {
    if ok {
        Ok(())
    } else {
        Err(SplaError::invalid_argument(format!("Node {}: {}", node, message())))
    }
}

/// Fail with `InvalidState` unless some algorithm is registered for `ty`.
///
/// Which candidate runs is decided when the unit runs, once the operand blocks
/// exist.
pub(crate) fn ensure_algorithms(context: &ExpressionContext, ty: AlgorithmType) -> SplaResult<()> {
    if context.algorithms().candidate_count(ty) == 0 {
        return Err(SplaError::invalid_state(format!("No algorithms for such op={}", ty)));
    }
    Ok(())
}

/// Check that `f` maps `(ta, tb)` to `tw`.
pub(crate) fn ensure_function(
    node: usize,
    f: &FunctionBinary,
    ta: &Type,
    tb: &Type,
    tw: &Type,
) -> SplaResult<()> {
    ensure(f.ta() == ta && f.tb() == tb && f.tw() == tw, node, || {
        format!(
            "function '{}' is ({}, {}) -> {} but operands are ({}, {}) -> {}",
            f.name(),
            f.ta(),
            f.tb(),
            f.tw(),
            ta,
            tb,
            tw
        )
    })
}

pub(crate) fn ensure_same_type(node: usize, expected: &Type, actual: &Type, role: &str) -> SplaResult<()> {
    ensure(expected == actual, node, || {
        format!("{} has type '{}', expected '{}'", role, actual, expected)
    })
}

pub(crate) fn ensure_vector_mask(node: usize, mask: Option<&Vector>, size: usize) -> SplaResult<()> {
    match mask {
        Some(mask) => ensure(mask.nrows() == size, node, || {
            format!("mask of size {} does not match output of size {}", mask.nrows(), size)
        }),
        None => Ok(()),
    }
}

pub(crate) fn ensure_matrix_mask(node: usize, mask: Option<&Matrix>, shape: (usize, usize)) -> SplaResult<()> {
    match mask {
        Some(mask) => ensure((mask.nrows(), mask.ncols()) == shape, node, || {
            format!(
                "mask of shape {}x{} does not match output of shape {}x{}",
                mask.nrows(),
                mask.ncols(),
                shape.0,
                shape.1
            )
        }),
        None => Ok(()),
    }
}

/// Store an algorithm's output in `w`; a missing block publishes an empty one.
pub(crate) fn publish_vector(w: &Vector, block: Option<Arc<dyn VectorBlock>>) {
    let block =
        block.unwrap_or_else(|| Arc::new(VectorCoo::empty(w.nrows(), w.ty().byte_size())));
    w.set_block(Some(block));
}

pub(crate) fn publish_matrix(w: &Matrix, block: Option<Arc<dyn MatrixBlock>>) {
    let block = block.unwrap_or_else(|| {
        Arc::new(MatrixCoo::empty(w.nrows(), w.ncols(), w.ty().byte_size()))
    });
    w.set_block(Some(block));
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use crate::algo::AlgorithmManager;
    use crate::device::DeviceManager;
    use crate::engine::{ReactiveExecutor, TaskExecutor};
    use crate::errors::SplaResult;
    use crate::expression::{Expression, ExpressionContext, ExpressionManager};

    /// Build and run `expression` with the built-in registries.
    pub(crate) fn evaluate(expression: &Expression) -> SplaResult<()> {
        let devices = Arc::new(DeviceManager::new(2, "proc")?);
        let algorithms = Arc::new(AlgorithmManager::with_builtin());
        let graph = ExpressionManager::with_builtin().prepare(expression, devices, algorithms)?;

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()
            .expect("runtime");
        runtime.block_on(ReactiveExecutor::new(2).run(graph))?;
        Ok(())
    }

    /// Context for calling a processor's `process` directly.
    pub(crate) fn context(expression: &Expression) -> ExpressionContext<'_> {
        ExpressionContext::new(
            expression,
            Arc::new(DeviceManager::new(1, "proc").expect("devices")),
            Arc::new(AlgorithmManager::with_builtin()),
        )
    }
}
