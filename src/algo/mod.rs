// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Algorithm parameters, the algorithm registry and the built-in COO algorithms.
//!
//! A processor's sub-task fills an [`AlgorithmParams`] with the operand blocks it
//! reads at run time and hands it to [`AlgorithmManager::dispatch`]. The manager
//! tries the algorithms registered for the operation in registration order and runs
//! the first one whose predicate accepts the operand formats.
//!
//! Every built-in algorithm selects on "all present operand blocks are COO", runs
//! its kernel on the node's device queue and finishes that queue on every exit path.

mod assign;
mod ewise_add;
pub(crate) mod kernels;
mod manager;
mod mxm;
mod params;
mod reduce;
mod transpose;
mod vxm;

use std::sync::Arc;

pub use assign::VectorAssignCoo;
pub use ewise_add::{MatrixEWiseAddCoo, VectorEWiseAddCoo};
pub use manager::AlgorithmManager;
pub use mxm::MxMCoo;
pub use params::{
    AlgorithmParams, AlgorithmType, OpParams, ParamsMatrixEWiseAdd, ParamsMxM, ParamsTranspose,
    ParamsVectorAssign, ParamsVectorEWiseAdd, ParamsVectorReduce, ParamsVxM,
};
pub use reduce::VectorReduceCoo;
pub use transpose::TransposeCoo;
pub use vxm::VxMCoo;

use crate::errors::{SplaError, SplaResult};
use crate::storage::{self, MatrixBlock, MatrixCoo, VectorBlock, VectorCoo};

/// Register one COO algorithm per operation kind.
pub fn register_builtin(manager: &mut AlgorithmManager) {
    manager.register(Arc::new(MatrixEWiseAddCoo));
    manager.register(Arc::new(VectorEWiseAddCoo));
    manager.register(Arc::new(MxMCoo));
    manager.register(Arc::new(VxMCoo));
    manager.register(Arc::new(VectorAssignCoo));
    manager.register(Arc::new(TransposeCoo));
    manager.register(Arc::new(VectorReduceCoo));
}

/// True if every present operand block is stored as COO.
pub(crate) fn operands_are_coo(params: &AlgorithmParams) -> bool {
    params
        .vector_blocks()
        .into_iter()
        .all(storage::is_vector::<VectorCoo>)
        && params
            .matrix_blocks()
            .into_iter()
            .all(storage::is_matrix::<MatrixCoo>)
}

pub(crate) fn vector_coo(block: &Option<Arc<dyn VectorBlock>>) -> SplaResult<Option<Arc<VectorCoo>>> {
    match block {
        None => Ok(None),
        Some(block) => storage::downcast_vector::<VectorCoo>(block)
            .map(Some)
            .ok_or_else(|| {
                SplaError::invalid_argument(format!(
                    "Expected COO vector block, found {}",
                    block.format()
                ))
            }),
    }
}

pub(crate) fn matrix_coo(block: &Option<Arc<dyn MatrixBlock>>) -> SplaResult<Option<Arc<MatrixCoo>>> {
    match block {
        None => Ok(None),
        Some(block) => storage::downcast_matrix::<MatrixCoo>(block)
            .map(Some)
            .ok_or_else(|| {
                SplaError::invalid_argument(format!(
                    "Expected COO matrix block, found {}",
                    block.format()
                ))
            }),
    }
}

/// How an optional mask restricts an output.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum MaskPlan<K> {
    /// Keep every computed entry.
    Unmasked,
    /// A mask is required but absent: the output is empty.
    Empty,
    /// Keep entries whose key is in `keys`, or absent from it when `complement`.
    Filter { keys: Vec<K>, complement: bool },
}

impl<K: Ord + Copy> MaskPlan<K> {
    fn new(has_mask: bool, keys: Option<Vec<K>>, complement: bool) -> Self {
        match (has_mask, keys) {
            (false, _) => MaskPlan::Unmasked,
            (true, Some(keys)) => MaskPlan::Filter { keys, complement },
            // Complement of an absent mask selects everything
            (true, None) if complement => MaskPlan::Unmasked,
            (true, None) => MaskPlan::Empty,
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        matches!(self, MaskPlan::Empty)
    }

    pub(crate) fn apply(&self, keys: Vec<K>, vals: Vec<u8>, byte_size: usize) -> (Vec<K>, Vec<u8>) {
        match self {
            MaskPlan::Unmasked => (keys, vals),
            MaskPlan::Empty => (Vec::new(), Vec::new()),
            MaskPlan::Filter {
                keys: mask,
                complement,
            } => kernels::apply_mask(&keys, &vals, byte_size, mask, *complement),
        }
    }
}

pub(crate) fn vector_mask_plan(
    has_mask: bool,
    mask: Option<&VectorCoo>,
    complement: bool,
) -> MaskPlan<u32> {
    MaskPlan::new(has_mask, mask.map(|m| m.rows().to_vec()), complement)
}

pub(crate) fn matrix_mask_plan(
    has_mask: bool,
    mask: Option<&MatrixCoo>,
    complement: bool,
) -> MaskPlan<u64> {
    let keys = mask.map(|m| {
        m.rows()
            .iter()
            .zip(m.cols())
            .map(|(&i, &j)| kernels::pack(i, j))
            .collect()
    });
    MaskPlan::new(has_mask, keys, complement)
}

/// Split packed matrix keys back into row and column arrays.
pub(crate) fn unpack_keys(keys: &[u64]) -> (Vec<u32>, Vec<u32>) {
    keys.iter().map(|&key| kernels::unpack(key)).unzip()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_plan_cases() {
        let mask = VectorCoo::from_indices(4, vec![1, 3]).unwrap();
        let test_cases = vec![
            (false, None, false, MaskPlan::Unmasked),
            (true, None, false, MaskPlan::Empty),
            (true, None, true, MaskPlan::Unmasked),
            (
                true,
                Some(&mask),
                true,
                MaskPlan::Filter {
                    keys: vec![1, 3],
                    complement: true,
                },
            ),
        ];

        for (has_mask, mask, complement, expected) in test_cases {
            assert_eq!(vector_mask_plan(has_mask, mask, complement), expected);
        }
    }

    #[test]
    fn test_matrix_mask_keys_are_packed() {
        let mask = MatrixCoo::from_typed(2, 2, &[(0u32, 1u32, 1i32), (1, 0, 1)]).unwrap();
        match matrix_mask_plan(true, Some(&mask), false) {
            MaskPlan::Filter { keys, .. } => assert_eq!(unpack_keys(&keys), (vec![0, 1], vec![1, 0])),
            other => panic!("unexpected plan {:?}", other),
        }
    }
}
