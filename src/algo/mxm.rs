// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::Arc;

use crate::algo::kernels;
use crate::algo::{
    matrix_coo, matrix_mask_plan, operands_are_coo, unpack_keys, AlgorithmParams, AlgorithmType,
    MaskPlan,
};
use crate::device::{DeviceManager, QueueFinisher};
use crate::errors::{SplaError, SplaResult};
use crate::storage::{MatrixBlock, MatrixCoo};
use crate::traits::Algorithm;
use crate::types::{DescriptorParam, FunctionBinary};

/// Matrix-matrix multiply over COO blocks.
///
/// Same segmented expansion as [`VxMCoo`](crate::algo::VxMCoo), with every row of
/// `a` acting as one vector operand. Products are keyed by `(row, col)`.
pub struct MxMCoo;

impl Algorithm for MxMCoo {
    fn algorithm_type(&self) -> AlgorithmType {
        AlgorithmType::MxM
    }

    fn name(&self) -> &'static str {
        "MxMCOO"
    }

    fn select(&self, params: &AlgorithmParams) -> bool {
        operands_are_coo(params)
    }

    fn process(&self, params: &mut AlgorithmParams, devices: &DeviceManager) -> SplaResult<()> {
        let complement = params.desc.is_param_set(DescriptorParam::MaskComplement);
        let queue = devices.queue(params.device_id)?;
        let _finisher = QueueFinisher::new(&queue);

        let p = params.mxm_mut()?;
        let (nrows, ncols) = (p.nrows, p.ncols);
        let tw_size = p.tw.byte_size();

        let mask = matrix_mask_plan(p.has_mask, matrix_coo(&p.mask)?.as_deref(), complement);
        if mask.is_empty() {
            p.w = Some(Arc::new(MatrixCoo::empty(nrows, ncols, tw_size)));
            return Ok(());
        }

        let (a, b) = match (matrix_coo(&p.a)?, matrix_coo(&p.b)?) {
            (Some(a), Some(b)) if !a.rows().is_empty() && !b.rows().is_empty() => (a, b),
            _ => {
                p.w = Some(Arc::new(MatrixCoo::empty(nrows, ncols, tw_size)));
                return Ok(());
            }
        };

        if tw_size > 0 && (a.byte_size() != p.ta.byte_size() || b.byte_size() != p.tb.byte_size()) {
            return Err(SplaError::invalid_argument(format!(
                "MxM operands must carry '{}' and '{}' values",
                p.ta, p.tb
            )));
        }

        let mult = p.mult.clone();
        let add = p.add.clone();
        let result = queue.run(move || {
            multiply(&a, &b, &mult, &add, tw_size, (nrows, ncols), &mask)
        })?;
        p.w = Some(Arc::new(result));
        Ok(())
    }
}

fn multiply(
    a: &MatrixCoo,
    b: &MatrixCoo,
    mult: &FunctionBinary,
    add: &FunctionBinary,
    tw_size: usize,
    shape: (usize, usize),
    mask: &MaskPlan<u64>,
) -> MatrixCoo {
    let b_offsets = kernels::row_offsets(b.rows(), b.nrows());

    // Column of a entry k selects row a.cols[k] of b
    let pairs = kernels::expand_products(a.cols(), &b_offsets);

    let keys: Vec<u64> = pairs
        .iter()
        .map(|&(k, j)| kernels::pack(a.rows()[k], b.cols()[j]))
        .collect();

    let (keys, vals) = if tw_size > 0 {
        let mut products = vec![0u8; pairs.len() * tw_size];
        for (product, &(k, j)) in products.chunks_exact_mut(tw_size).zip(&pairs) {
            mult.apply(a.value(k), b.value(j), product);
        }
        let (keys, vals) = kernels::sort_by_key(&keys, &products, tw_size);
        kernels::reduce_by_key(&keys, &vals, tw_size, add)
    } else {
        let (keys, _) = kernels::sort_by_key(&keys, &[], 0);
        kernels::dedup_last(&keys, &[], 0)
    };

    let (keys, vals) = mask.apply(keys, vals, tw_size);
    let (rows, cols) = unpack_keys(&keys);
    MatrixCoo::from_parts(shape.0, shape.1, tw_size, rows, cols, vals)
}
