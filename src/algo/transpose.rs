// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::Arc;

use crate::algo::kernels;
use crate::algo::{
    matrix_coo, matrix_mask_plan, operands_are_coo, unpack_keys, AlgorithmParams, AlgorithmType,
};
use crate::device::{DeviceManager, QueueFinisher};
use crate::errors::SplaResult;
use crate::storage::MatrixCoo;
use crate::traits::Algorithm;
use crate::types::DescriptorParam;

/// Transpose over COO blocks. The mask filters the transposed result.
pub struct TransposeCoo;

impl Algorithm for TransposeCoo {
    fn algorithm_type(&self) -> AlgorithmType {
        AlgorithmType::Transpose
    }

    fn name(&self) -> &'static str {
        "TransposeCOO"
    }

    fn select(&self, params: &AlgorithmParams) -> bool {
        operands_are_coo(params)
    }

    fn process(&self, params: &mut AlgorithmParams, devices: &DeviceManager) -> SplaResult<()> {
        let complement = params.desc.is_param_set(DescriptorParam::MaskComplement);
        let queue = devices.queue(params.device_id)?;
        let _finisher = QueueFinisher::new(&queue);

        let p = params.transpose_mut()?;
        // Output shape is the input shape swapped
        let (out_rows, out_cols) = (p.ncols, p.nrows);
        let byte_size = p.ty.byte_size();

        let mask = matrix_mask_plan(p.has_mask, matrix_coo(&p.mask)?.as_deref(), complement);
        let a = match matrix_coo(&p.a)? {
            Some(a) if !mask.is_empty() && !a.rows().is_empty() => a,
            _ => {
                p.w = Some(Arc::new(MatrixCoo::empty(out_rows, out_cols, byte_size)));
                return Ok(());
            }
        };

        let result = queue.run(move || {
            let keys: Vec<u64> = a
                .rows()
                .iter()
                .zip(a.cols())
                .map(|(&i, &j)| kernels::pack(j, i))
                .collect();
            let (keys, vals) = kernels::sort_by_key(&keys, a.vals(), a.byte_size());
            let (keys, vals) = mask.apply(keys, vals, a.byte_size());
            let (rows, cols) = unpack_keys(&keys);
            MatrixCoo::from_parts(out_rows, out_cols, a.byte_size(), rows, cols, vals)
        })?;

        p.w = Some(Arc::new(result));
        Ok(())
    }
}
