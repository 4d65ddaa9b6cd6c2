// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::Arc;

use crate::algo::kernels;
use crate::algo::{
    matrix_coo, matrix_mask_plan, operands_are_coo, unpack_keys, vector_coo, vector_mask_plan,
    AlgorithmParams, AlgorithmType,
};
use crate::device::{DeviceManager, QueueFinisher};
use crate::errors::SplaResult;
use crate::storage::{MatrixCoo, VectorCoo};
use crate::traits::Algorithm;
use crate::types::DescriptorParam;

/// Element-wise vector addition over COO blocks.
///
/// The result holds the union of both operands' positions. Positions stored in both
/// are combined with `op(a, b)`. A missing operand counts as empty.
pub struct VectorEWiseAddCoo;

impl Algorithm for VectorEWiseAddCoo {
    fn algorithm_type(&self) -> AlgorithmType {
        AlgorithmType::VectorEWiseAdd
    }

    fn name(&self) -> &'static str {
        "VectorEWiseAddCOO"
    }

    fn select(&self, params: &AlgorithmParams) -> bool {
        operands_are_coo(params)
    }

    fn process(&self, params: &mut AlgorithmParams, devices: &DeviceManager) -> SplaResult<()> {
        let complement = params.desc.is_param_set(DescriptorParam::MaskComplement);
        let queue = devices.queue(params.device_id)?;
        let _finisher = QueueFinisher::new(&queue);

        let p = params.vector_ewise_add_mut()?;
        let nrows = p.nrows;
        let byte_size = p.ty.byte_size();

        let mask = vector_mask_plan(p.has_mask, vector_coo(&p.mask)?.as_deref(), complement);
        let a = vector_coo(&p.a)?;
        let b = vector_coo(&p.b)?;
        let nothing = a.as_ref().map_or(true, |a| a.rows().is_empty())
            && b.as_ref().map_or(true, |b| b.rows().is_empty());

        if mask.is_empty() || nothing {
            p.w = Some(Arc::new(VectorCoo::empty(nrows, byte_size)));
            return Ok(());
        }

        let op = p.op.clone();
        let result = queue.run(move || {
            let a = a.unwrap_or_else(|| Arc::new(VectorCoo::empty(nrows, byte_size)));
            let b = b.unwrap_or_else(|| Arc::new(VectorCoo::empty(nrows, byte_size)));
            let (keys, vals) = kernels::merge_union(
                (a.rows(), a.vals()),
                (b.rows(), b.vals()),
                byte_size,
                &op,
            );
            let (keys, vals) = mask.apply(keys, vals, byte_size);
            VectorCoo::from_parts(nrows, byte_size, keys, vals)
        })?;

        p.w = Some(Arc::new(result));
        Ok(())
    }
}

/// Element-wise matrix addition over COO blocks.
///
/// Same union semantics as [`VectorEWiseAddCoo`], keyed by `(row, col)`.
pub struct MatrixEWiseAddCoo;

impl Algorithm for MatrixEWiseAddCoo {
    fn algorithm_type(&self) -> AlgorithmType {
        AlgorithmType::MatrixEWiseAdd
    }

    fn name(&self) -> &'static str {
        "MatrixEWiseAddCOO"
    }

    fn select(&self, params: &AlgorithmParams) -> bool {
        operands_are_coo(params)
    }

    fn process(&self, params: &mut AlgorithmParams, devices: &DeviceManager) -> SplaResult<()> {
        let complement = params.desc.is_param_set(DescriptorParam::MaskComplement);
        let queue = devices.queue(params.device_id)?;
        let _finisher = QueueFinisher::new(&queue);

        let p = params.matrix_ewise_add_mut()?;
        let (nrows, ncols) = (p.nrows, p.ncols);
        let byte_size = p.ty.byte_size();

        let mask = matrix_mask_plan(p.has_mask, matrix_coo(&p.mask)?.as_deref(), complement);
        let a = matrix_coo(&p.a)?;
        let b = matrix_coo(&p.b)?;
        let nothing = a.as_ref().map_or(true, |a| a.rows().is_empty())
            && b.as_ref().map_or(true, |b| b.rows().is_empty());

        if mask.is_empty() || nothing {
            p.w = Some(Arc::new(MatrixCoo::empty(nrows, ncols, byte_size)));
            return Ok(());
        }

        let op = p.op.clone();
        let result = queue.run(move || {
            let keys_of = |m: &Option<Arc<MatrixCoo>>| -> (Vec<u64>, Vec<u8>) {
                match m {
                    Some(m) => (
                        m.rows()
                            .iter()
                            .zip(m.cols())
                            .map(|(&i, &j)| kernels::pack(i, j))
                            .collect(),
                        m.vals().to_vec(),
                    ),
                    None => (Vec::new(), Vec::new()),
                }
            };
            let (a_keys, a_vals) = keys_of(&a);
            let (b_keys, b_vals) = keys_of(&b);

            let (keys, vals) = kernels::merge_union(
                (a_keys.as_slice(), a_vals.as_slice()),
                (b_keys.as_slice(), b_vals.as_slice()),
                byte_size,
                &op,
            );
            let (keys, vals) = mask.apply(keys, vals, byte_size);
            let (rows, cols) = unpack_keys(&keys);
            MatrixCoo::from_parts(nrows, ncols, byte_size, rows, cols, vals)
        })?;

        p.w = Some(Arc::new(result));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algo::{OpParams, ParamsMatrixEWiseAdd, ParamsVectorEWiseAdd};
    use crate::device::DeviceId;
    use crate::storage::{MatrixBlock, VectorBlock};
    use crate::types::{Descriptor, FunctionBinary, Type};

    fn vector_params(
        a: Option<VectorCoo>,
        b: Option<VectorCoo>,
        has_mask: bool,
        mask: Option<VectorCoo>,
    ) -> AlgorithmParams {
        let ty = Type::of::<i64>();
        AlgorithmParams::new(
            Descriptor::new(),
            DeviceId(0),
            OpParams::VectorEWiseAdd(ParamsVectorEWiseAdd {
                has_mask,
                w: None,
                mask: mask.map(|m| Arc::new(m) as Arc<dyn VectorBlock>),
                op: FunctionBinary::builtin("plus", &ty).unwrap(),
                a: a.map(|v| Arc::new(v) as Arc<dyn VectorBlock>),
                b: b.map(|v| Arc::new(v) as Arc<dyn VectorBlock>),
                nrows: 5,
                ty,
            }),
        )
    }

    fn run_vector(mut params: AlgorithmParams) -> Vec<(u32, i64)> {
        let devices = DeviceManager::new(1, "eadd").unwrap();
        VectorEWiseAddCoo.process(&mut params, &devices).unwrap();
        let w = params.vector_ewise_add().unwrap().w.clone().unwrap();
        crate::storage::downcast_vector::<VectorCoo>(&w)
            .unwrap()
            .to_typed::<i64>()
    }

    fn a() -> VectorCoo {
        VectorCoo::from_typed(5, &[(0u32, 1i64), (2, 2)]).unwrap()
    }

    fn b() -> VectorCoo {
        VectorCoo::from_typed(5, &[(2u32, 10i64), (4, 20)]).unwrap()
    }

    #[test]
    fn test_vector_union() {
        let result = run_vector(vector_params(Some(a()), Some(b()), false, None));
        assert_eq!(result, vec![(0, 1), (2, 12), (4, 20)]);
    }

    #[test]
    fn test_vector_missing_operand_copies_other() {
        let result = run_vector(vector_params(Some(a()), None, false, None));
        assert_eq!(result, vec![(0, 1), (2, 2)]);
    }

    #[test]
    fn test_vector_mask() {
        let mask = VectorCoo::from_indices(5, vec![2, 3]).unwrap();
        let result = run_vector(vector_params(Some(a()), Some(b()), true, Some(mask)));
        assert_eq!(result, vec![(2, 12)]);

        let result = run_vector(vector_params(Some(a()), Some(b()), true, None));
        assert!(result.is_empty());
    }

    #[test]
    fn test_matrix_union() {
        let ty = Type::of::<f64>();
        let a = MatrixCoo::from_typed(2, 2, &[(0u32, 0u32, 1.5f64), (1, 1, 2.0)]).unwrap();
        let b = MatrixCoo::from_typed(2, 2, &[(0u32, 1u32, 4.0f64), (1, 1, 0.5)]).unwrap();
        let mut params = AlgorithmParams::new(
            Descriptor::new(),
            DeviceId(0),
            OpParams::MatrixEWiseAdd(ParamsMatrixEWiseAdd {
                has_mask: false,
                w: None,
                mask: None,
                op: FunctionBinary::builtin("max", &ty).unwrap(),
                a: Some(Arc::new(a) as Arc<dyn MatrixBlock>),
                b: Some(Arc::new(b) as Arc<dyn MatrixBlock>),
                nrows: 2,
                ncols: 2,
                ty,
            }),
        );

        let devices = DeviceManager::new(1, "eadd").unwrap();
        assert!(MatrixEWiseAddCoo.select(&params));
        MatrixEWiseAddCoo.process(&mut params, &devices).unwrap();

        let w = params.matrix_ewise_add().unwrap().w.clone().unwrap();
        let w = crate::storage::downcast_matrix::<MatrixCoo>(&w).unwrap();
        assert_eq!(w.to_typed::<f64>(), vec![(0, 0, 1.5), (0, 1, 4.0), (1, 1, 2.0)]);
    }
}
