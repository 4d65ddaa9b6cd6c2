// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::Arc;

use crate::algo::kernels;
use crate::algo::{
    matrix_coo, operands_are_coo, vector_coo, vector_mask_plan, AlgorithmParams, AlgorithmType,
    MaskPlan,
};
use crate::device::{DeviceManager, QueueFinisher};
use crate::errors::{SplaError, SplaResult};
use crate::storage::{MatrixBlock, MatrixCoo, VectorCoo};
use crate::traits::Algorithm;
use crate::types::{DescriptorParam, FunctionBinary};

/// Vector-matrix multiply over COO blocks.
///
/// Every stored entry `a[i]` is multiplied with each entry of row `i` of `b`. The
/// products are sorted by column and folded with `add`, then the mask is applied.
pub struct VxMCoo;

impl Algorithm for VxMCoo {
    fn algorithm_type(&self) -> AlgorithmType {
        AlgorithmType::VxM
    }

    fn name(&self) -> &'static str {
        "VxMCOO"
    }

    fn select(&self, params: &AlgorithmParams) -> bool {
        operands_are_coo(params)
    }

    fn process(&self, params: &mut AlgorithmParams, devices: &DeviceManager) -> SplaResult<()> {
        let complement = params.desc.is_param_set(DescriptorParam::MaskComplement);
        let queue = devices.queue(params.device_id)?;
        let _finisher = QueueFinisher::new(&queue);

        let p = params.vxm_mut()?;
        let ncols = p.ncols;
        let tw_size = p.tw.byte_size();

        let mask = vector_mask_plan(p.has_mask, vector_coo(&p.mask)?.as_deref(), complement);
        if mask.is_empty() {
            p.w = Some(Arc::new(VectorCoo::empty(ncols, tw_size)));
            return Ok(());
        }

        let (a, b) = match (vector_coo(&p.a)?, matrix_coo(&p.b)?) {
            (Some(a), Some(b)) if !a.rows().is_empty() && !b.rows().is_empty() => (a, b),
            _ => {
                p.w = Some(Arc::new(VectorCoo::empty(ncols, tw_size)));
                return Ok(());
            }
        };

        if tw_size > 0 && (a.byte_size() != p.ta.byte_size() || b.byte_size() != p.tb.byte_size()) {
            return Err(SplaError::invalid_argument(format!(
                "VxM operands must carry '{}' and '{}' values",
                p.ta, p.tb
            )));
        }

        let mult = p.mult.clone();
        let add = p.add.clone();
        let result = queue.run(move || multiply(&a, &b, &mult, &add, tw_size, ncols, &mask))?;
        p.w = Some(Arc::new(result));
        Ok(())
    }
}

fn multiply(
    a: &VectorCoo,
    b: &MatrixCoo,
    mult: &FunctionBinary,
    add: &FunctionBinary,
    tw_size: usize,
    ncols: usize,
    mask: &MaskPlan<u32>,
) -> VectorCoo {
    // Entries per matrix row
    let b_offsets = kernels::row_offsets(b.rows(), b.nrows());

    // (vector entry, matrix entry) for every scalar product
    let pairs = kernels::expand_products(a.rows(), &b_offsets);

    let cols: Vec<u32> = pairs.iter().map(|&(_, j)| b.cols()[j]).collect();

    let (keys, vals) = if tw_size > 0 {
        let mut products = vec![0u8; pairs.len() * tw_size];
        for (product, &(k, j)) in products.chunks_exact_mut(tw_size).zip(&pairs) {
            mult.apply(a.value(k), b.value(j), product);
        }
        let (keys, vals) = kernels::sort_by_key(&cols, &products, tw_size);
        kernels::reduce_by_key(&keys, &vals, tw_size, add)
    } else {
        let (keys, _) = kernels::sort_by_key(&cols, &[], 0);
        kernels::dedup_last(&keys, &[], 0)
    };

    let (keys, vals) = mask.apply(keys, vals, tw_size);
    VectorCoo::from_parts(ncols, tw_size, keys, vals)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algo::{OpParams, ParamsVxM};
    use crate::device::DeviceId;
    use crate::storage::VectorBlock;
    use crate::types::{Descriptor, Type};

    const A0: f32 = 2.0;
    const A2: f32 = 3.0;
    const V1: f32 = 5.0;
    const V2: f32 = 7.0;
    const V3: f32 = 11.0;

    fn operand_a() -> Arc<dyn VectorBlock> {
        Arc::new(VectorCoo::from_typed(3, &[(0u32, A0), (2, A2)]).unwrap())
    }

    fn operand_b() -> Arc<dyn MatrixBlock> {
        Arc::new(MatrixCoo::from_typed(3, 4, &[(0u32, 1u32, V1), (2, 1, V2), (2, 3, V3)]).unwrap())
    }

    fn params(
        a: Option<Arc<dyn VectorBlock>>,
        has_mask: bool,
        mask: Option<Arc<dyn VectorBlock>>,
        desc: Descriptor,
    ) -> AlgorithmParams {
        let ty = Type::of::<f32>();
        AlgorithmParams::new(
            desc,
            DeviceId(0),
            OpParams::VxM(ParamsVxM {
                has_mask,
                w: None,
                mask,
                mult: FunctionBinary::builtin("times", &ty).unwrap(),
                add: FunctionBinary::builtin("plus", &ty).unwrap(),
                a,
                b: Some(operand_b()),
                ncols: 4,
                ta: ty.clone(),
                tb: ty.clone(),
                tw: ty,
            }),
        )
    }

    fn run(mut params: AlgorithmParams) -> Vec<(u32, f32)> {
        let devices = DeviceManager::new(1, "vxm").unwrap();
        assert!(VxMCoo.select(&params));
        VxMCoo.process(&mut params, &devices).unwrap();

        let w = params.vxm().unwrap().w.clone().unwrap();
        let w = crate::storage::downcast_vector::<VectorCoo>(&w).unwrap();
        assert_eq!(w.nrows(), 4);
        w.to_typed::<f32>()
    }

    #[test]
    fn test_unmasked_product() {
        let result = run(params(Some(operand_a()), false, None, Descriptor::new()));
        assert_eq!(result, vec![(1, A0 * V1 + A2 * V2), (3, A2 * V3)]);
    }

    #[test]
    fn test_masked_product() {
        let mask: Arc<dyn VectorBlock> = Arc::new(VectorCoo::from_indices(4, vec![1]).unwrap());
        let result = run(params(Some(operand_a()), true, Some(mask), Descriptor::new()));
        assert_eq!(result, vec![(1, A0 * V1 + A2 * V2)]);
    }

    #[test]
    fn test_complemented_mask() {
        let mask: Arc<dyn VectorBlock> = Arc::new(VectorCoo::from_indices(4, vec![1]).unwrap());
        let desc = Descriptor::new().with(DescriptorParam::MaskComplement);
        let result = run(params(Some(operand_a()), true, Some(mask), desc));
        assert_eq!(result, vec![(3, A2 * V3)]);
    }

    #[test]
    fn test_mask_filters_everything() {
        let mask: Arc<dyn VectorBlock> = Arc::new(VectorCoo::from_indices(4, vec![0, 2]).unwrap());
        let result = run(params(Some(operand_a()), true, Some(mask), Descriptor::new()));
        assert!(result.is_empty());
    }

    #[test]
    fn test_empty_vector_gives_empty_result() {
        let empty: Arc<dyn VectorBlock> = Arc::new(VectorCoo::empty(3, 4));
        assert!(run(params(Some(empty), false, None, Descriptor::new())).is_empty());
        assert!(run(params(None, false, None, Descriptor::new())).is_empty());
    }

    #[test]
    fn test_missing_mask_gives_empty_result() {
        let result = run(params(Some(operand_a()), true, None, Descriptor::new()));
        assert!(result.is_empty());

        // Complement of a missing mask keeps everything
        let desc = Descriptor::new().with(DescriptorParam::MaskComplement);
        let result = run(params(Some(operand_a()), true, None, desc));
        assert_eq!(result.len(), 2);
    }

    #[test]
    fn test_structural_output() {
        let a: Arc<dyn VectorBlock> = Arc::new(VectorCoo::from_indices(3, vec![0, 2]).unwrap());
        let b: Arc<dyn MatrixBlock> = Arc::new(
            MatrixCoo::new(3, 4, 0, vec![0, 2, 2], vec![1, 1, 3], Vec::new()).unwrap(),
        );
        let void = Type::void();
        let any_bool = FunctionBinary::builtin("first", &Type::of::<i32>()).unwrap();
        let mut params = AlgorithmParams::new(
            Descriptor::new(),
            DeviceId(0),
            OpParams::VxM(ParamsVxM {
                has_mask: false,
                w: None,
                mask: None,
                mult: any_bool.clone(),
                add: any_bool,
                a: Some(a),
                b: Some(b),
                ncols: 4,
                ta: void.clone(),
                tb: void.clone(),
                tw: void,
            }),
        );

        let devices = DeviceManager::new(1, "vxm").unwrap();
        VxMCoo.process(&mut params, &devices).unwrap();
        let w = params.vxm().unwrap().w.clone().unwrap();
        let w = crate::storage::downcast_vector::<VectorCoo>(&w).unwrap();
        assert_eq!(w.rows(), &[1, 3]);
        assert!(!w.has_values());
    }
}
