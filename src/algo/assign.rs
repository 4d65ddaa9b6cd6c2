// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::Arc;

use crate::algo::{operands_are_coo, vector_coo, vector_mask_plan, AlgorithmParams, AlgorithmType};
use crate::device::{DeviceManager, QueueFinisher};
use crate::errors::{SplaError, SplaResult};
use crate::storage::VectorCoo;
use crate::traits::Algorithm;
use crate::types::DescriptorParam;

/// Scalar assignment `w<mask> = s` over COO blocks.
///
/// The result stores `s` at every selected position and nothing elsewhere. Without
/// a mask every position `0..size` is selected.
pub struct VectorAssignCoo;

impl Algorithm for VectorAssignCoo {
    fn algorithm_type(&self) -> AlgorithmType {
        AlgorithmType::VectorAssign
    }

    fn name(&self) -> &'static str {
        "VectorAssignCOO"
    }

    fn select(&self, params: &AlgorithmParams) -> bool {
        operands_are_coo(params)
    }

    fn process(&self, params: &mut AlgorithmParams, devices: &DeviceManager) -> SplaResult<()> {
        let complement = params.desc.is_param_set(DescriptorParam::MaskComplement);
        let queue = devices.queue(params.device_id)?;
        let _finisher = QueueFinisher::new(&queue);

        let p = params.vector_assign_mut()?;
        let size = p.size;
        let byte_size = p.ty.byte_size();

        let value = match (&p.s, byte_size) {
            (_, 0) => Vec::new(),
            (Some(s), n) if s.len() == n => s.clone(),
            (Some(s), n) => {
                return Err(SplaError::invalid_argument(format!(
                    "Assigned scalar has {} bytes, expected {} for '{}'",
                    s.len(),
                    n,
                    p.ty
                )))
            }
            (None, _) => {
                return Err(SplaError::invalid_argument(format!(
                    "Assigned scalar of type '{}' has no value",
                    p.ty
                )))
            }
        };

        let mask = vector_mask_plan(p.has_mask, vector_coo(&p.mask)?.as_deref(), complement);
        if mask.is_empty() || size == 0 {
            p.w = Some(Arc::new(VectorCoo::empty(size, byte_size)));
            return Ok(());
        }

        let limit = u32::try_from(size).map_err(|_| {
            SplaError::invalid_argument(format!(
                "Vector of size {} exceeds the u32 index range",
                size
            ))
        })?;

        let result = queue.run(move || {
            let keys: Vec<u32> = (0..limit).collect();
            let vals = value.repeat(size);
            let (keys, vals) = mask.apply(keys, vals, byte_size);
            VectorCoo::from_parts(size, byte_size, keys, vals)
        })?;

        p.w = Some(Arc::new(result));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algo::{OpParams, ParamsVectorAssign};
    use crate::device::DeviceId;
    use crate::storage::VectorBlock;
    use crate::types::{Descriptor, Type};

    fn params(has_mask: bool, mask: Option<Vec<u32>>, desc: Descriptor, s: Option<u32>) -> AlgorithmParams {
        sized_params(4, has_mask, mask, desc, s)
    }

    fn sized_params(
        size: usize,
        has_mask: bool,
        mask: Option<Vec<u32>>,
        desc: Descriptor,
        s: Option<u32>,
    ) -> AlgorithmParams {
        AlgorithmParams::new(
            desc,
            DeviceId(0),
            OpParams::VectorAssign(ParamsVectorAssign {
                size,
                has_mask,
                w: None,
                mask: mask.map(|rows| {
                    Arc::new(VectorCoo::from_indices(4, rows).unwrap()) as Arc<dyn VectorBlock>
                }),
                s: s.map(|v| v.to_ne_bytes().to_vec()),
                ty: Type::of::<u32>(),
            }),
        )
    }

    fn run(mut params: AlgorithmParams) -> SplaResult<Vec<(u32, u32)>> {
        let devices = DeviceManager::new(1, "assign").unwrap();
        VectorAssignCoo.process(&mut params, &devices)?;
        let w = params.vector_assign().unwrap().w.clone().unwrap();
        Ok(crate::storage::downcast_vector::<VectorCoo>(&w)
            .unwrap()
            .to_typed::<u32>())
    }

    #[test]
    fn test_assign_cases() {
        let complement = Descriptor::new().with(DescriptorParam::MaskComplement);
        let test_cases = vec![
            (params(false, None, Descriptor::new(), Some(7)), vec![(0, 7), (1, 7), (2, 7), (3, 7)]),
            (params(true, Some(vec![1, 3]), Descriptor::new(), Some(7)), vec![(1, 7), (3, 7)]),
            (params(true, Some(vec![1, 3]), complement.clone(), Some(7)), vec![(0, 7), (2, 7)]),
            (params(true, None, Descriptor::new(), Some(7)), vec![]),
            (params(true, None, complement, Some(7)), vec![(0, 7), (1, 7), (2, 7), (3, 7)]),
        ];

        for (params, expected) in test_cases {
            assert_eq!(run(params).unwrap(), expected);
        }
    }

    #[test]
    fn test_size_beyond_index_range_rejected() {
        let size = u32::MAX as usize + 1;
        let complement = Descriptor::new().with(DescriptorParam::MaskComplement);
        let result = run(sized_params(size, false, None, complement, Some(7)));
        assert_eq!(
            result,
            Err(SplaError::invalid_argument(
                "Vector of size 4294967296 exceeds the u32 index range"
            ))
        );
    }

    #[test]
    fn test_missing_scalar_value() {
        let result = run(params(false, None, Descriptor::new(), None));
        assert!(matches!(result, Err(SplaError::InvalidArgument(_))));
    }
}
