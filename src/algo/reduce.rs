// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::algo::kernels;
use crate::algo::{operands_are_coo, vector_coo, AlgorithmParams, AlgorithmType};
use crate::device::{DeviceManager, QueueFinisher};
use crate::errors::{SplaError, SplaResult};
use crate::traits::Algorithm;

/// Fold of every stored value of a COO vector.
///
/// An empty vector leaves the scalar unset.
pub struct VectorReduceCoo;

impl Algorithm for VectorReduceCoo {
    fn algorithm_type(&self) -> AlgorithmType {
        AlgorithmType::VectorReduce
    }

    fn name(&self) -> &'static str {
        "VectorReduceCOO"
    }

    fn select(&self, params: &AlgorithmParams) -> bool {
        operands_are_coo(params)
    }

    fn process(&self, params: &mut AlgorithmParams, devices: &DeviceManager) -> SplaResult<()> {
        let queue = devices.queue(params.device_id)?;
        let _finisher = QueueFinisher::new(&queue);

        let p = params.vector_reduce_mut()?;
        let byte_size = p.ty.byte_size();
        if byte_size == 0 {
            return Err(SplaError::invalid_argument(
                "Cannot reduce a vector without values",
            ));
        }

        let vec = match vector_coo(&p.vec)? {
            Some(vec) if !vec.rows().is_empty() => vec,
            _ => {
                p.scalar = None;
                return Ok(());
            }
        };
        if vec.byte_size() != byte_size {
            return Err(SplaError::invalid_argument(format!(
                "Reduced vector must carry '{}' values",
                p.ty
            )));
        }

        let reduce = p.reduce.clone();
        let result = queue.run(move || {
            let mut acc = vec.value(0).to_vec();
            let mut scratch = vec![0u8; byte_size];
            for k in 1..vec.rows().len() {
                reduce.apply(&acc, kernels::value(vec.vals(), byte_size, k), &mut scratch);
                acc.copy_from_slice(&scratch);
            }
            acc
        })?;

        p.scalar = Some(result);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algo::{OpParams, ParamsVectorReduce};
    use crate::device::DeviceId;
    use crate::storage::{VectorBlock, VectorCoo};
    use crate::types::{Descriptor, FunctionBinary, Type};
    use std::sync::Arc;

    fn run(vec: Option<VectorCoo>, function: &str) -> Option<f32> {
        let ty = Type::of::<f32>();
        let mut params = AlgorithmParams::new(
            Descriptor::new(),
            DeviceId(0),
            OpParams::VectorReduce(ParamsVectorReduce {
                vec: vec.map(|v| Arc::new(v) as Arc<dyn VectorBlock>),
                reduce: FunctionBinary::builtin(function, &ty).unwrap(),
                scalar: Some(vec![0; 4]),
                ty,
            }),
        );

        let devices = DeviceManager::new(1, "reduce").unwrap();
        VectorReduceCoo.process(&mut params, &devices).unwrap();
        params
            .vector_reduce()
            .unwrap()
            .scalar
            .as_deref()
            .map(bytemuck::pod_read_unaligned::<f32>)
    }

    #[test]
    fn test_reduce() {
        let v = || VectorCoo::from_typed(8, &[(1u32, 1.5f32), (4, 4.0), (6, -2.0)]).unwrap();
        assert_eq!(run(Some(v()), "plus"), Some(3.5));
        assert_eq!(run(Some(v()), "max"), Some(4.0));
        assert_eq!(run(Some(v()), "min"), Some(-2.0));
    }

    #[test]
    fn test_empty_vector_leaves_scalar_unset() {
        assert_eq!(run(Some(VectorCoo::empty(8, 4)), "plus"), None);
        assert_eq!(run(None, "plus"), None);
    }
}
