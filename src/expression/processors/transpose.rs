// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::Arc;

use crate::algo::{AlgorithmParams, AlgorithmType, OpParams, ParamsTranspose};
use crate::errors::SplaResult;
use crate::expression::context::ExpressionContext;
use crate::expression::node::{NodeArgs, Operation};
use crate::expression::processors::{
    ensure, ensure_algorithms, ensure_matrix_mask, ensure_same_type, publish_matrix, single_unit,
    unexpected_args,
};
use crate::traits::NodeProcessor;

/// `W<mask> = A^T`. The mask filters the transposed result.
pub struct MatrixTransposeProcessor;

impl NodeProcessor for MatrixTransposeProcessor {
    fn operation_type(&self) -> Operation {
        Operation::MatrixTranspose
    }

    fn name(&self) -> &'static str {
        "MatrixTranspose"
    }

    fn process(&self, idx: usize, context: &mut ExpressionContext) -> SplaResult<()> {
        let node = context.node(idx);
        let NodeArgs::MatrixTranspose { w, mask, a } = node.args() else {
            return Err(unexpected_args(self.name(), node));
        };

        let shape = (w.nrows(), w.ncols());
        ensure(shape == (a.ncols(), a.nrows()), idx, || {
            format!(
                "output of shape {}x{} cannot hold the transpose of {}x{}",
                shape.0,
                shape.1,
                a.nrows(),
                a.ncols()
            )
        })?;
        ensure_matrix_mask(idx, mask.as_ref(), shape)?;
        ensure_same_type(idx, w.ty(), a.ty(), "a")?;

        ensure_algorithms(context, AlgorithmType::Transpose)?;

        let devices = Arc::clone(context.devices());
        let algorithms = Arc::clone(context.algorithms());
        let device_id = devices.fetch_device();
        let desc = node.desc().clone();
        let (w, mask, a) = (w.clone(), mask.clone(), a.clone());

        context.set_node_flow(
            idx,
            single_unit(move || {
                let mut params = AlgorithmParams::new(
                    desc,
                    device_id,
                    OpParams::Transpose(ParamsTranspose {
                        has_mask: mask.is_some(),
                        mask: mask.as_ref().and_then(|m| m.block()),
                        w: w.block(),
                        a: a.block(),
                        nrows: a.nrows(),
                        ncols: a.ncols(),
                        ty: w.ty().clone(),
                    }),
                );
                algorithms.dispatch(&mut params, &devices)?;
                publish_matrix(&w, params.transpose_mut()?.w.take());
                Ok(())
            }),
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::SplaError;
    use crate::expression::processors::test_support::{context, evaluate};
    use crate::expression::Expression;
    use crate::storage::Matrix;
    use crate::types::{Descriptor, Type};

    #[test]
    fn test_transpose_after_write() {
        let a = Matrix::new(2, 3, Type::of::<u32>());
        let w = Matrix::new(3, 2, Type::of::<u32>());
        let mut expression = Expression::new("transpose");
        let write = expression
            .make_matrix_write_typed(&a, &[(0, 2, 1u32), (1, 0, 2), (0, 0, 3)], Descriptor::new())
            .unwrap();
        let t = expression
            .make_matrix_transpose(&w, None, &a, Descriptor::new())
            .unwrap();
        expression.dependency(write, t).unwrap();

        evaluate(&expression).unwrap();
        assert_eq!(w.to_typed::<u32>(), vec![(0, 0, 3), (0, 1, 2), (2, 0, 1)]);
    }

    #[test]
    fn test_non_swapped_shape_rejected() {
        let a = Matrix::new(2, 3, Type::of::<u32>());
        let w = Matrix::new(2, 3, Type::of::<u32>());
        let mut expression = Expression::new("shape");
        let idx = expression
            .make_matrix_transpose(&w, None, &a, Descriptor::new())
            .unwrap();

        let error = MatrixTransposeProcessor
            .process(idx, &mut context(&expression))
            .unwrap_err();
        assert_eq!(
            error,
            SplaError::invalid_argument("Node 0: output of shape 2x3 cannot hold the transpose of 2x3")
        );
    }
}
