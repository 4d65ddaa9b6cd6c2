// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::Arc;

use crate::algo::{
    AlgorithmParams, AlgorithmType, OpParams, ParamsMatrixEWiseAdd, ParamsVectorEWiseAdd,
};
use crate::errors::SplaResult;
use crate::expression::context::ExpressionContext;
use crate::expression::node::{NodeArgs, Operation};
use crate::expression::processors::{
    ensure, ensure_algorithms, ensure_function, ensure_matrix_mask, ensure_same_type,
    ensure_vector_mask, publish_matrix, publish_vector, single_unit, unexpected_args,
};
use crate::traits::NodeProcessor;

/// `w<mask> = a + b` over vectors, as a union of stored entries.
pub struct VectorEWiseAddProcessor;

impl NodeProcessor for VectorEWiseAddProcessor {
    fn operation_type(&self) -> Operation {
        Operation::VectorEWiseAdd
    }

    fn name(&self) -> &'static str {
        "VectorEWiseAdd"
    }

    fn process(&self, idx: usize, context: &mut ExpressionContext) -> SplaResult<()> {
        let node = context.node(idx);
        let NodeArgs::VectorEWiseAdd { w, mask, op, a, b } = node.args() else {
            return Err(unexpected_args(self.name(), node));
        };

        let size = w.nrows();
        ensure(a.nrows() == size && b.nrows() == size, idx, || {
            format!(
                "operands of size {} and {} do not match output of size {}",
                a.nrows(),
                b.nrows(),
                size
            )
        })?;
        ensure_vector_mask(idx, mask.as_ref(), size)?;
        ensure_same_type(idx, w.ty(), a.ty(), "a")?;
        ensure_same_type(idx, w.ty(), b.ty(), "b")?;
        if w.ty().has_values() {
            ensure_function(idx, op, w.ty(), w.ty(), w.ty())?;
        }

        ensure_algorithms(context, AlgorithmType::VectorEWiseAdd)?;

        let devices = Arc::clone(context.devices());
        let algorithms = Arc::clone(context.algorithms());
        let device_id = devices.fetch_device();
        let desc = node.desc().clone();
        let (w, mask, op, a, b) = (w.clone(), mask.clone(), op.clone(), a.clone(), b.clone());

        context.set_node_flow(
            idx,
            single_unit(move || {
                let mut params = AlgorithmParams::new(
                    desc,
                    device_id,
                    OpParams::VectorEWiseAdd(ParamsVectorEWiseAdd {
                        has_mask: mask.is_some(),
                        w: w.block(),
                        mask: mask.as_ref().and_then(|m| m.block()),
                        op,
                        a: a.block(),
                        b: b.block(),
                        nrows: size,
                        ty: w.ty().clone(),
                    }),
                );
                algorithms.dispatch(&mut params, &devices)?;
                publish_vector(&w, params.vector_ewise_add_mut()?.w.take());
                Ok(())
            }),
        );
        Ok(())
    }
}

/// `w<mask> = a + b` over matrices, as a union of stored entries.
pub struct MatrixEWiseAddProcessor;

impl NodeProcessor for MatrixEWiseAddProcessor {
    fn operation_type(&self) -> Operation {
        Operation::MatrixEWiseAdd
    }

    fn name(&self) -> &'static str {
        "MatrixEWiseAdd"
    }

    fn process(&self, idx: usize, context: &mut ExpressionContext) -> SplaResult<()> {
        let node = context.node(idx);
        let NodeArgs::MatrixEWiseAdd { w, mask, op, a, b } = node.args() else {
            return Err(unexpected_args(self.name(), node));
        };

        let shape = (w.nrows(), w.ncols());
        ensure(
            (a.nrows(), a.ncols()) == shape && (b.nrows(), b.ncols()) == shape,
            idx,
            || {
                format!(
                    "operands of shape {}x{} and {}x{} do not match output of shape {}x{}",
                    a.nrows(),
                    a.ncols(),
                    b.nrows(),
                    b.ncols(),
                    shape.0,
                    shape.1
                )
            },
        )?;
        ensure_matrix_mask(idx, mask.as_ref(), shape)?;
        ensure_same_type(idx, w.ty(), a.ty(), "a")?;
        ensure_same_type(idx, w.ty(), b.ty(), "b")?;
        if w.ty().has_values() {
            ensure_function(idx, op, w.ty(), w.ty(), w.ty())?;
        }

        ensure_algorithms(context, AlgorithmType::MatrixEWiseAdd)?;

        let devices = Arc::clone(context.devices());
        let algorithms = Arc::clone(context.algorithms());
        let device_id = devices.fetch_device();
        let desc = node.desc().clone();
        let (w, mask, op, a, b) = (w.clone(), mask.clone(), op.clone(), a.clone(), b.clone());

        context.set_node_flow(
            idx,
            single_unit(move || {
                let mut params = AlgorithmParams::new(
                    desc,
                    device_id,
                    OpParams::MatrixEWiseAdd(ParamsMatrixEWiseAdd {
                        has_mask: mask.is_some(),
                        w: w.block(),
                        mask: mask.as_ref().and_then(|m| m.block()),
                        op,
                        a: a.block(),
                        b: b.block(),
                        nrows: shape.0,
                        ncols: shape.1,
                        ty: w.ty().clone(),
                    }),
                );
                algorithms.dispatch(&mut params, &devices)?;
                publish_matrix(&w, params.matrix_ewise_add_mut()?.w.take());
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
    use crate::storage::{Matrix, Vector, VectorCoo};
    use crate::types::{Descriptor, DescriptorParam, FunctionBinary, Type};

    fn plus() -> FunctionBinary {
        FunctionBinary::builtin("plus", &Type::of::<i32>()).unwrap()
    }

    #[test]
    fn test_vector_union_after_writes() {
        let ty = Type::of::<i32>();
        let (a, b, w) = (Vector::new(5, ty.clone()), Vector::new(5, ty.clone()), Vector::new(5, ty));
        let mut expression = Expression::new("union");
        let wa = expression
            .make_vector_write_typed(&a, &[(0, 1i32), (2, 2)], Descriptor::new())
            .unwrap();
        let wb = expression
            .make_vector_write_typed(&b, &[(2, 10i32), (4, 20)], Descriptor::new())
            .unwrap();
        let add = expression
            .make_vector_ewise_add(&w, None, &plus(), &a, &b, Descriptor::new())
            .unwrap();
        expression.dependency(wa, add).unwrap();
        expression.dependency(wb, add).unwrap();

        evaluate(&expression).unwrap();
        assert_eq!(w.to_typed::<i32>(), vec![(0, 1), (2, 12), (4, 20)]);
    }

    #[test]
    fn test_vector_union_with_complement_mask() {
        let ty = Type::of::<i32>();
        let (a, b, w) = (Vector::new(4, ty.clone()), Vector::new(4, ty.clone()), Vector::new(4, ty));
        a.set_block(Some(Arc::new(
            VectorCoo::from_typed(4, &[(0, 1i32), (1, 2)]).unwrap(),
        )));
        b.set_block(Some(Arc::new(
            VectorCoo::from_typed(4, &[(3, 4i32)]).unwrap(),
        )));
        let mask = Vector::new(4, Type::void());
        mask.set_block(Some(Arc::new(VectorCoo::from_indices(4, vec![1]).unwrap())));

        let mut expression = Expression::new("complement");
        expression
            .make_vector_ewise_add(
                &w,
                Some(&mask),
                &plus(),
                &a,
                &b,
                Descriptor::new().with(DescriptorParam::MaskComplement),
            )
            .unwrap();

        evaluate(&expression).unwrap();
        assert_eq!(w.to_typed::<i32>(), vec![(0, 1), (3, 4)]);
    }

    #[test]
    fn test_vector_size_mismatch_rejected() {
        let ty = Type::of::<i32>();
        let (a, b, w) = (Vector::new(4, ty.clone()), Vector::new(5, ty.clone()), Vector::new(4, ty));
        let mut expression = Expression::new("sizes");
        let idx = expression
            .make_vector_ewise_add(&w, None, &plus(), &a, &b, Descriptor::new())
            .unwrap();

        let error = VectorEWiseAddProcessor
            .process(idx, &mut context(&expression))
            .unwrap_err();
        assert_eq!(
            error,
            SplaError::invalid_argument("Node 0: operands of size 4 and 5 do not match output of size 4")
        );
    }

    #[test]
    fn test_function_type_mismatch_rejected() {
        let ty = Type::of::<f32>();
        let (a, b, w) = (Vector::new(4, ty.clone()), Vector::new(4, ty.clone()), Vector::new(4, ty));
        let mut expression = Expression::new("types");
        let idx = expression
            .make_vector_ewise_add(&w, None, &plus(), &a, &b, Descriptor::new())
            .unwrap();

        let error = VectorEWiseAddProcessor
            .process(idx, &mut context(&expression))
            .unwrap_err();
        assert!(matches!(error, SplaError::InvalidArgument(ref m) if m.contains("function 'plus'")));
    }

    #[test]
    fn test_matrix_union_publishes_empty_for_empty_operands() {
        let ty = Type::of::<i32>();
        let (a, b, w) = (
            Matrix::new(2, 3, ty.clone()),
            Matrix::new(2, 3, ty.clone()),
            Matrix::new(2, 3, ty),
        );
        let mut expression = Expression::new("empty");
        expression
            .make_matrix_ewise_add(&w, None, &plus(), &a, &b, Descriptor::new())
            .unwrap();

        evaluate(&expression).unwrap();
        assert!(w.block().is_some());
        assert_eq!(w.nvals(), 0);
    }

    #[test]
    fn test_matrix_union_after_writes() {
        let ty = Type::of::<i32>();
        let (a, b, w) = (
            Matrix::new(2, 2, ty.clone()),
            Matrix::new(2, 2, ty.clone()),
            Matrix::new(2, 2, ty),
        );
        let mut expression = Expression::new("matrix");
        let wa = expression
            .make_matrix_write_typed(&a, &[(0, 0, 1i32), (1, 1, 2)], Descriptor::new())
            .unwrap();
        let wb = expression
            .make_matrix_write_typed(&b, &[(1, 1, 5i32), (1, 0, 3)], Descriptor::new())
            .unwrap();
        let add = expression
            .make_matrix_ewise_add(&w, None, &plus(), &a, &b, Descriptor::new())
            .unwrap();
        expression.dependency(wa, add).unwrap();
        expression.dependency(wb, add).unwrap();

        evaluate(&expression).unwrap();
        assert_eq!(w.to_typed::<i32>(), vec![(0, 0, 1), (1, 0, 3), (1, 1, 7)]);
    }
}
