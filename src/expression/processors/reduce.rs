// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::Arc;

use crate::algo::{AlgorithmParams, AlgorithmType, OpParams, ParamsVectorReduce};
use crate::errors::SplaResult;
use crate::expression::context::ExpressionContext;
use crate::expression::node::{NodeArgs, Operation};
use crate::expression::processors::{
    ensure, ensure_algorithms, ensure_function, ensure_same_type, single_unit, unexpected_args,
};
use crate::traits::NodeProcessor;

/// `s = reduce(v)`. Reducing an empty vector clears the scalar.
pub struct VectorReduceProcessor;

impl NodeProcessor for VectorReduceProcessor {
    fn operation_type(&self) -> Operation {
        Operation::VectorReduce
    }

    fn name(&self) -> &'static str {
        "VectorReduce"
    }

    fn process(&self, idx: usize, context: &mut ExpressionContext) -> SplaResult<()> {
        let node = context.node(idx);
        let NodeArgs::VectorReduce { s, reduce, v } = node.args() else {
            return Err(unexpected_args(self.name(), node));
        };

        let ty = v.ty();
        ensure(ty.has_values(), idx, || "cannot reduce a vector without values".to_string())?;
        ensure_same_type(idx, ty, s.ty(), "scalar")?;
        ensure_function(idx, reduce, ty, ty, ty)?;

        ensure_algorithms(context, AlgorithmType::VectorReduce)?;

        let devices = Arc::clone(context.devices());
        let algorithms = Arc::clone(context.algorithms());
        let device_id = devices.fetch_device();
        let desc = node.desc().clone();
        let (s, reduce, v) = (s.clone(), reduce.clone(), v.clone());

        context.set_node_flow(
            idx,
            single_unit(move || {
                let mut params = AlgorithmParams::new(
                    desc,
                    device_id,
                    OpParams::VectorReduce(ParamsVectorReduce {
                        vec: v.block(),
                        reduce,
                        scalar: None,
                        ty: v.ty().clone(),
                    }),
                );
                algorithms.dispatch(&mut params, &devices)?;
                s.set_bytes(params.vector_reduce_mut()?.scalar.take());
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
    use crate::storage::{Scalar, Vector};
    use crate::types::{Descriptor, FunctionBinary, Type};

    #[test]
    fn test_reduce_feeds_assign() {
        let ty = Type::of::<i32>();
        let v = Vector::new(4, ty.clone());
        let w = Vector::new(2, ty.clone());
        let s = Scalar::new(ty.clone());
        let max = FunctionBinary::builtin("max", &ty).unwrap();

        let mut expression = Expression::new("reduce-assign");
        let write = expression
            .make_vector_write_typed(&v, &[(0, 4i32), (1, 17), (3, -2)], Descriptor::new())
            .unwrap();
        let reduce = expression
            .make_vector_reduce(&s, &max, &v, Descriptor::new())
            .unwrap();
        let assign = expression
            .make_vector_assign(&w, None, &s, Descriptor::new())
            .unwrap();
        expression.dependency(write, reduce).unwrap();
        expression.dependency(reduce, assign).unwrap();

        evaluate(&expression).unwrap();
        assert_eq!(s.get::<i32>(), Some(17));
        assert_eq!(w.to_typed::<i32>(), vec![(0, 17), (1, 17)]);
    }

    #[test]
    fn test_reduce_of_empty_vector_clears_scalar() {
        let ty = Type::of::<f64>();
        let v = Vector::new(4, ty.clone());
        let s = Scalar::from_value(3.0f64);
        let plus = FunctionBinary::builtin("plus", &ty).unwrap();

        let mut expression = Expression::new("empty");
        expression
            .make_vector_reduce(&s, &plus, &v, Descriptor::new())
            .unwrap();

        evaluate(&expression).unwrap();
        assert!(!s.has_value());
    }

    #[test]
    fn test_structural_vector_rejected() {
        let v = Vector::new(4, Type::void());
        let s = Scalar::new(Type::of::<i32>());
        let plus = FunctionBinary::builtin("plus", &Type::of::<i32>()).unwrap();
        let mut expression = Expression::new("void");
        let idx = expression
            .make_vector_reduce(&s, &plus, &v, Descriptor::new())
            .unwrap();

        let error = VectorReduceProcessor
            .process(idx, &mut context(&expression))
            .unwrap_err();
        assert_eq!(
            error,
            SplaError::invalid_argument("Node 0: cannot reduce a vector without values")
        );
    }
}
