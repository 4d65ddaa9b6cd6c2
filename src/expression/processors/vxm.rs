// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::Arc;

use crate::algo::{AlgorithmParams, AlgorithmType, OpParams, ParamsVxM};
use crate::errors::SplaResult;
use crate::expression::context::ExpressionContext;
use crate::expression::node::{NodeArgs, Operation};
use crate::expression::processors::{
    ensure, ensure_algorithms, ensure_function, ensure_vector_mask, publish_vector, single_unit,
    unexpected_args,
};
use crate::traits::NodeProcessor;

/// `w<mask> = a x B` over a semiring given by `mult` and `add`.
pub struct VxMProcessor;

impl NodeProcessor for VxMProcessor {
    fn operation_type(&self) -> Operation {
        Operation::VxM
    }

    fn name(&self) -> &'static str {
        "VxM"
    }

    fn process(&self, idx: usize, context: &mut ExpressionContext) -> SplaResult<()> {
        let node = context.node(idx);
        let NodeArgs::VxM {
            w,
            mask,
            mult,
            add,
            a,
            b,
        } = node.args()
        else {
            return Err(unexpected_args(self.name(), node));
        };

        ensure(a.nrows() == b.nrows(), idx, || {
            format!("vector of size {} cannot multiply matrix with {} rows", a.nrows(), b.nrows())
        })?;
        ensure(w.nrows() == b.ncols(), idx, || {
            format!("output of size {} does not match matrix with {} columns", w.nrows(), b.ncols())
        })?;
        ensure_vector_mask(idx, mask.as_ref(), w.nrows())?;
        if w.ty().has_values() {
            ensure_function(idx, mult, a.ty(), b.ty(), w.ty())?;
            ensure_function(idx, add, w.ty(), w.ty(), w.ty())?;
        }

        ensure_algorithms(context, AlgorithmType::VxM)?;

        let devices = Arc::clone(context.devices());
        let algorithms = Arc::clone(context.algorithms());
        let device_id = devices.fetch_device();
        let desc = node.desc().clone();
        let (w, mask, a, b) = (w.clone(), mask.clone(), a.clone(), b.clone());
        let (mult, add) = (mult.clone(), add.clone());

        context.set_node_flow(
            idx,
            single_unit(move || {
                let mut params = AlgorithmParams::new(
                    desc,
                    device_id,
                    OpParams::VxM(ParamsVxM {
                        has_mask: mask.is_some(),
                        w: w.block(),
                        mask: mask.as_ref().and_then(|m| m.block()),
                        mult,
                        add,
                        a: a.block(),
                        b: b.block(),
                        ncols: b.ncols(),
                        ta: a.ty().clone(),
                        tb: b.ty().clone(),
                        tw: w.ty().clone(),
                    }),
                );
                algorithms.dispatch(&mut params, &devices)?;
                publish_vector(&w, params.vxm_mut()?.w.take());
                Ok(())
            }),
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algo::AlgorithmManager;
    use crate::device::DeviceManager;
    use crate::engine::{ReactiveExecutor, TaskExecutor};
    use crate::errors::{ExecutionError, SplaError};
    use crate::expression::processors::test_support::{context, evaluate};
    use crate::expression::{Expression, ExpressionManager};
    use crate::storage::{Matrix, Vector};
    use crate::types::{Descriptor, FunctionBinary, Type};

    fn semiring() -> (FunctionBinary, FunctionBinary) {
        let ty = Type::of::<i32>();
        (
            FunctionBinary::builtin("times", &ty).unwrap(),
            FunctionBinary::builtin("plus", &ty).unwrap(),
        )
    }

    fn vxm_expression(a: &Vector, b: &Matrix, w: &Vector) -> Expression {
        let (mult, add) = semiring();
        let mut expression = Expression::new("vxm");
        let wa = expression
            .make_vector_write_typed(a, &[(0, 2i32), (2, 3)], Descriptor::new())
            .unwrap();
        let wb = expression
            .make_matrix_write_typed(b, &[(0, 1, 5i32), (2, 1, 7), (2, 3, 11)], Descriptor::new())
            .unwrap();
        let product = expression
            .make_vxm(w, None, &mult, &add, a, b, Descriptor::new())
            .unwrap();
        expression.dependency(wa, product).unwrap();
        expression.dependency(wb, product).unwrap();
        expression
    }

    #[test]
    fn test_vxm_after_writes() {
        let ty = Type::of::<i32>();
        let a = Vector::new(3, ty.clone());
        let b = Matrix::new(3, 4, ty.clone());
        let w = Vector::new(4, ty);

        evaluate(&vxm_expression(&a, &b, &w)).unwrap();
        assert_eq!(w.to_typed::<i32>(), vec![(1, 2 * 5 + 3 * 7), (3, 3 * 11)]);
    }

    #[test]
    fn test_shape_mismatch_rejected() {
        let ty = Type::of::<i32>();
        let (mult, add) = semiring();
        let a = Vector::new(3, ty.clone());
        let b = Matrix::new(4, 4, ty.clone());
        let w = Vector::new(4, ty);
        let mut expression = Expression::new("shapes");
        let idx = expression
            .make_vxm(&w, None, &mult, &add, &a, &b, Descriptor::new())
            .unwrap();

        let error = VxMProcessor.process(idx, &mut context(&expression)).unwrap_err();
        assert_eq!(
            error,
            SplaError::invalid_argument("Node 0: vector of size 3 cannot multiply matrix with 4 rows")
        );
    }

    #[test]
    fn test_missing_algorithm_rejected_before_running() {
        let ty = Type::of::<i32>();
        let a = Vector::new(3, ty.clone());
        let b = Matrix::new(3, 4, ty.clone());
        let w = Vector::new(4, ty);
        let expression = vxm_expression(&a, &b, &w);

        let devices = Arc::new(DeviceManager::new(1, "bare").unwrap());
        let error = ExpressionManager::with_builtin()
            .prepare(&expression, devices, Arc::new(AlgorithmManager::new()))
            .unwrap_err();

        assert_eq!(error, SplaError::invalid_state("No algorithms for such op=VxM"));
        assert!(a.block().is_none());
        assert!(w.block().is_none());
    }

    #[test]
    fn test_unmatched_algorithm_fails_when_run() {
        struct NeverSelects;

        impl crate::traits::Algorithm for NeverSelects {
            fn algorithm_type(&self) -> AlgorithmType {
                AlgorithmType::VxM
            }

            fn name(&self) -> &'static str {
                "NeverSelects"
            }

            fn select(&self, _params: &AlgorithmParams) -> bool {
                false
            }

            fn process(&self, _params: &mut AlgorithmParams, _devices: &DeviceManager) -> SplaResult<()> {
                unreachable!("never selected")
            }
        }

        let ty = Type::of::<i32>();
        let a = Vector::new(3, ty.clone());
        let b = Matrix::new(3, 4, ty.clone());
        let w = Vector::new(4, ty);
        let expression = vxm_expression(&a, &b, &w);

        let mut algorithms = AlgorithmManager::new();
        algorithms.register(Arc::new(NeverSelects));
        let devices = Arc::new(DeviceManager::new(1, "bare").unwrap());
        let graph = ExpressionManager::with_builtin()
            .prepare(&expression, devices, Arc::new(algorithms))
            .unwrap();

        let runtime = tokio::runtime::Runtime::new().unwrap();
        let error = runtime.block_on(ReactiveExecutor::new(2).run(graph)).unwrap_err();
        match error {
            ExecutionError::NodeFailed { node, message, .. } => {
                assert_eq!(node, 2);
                assert_eq!(message, "Invalid state: Failed to find suitable algorithm for op=VxM");
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(w.block().is_none());
    }
}
