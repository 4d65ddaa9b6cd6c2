// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::Arc;

use crate::algo::{AlgorithmParams, AlgorithmType, OpParams, ParamsMxM};
use crate::errors::SplaResult;
use crate::expression::context::ExpressionContext;
use crate::expression::node::{NodeArgs, Operation};
use crate::expression::processors::{
    ensure, ensure_algorithms, ensure_function, ensure_matrix_mask, publish_matrix, single_unit,
    unexpected_args,
};
use crate::traits::NodeProcessor;

/// `W<mask> = A x B` over a semiring.
pub struct MxMProcessor;

impl NodeProcessor for MxMProcessor {
    fn operation_type(&self) -> Operation {
        Operation::MxM
    }

    fn name(&self) -> &'static str {
        "MxM"
    }

    fn process(&self, idx: usize, context: &mut ExpressionContext) -> SplaResult<()> {
        let node = context.node(idx);
        let NodeArgs::MxM {
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

        ensure(a.ncols() == b.nrows(), idx, || {
            format!(
                "cannot multiply {}x{} by {}x{}",
                a.nrows(),
                a.ncols(),
                b.nrows(),
                b.ncols()
            )
        })?;
        let shape = (w.nrows(), w.ncols());
        ensure(shape == (a.nrows(), b.ncols()), idx, || {
            format!(
                "output of shape {}x{} does not match product of shape {}x{}",
                shape.0,
                shape.1,
                a.nrows(),
                b.ncols()
            )
        })?;
        ensure_matrix_mask(idx, mask.as_ref(), shape)?;
        if w.ty().has_values() {
            ensure_function(idx, mult, a.ty(), b.ty(), w.ty())?;
            ensure_function(idx, add, w.ty(), w.ty(), w.ty())?;
        }

        ensure_algorithms(context, AlgorithmType::MxM)?;

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
                    OpParams::MxM(ParamsMxM {
                        has_mask: mask.is_some(),
                        w: w.block(),
                        mask: mask.as_ref().and_then(|m| m.block()),
                        mult,
                        add,
                        a: a.block(),
                        b: b.block(),
                        nrows: shape.0,
                        ncols: shape.1,
                        ta: a.ty().clone(),
                        tb: b.ty().clone(),
                        tw: w.ty().clone(),
                    }),
                );
                algorithms.dispatch(&mut params, &devices)?;
                publish_matrix(&w, params.mxm_mut()?.w.take());
                Ok(())
            }),
        );
        Ok(())
    }
}
