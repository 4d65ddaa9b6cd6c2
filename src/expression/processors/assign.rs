// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::Arc;

use crate::algo::{AlgorithmParams, AlgorithmType, OpParams, ParamsVectorAssign};
use crate::errors::SplaResult;
use crate::expression::context::ExpressionContext;
use crate::expression::node::{NodeArgs, Operation};
use crate::expression::processors::{
    ensure, ensure_algorithms, ensure_same_type, ensure_vector_mask, publish_vector,
    single_unit, unexpected_args,
};
use crate::traits::NodeProcessor;

/// `w<mask> = s`: every selected position of `w` takes the scalar's value.
///
/// The scalar is read when the unit runs, so a reduce feeding it through a
/// dependency is observed.
pub struct VectorAssignProcessor;

impl NodeProcessor for VectorAssignProcessor {
    fn operation_type(&self) -> Operation {
        Operation::VectorAssign
    }

    fn name(&self) -> &'static str {
        "VectorAssign"
    }

    fn process(&self, idx: usize, context: &mut ExpressionContext) -> SplaResult<()> {
        let node = context.node(idx);
        let NodeArgs::VectorAssign { w, mask, s } = node.args() else {
            return Err(unexpected_args(self.name(), node));
        };

        ensure(u32::try_from(w.nrows()).is_ok(), idx, || {
            format!("vector of size {} exceeds the u32 index range", w.nrows())
        })?;
        ensure_vector_mask(idx, mask.as_ref(), w.nrows())?;
        if w.ty().has_values() {
            ensure_same_type(idx, w.ty(), s.ty(), "scalar")?;
        }

        ensure_algorithms(context, AlgorithmType::VectorAssign)?;

        let devices = Arc::clone(context.devices());
        let algorithms = Arc::clone(context.algorithms());
        let device_id = devices.fetch_device();
        let desc = node.desc().clone();
        let (w, mask, s) = (w.clone(), mask.clone(), s.clone());

        context.set_node_flow(
            idx,
            single_unit(move || {
                let mut params = AlgorithmParams::new(
                    desc,
                    device_id,
                    OpParams::VectorAssign(ParamsVectorAssign {
                        size: w.nrows(),
                        has_mask: mask.is_some(),
                        w: w.block(),
                        mask: mask.as_ref().and_then(|m| m.block()),
                        s: s.bytes(),
                        ty: w.ty().clone(),
                    }),
                );
                algorithms.dispatch(&mut params, &devices)?;
                publish_vector(&w, params.vector_assign_mut()?.w.take());
                Ok(())
            }),
        );
        Ok(())
    }
}
