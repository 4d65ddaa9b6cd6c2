// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::Arc;

use crate::algo::kernels;
use crate::device::QueueFinisher;
use crate::errors::{SplaError, SplaResult};
use crate::expression::context::ExpressionContext;
use crate::expression::node::{NodeArgs, Operation};
use crate::expression::processors::{ensure, single_unit, unexpected_args};
use crate::storage::{MatrixCoo, VectorCoo};
use crate::traits::NodeProcessor;
use crate::types::{Descriptor, DescriptorParam};

fn presorted(desc: &Descriptor) -> bool {
    desc.is_param_set(DescriptorParam::ValuesSorted) && desc.is_param_set(DescriptorParam::NoDuplicates)
}

/// Replaces a vector's contents with raw `(index, value)` entries.
///
/// Entries are sorted by index and duplicates resolved last-write-wins, unless the
/// descriptor promises both. Promised input is still validated when stored.
pub struct VectorDataWriteProcessor;

impl NodeProcessor for VectorDataWriteProcessor {
    fn operation_type(&self) -> Operation {
        Operation::VectorDataWrite
    }

    fn name(&self) -> &'static str {
        "VectorDataWriteCOO"
    }

    fn process(&self, idx: usize, context: &mut ExpressionContext) -> SplaResult<()> {
        let node = context.node(idx);
        let NodeArgs::VectorDataWrite { target, rows, vals } = node.args() else {
            return Err(unexpected_args(self.name(), node));
        };

        let nrows = target.nrows();
        if let Some(&bad) = rows.iter().find(|&&i| i as usize >= nrows) {
            return Err(SplaError::invalid_argument(format!(
                "Node {}: index {} out of bounds for vector of size {}",
                idx, bad, nrows
            )));
        }

        let presorted = presorted(node.desc());
        let devices = Arc::clone(context.devices());
        let device_id = devices.fetch_device();
        let (target, rows, vals) = (target.clone(), rows.clone(), vals.clone());

        context.set_node_flow(
            idx,
            single_unit(move || {
                let queue = devices.queue(device_id)?;
                let _finisher = QueueFinisher::new(&queue);
                let byte_size = target.ty().byte_size();

                let block = queue.run(move || {
                    if presorted {
                        VectorCoo::new(nrows, byte_size, rows, vals)
                    } else {
                        let (rows, vals) = kernels::sort_by_key(&rows, &vals, byte_size);
                        let (rows, vals) = kernels::dedup_last(&rows, &vals, byte_size);
                        Ok(VectorCoo::from_parts(nrows, byte_size, rows, vals))
                    }
                })??;
                target.set_block(Some(Arc::new(block)));
                Ok(())
            }),
        );
        Ok(())
    }
}

/// Replaces a matrix's contents with raw `(row, col, value)` entries.
pub struct MatrixDataWriteProcessor;

impl NodeProcessor for MatrixDataWriteProcessor {
    fn operation_type(&self) -> Operation {
        Operation::MatrixDataWrite
    }

    fn name(&self) -> &'static str {
        "MatrixDataWriteCOO"
    }

    fn process(&self, idx: usize, context: &mut ExpressionContext) -> SplaResult<()> {
        let node = context.node(idx);
        let NodeArgs::MatrixDataWrite {
            target,
            rows,
            cols,
            vals,
        } = node.args()
        else {
            return Err(unexpected_args(self.name(), node));
        };

        let (nrows, ncols) = (target.nrows(), target.ncols());
        ensure(rows.len() == cols.len(), idx, || {
            format!("{} row indices but {} column indices", rows.len(), cols.len())
        })?;
        if let Some((i, j)) = rows
            .iter()
            .zip(cols)
            .find(|&(&i, &j)| i as usize >= nrows || j as usize >= ncols)
        {
            return Err(SplaError::invalid_argument(format!(
                "Node {}: entry ({}, {}) out of bounds for matrix of shape {}x{}",
                idx, i, j, nrows, ncols
            )));
        }

        let presorted = presorted(node.desc());
        let devices = Arc::clone(context.devices());
        let device_id = devices.fetch_device();
        let target = target.clone();
        let (rows, cols, vals) = (rows.clone(), cols.clone(), vals.clone());

        context.set_node_flow(
            idx,
            single_unit(move || {
                let queue = devices.queue(device_id)?;
                let _finisher = QueueFinisher::new(&queue);
                let byte_size = target.ty().byte_size();

                let block = queue.run(move || {
                    if presorted {
                        return MatrixCoo::new(nrows, ncols, byte_size, rows, cols, vals);
                    }
                    let keys: Vec<u64> = rows
                        .iter()
                        .zip(&cols)
                        .map(|(&i, &j)| kernels::pack(i, j))
                        .collect();
                    let (keys, vals) = kernels::sort_by_key(&keys, &vals, byte_size);
                    let (keys, vals) = kernels::dedup_last(&keys, &vals, byte_size);
                    let (rows, cols) = keys.iter().map(|&k| kernels::unpack(k)).unzip();
                    Ok(MatrixCoo::from_parts(nrows, ncols, byte_size, rows, cols, vals))
                })??;
                target.set_block(Some(Arc::new(block)));
                Ok(())
            }),
        );
        Ok(())
    }
}
