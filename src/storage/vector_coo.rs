// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::any::Any;
use std::sync::Arc;

use crate::errors::{SplaError, SplaResult};
use crate::storage::{BlockFormat, VectorBlock};
use crate::types::Element;

/// Coordinate-list vector block.
///
/// `rows` is strictly increasing. `vals` holds `rows.len() * byte_size` bytes, or
/// nothing when the block is structural (`byte_size == 0`).
#[derive(Debug, Clone, PartialEq)]
pub struct VectorCoo {
    nrows: usize,
    byte_size: usize,
    rows: Vec<u32>,
    vals: Vec<u8>,
}

impl VectorCoo {
    pub fn new(nrows: usize, byte_size: usize, rows: Vec<u32>, vals: Vec<u8>) -> SplaResult<Self> {
        if vals.len() != rows.len() * byte_size {
            return Err(SplaError::invalid_argument(format!(
                "Vector block value array has {} bytes, expected {} entries of {} bytes",
                vals.len(),
                rows.len(),
                byte_size
            )));
        }
        if let Some(&last) = rows.last() {
            if last as usize >= nrows {
                return Err(SplaError::invalid_argument(format!(
                    "Vector block index {} out of bounds for size {}",
                    last, nrows
                )));
            }
        }
        if rows.windows(2).any(|w| w[0] >= w[1]) {
            return Err(SplaError::invalid_argument(
                "Vector block indices must be strictly increasing",
            ));
        }

        Ok(Self::from_parts(nrows, byte_size, rows, vals))
    }

    /// Construct without validation; kernels guarantee the invariants themselves.
    pub(crate) fn from_parts(nrows: usize, byte_size: usize, rows: Vec<u32>, vals: Vec<u8>) -> Self {
        Self {
            nrows,
            byte_size,
            rows,
            vals,
        }
    }

    pub fn empty(nrows: usize, byte_size: usize) -> Self {
        Self::from_parts(nrows, byte_size, Vec::new(), Vec::new())
    }

    /// Build from `(index, value)` pairs sorted by index.
    pub fn from_typed<T: Element>(nrows: usize, entries: &[(u32, T)]) -> SplaResult<Self> {
        let rows = entries.iter().map(|(i, _)| *i).collect();
        let vals = entries
            .iter()
            .flat_map(|(_, v)| bytemuck::bytes_of(v).iter().copied())
            .collect();
        Self::new(nrows, std::mem::size_of::<T>(), rows, vals)
    }

    /// Structural block holding only indices.
    pub fn from_indices(nrows: usize, rows: Vec<u32>) -> SplaResult<Self> {
        Self::new(nrows, 0, rows, Vec::new())
    }

    pub fn rows(&self) -> &[u32] {
        &self.rows
    }

    pub fn vals(&self) -> &[u8] {
        &self.vals
    }

    pub fn byte_size(&self) -> usize {
        self.byte_size
    }

    pub fn has_values(&self) -> bool {
        self.byte_size > 0
    }

    /// Value bytes of the `k`-th stored entry.
    pub fn value(&self, k: usize) -> &[u8] {
        &self.vals[k * self.byte_size..(k + 1) * self.byte_size]
    }

    /// Typed value stored at `index`, if any.
    pub fn get<T: Element>(&self, index: u32) -> Option<T> {
        if std::mem::size_of::<T>() != self.byte_size {
            return None;
        }
        let k = self.rows.binary_search(&index).ok()?;
        Some(bytemuck::pod_read_unaligned(self.value(k)))
    }

    /// All entries as typed pairs. Empty if `T` does not match the element size.
    pub fn to_typed<T: Element>(&self) -> Vec<(u32, T)> {
        if std::mem::size_of::<T>() != self.byte_size {
            return Vec::new();
        }
        self.rows
            .iter()
            .enumerate()
            .map(|(k, &i)| (i, bytemuck::pod_read_unaligned(self.value(k))))
            .collect()
    }
}

impl VectorBlock for VectorCoo {
    fn format(&self) -> BlockFormat {
        BlockFormat::Coo
    }

    fn nrows(&self) -> usize {
        self.nrows
    }

    fn nvals(&self) -> usize {
        self.rows.len()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}
