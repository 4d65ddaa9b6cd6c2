// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::any::Any;
use std::sync::Arc;

use crate::errors::{SplaError, SplaResult};
use crate::storage::{BlockFormat, MatrixBlock};
use crate::types::Element;

/// Coordinate-list matrix block, entries sorted by `(row, col)` without duplicates.
#[derive(Debug, Clone, PartialEq)]
pub struct MatrixCoo {
    nrows: usize,
    ncols: usize,
    byte_size: usize,
    rows: Vec<u32>,
    cols: Vec<u32>,
    vals: Vec<u8>,
}

impl MatrixCoo {
    pub fn new(
        nrows: usize,
        ncols: usize,
        byte_size: usize,
        rows: Vec<u32>,
        cols: Vec<u32>,
        vals: Vec<u8>,
    ) -> SplaResult<Self> {
        if rows.len() != cols.len() {
            return Err(SplaError::invalid_argument(format!(
                "Matrix block has {} row indices but {} column indices",
                rows.len(),
                cols.len()
            )));
        }
        if vals.len() != rows.len() * byte_size {
            return Err(SplaError::invalid_argument(format!(
                "Matrix block value array has {} bytes, expected {} entries of {} bytes",
                vals.len(),
                rows.len(),
                byte_size
            )));
        }
        for (&i, &j) in rows.iter().zip(&cols) {
            if i as usize >= nrows || j as usize >= ncols {
                return Err(SplaError::invalid_argument(format!(
                    "Matrix block entry ({}, {}) out of bounds for shape {}x{}",
                    i, j, nrows, ncols
                )));
            }
        }
        let keys_sorted = rows
            .iter()
            .zip(&cols)
            .zip(rows.iter().zip(&cols).skip(1))
            .all(|(prev, next)| prev < next);
        if !keys_sorted {
            return Err(SplaError::invalid_argument(
                "Matrix block entries must be strictly increasing by (row, col)",
            ));
        }

        Ok(Self::from_parts(nrows, ncols, byte_size, rows, cols, vals))
    }

    pub(crate) fn from_parts(
        nrows: usize,
        ncols: usize,
        byte_size: usize,
        rows: Vec<u32>,
        cols: Vec<u32>,
        vals: Vec<u8>,
    ) -> Self {
        Self {
            nrows,
            ncols,
            byte_size,
            rows,
            cols,
            vals,
        }
    }

    pub fn empty(nrows: usize, ncols: usize, byte_size: usize) -> Self {
        Self::from_parts(nrows, ncols, byte_size, Vec::new(), Vec::new(), Vec::new())
    }

    /// Build from `(row, col, value)` triples sorted by `(row, col)`.
    pub fn from_typed<T: Element>(nrows: usize, ncols: usize, entries: &[(u32, u32, T)]) -> SplaResult<Self> {
        let rows = entries.iter().map(|(i, _, _)| *i).collect();
        let cols = entries.iter().map(|(_, j, _)| *j).collect();
        let vals = entries
            .iter()
            .flat_map(|(_, _, v)| bytemuck::bytes_of(v).iter().copied())
            .collect();
        Self::new(nrows, ncols, std::mem::size_of::<T>(), rows, cols, vals)
    }

    pub fn rows(&self) -> &[u32] {
        &self.rows
    }

    pub fn cols(&self) -> &[u32] {
        &self.cols
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

    pub fn get<T: Element>(&self, row: u32, col: u32) -> Option<T> {
        if std::mem::size_of::<T>() != self.byte_size {
            return None;
        }
        let k = self.position(row, col)?;
        Some(bytemuck::pod_read_unaligned(self.value(k)))
    }

    /// Index of the entry `(row, col)` in the coordinate arrays.
    pub fn position(&self, row: u32, col: u32) -> Option<usize> {
        let start = self.rows.partition_point(|&r| r < row);
        let end = self.rows.partition_point(|&r| r <= row);
        self.cols[start..end]
            .binary_search(&col)
            .ok()
            .map(|offset| start + offset)
    }

    pub fn to_typed<T: Element>(&self) -> Vec<(u32, u32, T)> {
        if std::mem::size_of::<T>() != self.byte_size {
            return Vec::new();
        }
        (0..self.rows.len())
            .map(|k| {
                (
                    self.rows[k],
                    self.cols[k],
                    bytemuck::pod_read_unaligned(self.value(k)),
                )
            })
            .collect()
    }
}

impl MatrixBlock for MatrixCoo {
    fn format(&self) -> BlockFormat {
        BlockFormat::Coo
    }

    fn nrows(&self) -> usize {
        self.nrows
    }

    fn ncols(&self) -> usize {
        self.ncols
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
