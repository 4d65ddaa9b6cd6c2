// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Storage blocks and the object handles that own them.
//!
//! A block is one stored fragment of a vector or matrix in a concrete runtime
//! format. Algorithms select themselves by inspecting the concrete block type, so
//! blocks are handed around as `Arc<dyn VectorBlock>` / `Arc<dyn MatrixBlock>` and
//! downcast with [`downcast_vector`] / [`downcast_matrix`].

mod matrix_coo;
mod objects;
mod vector_coo;

use std::any::Any;
use std::fmt;
use std::sync::Arc;

pub use matrix_coo::MatrixCoo;
pub use objects::{Matrix, Scalar, Vector};
pub use vector_coo::VectorCoo;

/// Runtime storage format of a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockFormat {
    /// Coordinate list: sorted index arrays plus a parallel value array.
    Coo,
}

impl BlockFormat {
    pub fn name(&self) -> &'static str {
        match self {
            BlockFormat::Coo => "COO",
        }
    }
}

impl fmt::Display for BlockFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A stored vector fragment.
pub trait VectorBlock: fmt::Debug + Send + Sync + 'static {
    fn format(&self) -> BlockFormat;

    fn nrows(&self) -> usize;

    /// Number of stored entries.
    fn nvals(&self) -> usize;

    fn as_any(&self) -> &dyn Any;

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

/// A stored matrix fragment.
pub trait MatrixBlock: fmt::Debug + Send + Sync + 'static {
    fn format(&self) -> BlockFormat;

    fn nrows(&self) -> usize;

    fn ncols(&self) -> usize;

    /// Number of stored entries.
    fn nvals(&self) -> usize;

    fn as_any(&self) -> &dyn Any;

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

/// True if the block's concrete type is `T`.
pub fn is_vector<T: VectorBlock>(block: &Arc<dyn VectorBlock>) -> bool {
    block.as_any().is::<T>()
}

/// True if the block's concrete type is `T`.
pub fn is_matrix<T: MatrixBlock>(block: &Arc<dyn MatrixBlock>) -> bool {
    block.as_any().is::<T>()
}

pub fn downcast_vector<T: VectorBlock>(block: &Arc<dyn VectorBlock>) -> Option<Arc<T>> {
    Arc::clone(block).into_any().downcast::<T>().ok()
}

pub fn downcast_matrix<T: MatrixBlock>(block: &Arc<dyn MatrixBlock>) -> Option<Arc<T>> {
    Arc::clone(block).into_any().downcast::<T>().ok()
}
