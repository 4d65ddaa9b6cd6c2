// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Shared handles for vectors, matrices and scalars.
//!
//! Handles are cheap to clone; every clone refers to the same storage. Expression
//! nodes hold handles to their operands and publish results by replacing the
//! stored block. Readers take a snapshot `Arc` of the current block, so a block
//! is never mutated while referenced.

use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;

use crate::storage::{downcast_matrix, downcast_vector, MatrixBlock, MatrixCoo, VectorBlock, VectorCoo};
use crate::types::{Element, Type};

struct VectorInner {
    nrows: usize,
    ty: Type,
    block: RwLock<Option<Arc<dyn VectorBlock>>>,
}

/// Sparse vector handle.
#[derive(Clone)]
pub struct Vector {
    inner: Arc<VectorInner>,
}

impl Vector {
    pub fn new(nrows: usize, ty: Type) -> Self {
        Self {
            inner: Arc::new(VectorInner {
                nrows,
                ty,
                block: RwLock::new(None),
            }),
        }
    }

    pub fn nrows(&self) -> usize {
        self.inner.nrows
    }

    pub fn ty(&self) -> &Type {
        &self.inner.ty
    }

    /// Snapshot of the current block. `None` means no stored entries.
    pub fn block(&self) -> Option<Arc<dyn VectorBlock>> {
        self.inner.block.read().clone()
    }

    pub fn set_block(&self, block: Option<Arc<dyn VectorBlock>>) {
        *self.inner.block.write() = block;
    }

    pub fn nvals(&self) -> usize {
        self.block().map(|b| b.nvals()).unwrap_or(0)
    }

    /// Current storage as COO, if it is stored in that format.
    pub fn coo(&self) -> Option<Arc<VectorCoo>> {
        self.block().and_then(|b| downcast_vector::<VectorCoo>(&b))
    }

    /// Stored entries as typed pairs.
    pub fn to_typed<T: Element>(&self) -> Vec<(u32, T)> {
        self.coo().map(|b| b.to_typed()).unwrap_or_default()
    }

    /// Stored indices, regardless of values.
    pub fn indices(&self) -> Vec<u32> {
        self.coo().map(|b| b.rows().to_vec()).unwrap_or_default()
    }

    /// True if both handles refer to the same vector.
    pub fn same(&self, other: &Vector) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Vector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Vector")
            .field("nrows", &self.inner.nrows)
            .field("type", &self.inner.ty)
            .field("nvals", &self.nvals())
            .finish()
    }
}

struct MatrixInner {
    nrows: usize,
    ncols: usize,
    ty: Type,
    block: RwLock<Option<Arc<dyn MatrixBlock>>>,
}

/// Sparse matrix handle.
#[derive(Clone)]
pub struct Matrix {
    inner: Arc<MatrixInner>,
}

impl Matrix {
    pub fn new(nrows: usize, ncols: usize, ty: Type) -> Self {
        Self {
            inner: Arc::new(MatrixInner {
                nrows,
                ncols,
                ty,
                block: RwLock::new(None),
            }),
        }
    }

    pub fn nrows(&self) -> usize {
        self.inner.nrows
    }

    pub fn ncols(&self) -> usize {
        self.inner.ncols
    }

    pub fn ty(&self) -> &Type {
        &self.inner.ty
    }

    pub fn block(&self) -> Option<Arc<dyn MatrixBlock>> {
        self.inner.block.read().clone()
    }

    pub fn set_block(&self, block: Option<Arc<dyn MatrixBlock>>) {
        *self.inner.block.write() = block;
    }

    pub fn nvals(&self) -> usize {
        self.block().map(|b| b.nvals()).unwrap_or(0)
    }

    pub fn coo(&self) -> Option<Arc<MatrixCoo>> {
        self.block().and_then(|b| downcast_matrix::<MatrixCoo>(&b))
    }

    pub fn to_typed<T: Element>(&self) -> Vec<(u32, u32, T)> {
        self.coo().map(|b| b.to_typed()).unwrap_or_default()
    }

    pub fn same(&self, other: &Matrix) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Matrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Matrix")
            .field("nrows", &self.inner.nrows)
            .field("ncols", &self.inner.ncols)
            .field("type", &self.inner.ty)
            .field("nvals", &self.nvals())
            .finish()
    }
}

struct ScalarInner {
    ty: Type,
    value: RwLock<Option<Vec<u8>>>,
}

/// Scalar handle; holds at most one element.
#[derive(Clone)]
pub struct Scalar {
    inner: Arc<ScalarInner>,
}

impl Scalar {
    pub fn new(ty: Type) -> Self {
        Self {
            inner: Arc::new(ScalarInner {
                ty,
                value: RwLock::new(None),
            }),
        }
    }

    pub fn from_value<T: Element>(value: T) -> Self {
        let scalar = Self::new(Type::of::<T>());
        scalar.set_bytes(Some(bytemuck::bytes_of(&value).to_vec()));
        scalar
    }

    pub fn ty(&self) -> &Type {
        &self.inner.ty
    }

    pub fn bytes(&self) -> Option<Vec<u8>> {
        self.inner.value.read().clone()
    }

    pub fn set_bytes(&self, value: Option<Vec<u8>>) {
        *self.inner.value.write() = value;
    }

    pub fn has_value(&self) -> bool {
        self.inner.value.read().is_some()
    }

    pub fn get<T: Element>(&self) -> Option<T> {
        let guard = self.inner.value.read();
        let bytes = guard.as_ref()?;
        if bytes.len() != std::mem::size_of::<T>() {
            return None;
        }
        Some(bytemuck::pod_read_unaligned(bytes))
    }
}

impl fmt::Debug for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scalar")
            .field("type", &self.inner.ty)
            .field("has_value", &self.has_value())
            .finish()
    }
}
