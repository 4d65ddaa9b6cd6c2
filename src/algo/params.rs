// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::fmt;
use std::sync::Arc;

use crate::device::DeviceId;
use crate::errors::{SplaError, SplaResult};
use crate::storage::{MatrixBlock, VectorBlock};
use crate::types::{Descriptor, FunctionBinary, Type};

/// Operation kinds algorithms are registered under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AlgorithmType {
    MatrixEWiseAdd,
    VectorEWiseAdd,
    MxM,
    VxM,
    VectorAssign,
    Transpose,
    VectorReduce,
}

impl AlgorithmType {
    pub fn name(&self) -> &'static str {
        match self {
            AlgorithmType::MatrixEWiseAdd => "MatrixEWiseAdd",
            AlgorithmType::VectorEWiseAdd => "VectorEWiseAdd",
            AlgorithmType::MxM => "MxM",
            AlgorithmType::VxM => "VxM",
            AlgorithmType::VectorAssign => "VectorAssign",
            AlgorithmType::Transpose => "Transpose",
            AlgorithmType::VectorReduce => "VectorReduce",
        }
    }
}

impl fmt::Display for AlgorithmType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Element-wise matrix addition `w<mask> = a + b`.
#[derive(Debug, Clone)]
pub struct ParamsMatrixEWiseAdd {
    pub has_mask: bool,
    pub w: Option<Arc<dyn MatrixBlock>>,
    pub mask: Option<Arc<dyn MatrixBlock>>,
    pub op: FunctionBinary,
    pub a: Option<Arc<dyn MatrixBlock>>,
    pub b: Option<Arc<dyn MatrixBlock>>,
    pub nrows: usize,
    pub ncols: usize,
    pub ty: Type,
}

/// Element-wise vector addition `w<mask> = a + b`.
#[derive(Debug, Clone)]
pub struct ParamsVectorEWiseAdd {
    pub has_mask: bool,
    pub w: Option<Arc<dyn VectorBlock>>,
    pub mask: Option<Arc<dyn VectorBlock>>,
    pub op: FunctionBinary,
    pub a: Option<Arc<dyn VectorBlock>>,
    pub b: Option<Arc<dyn VectorBlock>>,
    pub nrows: usize,
    pub ty: Type,
}

/// Matrix-matrix multiply `w<mask> = a x b`.
#[derive(Debug, Clone)]
pub struct ParamsMxM {
    pub has_mask: bool,
    pub w: Option<Arc<dyn MatrixBlock>>,
    pub mask: Option<Arc<dyn MatrixBlock>>,
    /// `ta x tb -> tw`
    pub mult: FunctionBinary,
    /// `tw x tw -> tw`
    pub add: FunctionBinary,
    pub a: Option<Arc<dyn MatrixBlock>>,
    pub b: Option<Arc<dyn MatrixBlock>>,
    pub nrows: usize,
    pub ncols: usize,
    pub ta: Type,
    pub tb: Type,
    pub tw: Type,
}

/// Vector-matrix multiply `w<mask> = a x b`.
#[derive(Debug, Clone)]
pub struct ParamsVxM {
    pub has_mask: bool,
    pub w: Option<Arc<dyn VectorBlock>>,
    pub mask: Option<Arc<dyn VectorBlock>>,
    /// `ta x tb -> tw`
    pub mult: FunctionBinary,
    /// `tw x tw -> tw`
    pub add: FunctionBinary,
    pub a: Option<Arc<dyn VectorBlock>>,
    pub b: Option<Arc<dyn MatrixBlock>>,
    /// Size of the output, the column count of `b`.
    pub ncols: usize,
    pub ta: Type,
    pub tb: Type,
    pub tw: Type,
}

/// Scalar assignment `w<mask> = s`.
#[derive(Debug, Clone)]
pub struct ParamsVectorAssign {
    pub size: usize,
    pub has_mask: bool,
    pub w: Option<Arc<dyn VectorBlock>>,
    pub mask: Option<Arc<dyn VectorBlock>>,
    /// Value bytes, `None` for structural types.
    pub s: Option<Vec<u8>>,
    pub ty: Type,
}

/// Transpose `w<mask> = a^T`; the mask applies to the transposed result.
#[derive(Debug, Clone)]
pub struct ParamsTranspose {
    pub has_mask: bool,
    pub mask: Option<Arc<dyn MatrixBlock>>,
    pub w: Option<Arc<dyn MatrixBlock>>,
    pub a: Option<Arc<dyn MatrixBlock>>,
    /// Shape of `a`.
    pub nrows: usize,
    pub ncols: usize,
    pub ty: Type,
}

/// Fold of every stored value of `vec` with `reduce`.
#[derive(Debug, Clone)]
pub struct ParamsVectorReduce {
    pub vec: Option<Arc<dyn VectorBlock>>,
    pub reduce: FunctionBinary,
    /// Output, `None` when the vector held nothing to fold.
    pub scalar: Option<Vec<u8>>,
    pub ty: Type,
}

/// Operation-specific payload.
#[derive(Debug, Clone)]
pub enum OpParams {
    MatrixEWiseAdd(ParamsMatrixEWiseAdd),
    VectorEWiseAdd(ParamsVectorEWiseAdd),
    MxM(ParamsMxM),
    VxM(ParamsVxM),
    VectorAssign(ParamsVectorAssign),
    Transpose(ParamsTranspose),
    VectorReduce(ParamsVectorReduce),
}

/// Everything an algorithm needs to run one node.
///
/// Created by a processor's sub-task, consumed by exactly one algorithm, and
/// dropped once the output block has been published.
#[derive(Debug, Clone)]
pub struct AlgorithmParams {
    pub desc: Descriptor,
    pub device_id: DeviceId,
    pub op: OpParams,
}

macro_rules! params_accessors {
    ($($variant:ident => $params:ident, $get:ident, $get_mut:ident;)+) => {
        impl AlgorithmParams {
            $(
                pub fn $get(&self) -> SplaResult<&$params> {
                    match &self.op {
                        OpParams::$variant(p) => Ok(p),
                        other => Err(mismatch(AlgorithmType::$variant, other)),
                    }
                }

                pub fn $get_mut(&mut self) -> SplaResult<&mut $params> {
                    match &mut self.op {
                        OpParams::$variant(p) => Ok(p),
                        other => Err(mismatch(AlgorithmType::$variant, other)),
                    }
                }
            )+
        }
    };
}

params_accessors! {
    MatrixEWiseAdd => ParamsMatrixEWiseAdd, matrix_ewise_add, matrix_ewise_add_mut;
    VectorEWiseAdd => ParamsVectorEWiseAdd, vector_ewise_add, vector_ewise_add_mut;
    MxM => ParamsMxM, mxm, mxm_mut;
    VxM => ParamsVxM, vxm, vxm_mut;
    VectorAssign => ParamsVectorAssign, vector_assign, vector_assign_mut;
    Transpose => ParamsTranspose, transpose, transpose_mut;
    VectorReduce => ParamsVectorReduce, vector_reduce, vector_reduce_mut;
}

fn mismatch(expected: AlgorithmType, found: &OpParams) -> SplaError {
    SplaError::invalid_argument(format!(
        "Expected {} params, found {}",
        expected,
        found.algorithm_type()
    ))
}

impl OpParams {
    pub fn algorithm_type(&self) -> AlgorithmType {
        match self {
            OpParams::MatrixEWiseAdd(_) => AlgorithmType::MatrixEWiseAdd,
            OpParams::VectorEWiseAdd(_) => AlgorithmType::VectorEWiseAdd,
            OpParams::MxM(_) => AlgorithmType::MxM,
            OpParams::VxM(_) => AlgorithmType::VxM,
            OpParams::VectorAssign(_) => AlgorithmType::VectorAssign,
            OpParams::Transpose(_) => AlgorithmType::Transpose,
            OpParams::VectorReduce(_) => AlgorithmType::VectorReduce,
        }
    }
}

impl AlgorithmParams {
    pub fn new(desc: Descriptor, device_id: DeviceId, op: OpParams) -> Self {
        Self {
            desc,
            device_id,
            op,
        }
    }

    pub fn algorithm_type(&self) -> AlgorithmType {
        self.op.algorithm_type()
    }

    /// Every vector operand block that is present.
    pub fn vector_blocks(&self) -> Vec<&Arc<dyn VectorBlock>> {
        let blocks = match &self.op {
            OpParams::VectorEWiseAdd(p) => vec![&p.w, &p.mask, &p.a, &p.b],
            OpParams::VxM(p) => vec![&p.w, &p.mask, &p.a],
            OpParams::VectorAssign(p) => vec![&p.w, &p.mask],
            OpParams::VectorReduce(p) => vec![&p.vec],
            _ => Vec::new(),
        };
        blocks.into_iter().flatten().collect()
    }

    /// Every matrix operand block that is present.
    pub fn matrix_blocks(&self) -> Vec<&Arc<dyn MatrixBlock>> {
        let blocks = match &self.op {
            OpParams::MatrixEWiseAdd(p) => vec![&p.w, &p.mask, &p.a, &p.b],
            OpParams::MxM(p) => vec![&p.w, &p.mask, &p.a, &p.b],
            OpParams::VxM(p) => vec![&p.b],
            OpParams::Transpose(p) => vec![&p.w, &p.mask, &p.a],
            _ => Vec::new(),
        };
        blocks.into_iter().flatten().collect()
    }
}
