// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::fmt;

use crate::storage::{Matrix, Scalar, Vector};
use crate::types::{Descriptor, FunctionBinary};

/// Operation vocabulary processors are registered under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Operation {
    MatrixDataWrite,
    VectorDataWrite,
    MatrixEWiseAdd,
    VectorEWiseAdd,
    MxM,
    VxM,
    VectorAssign,
    MatrixTranspose,
    VectorReduce,
}

impl Operation {
    pub const ALL: [Operation; 9] = [
        Operation::MatrixDataWrite,
        Operation::VectorDataWrite,
        Operation::MatrixEWiseAdd,
        Operation::VectorEWiseAdd,
        Operation::MxM,
        Operation::VxM,
        Operation::VectorAssign,
        Operation::MatrixTranspose,
        Operation::VectorReduce,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Operation::MatrixDataWrite => "MatrixDataWrite",
            Operation::VectorDataWrite => "VectorDataWrite",
            Operation::MatrixEWiseAdd => "MatrixEWiseAdd",
            Operation::VectorEWiseAdd => "VectorEWiseAdd",
            Operation::MxM => "MxM",
            Operation::VxM => "VxM",
            Operation::VectorAssign => "VectorAssign",
            Operation::MatrixTranspose => "MatrixTranspose",
            Operation::VectorReduce => "VectorReduce",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Operands of one node. The variant decides the node's [`Operation`].
#[derive(Debug, Clone)]
pub enum NodeArgs {
    /// Raw entries written into `target`. `vals` holds one element per entry, or
    /// nothing for structural targets.
    MatrixDataWrite {
        target: Matrix,
        rows: Vec<u32>,
        cols: Vec<u32>,
        vals: Vec<u8>,
    },
    VectorDataWrite {
        target: Vector,
        rows: Vec<u32>,
        vals: Vec<u8>,
    },
    MatrixEWiseAdd {
        w: Matrix,
        mask: Option<Matrix>,
        op: FunctionBinary,
        a: Matrix,
        b: Matrix,
    },
    VectorEWiseAdd {
        w: Vector,
        mask: Option<Vector>,
        op: FunctionBinary,
        a: Vector,
        b: Vector,
    },
    MxM {
        w: Matrix,
        mask: Option<Matrix>,
        mult: FunctionBinary,
        add: FunctionBinary,
        a: Matrix,
        b: Matrix,
    },
    VxM {
        w: Vector,
        mask: Option<Vector>,
        mult: FunctionBinary,
        add: FunctionBinary,
        a: Vector,
        b: Matrix,
    },
    VectorAssign {
        w: Vector,
        mask: Option<Vector>,
        s: Scalar,
    },
    MatrixTranspose {
        w: Matrix,
        mask: Option<Matrix>,
        a: Matrix,
    },
    VectorReduce {
        s: Scalar,
        reduce: FunctionBinary,
        v: Vector,
    },
}

impl NodeArgs {
    pub fn operation(&self) -> Operation {
        match self {
            NodeArgs::MatrixDataWrite { .. } => Operation::MatrixDataWrite,
            NodeArgs::VectorDataWrite { .. } => Operation::VectorDataWrite,
            NodeArgs::MatrixEWiseAdd { .. } => Operation::MatrixEWiseAdd,
            NodeArgs::VectorEWiseAdd { .. } => Operation::VectorEWiseAdd,
            NodeArgs::MxM { .. } => Operation::MxM,
            NodeArgs::VxM { .. } => Operation::VxM,
            NodeArgs::VectorAssign { .. } => Operation::VectorAssign,
            NodeArgs::MatrixTranspose { .. } => Operation::MatrixTranspose,
            NodeArgs::VectorReduce { .. } => Operation::VectorReduce,
        }
    }
}

/// One operation instance inside an [`Expression`](crate::expression::Expression).
///
/// Edges are node indices owned by the expression; nodes never own each other.
#[derive(Debug, Clone)]
pub struct ExpressionNode {
    pub(crate) idx: usize,
    pub(crate) prev: Vec<usize>,
    pub(crate) next: Vec<usize>,
    pub(crate) args: NodeArgs,
    pub(crate) desc: Descriptor,
}

impl ExpressionNode {
    pub fn idx(&self) -> usize {
        self.idx
    }

    pub fn operation(&self) -> Operation {
        self.args.operation()
    }

    /// Nodes this one depends on.
    pub fn prev(&self) -> &[usize] {
        &self.prev
    }

    /// Nodes depending on this one.
    pub fn next(&self) -> &[usize] {
        &self.next
    }

    pub fn args(&self) -> &NodeArgs {
        &self.args
    }

    pub fn desc(&self) -> &Descriptor {
        &self.desc
    }
}
