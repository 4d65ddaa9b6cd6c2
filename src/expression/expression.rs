// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::errors::{SplaError, SplaResult};
use crate::expression::node::{ExpressionNode, NodeArgs};
use crate::storage::{Matrix, Scalar, Vector};
use crate::types::{Descriptor, Element, FunctionBinary, Type};

/// Lifecycle of an expression. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExpressionState {
    /// Under construction; the only state accepted by submission.
    Default,
    /// Accepted for evaluation.
    Submitted,
    /// Every node ran successfully.
    Evaluated,
    /// Validation, dispatch or execution failed after submission.
    Failed,
}

/// A lazily evaluated graph of operations.
///
/// Nodes are appended with the `make_*` builders, which return the new node's
/// index, and ordered with [`dependency`](Self::dependency). Nothing runs until the
/// expression is submitted to a [`Library`](crate::Library).
///
/// ```
/// use spla_flow::expression::{Expression, ExpressionState};
/// use spla_flow::storage::Vector;
/// use spla_flow::types::{Descriptor, Type};
///
/// let v = Vector::new(4, Type::of::<i32>());
/// let mut expression = Expression::new("fill");
/// let write = expression
///     .make_vector_write_typed(&v, &[(0u32, 1i32), (3, 2)], Descriptor::new())
///     .unwrap();
///
/// assert_eq!(write, 0);
/// assert_eq!(expression.state(), ExpressionState::Default);
/// ```
#[derive(Debug, Clone)]
pub struct Expression {
    label: String,
    nodes: Vec<ExpressionNode>,
    state: ExpressionState,
}

impl Expression {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            nodes: Vec::new(),
            state: ExpressionState::Default,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn state(&self) -> ExpressionState {
        self.state
    }

    pub(crate) fn set_state(&mut self, state: ExpressionState) {
        self.state = state;
    }

    pub fn nodes(&self) -> &[ExpressionNode] {
        &self.nodes
    }

    pub fn node(&self, idx: usize) -> Option<&ExpressionNode> {
        self.nodes.get(idx)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Declare that node `pred` must complete before node `succ` starts.
    pub fn dependency(&mut self, pred: usize, succ: usize) -> SplaResult<()> {
        self.check_modifiable()?;
        for idx in [pred, succ] {
            if idx >= self.nodes.len() {
                return Err(SplaError::invalid_argument(format!(
                    "Node {} does not exist in expression={} with {} nodes",
                    idx,
                    self.label,
                    self.nodes.len()
                )));
            }
        }

        if !self.nodes[pred].next.contains(&succ) {
            self.nodes[pred].next.push(succ);
            self.nodes[succ].prev.push(pred);
        }
        Ok(())
    }

    pub fn make_vector_write(
        &mut self,
        target: &Vector,
        rows: Vec<u32>,
        vals: Vec<u8>,
        desc: Descriptor,
    ) -> SplaResult<usize> {
        check_values(target.ty(), rows.len(), vals.len())?;
        self.add_node(
            NodeArgs::VectorDataWrite {
                target: target.clone(),
                rows,
                vals,
            },
            desc,
        )
    }

    pub fn make_vector_write_typed<T: Element>(
        &mut self,
        target: &Vector,
        entries: &[(u32, T)],
        desc: Descriptor,
    ) -> SplaResult<usize> {
        check_element::<T>(target.ty())?;
        let rows = entries.iter().map(|(i, _)| *i).collect();
        let vals = entries
            .iter()
            .flat_map(|(_, v)| bytemuck::bytes_of(v).iter().copied())
            .collect();
        self.make_vector_write(target, rows, vals, desc)
    }

    pub fn make_matrix_write(
        &mut self,
        target: &Matrix,
        rows: Vec<u32>,
        cols: Vec<u32>,
        vals: Vec<u8>,
        desc: Descriptor,
    ) -> SplaResult<usize> {
        if rows.len() != cols.len() {
            return Err(SplaError::invalid_argument(format!(
                "Matrix write has {} row indices but {} column indices",
                rows.len(),
                cols.len()
            )));
        }
        check_values(target.ty(), rows.len(), vals.len())?;
        self.add_node(
            NodeArgs::MatrixDataWrite {
                target: target.clone(),
                rows,
                cols,
                vals,
            },
            desc,
        )
    }

    pub fn make_matrix_write_typed<T: Element>(
        &mut self,
        target: &Matrix,
        entries: &[(u32, u32, T)],
        desc: Descriptor,
    ) -> SplaResult<usize> {
        check_element::<T>(target.ty())?;
        let rows = entries.iter().map(|(i, _, _)| *i).collect();
        let cols = entries.iter().map(|(_, j, _)| *j).collect();
        let vals = entries
            .iter()
            .flat_map(|(_, _, v)| bytemuck::bytes_of(v).iter().copied())
            .collect();
        self.make_matrix_write(target, rows, cols, vals, desc)
    }

    /// `w<mask> = a + b` over matrices.
    pub fn make_matrix_ewise_add(
        &mut self,
        w: &Matrix,
        mask: Option<&Matrix>,
        op: &FunctionBinary,
        a: &Matrix,
        b: &Matrix,
        desc: Descriptor,
    ) -> SplaResult<usize> {
        self.add_node(
            NodeArgs::MatrixEWiseAdd {
                w: w.clone(),
                mask: mask.cloned(),
                op: op.clone(),
                a: a.clone(),
                b: b.clone(),
            },
            desc,
        )
    }

    /// `w<mask> = a + b` over vectors.
    pub fn make_vector_ewise_add(
        &mut self,
        w: &Vector,
        mask: Option<&Vector>,
        op: &FunctionBinary,
        a: &Vector,
        b: &Vector,
        desc: Descriptor,
    ) -> SplaResult<usize> {
        self.add_node(
            NodeArgs::VectorEWiseAdd {
                w: w.clone(),
                mask: mask.cloned(),
                op: op.clone(),
                a: a.clone(),
                b: b.clone(),
            },
            desc,
        )
    }

    /// `w<mask> = a x b` with `mult` as product and `add` as sum.
    #[allow(clippy::too_many_arguments)]
    pub fn make_mxm(
        &mut self,
        w: &Matrix,
        mask: Option<&Matrix>,
        mult: &FunctionBinary,
        add: &FunctionBinary,
        a: &Matrix,
        b: &Matrix,
        desc: Descriptor,
    ) -> SplaResult<usize> {
        self.add_node(
            NodeArgs::MxM {
                w: w.clone(),
                mask: mask.cloned(),
                mult: mult.clone(),
                add: add.clone(),
                a: a.clone(),
                b: b.clone(),
            },
            desc,
        )
    }

    /// `w<mask> = a x b` with `mult` as product and `add` as sum.
    #[allow(clippy::too_many_arguments)]
    pub fn make_vxm(
        &mut self,
        w: &Vector,
        mask: Option<&Vector>,
        mult: &FunctionBinary,
        add: &FunctionBinary,
        a: &Vector,
        b: &Matrix,
        desc: Descriptor,
    ) -> SplaResult<usize> {
        self.add_node(
            NodeArgs::VxM {
                w: w.clone(),
                mask: mask.cloned(),
                mult: mult.clone(),
                add: add.clone(),
                a: a.clone(),
                b: b.clone(),
            },
            desc,
        )
    }

    /// `w<mask> = s`
    pub fn make_vector_assign(
        &mut self,
        w: &Vector,
        mask: Option<&Vector>,
        s: &Scalar,
        desc: Descriptor,
    ) -> SplaResult<usize> {
        self.add_node(
            NodeArgs::VectorAssign {
                w: w.clone(),
                mask: mask.cloned(),
                s: s.clone(),
            },
            desc,
        )
    }

    /// `w<mask> = a^T`
    pub fn make_matrix_transpose(
        &mut self,
        w: &Matrix,
        mask: Option<&Matrix>,
        a: &Matrix,
        desc: Descriptor,
    ) -> SplaResult<usize> {
        self.add_node(
            NodeArgs::MatrixTranspose {
                w: w.clone(),
                mask: mask.cloned(),
                a: a.clone(),
            },
            desc,
        )
    }

    /// `s = reduce(v)`
    pub fn make_vector_reduce(
        &mut self,
        s: &Scalar,
        reduce: &FunctionBinary,
        v: &Vector,
        desc: Descriptor,
    ) -> SplaResult<usize> {
        self.add_node(
            NodeArgs::VectorReduce {
                s: s.clone(),
                reduce: reduce.clone(),
                v: v.clone(),
            },
            desc,
        )
    }

    fn add_node(&mut self, args: NodeArgs, desc: Descriptor) -> SplaResult<usize> {
        self.check_modifiable()?;
        let idx = self.nodes.len();
        self.nodes.push(ExpressionNode {
            idx,
            prev: Vec::new(),
            next: Vec::new(),
            args,
            desc,
        });
        Ok(idx)
    }

    fn check_modifiable(&self) -> SplaResult<()> {
        if self.state != ExpressionState::Default {
            return Err(SplaError::invalid_state(format!(
                "Expression={} is {:?} and can no longer be modified",
                self.label, self.state
            )));
        }
        Ok(())
    }
}

fn check_element<T: Element>(ty: &Type) -> SplaResult<()> {
    if !ty.is::<T>() {
        return Err(SplaError::invalid_argument(format!(
            "Cannot write '{}' values into an object of type '{}'",
            T::NAME,
            ty
        )));
    }
    Ok(())
}

fn check_values(ty: &Type, entries: usize, value_bytes: usize) -> SplaResult<()> {
    if value_bytes != entries * ty.byte_size() {
        return Err(SplaError::invalid_argument(format!(
            "Write of {} entries of type '{}' needs {} value bytes, got {}",
            entries,
            ty,
            entries * ty.byte_size(),
            value_bytes
        )));
    }
    Ok(())
}
