// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! YAML description of an expression and the objects it works on.
//!
//! ```yaml
//! label: vxm-demo
//! objects:
//!   a: { kind: vector, type: i32, size: 3, indices: [0, 2], values: [2, 3] }
//!   b: { kind: matrix, type: i32, nrows: 3, ncols: 4,
//!        rows: [0, 2, 2], cols: [1, 1, 3], values: [5, 7, 11] }
//!   w: { kind: vector, type: i32, size: 4 }
//! nodes:
//!   - id: product
//!     op: vxm
//!     out: w
//!     a: a
//!     b: b
//!     mult: times
//!     add: plus
//! ```
//!
//! Objects declared with initial data get a data-write node. Every operation node
//! depends on the write nodes of the objects it reads, plus whatever it names in
//! `depends_on`.

use serde::Deserialize;
use serde_json::json;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

use crate::config::consts::DEFAULT_EXPRESSION_LABEL;
use crate::errors::ConfigError;
use crate::expression::Expression;
use crate::storage::{Matrix, Scalar, Vector};
use crate::types::{Descriptor, DescriptorParam, Element, FunctionBinary, Type};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExpressionFile {
    pub label: Option<String>,
    #[serde(default)]
    pub objects: BTreeMap<String, ObjectSpec>,
    #[serde(default)]
    pub nodes: Vec<NodeSpec>,
}

/// A named vector, matrix or scalar. `type` defaults to `void` for vectors and
/// matrices.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ObjectSpec {
    Vector {
        #[serde(rename = "type", default = "void_type")]
        ty: String,
        size: usize,
        #[serde(default)]
        indices: Vec<u32>,
        #[serde(default)]
        values: Vec<f64>,
    },
    Matrix {
        #[serde(rename = "type", default = "void_type")]
        ty: String,
        nrows: usize,
        ncols: usize,
        #[serde(default)]
        rows: Vec<u32>,
        #[serde(default)]
        cols: Vec<u32>,
        #[serde(default)]
        values: Vec<f64>,
    },
    Scalar {
        #[serde(rename = "type")]
        ty: String,
        value: Option<f64>,
    },
}

fn void_type() -> String {
    "void".to_string()
}

/// One operation node.
///
/// `out` names the output object (the scalar for `vector_reduce`). `function`
/// is the element-wise or reduce function, `mult`/`add` the semiring of
/// `mxm`/`vxm`. Functions are built-ins named for the output's element type.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NodeSpec {
    pub id: String,
    pub op: String,
    pub out: String,
    pub a: Option<String>,
    pub b: Option<String>,
    pub scalar: Option<String>,
    pub mask: Option<String>,
    #[serde(default)]
    pub complement: bool,
    pub function: Option<String>,
    pub mult: Option<String>,
    pub add: Option<String>,
    #[serde(default)]
    pub depends_on: Vec<String>,
}

/// A shared handle to one declared object.
#[derive(Debug, Clone)]
pub enum Object {
    Vector(Vector),
    Matrix(Matrix),
    Scalar(Scalar),
}

impl Object {
    /// Current contents as JSON.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Object::Vector(v) => {
                let (indices, values) = match v.coo() {
                    Some(coo) => (coo.rows().to_vec(), decode_values(v.ty(), coo.vals())),
                    None => (Vec::new(), Vec::new()),
                };
                json!({
                    "kind": "vector",
                    "type": v.ty().name(),
                    "size": v.nrows(),
                    "indices": indices,
                    "values": values,
                })
            }
            Object::Matrix(m) => {
                let (rows, cols, values) = match m.coo() {
                    Some(coo) => (
                        coo.rows().to_vec(),
                        coo.cols().to_vec(),
                        decode_values(m.ty(), coo.vals()),
                    ),
                    None => (Vec::new(), Vec::new(), Vec::new()),
                };
                json!({
                    "kind": "matrix",
                    "type": m.ty().name(),
                    "nrows": m.nrows(),
                    "ncols": m.ncols(),
                    "rows": rows,
                    "cols": cols,
                    "values": values,
                })
            }
            Object::Scalar(s) => {
                let value = s
                    .bytes()
                    .and_then(|bytes| decode_values(s.ty(), &bytes).into_iter().next());
                json!({
                    "kind": "scalar",
                    "type": s.ty().name(),
                    "value": value,
                })
            }
        }
    }
}

/// Output of [`ExpressionFile::build`].
#[derive(Debug)]
pub struct BuiltExpression {
    pub expression: Expression,
    pub objects: BTreeMap<String, Object>,
    /// Node index of every named operation node.
    pub node_ids: HashMap<String, usize>,
}

impl BuiltExpression {
    pub fn to_json(&self) -> serde_json::Value {
        let objects: serde_json::Map<String, serde_json::Value> = self
            .objects
            .iter()
            .map(|(name, object)| (name.clone(), object.to_json()))
            .collect();
        json!({
            "label": self.expression.label(),
            "state": format!("{:?}", self.expression.state()),
            "objects": objects,
        })
    }
}

impl ExpressionFile {
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&content)
    }

    /// Create the objects and the expression that computes them.
    pub fn build(&self) -> Result<BuiltExpression, ConfigError> {
        let label = self.label.as_deref().unwrap_or(DEFAULT_EXPRESSION_LABEL);
        let mut expression = Expression::new(label);
        let mut objects = BTreeMap::new();
        let mut writers: HashMap<&str, usize> = HashMap::new();

        for (name, spec) in &self.objects {
            let (object, writer) = create_object(name, spec, &mut expression)?;
            if let Some(idx) = writer {
                writers.insert(name.as_str(), idx);
            }
            objects.insert(name.clone(), object);
        }

        let mut node_ids = HashMap::new();
        for node in &self.nodes {
            let idx = add_operation(node, &objects, &mut expression)?;
            if node_ids.insert(node.id.clone(), idx).is_some() {
                return Err(ConfigError::Invalid(format!("Duplicate node id '{}'", node.id)));
            }
            for read in node.reads() {
                if let Some(&writer) = writers.get(read) {
                    expression.dependency(writer, idx)?;
                }
            }
        }

        for node in &self.nodes {
            let idx = node_ids[&node.id];
            for dep in &node.depends_on {
                let &pred = node_ids.get(dep).ok_or_else(|| {
                    ConfigError::Invalid(format!(
                        "Node '{}' depends on '{}' which does not exist",
                        node.id, dep
                    ))
                })?;
                expression.dependency(pred, idx)?;
            }
        }

        Ok(BuiltExpression {
            expression,
            objects,
            node_ids,
        })
    }
}

impl NodeSpec {
    /// Names of the objects this node reads.
    fn reads(&self) -> impl Iterator<Item = &str> {
        [&self.a, &self.b, &self.scalar, &self.mask]
            .into_iter()
            .flatten()
            .map(String::as_str)
    }

    fn descriptor(&self) -> Descriptor {
        let mut desc = Descriptor::new();
        if self.complement {
            desc.set_param(DescriptorParam::MaskComplement);
        }
        desc
    }

    fn operand<'o>(&self, field: &str, name: &'o Option<String>) -> Result<&'o str, ConfigError> {
        name.as_deref().ok_or_else(|| {
            ConfigError::Invalid(format!("Node '{}' ({}) needs '{}'", self.id, self.op, field))
        })
    }

    fn function(&self, field: &str, name: &Option<String>, ty: &Type) -> Result<FunctionBinary, ConfigError> {
        let name = self.operand(field, name)?;
        Ok(FunctionBinary::builtin(name, ty)?)
    }
}

fn create_object(
    name: &str,
    spec: &ObjectSpec,
    expression: &mut Expression,
) -> Result<(Object, Option<usize>), ConfigError> {
    match spec {
        ObjectSpec::Vector {
            ty,
            size,
            indices,
            values,
        } => {
            let ty = Type::by_name(ty)?;
            let vector = Vector::new(*size, ty.clone());
            let writer = if indices.is_empty() {
                None
            } else {
                let vals = encode_values(name, &ty, indices.len(), values)?;
                Some(expression.make_vector_write(&vector, indices.clone(), vals, Descriptor::new())?)
            };
            Ok((Object::Vector(vector), writer))
        }
        ObjectSpec::Matrix {
            ty,
            nrows,
            ncols,
            rows,
            cols,
            values,
        } => {
            let ty = Type::by_name(ty)?;
            let matrix = Matrix::new(*nrows, *ncols, ty.clone());
            if rows.len() != cols.len() {
                return Err(ConfigError::Invalid(format!(
                    "Matrix '{}' has {} rows but {} cols",
                    name,
                    rows.len(),
                    cols.len()
                )));
            }
            let writer = if rows.is_empty() {
                None
            } else {
                let vals = encode_values(name, &ty, rows.len(), values)?;
                Some(expression.make_matrix_write(
                    &matrix,
                    rows.clone(),
                    cols.clone(),
                    vals,
                    Descriptor::new(),
                )?)
            };
            Ok((Object::Matrix(matrix), writer))
        }
        ObjectSpec::Scalar { ty, value } => {
            let ty = Type::by_name(ty)?;
            if !ty.has_values() {
                return Err(ConfigError::Invalid(format!("Scalar '{}' must have a value type", name)));
            }
            let scalar = Scalar::new(ty.clone());
            if let Some(value) = value {
                scalar.set_bytes(Some(encode_values(name, &ty, 1, &[*value])?));
            }
            Ok((Object::Scalar(scalar), None))
        }
    }
}

fn find_object<'o>(
    node: &NodeSpec,
    objects: &'o BTreeMap<String, Object>,
    field: &str,
    name: &Option<String>,
) -> Result<&'o Object, ConfigError> {
    let name = node.operand(field, name)?;
    objects.get(name).ok_or_else(|| {
        ConfigError::Invalid(format!("Node '{}' refers to unknown object '{}'", node.id, name))
    })
}

fn add_operation(
    node: &NodeSpec,
    objects: &BTreeMap<String, Object>,
    expression: &mut Expression,
) -> Result<usize, ConfigError> {
    let wrong_kind = |name: &str, expected: &str| {
        ConfigError::Invalid(format!(
            "Node '{}' ({}) needs '{}' to be a {}",
            node.id, node.op, name, expected
        ))
    };
    let vector = |field: &str, name: &Option<String>| -> Result<Vector, ConfigError> {
        match find_object(node, objects, field, name)? {
            Object::Vector(v) => Ok(v.clone()),
            _ => Err(wrong_kind(field, "vector")),
        }
    };
    let matrix = |field: &str, name: &Option<String>| -> Result<Matrix, ConfigError> {
        match find_object(node, objects, field, name)? {
            Object::Matrix(m) => Ok(m.clone()),
            _ => Err(wrong_kind(field, "matrix")),
        }
    };
    let scalar = |field: &str, name: &Option<String>| -> Result<Scalar, ConfigError> {
        match find_object(node, objects, field, name)? {
            Object::Scalar(s) => Ok(s.clone()),
            _ => Err(wrong_kind(field, "scalar")),
        }
    };
    let out = Some(node.out.clone());
    let desc = node.descriptor();

    let idx = match node.op.as_str() {
        "vector_ewise_add" => {
            let w = vector("out", &out)?;
            let mask = node.mask.as_ref().map(|_| vector("mask", &node.mask)).transpose()?;
            let op = node.function("function", &node.function, w.ty())?;
            let (a, b) = (vector("a", &node.a)?, vector("b", &node.b)?);
            expression.make_vector_ewise_add(&w, mask.as_ref(), &op, &a, &b, desc)?
        }
        "matrix_ewise_add" => {
            let w = matrix("out", &out)?;
            let mask = node.mask.as_ref().map(|_| matrix("mask", &node.mask)).transpose()?;
            let op = node.function("function", &node.function, w.ty())?;
            let (a, b) = (matrix("a", &node.a)?, matrix("b", &node.b)?);
            expression.make_matrix_ewise_add(&w, mask.as_ref(), &op, &a, &b, desc)?
        }
        "mxm" => {
            let w = matrix("out", &out)?;
            let mask = node.mask.as_ref().map(|_| matrix("mask", &node.mask)).transpose()?;
            let mult = node.function("mult", &node.mult, w.ty())?;
            let add = node.function("add", &node.add, w.ty())?;
            let (a, b) = (matrix("a", &node.a)?, matrix("b", &node.b)?);
            expression.make_mxm(&w, mask.as_ref(), &mult, &add, &a, &b, desc)?
        }
        "vxm" => {
            let w = vector("out", &out)?;
            let mask = node.mask.as_ref().map(|_| vector("mask", &node.mask)).transpose()?;
            let mult = node.function("mult", &node.mult, w.ty())?;
            let add = node.function("add", &node.add, w.ty())?;
            let (a, b) = (vector("a", &node.a)?, matrix("b", &node.b)?);
            expression.make_vxm(&w, mask.as_ref(), &mult, &add, &a, &b, desc)?
        }
        "vector_assign" => {
            let w = vector("out", &out)?;
            let mask = node.mask.as_ref().map(|_| vector("mask", &node.mask)).transpose()?;
            let s = scalar("scalar", &node.scalar)?;
            expression.make_vector_assign(&w, mask.as_ref(), &s, desc)?
        }
        "matrix_transpose" => {
            let w = matrix("out", &out)?;
            let mask = node.mask.as_ref().map(|_| matrix("mask", &node.mask)).transpose()?;
            let a = matrix("a", &node.a)?;
            expression.make_matrix_transpose(&w, mask.as_ref(), &a, desc)?
        }
        "vector_reduce" => {
            let s = scalar("out", &out)?;
            let reduce = node.function("function", &node.function, s.ty())?;
            let v = vector("a", &node.a)?;
            expression.make_vector_reduce(&s, &reduce, &v, desc)?
        }
        other => {
            return Err(ConfigError::Invalid(format!(
                "Node '{}' has unknown op '{}'",
                node.id, other
            )))
        }
    };
    Ok(idx)
}

fn encode_values(name: &str, ty: &Type, entries: usize, values: &[f64]) -> Result<Vec<u8>, ConfigError> {
    if !ty.has_values() {
        return if values.is_empty() {
            Ok(Vec::new())
        } else {
            Err(ConfigError::Invalid(format!("Object '{}' of type void cannot hold values", name)))
        };
    }
    if values.len() != entries {
        return Err(ConfigError::Invalid(format!(
            "Object '{}' has {} indices but {} values",
            name,
            entries,
            values.len()
        )));
    }
    let integral = !matches!(ty.name(), "f32" | "f64");
    if let Some(bad) = values.iter().find(|v| integral && v.fract() != 0.0) {
        return Err(ConfigError::Invalid(format!(
            "Object '{}' value {} is not a valid {}",
            name, bad, ty
        )));
    }

    Ok(match ty.name() {
        "i32" => encode::<i32>(values),
        "u32" => encode::<u32>(values),
        "i64" => encode::<i64>(values),
        "f32" => encode::<f32>(values),
        _ => encode::<f64>(values),
    })
}

fn encode<T: Element>(values: &[f64]) -> Vec<u8> {
    values
        .iter()
        .flat_map(|&v| bytemuck::bytes_of(&T::from_f64(v)).to_vec())
        .collect()
}

fn decode_values(ty: &Type, vals: &[u8]) -> Vec<serde_json::Value> {
    match ty.name() {
        "i32" => decode::<i32>(vals).map(|v| json!(v as i64)).collect(),
        "u32" => decode::<u32>(vals).map(|v| json!(v as i64)).collect(),
        "i64" => decode::<i64>(vals).map(|v| json!(v as i64)).collect(),
        "f32" => decode::<f32>(vals).map(|v| json!(v)).collect(),
        "f64" => decode::<f64>(vals).map(|v| json!(v)).collect(),
        _ => Vec::new(),
    }
}

fn decode<T: Element>(vals: &[u8]) -> impl Iterator<Item = f64> + '_ {
    vals.chunks_exact(std::mem::size_of::<T>())
        .map(|chunk| bytemuck::pod_read_unaligned::<T>(chunk).to_f64())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::Operation;
    use std::io::Write;

    const VXM: &str = r#"
label: vxm-demo
objects:
  a: { kind: vector, type: i32, size: 3, indices: [0, 2], values: [2, 3] }
  b: { kind: matrix, type: i32, nrows: 3, ncols: 4, rows: [0, 2, 2], cols: [1, 1, 3], values: [5, 7, 11] }
  w: { kind: vector, type: i32, size: 4 }
  total: { kind: scalar, type: i32 }
nodes:
  - id: product
    op: vxm
    out: w
    a: a
    b: b
    mult: times
    add: plus
  - id: sum
    op: vector_reduce
    out: total
    a: w
    function: plus
    depends_on: [product]
"#;

    #[test]
    fn test_build_adds_writes_and_dependencies() {
        let built = ExpressionFile::from_yaml(VXM).unwrap().build().unwrap();
        let expression = &built.expression;

        assert_eq!(expression.label(), "vxm-demo");
        // a and b get write nodes in name order, then product and sum
        let ops: Vec<Operation> = expression.nodes().iter().map(|n| n.operation()).collect();
        assert_eq!(
            ops,
            vec![
                Operation::VectorDataWrite,
                Operation::MatrixDataWrite,
                Operation::VxM,
                Operation::VectorReduce
            ]
        );
        let product = built.node_ids["product"];
        let sum = built.node_ids["sum"];
        assert_eq!(expression.node(product).unwrap().prev(), &[0, 1]);
        assert_eq!(expression.node(sum).unwrap().prev(), &[product]);
        assert_eq!(built.objects.len(), 4);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        file.write_all(VXM.as_bytes()).unwrap();

        let parsed = ExpressionFile::load(file.path()).unwrap();
        assert_eq!(parsed.nodes.len(), 2);
        assert_eq!(parsed.objects.len(), 4);
    }

    #[test]
    fn test_invalid_files_rejected() {
        let test_cases = vec![
            (
                "objects:\n  w: { kind: vector, type: i32, size: 2 }\nnodes:\n  - { id: x, op: frobnicate, out: w }\n",
                "Invalid configuration: Node 'x' has unknown op 'frobnicate'",
            ),
            (
                "objects:\n  w: { kind: vector, type: i32, size: 2 }\nnodes:\n  - { id: x, op: vector_assign, out: w, scalar: nope }\n",
                "Invalid configuration: Node 'x' refers to unknown object 'nope'",
            ),
            (
                "objects:\n  w: { kind: vector, type: i32, size: 2 }\nnodes:\n  - { id: x, op: vector_assign, out: w, scalar: w }\n",
                "Invalid configuration: Node 'x' (vector_assign) needs 'scalar' to be a scalar",
            ),
            (
                "objects:\n  v: { kind: vector, type: i32, size: 2, indices: [0, 1], values: [1] }\n",
                "Invalid configuration: Object 'v' has 2 indices but 1 values",
            ),
            (
                "objects:\n  v: { kind: vector, type: u32, size: 2, indices: [0], values: [1.5] }\n",
                "Invalid configuration: Object 'v' value 1.5 is not a valid u32",
            ),
            (
                "objects:\n  s: { kind: scalar, type: i32 }\n  w: { kind: vector, type: i32, size: 2 }\nnodes:\n  - { id: x, op: vector_assign, out: w, scalar: s, depends_on: [y] }\n",
                "Invalid configuration: Node 'x' depends on 'y' which does not exist",
            ),
            (
                "objects:\n  w: { kind: vector, type: f32, size: 2 }\n  s: { kind: scalar, type: f32 }\nnodes:\n  - { id: x, op: vector_reduce, out: s, a: w, function: modulo }\n",
                "Invalid expression: Invalid argument: No built-in function 'modulo' for type 'f32'",
            ),
        ];

        for (yaml, expected) in test_cases {
            let error = ExpressionFile::from_yaml(yaml).unwrap().build().unwrap_err();
            assert_eq!(error.to_string(), expected, "yaml: {}", yaml);
        }
    }

    #[test]
    fn test_object_json_reflects_contents() {
        let v = Vector::new(3, Type::of::<f32>());
        v.set_block(Some(std::sync::Arc::new(
            crate::storage::VectorCoo::from_typed(3, &[(1, 0.5f32)]).unwrap(),
        )));
        let s = Scalar::from_value(7i64);

        assert_eq!(
            Object::Vector(v).to_json(),
            json!({"kind": "vector", "type": "f32", "size": 3, "indices": [1], "values": [0.5]})
        );
        assert_eq!(
            Object::Scalar(s).to_json(),
            json!({"kind": "scalar", "type": "i64", "value": 7})
        );
        assert_eq!(
            Object::Scalar(Scalar::new(Type::of::<i32>())).to_json(),
            json!({"kind": "scalar", "type": "i32", "value": null})
        );
    }
}
