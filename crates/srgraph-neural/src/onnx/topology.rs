//! Static shape propagation over an exported graph
//!
//! Walks the nodes in order and infers each output shape from the graph input
//! shapes, initializer dimensions and node attributes. Used to print a model's
//! topology and to check an export before it is written.

use super::data::{OnnxGraph, OnnxNode};
use srgraph_core::ops::resolve_reshape_dims;
use srgraph_core::{Result, Shape, TensorError};
use std::collections::HashMap;
use std::fmt;

/// Operators understood by shape inference and by the graph executor
pub const SUPPORTED_OPS: &[&str] = &["Conv", "Add", "Relu", "Reshape", "Transpose", "DepthToSpace"];

/// One node of a graph with its inferred output shape
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeSummary {
    pub name: String,
    pub op_type: String,
    pub inputs: Vec<String>,
    pub output: String,
    pub output_shape: Vec<usize>,
}

impl fmt::Display for NodeSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:<14} {:<13} {} -> {} {}",
            self.name,
            self.op_type,
            self.inputs.join(", "),
            self.output,
            Shape::from_slice(&self.output_shape)
        )
    }
}

impl OnnxGraph {
    /// Node list with inferred output shapes
    ///
    /// Fails if a graph input has a symbolic dimension, a node reads a value
    /// that has not been produced yet, or a node's attributes are malformed.
    pub fn topology(&self) -> Result<Vec<NodeSummary>> {
        let mut shapes: HashMap<&str, Vec<usize>> = HashMap::new();
        for input in &self.inputs {
            let shape = input.static_shape().ok_or_else(|| {
                TensorError::invalid_shape(
                    "topology",
                    format!("graph input '{}' has a symbolic dimension", input.name),
                    &[],
                )
            })?;
            shapes.insert(input.name.as_str(), shape);
        }
        for init in &self.initializers {
            shapes.insert(init.name.as_str(), init.shape()?);
        }

        let mut summaries = Vec::with_capacity(self.nodes.len());
        for node in &self.nodes {
            let input_shapes = node
                .inputs
                .iter()
                .map(|name| {
                    shapes.get(name.as_str()).cloned().ok_or_else(|| {
                        TensorError::invalid_operation(
                            &node.op_type,
                            format!("node '{}' reads '{name}' before it is produced", node.name),
                        )
                    })
                })
                .collect::<Result<Vec<_>>>()?;

            let output_shape = infer_output_shape(self, node, &input_shapes)?;
            let output = node.output()?;
            shapes.insert(output, output_shape.clone());
            summaries.push(NodeSummary {
                name: node.name.clone(),
                op_type: node.op_type.clone(),
                inputs: node.inputs.clone(),
                output: output.to_string(),
                output_shape,
            });
        }

        for output in &self.outputs {
            let inferred = shapes.get(output.name.as_str()).ok_or_else(|| {
                TensorError::invalid_operation(
                    "topology",
                    format!("graph output '{}' is never produced", output.name),
                )
            })?;
            if let Some(declared) = output.static_shape() {
                if &declared != inferred {
                    return Err(TensorError::shape_mismatch(
                        "topology",
                        &format!("{declared:?} for output '{}'", output.name),
                        &format!("{inferred:?}"),
                    ));
                }
            }
        }

        Ok(summaries)
    }
}

fn infer_output_shape(graph: &OnnxGraph, node: &OnnxNode, inputs: &[Vec<usize>]) -> Result<Vec<usize>> {
    let first = inputs.first().ok_or_else(|| {
        TensorError::invalid_operation(&node.op_type, format!("node '{}' has no inputs", node.name))
    })?;

    match node.op_type.as_str() {
        "Relu" => Ok(first.clone()),
        "Add" => {
            let other = Shape::from_slice(second_input(node, inputs)?);
            Shape::from_slice(first)
                .broadcast_shape(&other)
                .map(|s| s.to_vec())
                .ok_or_else(|| {
                    TensorError::shape_mismatch(
                        "Add",
                        &format!("shape broadcastable with {first:?}"),
                        &format!("{other}"),
                    )
                })
        }
        "Conv" => {
            let weight = second_input(node, inputs)?;
            let (n, c, h, w) = Shape::from_slice(first).nchw("Conv")?;
            let (oc, ic, kh, kw) = Shape::from_slice(weight).nchw("Conv")?;
            if c != ic {
                return Err(TensorError::shape_mismatch(
                    "Conv",
                    &format!("{ic} input channels"),
                    &format!("{c}"),
                ));
            }
            let pads = usize_attr(node, "pads")?.unwrap_or_else(|| vec![0; 4]);
            let strides = usize_attr(node, "strides")?.unwrap_or_else(|| vec![1, 1]);
            let (&[top, left, bottom, right], &[sh, sw]) = (pads.as_slice(), strides.as_slice())
            else {
                return Err(attr_error(node, "pads/strides have the wrong length"));
            };
            let (ph, pw) = (h + top + bottom, w + left + right);
            if sh == 0 || sw == 0 || ph < kh || pw < kw {
                return Err(attr_error(node, "kernel does not fit the padded input"));
            }
            Ok(vec![n, oc, (ph - kh) / sh + 1, (pw - kw) / sw + 1])
        }
        "Reshape" => {
            let target_name = node.input(1)?;
            let target = graph
                .initializer(target_name)
                .ok_or_else(|| attr_error(node, "reshape target must be an initializer"))?
                .to_i64_values()?;
            resolve_reshape_dims(first, &target)
        }
        "Transpose" => {
            let perm = usize_attr(node, "perm")?
                .unwrap_or_else(|| (0..first.len()).rev().collect());
            if perm.len() != first.len() || perm.iter().any(|&p| p >= first.len()) {
                return Err(attr_error(node, "perm does not match the input rank"));
            }
            Ok(perm.iter().map(|&p| first[p]).collect())
        }
        "DepthToSpace" => {
            let block = node
                .attribute_int("blocksize")
                .and_then(|b| usize::try_from(b).ok())
                .filter(|&b| b > 0)
                .ok_or_else(|| attr_error(node, "blocksize must be a positive integer"))?;
            let (n, c, h, w) = Shape::from_slice(first).nchw("DepthToSpace")?;
            if c % (block * block) != 0 {
                return Err(attr_error(node, "channels are not divisible by blocksize²"));
            }
            Ok(vec![n, c / (block * block), h * block, w * block])
        }
        other => Err(TensorError::unsupported_operation(
            other,
            format!("node '{}' uses an operator outside {SUPPORTED_OPS:?}", node.name),
        )),
    }
}

fn second_input<'a>(node: &OnnxNode, inputs: &'a [Vec<usize>]) -> Result<&'a [usize]> {
    inputs
        .get(1)
        .map(Vec::as_slice)
        .ok_or_else(|| attr_error(node, "expected two inputs"))
}

/// Read a non-negative `ints` attribute
pub(crate) fn usize_attr(node: &OnnxNode, name: &str) -> Result<Option<Vec<usize>>> {
    node.attribute_ints(name)
        .map(|values| {
            values
                .iter()
                .map(|&v| {
                    usize::try_from(v)
                        .map_err(|_| attr_error(node, &format!("'{name}' has negative value {v}")))
                })
                .collect()
        })
        .transpose()
}

pub(crate) fn attr_error(node: &OnnxNode, reason: &str) -> TensorError {
    TensorError::invalid_operation(&node.op_type, format!("node '{}': {reason}", node.name))
}
