//! Graph interpreter
//!
//! Construction compiles the graph into a list of steps, rejecting unknown
//! operators, unsupported attributes and nodes that read values before they
//! are produced. Running a compiled graph can then only fail on the fed input.

use super::Workspace;
use crate::onnx::topology::{attr_error, usize_attr};
use crate::onnx::{OnnxDataType, OnnxModel, OnnxNode, OnnxValueInfo, SUPPORTED_OPS};
use srgraph_core::ops::{self, resolve_reshape_dims};
use srgraph_core::{Padding2D, Result, Tensor, TensorError};
use std::collections::{HashMap, HashSet};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DepthToSpaceMode {
    /// column-row-depth, the pixel shuffle ordering
    Crd,
    /// depth-column-row
    Dcr,
}

#[derive(Debug, Clone)]
enum Step {
    Conv {
        input: String,
        weight: String,
        bias: Option<String>,
        stride: (usize, usize),
        padding: Padding2D,
    },
    Add {
        lhs: String,
        rhs: String,
    },
    Relu {
        input: String,
    },
    Reshape {
        input: String,
        target: Vec<i64>,
    },
    Transpose {
        input: String,
        perm: Vec<usize>,
    },
    DepthToSpace {
        input: String,
        block: usize,
        mode: DepthToSpaceMode,
    },
}

#[derive(Debug, Clone)]
struct CompiledNode {
    name: String,
    step: Step,
    output: String,
}

/// Executes an exported graph on the CPU
#[derive(Debug, Clone)]
pub struct GraphExecutor {
    inputs: Vec<OnnxValueInfo>,
    outputs: Vec<String>,
    constants: HashMap<String, Tensor<f32>>,
    nodes: Vec<CompiledNode>,
}

impl GraphExecutor {
    /// Validate and compile `model`
    ///
    /// Unknown operators fail with `UnsupportedOperation`; nodes out of
    /// topological order or with malformed attributes fail with
    /// `InvalidOperation`.
    pub fn new(model: &OnnxModel) -> Result<Self> {
        let graph = &model.graph;

        let mut constants = HashMap::new();
        let mut int_constants = HashMap::new();
        for init in &graph.initializers {
            match init.data_type {
                OnnxDataType::Int64 => {
                    int_constants.insert(init.name.as_str(), init.to_i64_values()?);
                }
                _ => {
                    constants.insert(init.name.clone(), init.to_f32_tensor()?);
                }
            }
        }

        let mut available: HashSet<&str> = graph
            .inputs
            .iter()
            .map(|i| i.name.as_str())
            .chain(graph.initializers.iter().map(|i| i.name.as_str()))
            .collect();

        let mut nodes = Vec::with_capacity(graph.nodes.len());
        for node in &graph.nodes {
            if !SUPPORTED_OPS.contains(&node.op_type.as_str()) {
                return Err(TensorError::unsupported_operation(
                    &node.op_type,
                    format!("node '{}' cannot be executed", node.name),
                ));
            }
            for input in &node.inputs {
                if !input.is_empty() && !available.contains(input.as_str()) {
                    return Err(TensorError::invalid_operation(
                        &node.op_type,
                        format!(
                            "node '{}' reads '{input}' before it is produced; nodes must be topologically sorted",
                            node.name
                        ),
                    ));
                }
            }

            let output = node.output()?;
            let step = compile_node(node, &int_constants)?;
            available.insert(output);
            nodes.push(CompiledNode {
                name: node.name.clone(),
                step,
                output: output.to_string(),
            });
        }

        let outputs = graph
            .outputs
            .iter()
            .map(|o| {
                if available.contains(o.name.as_str()) {
                    Ok(o.name.clone())
                } else {
                    Err(TensorError::invalid_operation(
                        "graph_executor",
                        format!("graph output '{}' is never produced", o.name),
                    ))
                }
            })
            .collect::<Result<Vec<_>>>()?;

        debug!(
            graph = %graph.name,
            nodes = nodes.len(),
            constants = constants.len(),
            "compiled graph"
        );
        Ok(Self {
            inputs: graph.inputs.clone(),
            outputs,
            constants,
            nodes,
        })
    }

    pub fn input_names(&self) -> impl Iterator<Item = &str> {
        self.inputs.iter().map(|i| i.name.as_str())
    }

    pub fn output_names(&self) -> impl Iterator<Item = &str> {
        self.outputs.iter().map(String::as_str)
    }

    /// Execute every node, reading graph inputs from and writing all node
    /// outputs to `workspace`
    pub fn run(&self, workspace: &mut Workspace) -> Result<()> {
        for input in &self.inputs {
            let tensor = workspace.fetch_blob(&input.name)?;
            check_declared_shape(input, tensor.dims())?;
        }

        for node in &self.nodes {
            let output = self.execute(&node.step, workspace)?;
            debug!(node = %node.name, shape = ?output.dims(), "executed node");
            workspace.feed_blob(node.output.clone(), output);
        }
        Ok(())
    }

    /// Run a single-input single-output graph on `input`
    pub fn run_single(&self, input: &Tensor<f32>) -> Result<Tensor<f32>> {
        let (input_name, output_name) = match (self.inputs.as_slice(), self.outputs.as_slice()) {
            ([i], [o]) => (i.name.as_str(), o.as_str()),
            _ => {
                return Err(TensorError::invalid_operation(
                    "run_single",
                    format!(
                        "graph has {} inputs and {} outputs, expected one of each",
                        self.inputs.len(),
                        self.outputs.len()
                    ),
                ))
            }
        };

        let mut workspace = Workspace::new();
        workspace.feed_blob(input_name, input.clone());
        self.run(&mut workspace)?;
        workspace.take_blob(output_name)
    }

    fn value<'a>(&'a self, workspace: &'a Workspace, name: &str) -> Result<&'a Tensor<f32>> {
        match self.constants.get(name) {
            Some(tensor) => Ok(tensor),
            None => workspace.fetch_blob(name),
        }
    }

    fn execute(&self, step: &Step, ws: &Workspace) -> Result<Tensor<f32>> {
        match step {
            Step::Conv {
                input,
                weight,
                bias,
                stride,
                padding,
            } => {
                let bias = bias.as_deref().map(|b| self.value(ws, b)).transpose()?;
                ops::conv2d_im2col(
                    self.value(ws, input)?,
                    self.value(ws, weight)?,
                    bias,
                    *stride,
                    *padding,
                )
            }
            Step::Add { lhs, rhs } => ops::add(self.value(ws, lhs)?, self.value(ws, rhs)?),
            Step::Relu { input } => ops::relu(self.value(ws, input)?),
            Step::Reshape { input, target } => {
                let x = self.value(ws, input)?;
                let dims = resolve_reshape_dims(x.dims(), target)?;
                ops::reshape(x, &dims)
            }
            Step::Transpose { input, perm } => ops::transpose(self.value(ws, input)?, perm),
            Step::DepthToSpace { input, block, mode } => {
                let x = self.value(ws, input)?;
                match mode {
                    DepthToSpaceMode::Crd => ops::pixel_shuffle(x, *block),
                    DepthToSpaceMode::Dcr => depth_to_space_dcr(x, *block),
                }
            }
        }
    }
}

fn compile_node(node: &OnnxNode, int_constants: &HashMap<&str, Vec<i64>>) -> Result<Step> {
    let input = node.input(0)?.to_string();

    match node.op_type.as_str() {
        "Conv" => {
            if node.attribute_int("group").unwrap_or(1) != 1 {
                return Err(attr_error(node, "grouped convolution is not supported"));
            }
            if let Some(dilations) = node.attribute_ints("dilations") {
                if dilations.iter().any(|&d| d != 1) {
                    return Err(attr_error(node, "dilated convolution is not supported"));
                }
            }
            if node
                .attribute_string("auto_pad")
                .is_some_and(|p| p != "NOTSET")
            {
                return Err(attr_error(node, "auto_pad is not supported, use explicit pads"));
            }

            let padding = match usize_attr(node, "pads")? {
                Some(pads) => Padding2D::from_onnx_pads(&pads)?,
                None => Padding2D::valid(),
            };
            let stride = match usize_attr(node, "strides")?.as_deref() {
                Some(&[sh, sw]) if sh > 0 && sw > 0 => (sh, sw),
                None => (1, 1),
                Some(_) => return Err(attr_error(node, "strides must be two positive values")),
            };

            Ok(Step::Conv {
                input,
                weight: node.input(1)?.to_string(),
                bias: node.inputs.get(2).filter(|b| !b.is_empty()).cloned(),
                stride,
                padding,
            })
        }
        "Add" => Ok(Step::Add {
            lhs: input,
            rhs: node.input(1)?.to_string(),
        }),
        "Relu" => Ok(Step::Relu { input }),
        "Reshape" => {
            let target_name = node.input(1)?;
            let target = int_constants
                .get(target_name)
                .cloned()
                .ok_or_else(|| attr_error(node, "reshape target must be an int64 initializer"))?;
            Ok(Step::Reshape { input, target })
        }
        "Transpose" => {
            let perm = usize_attr(node, "perm")?
                .ok_or_else(|| attr_error(node, "transpose needs an explicit perm"))?;
            Ok(Step::Transpose { input, perm })
        }
        "DepthToSpace" => {
            let block = node
                .attribute_int("blocksize")
                .and_then(|b| usize::try_from(b).ok())
                .filter(|&b| b > 0)
                .ok_or_else(|| attr_error(node, "blocksize must be a positive integer"))?;
            let mode = match node.attribute_string("mode").unwrap_or("DCR") {
                "CRD" => DepthToSpaceMode::Crd,
                "DCR" => DepthToSpaceMode::Dcr,
                other => return Err(attr_error(node, &format!("unknown mode '{other}'"))),
            };
            Ok(Step::DepthToSpace { input, block, mode })
        }
        other => Err(TensorError::unsupported_operation(
            other,
            format!("node '{}' cannot be executed", node.name),
        )),
    }
}

/// `DepthToSpace` in `DCR` mode: the block index is the outer channel index
fn depth_to_space_dcr(x: &Tensor<f32>, block: usize) -> Result<Tensor<f32>> {
    let (n, c, h, w) = x.shape().nchw("DepthToSpace")?;
    let b2 = block * block;
    if c % b2 != 0 {
        return Err(TensorError::shape_mismatch(
            "DepthToSpace",
            &format!("channel count divisible by {b2}"),
            &format!("{c} channels"),
        ));
    }
    let split = ops::reshape(x, &[n, block, block, c / b2, h, w])?;
    let moved = ops::transpose(&split, &[0, 3, 4, 1, 5, 2])?;
    ops::reshape(&moved, &[n, c / b2, h * block, w * block])
}

fn check_declared_shape(info: &OnnxValueInfo, actual: &[usize]) -> Result<()> {
    let matches = info.shape.len() == actual.len()
        && info
            .shape
            .iter()
            .zip(actual)
            .all(|(&declared, &a)| declared < 0 || declared as usize == a);
    if !matches {
        return Err(TensorError::shape_mismatch(
            "graph_executor",
            &format!("{:?} for input '{}'", info.shape, info.name),
            &format!("{actual:?}"),
        ));
    }
    Ok(())
}
