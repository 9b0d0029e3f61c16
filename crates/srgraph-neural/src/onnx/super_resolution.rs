//! ONNX export of [`SuperResolutionNet`]
//!
//! Each convolution stage becomes `Conv → Add(bias) → Relu`, with the bias
//! stored as a `[C, 1, 1]` initializer so the `Add` broadcasts over space. The
//! pixel shuffle is written according to [`ShuffleLowering`]: either the
//! `Reshape → Transpose → Reshape` sequence a graph tracer records, or a
//! single `DepthToSpace` in `CRD` mode.

use super::data::{OnnxAttribute, OnnxGraph, OnnxNode, OnnxTensor, OnnxValueInfo};
use super::model::OnnxModel;
use super::traits::OnnxExport;
use super::types::OnnxDataType;
use crate::config::{ExportConfig, ShuffleLowering};
use crate::layers::LayerType;
use crate::model::SuperResolutionNet;
use srgraph_core::ops::reshape;
use srgraph_core::{Result, TensorError};
use tracing::info;

/// Name of the graph input
pub const INPUT_NAME: &str = "input";
/// Name of the graph output
pub const OUTPUT_NAME: &str = "output";

/// Axis order that turns `(N, C, r, r, H, W)` into `(N, C, H, r, W, r)`
pub const SHUFFLE_PERM: [i64; 6] = [0, 1, 4, 2, 5, 3];

impl OnnxExport for SuperResolutionNet {
    fn to_onnx_with_config(&self, input_shape: &[usize], config: &ExportConfig) -> Result<OnnxModel> {
        let output_shape = self.output_shape(input_shape)?;
        if config.shuffle_lowering == ShuffleLowering::DepthToSpace && config.opset_version < 11 {
            return Err(TensorError::unsupported_operation(
                "onnx_export",
                format!(
                    "DepthToSpace CRD mode needs opset 11 or later, got {}",
                    config.opset_version
                ),
            ));
        }

        let mut graph = OnnxGraph::new(config.graph_name.clone());
        graph.inputs.push(OnnxValueInfo::new(
            INPUT_NAME,
            OnnxDataType::Float32,
            to_i64(input_shape),
        ));

        let mut current = INPUT_NAME.to_string();
        for (descriptor, conv) in self.conv_layers() {
            let stage = descriptor.name;
            let spec = conv.spec();
            let weight_name = format!("{stage}.weight");
            let bias_name = format!("{stage}.bias");

            graph
                .initializers
                .push(OnnxTensor::from_tensor(&weight_name, conv.weight()));
            graph.initializers.push(OnnxTensor::from_tensor(
                &bias_name,
                &reshape(conv.bias(), &[spec.out_channels, 1, 1])?,
            ));

            let conv_out = format!("{stage}_conv");
            graph.nodes.push(
                OnnxNode::new(
                    format!("{stage}/Conv"),
                    LayerType::Conv2D.to_onnx_op_type(),
                    vec![current, weight_name],
                    vec![conv_out.clone()],
                )
                .with_attribute(
                    "kernel_shape",
                    OnnxAttribute::Ints(vec![spec.kernel_size.0 as i64, spec.kernel_size.1 as i64]),
                )
                .with_attribute("pads", OnnxAttribute::Ints(to_i64(&spec.padding.to_onnx_pads())))
                .with_attribute(
                    "strides",
                    OnnxAttribute::Ints(vec![spec.stride.0 as i64, spec.stride.1 as i64]),
                )
                .with_attribute("dilations", OnnxAttribute::Ints(vec![1, 1]))
                .with_attribute("group", OnnxAttribute::Int(1)),
            );

            let add_out = format!("{stage}_add");
            graph.nodes.push(OnnxNode::new(
                format!("{stage}/Add"),
                "Add",
                vec![conv_out, bias_name],
                vec![add_out.clone()],
            ));
            current = add_out;

            if descriptor.relu {
                let relu_out = format!("{stage}_relu");
                graph.nodes.push(OnnxNode::new(
                    format!("{stage}/Relu"),
                    LayerType::ReLU.to_onnx_op_type(),
                    vec![current],
                    vec![relu_out.clone()],
                ));
                current = relu_out;
            }
        }

        let r = self.upscale_factor();
        match config.shuffle_lowering {
            ShuffleLowering::ReshapeTranspose => {
                push_reshape_transpose(&mut graph, current, r, input_shape, &output_shape)
            }
            ShuffleLowering::DepthToSpace => graph.nodes.push(
                OnnxNode::new(
                    "pixel_shuffle/DepthToSpace",
                    LayerType::PixelShuffle.to_onnx_op_type(),
                    vec![current],
                    vec![OUTPUT_NAME.to_string()],
                )
                .with_attribute("blocksize", OnnxAttribute::Int(r as i64))
                .with_attribute("mode", OnnxAttribute::String("CRD".to_string())),
            ),
        }

        graph.outputs.push(OnnxValueInfo::new(
            OUTPUT_NAME,
            OnnxDataType::Float32,
            to_i64(&output_shape),
        ));

        // Shape-check the finished graph against the declared output.
        graph.topology()?;

        let mut model = OnnxModel::new(graph);
        model.opset_version = config.opset_version;
        model.producer_name = config.producer_name.clone();
        model.doc_string = format!("super-resolution network, upscale factor {r}");

        info!(
            nodes = model.graph.nodes.len(),
            initializers = model.graph.initializers.len(),
            lowering = ?config.shuffle_lowering,
            "exported super-resolution graph"
        );
        Ok(model)
    }
}

fn push_reshape_transpose(
    graph: &mut OnnxGraph,
    input: String,
    r: usize,
    input_shape: &[usize],
    output_shape: &[usize],
) {
    let (h, w) = (input_shape[2] as i64, input_shape[3] as i64);
    let r = r as i64;

    // -1 keeps the batch dimension free.
    let split_shape = [-1, 1, r, r, h, w];
    let merged_shape = [-1, 1, output_shape[2] as i64, output_shape[3] as i64];
    graph
        .initializers
        .push(OnnxTensor::from_i64s("pixel_shuffle.split_shape", &split_shape));
    graph
        .initializers
        .push(OnnxTensor::from_i64s("pixel_shuffle.merged_shape", &merged_shape));

    graph.nodes.push(OnnxNode::new(
        "pixel_shuffle/Reshape",
        "Reshape",
        vec![input, "pixel_shuffle.split_shape".to_string()],
        vec!["pixel_shuffle_split".to_string()],
    ));
    graph.nodes.push(
        OnnxNode::new(
            "pixel_shuffle/Transpose",
            "Transpose",
            vec!["pixel_shuffle_split".to_string()],
            vec!["pixel_shuffle_permuted".to_string()],
        )
        .with_attribute("perm", OnnxAttribute::Ints(SHUFFLE_PERM.to_vec())),
    );
    graph.nodes.push(OnnxNode::new(
        "pixel_shuffle/Reshape_1",
        "Reshape",
        vec![
            "pixel_shuffle_permuted".to_string(),
            "pixel_shuffle.merged_shape".to_string(),
        ],
        vec![OUTPUT_NAME.to_string()],
    ));
}

fn to_i64(dims: &[usize]) -> Vec<i64> {
    dims.iter().map(|&d| d as i64).collect()
}
