//! ONNX Data Structures
//!
//! Graphs, nodes, value infos, initializer tensors and attributes. Each type
//! converts to and from its protobuf message when the `onnx` feature is on.

use super::types::{OnnxDataType, OnnxError};
use serde::{Deserialize, Serialize};
use srgraph_core::{bytes, Result, Tensor, TensorError};
use std::collections::BTreeMap;

#[cfg(feature = "onnx")]
use super::proto;

/// ONNX graph representation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OnnxGraph {
    pub name: String,
    /// Nodes in topological order
    pub nodes: Vec<OnnxNode>,
    pub inputs: Vec<OnnxValueInfo>,
    pub outputs: Vec<OnnxValueInfo>,
    pub initializers: Vec<OnnxTensor>,
}

impl OnnxGraph {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            nodes: Vec::new(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            initializers: Vec::new(),
        }
    }

    pub fn initializer(&self, name: &str) -> Option<&OnnxTensor> {
        self.initializers.iter().find(|t| t.name == name)
    }

    /// Distinct operator types in first-use order
    pub fn op_types(&self) -> Vec<&str> {
        let mut seen = Vec::new();
        for node in &self.nodes {
            if !seen.contains(&node.op_type.as_str()) {
                seen.push(node.op_type.as_str());
            }
        }
        seen
    }
}

#[cfg(feature = "onnx")]
impl OnnxGraph {
    /// Convert to protobuf format
    pub fn to_protobuf(&self) -> proto::GraphProto {
        proto::GraphProto {
            node: self.nodes.iter().map(OnnxNode::to_protobuf).collect(),
            name: Some(self.name.clone()),
            initializer: self.initializers.iter().map(OnnxTensor::to_protobuf).collect(),
            input: self.inputs.iter().map(OnnxValueInfo::to_protobuf).collect(),
            output: self.outputs.iter().map(OnnxValueInfo::to_protobuf).collect(),
            value_info: Vec::new(),
        }
    }

    /// Convert from protobuf format
    pub fn from_protobuf(proto: &proto::GraphProto) -> Result<Self> {
        let nodes = proto
            .node
            .iter()
            .map(OnnxNode::from_protobuf)
            .collect::<Result<Vec<_>>>()?;

        let inputs = proto
            .input
            .iter()
            .map(OnnxValueInfo::from_protobuf)
            .collect::<Result<Vec<_>>>()?;

        let outputs = proto
            .output
            .iter()
            .map(OnnxValueInfo::from_protobuf)
            .collect::<Result<Vec<_>>>()?;

        let initializers = proto
            .initializer
            .iter()
            .map(OnnxTensor::from_protobuf)
            .collect::<Result<Vec<_>>>()?;

        Ok(OnnxGraph {
            name: proto.name.clone().unwrap_or_else(|| "graph".to_string()),
            nodes,
            inputs,
            outputs,
            initializers,
        })
    }
}

/// ONNX node representation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OnnxNode {
    pub name: String,
    pub op_type: String,
    pub inputs: Vec<String>,
    pub outputs: Vec<String>,
    pub attributes: BTreeMap<String, OnnxAttribute>,
}

impl OnnxNode {
    /// Create a new ONNX node
    pub fn new(
        name: impl Into<String>,
        op_type: impl Into<String>,
        inputs: Vec<String>,
        outputs: Vec<String>,
    ) -> Self {
        Self {
            name: name.into(),
            op_type: op_type.into(),
            inputs,
            outputs,
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_attribute(mut self, name: &str, value: OnnxAttribute) -> Self {
        self.attributes.insert(name.to_string(), value);
        self
    }

    pub fn attribute_int(&self, name: &str) -> Option<i64> {
        match self.attributes.get(name) {
            Some(OnnxAttribute::Int(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn attribute_ints(&self, name: &str) -> Option<&[i64]> {
        match self.attributes.get(name) {
            Some(OnnxAttribute::Ints(v)) => Some(v),
            _ => None,
        }
    }

    pub fn attribute_string(&self, name: &str) -> Option<&str> {
        match self.attributes.get(name) {
            Some(OnnxAttribute::String(v)) => Some(v),
            _ => None,
        }
    }

    /// The `index`th input name, or an error naming this node
    pub fn input(&self, index: usize) -> Result<&str> {
        self.inputs.get(index).map(String::as_str).ok_or_else(|| {
            TensorError::invalid_operation(
                &self.op_type,
                format!("node '{}' is missing input #{index}", self.name),
            )
        })
    }

    /// The single output name, or an error naming this node
    pub fn output(&self) -> Result<&str> {
        match self.outputs.as_slice() {
            [name] => Ok(name),
            other => Err(TensorError::invalid_operation(
                &self.op_type,
                format!("node '{}' must have one output, has {}", self.name, other.len()),
            )),
        }
    }
}

#[cfg(feature = "onnx")]
impl OnnxNode {
    /// Convert to protobuf format
    pub fn to_protobuf(&self) -> proto::NodeProto {
        proto::NodeProto {
            input: self.inputs.clone(),
            output: self.outputs.clone(),
            name: Some(self.name.clone()),
            op_type: Some(self.op_type.clone()),
            attribute: self
                .attributes
                .iter()
                .map(|(k, v)| v.to_protobuf(k))
                .collect(),
        }
    }

    /// Convert from protobuf format
    pub fn from_protobuf(proto: &proto::NodeProto) -> Result<Self> {
        let mut attributes = BTreeMap::new();
        for attr in &proto.attribute {
            if let Some(name) = &attr.name {
                attributes.insert(name.clone(), OnnxAttribute::from_protobuf(attr)?);
            }
        }

        let op_type = proto.op_type.clone().ok_or_else(|| {
            OnnxError::ConversionError("node without op_type".to_string())
        })?;

        Ok(OnnxNode {
            name: proto.name.clone().unwrap_or_else(|| op_type.clone()),
            op_type,
            inputs: proto.input.clone(),
            outputs: proto.output.clone(),
            attributes,
        })
    }
}

/// ONNX value info (for inputs/outputs)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OnnxValueInfo {
    pub name: String,
    pub elem_type: OnnxDataType,
    /// Static dimensions; `-1` marks a symbolic dimension
    pub shape: Vec<i64>,
}

impl OnnxValueInfo {
    /// Create a new ONNX value info
    pub fn new(name: impl Into<String>, elem_type: OnnxDataType, shape: Vec<i64>) -> Self {
        Self {
            name: name.into(),
            elem_type,
            shape,
        }
    }

    /// Shape as concrete dimensions, or `None` if any dimension is symbolic
    pub fn static_shape(&self) -> Option<Vec<usize>> {
        self.shape
            .iter()
            .map(|&d| usize::try_from(d).ok())
            .collect()
    }
}

#[cfg(feature = "onnx")]
impl OnnxValueInfo {
    /// Convert to protobuf format
    pub fn to_protobuf(&self) -> proto::ValueInfoProto {
        use proto::tensor_shape_proto::{dimension::Value as DimValue, Dimension};
        use proto::type_proto::{Tensor as TypeTensor, Value as TypeValue};

        let dim = self
            .shape
            .iter()
            .map(|&d| Dimension {
                value: Some(if d < 0 {
                    DimValue::DimParam("N".to_string())
                } else {
                    DimValue::DimValue(d)
                }),
            })
            .collect();

        proto::ValueInfoProto {
            name: Some(self.name.clone()),
            r#type: Some(proto::TypeProto {
                value: Some(TypeValue::TensorType(TypeTensor {
                    elem_type: Some(self.elem_type.code()),
                    shape: Some(proto::TensorShapeProto { dim }),
                })),
            }),
            doc_string: None,
        }
    }

    /// Convert from protobuf format
    pub fn from_protobuf(proto: &proto::ValueInfoProto) -> Result<Self> {
        use proto::tensor_shape_proto::dimension::Value as DimValue;
        use proto::type_proto::Value as TypeValue;

        let name = proto
            .name
            .clone()
            .ok_or_else(|| OnnxError::ConversionError("value info without name".to_string()))?;

        let Some(TypeValue::TensorType(tensor_type)) =
            proto.r#type.as_ref().and_then(|t| t.value.as_ref())
        else {
            return Err(OnnxError::ConversionError(format!(
                "value '{name}' is not a tensor type"
            ))
            .into());
        };

        let elem_type = OnnxDataType::from_code(tensor_type.elem_type.unwrap_or(1))?;
        let shape = tensor_type
            .shape
            .as_ref()
            .map(|s| {
                s.dim
                    .iter()
                    .map(|d| match d.value {
                        Some(DimValue::DimValue(v)) => v,
                        _ => -1,
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(OnnxValueInfo {
            name,
            elem_type,
            shape,
        })
    }
}

/// ONNX tensor (for weights/initializers)
///
/// Data is always held as packed little-endian `raw_data`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OnnxTensor {
    pub name: String,
    pub data_type: OnnxDataType,
    pub dims: Vec<i64>,
    pub raw_data: Vec<u8>,
}

impl OnnxTensor {
    /// Create a new ONNX tensor
    pub fn new(
        name: impl Into<String>,
        data_type: OnnxDataType,
        dims: Vec<i64>,
        raw_data: Vec<u8>,
    ) -> Self {
        Self {
            name: name.into(),
            data_type,
            dims,
            raw_data,
        }
    }

    /// Float32 initializer holding a copy of `tensor`
    pub fn from_tensor(name: impl Into<String>, tensor: &Tensor<f32>) -> Self {
        Self::new(
            name,
            OnnxDataType::Float32,
            tensor.dims().iter().map(|&d| d as i64).collect(),
            bytes::f32_to_le_bytes(&tensor.to_vec()),
        )
    }

    /// 1-D Int64 initializer, as used for `Reshape` targets
    pub fn from_i64s(name: impl Into<String>, values: &[i64]) -> Self {
        Self::new(
            name,
            OnnxDataType::Int64,
            vec![values.len() as i64],
            bytes::i64_to_le_bytes(values),
        )
    }

    pub fn shape(&self) -> Result<Vec<usize>> {
        self.dims
            .iter()
            .map(|&d| {
                usize::try_from(d).map_err(|_| {
                    TensorError::from(OnnxError::MalformedTensor {
                        name: self.name.clone(),
                        reason: format!("negative dimension {d}"),
                    })
                })
            })
            .collect()
    }

    fn check_length(&self) -> Result<usize> {
        let numel: usize = self.shape()?.iter().product();
        let expected = numel * self.data_type.element_size();
        if self.raw_data.len() != expected {
            return Err(OnnxError::MalformedTensor {
                name: self.name.clone(),
                reason: format!(
                    "{} bytes of raw data for {numel} {:?} elements",
                    self.raw_data.len(),
                    self.data_type
                ),
            }
            .into());
        }
        Ok(numel)
    }

    /// Decode a floating point initializer as `f32`
    pub fn to_f32_tensor(&self) -> Result<Tensor<f32>> {
        self.check_length()?;
        let values = match self.data_type {
            OnnxDataType::Float32 => bytes::f32_from_le_bytes(&self.raw_data)?,
            OnnxDataType::Float64 => bytes::f64_from_le_bytes(&self.raw_data)?
                .into_iter()
                .map(|v| v as f32)
                .collect(),
            other => {
                return Err(OnnxError::MalformedTensor {
                    name: self.name.clone(),
                    reason: format!("expected a float tensor, found {other:?}"),
                }
                .into())
            }
        };
        Tensor::from_vec(values, &self.shape()?)
    }

    /// Decode an Int64 initializer
    pub fn to_i64_values(&self) -> Result<Vec<i64>> {
        self.check_length()?;
        if self.data_type != OnnxDataType::Int64 {
            return Err(OnnxError::MalformedTensor {
                name: self.name.clone(),
                reason: format!("expected an int64 tensor, found {:?}", self.data_type),
            }
            .into());
        }
        bytes::i64_from_le_bytes(&self.raw_data)
    }
}

#[cfg(feature = "onnx")]
impl OnnxTensor {
    /// Convert to protobuf format
    pub fn to_protobuf(&self) -> proto::TensorProto {
        proto::TensorProto {
            dims: self.dims.clone(),
            data_type: Some(self.data_type.code()),
            name: Some(self.name.clone()),
            raw_data: Some(self.raw_data.clone()),
            float_data: Vec::new(),
            int64_data: Vec::new(),
        }
    }

    /// Convert from protobuf format
    ///
    /// Typed `float_data` / `int64_data` fields are folded into `raw_data`.
    pub fn from_protobuf(proto: &proto::TensorProto) -> Result<Self> {
        let data_type = OnnxDataType::from_code(proto.data_type.unwrap_or(1))?;
        let name = proto.name.clone().unwrap_or_default();

        let raw_data = match (&proto.raw_data, data_type) {
            (Some(raw), _) => raw.clone(),
            (None, OnnxDataType::Float32) => bytes::f32_to_le_bytes(&proto.float_data),
            (None, OnnxDataType::Int64) => bytes::i64_to_le_bytes(&proto.int64_data),
            (None, other) => {
                return Err(OnnxError::MalformedTensor {
                    name,
                    reason: format!("no raw data for {other:?} tensor"),
                }
                .into())
            }
        };

        Ok(OnnxTensor {
            name,
            data_type,
            dims: proto.dims.clone(),
            raw_data,
        })
    }
}

/// ONNX attribute value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum OnnxAttribute {
    Float(f32),
    Int(i64),
    String(String),
    Floats(Vec<f32>),
    Ints(Vec<i64>),
}

#[cfg(feature = "onnx")]
impl OnnxAttribute {
    /// Convert to protobuf format
    pub fn to_protobuf(&self, name: &str) -> proto::AttributeProto {
        let mut attr = proto::AttributeProto {
            name: Some(name.to_string()),
            ..Default::default()
        };

        match self {
            OnnxAttribute::Float(value) => {
                attr.f = Some(*value);
                attr.r#type = Some(proto::AttributeType::Float as i32);
            }
            OnnxAttribute::Int(value) => {
                attr.i = Some(*value);
                attr.r#type = Some(proto::AttributeType::Int as i32);
            }
            OnnxAttribute::String(value) => {
                attr.s = Some(value.as_bytes().to_vec());
                attr.r#type = Some(proto::AttributeType::String as i32);
            }
            OnnxAttribute::Floats(values) => {
                attr.floats = values.clone();
                attr.r#type = Some(proto::AttributeType::Floats as i32);
            }
            OnnxAttribute::Ints(values) => {
                attr.ints = values.clone();
                attr.r#type = Some(proto::AttributeType::Ints as i32);
            }
        }

        attr
    }

    /// Convert from protobuf format
    pub fn from_protobuf(proto: &proto::AttributeProto) -> Result<Self> {
        use proto::AttributeType;

        match AttributeType::try_from(proto.r#type.unwrap_or(0)) {
            Ok(AttributeType::Float) => Ok(OnnxAttribute::Float(proto.f.unwrap_or(0.0))),
            Ok(AttributeType::Int) => Ok(OnnxAttribute::Int(proto.i.unwrap_or(0))),
            Ok(AttributeType::String) => Ok(OnnxAttribute::String(
                proto
                    .s
                    .as_ref()
                    .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
                    .unwrap_or_default(),
            )),
            Ok(AttributeType::Floats) => Ok(OnnxAttribute::Floats(proto.floats.clone())),
            Ok(AttributeType::Ints) => Ok(OnnxAttribute::Ints(proto.ints.clone())),
            _ => Err(OnnxError::ConversionError(format!(
                "attribute '{}' has unsupported type {:?}",
                proto.name.as_deref().unwrap_or_default(),
                proto.r#type
            ))
            .into()),
        }
    }
}
