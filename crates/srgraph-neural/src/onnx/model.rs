//! ONNX Model Structure and Operations
//!
//! [`OnnxModel`] wraps a graph with the model-level metadata and handles the
//! JSON and protobuf encodings and file I/O.

use super::data::OnnxGraph;
use super::types::OnnxFormat;
use serde::{Deserialize, Serialize};
use srgraph_core::{Result, TensorError};
use std::path::Path;
use tracing::debug;

#[cfg(feature = "onnx")]
use super::proto;

/// ONNX IR version written by the exporter
pub const IR_VERSION: i64 = 7;

/// ONNX model representation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OnnxModel {
    pub ir_version: i64,
    /// Version of the default (`ai.onnx`) operator set
    pub opset_version: i64,
    pub producer_name: String,
    pub producer_version: String,
    pub domain: String,
    pub model_version: i64,
    pub doc_string: String,
    pub graph: OnnxGraph,
}

impl OnnxModel {
    /// Create a new ONNX model targeting opset 13
    pub fn new(graph: OnnxGraph) -> Self {
        Self {
            ir_version: IR_VERSION,
            opset_version: 13,
            producer_name: "srgraph".to_string(),
            producer_version: env!("CARGO_PKG_VERSION").to_string(),
            domain: String::new(),
            model_version: 1,
            doc_string: String::new(),
            graph,
        }
    }

    /// Convert to JSON format
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| {
            TensorError::serialization_error("onnx_to_json", e.to_string())
        })
    }

    /// Create from JSON format
    pub fn from_json(json_str: &str) -> Result<Self> {
        serde_json::from_str(json_str).map_err(|e| {
            TensorError::serialization_error("onnx_from_json", e.to_string())
        })
    }

    /// Convert to protobuf format
    #[cfg(feature = "onnx")]
    pub fn to_protobuf(&self) -> proto::ModelProto {
        proto::ModelProto {
            ir_version: Some(self.ir_version),
            opset_import: vec![proto::OperatorSetIdProto {
                domain: Some(String::new()),
                version: Some(self.opset_version),
            }],
            producer_name: Some(self.producer_name.clone()),
            producer_version: Some(self.producer_version.clone()),
            domain: Some(self.domain.clone()),
            model_version: Some(self.model_version),
            doc_string: Some(self.doc_string.clone()),
            graph: Some(self.graph.to_protobuf()),
        }
    }

    /// Encode as an ONNX protobuf byte stream
    #[cfg(feature = "onnx")]
    pub fn to_protobuf_bytes(&self) -> Vec<u8> {
        use prost::Message;
        self.to_protobuf().encode_to_vec()
    }

    /// Decode an ONNX protobuf byte stream
    #[cfg(feature = "onnx")]
    pub fn from_protobuf_bytes(data: &[u8]) -> Result<Self> {
        use prost::Message;

        let proto_model = proto::ModelProto::decode(data)
            .map_err(super::types::OnnxError::from)?;

        let graph = match &proto_model.graph {
            Some(graph_proto) => OnnxGraph::from_protobuf(graph_proto)?,
            None => {
                return Err(TensorError::serialization_error(
                    "onnx_from_protobuf",
                    "model has no graph",
                ))
            }
        };

        let opset_version = proto_model
            .opset_import
            .iter()
            .find(|op| op.domain.as_deref().unwrap_or_default().is_empty())
            .and_then(|op| op.version)
            .unwrap_or(1);

        Ok(OnnxModel {
            ir_version: proto_model.ir_version.unwrap_or(IR_VERSION),
            opset_version,
            producer_name: proto_model.producer_name.unwrap_or_default(),
            producer_version: proto_model.producer_version.unwrap_or_default(),
            domain: proto_model.domain.unwrap_or_default(),
            model_version: proto_model.model_version.unwrap_or(1),
            doc_string: proto_model.doc_string.unwrap_or_default(),
            graph,
        })
    }

    /// Load model from file; JSON is recognised by extension or content
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read(path)
            .map_err(|e| TensorError::io_error("onnx_from_file", e.to_string(), path))?;
        let model = match OnnxFormat::detect(path, &content) {
            OnnxFormat::Json => {
                let text = std::str::from_utf8(&content).map_err(|e| {
                    TensorError::serialization_error("onnx_from_file", e.to_string())
                })?;
                Self::from_json(text)?
            }
            OnnxFormat::Protobuf => {
                #[cfg(feature = "onnx")]
                {
                    Self::from_protobuf_bytes(&content)?
                }
                #[cfg(not(feature = "onnx"))]
                {
                    return Err(TensorError::unsupported_operation(
                        "onnx_from_file",
                        "protobuf format requires the 'onnx' feature",
                    ));
                }
            }
        };
        debug!(
            path = %path.display(),
            nodes = model.graph.nodes.len(),
            "loaded ONNX model"
        );
        Ok(model)
    }

    /// Save model to file in specified format
    pub fn save_to_file(&self, path: impl AsRef<Path>, format: OnnxFormat) -> Result<()> {
        let path = path.as_ref();
        let bytes = match format {
            OnnxFormat::Json => self.to_json()?.into_bytes(),
            OnnxFormat::Protobuf => {
                #[cfg(feature = "onnx")]
                {
                    self.to_protobuf_bytes()
                }
                #[cfg(not(feature = "onnx"))]
                {
                    return Err(TensorError::unsupported_operation(
                        "onnx_save_to_file",
                        "protobuf format requires the 'onnx' feature",
                    ));
                }
            }
        };

        std::fs::write(path, &bytes)
            .map_err(|e| TensorError::io_error("onnx_save_to_file", e.to_string(), path))?;
        debug!(path = %path.display(), ?format, bytes = bytes.len(), "saved ONNX model");
        Ok(())
    }
}
