//! ONNX interchange export
//!
//! ## Module Organization
//!
//! - **types**: error type, file format and element type enums
//! - **proto**: protobuf messages (when the `onnx` feature is enabled)
//! - **data**: graphs, nodes, value infos, initializers and attributes
//! - **model**: model metadata, JSON/protobuf encoding and file I/O
//! - **serialization**: serde glue for integer-coded types
//! - **topology**: static shape propagation over a graph
//! - **traits**: the [`OnnxExport`] trait
//! - **super_resolution**: export of the super-resolution network

pub mod data;
pub mod model;
pub mod proto;
pub mod serialization;
pub mod super_resolution;
pub mod topology;
pub mod traits;
pub mod types;

pub use types::{OnnxDataType, OnnxError, OnnxFormat};

#[cfg(feature = "onnx")]
pub use proto::proto as onnx_proto;

pub use data::{OnnxAttribute, OnnxGraph, OnnxNode, OnnxTensor, OnnxValueInfo};
pub use model::OnnxModel;
pub use super_resolution::{INPUT_NAME, OUTPUT_NAME};
pub use topology::{NodeSummary, SUPPORTED_OPS};
pub use traits::OnnxExport;
