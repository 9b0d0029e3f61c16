//! # srgraph neural
//!
//! The sub-pixel super-resolution network and everything around it: weight
//! initialisation and loading, ONNX export, an independent graph executor,
//! and the cross-engine check that ties the two engines together.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use srgraph_neural::{ExportConfig, SuperResolutionConfig, SuperResolutionNet};
//! use srgraph_neural::verify::{seeded_input, verify_cross_engine};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let net = SuperResolutionNet::initialized(SuperResolutionConfig::new(3), 0)?;
//! let input = seeded_input(&[1, 1, 224, 224], 0);
//!
//! let output = net.forward(&input)?;
//! assert_eq!(output.dims(), &[1, 1, 672, 672]);
//!
//! verify_cross_engine(&net, &input, &ExportConfig::default(), 1e-3)?.ensure()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Loading Pretrained Weights
//!
//! ```rust,no_run
//! use srgraph_neural::{SuperResolutionConfig, SuperResolutionNet, WeightLoader};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let weights = WeightLoader::new().load_from_file("weights.safetensors")?;
//! let net = SuperResolutionNet::new(SuperResolutionConfig::new(3), &weights.weights)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture Overview
//!
//! - [`layers`]: `Conv2D`, `ReLU` and `PixelShuffle` behind the [`Layer`] trait
//! - [`model`]: the static stage table and [`SuperResolutionNet`]
//! - [`init`]: orthogonal initialisation
//! - [`serialization`]: [`ParameterStore`] and the safetensors/JSON [`WeightLoader`]
//! - [`onnx`]: graph data model, protobuf/JSON encoding and export
//! - [`runtime`]: [`GraphExecutor`] over a caller-owned [`Workspace`]
//! - [`verify`]: output comparison and the cross-engine check
//! - [`config`]: serde configuration and its file loader

#![deny(unsafe_code)]
#![allow(clippy::result_large_err)]
#![allow(clippy::needless_range_loop)]

pub mod config;
pub mod init;
pub mod layers;
pub mod model;
pub mod onnx;
pub mod runtime;
pub mod serialization;
pub mod verify;

pub use config::{
    ConfigFormat, ConfigLoader, ExportConfig, PipelineConfig, ShuffleLowering,
    SuperResolutionConfig, VerificationConfig,
};
pub use init::{calculate_gain, init_parameters, orthogonal, Nonlinearity};
pub use layers::{Conv2D, ConvSpec, Layer, LayerType, PixelShuffle, ReLU};
pub use model::{
    stage_descriptors, Model, StageDescriptor, StageKind, StageOutput, SuperResolutionNet,
};
pub use onnx::{OnnxExport, OnnxFormat, OnnxGraph, OnnxModel};
pub use runtime::{GraphExecutor, Workspace};
pub use serialization::{LoadConfig, LoadResult, ParameterStore, WeightFormat, WeightLoader};
pub use verify::{compare_outputs, verify_cross_engine, VerificationReport};

pub use srgraph_core::{Result, Tensor, TensorError};
