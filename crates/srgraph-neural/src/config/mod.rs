//! Configuration for the super-resolution pipeline
//!
//! Every section has serde defaults, so a config file only needs to name the
//! values it changes:
//!
//! ```toml
//! [model]
//! upscale_factor = 3
//!
//! [export]
//! shuffle_lowering = "depth-to-space"
//! format = "json"
//!
//! [verification]
//! tolerance = 1e-3
//! ```

pub mod loader;

pub use loader::{ConfigFormat, ConfigLoader};

use crate::onnx::OnnxFormat;
use serde::{Deserialize, Serialize};
use srgraph_core::{Result, TensorError};
use std::path::Path;

/// Model hyper-parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SuperResolutionConfig {
    /// Spatial upscale factor `r`; the last convolution emits `r²` channels
    pub upscale_factor: usize,
}

impl SuperResolutionConfig {
    pub fn new(upscale_factor: usize) -> Self {
        Self { upscale_factor }
    }

    pub fn validate(&self) -> Result<()> {
        if self.upscale_factor == 0 {
            return Err(TensorError::invalid_argument_op(
                "SuperResolutionConfig",
                "upscale_factor must be at least 1",
            ));
        }
        Ok(())
    }
}

impl Default for SuperResolutionConfig {
    fn default() -> Self {
        Self { upscale_factor: 3 }
    }
}

/// How the pixel shuffle is written into an exported graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ShuffleLowering {
    /// `Reshape → Transpose → Reshape`, the form a graph tracer records
    #[default]
    ReshapeTranspose,
    /// A single `DepthToSpace` node in `CRD` mode
    DepthToSpace,
}

/// Interchange export settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub opset_version: i64,
    pub shuffle_lowering: ShuffleLowering,
    /// Output encoding; when unset the destination's extension decides
    pub format: Option<OnnxFormat>,
    pub graph_name: String,
    pub producer_name: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            opset_version: 13,
            shuffle_lowering: ShuffleLowering::default(),
            format: None,
            graph_name: "super_resolution".to_string(),
            producer_name: "srgraph".to_string(),
        }
    }
}

impl ExportConfig {
    pub fn with_lowering(mut self, lowering: ShuffleLowering) -> Self {
        self.shuffle_lowering = lowering;
        self
    }

    pub fn with_format(mut self, format: OnnxFormat) -> Self {
        self.format = Some(format);
        self
    }

    /// Encoding used when writing to `path`
    pub fn format_for(&self, path: &Path) -> OnnxFormat {
        self.format.unwrap_or_else(|| OnnxFormat::from_path(path))
    }
}

/// Cross-engine check settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerificationConfig {
    /// Largest accepted absolute difference between engines
    pub tolerance: f32,
    /// Seed of the synthetic input
    pub seed: u64,
    pub input_height: usize,
    pub input_width: usize,
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            tolerance: 1e-3,
            seed: 0,
            input_height: 224,
            input_width: 224,
        }
    }
}

impl VerificationConfig {
    /// Input shape `(1, 1, H, W)` used for verification
    pub fn input_shape(&self) -> [usize; 4] {
        [1, 1, self.input_height, self.input_width]
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.tolerance.is_finite() && self.tolerance >= 0.0) {
            return Err(TensorError::invalid_argument_op(
                "VerificationConfig",
                &format!("tolerance must be a non-negative number, got {}", self.tolerance),
            ));
        }
        if self.input_height == 0 || self.input_width == 0 {
            return Err(TensorError::invalid_argument_op(
                "VerificationConfig",
                "input height and width must be positive",
            ));
        }
        Ok(())
    }
}

/// Top-level configuration file layout
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub model: SuperResolutionConfig,
    pub export: ExportConfig,
    pub verification: VerificationConfig,
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<()> {
        self.model.validate()?;
        self.verification.validate()
    }
}
