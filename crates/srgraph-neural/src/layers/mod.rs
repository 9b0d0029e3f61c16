pub mod activation;
pub mod conv;
pub mod pixel_shuffle;

pub use activation::ReLU;
pub use conv::{Conv2D, ConvSpec};
pub use pixel_shuffle::PixelShuffle;

use srgraph_core::{Result, Tensor};

/// Layer kinds that appear in the super-resolution graph
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerType {
    Conv2D,
    ReLU,
    PixelShuffle,
}

impl LayerType {
    /// Convert layer type to ONNX operation type
    pub fn to_onnx_op_type(&self) -> &'static str {
        match self {
            LayerType::Conv2D => "Conv",
            LayerType::ReLU => "Relu",
            LayerType::PixelShuffle => "DepthToSpace",
        }
    }
}

/// A stateless forward computation with bound parameters
///
/// Layers are immutable once constructed; `forward` is a pure function of the
/// layer's parameters and its input.
pub trait Layer<T>: Send + Sync {
    fn forward(&self, input: &Tensor<T>) -> Result<Tensor<T>>;

    fn parameters(&self) -> Vec<&Tensor<T>> {
        Vec::new()
    }

    /// Returns the type of this layer for ONNX export and introspection
    fn layer_type(&self) -> LayerType;

    /// Stable name used in error messages and exported node names
    fn name(&self) -> &str;
}
