pub mod super_resolution;

pub use super_resolution::{
    stage_descriptors, StageDescriptor, StageKind, StageOutput, SuperResolutionNet,
};

use srgraph_core::{Result, Tensor};

/// Core trait for inference models
pub trait Model<T>: Send + Sync {
    fn forward(&self, input: &Tensor<T>) -> Result<Tensor<T>>;

    fn parameters(&self) -> Vec<&Tensor<T>>;

    /// Output of every stage, in execution order
    ///
    /// Returns `None` if the model doesn't expose intermediate features.
    fn extract_features(&self, input: &Tensor<T>) -> Result<Option<Vec<Tensor<T>>>> {
        let _ = input;
        Ok(None)
    }
}
