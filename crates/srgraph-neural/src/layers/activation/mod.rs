//! Activation layers

use crate::layers::{Layer, LayerType};
use num_traits::Float;
use srgraph_core::{ops, Result, Tensor};

/// Element-wise `max(x, 0)`
#[derive(Debug, Clone)]
pub struct ReLU {
    name: String,
}

impl ReLU {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl<T> Layer<T> for ReLU
where
    T: Float + Send + Sync,
{
    fn forward(&self, input: &Tensor<T>) -> Result<Tensor<T>> {
        ops::relu(input)
    }

    fn layer_type(&self) -> LayerType {
        LayerType::ReLU
    }

    fn name(&self) -> &str {
        &self.name
    }
}
