//! Sub-pixel rearrangement layer

use crate::layers::{Layer, LayerType};
use srgraph_core::{ops, Result, Tensor};

/// Folds `r²` channels into an `r×r` spatial block per input pixel
#[derive(Debug, Clone)]
pub struct PixelShuffle {
    name: String,
    upscale_factor: usize,
}

impl PixelShuffle {
    pub fn new(name: impl Into<String>, upscale_factor: usize) -> Self {
        Self {
            name: name.into(),
            upscale_factor,
        }
    }

    pub fn upscale_factor(&self) -> usize {
        self.upscale_factor
    }
}

impl<T> Layer<T> for PixelShuffle
where
    T: Clone + Send + Sync,
{
    fn forward(&self, input: &Tensor<T>) -> Result<Tensor<T>> {
        ops::pixel_shuffle(input, self.upscale_factor)
    }

    fn layer_type(&self) -> LayerType {
        LayerType::PixelShuffle
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shuffle_layer_shape() {
        let layer = PixelShuffle::new("pixel_shuffle", 3);
        let input = Tensor::<f32>::zeros(&[2, 9, 5, 7]);
        let output = layer.forward(&input).unwrap();
        assert_eq!(output.dims(), &[2, 1, 15, 21]);
        assert_eq!(Layer::<f32>::layer_type(&layer), LayerType::PixelShuffle);
    }
}
