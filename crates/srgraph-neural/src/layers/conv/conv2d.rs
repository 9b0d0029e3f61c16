//! 2D Convolution Layer Implementation
//!
//! A cross-correlation layer with parameters bound at construction. Weight
//! layout is `[out_channels, in_channels, kernel_h, kernel_w]`, bias is
//! `[out_channels]`.

use crate::layers::{Layer, LayerType};
use num_traits::Float;
use srgraph_core::{ops, Padding2D, Result, Tensor, TensorError};

/// Static description of a convolution stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConvSpec {
    pub in_channels: usize,
    pub out_channels: usize,
    pub kernel_size: (usize, usize),
    pub stride: (usize, usize),
    pub padding: Padding2D,
}

impl ConvSpec {
    /// Stride-1 convolution padded by `kernel / 2` so spatial size is preserved
    pub fn same(in_channels: usize, out_channels: usize, kernel: usize) -> Self {
        Self {
            in_channels,
            out_channels,
            kernel_size: (kernel, kernel),
            stride: (1, 1),
            padding: Padding2D::same_for((kernel, kernel)),
        }
    }

    pub fn weight_shape(&self) -> [usize; 4] {
        [
            self.out_channels,
            self.in_channels,
            self.kernel_size.0,
            self.kernel_size.1,
        ]
    }

    pub fn bias_shape(&self) -> [usize; 1] {
        [self.out_channels]
    }

    /// Fan-in of a single output unit
    pub fn receptive_field(&self) -> usize {
        self.in_channels * self.kernel_size.0 * self.kernel_size.1
    }

    /// Output spatial size for an `h x w` input
    pub fn output_hw(&self, h: usize, w: usize) -> Option<(usize, usize)> {
        let padded_h = h + self.padding.top + self.padding.bottom;
        let padded_w = w + self.padding.left + self.padding.right;
        if padded_h < self.kernel_size.0 || padded_w < self.kernel_size.1 {
            return None;
        }
        Some((
            (padded_h - self.kernel_size.0) / self.stride.0 + 1,
            (padded_w - self.kernel_size.1) / self.stride.1 + 1,
        ))
    }
}

/// 2D convolutional layer
///
/// Construction validates both parameter shapes against the [`ConvSpec`], so
/// a successfully built layer can only fail at `forward` because of its input.
#[derive(Debug, Clone)]
pub struct Conv2D<T> {
    name: String,
    spec: ConvSpec,
    weight: Tensor<T>,
    bias: Tensor<T>,
}

impl<T> Conv2D<T>
where
    T: Float + Send + Sync,
{
    /// Bind `weight` and `bias` to a convolution described by `spec`
    ///
    /// Fails with `ParameterError` naming `<name>.weight` or `<name>.bias` when
    /// a tensor's shape does not match the convolution it describes.
    pub fn from_parameters(
        name: impl Into<String>,
        spec: ConvSpec,
        weight: Tensor<T>,
        bias: Tensor<T>,
    ) -> Result<Self> {
        let name = name.into();
        check_parameter(&format!("{name}.weight"), &weight, &spec.weight_shape())?;
        check_parameter(&format!("{name}.bias"), &bias, &spec.bias_shape())?;

        Ok(Self {
            name,
            spec,
            weight,
            bias,
        })
    }

    pub fn spec(&self) -> &ConvSpec {
        &self.spec
    }

    /// Get a reference to the weight tensor
    pub fn weight(&self) -> &Tensor<T> {
        &self.weight
    }

    /// Get a reference to the bias tensor
    pub fn bias(&self) -> &Tensor<T> {
        &self.bias
    }
}

fn check_parameter<T>(parameter: &str, tensor: &Tensor<T>, expected: &[usize]) -> Result<()> {
    if tensor.dims() != expected {
        return Err(TensorError::parameter_error(
            parameter,
            format!("expected shape {expected:?}, got {:?}", tensor.dims()),
        ));
    }
    Ok(())
}

impl<T> Layer<T> for Conv2D<T>
where
    T: Float + Send + Sync,
{
    fn forward(&self, input: &Tensor<T>) -> Result<Tensor<T>> {
        let (_, channels, _, _) = input.shape().nchw(&self.name)?;
        if channels != self.spec.in_channels {
            return Err(TensorError::shape_error(
                &self.name,
                self.spec.in_channels,
                channels,
            ));
        }

        ops::conv2d(
            input,
            &self.weight,
            Some(&self.bias),
            self.spec.stride,
            self.spec.padding,
        )
    }

    fn parameters(&self) -> Vec<&Tensor<T>> {
        vec![&self.weight, &self.bias]
    }

    fn layer_type(&self) -> LayerType {
        LayerType::Conv2D
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity_layer() -> Conv2D<f32> {
        let spec = ConvSpec::same(1, 1, 3);
        let mut weight = vec![0.0f32; 9];
        weight[4] = 1.0;
        Conv2D::from_parameters(
            "conv",
            spec,
            Tensor::from_vec(weight, &[1, 1, 3, 3]).unwrap(),
            Tensor::zeros(&[1]),
        )
        .unwrap()
    }

    #[test]
    fn test_same_spec_preserves_size() {
        let spec = ConvSpec::same(1, 64, 5);
        assert_eq!(spec.padding, Padding2D::symmetric(2, 2));
        assert_eq!(spec.output_hw(224, 17), Some((224, 17)));
        assert_eq!(spec.weight_shape(), [64, 1, 5, 5]);
        assert_eq!(spec.receptive_field(), 25);
    }

    #[test]
    fn test_identity_forward() {
        let layer = identity_layer();
        let input = Tensor::<f32>::random_uniform(&[2, 1, 4, 6], 3);
        let output = layer.forward(&input).unwrap();
        assert_eq!(output, input);
        assert_eq!(layer.parameters().len(), 2);
        assert_eq!(layer.layer_type().to_onnx_op_type(), "Conv");
    }

    #[test]
    fn test_wrong_weight_shape_is_parameter_error() {
        let spec = ConvSpec::same(64, 32, 3);
        let err = Conv2D::<f32>::from_parameters(
            "conv3",
            spec,
            Tensor::zeros(&[32, 64, 5, 5]),
            Tensor::zeros(&[32]),
        )
        .unwrap_err();
        assert!(err.is_parameter_error());
        assert!(err.to_string().contains("conv3.weight"));

        let err = Conv2D::<f32>::from_parameters(
            "conv3",
            spec,
            Tensor::zeros(&[32, 64, 3, 3]),
            Tensor::zeros(&[64]),
        )
        .unwrap_err();
        assert!(err.to_string().contains("conv3.bias"));
    }

    #[test]
    fn test_channel_mismatch_is_shape_error() {
        let layer = identity_layer();
        let input = Tensor::<f32>::zeros(&[1, 3, 4, 4]);
        match layer.forward(&input) {
            Err(TensorError::ShapeError {
                layer,
                expected,
                actual,
            }) => {
                assert_eq!(layer, "conv");
                assert_eq!(expected, 1);
                assert_eq!(actual, 3);
            }
            other => panic!("expected ShapeError, got {other:?}"),
        }
    }
}
