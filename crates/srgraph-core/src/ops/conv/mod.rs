//! 2D convolution operations
//!
//! Both kernels compute cross-correlation (the kernel is not flipped) over
//! NCHW tensors with explicit zero padding:
//!
//! - **conv2d**: direct accumulation, parallel over `(batch, out_channel)` planes
//! - **im2col**: patch matrix + GEMM, used by the graph executor

pub mod conv2d;
pub mod im2col;

pub use conv2d::conv2d;
pub use im2col::conv2d_im2col;

use crate::{Result, Tensor, TensorError};

/// Explicit zero padding on each spatial border
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(
    feature = "serialize",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct Padding2D {
    pub top: usize,
    pub bottom: usize,
    pub left: usize,
    pub right: usize,
}

impl Padding2D {
    /// No padding
    pub fn valid() -> Self {
        Self::default()
    }

    /// Same padding on opposite borders
    pub fn symmetric(pad_h: usize, pad_w: usize) -> Self {
        Self {
            top: pad_h,
            bottom: pad_h,
            left: pad_w,
            right: pad_w,
        }
    }

    /// Padding that preserves spatial size for an odd kernel at stride 1
    pub fn same_for(kernel: (usize, usize)) -> Self {
        Self::symmetric(kernel.0 / 2, kernel.1 / 2)
    }

    /// Padding in ONNX `pads` order: `[top, left, bottom, right]`
    pub fn to_onnx_pads(&self) -> [usize; 4] {
        [self.top, self.left, self.bottom, self.right]
    }

    /// Build from ONNX `pads` order
    pub fn from_onnx_pads(pads: &[usize]) -> Result<Self> {
        match pads {
            &[top, left, bottom, right] => Ok(Self {
                top,
                bottom,
                left,
                right,
            }),
            _ => Err(TensorError::invalid_argument_op(
                "conv2d",
                &format!("expected 4 pad values, got {}", pads.len()),
            )),
        }
    }
}

/// Resolved convolution geometry shared by both kernels
#[derive(Debug, Clone, Copy)]
pub(crate) struct ConvGeometry {
    pub batch: usize,
    pub in_channels: usize,
    pub in_height: usize,
    pub in_width: usize,
    pub out_channels: usize,
    pub kernel_height: usize,
    pub kernel_width: usize,
    pub out_height: usize,
    pub out_width: usize,
    pub stride: (usize, usize),
    pub padding: Padding2D,
}

impl ConvGeometry {
    pub(crate) fn resolve<T>(
        input: &Tensor<T>,
        weight: &Tensor<T>,
        bias: Option<&Tensor<T>>,
        stride: (usize, usize),
        padding: Padding2D,
    ) -> Result<Self> {
        let (batch, in_channels, in_height, in_width) = input.shape().nchw("conv2d")?;
        let (out_channels, weight_in_channels, kernel_height, kernel_width) =
            weight.shape().nchw("conv2d")?;

        if in_channels != weight_in_channels {
            return Err(TensorError::shape_mismatch(
                "conv2d",
                &format!("input channels={weight_in_channels}"),
                &format!("input channels={in_channels}"),
            ));
        }

        if let Some(bias) = bias {
            if bias.dims() != [out_channels] {
                return Err(TensorError::shape_mismatch(
                    "conv2d",
                    &format!("bias shape [{out_channels}]"),
                    &format!("bias shape {}", bias.shape()),
                ));
            }
        }

        if stride.0 == 0 || stride.1 == 0 {
            return Err(TensorError::invalid_argument_op(
                "conv2d",
                "stride must be positive",
            ));
        }

        let padded_height = in_height + padding.top + padding.bottom;
        let padded_width = in_width + padding.left + padding.right;
        if kernel_height == 0
            || kernel_width == 0
            || padded_height < kernel_height
            || padded_width < kernel_width
        {
            return Err(TensorError::invalid_shape(
                "conv2d",
                format!(
                    "kernel {kernel_height}x{kernel_width} does not fit padded input {padded_height}x{padded_width}"
                ),
                input.dims(),
            ));
        }

        Ok(Self {
            batch,
            in_channels,
            in_height,
            in_width,
            out_channels,
            kernel_height,
            kernel_width,
            out_height: (padded_height - kernel_height) / stride.0 + 1,
            out_width: (padded_width - kernel_width) / stride.1 + 1,
            stride,
            padding,
        })
    }

    pub(crate) fn output_dims(&self) -> [usize; 4] {
        [
            self.batch,
            self.out_channels,
            self.out_height,
            self.out_width,
        ]
    }

    /// Input row for output row `oy` and kernel row `kh`, or `None` inside the padding
    #[inline]
    pub(crate) fn input_row(&self, oy: usize, kh: usize) -> Option<usize> {
        (oy * self.stride.0 + kh)
            .checked_sub(self.padding.top)
            .filter(|&iy| iy < self.in_height)
    }

    /// Input column for output column `ox` and kernel column `kw`, or `None` inside the padding
    #[inline]
    pub(crate) fn input_col(&self, ox: usize, kw: usize) -> Option<usize> {
        (ox * self.stride.1 + kw)
            .checked_sub(self.padding.left)
            .filter(|&ix| ix < self.in_width)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_padding_for_odd_kernels() {
        assert_eq!(Padding2D::same_for((5, 5)), Padding2D::symmetric(2, 2));
        assert_eq!(Padding2D::same_for((3, 3)), Padding2D::symmetric(1, 1));
    }

    #[test]
    fn test_onnx_pads_order() {
        let padding = Padding2D {
            top: 1,
            bottom: 2,
            left: 3,
            right: 4,
        };
        assert_eq!(padding.to_onnx_pads(), [1, 3, 2, 4]);
        assert_eq!(Padding2D::from_onnx_pads(&[1, 3, 2, 4]).unwrap(), padding);
        assert!(Padding2D::from_onnx_pads(&[1, 1]).is_err());
    }

    #[test]
    fn test_geometry_preserves_size_with_same_padding() {
        let input = Tensor::<f32>::zeros(&[2, 3, 7, 9]);
        let weight = Tensor::<f32>::zeros(&[4, 3, 3, 3]);
        let geometry =
            ConvGeometry::resolve(&input, &weight, None, (1, 1), Padding2D::same_for((3, 3)))
                .unwrap();
        assert_eq!(geometry.output_dims(), [2, 4, 7, 9]);
    }

    #[test]
    fn test_geometry_rejects_oversized_kernel() {
        let input = Tensor::<f32>::zeros(&[1, 1, 2, 2]);
        let weight = Tensor::<f32>::zeros(&[1, 1, 5, 5]);
        assert!(ConvGeometry::resolve(&input, &weight, None, (1, 1), Padding2D::valid()).is_err());
    }
}
