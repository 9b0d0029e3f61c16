//! Direct 2D convolution
//!
//! Input shape: [batch, in_channels, height, width] (NCHW format)
//! Weight shape: [out_channels, in_channels, kernel_height, kernel_width]
//! Output shape: [batch, out_channels, out_height, out_width]

use super::{ConvGeometry, Padding2D};
use crate::{Result, Tensor, TensorError};
use ndarray::{ArrayD, IxDyn};
use num_traits::Float;
use rayon::prelude::*;

/// Performs 2D cross-correlation with explicit zero padding
///
/// Each output plane is accumulated in a fixed `(in_channel, kh, kw)` order and
/// the bias is added last, so repeated calls are bit-identical regardless of
/// how rayon schedules the planes.
pub fn conv2d<T>(
    input: &Tensor<T>,
    weight: &Tensor<T>,
    bias: Option<&Tensor<T>>,
    stride: (usize, usize),
    padding: Padding2D,
) -> Result<Tensor<T>>
where
    T: Float + Send + Sync,
{
    let geometry = ConvGeometry::resolve(input, weight, bias, stride, padding)?;

    let input_arr = input.array().as_standard_layout();
    let weight_arr = weight.array().as_standard_layout();
    let x = input_arr
        .as_slice()
        .ok_or_else(|| TensorError::compute_error("conv2d", "input is not contiguous"))?;
    let w = weight_arr
        .as_slice()
        .ok_or_else(|| TensorError::compute_error("conv2d", "weight is not contiguous"))?;
    let bias_values: Option<Vec<T>> = bias.map(|b| b.to_vec());

    let plane = geometry.out_height * geometry.out_width;
    let mut output = vec![T::zero(); geometry.batch * geometry.out_channels * plane];

    if plane > 0 {
        output
            .par_chunks_mut(plane)
            .enumerate()
            .for_each(|(index, out_plane)| {
                let b = index / geometry.out_channels;
                let oc = index % geometry.out_channels;
                accumulate_plane(&geometry, x, w, b, oc, out_plane);
                if let Some(bias) = &bias_values {
                    let bias_val = bias[oc];
                    out_plane.iter_mut().for_each(|v| *v = *v + bias_val);
                }
            });
    }

    let array = ArrayD::from_shape_vec(IxDyn(&geometry.output_dims()), output)
        .map_err(|e| TensorError::compute_error("conv2d", e.to_string()))?;
    Ok(Tensor::from_array(array))
}

fn accumulate_plane<T: Float>(
    geometry: &ConvGeometry,
    x: &[T],
    w: &[T],
    b: usize,
    oc: usize,
    out_plane: &mut [T],
) {
    let in_plane = geometry.in_height * geometry.in_width;
    let kernel_plane = geometry.kernel_height * geometry.kernel_width;

    for ic in 0..geometry.in_channels {
        let x_base = (b * geometry.in_channels + ic) * in_plane;
        let w_base = (oc * geometry.in_channels + ic) * kernel_plane;

        for kh in 0..geometry.kernel_height {
            for kw in 0..geometry.kernel_width {
                let weight_val = w[w_base + kh * geometry.kernel_width + kw];

                for oy in 0..geometry.out_height {
                    let Some(iy) = geometry.input_row(oy, kh) else {
                        continue;
                    };
                    let x_row = x_base + iy * geometry.in_width;
                    let out_row = oy * geometry.out_width;

                    for ox in 0..geometry.out_width {
                        if let Some(ix) = geometry.input_col(ox, kw) {
                            out_plane[out_row + ox] =
                                out_plane[out_row + ox] + x[x_row + ix] * weight_val;
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_kernel() {
        let input = Tensor::from_vec((0..9).map(|v| v as f32).collect(), &[1, 1, 3, 3]).unwrap();
        let mut kernel = vec![0.0f32; 9];
        kernel[4] = 1.0;
        let weight = Tensor::from_vec(kernel, &[1, 1, 3, 3]).unwrap();

        let output = conv2d(&input, &weight, None, (1, 1), Padding2D::same_for((3, 3))).unwrap();
        assert_eq!(output, input);
    }

    #[test]
    fn test_cross_correlation_is_not_flipped() {
        // Kernel picks the right-hand neighbour; a flipped kernel would pick the left one.
        let input = Tensor::from_vec(vec![1.0f32, 2.0, 3.0], &[1, 1, 1, 3]).unwrap();
        let weight = Tensor::from_vec(vec![0.0f32, 0.0, 1.0], &[1, 1, 1, 3]).unwrap();

        let output = conv2d(&input, &weight, None, (1, 1), Padding2D::symmetric(0, 1)).unwrap();
        assert_eq!(output.to_vec(), vec![2.0, 3.0, 0.0]);
    }

    #[test]
    fn test_bias_and_multiple_channels() {
        // Two input channels of ones, a 1x1 kernel summing them, bias 0.5.
        let input = Tensor::<f32>::ones(&[1, 2, 2, 2]);
        let weight = Tensor::from_vec(vec![1.0f32, 2.0], &[1, 2, 1, 1]).unwrap();
        let bias = Tensor::from_vec(vec![0.5f32], &[1]).unwrap();

        let output = conv2d(&input, &weight, Some(&bias), (1, 1), Padding2D::valid()).unwrap();
        assert_eq!(output.dims(), &[1, 1, 2, 2]);
        assert_eq!(output.to_vec(), vec![3.5; 4]);
    }

    #[test]
    fn test_zero_padding_border() {
        let input = Tensor::<f32>::ones(&[1, 1, 3, 3]);
        let weight = Tensor::<f32>::ones(&[1, 1, 3, 3]);

        let output = conv2d(&input, &weight, None, (1, 1), Padding2D::symmetric(1, 1)).unwrap();
        assert_eq!(
            output.to_vec(),
            vec![4.0, 6.0, 4.0, 6.0, 9.0, 6.0, 4.0, 6.0, 4.0]
        );
    }

    #[test]
    fn test_stride_two() {
        let input = Tensor::from_vec((0..16).map(|v| v as f32).collect(), &[1, 1, 4, 4]).unwrap();
        let weight = Tensor::<f32>::ones(&[1, 1, 1, 1]);

        let output = conv2d(&input, &weight, None, (2, 2), Padding2D::valid()).unwrap();
        assert_eq!(output.dims(), &[1, 1, 2, 2]);
        assert_eq!(output.to_vec(), vec![0.0, 2.0, 8.0, 10.0]);
    }

    #[test]
    fn test_channel_mismatch() {
        let input = Tensor::<f32>::zeros(&[1, 3, 4, 4]);
        let weight = Tensor::<f32>::zeros(&[8, 1, 3, 3]);
        let err = conv2d(&input, &weight, None, (1, 1), Padding2D::same_for((3, 3))).unwrap_err();
        assert!(matches!(err, TensorError::ShapeMismatch { .. }));
    }

    #[test]
    fn test_bias_length_mismatch() {
        let input = Tensor::<f32>::zeros(&[1, 1, 4, 4]);
        let weight = Tensor::<f32>::zeros(&[2, 1, 3, 3]);
        let bias = Tensor::<f32>::zeros(&[3]);
        assert!(conv2d(&input, &weight, Some(&bias), (1, 1), Padding2D::valid()).is_err());
    }
}
