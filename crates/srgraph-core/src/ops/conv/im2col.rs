//! im2col + GEMM convolution
//!
//! Unfolds each batch element into a `[in_channels * kh * kw, out_h * out_w]`
//! patch matrix and multiplies it by the flattened weight matrix. Semantics
//! match [`conv2d`](super::conv2d) exactly; only the accumulation order differs.

use super::{ConvGeometry, Padding2D};
use crate::{Result, Tensor, TensorError};
use ndarray::{Array2, ArrayD, Axis, IxDyn, LinalgScalar};
use num_traits::Float;

pub fn conv2d_im2col<T>(
    input: &Tensor<T>,
    weight: &Tensor<T>,
    bias: Option<&Tensor<T>>,
    stride: (usize, usize),
    padding: Padding2D,
) -> Result<Tensor<T>>
where
    T: Float + LinalgScalar,
{
    let geometry = ConvGeometry::resolve(input, weight, bias, stride, padding)?;

    let patch_len = geometry.in_channels * geometry.kernel_height * geometry.kernel_width;
    let plane = geometry.out_height * geometry.out_width;

    let weight_matrix: Array2<T> = Array2::from_shape_vec(
        (geometry.out_channels, patch_len),
        weight.to_vec(),
    )
    .map_err(|e| TensorError::compute_error("conv2d_im2col", e.to_string()))?;
    let input_arr = input.array();

    let mut output = ArrayD::<T>::zeros(IxDyn(&geometry.output_dims()));

    for b in 0..geometry.batch {
        let mut columns = Array2::<T>::zeros((patch_len, plane));
        for ic in 0..geometry.in_channels {
            for kh in 0..geometry.kernel_height {
                for kw in 0..geometry.kernel_width {
                    let row = (ic * geometry.kernel_height + kh) * geometry.kernel_width + kw;
                    for oy in 0..geometry.out_height {
                        let Some(iy) = geometry.input_row(oy, kh) else {
                            continue;
                        };
                        for ox in 0..geometry.out_width {
                            if let Some(ix) = geometry.input_col(ox, kw) {
                                columns[[row, oy * geometry.out_width + ox]] =
                                    input_arr[[b, ic, iy, ix]];
                            }
                        }
                    }
                }
            }
        }

        let product = weight_matrix.dot(&columns);
        let mut batch_out = output.index_axis_mut(Axis(0), b);
        for oc in 0..geometry.out_channels {
            let bias_val = bias
                .and_then(|bias| bias.get(&[oc]))
                .unwrap_or_else(T::zero);
            for p in 0..plane {
                batch_out[[oc, p / geometry.out_width, p % geometry.out_width]] =
                    product[[oc, p]] + bias_val;
            }
        }
    }

    Ok(Tensor::from_array(output))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::conv::conv2d;

    #[test]
    fn test_matches_direct_convolution() {
        let input = Tensor::<f32>::random_uniform(&[2, 3, 9, 7], 1);
        let weight = Tensor::<f32>::random_normal(&[4, 3, 3, 3], 2);
        let bias = Tensor::<f32>::random_normal(&[4], 3);

        for (stride, padding) in [
            ((1, 1), Padding2D::same_for((3, 3))),
            ((2, 1), Padding2D::valid()),
            ((1, 2), Padding2D::symmetric(2, 0)),
        ] {
            let direct = conv2d(&input, &weight, Some(&bias), stride, padding).unwrap();
            let gemm = conv2d_im2col(&input, &weight, Some(&bias), stride, padding).unwrap();
            assert_eq!(direct.dims(), gemm.dims());
            assert!(direct.allclose(&gemm, 1e-5, 1e-5));
        }
    }

    #[test]
    fn test_without_bias() {
        let input = Tensor::<f32>::ones(&[1, 1, 3, 3]);
        let weight = Tensor::<f32>::ones(&[1, 1, 3, 3]);
        let output = conv2d_im2col(&input, &weight, None, (1, 1), Padding2D::valid()).unwrap();
        assert_eq!(output.to_vec(), vec![9.0]);
    }
}
