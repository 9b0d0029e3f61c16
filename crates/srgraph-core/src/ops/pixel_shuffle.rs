//! Channel-to-space rearrangement (pixel shuffle) and its inverse
//!
//! For block size `r`, input `(N, C·r², H, W)` becomes `(N, C, H·r, W·r)` with
//!
//! ```text
//! out[n, c, h·r + i, w·r + j] = in[n, c·r² + i·r + j, h, w]    0 <= i, j < r
//! ```
//!
//! This is the same mapping as ONNX `DepthToSpace` in `CRD` mode.

use crate::{Result, Tensor, TensorError};
use ndarray::{ArrayD, IxDyn};

/// Rearrange `r²` channel groups into `r×r` spatial blocks
pub fn pixel_shuffle<T: Clone>(input: &Tensor<T>, upscale_factor: usize) -> Result<Tensor<T>> {
    let (n, c, h, w) = input.shape().nchw("pixel_shuffle")?;
    let r = upscale_factor;
    if r == 0 {
        return Err(TensorError::invalid_argument_op(
            "pixel_shuffle",
            "upscale factor must be positive",
        ));
    }
    let block = r * r;
    if c % block != 0 {
        return Err(TensorError::shape_mismatch(
            "pixel_shuffle",
            &format!("channel count divisible by {block}"),
            &format!("{c} channels"),
        ));
    }
    let out_c = c / block;

    let src = input.array();
    let array = ArrayD::from_shape_fn(IxDyn(&[n, out_c, h * r, w * r]), |idx| {
        let (oy, ox) = (idx[2], idx[3]);
        let channel = idx[1] * block + (oy % r) * r + (ox % r);
        src[[idx[0], channel, oy / r, ox / r]].clone()
    });
    Ok(Tensor::from_array(array))
}

/// Inverse of [`pixel_shuffle`]: fold `r×r` spatial blocks back into channels
pub fn pixel_unshuffle<T: Clone>(input: &Tensor<T>, downscale_factor: usize) -> Result<Tensor<T>> {
    let (n, c, h, w) = input.shape().nchw("pixel_unshuffle")?;
    let r = downscale_factor;
    if r == 0 || h % r != 0 || w % r != 0 {
        return Err(TensorError::invalid_shape(
            "pixel_unshuffle",
            format!("spatial dimensions {h}x{w} are not divisible by {r}"),
            input.dims(),
        ));
    }
    let block = r * r;

    let src = input.array();
    let array = ArrayD::from_shape_fn(IxDyn(&[n, c * block, h / r, w / r]), |idx| {
        let within = idx[1] % block;
        let (i, j) = (within / r, within % r);
        src[[idx[0], idx[1] / block, idx[2] * r + i, idx[3] * r + j]].clone()
    });
    Ok(Tensor::from_array(array))
}
