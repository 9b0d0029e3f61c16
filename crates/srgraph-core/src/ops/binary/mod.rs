//! Binary element-wise operations with NumPy broadcasting

use crate::{Result, Tensor, TensorError};
use ndarray::IxDyn;
use num_traits::Float;

/// Element-wise addition
///
/// Shapes are broadcast right-aligned, so a `[C, 1, 1]` bias adds per channel
/// to an `[N, C, H, W]` activation.
pub fn add<T: Float>(a: &Tensor<T>, b: &Tensor<T>) -> Result<Tensor<T>> {
    let out_shape = a.shape().broadcast_shape(b.shape()).ok_or_else(|| {
        TensorError::shape_mismatch(
            "add",
            &format!("shape broadcastable with {}", a.shape()),
            &b.shape().to_string(),
        )
    })?;

    let lhs = a
        .array()
        .broadcast(IxDyn(out_shape.dims()))
        .ok_or_else(|| TensorError::compute_error("add", "left operand failed to broadcast"))?;
    let rhs = b
        .array()
        .broadcast(IxDyn(out_shape.dims()))
        .ok_or_else(|| TensorError::compute_error("add", "right operand failed to broadcast"))?;

    Ok(Tensor::from_array(&lhs + &rhs))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_same_shape() {
        let a = Tensor::from_vec(vec![1.0f32, 2.0, 3.0, 4.0], &[2, 2]).unwrap();
        let b = Tensor::from_vec(vec![0.5f32, 0.5, 0.5, 0.5], &[2, 2]).unwrap();
        assert_eq!(add(&a, &b).unwrap().to_vec(), vec![1.5, 2.5, 3.5, 4.5]);
    }

    #[test]
    fn test_add_channel_bias() {
        let activations = Tensor::<f32>::zeros(&[1, 2, 2, 2]);
        let bias = Tensor::from_vec(vec![1.0f32, -1.0], &[2, 1, 1]).unwrap();
        let out = add(&activations, &bias).unwrap();
        assert_eq!(out.dims(), &[1, 2, 2, 2]);
        assert_eq!(
            out.to_vec(),
            vec![1.0, 1.0, 1.0, 1.0, -1.0, -1.0, -1.0, -1.0]
        );
    }

    #[test]
    fn test_add_incompatible() {
        let a = Tensor::<f32>::zeros(&[2, 3]);
        let b = Tensor::<f32>::zeros(&[2]);
        assert!(add(&a, &b).is_err());
    }
}
