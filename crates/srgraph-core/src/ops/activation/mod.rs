//! Element-wise activation functions

use crate::{Result, Tensor};
use num_traits::Float;

/// Rectified linear unit: negative values are clamped to zero
///
/// NaN inputs stay NaN so a corrupted activation is never silently zeroed.
pub fn relu<T: Float>(x: &Tensor<T>) -> Result<Tensor<T>> {
    let zero = T::zero();
    let result = x.array().mapv(|v| if v < zero { zero } else { v });
    Ok(Tensor::from_array(result))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relu_clamps_negatives() {
        let x = Tensor::from_vec(vec![-2.0f32, -0.0, 0.5, 3.0], &[2, 2]).unwrap();
        let y = relu(&x).unwrap();
        assert_eq!(y.dims(), &[2, 2]);
        assert_eq!(y.to_vec(), vec![0.0, -0.0, 0.5, 3.0]);
        assert!(y.all_non_negative());
    }

    #[test]
    fn test_relu_keeps_nan() {
        let x = Tensor::from_vec(vec![f32::NAN, -1.0], &[2]).unwrap();
        let y = relu(&x).unwrap();
        assert!(y.to_vec()[0].is_nan());
        assert_eq!(y.to_vec()[1], 0.0);
    }
}
