//! Element-wise comparisons used for numerical verification

use super::core::Tensor;
use crate::{Result, TensorError};
use ndarray::Zip;
use num_traits::Float;

impl<T: Float> Tensor<T> {
    /// Check if all elements are close to another tensor within tolerance
    ///
    /// Tensors of different shapes are never close.
    pub fn allclose(&self, other: &Self, rtol: T, atol: T) -> bool {
        if self.shape() != other.shape() {
            return false;
        }

        let mut all_close = true;
        Zip::from(&self.array)
            .and(&other.array)
            .for_each(|&a_val, &b_val| {
                let diff = (a_val - b_val).abs();
                let tolerance = atol + rtol * b_val.abs().max(a_val.abs());
                if !(diff <= tolerance) {
                    all_close = false;
                }
            });
        all_close
    }

    /// Largest absolute element-wise difference
    ///
    /// A NaN or infinite difference makes the result infinite.
    pub fn max_abs_diff(&self, other: &Self) -> Result<T> {
        self.check_same_shape(other, "max_abs_diff")?;
        let mut max = T::zero();
        Zip::from(&self.array)
            .and(&other.array)
            .for_each(|&a_val, &b_val| {
                let diff = (a_val - b_val).abs();
                if !diff.is_finite() {
                    max = T::infinity();
                } else if diff > max {
                    max = diff;
                }
            });
        Ok(max)
    }

    /// Check if every element is `>= 0`
    pub fn all_non_negative(&self) -> bool {
        self.array.iter().all(|&v| v >= T::zero())
    }

    /// Check if every element is finite
    pub fn is_finite(&self) -> bool {
        self.array.iter().all(|v| v.is_finite())
    }

    fn check_same_shape(&self, other: &Self, operation: &str) -> Result<()> {
        if self.shape() != other.shape() {
            return Err(TensorError::shape_mismatch(
                operation,
                &self.shape().to_string(),
                &other.shape().to_string(),
            ));
        }
        Ok(())
    }
}
