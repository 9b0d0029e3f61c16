//! Tensor Construction
//!
//! Constructors from raw data, fill values and seeded random distributions.

use super::core::Tensor;
use crate::{Result, Shape, TensorError};
use ndarray::{ArrayD, IxDyn};
use num_traits::{Float, One, Zero};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;

impl<T: Clone> Tensor<T> {
    /// Create a tensor from an existing ndarray
    pub fn from_array(array: ArrayD<T>) -> Self {
        let shape = Shape::from_slice(array.shape());
        Self { array, shape }
    }

    /// Create a tensor from a vector of data with specified shape
    pub fn from_vec(data: Vec<T>, shape: &[usize]) -> Result<Self> {
        let total_size: usize = shape.iter().product();
        if data.len() != total_size {
            return Err(TensorError::invalid_shape(
                "from_vec",
                format!(
                    "data length {} doesn't match shape {:?} (size {})",
                    data.len(),
                    shape,
                    total_size
                ),
                shape,
            ));
        }

        let array = ArrayD::from_shape_vec(IxDyn(shape), data)
            .map_err(|e| TensorError::invalid_shape("from_vec", e.to_string(), shape))?;

        Ok(Self::from_array(array))
    }

    /// Create a tensor filled with a specific value
    pub fn full(shape: &[usize], value: T) -> Self {
        Self::from_array(ArrayD::from_elem(IxDyn(shape), value))
    }

    /// Create a scalar tensor from a single value
    pub fn from_scalar(value: T) -> Self {
        Self::from_array(ArrayD::from_elem(IxDyn(&[]), value))
    }
}

impl<T: Clone + Zero> Tensor<T> {
    /// Create a tensor filled with zeros
    pub fn zeros(shape: &[usize]) -> Self {
        Self::from_array(ArrayD::zeros(IxDyn(shape)))
    }
}

impl<T: Clone + Zero + One> Tensor<T> {
    /// Create a tensor filled with ones
    pub fn ones(shape: &[usize]) -> Self {
        Self::from_array(ArrayD::ones(IxDyn(shape)))
    }
}

impl<T: Float> Tensor<T> {
    /// Uniform `[0, 1)` values from a seeded generator
    ///
    /// The same `(shape, seed)` pair always yields the same tensor.
    pub fn random_uniform(shape: &[usize], seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let array = ArrayD::from_shape_simple_fn(IxDyn(shape), || {
            T::from(rng.gen::<f32>()).unwrap_or_else(T::zero)
        });
        Self::from_array(array)
    }

    /// Standard normal values from a seeded generator
    pub fn random_normal(shape: &[usize], seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let array = ArrayD::from_shape_simple_fn(IxDyn(shape), || {
            let v: f64 = rng.sample(StandardNormal);
            T::from(v).unwrap_or_else(T::zero)
        });
        Self::from_array(array)
    }
}
