//! Named parameter tensors
//!
//! A [`ParameterStore`] is an explicit, caller-owned map from parameter name
//! (`conv1.weight`, `conv4.bias`, ...) to an `f32` tensor. Models read from it
//! once at construction and keep their own copies.

use srgraph_core::{Result, Tensor, TensorError};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterStore {
    tensors: BTreeMap<String, Tensor<f32>>,
}

impl ParameterStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a tensor, returning the previous value under the same name
    pub fn insert(&mut self, name: impl Into<String>, tensor: Tensor<f32>) -> Option<Tensor<f32>> {
        self.tensors.insert(name.into(), tensor)
    }

    pub fn get(&self, name: &str) -> Option<&Tensor<f32>> {
        self.tensors.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tensors.contains_key(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<Tensor<f32>> {
        self.tensors.remove(name)
    }

    /// Fetch a parameter that must exist with exactly `expected_shape`
    ///
    /// Missing tensors, shape mismatches and non-finite values are all
    /// reported as `ParameterError` naming the parameter.
    pub fn require(&self, name: &str, expected_shape: &[usize]) -> Result<&Tensor<f32>> {
        let tensor = self
            .tensors
            .get(name)
            .ok_or_else(|| TensorError::parameter_error(name, "parameter is missing"))?;

        if tensor.dims() != expected_shape {
            return Err(TensorError::parameter_error(
                name,
                format!(
                    "expected shape {expected_shape:?}, got {:?}",
                    tensor.dims()
                ),
            ));
        }
        if !tensor.is_finite() {
            return Err(TensorError::parameter_error(
                name,
                "parameter contains NaN or infinite values",
            ));
        }
        Ok(tensor)
    }

    /// Parameter names in sorted order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tensors.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Tensor<f32>)> {
        self.tensors.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.tensors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tensors.is_empty()
    }

    /// Total number of scalar values across all parameters
    pub fn num_elements(&self) -> usize {
        self.tensors.values().map(Tensor::numel).sum()
    }
}

impl FromIterator<(String, Tensor<f32>)> for ParameterStore {
    fn from_iter<I: IntoIterator<Item = (String, Tensor<f32>)>>(iter: I) -> Self {
        Self {
            tensors: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for ParameterStore {
    type Item = (String, Tensor<f32>);
    type IntoIter = std::collections::btree_map::IntoIter<String, Tensor<f32>>;

    fn into_iter(self) -> Self::IntoIter {
        self.tensors.into_iter()
    }
}
