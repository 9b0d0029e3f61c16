//! Core Tensor Structure and Properties
//!
//! The tensor owns a dense, row-major `ndarray::ArrayD` and a cached [`Shape`].
//! All constructors go through [`Tensor::from_array`] so the two never disagree.

use crate::Shape;
use ndarray::ArrayD;

/// Dense n-dimensional tensor
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor<T> {
    pub(in crate::tensor) array: ArrayD<T>,
    pub(in crate::tensor) shape: Shape,
}

impl<T> Tensor<T> {
    /// Get the shape of the tensor
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Get the dimensions of the tensor
    pub fn dims(&self) -> &[usize] {
        self.shape.dims()
    }

    /// Borrow the underlying array
    pub fn array(&self) -> &ArrayD<T> {
        &self.array
    }

    /// Consume the tensor and return the underlying array
    pub fn into_array(self) -> ArrayD<T> {
        self.array
    }

    /// Get the underlying data as a slice when the storage is contiguous
    pub fn as_slice(&self) -> Option<&[T]> {
        self.array.as_slice()
    }

    /// Get the value at a specific index
    pub fn get(&self, index: &[usize]) -> Option<T>
    where
        T: Clone,
    {
        if index.len() != self.array.ndim() {
            return None;
        }
        self.array.get(index).cloned()
    }

    /// Copy the elements out in logical (row-major) order
    pub fn to_vec(&self) -> Vec<T>
    where
        T: Clone,
    {
        self.array.iter().cloned().collect()
    }

    /// Get the total number of elements
    pub fn numel(&self) -> usize {
        self.shape.size()
    }

    /// Get the number of dimensions
    pub fn ndim(&self) -> usize {
        self.shape.rank()
    }

    /// Check if tensor is empty (has no elements)
    pub fn is_empty(&self) -> bool {
        self.numel() == 0
    }

    /// Get memory usage in bytes
    pub fn memory_usage(&self) -> usize {
        self.numel() * std::mem::size_of::<T>()
    }

    /// Get tensor summary as a formatted string
    pub fn summary(&self) -> String {
        format!(
            "Tensor<{}>: shape={}, numel={}, memory={}B",
            std::any::type_name::<T>(),
            self.shape,
            self.numel(),
            self.memory_usage(),
        )
    }
}
