#[cfg(feature = "serialize")]
use serde::{Deserialize, Serialize};
use std::ops::Index;

use crate::{Result, TensorError};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct Shape {
    dims: Vec<usize>,
}

impl Shape {
    pub fn new(dims: Vec<usize>) -> Self {
        Self { dims }
    }

    pub fn from_slice(dims: &[usize]) -> Self {
        Self {
            dims: dims.to_vec(),
        }
    }

    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    pub fn size(&self) -> usize {
        self.dims.iter().product()
    }

    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    pub fn is_scalar(&self) -> bool {
        self.dims.is_empty()
    }

    /// Split a rank-4 shape into `(batch, channels, height, width)`
    pub fn nchw(&self, operation: &str) -> Result<(usize, usize, usize, usize)> {
        match self.dims.as_slice() {
            &[n, c, h, w] => Ok((n, c, h, w)),
            _ => Err(TensorError::invalid_shape(
                operation,
                format!("expected a 4D NCHW tensor, got rank {}", self.rank()),
                &self.dims,
            )),
        }
    }

    /// NumPy-style broadcast of two shapes
    pub fn broadcast_shape(&self, other: &Self) -> Option<Self> {
        let rank = self.rank().max(other.rank());
        let mut result = vec![1; rank];

        for (i, &d) in self.dims.iter().enumerate() {
            result[rank - self.rank() + i] = d;
        }

        for (i, &d) in other.dims.iter().enumerate() {
            let idx = rank - other.rank() + i;
            if result[idx] == 1 {
                result[idx] = d;
            } else if d != 1 && result[idx] != d {
                return None;
            }
        }

        Some(Self::new(result))
    }

    pub fn to_vec(&self) -> Vec<usize> {
        self.dims.clone()
    }
}

impl From<&[usize]> for Shape {
    fn from(dims: &[usize]) -> Self {
        Self::from_slice(dims)
    }
}

impl Index<usize> for Shape {
    type Output = usize;

    fn index(&self, index: usize) -> &Self::Output {
        &self.dims[index]
    }
}

impl std::fmt::Display for Shape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[")?;
        for (i, dim) in self.dims.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{dim}")?;
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nchw_split() {
        let shape = Shape::from_slice(&[2, 1, 8, 6]);
        assert_eq!(shape.nchw("test").unwrap(), (2, 1, 8, 6));
        assert!(Shape::from_slice(&[1, 8, 6]).nchw("test").is_err());
    }

    #[test]
    fn test_broadcast_bias_shape() {
        let activations = Shape::from_slice(&[1, 64, 5, 5]);
        let bias = Shape::from_slice(&[64, 1, 1]);
        assert_eq!(
            activations.broadcast_shape(&bias),
            Some(Shape::from_slice(&[1, 64, 5, 5]))
        );
        assert_eq!(activations.broadcast_shape(&Shape::from_slice(&[3])), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(Shape::from_slice(&[1, 1, 672, 672]).to_string(), "[1, 1, 672, 672]");
    }
}
