//! # srgraph-core
//!
//! Dense tensors and the CPU kernels needed to run a sub-pixel convolutional
//! super-resolution network: 2D cross-correlation (direct and im2col),
//! ReLU, broadcasting add, reshape/transpose and pixel shuffle.
//!
//! All kernels are pure functions of their inputs. Nothing here holds global
//! state, so tensors and kernels can be used freely from multiple threads.

pub mod bytes;
pub mod error;
pub mod ops;
pub mod shape;
pub mod tensor;

pub use error::{Result, TensorError};
pub use ops::Padding2D;
pub use shape::Shape;
pub use tensor::Tensor;
