//! Tensor Module
//!
//! - **core**: tensor structure and property access
//! - **creation**: constructors, fill values and seeded random tensors
//! - **comparison**: closeness and sign checks used by verification

pub mod comparison;
pub mod core;
pub mod creation;

pub use self::core::Tensor;
