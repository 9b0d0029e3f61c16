//! CPU kernels used by the super-resolution graph and the graph executor

pub mod activation;
pub mod binary;
pub mod conv;
pub mod manipulation;
pub mod pixel_shuffle;

pub use activation::relu;
pub use binary::add;
pub use conv::{conv2d, conv2d_im2col, Padding2D};
pub use manipulation::{reshape, resolve_reshape_dims, transpose};
pub use pixel_shuffle::{pixel_shuffle, pixel_unshuffle};
