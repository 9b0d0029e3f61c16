//! In-process execution of exported graphs
//!
//! [`GraphExecutor`] interprets an [`OnnxModel`](crate::onnx::OnnxModel)
//! node by node. It shares no code path with the native network beyond the
//! elementwise kernels: convolutions go through im2col + GEMM and the pixel
//! shuffle runs as whatever reshape/transpose or `DepthToSpace` nodes the
//! graph contains. Intermediate values live in a caller-owned [`Workspace`].

pub mod executor;
pub mod workspace;

pub use executor::GraphExecutor;
pub use workspace::Workspace;
