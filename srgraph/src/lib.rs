//! # srgraph
//!
//! Forward graph of a sub-pixel convolutional super-resolution network, with
//! interchange export and a second engine to check the export against.
//!
//! ```rust,no_run
//! use srgraph::prelude::*;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let net = SuperResolutionNet::initialized(SuperResolutionConfig::new(3), 0)?;
//! let input = seeded_input(&[1, 1, 224, 224], 0);
//! let output = net.forward(&input)?;
//! assert_eq!(output.dims(), &[1, 1, 672, 672]);
//!
//! let model = net.to_onnx(input.dims())?;
//! let replayed = GraphExecutor::new(&model)?.run_single(&input)?;
//! compare_outputs(&output, &replayed, 1e-3)?.ensure()?;
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]

pub use srgraph_core as core;
pub use srgraph_neural as neural;

/// Prelude module for convenient imports
///
/// ```rust
/// use srgraph::prelude::*;
/// ```
pub mod prelude {
    // Core types
    pub use crate::core::ops;
    pub use crate::core::{Padding2D, Shape, Tensor, TensorError};

    // Network
    pub use crate::neural::{Layer, Model, SuperResolutionConfig, SuperResolutionNet};

    // Parameters
    pub use crate::neural::{init_parameters, LoadConfig, ParameterStore, WeightLoader};

    // Export and replay
    pub use crate::neural::{
        ExportConfig, GraphExecutor, OnnxExport, OnnxFormat, OnnxModel, ShuffleLowering, Workspace,
    };

    // Verification
    pub use crate::neural::verify::{compare_outputs, seeded_input, verify_cross_engine};
}

/// The version of srgraph
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Returns the version string of srgraph
pub fn version() -> &'static str {
    VERSION
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!version().is_empty());
        assert_eq!(version(), VERSION);
    }
}
