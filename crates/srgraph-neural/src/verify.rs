//! Cross-engine verification
//!
//! The native forward pass and the [`GraphExecutor`] share no convolution
//! code, so agreement between them checks both the model and its export.

use crate::config::ExportConfig;
use crate::model::SuperResolutionNet;
use crate::onnx::{OnnxExport, OnnxModel};
use crate::runtime::GraphExecutor;
use srgraph_core::{Result, Tensor, TensorError};
use std::fmt;
use tracing::{debug, info, warn};

/// Element-wise comparison of two outputs
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VerificationReport {
    pub max_abs_diff: f32,
    pub mean_abs_diff: f32,
    /// Elements whose difference exceeds the tolerance, or that are not finite
    pub mismatched: usize,
    pub total: usize,
    pub tolerance: f32,
    pub passed: bool,
}

impl VerificationReport {
    /// Turn a failed report into a `NumericalError`
    pub fn ensure(&self) -> Result<()> {
        if self.passed {
            Ok(())
        } else {
            Err(TensorError::numerical_error("verify", self.to_string()))
        }
    }
}

impl fmt::Display for VerificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} elements outside tolerance {:e} (max abs diff {:e}, mean {:e})",
            self.mismatched, self.total, self.tolerance, self.max_abs_diff, self.mean_abs_diff
        )
    }
}

/// Tolerance for "equal to `decimal` places": `1.5 * 10^-decimal`
pub fn decimal_tolerance(decimal: u32) -> f32 {
    1.5 * 10f32.powi(-(decimal as i32))
}

/// Compare `actual` against `expected` element by element
///
/// Mismatched shapes are an error rather than a failed report. A NaN or
/// infinite value on either side counts as a mismatch.
pub fn compare_outputs(
    expected: &Tensor<f32>,
    actual: &Tensor<f32>,
    tolerance: f32,
) -> Result<VerificationReport> {
    if expected.dims() != actual.dims() {
        return Err(TensorError::shape_mismatch(
            "compare_outputs",
            &expected.shape().to_string(),
            &actual.shape().to_string(),
        ));
    }
    if tolerance.is_nan() || tolerance < 0.0 {
        return Err(TensorError::invalid_argument_op(
            "compare_outputs",
            "tolerance must be a non-negative number",
        ));
    }

    let mut max_abs_diff = 0.0f32;
    let mut sum = 0.0f64;
    let mut mismatched = 0usize;
    for (&e, &a) in expected.array().iter().zip(actual.array().iter()) {
        let diff = (e - a).abs();
        if !diff.is_finite() {
            mismatched += 1;
            max_abs_diff = f32::INFINITY;
            continue;
        }
        if diff > tolerance {
            mismatched += 1;
        }
        max_abs_diff = max_abs_diff.max(diff);
        sum += f64::from(diff);
    }

    let total = expected.numel();
    let mean_abs_diff = if total == 0 { 0.0 } else { (sum / total as f64) as f32 };
    Ok(VerificationReport {
        max_abs_diff,
        mean_abs_diff,
        mismatched,
        total,
        tolerance,
        passed: mismatched == 0,
    })
}

/// Reproducible uniform `[0, 1)` input
pub fn seeded_input(shape: &[usize], seed: u64) -> Tensor<f32> {
    Tensor::random_uniform(shape, seed)
}

/// Run `input` through the network and through its exported graph, then
/// compare the two outputs
///
/// The exported model is encoded and decoded before execution so the check
/// covers the serialised form.
pub fn verify_cross_engine(
    net: &SuperResolutionNet,
    input: &Tensor<f32>,
    export_config: &ExportConfig,
    tolerance: f32,
) -> Result<VerificationReport> {
    let native = net.forward(input)?;

    let exported = net.to_onnx_with_config(input.dims(), export_config)?;
    let model = round_trip(&exported)?;
    let executor = GraphExecutor::new(&model)?;
    let interpreted = executor.run_single(input)?;
    debug!(shape = ?interpreted.dims(), "graph executor finished");

    let report = compare_outputs(&native, &interpreted, tolerance)?;
    if report.passed {
        info!(
            max_abs_diff = report.max_abs_diff,
            mean_abs_diff = report.mean_abs_diff,
            tolerance,
            "engines agree"
        );
    } else {
        warn!(
            mismatched = report.mismatched,
            max_abs_diff = report.max_abs_diff,
            tolerance,
            "engines diverge"
        );
    }
    Ok(report)
}

#[cfg(feature = "onnx")]
fn round_trip(model: &OnnxModel) -> Result<OnnxModel> {
    OnnxModel::from_protobuf_bytes(&model.to_protobuf_bytes())
}

#[cfg(not(feature = "onnx"))]
fn round_trip(model: &OnnxModel) -> Result<OnnxModel> {
    OnnxModel::from_json(&model.to_json()?)
}
