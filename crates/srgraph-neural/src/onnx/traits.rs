//! ONNX Export Trait

use super::model::OnnxModel;
use super::types::OnnxFormat;
use crate::config::ExportConfig;
use srgraph_core::Result;
use std::path::Path;

/// Trait for exporting models to ONNX format
pub trait OnnxExport {
    /// Export with explicit settings for a fixed input shape
    fn to_onnx_with_config(&self, input_shape: &[usize], config: &ExportConfig) -> Result<OnnxModel>;

    /// Export model to ONNX format with default settings
    fn to_onnx(&self, input_shape: &[usize]) -> Result<OnnxModel> {
        self.to_onnx_with_config(input_shape, &ExportConfig::default())
    }

    /// Save model to ONNX file with specified format
    fn save_onnx_format(&self, path: &Path, input_shape: &[usize], format: OnnxFormat) -> Result<()> {
        self.to_onnx(input_shape)?.save_to_file(path, format)
    }

    /// Save model to ONNX file, picking the format from the extension
    fn save_onnx(&self, path: &Path, input_shape: &[usize]) -> Result<()> {
        self.save_onnx_format(path, input_shape, OnnxFormat::from_path(path))
    }
}
