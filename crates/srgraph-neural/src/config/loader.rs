//! Configuration file loading and parsing
//!
//! The format is chosen from the file extension: `.toml` or `.json`.

use super::PipelineConfig;
use srgraph_core::{Result, TensorError};
use std::fs;
use std::path::Path;
use tracing::debug;

/// Supported configuration file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Toml,
    Json,
}

impl ConfigFormat {
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_ascii_lowercase().as_str() {
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Loads and saves [`PipelineConfig`] files
#[derive(Debug, Default)]
pub struct ConfigLoader;

impl ConfigLoader {
    pub fn new() -> Self {
        Self
    }

    /// Load configuration from a file
    pub fn load_from_file<P: AsRef<Path>>(&self, path: P) -> Result<PipelineConfig> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            TensorError::io_error(
                "load_config",
                format!("failed to read configuration file: {e}"),
                path,
            )
        })?;

        let format = self.detect_format(path)?;
        let config = self.load_from_str(&content, format)?;
        debug!(path = %path.display(), ?format, "loaded pipeline configuration");
        Ok(config)
    }

    /// Parse and validate configuration text
    pub fn load_from_str(&self, content: &str, format: ConfigFormat) -> Result<PipelineConfig> {
        let config: PipelineConfig = match format {
            ConfigFormat::Toml => toml::from_str(content).map_err(|e| {
                TensorError::serialization_error(
                    "load_config",
                    format!("failed to parse TOML configuration: {e}"),
                )
            })?,
            ConfigFormat::Json => serde_json::from_str(content).map_err(|e| {
                TensorError::serialization_error(
                    "load_config",
                    format!("failed to parse JSON configuration: {e}"),
                )
            })?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, config: &PipelineConfig, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = match self.detect_format(path)? {
            ConfigFormat::Toml => toml::to_string_pretty(config).map_err(|e| {
                TensorError::serialization_error("save_config", e.to_string())
            })?,
            ConfigFormat::Json => serde_json::to_string_pretty(config).map_err(|e| {
                TensorError::serialization_error("save_config", e.to_string())
            })?,
        };

        fs::write(path, content).map_err(|e| {
            TensorError::io_error(
                "save_config",
                format!("failed to write configuration file: {e}"),
                path,
            )
        })
    }

    fn detect_format(&self, path: &Path) -> Result<ConfigFormat> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default();

        ConfigFormat::from_extension(extension).ok_or_else(|| {
            TensorError::invalid_argument_op(
                "load_config",
                &format!(
                    "unsupported configuration file '{}', expected .toml or .json",
                    path.display()
                ),
            )
        })
    }
}
