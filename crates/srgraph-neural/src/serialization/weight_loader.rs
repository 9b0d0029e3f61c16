//! Weight Loading System
//!
//! Reads pretrained parameters into a [`ParameterStore`] and writes a store
//! back out.
//!
//! ## Supported Formats
//!
//! - **SafeTensors**: `.safetensors`, F32 tensors (F64 narrowed when type
//!   conversion is allowed)
//! - **JSON**: `.json`, `{"tensors": {"conv1.weight": {"shape": [...], "data": [...]}}}`
//!
//! ## Example
//!
//! ```rust,no_run
//! use srgraph_neural::serialization::{LoadConfig, WeightLoader};
//!
//! # fn main() -> srgraph_core::Result<()> {
//! let config = LoadConfig::new()
//!     .with_strict(false)
//!     .with_mapping("model.conv1.weight".to_string(), "conv1.weight".to_string());
//!
//! let result = WeightLoader::with_config(config).load_from_file("weights.safetensors")?;
//! println!("loaded {} tensors", result.num_loaded);
//! # Ok(())
//! # }
//! ```

use super::ParameterStore;
use safetensors::tensor::TensorView;
use safetensors::{Dtype, SafeTensors};
use serde::{Deserialize, Serialize};
use srgraph_core::{bytes, Result, Tensor, TensorError};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use tracing::{debug, info, warn};

/// Weight file format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeightFormat {
    /// SafeTensors format (recommended for production)
    SafeTensors,
    /// JSON format (human-readable, good for debugging)
    Json,
}

impl WeightFormat {
    /// Detect format from file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("safetensors") => Some(WeightFormat::SafeTensors),
            Some("json") => Some(WeightFormat::Json),
            _ => None,
        }
    }

    fn detect(path: &Path) -> Result<Self> {
        Self::from_path(path).ok_or_else(|| {
            TensorError::unsupported_operation(
                "load_weights",
                format!(
                    "cannot infer weight format of '{}', expected .safetensors or .json",
                    path.display()
                ),
            )
        })
    }
}

/// Configuration for weight loading
#[derive(Debug, Clone)]
pub struct LoadConfig {
    /// Strict mode: unreadable tensors are errors instead of warnings
    pub strict: bool,

    /// Allow type conversion (e.g., f64 -> f32)
    pub allow_type_conversion: bool,

    /// Prefix to add to all weight names
    pub prefix: Option<String>,

    /// Suffix to add to all weight names
    pub suffix: Option<String>,

    /// Weight name mapping (old_name -> new_name)
    pub name_mapping: HashMap<String, String>,

    /// Weights to exclude from loading
    pub exclude_patterns: Vec<String>,

    /// Weights to include (if empty, include all)
    pub include_patterns: Vec<String>,
}

impl LoadConfig {
    /// Create a new load configuration with defaults
    pub fn new() -> Self {
        Self {
            strict: true,
            allow_type_conversion: true,
            prefix: None,
            suffix: None,
            name_mapping: HashMap::new(),
            exclude_patterns: Vec::new(),
            include_patterns: Vec::new(),
        }
    }

    /// Set strict mode
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Allow type conversion
    pub fn with_type_conversion(mut self, allow: bool) -> Self {
        self.allow_type_conversion = allow;
        self
    }

    /// Add a name prefix
    pub fn with_prefix(mut self, prefix: String) -> Self {
        self.prefix = Some(prefix);
        self
    }

    /// Add a name suffix
    pub fn with_suffix(mut self, suffix: String) -> Self {
        self.suffix = Some(suffix);
        self
    }

    /// Add weight name mapping
    pub fn with_mapping(mut self, old_name: String, new_name: String) -> Self {
        self.name_mapping.insert(old_name, new_name);
        self
    }

    /// Exclude weights matching pattern
    pub fn exclude(mut self, pattern: String) -> Self {
        self.exclude_patterns.push(pattern);
        self
    }

    /// Include only weights matching pattern
    pub fn include(mut self, pattern: String) -> Self {
        self.include_patterns.push(pattern);
        self
    }

    /// Apply mapping, then prefix and suffix
    pub fn transform_name(&self, name: &str) -> String {
        let mapped = self
            .name_mapping
            .get(name)
            .map(String::as_str)
            .unwrap_or(name);

        format!(
            "{}{}{}",
            self.prefix.as_deref().unwrap_or_default(),
            mapped,
            self.suffix.as_deref().unwrap_or_default()
        )
    }

    /// Check if a weight name (as stored in the file) should be loaded
    pub fn should_include(&self, name: &str) -> bool {
        if self.exclude_patterns.iter().any(|p| name.contains(p.as_str())) {
            return false;
        }

        self.include_patterns.is_empty() || self.include_patterns.iter().any(|p| name.contains(p.as_str()))
    }
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Weight loading result with metadata
#[derive(Debug, Default)]
pub struct LoadResult {
    /// Loaded weights under their transformed names
    pub weights: ParameterStore,

    /// Number of weights loaded
    pub num_loaded: usize,

    /// Number of weights skipped by filters, name collisions or (non-strict)
    /// read failures
    pub num_skipped: usize,

    /// Warnings encountered during loading
    pub warnings: Vec<String>,

    /// Total size of loaded parameter data in bytes
    pub total_bytes: usize,
}

impl LoadResult {
    /// Record `tensor` under its transformed `name`
    ///
    /// The first source tensor to claim a name keeps it; a later one is an
    /// error in strict mode and skipped otherwise.
    fn push(
        &mut self,
        source: &str,
        name: String,
        tensor: Tensor<f32>,
        config: &LoadConfig,
    ) -> Result<()> {
        if self.weights.contains(&name) {
            let reason = format!("'{source}' maps to '{name}', which is already loaded");
            if config.strict {
                return Err(TensorError::serialization_error("load_weights", reason));
            }
            self.num_skipped += 1;
            self.add_warning(format!("skipped {reason}"));
            return Ok(());
        }
        self.total_bytes += tensor.numel() * std::mem::size_of::<f32>();
        self.num_loaded += 1;
        self.weights.insert(name, tensor);
        Ok(())
    }

    /// Add a warning message
    pub fn add_warning(&mut self, warning: String) {
        warn!("{warning}");
        self.warnings.push(warning);
    }

    /// Get a weight by name
    pub fn get(&self, name: &str) -> Option<&Tensor<f32>> {
        self.weights.get(name)
    }

    /// Check if loading was successful
    pub fn is_success(&self) -> bool {
        self.num_loaded > 0
    }

    pub fn into_store(self) -> ParameterStore {
        self.weights
    }
}

/// On-disk layout of a JSON weight file
#[derive(Debug, Serialize, Deserialize)]
struct JsonWeights {
    tensors: BTreeMap<String, JsonTensor>,
}

#[derive(Debug, Serialize, Deserialize)]
struct JsonTensor {
    shape: Vec<usize>,
    data: Vec<f32>,
}

/// Weight loader for managing pretrained weight loading
#[derive(Debug, Default)]
pub struct WeightLoader {
    /// Default load configuration
    default_config: LoadConfig,
}

impl WeightLoader {
    /// Create a new weight loader
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with custom default configuration
    pub fn with_config(config: LoadConfig) -> Self {
        Self {
            default_config: config,
        }
    }

    pub fn config(&self) -> &LoadConfig {
        &self.default_config
    }

    /// Load weights from file with default configuration
    pub fn load_from_file(&self, path: impl AsRef<Path>) -> Result<LoadResult> {
        self.load_with_config(path, &self.default_config)
    }

    /// Load weights from file with custom configuration
    pub fn load_with_config(&self, path: impl AsRef<Path>, config: &LoadConfig) -> Result<LoadResult> {
        let path = path.as_ref();
        let format = WeightFormat::detect(path)?;
        let data = std::fs::read(path)
            .map_err(|e| TensorError::io_error("load_weights", e.to_string(), path))?;

        let result = match format {
            WeightFormat::SafeTensors => self.load_safetensors_bytes(&data, config)?,
            WeightFormat::Json => self.load_json_bytes(&data, config)?,
        };

        info!(
            path = %path.display(),
            loaded = result.num_loaded,
            skipped = result.num_skipped,
            bytes = result.total_bytes,
            "loaded weights"
        );
        Ok(result)
    }

    /// Parse an in-memory SafeTensors buffer
    pub fn load_safetensors_bytes(&self, data: &[u8], config: &LoadConfig) -> Result<LoadResult> {
        let tensors = SafeTensors::deserialize(data).map_err(|e| {
            TensorError::serialization_error("load_safetensors", format!("invalid file: {e}"))
        })?;

        let mut result = LoadResult::default();
        let mut names = tensors.names();
        names.sort();

        for name in names {
            if !config.should_include(name) {
                debug!(name = %name, "skipping filtered tensor");
                result.num_skipped += 1;
                continue;
            }

            let view = tensors.tensor(name).map_err(|e| {
                TensorError::serialization_error("load_safetensors", format!("{name}: {e}"))
            })?;

            match view_to_tensor(name, &view, config) {
                Ok(tensor) => result.push(name, config.transform_name(name), tensor, config)?,
                Err(e) if !config.strict => {
                    result.num_skipped += 1;
                    result.add_warning(format!("skipped '{name}': {e}"));
                }
                Err(e) => return Err(e),
            }
        }

        Ok(result)
    }

    /// Parse an in-memory JSON weight buffer
    pub fn load_json_bytes(&self, data: &[u8], config: &LoadConfig) -> Result<LoadResult> {
        let parsed: JsonWeights = serde_json::from_slice(data).map_err(|e| {
            TensorError::serialization_error("load_json_weights", e.to_string())
        })?;

        let mut result = LoadResult::default();
        for (name, entry) in parsed.tensors {
            if !config.should_include(&name) {
                result.num_skipped += 1;
                continue;
            }

            match Tensor::from_vec(entry.data, &entry.shape) {
                Ok(tensor) => result.push(&name, config.transform_name(&name), tensor, config)?,
                Err(e) if !config.strict => {
                    result.num_skipped += 1;
                    result.add_warning(format!("skipped '{name}': {e}"));
                }
                Err(e) => return Err(e),
            }
        }

        Ok(result)
    }

    /// Save weights to file; the format follows the extension
    pub fn save_to_file(&self, weights: &ParameterStore, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let bytes = match WeightFormat::detect(path)? {
            WeightFormat::SafeTensors => self.to_safetensors_bytes(weights)?,
            WeightFormat::Json => self.to_json_bytes(weights)?,
        };

        std::fs::write(path, bytes)
            .map_err(|e| TensorError::io_error("save_weights", e.to_string(), path))?;
        info!(path = %path.display(), tensors = weights.len(), "saved weights");
        Ok(())
    }

    /// Encode a store as SafeTensors
    pub fn to_safetensors_bytes(&self, weights: &ParameterStore) -> Result<Vec<u8>> {
        let encoded: Vec<(String, Vec<usize>, Vec<u8>)> = weights
            .iter()
            .map(|(name, tensor)| {
                (
                    name.to_string(),
                    tensor.dims().to_vec(),
                    bytes::f32_to_le_bytes(&tensor.to_vec()),
                )
            })
            .collect();

        let views = encoded
            .iter()
            .map(|(name, shape, data)| {
                TensorView::new(Dtype::F32, shape.clone(), data)
                    .map(|view| (name.as_str(), view))
                    .map_err(|e| {
                        TensorError::serialization_error("save_safetensors", format!("{name}: {e}"))
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        let metadata = Some(HashMap::from([(
            "producer".to_string(),
            "srgraph".to_string(),
        )]));
        safetensors::serialize(views, &metadata)
            .map_err(|e| TensorError::serialization_error("save_safetensors", e.to_string()))
    }

    /// Encode a store as JSON
    pub fn to_json_bytes(&self, weights: &ParameterStore) -> Result<Vec<u8>> {
        let json = JsonWeights {
            tensors: weights
                .iter()
                .map(|(name, tensor)| {
                    (
                        name.to_string(),
                        JsonTensor {
                            shape: tensor.dims().to_vec(),
                            data: tensor.to_vec(),
                        },
                    )
                })
                .collect(),
        };
        serde_json::to_vec_pretty(&json)
            .map_err(|e| TensorError::serialization_error("save_json_weights", e.to_string()))
    }
}

fn view_to_tensor(name: &str, view: &TensorView<'_>, config: &LoadConfig) -> Result<Tensor<f32>> {
    let values = match view.dtype() {
        Dtype::F32 => bytes::f32_from_le_bytes(view.data())?,
        Dtype::F64 if config.allow_type_conversion => bytes::f64_from_le_bytes(view.data())?
            .into_iter()
            .map(|v| v as f32)
            .collect(),
        other => {
            return Err(TensorError::serialization_error(
                "load_safetensors",
                format!("tensor '{name}' has unsupported dtype {other:?}"),
            ))
        }
    };
    Tensor::from_vec(values, view.shape())
}

/// Shorthand for a loader with the default configuration
pub fn loader() -> WeightLoader {
    WeightLoader::new()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_store() -> ParameterStore {
        let mut store = ParameterStore::new();
        store.insert(
            "conv1.weight",
            Tensor::from_vec(vec![0.5f32, -1.25, 3.0, 0.0], &[1, 1, 2, 2]).unwrap(),
        );
        store.insert("conv1.bias", Tensor::from_vec(vec![0.125f32], &[1]).unwrap());
        store
    }

    #[test]
    fn test_weight_format_detection() {
        assert_eq!(
            WeightFormat::from_path(Path::new("model.safetensors")),
            Some(WeightFormat::SafeTensors)
        );
        assert_eq!(
            WeightFormat::from_path(Path::new("weights.json")),
            Some(WeightFormat::Json)
        );
        assert_eq!(WeightFormat::from_path(Path::new("model.bin")), None);
    }

    #[test]
    fn test_name_transformation() {
        let config = LoadConfig::new()
            .with_prefix("model.".to_string())
            .with_suffix(".0".to_string())
            .with_mapping("old".to_string(), "new".to_string());
        assert_eq!(config.transform_name("old"), "model.new.0");
        assert_eq!(config.transform_name("layer"), "model.layer.0");
    }

    #[test]
    fn test_should_include() {
        let config = LoadConfig::new();
        assert!(config.should_include("anything"));

        let config = LoadConfig::new()
            .include("conv".to_string())
            .exclude("bias".to_string());
        assert!(config.should_include("conv1.weight"));
        assert!(!config.should_include("conv1.bias"));
        assert!(!config.should_include("fc.weight"));
    }

    #[test]
    fn test_safetensors_bytes_round_trip() {
        let loader = WeightLoader::new();
        let store = sample_store();
        let bytes = loader.to_safetensors_bytes(&store).unwrap();
        let result = loader
            .load_safetensors_bytes(&bytes, &LoadConfig::new())
            .unwrap();
        assert_eq!(result.num_loaded, 2);
        assert_eq!(result.num_skipped, 0);
        assert_eq!(result.total_bytes, 5 * 4);
        assert_eq!(result.weights, store);
    }

    #[test]
    fn test_filters_count_skipped() {
        let loader = WeightLoader::new();
        let bytes = loader.to_json_bytes(&sample_store()).unwrap();
        let config = LoadConfig::new().exclude("bias".to_string());
        let result = loader.load_json_bytes(&bytes, &config).unwrap();
        assert_eq!(result.num_loaded, 1);
        assert_eq!(result.num_skipped, 1);
        assert!(result.get("conv1.weight").is_some());
    }

    #[test]
    fn test_f64_conversion_and_strictness() {
        let values: Vec<u8> = [1.5f64, -2.0]
            .iter()
            .flat_map(|v| v.to_le_bytes())
            .collect();
        let view = TensorView::new(Dtype::F64, vec![2], &values).unwrap();
        let bytes = safetensors::serialize([("w", view)], &None).unwrap();
        let loader = WeightLoader::new();

        let converted = loader
            .load_safetensors_bytes(&bytes, &LoadConfig::new())
            .unwrap();
        assert_eq!(converted.get("w").unwrap().to_vec(), vec![1.5, -2.0]);

        let no_conversion = LoadConfig::new().with_type_conversion(false);
        assert!(loader.load_safetensors_bytes(&bytes, &no_conversion).is_err());

        let lenient = no_conversion.with_strict(false);
        let result = loader.load_safetensors_bytes(&bytes, &lenient).unwrap();
        assert_eq!(result.num_loaded, 0);
        assert_eq!(result.num_skipped, 1);
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn test_mapping_collision() {
        let loader = WeightLoader::new();
        let bytes = loader.to_safetensors_bytes(&sample_store()).unwrap();
        let config =
            LoadConfig::new().with_mapping("conv1.bias".to_string(), "conv1.weight".to_string());

        let err = loader.load_safetensors_bytes(&bytes, &config).unwrap_err();
        assert!(err.to_string().contains("conv1.weight"));

        // Names load in sorted order, so the renamed bias claims the slot first
        let result = loader
            .load_safetensors_bytes(&bytes, &config.with_strict(false))
            .unwrap();
        assert_eq!(result.num_loaded, 1);
        assert_eq!(result.num_skipped, 1);
        assert_eq!(result.total_bytes, 4);
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.get("conv1.weight").unwrap().dims(), &[1]);
    }

    #[test]
    fn test_bad_json_shape() {
        let json = br#"{"tensors": {"w": {"shape": [2, 2], "data": [1.0]}}}"#;
        let loader = WeightLoader::new();
        assert!(loader.load_json_bytes(json, &LoadConfig::new()).is_err());
        let lenient = LoadConfig::new().with_strict(false);
        assert_eq!(loader.load_json_bytes(json, &lenient).unwrap().num_skipped, 1);
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let loader = loader();
        let store = sample_store();
        for file in ["w.safetensors", "w.json"] {
            let path = dir.path().join(file);
            loader.save_to_file(&store, &path).unwrap();
            assert_eq!(loader.load_from_file(&path).unwrap().into_store(), store);
        }
        assert!(loader.save_to_file(&store, dir.path().join("w.bin")).is_err());
    }
}
