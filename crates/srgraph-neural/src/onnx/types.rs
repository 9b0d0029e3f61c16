//! Basic Types, Errors, and Format Definitions

use serde::{Deserialize, Serialize};
use srgraph_core::TensorError;

/// ONNX encode/decode errors
#[derive(Debug, thiserror::Error)]
pub enum OnnxError {
    #[error("Model conversion error: {0}")]
    ConversionError(String),
    #[error("Unsupported data type code {0}")]
    UnsupportedDataType(i32),
    #[error("Malformed tensor '{name}': {reason}")]
    MalformedTensor { name: String, reason: String },
    #[cfg(feature = "onnx")]
    #[error("Protobuf error: {0}")]
    ProtobufError(#[from] prost::DecodeError),
}

impl From<OnnxError> for TensorError {
    fn from(err: OnnxError) -> Self {
        TensorError::serialization_error("onnx", err.to_string())
    }
}

/// ONNX file encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OnnxFormat {
    /// Official ONNX protobuf format (requires onnx feature)
    Protobuf,
    /// JSON rendering of the same model, readable without protobuf tooling
    Json,
}

impl Default for OnnxFormat {
    fn default() -> Self {
        #[cfg(feature = "onnx")]
        {
            Self::Protobuf
        }
        #[cfg(not(feature = "onnx"))]
        {
            Self::Json
        }
    }
}

impl OnnxFormat {
    /// `.json` files are JSON; anything else is treated as protobuf
    pub fn from_path(path: &std::path::Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::Json,
            _ => Self::Protobuf,
        }
    }

    /// Format of an existing file: JSON by extension or by a leading `{`
    pub fn detect(path: &std::path::Path, content: &[u8]) -> Self {
        let leading = content.iter().find(|b| !b.is_ascii_whitespace());
        match (Self::from_path(path), leading) {
            (Self::Json, _) | (_, Some(b'{')) => Self::Json,
            _ => Self::Protobuf,
        }
    }
}

/// ONNX element types used by the exported graph
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnnxDataType {
    Float32 = 1,
    Int32 = 6,
    Int64 = 7,
    Float64 = 11,
}

impl OnnxDataType {
    /// Decode an ONNX `TensorProto.DataType` code
    pub fn from_code(code: i32) -> Result<Self, OnnxError> {
        match code {
            1 => Ok(Self::Float32),
            6 => Ok(Self::Int32),
            7 => Ok(Self::Int64),
            11 => Ok(Self::Float64),
            other => Err(OnnxError::UnsupportedDataType(other)),
        }
    }

    pub fn code(self) -> i32 {
        self as i32
    }

    /// Bytes per element in `raw_data`
    pub fn element_size(self) -> usize {
        match self {
            Self::Float32 | Self::Int32 => 4,
            Self::Int64 | Self::Float64 => 8,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_data_type_codes() {
        for dtype in [
            OnnxDataType::Float32,
            OnnxDataType::Int32,
            OnnxDataType::Int64,
            OnnxDataType::Float64,
        ] {
            assert_eq!(OnnxDataType::from_code(dtype.code()).unwrap(), dtype);
        }
        assert!(matches!(
            OnnxDataType::from_code(16),
            Err(OnnxError::UnsupportedDataType(16))
        ));
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(OnnxFormat::from_path(Path::new("m.json")), OnnxFormat::Json);
        assert_eq!(OnnxFormat::from_path(Path::new("m.onnx")), OnnxFormat::Protobuf);
    }

    #[test]
    fn test_detect_json_content_behind_onnx_extension() {
        let onnx = Path::new("m.onnx");
        assert_eq!(OnnxFormat::detect(onnx, b"  {\"ir_version\": 7}"), OnnxFormat::Json);
        assert_eq!(OnnxFormat::detect(onnx, &[0x08, 0x07, 0x12]), OnnxFormat::Protobuf);
        assert_eq!(OnnxFormat::detect(Path::new("m.json"), b""), OnnxFormat::Json);
    }
}
