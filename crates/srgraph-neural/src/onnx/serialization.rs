//! Serde support for ONNX types that are stored as integer codes
//!
//! JSON models record element types by their ONNX code (`1` for float32) so
//! the JSON and protobuf encodings carry the same information.

use super::types::OnnxDataType;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

impl Serialize for OnnxDataType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_i32(self.code())
    }
}

impl<'de> Deserialize<'de> for OnnxDataType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let code = i32::deserialize(deserializer)?;
        OnnxDataType::from_code(code).map_err(D::Error::custom)
    }
}
