//! Little-endian raw tensor bytes
//!
//! Interchange formats (ONNX `raw_data`, SafeTensors) store elements as packed
//! little-endian bytes. Encoding goes through `bytemuck` on little-endian hosts.

use crate::{Result, TensorError};

/// Encode `f32` values as little-endian bytes
pub fn f32_to_le_bytes(values: &[f32]) -> Vec<u8> {
    if cfg!(target_endian = "little") {
        bytemuck::cast_slice(values).to_vec()
    } else {
        values.iter().flat_map(|v| v.to_le_bytes()).collect()
    }
}

/// Encode `i64` values as little-endian bytes
pub fn i64_to_le_bytes(values: &[i64]) -> Vec<u8> {
    if cfg!(target_endian = "little") {
        bytemuck::cast_slice(values).to_vec()
    } else {
        values.iter().flat_map(|v| v.to_le_bytes()).collect()
    }
}

/// Decode little-endian bytes into `f32` values
pub fn f32_from_le_bytes(bytes: &[u8]) -> Result<Vec<f32>> {
    check_width(bytes, 4, "f32")?;
    Ok(bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect())
}

/// Decode little-endian bytes into `f64` values
pub fn f64_from_le_bytes(bytes: &[u8]) -> Result<Vec<f64>> {
    check_width(bytes, 8, "f64")?;
    Ok(bytes
        .chunks_exact(8)
        .map(|c| f64::from_le_bytes([c[0], c[1], c[2], c[3], c[4], c[5], c[6], c[7]]))
        .collect())
}

/// Decode little-endian bytes into `i64` values
pub fn i64_from_le_bytes(bytes: &[u8]) -> Result<Vec<i64>> {
    check_width(bytes, 8, "i64")?;
    Ok(bytes
        .chunks_exact(8)
        .map(|c| i64::from_le_bytes([c[0], c[1], c[2], c[3], c[4], c[5], c[6], c[7]]))
        .collect())
}

fn check_width(bytes: &[u8], width: usize, dtype: &str) -> Result<()> {
    if bytes.len() % width != 0 {
        return Err(TensorError::serialization_error(
            "decode_raw_bytes",
            format!(
                "{} bytes is not a whole number of {dtype} elements",
                bytes.len()
            ),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_f32_layout_is_little_endian() {
        assert_eq!(f32_to_le_bytes(&[1.0]), vec![0x00, 0x00, 0x80, 0x3f]);
        assert_eq!(f32_from_le_bytes(&[0x00, 0x00, 0x80, 0x3f]).unwrap(), vec![1.0]);
    }

    #[test]
    fn test_i64_values() {
        let bytes = i64_to_le_bytes(&[-1, 3]);
        assert_eq!(bytes.len(), 16);
        assert_eq!(i64_from_le_bytes(&bytes).unwrap(), vec![-1, 3]);
    }

    #[test]
    fn test_truncated_input() {
        assert!(f32_from_le_bytes(&[0, 0, 0]).is_err());
        assert!(f64_from_le_bytes(&[0; 12]).is_err());
    }
}
