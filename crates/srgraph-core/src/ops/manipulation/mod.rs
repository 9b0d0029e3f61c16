//! Shape manipulation: reshape and axis permutation
//!
//! Both operations move data only; element values are never touched.

use crate::{Result, Tensor, TensorError};
use ndarray::{ArrayD, IxDyn};

/// Reshape a tensor, preserving row-major element order
pub fn reshape<T: Clone>(tensor: &Tensor<T>, shape: &[usize]) -> Result<Tensor<T>> {
    let total_size: usize = shape.iter().product();
    if total_size != tensor.numel() {
        return Err(TensorError::invalid_shape(
            "reshape",
            format!(
                "cannot reshape tensor of size {} to shape {shape:?} (size {total_size})",
                tensor.numel()
            ),
            tensor.dims(),
        ));
    }

    let array = ArrayD::from_shape_vec(IxDyn(shape), tensor.to_vec())
        .map_err(|e| TensorError::compute_error("reshape", e.to_string()))?;
    Ok(Tensor::from_array(array))
}

/// Resolve an ONNX-style reshape target against the input dimensions
///
/// `0` copies the input dimension at the same position and a single `-1` is
/// inferred from the remaining element count.
pub fn resolve_reshape_dims(input_dims: &[usize], target: &[i64]) -> Result<Vec<usize>> {
    let numel: usize = input_dims.iter().product();
    let mut inferred = None;
    let mut dims = Vec::with_capacity(target.len());

    for (i, &d) in target.iter().enumerate() {
        match d {
            -1 => {
                if inferred.replace(i).is_some() {
                    return Err(TensorError::invalid_argument_op(
                        "reshape",
                        "at most one dimension may be -1",
                    ));
                }
                dims.push(1);
            }
            0 => {
                let copied = input_dims.get(i).copied().ok_or_else(|| {
                    TensorError::invalid_argument_op(
                        "reshape",
                        &format!("dimension {i} is 0 but the input has rank {}", input_dims.len()),
                    )
                })?;
                dims.push(copied);
            }
            d if d > 0 => dims.push(d as usize),
            d => {
                return Err(TensorError::invalid_argument_op(
                    "reshape",
                    &format!("invalid target dimension {d}"),
                ))
            }
        }
    }

    if let Some(i) = inferred {
        let known: usize = dims.iter().product();
        if known == 0 || numel % known != 0 {
            return Err(TensorError::invalid_shape(
                "reshape",
                format!("cannot infer -1 in target {target:?}"),
                input_dims,
            ));
        }
        dims[i] = numel / known;
    }

    Ok(dims)
}

/// Permute the axes of a tensor
///
/// Output axis `i` is input axis `perm[i]`; the result is materialised in
/// row-major order.
pub fn transpose<T: Clone>(tensor: &Tensor<T>, perm: &[usize]) -> Result<Tensor<T>> {
    let rank = tensor.ndim();
    if perm.len() != rank {
        return Err(TensorError::invalid_argument_op(
            "transpose",
            &format!("permutation length {} does not match rank {rank}", perm.len()),
        ));
    }

    let mut seen = vec![false; rank];
    for &axis in perm {
        if axis >= rank || seen[axis] {
            return Err(TensorError::invalid_argument_op(
                "transpose",
                &format!("{perm:?} is not a permutation of 0..{rank}"),
            ));
        }
        seen[axis] = true;
    }

    let permuted = tensor.array().view().permuted_axes(IxDyn(perm));
    Ok(Tensor::from_array(permuted.as_standard_layout().into_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reshape_preserves_order() {
        let t = Tensor::from_vec((0..6).map(|v| v as f32).collect(), &[2, 3]).unwrap();
        let r = reshape(&t, &[3, 2]).unwrap();
        assert_eq!(r.dims(), &[3, 2]);
        assert_eq!(r.to_vec(), t.to_vec());
        assert!(reshape(&t, &[4, 2]).is_err());
    }

    #[test]
    fn test_resolve_reshape_dims() {
        assert_eq!(
            resolve_reshape_dims(&[1, 9, 4, 5], &[0, 1, 3, 3, 4, 5]).unwrap(),
            vec![1, 1, 3, 3, 4, 5]
        );
        assert_eq!(
            resolve_reshape_dims(&[2, 9, 4, 5], &[-1, 1, 12, 15]).unwrap(),
            vec![2, 1, 12, 15]
        );
        assert!(resolve_reshape_dims(&[2, 3], &[-1, -1]).is_err());
        assert!(resolve_reshape_dims(&[2, 3], &[-1, 4]).is_err());
        assert!(resolve_reshape_dims(&[2, 3], &[-2, 3]).is_err());
    }

    #[test]
    fn test_transpose_matrix() {
        let t = Tensor::from_vec((0..6).map(|v| v as f32).collect(), &[2, 3]).unwrap();
        let tt = transpose(&t, &[1, 0]).unwrap();
        assert_eq!(tt.dims(), &[3, 2]);
        assert_eq!(tt.to_vec(), vec![0.0, 3.0, 1.0, 4.0, 2.0, 5.0]);
        assert_eq!(tt.as_slice().map(|s| s.len()), Some(6));
    }

    #[test]
    fn test_transpose_rejects_bad_permutation() {
        let t = Tensor::<f32>::zeros(&[2, 3, 4]);
        assert!(transpose(&t, &[0, 1]).is_err());
        assert!(transpose(&t, &[0, 0, 1]).is_err());
        assert!(transpose(&t, &[0, 1, 3]).is_err());
    }
}
