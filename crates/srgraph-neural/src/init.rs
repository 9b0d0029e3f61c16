//! Weight initialisation
//!
//! Convolution weights use (semi-)orthogonal initialisation: the kernel is
//! viewed as a `(out_channels, in_channels * kh * kw)` matrix whose rows (or
//! columns, whichever are fewer) are orthonormal, then scaled by a gain that
//! depends on the following non-linearity. Biases start at zero.

use crate::config::SuperResolutionConfig;
use crate::model::{stage_descriptors, StageKind};
use crate::serialization::ParameterStore;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;
use srgraph_core::{Result, Tensor, TensorError};
use tracing::debug;

/// Non-linearity following a layer, for gain selection
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Nonlinearity {
    Linear,
    Sigmoid,
    Tanh,
    ReLU,
    LeakyReLU(f32),
}

/// Recommended gain for a non-linearity
///
/// `√2` for ReLU, `5/3` for tanh, `√(2 / (1 + slope²))` for leaky ReLU and
/// `1` otherwise.
pub fn calculate_gain(nonlinearity: Nonlinearity) -> f32 {
    match nonlinearity {
        Nonlinearity::Linear | Nonlinearity::Sigmoid => 1.0,
        Nonlinearity::Tanh => 5.0 / 3.0,
        Nonlinearity::ReLU => std::f32::consts::SQRT_2,
        Nonlinearity::LeakyReLU(slope) => (2.0 / (1.0 + slope * slope)).sqrt(),
    }
}

/// Draw a (semi-)orthogonal tensor of `shape`, scaled by `gain`
///
/// `shape[0]` is the row count and the remaining dimensions are flattened into
/// columns. The Gaussian draw is orthonormalised along the shorter side with
/// modified Gram-Schmidt in `f64`. A draw that is numerically rank-deficient
/// is reported as a `NumericalError` rather than silently patched.
pub fn orthogonal(shape: &[usize], gain: f32, rng: &mut StdRng) -> Result<Tensor<f32>> {
    if shape.len() < 2 || shape.iter().any(|&d| d == 0) {
        return Err(TensorError::invalid_shape(
            "orthogonal",
            "needs at least two non-empty dimensions",
            shape,
        ));
    }

    let rows = shape[0];
    let cols: usize = shape[1..].iter().product();
    let matrix: Vec<f64> = (0..rows * cols).map(|_| rng.sample(StandardNormal)).collect();

    // Orthonormalise whichever side is shorter, stored as contiguous vectors.
    let (count, len) = if rows <= cols { (rows, cols) } else { (cols, rows) };
    let mut vectors: Vec<Vec<f64>> = if rows <= cols {
        matrix.chunks_exact(cols).map(<[f64]>::to_vec).collect()
    } else {
        (0..cols)
            .map(|c| (0..rows).map(|r| matrix[r * cols + c]).collect())
            .collect()
    };
    modified_gram_schmidt(&mut vectors)?;

    let gain = f64::from(gain);
    let mut data = vec![0.0f32; rows * cols];
    for (i, vector) in vectors.iter().enumerate().take(count) {
        for (j, &v) in vector.iter().enumerate().take(len) {
            let (r, c) = if rows <= cols { (i, j) } else { (j, i) };
            data[r * cols + c] = (v * gain) as f32;
        }
    }

    Tensor::from_vec(data, shape)
}

fn modified_gram_schmidt(vectors: &mut [Vec<f64>]) -> Result<()> {
    const RANK_EPS: f64 = 1e-10;

    for i in 0..vectors.len() {
        let (done, rest) = vectors.split_at_mut(i);
        let current = &mut rest[0];
        for basis in done.iter() {
            let projection: f64 = basis.iter().zip(current.iter()).map(|(a, b)| a * b).sum();
            for (c, b) in current.iter_mut().zip(basis) {
                *c -= projection * b;
            }
        }

        let norm = current.iter().map(|v| v * v).sum::<f64>().sqrt();
        if norm < RANK_EPS {
            return Err(TensorError::numerical_error(
                "orthogonal",
                format!("random draw is rank-deficient at vector {i}"),
            ));
        }
        current.iter_mut().for_each(|v| *v /= norm);
    }
    Ok(())
}

/// Initial parameters for a super-resolution network
///
/// Convolutions followed by ReLU get gain `√2`, the final convolution gain
/// `1`. All tensors are drawn from one generator seeded with `seed`, in stage
/// order, so the result depends only on `(config, seed)`.
pub fn init_parameters(config: &SuperResolutionConfig, seed: u64) -> Result<ParameterStore> {
    config.validate()?;
    let mut rng = StdRng::seed_from_u64(seed);
    let mut store = ParameterStore::new();

    for stage in stage_descriptors(config.upscale_factor) {
        let StageKind::Conv(spec) = stage.kind else {
            continue;
        };
        let gain = if stage.relu {
            calculate_gain(Nonlinearity::ReLU)
        } else {
            calculate_gain(Nonlinearity::Linear)
        };

        let weight = orthogonal(&spec.weight_shape(), gain, &mut rng)?;
        store.insert(format!("{}.weight", stage.name), weight);
        store.insert(format!("{}.bias", stage.name), Tensor::zeros(&spec.bias_shape()));
        debug!(stage = stage.name, gain, "initialised convolution");
    }

    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    /// `M Mᵀ` for an `n x m` row-major matrix
    fn gram(data: &[f32], n: usize, m: usize) -> Vec<f64> {
        let mut out = vec![0.0; n * n];
        for i in 0..n {
            for j in 0..n {
                out[i * n + j] = (0..m)
                    .map(|k| f64::from(data[i * m + k]) * f64::from(data[j * m + k]))
                    .sum();
            }
        }
        out
    }

    fn transpose(data: &[f32], n: usize, m: usize) -> Vec<f32> {
        (0..m)
            .flat_map(|c| (0..n).map(move |r| data[r * m + c]))
            .collect()
    }

    #[test]
    fn test_gains() {
        assert_abs_diff_eq!(calculate_gain(Nonlinearity::ReLU), 2.0f32.sqrt());
        assert_abs_diff_eq!(calculate_gain(Nonlinearity::Linear), 1.0);
        assert_abs_diff_eq!(calculate_gain(Nonlinearity::Tanh), 5.0 / 3.0);
        assert_abs_diff_eq!(calculate_gain(Nonlinearity::LeakyReLU(0.0)), 2.0f32.sqrt());
    }

    #[test]
    fn test_wide_matrix_has_orthogonal_rows() {
        // conv4 at r = 3: 9 x 288
        let mut rng = StdRng::seed_from_u64(7);
        let w = orthogonal(&[9, 32, 3, 3], 1.0, &mut rng).unwrap();
        let g = gram(&w.to_vec(), 9, 288);
        for i in 0..9 {
            for j in 0..9 {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert_abs_diff_eq!(g[i * 9 + j], expected, epsilon = 1e-5);
            }
        }
    }

    #[test]
    fn test_tall_matrix_has_orthogonal_columns() {
        // conv1: 64 x 25, scaled by √2
        let mut rng = StdRng::seed_from_u64(7);
        let w = orthogonal(&[64, 1, 5, 5], 2.0f32.sqrt(), &mut rng).unwrap();
        let g = gram(&transpose(&w.to_vec(), 64, 25), 25, 64);
        for i in 0..25 {
            for j in 0..25 {
                let expected = if i == j { 2.0 } else { 0.0 };
                assert_abs_diff_eq!(g[i * 25 + j], expected, epsilon = 1e-5);
            }
        }
    }

    #[test]
    fn test_rejects_degenerate_shape() {
        let mut rng = StdRng::seed_from_u64(0);
        assert!(orthogonal(&[4], 1.0, &mut rng).is_err());
        assert!(orthogonal(&[4, 0], 1.0, &mut rng).is_err());
    }

    #[test]
    fn test_parallel_vectors_are_rank_deficient() {
        let mut vectors = vec![vec![1.0, 2.0], vec![2.0, 4.0]];
        assert!(modified_gram_schmidt(&mut vectors).is_err());
    }

    #[test]
    fn test_init_parameters() {
        let config = SuperResolutionConfig::new(3);
        let store = init_parameters(&config, 11).unwrap();
        assert_eq!(store.len(), 8);
        assert_eq!(store.get("conv4.weight").unwrap().dims(), &[9, 32, 3, 3]);
        assert!(store.get("conv2.bias").unwrap().to_vec().iter().all(|&b| b == 0.0));

        assert_eq!(init_parameters(&config, 11).unwrap(), store);
        assert_ne!(init_parameters(&config, 12).unwrap(), store);
    }
}
