//! Matryoshka dimension transform.
//!
//! A full-precision embedding is stored once per configured dimension. Lower
//! dimensions are the unit-normalized prefix of the full vector, so every
//! variant is prefix-consistent with the others up to a scalar.

use strata_types::error::TransformError;

/// Default tolerance for [`validate_nesting`].
pub const NESTING_TOLERANCE: f32 = 0.01;

/// Take the first `target_dim` components and scale them to unit L2 norm.
pub fn truncate_and_normalize(vector: &[f32], target_dim: usize) -> Result<Vec<f32>, TransformError> {
    if vector.len() < target_dim {
        return Err(TransformError::Dimension {
            len: vector.len(),
            target: target_dim,
        });
    }
    let prefix = &vector[..target_dim];
    let norm = prefix
        .iter()
        .map(|&x| f64::from(x) * f64::from(x))
        .sum::<f64>()
        .sqrt();
    if norm == 0.0 {
        return Err(TransformError::ZeroVector { target: target_dim });
    }
    Ok(prefix.iter().map(|&x| (f64::from(x) / norm) as f32).collect())
}

/// Derive one variant per requested dimension, in the order requested.
///
/// A dimension equal to the full length returns the source vector unchanged.
pub fn derive_variants(
    full_vector: &[f32],
    dims: &[usize],
) -> Result<Vec<(usize, Vec<f32>)>, TransformError> {
    dims.iter()
        .map(|&dim| {
            if dim == full_vector.len() {
                Ok((dim, full_vector.to_vec()))
            } else {
                truncate_and_normalize(full_vector, dim).map(|v| (dim, v))
            }
        })
        .collect()
}

/// Cosine similarity over the common prefix of two vectors.
///
/// Returns 0.0 when either prefix has zero magnitude.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let n = a.len().min(b.len());
    let (mut dot, mut mag_a, mut mag_b) = (0.0f64, 0.0f64, 0.0f64);
    for i in 0..n {
        let (x, y) = (f64::from(a[i]), f64::from(b[i]));
        dot += x * y;
        mag_a += x * x;
        mag_b += y * y;
    }
    if mag_a == 0.0 || mag_b == 0.0 {
        return 0.0;
    }
    (dot / (mag_a.sqrt() * mag_b.sqrt())) as f32
}

/// Check that the truncated `full` embedding agrees with a `native` embedding
/// computed directly at `target_dim`.
pub fn validate_nesting(
    full: &[f32],
    native: &[f32],
    target_dim: usize,
    tolerance: f32,
) -> Result<bool, TransformError> {
    let truncated = truncate_and_normalize(full, target_dim)?;
    Ok(1.0 - cosine_similarity(&truncated, native) < tolerance)
}

/// L2 norm, used by tests and callers checking normalization.
pub fn l2_norm(vector: &[f32]) -> f32 {
    vector
        .iter()
        .map(|&x| f64::from(x) * f64::from(x))
        .sum::<f64>()
        .sqrt() as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Deterministic pseudo-random unit vector.
    fn unit_vector(len: usize, seed: u32) -> Vec<f32> {
        let mut state = seed.wrapping_mul(2_654_435_761).max(1);
        let raw: Vec<f32> = (0..len)
            .map(|_| {
                state ^= state << 13;
                state ^= state >> 17;
                state ^= state << 5;
                (state % 2000) as f32 / 1000.0 - 1.0
            })
            .collect();
        let norm = l2_norm(&raw);
        raw.into_iter().map(|x| x / norm).collect()
    }

    #[test]
    fn test_truncated_variants_are_unit_norm() {
        for seed in 1..20 {
            let v = unit_vector(3072, seed);
            for dim in [1, 2, 256, 384, 1024, 3071] {
                let t = truncate_and_normalize(&v, dim).unwrap();
                assert_eq!(t.len(), dim);
                assert!((l2_norm(&t) - 1.0).abs() < 1e-6, "dim {dim} seed {seed}");
            }
        }
    }

    #[test]
    fn test_truncate_beyond_length_fails() {
        let err = truncate_and_normalize(&[1.0, 0.0], 3).unwrap_err();
        assert_eq!(err, TransformError::Dimension { len: 2, target: 3 });
    }

    #[test]
    fn test_zero_prefix_fails() {
        let err = truncate_and_normalize(&[0.0, 0.0, 1.0], 2).unwrap_err();
        assert_eq!(err, TransformError::ZeroVector { target: 2 });
    }

    #[test]
    fn test_full_dimension_is_bit_identical() {
        let v = vec![0.3_f32, -0.1, 0.7, 2.5];
        let variants = derive_variants(&v, &[2, 4]).unwrap();
        assert_eq!(variants[0].0, 2);
        assert_eq!(variants[1], (4, v.clone()));
        for (a, b) in variants[1].1.iter().zip(&v) {
            assert_eq!(a.to_bits(), b.to_bits());
        }
    }

    #[test]
    fn test_variants_are_prefix_consistent() {
        let v = unit_vector(1024, 7);
        let variants = derive_variants(&v, &[256, 384, 1024]).unwrap();
        let small = &variants[0].1;
        let mid = &variants[1].1;
        // the 256 prefix of the 384 variant, renormalized, is the 256 variant
        let renorm = truncate_and_normalize(mid, 256).unwrap();
        for (a, b) in renorm.iter().zip(small) {
            assert!((a - b).abs() < 1e-5);
        }
    }

    #[test]
    fn test_derive_variants_propagates_errors() {
        assert!(derive_variants(&[1.0, 2.0], &[1, 3]).is_err());
    }

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert!((cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]) + 1.0).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }

    #[test]
    fn test_validate_nesting() {
        let full = unit_vector(512, 3);
        let native = truncate_and_normalize(&full, 128).unwrap();
        assert!(validate_nesting(&full, &native, 128, NESTING_TOLERANCE).unwrap());

        let unrelated = unit_vector(128, 99);
        assert!(!validate_nesting(&full, &unrelated, 128, NESTING_TOLERANCE).unwrap());
    }
}
