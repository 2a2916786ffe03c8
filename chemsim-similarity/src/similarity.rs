//! Pairwise fingerprint similarity metrics.
//!
//! Every function here is a pure function of its two inputs and returns a
//! score in `[0, 1]`. Shared preconditions, checked in this order:
//!
//! 1. both fingerprints come from the same algorithm ([`ChemsimError::TypeMismatch`]),
//! 2. both use the same encoding ([`ChemsimError::EncodingMismatch`]),
//! 3. the metric is defined for that encoding ([`ChemsimError::EncodingUnsupported`]),
//! 4. both have the same bit length or dimension ([`ChemsimError::DimensionMismatch`]).
//!
//! # Empty fingerprints
//!
//! The set-based metrics disagree on purpose when both operands have no set
//! bits: Tanimoto returns 0.0 (a zero union scores zero, so an all-zero
//! fingerprint is not similar even to itself), while Dice and Tversky treat
//! two empty sets as identical and return 1.0.

use chemsim_core::{bitset, ChemsimError, Result};

use crate::fingerprint::{Fingerprint, FingerprintEncoding};
use crate::metric::SimilarityMetric;

/// Encodings each metric is defined for.
pub fn supported_encodings(metric: SimilarityMetric) -> &'static [FingerprintEncoding] {
    use FingerprintEncoding::*;
    match metric {
        SimilarityMetric::Tanimoto => &[BitVector, CountVector, DenseVector],
        SimilarityMetric::Tversky => &[BitVector, CountVector],
        SimilarityMetric::Dice => &[BitVector],
        SimilarityMetric::Cosine => &[BitVector, DenseVector],
        SimilarityMetric::Euclidean | SimilarityMetric::Manhattan => &[DenseVector],
    }
}

/// Tanimoto (Jaccard) coefficient.
///
/// Packed fingerprints: `|A ∩ B| / |A ∪ B|`, with an empty union scoring 0.0.
/// Dense fingerprints: the Ruzicka form `Σ min(aᵢ, bᵢ) / Σ max(aᵢ, bᵢ)`, with
/// a zero denominator scoring 0.0.
///
/// The Ruzicka form is only a similarity for non-negative components. With
/// negative components the ratio can leave `[0, 1]` and is clamped, so two
/// different embeddings may score 1.0; use [`cosine`] for signed vectors.
pub fn tanimoto(fp1: &Fingerprint, fp2: &Fingerprint) -> Result<f64> {
    check_pair(SimilarityMetric::Tanimoto, fp1, fp2)?;
    if let (Some(a), Some(b)) = (fp1.vector(), fp2.vector()) {
        let (mut num, mut den) = (0.0_f64, 0.0_f64);
        for (&x, &y) in a.iter().zip(b) {
            let (x, y) = (f64::from(x), f64::from(y));
            num += x.min(y);
            den += x.max(y);
        }
        if den == 0.0 {
            return Ok(0.0);
        }
        return Ok(clamp_unit(num / den));
    }
    let (a, b) = (fp1.feature_bytes(), fp2.feature_bytes());
    let intersection = bitset::popcount(&bitset::bit_and(&a, &b)?);
    let union = bitset::popcount(&bitset::bit_or(&a, &b)?);
    if union == 0 {
        return Ok(0.0);
    }
    Ok(intersection as f64 / union as f64)
}

/// Dice (Sørensen) coefficient: `2|A ∩ B| / (|A| + |B|)`.
///
/// Bit vectors only. Two empty fingerprints score 1.0.
pub fn dice(fp1: &Fingerprint, fp2: &Fingerprint) -> Result<f64> {
    check_pair(SimilarityMetric::Dice, fp1, fp2)?;
    let (a, b) = (fp1.feature_bytes(), fp2.feature_bytes());
    let (count_a, count_b) = (bitset::popcount(&a), bitset::popcount(&b));
    if count_a + count_b == 0 {
        return Ok(1.0);
    }
    let intersection = bitset::and_count(&a, &b)?;
    Ok(2.0 * intersection as f64 / (count_a + count_b) as f64)
}

/// Tversky index: `|A ∩ B| / (|A ∩ B| + α|A − B| + β|B − A|)`.
///
/// `α = β = 1` reduces to Tanimoto and `α = β = 0.5` to Dice. A zero
/// denominator scores 1.0 when both fingerprints are empty and 0.0 otherwise
/// (possible only with `α = β = 0` and disjoint sets).
///
/// # Errors
///
/// Returns [`ChemsimError::NegativeParameter`] if `alpha` or `beta` is negative
/// or not finite.
pub fn tversky(fp1: &Fingerprint, fp2: &Fingerprint, alpha: f64, beta: f64) -> Result<f64> {
    check_tversky_params(alpha, beta)?;
    check_pair(SimilarityMetric::Tversky, fp1, fp2)?;
    let (a, b) = (fp1.feature_bytes(), fp2.feature_bytes());
    let (count_a, count_b) = (bitset::popcount(&a), bitset::popcount(&b));
    let common = bitset::and_count(&a, &b)? as f64;
    let only_a = (count_a as f64) - common;
    let only_b = (count_b as f64) - common;
    let den = common + alpha * only_a + beta * only_b;
    if den == 0.0 {
        return Ok(if count_a + count_b == 0 { 1.0 } else { 0.0 });
    }
    Ok(clamp_unit(common / den))
}

/// Cosine similarity rescaled from `[-1, 1]` to `[0, 1]` via `(cos + 1) / 2`.
///
/// Bit vectors are expanded to 0.0/1.0 per position. A zero-norm operand
/// scores 0.0 directly, not the rescaled midpoint 0.5.
pub fn cosine(fp1: &Fingerprint, fp2: &Fingerprint) -> Result<f64> {
    check_pair(SimilarityMetric::Cosine, fp1, fp2)?;
    let (a, b) = (fp1.to_f64_vec(), fp2.to_f64_vec());
    let mut dot = 0.0_f64;
    let mut norm_a = 0.0_f64;
    let mut norm_b = 0.0_f64;
    for (x, y) in a.iter().zip(&b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return Ok(0.0);
    }
    let cos = dot / (norm_a.sqrt() * norm_b.sqrt());
    Ok(clamp_unit((cos + 1.0) / 2.0))
}

/// `1 / (1 + ‖a − b‖₂)` for dense vectors.
pub fn euclidean(fp1: &Fingerprint, fp2: &Fingerprint) -> Result<f64> {
    check_pair(SimilarityMetric::Euclidean, fp1, fp2)?;
    let distance = dense_pairs(fp1, fp2)
        .map(|(x, y)| (x - y).powi(2))
        .sum::<f64>()
        .sqrt();
    Ok(1.0 / (1.0 + distance))
}

/// `1 / (1 + ‖a − b‖₁)` for dense vectors.
pub fn manhattan(fp1: &Fingerprint, fp2: &Fingerprint) -> Result<f64> {
    check_pair(SimilarityMetric::Manhattan, fp1, fp2)?;
    let distance: f64 = dense_pairs(fp1, fp2).map(|(x, y)| (x - y).abs()).sum();
    Ok(1.0 / (1.0 + distance))
}

pub(crate) fn check_tversky_params(alpha: f64, beta: f64) -> Result<()> {
    if !(alpha.is_finite() && alpha >= 0.0) {
        return Err(ChemsimError::NegativeParameter {
            name: "alpha",
            value: alpha,
        });
    }
    if !(beta.is_finite() && beta >= 0.0) {
        return Err(ChemsimError::NegativeParameter {
            name: "beta",
            value: beta,
        });
    }
    Ok(())
}

fn check_pair(metric: SimilarityMetric, fp1: &Fingerprint, fp2: &Fingerprint) -> Result<()> {
    if fp1.fingerprint_type() != fp2.fingerprint_type() {
        return Err(ChemsimError::TypeMismatch {
            left: fp1.fingerprint_type().to_string(),
            right: fp2.fingerprint_type().to_string(),
        });
    }
    if fp1.encoding() != fp2.encoding() {
        return Err(ChemsimError::EncodingMismatch {
            left: fp1.encoding().to_string(),
            right: fp2.encoding().to_string(),
        });
    }
    if !supported_encodings(metric).contains(&fp1.encoding()) {
        return Err(ChemsimError::EncodingUnsupported {
            metric: metric.to_string(),
            encoding: fp1.encoding().to_string(),
        });
    }
    if fp1.num_bits() != fp2.num_bits() {
        return Err(ChemsimError::DimensionMismatch {
            left: fp1.num_bits(),
            right: fp2.num_bits(),
        });
    }
    Ok(())
}

fn dense_pairs<'a>(
    fp1: &'a Fingerprint,
    fp2: &'a Fingerprint,
) -> impl Iterator<Item = (f64, f64)> + 'a {
    let a = fp1.vector().unwrap_or_default();
    let b = fp2.vector().unwrap_or_default();
    a.iter()
        .zip(b)
        .map(|(&x, &y)| (f64::from(x), f64::from(y)))
}

fn clamp_unit(x: f64) -> f64 {
    x.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fingerprint::FingerprintType;
    use chemsim_core::ErrorKind;

    fn bits(payload: &[u8]) -> Fingerprint {
        Fingerprint::bit_vector(FingerprintType::Rdkit, payload, payload.len() * 8, 0).unwrap()
    }

    fn one_hot(pos: usize) -> Fingerprint {
        let mut v = vec![0.0f32; 32];
        v[pos] = 1.0;
        Fingerprint::dense(&v, "v1").unwrap()
    }

    fn dense(values: &[f32]) -> Fingerprint {
        let mut v = values.to_vec();
        v.resize(32, 0.0);
        Fingerprint::dense(&v, "v1").unwrap()
    }

    #[test]
    fn tanimoto_bits() {
        let a = bits(&[0b0000_1111]);
        let b = bits(&[0b0011_1100]);
        // |A∩B| = 2, |A∪B| = 6
        assert!((tanimoto(&a, &b).unwrap() - 2.0 / 6.0).abs() < 1e-12);
        assert_eq!(tanimoto(&a, &a).unwrap(), 1.0);
    }

    #[test]
    fn tanimoto_empty_union_is_zero() {
        let empty = bits(&[0, 0]);
        assert_eq!(tanimoto(&empty, &empty).unwrap(), 0.0);
    }

    #[test]
    fn tanimoto_dense_ruzicka() {
        let a = dense(&[1.0, 2.0, 0.0]);
        let b = dense(&[2.0, 1.0, 1.0]);
        // Σmin = 1 + 1 + 0 = 2, Σmax = 2 + 2 + 1 = 5
        assert!((tanimoto(&a, &b).unwrap() - 0.4).abs() < 1e-12);
        let zero = dense(&[]);
        assert_eq!(tanimoto(&zero, &zero).unwrap(), 0.0);
    }

    #[test]
    fn tanimoto_dense_negative_components_clamp() {
        // Σmin = -2, Σmax = -1: the raw ratio is 2
        let a = dense(&[-2.0]);
        let b = dense(&[-1.0]);
        assert_eq!(tanimoto(&a, &b).unwrap(), 1.0);
    }

    #[test]
    fn tanimoto_counts_use_packed_bits() {
        let a = Fingerprint::count_vector(FingerprintType::Morgan, &[0x0F], 8, 2).unwrap();
        let b = Fingerprint::count_vector(FingerprintType::Morgan, &[0x03], 8, 2).unwrap();
        assert!((tanimoto(&a, &b).unwrap() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn padding_bits_do_not_count() {
        let a = Fingerprint::bit_vector(FingerprintType::Rdkit, &[0x01, 0xF0], 12, 0).unwrap();
        let b = Fingerprint::bit_vector(FingerprintType::Rdkit, &[0x01, 0x00], 12, 0).unwrap();
        assert_eq!(tanimoto(&a, &b).unwrap(), 1.0);
    }

    #[test]
    fn dice_bits() {
        let a = bits(&[0b0000_1111]);
        let b = bits(&[0b0011_1100]);
        // 2·2 / (4 + 4)
        assert!((dice(&a, &b).unwrap() - 0.5).abs() < 1e-12);
        let empty = bits(&[0]);
        assert_eq!(dice(&empty, &empty).unwrap(), 1.0);
        assert_eq!(dice(&empty, &a).unwrap(), 0.0);
    }

    #[test]
    fn dice_rejects_dense_and_counts() {
        let err = dice(&one_hot(0), &one_hot(1)).unwrap_err();
        assert!(matches!(err, ChemsimError::EncodingUnsupported { .. }));
        assert_eq!(err.kind(), ErrorKind::TypeOrEncodingMismatch);
        let c = Fingerprint::count_vector(FingerprintType::Rdkit, &[1], 8, 0).unwrap();
        assert!(dice(&c, &c).is_err());
    }

    #[test]
    fn tversky_reduces_to_tanimoto_and_dice() {
        let a = bits(&[0b1011_0110, 0x0F]);
        let b = bits(&[0b0011_1100, 0x33]);
        assert!((tversky(&a, &b, 1.0, 1.0).unwrap() - tanimoto(&a, &b).unwrap()).abs() < 1e-12);
        assert!((tversky(&a, &b, 0.5, 0.5).unwrap() - dice(&a, &b).unwrap()).abs() < 1e-12);
    }

    #[test]
    fn tversky_is_asymmetric() {
        let a = bits(&[0b0000_0011]);
        let b = bits(&[0b0000_1111]);
        // common 2, only_a 0, only_b 2
        assert!((tversky(&a, &b, 1.0, 0.0).unwrap() - 1.0).abs() < 1e-12);
        assert!((tversky(&b, &a, 1.0, 0.0).unwrap() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn tversky_edge_cases() {
        let empty = bits(&[0]);
        assert_eq!(tversky(&empty, &empty, 0.7, 0.3).unwrap(), 1.0);
        let a = bits(&[0x01]);
        let b = bits(&[0x02]);
        assert_eq!(tversky(&a, &b, 0.0, 0.0).unwrap(), 0.0);
        assert_eq!(
            tversky(&a, &b, -0.1, 0.5).unwrap_err(),
            ChemsimError::NegativeParameter {
                name: "alpha",
                value: -0.1
            }
        );
        assert!(matches!(
            tversky(&a, &b, 0.5, -1.0).unwrap_err(),
            ChemsimError::NegativeParameter { name: "beta", .. }
        ));
        assert!(tversky(&a, &b, f64::NAN, 0.5).is_err());
    }

    #[test]
    fn tversky_infinite_weight_never_scores() {
        // a ⊆ b, so α·|a − b| would be ∞·0
        let a = bits(&[0x03]);
        let b = bits(&[0x0F]);
        assert!(matches!(
            tversky(&a, &b, f64::INFINITY, 0.0).unwrap_err(),
            ChemsimError::NegativeParameter { name: "alpha", .. }
        ));
        assert!(matches!(
            tversky(&b, &a, 0.0, f64::NEG_INFINITY).unwrap_err(),
            ChemsimError::NegativeParameter { name: "beta", .. }
        ));
    }

    #[test]
    fn cosine_dense() {
        assert_eq!(cosine(&one_hot(0), &one_hot(1)).unwrap(), 0.5);
        let a = dense(&[1.0, 2.0, 3.0]);
        let b = dense(&[2.0, 4.0, 6.0]);
        assert!((cosine(&a, &b).unwrap() - 1.0).abs() < 1e-12);
        let c = dense(&[-1.0, -2.0, -3.0]);
        assert!(cosine(&a, &c).unwrap().abs() < 1e-12);
    }

    #[test]
    fn cosine_zero_norm_is_zero() {
        let zero = dense(&[]);
        assert_eq!(cosine(&zero, &one_hot(3)).unwrap(), 0.0);
        assert_eq!(cosine(&one_hot(3), &zero).unwrap(), 0.0);
    }

    #[test]
    fn cosine_bits() {
        let a = bits(&[0b0000_0011]);
        let b = bits(&[0b0000_0110]);
        // cos = 1 / 2
        assert!((cosine(&a, &b).unwrap() - 0.75).abs() < 1e-12);
    }

    #[test]
    fn distance_scores() {
        let a = dense(&[0.0, 0.0]);
        let b = dense(&[3.0, 4.0]);
        assert!((euclidean(&a, &b).unwrap() - 1.0 / 6.0).abs() < 1e-12);
        assert!((manhattan(&a, &b).unwrap() - 1.0 / 8.0).abs() < 1e-12);
        assert_eq!(euclidean(&b, &b).unwrap(), 1.0);
        assert_eq!(manhattan(&b, &b).unwrap(), 1.0);

        let far = dense(&[1e6; 32]);
        let s = euclidean(&a, &far).unwrap();
        assert!(s > 0.0 && s < 1e-6);
    }

    #[test]
    fn distances_reject_bits() {
        let a = bits(&[0xFF]);
        for result in [euclidean(&a, &a), manhattan(&a, &a)] {
            assert!(matches!(
                result.unwrap_err(),
                ChemsimError::EncodingUnsupported { .. }
            ));
        }
    }

    #[test]
    fn mismatches() {
        let morgan = Fingerprint::bit_vector(FingerprintType::Morgan, &[0xFF], 8, 2).unwrap();
        let rdkit = bits(&[0xFF]);
        assert!(matches!(
            tanimoto(&morgan, &rdkit).unwrap_err(),
            ChemsimError::TypeMismatch { .. }
        ));

        let short = bits(&[0xFF]);
        let long = bits(&[0xFF, 0xFF]);
        let err = tanimoto(&short, &long).unwrap_err();
        assert_eq!(err, ChemsimError::DimensionMismatch { left: 8, right: 16 });
        assert_eq!(err.kind(), ErrorKind::DimensionMismatch);

        let counts = Fingerprint::count_vector(FingerprintType::Rdkit, &[0xFF], 8, 0).unwrap();
        assert!(matches!(
            tanimoto(&short, &counts).unwrap_err(),
            ChemsimError::EncodingMismatch { .. }
        ));

        let d32 = dense(&[1.0]);
        let d64 = Fingerprint::dense(&[1.0; 64], "v1").unwrap();
        assert!(matches!(
            cosine(&d32, &d64).unwrap_err(),
            ChemsimError::DimensionMismatch { left: 32, right: 64 }
        ));
    }
}
