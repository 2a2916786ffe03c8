//! Score fusion across fingerprint types.
//!
//! When a query is compared using several fingerprint types (e.g. Morgan and
//! MACCS), a [`FusionStrategy`] collapses the per-type scores into a single
//! ranking score.

use std::collections::BTreeMap;
use std::fmt;

use chemsim_core::{ChemsimError, Result};

use crate::fingerprint::FingerprintType;

/// Per-type similarity scores.
pub type TypeScores = BTreeMap<FingerprintType, f64>;

/// Per-type fusion weights.
pub type TypeWeights = BTreeMap<FingerprintType, f64>;

/// How per-type scores are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FusionStrategy {
    /// `Σ(score·weight) / Σ(weight)`; a type without a weight counts 1.0.
    #[default]
    WeightedAverage,
    /// Highest score wins.
    Max,
    /// Lowest score wins.
    Min,
}

impl FusionStrategy {
    /// Combine `scores` into one score.
    ///
    /// `weights` only affects [`FusionStrategy::WeightedAverage`]; weights for
    /// types absent from `scores` are ignored. A total weight of zero fuses to
    /// 0.0.
    ///
    /// # Errors
    ///
    /// Returns [`ChemsimError::EmptyScores`] if `scores` is empty.
    ///
    /// # Example
    ///
    /// ```
    /// use chemsim_similarity::{FingerprintType, FusionStrategy, TypeScores};
    ///
    /// let scores = TypeScores::from([
    ///     (FingerprintType::Morgan, 0.8),
    ///     (FingerprintType::Maccs, 0.6),
    /// ]);
    /// let fused = FusionStrategy::WeightedAverage.fuse(&scores, None).unwrap();
    /// assert!((fused - 0.7).abs() < 1e-12);
    /// assert_eq!(FusionStrategy::Max.fuse(&scores, None).unwrap(), 0.8);
    /// ```
    pub fn fuse(&self, scores: &TypeScores, weights: Option<&TypeWeights>) -> Result<f64> {
        if scores.is_empty() {
            return Err(ChemsimError::EmptyScores);
        }
        let fused = match self {
            FusionStrategy::WeightedAverage => {
                let mut weighted = 0.0_f64;
                let mut total = 0.0_f64;
                for (fp_type, &score) in scores {
                    let weight = weights
                        .and_then(|w| w.get(fp_type).copied())
                        .unwrap_or(1.0);
                    weighted += score * weight;
                    total += weight;
                }
                if total == 0.0 {
                    return Ok(0.0);
                }
                (weighted / total).clamp(0.0, 1.0)
            }
            FusionStrategy::Max => scores.values().copied().fold(f64::NEG_INFINITY, f64::max),
            FusionStrategy::Min => scores.values().copied().fold(f64::INFINITY, f64::min),
        };
        Ok(fused)
    }
}

impl fmt::Display for FusionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FusionStrategy::WeightedAverage => "weighted_average",
            FusionStrategy::Max => "max",
            FusionStrategy::Min => "min",
        })
    }
}
