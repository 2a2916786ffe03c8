//! Closed set of similarity calculators.
//!
//! A [`Calculator`] pairs a [`SimilarityMetric`] with its parameters (only
//! Tversky has any) and dispatches to the matching function in
//! [`crate::similarity`]. Calculators are `Copy` and stateless, so one value
//! can be shared by any number of threads.

use chemsim_core::{ChemsimError, Result};

use crate::fingerprint::{Fingerprint, FingerprintEncoding};
use crate::metric::SimilarityMetric;
use crate::similarity;

/// Default Tversky α (with β = 0.5 this is the Dice coefficient).
pub const DEFAULT_TVERSKY_ALPHA: f64 = 0.5;

/// Default Tversky β.
pub const DEFAULT_TVERSKY_BETA: f64 = 0.5;

/// A similarity calculator for one metric.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Calculator {
    Tanimoto,
    Dice,
    Cosine,
    Euclidean,
    Manhattan,
    /// Weights α on features only in the first fingerprint, β on features
    /// only in the second.
    Tversky { alpha: f64, beta: f64 },
}

impl Calculator {
    /// Calculator for `metric`, with default Tversky parameters.
    pub fn for_metric(metric: SimilarityMetric) -> Self {
        match metric {
            SimilarityMetric::Tanimoto => Calculator::Tanimoto,
            SimilarityMetric::Dice => Calculator::Dice,
            SimilarityMetric::Cosine => Calculator::Cosine,
            SimilarityMetric::Euclidean => Calculator::Euclidean,
            SimilarityMetric::Manhattan => Calculator::Manhattan,
            SimilarityMetric::Tversky => Calculator::Tversky {
                alpha: DEFAULT_TVERSKY_ALPHA,
                beta: DEFAULT_TVERSKY_BETA,
            },
        }
    }

    /// Tversky calculator with explicit weights.
    ///
    /// # Errors
    ///
    /// Returns [`ChemsimError::NegativeParameter`] if either weight is negative
    /// or not finite.
    pub fn tversky(alpha: f64, beta: f64) -> Result<Self> {
        similarity::check_tversky_params(alpha, beta)?;
        Ok(Calculator::Tversky { alpha, beta })
    }

    /// The metric this calculator implements.
    pub fn metric(&self) -> SimilarityMetric {
        match self {
            Calculator::Tanimoto => SimilarityMetric::Tanimoto,
            Calculator::Dice => SimilarityMetric::Dice,
            Calculator::Cosine => SimilarityMetric::Cosine,
            Calculator::Euclidean => SimilarityMetric::Euclidean,
            Calculator::Manhattan => SimilarityMetric::Manhattan,
            Calculator::Tversky { .. } => SimilarityMetric::Tversky,
        }
    }

    /// Whether the metric is defined for `encoding`.
    pub fn supports_encoding(&self, encoding: FingerprintEncoding) -> bool {
        similarity::supported_encodings(self.metric()).contains(&encoding)
    }

    /// Score `fp1` against `fp2`.
    pub fn calculate(&self, fp1: &Fingerprint, fp2: &Fingerprint) -> Result<f64> {
        match *self {
            Calculator::Tanimoto => similarity::tanimoto(fp1, fp2),
            Calculator::Dice => similarity::dice(fp1, fp2),
            Calculator::Cosine => similarity::cosine(fp1, fp2),
            Calculator::Euclidean => similarity::euclidean(fp1, fp2),
            Calculator::Manhattan => similarity::manhattan(fp1, fp2),
            Calculator::Tversky { alpha, beta } => similarity::tversky(fp1, fp2, alpha, beta),
        }
    }

    /// Score two possibly-absent fingerprints.
    ///
    /// # Errors
    ///
    /// Returns [`ChemsimError::NilFingerprint`] if either side is `None`,
    /// otherwise whatever [`Calculator::calculate`] returns.
    pub fn calculate_present(
        &self,
        fp1: Option<&Fingerprint>,
        fp2: Option<&Fingerprint>,
    ) -> Result<f64> {
        match (fp1, fp2) {
            (Some(a), Some(b)) => self.calculate(a, b),
            (None, _) => Err(ChemsimError::NilFingerprint("first fingerprint".into())),
            (_, None) => Err(ChemsimError::NilFingerprint("second fingerprint".into())),
        }
    }
}
