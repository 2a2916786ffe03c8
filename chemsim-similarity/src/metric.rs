//! Similarity metric identities.

use std::fmt;
use std::str::FromStr;

use chemsim_core::{ChemsimError, Result};

/// A pairwise similarity metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SimilarityMetric {
    Tanimoto,
    Dice,
    Cosine,
    Euclidean,
    Manhattan,
    /// Asymmetric; parameterized by α and β on the calculator.
    Tversky,
}

impl SimilarityMetric {
    /// Every metric, in declaration order.
    pub const ALL: [SimilarityMetric; 6] = [
        SimilarityMetric::Tanimoto,
        SimilarityMetric::Dice,
        SimilarityMetric::Cosine,
        SimilarityMetric::Euclidean,
        SimilarityMetric::Manhattan,
        SimilarityMetric::Tversky,
    ];

    /// Canonical lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            SimilarityMetric::Tanimoto => "tanimoto",
            SimilarityMetric::Dice => "dice",
            SimilarityMetric::Cosine => "cosine",
            SimilarityMetric::Euclidean => "euclidean",
            SimilarityMetric::Manhattan => "manhattan",
            SimilarityMetric::Tversky => "tversky",
        }
    }

    /// Whether `metric(a, b)` always equals `metric(b, a)`.
    pub fn is_symmetric(self) -> bool {
        self != SimilarityMetric::Tversky
    }
}

impl fmt::Display for SimilarityMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SimilarityMetric {
    type Err = ChemsimError;

    /// Case-insensitive; `"jaccard"` is accepted as an alias for Tanimoto.
    fn from_str(s: &str) -> Result<Self> {
        let name = s.trim().to_ascii_lowercase();
        match name.as_str() {
            "tanimoto" | "jaccard" => Ok(SimilarityMetric::Tanimoto),
            "dice" => Ok(SimilarityMetric::Dice),
            "cosine" => Ok(SimilarityMetric::Cosine),
            "euclidean" => Ok(SimilarityMetric::Euclidean),
            "manhattan" => Ok(SimilarityMetric::Manhattan),
            "tversky" => Ok(SimilarityMetric::Tversky),
            _ => Err(ChemsimError::UnsupportedMetric(s.to_string())),
        }
    }
}
