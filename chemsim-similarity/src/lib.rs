//! Molecular fingerprint similarity for the chemsim engine.
//!
//! Provides validated fingerprint values (bit, count, and dense vectors), the
//! standard cheminformatics similarity metrics (Tanimoto, Dice, Cosine,
//! Tversky, Euclidean, Manhattan), multi-type score fusion, a molecule
//! aggregate, and a search facade that ranks candidates.
//!
//! # Example
//!
//! ```
//! use chemsim_similarity::{Fingerprint, FingerprintType, SimilarityEngine, SimilarityMetric};
//!
//! let query = Fingerprint::bit_vector(FingerprintType::Morgan, &[0b0000_1111], 8, 2).unwrap();
//! let hit = Fingerprint::bit_vector(FingerprintType::Morgan, &[0b0000_0011], 8, 2).unwrap();
//!
//! let engine = SimilarityEngine::new();
//! let score = engine.score(&query, &hit, SimilarityMetric::Tanimoto).unwrap();
//! assert!((score - 0.5).abs() < 1e-12);
//!
//! let dice = engine.score_by_name(&query, &hit, "dice").unwrap();
//! assert!(dice >= score);
//! ```

pub mod calculator;
pub mod engine;
pub mod fingerprint;
pub mod fusion;
pub mod metric;
pub mod molecule;
pub mod record;
pub mod similarity;

pub use calculator::Calculator;
pub use engine::{
    Candidate, CandidateSource, EngineConfig, FusedResult, SimilarityEngine, SimilarityResult,
};
pub use fingerprint::{Fingerprint, FingerprintEncoding, FingerprintType};
pub use fusion::{FusionStrategy, TypeScores, TypeWeights};
pub use metric::SimilarityMetric;
pub use molecule::{Molecule, MoleculeStatus};
pub use record::FingerprintRecord;
pub use similarity::{cosine, dice, euclidean, manhattan, tanimoto, tversky};

pub use chemsim_core::{ChemsimError, ErrorKind, Result};
