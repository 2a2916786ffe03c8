//! Structured error types for the chemsim workspace.
//!
//! Every failure raised by fingerprint construction, the bit-set primitives,
//! the similarity calculators, and score fusion is a deterministic caller
//! error. [`ChemsimError::kind`] groups the specific variants into the coarse
//! [`ErrorKind`] taxonomy for callers that only need to branch on the class.

use thiserror::Error;

/// Coarse classification of a [`ChemsimError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Empty, absent, too-short, or out-of-range payload or parameter.
    InvalidInput,
    /// Operation invoked against an unsupported algorithm/encoding combination.
    TypeOrEncodingMismatch,
    /// Two fingerprints compared with incompatible lengths.
    DimensionMismatch,
    /// Unknown metric name requested.
    UnsupportedMetric,
    /// Fusion invoked with no scores.
    EmptyScoreSet,
    /// Lifecycle operation not allowed from the current state.
    InvalidState,
}

/// Unified error type for all chemsim operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ChemsimError {
    /// The fingerprint algorithm cannot be used with the requested constructor.
    #[error("invalid fingerprint type: {0}")]
    InvalidFingerprintType(String),

    /// A bit or count vector was built from a zero-length payload.
    #[error("fingerprint payload is empty")]
    EmptyPayload,

    /// The payload holds fewer bytes than `num_bits` requires.
    #[error("payload of {actual} bytes is too short for {num_bits} bits (need {required})")]
    InsufficientPayload {
        num_bits: usize,
        required: usize,
        actual: usize,
    },

    /// The bit count is zero.
    #[error("invalid bit count: {0}")]
    InvalidBitCount(usize),

    /// The radius violates the per-type rule.
    #[error("invalid radius {radius} for {fingerprint_type} fingerprint (expected {expected})")]
    InvalidRadius {
        fingerprint_type: String,
        radius: u32,
        expected: String,
    },

    /// MACCS keys must be exactly 166 bits.
    #[error("MACCS fingerprints must have exactly 166 bits, got {0}")]
    InvalidMaccsLength(usize),

    /// Dense vector dimension outside the supported range.
    #[error("dense vector dimension {dimension} outside [{min}, {max}]")]
    InvalidDimension {
        dimension: usize,
        min: usize,
        max: usize,
    },

    /// Dense fingerprints must name the model that produced them.
    #[error("dense fingerprint requires a model version")]
    MissingModelVersion,

    /// Bitwise operands differ in length.
    #[error("length mismatch: {left} vs {right} bytes")]
    LengthMismatch { left: usize, right: usize },

    /// A fingerprint required for the comparison is absent.
    #[error("fingerprint is absent: {0}")]
    NilFingerprint(String),

    /// The two fingerprints were produced by different algorithms.
    #[error("fingerprint type mismatch: {left} vs {right}")]
    TypeMismatch { left: String, right: String },

    /// The two fingerprints share a type but not an encoding.
    #[error("fingerprint encoding mismatch: {left} vs {right}")]
    EncodingMismatch { left: String, right: String },

    /// The two fingerprints have a different bit length or dimension.
    #[error("dimension mismatch: {left} vs {right}")]
    DimensionMismatch { left: usize, right: usize },

    /// A metric parameter must be finite and non-negative.
    #[error("parameter {name} must be finite and non-negative, got {value}")]
    NegativeParameter { name: &'static str, value: f64 },

    /// The metric is not defined for the fingerprint encoding.
    #[error("{metric} does not support {encoding} fingerprints")]
    EncodingUnsupported { metric: String, encoding: String },

    /// Fusion was given an empty score mapping.
    #[error("no scores to fuse")]
    EmptyScores,

    /// The metric name is not recognized.
    #[error("unsupported similarity metric: {0}")]
    UnsupportedMetric(String),

    /// A lifecycle transition is not allowed from the current state.
    #[error("cannot {action} a molecule in state {from}")]
    InvalidStateTransition { from: String, action: &'static str },

    /// Invalid input (bad arguments, out-of-range values)
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl ChemsimError {
    /// The taxonomy class this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ChemsimError::InvalidFingerprintType(_)
            | ChemsimError::TypeMismatch { .. }
            | ChemsimError::EncodingMismatch { .. }
            | ChemsimError::EncodingUnsupported { .. } => ErrorKind::TypeOrEncodingMismatch,
            ChemsimError::DimensionMismatch { .. } => ErrorKind::DimensionMismatch,
            ChemsimError::UnsupportedMetric(_) => ErrorKind::UnsupportedMetric,
            ChemsimError::EmptyScores => ErrorKind::EmptyScoreSet,
            ChemsimError::InvalidStateTransition { .. } => ErrorKind::InvalidState,
            ChemsimError::EmptyPayload
            | ChemsimError::InsufficientPayload { .. }
            | ChemsimError::InvalidBitCount(_)
            | ChemsimError::InvalidRadius { .. }
            | ChemsimError::InvalidMaccsLength(_)
            | ChemsimError::InvalidDimension { .. }
            | ChemsimError::MissingModelVersion
            | ChemsimError::LengthMismatch { .. }
            | ChemsimError::NilFingerprint(_)
            | ChemsimError::NegativeParameter { .. }
            | ChemsimError::InvalidInput(_) => ErrorKind::InvalidInput,
        }
    }
}

/// Convenience alias used throughout the chemsim workspace.
pub type Result<T> = std::result::Result<T, ChemsimError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_follow_taxonomy() {
        assert_eq!(ChemsimError::EmptyPayload.kind(), ErrorKind::InvalidInput);
        assert_eq!(
            ChemsimError::LengthMismatch { left: 1, right: 0 }.kind(),
            ErrorKind::InvalidInput
        );
        assert_eq!(
            ChemsimError::EncodingUnsupported {
                metric: "Dice".into(),
                encoding: "DenseVector".into(),
            }
            .kind(),
            ErrorKind::TypeOrEncodingMismatch
        );
        assert_eq!(
            ChemsimError::DimensionMismatch { left: 8, right: 16 }.kind(),
            ErrorKind::DimensionMismatch
        );
        assert_eq!(
            ChemsimError::UnsupportedMetric("jaccardish".into()).kind(),
            ErrorKind::UnsupportedMetric
        );
        assert_eq!(ChemsimError::EmptyScores.kind(), ErrorKind::EmptyScoreSet);
    }

    #[test]
    fn messages_name_the_problem() {
        let err = ChemsimError::InsufficientPayload {
            num_bits: 2048,
            required: 256,
            actual: 10,
        };
        assert_eq!(
            err.to_string(),
            "payload of 10 bytes is too short for 2048 bits (need 256)"
        );
        assert_eq!(
            ChemsimError::InvalidMaccsLength(167).to_string(),
            "MACCS fingerprints must have exactly 166 bits, got 167"
        );
    }
}
