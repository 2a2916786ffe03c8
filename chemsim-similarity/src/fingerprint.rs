//! Molecular fingerprint values.
//!
//! A [`Fingerprint`] is an immutable encoding of molecular structure: a packed
//! bit vector, a packed count vector, or a dense float embedding. All
//! structural rules tying the algorithm ([`FingerprintType`]) to the encoding
//! and generation parameters are checked once by the constructors and never
//! re-checked afterwards.
//!
//! | Type             | Encodings                 | Bit length        | Radius |
//! |------------------|---------------------------|-------------------|--------|
//! | MACCS            | bit vector                | exactly 166       | 0      |
//! | Morgan, FCFP     | bit vector, count vector  | any positive      | 1..=6  |
//! | RDKit, AtomPair  | bit vector, count vector  | any positive      | 0      |
//! | GNN              | dense vector              | dimension 32..=4096 | n/a  |

use std::borrow::Cow;
use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;
use std::sync::Arc;

use chemsim_core::bitset;
use chemsim_core::hash::sha256_parts;
use chemsim_core::{ChemsimError, ContentAddressable, Result, Summarizable};
use chrono::{DateTime, Utc};

/// Number of MACCS structural keys.
pub const MACCS_BITS: usize = 166;

/// Smallest accepted dense vector dimension.
pub const MIN_DENSE_DIMENSION: usize = 32;

/// Largest accepted dense vector dimension.
pub const MAX_DENSE_DIMENSION: usize = 4096;

/// Radius range for circular (Morgan/FCFP) fingerprints.
pub const CIRCULAR_RADIUS: RangeInclusive<u32> = 1..=6;

/// How a fingerprint's features are stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FingerprintEncoding {
    /// One bit per structural feature, packed into bytes.
    BitVector,
    /// Feature counts, packed into bytes.
    CountVector,
    /// A sequence of 32-bit floats (learned embedding).
    DenseVector,
}

impl FingerprintEncoding {
    /// Canonical name of the encoding.
    pub fn as_str(self) -> &'static str {
        match self {
            FingerprintEncoding::BitVector => "BitVector",
            FingerprintEncoding::CountVector => "CountVector",
            FingerprintEncoding::DenseVector => "DenseVector",
        }
    }
}

impl fmt::Display for FingerprintEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The algorithm that produced a fingerprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FingerprintType {
    /// MACCS 166 structural keys.
    #[cfg_attr(feature = "serde", serde(rename = "MACCS"))]
    Maccs,
    /// Extended-connectivity circular fingerprint.
    Morgan,
    /// RDKit topological path fingerprint.
    #[cfg_attr(feature = "serde", serde(rename = "RDKit"))]
    Rdkit,
    /// Atom-pair fingerprint.
    AtomPair,
    /// Feature-class circular fingerprint.
    #[cfg_attr(feature = "serde", serde(rename = "FCFP"))]
    Fcfp,
    /// Graph neural network embedding.
    #[cfg_attr(feature = "serde", serde(rename = "GNN"))]
    Gnn,
}

impl FingerprintType {
    /// Every fingerprint type, in declaration order.
    pub const ALL: [FingerprintType; 6] = [
        FingerprintType::Maccs,
        FingerprintType::Morgan,
        FingerprintType::Rdkit,
        FingerprintType::AtomPair,
        FingerprintType::Fcfp,
        FingerprintType::Gnn,
    ];

    /// Canonical name of the type.
    pub fn as_str(self) -> &'static str {
        match self {
            FingerprintType::Maccs => "MACCS",
            FingerprintType::Morgan => "Morgan",
            FingerprintType::Rdkit => "RDKit",
            FingerprintType::AtomPair => "AtomPair",
            FingerprintType::Fcfp => "FCFP",
            FingerprintType::Gnn => "GNN",
        }
    }

    /// Encodings this algorithm may be stored in.
    pub fn allowed_encodings(self) -> &'static [FingerprintEncoding] {
        use FingerprintEncoding::*;
        match self {
            FingerprintType::Maccs => &[BitVector],
            FingerprintType::Morgan
            | FingerprintType::Fcfp
            | FingerprintType::Rdkit
            | FingerprintType::AtomPair => &[BitVector, CountVector],
            FingerprintType::Gnn => &[DenseVector],
        }
    }

    /// Whether `encoding` is valid for this algorithm.
    pub fn supports_encoding(self, encoding: FingerprintEncoding) -> bool {
        self.allowed_encodings().contains(&encoding)
    }

    /// Whether the algorithm is a circular (radius-parameterized) fingerprint.
    pub fn is_circular(self) -> bool {
        matches!(self, FingerprintType::Morgan | FingerprintType::Fcfp)
    }

    /// Accepted radius values for packed fingerprints of this type.
    pub fn radius_range(self) -> RangeInclusive<u32> {
        if self.is_circular() {
            CIRCULAR_RADIUS
        } else {
            0..=0
        }
    }
}

impl fmt::Display for FingerprintType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FingerprintType {
    type Err = ChemsimError;

    /// Parse a type name, case-insensitively (`"morgan"`, `"MACCS"`, `"gnn"`).
    fn from_str(s: &str) -> Result<Self> {
        FingerprintType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ChemsimError::InvalidFingerprintType(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Payload {
    Packed(Arc<[u8]>),
    Dense(Arc<[f32]>),
}

/// An immutable molecular fingerprint.
///
/// Cloning is cheap: the payload is reference counted and never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct Fingerprint {
    fingerprint_type: FingerprintType,
    encoding: FingerprintEncoding,
    payload: Payload,
    num_bits: usize,
    radius: u32,
    model_version: Option<String>,
    computed_at: DateTime<Utc>,
}

impl Fingerprint {
    /// Build a bit-vector fingerprint.
    ///
    /// `payload` is copied, so later changes to the caller's buffer cannot
    /// reach the fingerprint.
    ///
    /// # Errors
    ///
    /// - [`ChemsimError::InvalidFingerprintType`] for GNN (dense only)
    /// - [`ChemsimError::EmptyPayload`] for a zero-length payload
    /// - [`ChemsimError::InsufficientPayload`] if `payload` is shorter than `ceil(num_bits / 8)`
    /// - [`ChemsimError::InvalidBitCount`] if `num_bits` is zero
    /// - [`ChemsimError::InvalidRadius`] if the radius breaks the per-type rule
    /// - [`ChemsimError::InvalidMaccsLength`] for MACCS with `num_bits != 166`
    ///
    /// # Example
    ///
    /// ```
    /// use chemsim_similarity::{Fingerprint, FingerprintType};
    ///
    /// let fp = Fingerprint::bit_vector(FingerprintType::Morgan, &[0x0F], 8, 2).unwrap();
    /// assert!(fp.get_bit(0));
    /// assert!(!fp.get_bit(4));
    /// assert_eq!(fp.count_ones(), 4);
    /// ```
    pub fn bit_vector(
        fingerprint_type: FingerprintType,
        payload: &[u8],
        num_bits: usize,
        radius: u32,
    ) -> Result<Self> {
        Self::packed(
            fingerprint_type,
            FingerprintEncoding::BitVector,
            payload,
            num_bits,
            radius,
        )
    }

    /// Build a count-vector fingerprint.
    ///
    /// Validation matches [`Fingerprint::bit_vector`], except that MACCS is
    /// rejected with [`ChemsimError::InvalidFingerprintType`]: MACCS keys only
    /// exist as bits.
    pub fn count_vector(
        fingerprint_type: FingerprintType,
        payload: &[u8],
        num_bits: usize,
        radius: u32,
    ) -> Result<Self> {
        Self::packed(
            fingerprint_type,
            FingerprintEncoding::CountVector,
            payload,
            num_bits,
            radius,
        )
    }

    /// Build a dense (GNN embedding) fingerprint.
    ///
    /// # Errors
    ///
    /// - [`ChemsimError::InvalidDimension`] unless `32 <= vector.len() <= 4096`
    /// - [`ChemsimError::MissingModelVersion`] if `model_version` is blank
    /// - [`ChemsimError::InvalidInput`] if any component is NaN or infinite
    pub fn dense(vector: &[f32], model_version: &str) -> Result<Self> {
        let dimension = vector.len();
        if !(MIN_DENSE_DIMENSION..=MAX_DENSE_DIMENSION).contains(&dimension) {
            return Err(ChemsimError::InvalidDimension {
                dimension,
                min: MIN_DENSE_DIMENSION,
                max: MAX_DENSE_DIMENSION,
            });
        }
        if model_version.trim().is_empty() {
            return Err(ChemsimError::MissingModelVersion);
        }
        if let Some(pos) = vector.iter().position(|v| !v.is_finite()) {
            return Err(ChemsimError::InvalidInput(format!(
                "dense vector component {} is not finite",
                pos
            )));
        }
        Ok(Self {
            fingerprint_type: FingerprintType::Gnn,
            encoding: FingerprintEncoding::DenseVector,
            payload: Payload::Dense(Arc::from(vector)),
            num_bits: dimension,
            radius: 0,
            model_version: Some(model_version.to_string()),
            computed_at: Utc::now(),
        })
    }

    fn packed(
        fingerprint_type: FingerprintType,
        encoding: FingerprintEncoding,
        payload: &[u8],
        num_bits: usize,
        radius: u32,
    ) -> Result<Self> {
        if !fingerprint_type.supports_encoding(encoding) {
            return Err(ChemsimError::InvalidFingerprintType(format!(
                "{} cannot be stored as a {}",
                fingerprint_type, encoding
            )));
        }
        if payload.is_empty() {
            return Err(ChemsimError::EmptyPayload);
        }
        let required = bitset::bytes_for_bits(num_bits);
        if payload.len() < required {
            return Err(ChemsimError::InsufficientPayload {
                num_bits,
                required,
                actual: payload.len(),
            });
        }
        if num_bits == 0 {
            return Err(ChemsimError::InvalidBitCount(num_bits));
        }
        let allowed = fingerprint_type.radius_range();
        if !allowed.contains(&radius) {
            let expected = if allowed.start() == allowed.end() {
                allowed.start().to_string()
            } else {
                format!("{}..={}", allowed.start(), allowed.end())
            };
            return Err(ChemsimError::InvalidRadius {
                fingerprint_type: fingerprint_type.to_string(),
                radius,
                expected,
            });
        }
        if fingerprint_type == FingerprintType::Maccs && num_bits != MACCS_BITS {
            return Err(ChemsimError::InvalidMaccsLength(num_bits));
        }
        Ok(Self {
            fingerprint_type,
            encoding,
            payload: Payload::Packed(Arc::from(payload)),
            num_bits,
            radius,
            model_version: None,
            computed_at: Utc::now(),
        })
    }

    /// Replace the construction timestamp. Used when restoring a stored record.
    pub(crate) fn with_computed_at(mut self, computed_at: DateTime<Utc>) -> Self {
        self.computed_at = computed_at;
        self
    }

    /// The algorithm that produced the fingerprint.
    pub fn fingerprint_type(&self) -> FingerprintType {
        self.fingerprint_type
    }

    /// How the features are stored.
    pub fn encoding(&self) -> FingerprintEncoding {
        self.encoding
    }

    /// Bit count for packed fingerprints, dimension for dense ones.
    pub fn num_bits(&self) -> usize {
        self.num_bits
    }

    /// Circular neighborhood radius (0 when inapplicable).
    pub fn radius(&self) -> u32 {
        self.radius
    }

    /// The embedding model version. Always `Some` for dense fingerprints.
    pub fn model_version(&self) -> Option<&str> {
        self.model_version.as_deref()
    }

    /// When the fingerprint value was constructed.
    pub fn computed_at(&self) -> DateTime<Utc> {
        self.computed_at
    }

    /// Whether the fingerprint is a dense float vector.
    pub fn is_dense(&self) -> bool {
        matches!(self.payload, Payload::Dense(_))
    }

    /// The packed payload exactly as supplied, or `None` for dense fingerprints.
    pub fn bytes(&self) -> Option<&[u8]> {
        match &self.payload {
            Payload::Packed(bytes) => Some(&bytes[..]),
            Payload::Dense(_) => None,
        }
    }

    /// The dense vector, or `None` for packed fingerprints.
    pub fn vector(&self) -> Option<&[f32]> {
        match &self.payload {
            Payload::Packed(_) => None,
            Payload::Dense(values) => Some(&values[..]),
        }
    }

    /// The significant `ceil(num_bits / 8)` payload bytes with bits past
    /// `num_bits` cleared. Empty for dense fingerprints.
    pub fn feature_bytes(&self) -> Cow<'_, [u8]> {
        match &self.payload {
            Payload::Packed(bytes) => {
                let len = bitset::bytes_for_bits(self.num_bits);
                if self.num_bits % 8 == 0 {
                    Cow::Borrowed(&bytes[..len])
                } else {
                    Cow::Owned(bitset::truncate_bits(bytes, self.num_bits))
                }
            }
            Payload::Dense(_) => Cow::Borrowed(&[][..]),
        }
    }

    /// Read bit `pos` (least significant bit first within each byte).
    ///
    /// Positions at or past `num_bits`, and any position of a dense
    /// fingerprint, read as unset.
    pub fn get_bit(&self, pos: usize) -> bool {
        match &self.payload {
            Payload::Packed(bytes) if pos < self.num_bits => bitset::get_bit(bytes, pos),
            _ => false,
        }
    }

    /// Number of set bits within the first `num_bits` positions.
    ///
    /// For dense fingerprints, the number of non-zero components.
    pub fn count_ones(&self) -> usize {
        match &self.payload {
            Payload::Packed(_) => bitset::popcount(&self.feature_bytes()),
            Payload::Dense(values) => values.iter().filter(|v| **v != 0.0).count(),
        }
    }

    /// Expand to one `f64` per position: 0.0/1.0 for packed bits, the raw
    /// components for dense vectors.
    pub fn to_f64_vec(&self) -> Vec<f64> {
        match &self.payload {
            Payload::Packed(bytes) => (0..self.num_bits)
                .map(|i| if bitset::get_bit(bytes, i) { 1.0 } else { 0.0 })
                .collect(),
            Payload::Dense(values) => values.iter().map(|&v| f64::from(v)).collect(),
        }
    }
}

impl ContentAddressable for Fingerprint {
    /// Hash of everything except the timestamp, so a recomputation of the same
    /// structure hashes identically.
    fn content_hash(&self) -> String {
        let num_bits = (self.num_bits as u64).to_le_bytes();
        let radius = self.radius.to_le_bytes();
        let version = self.model_version.as_deref().unwrap_or("");
        let dense_bytes: Vec<u8>;
        let payload: &[u8] = match &self.payload {
            Payload::Packed(bytes) => &bytes[..],
            Payload::Dense(values) => {
                dense_bytes = values.iter().flat_map(|v| v.to_le_bytes()).collect();
                &dense_bytes
            }
        };
        sha256_parts([
            self.fingerprint_type.as_str().as_bytes(),
            self.encoding.as_str().as_bytes(),
            num_bits.as_slice(),
            radius.as_slice(),
            version.as_bytes(),
            payload,
        ])
    }
}

impl Summarizable for Fingerprint {
    fn summary(&self) -> String {
        match self.encoding {
            FingerprintEncoding::DenseVector => format!(
                "{} {}: {} dimensions, model {}",
                self.fingerprint_type,
                self.encoding,
                self.num_bits,
                self.model_version.as_deref().unwrap_or("?")
            ),
            _ => format!(
                "{} {}: {} bits, radius {}, {} set",
                self.fingerprint_type,
                self.encoding,
                self.num_bits,
                self.radius,
                self.count_ones()
            ),
        }
    }
}
