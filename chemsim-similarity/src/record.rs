//! Structured record form of a fingerprint for storage and transport.
//!
//! A [`FingerprintRecord`] carries every field of a [`Fingerprint`] verbatim.
//! Converting back goes through the same constructors as fresh input, so a
//! record that was edited or corrupted in storage cannot produce a fingerprint
//! that breaks the construction rules. Payload bytes, float components, and
//! the original `computed_at` are preserved exactly.

use chemsim_core::{ChemsimError, Result};
use chrono::{DateTime, Utc};

use crate::fingerprint::{Fingerprint, FingerprintEncoding, FingerprintType};

/// Flat, serializable fingerprint representation.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FingerprintRecord {
    #[cfg_attr(feature = "serde", serde(rename = "type"))]
    pub fingerprint_type: FingerprintType,
    pub encoding: FingerprintEncoding,
    /// Packed payload for bit and count vectors.
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub bits: Option<Vec<u8>>,
    /// Components of a dense vector.
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub vector: Option<Vec<f32>>,
    pub num_bits: usize,
    pub radius: u32,
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub model_version: Option<String>,
    pub computed_at: DateTime<Utc>,
}

impl Fingerprint {
    /// Snapshot this fingerprint as a record.
    pub fn to_record(&self) -> FingerprintRecord {
        FingerprintRecord {
            fingerprint_type: self.fingerprint_type(),
            encoding: self.encoding(),
            bits: self.bytes().map(<[u8]>::to_vec),
            vector: self.vector().map(<[f32]>::to_vec),
            num_bits: self.num_bits(),
            radius: self.radius(),
            model_version: self.model_version().map(str::to_string),
            computed_at: self.computed_at(),
        }
    }
}

impl From<&Fingerprint> for FingerprintRecord {
    fn from(fp: &Fingerprint) -> Self {
        fp.to_record()
    }
}

impl TryFrom<FingerprintRecord> for Fingerprint {
    type Error = ChemsimError;

    fn try_from(record: FingerprintRecord) -> Result<Self> {
        let fp = match record.encoding {
            FingerprintEncoding::BitVector | FingerprintEncoding::CountVector => {
                if record.vector.is_some() {
                    return Err(ChemsimError::InvalidInput(
                        "packed fingerprint record carries a dense vector".into(),
                    ));
                }
                if record.model_version.is_some() {
                    return Err(ChemsimError::InvalidInput(
                        "packed fingerprint record carries a model version".into(),
                    ));
                }
                let bits = record.bits.as_deref().unwrap_or_default();
                if record.encoding == FingerprintEncoding::BitVector {
                    Fingerprint::bit_vector(
                        record.fingerprint_type,
                        bits,
                        record.num_bits,
                        record.radius,
                    )?
                } else {
                    Fingerprint::count_vector(
                        record.fingerprint_type,
                        bits,
                        record.num_bits,
                        record.radius,
                    )?
                }
            }
            FingerprintEncoding::DenseVector => {
                if record.fingerprint_type != FingerprintType::Gnn {
                    return Err(ChemsimError::InvalidFingerprintType(format!(
                        "{} cannot be stored as a {}",
                        record.fingerprint_type, record.encoding
                    )));
                }
                if record.bits.is_some() {
                    return Err(ChemsimError::InvalidInput(
                        "dense fingerprint record carries packed bits".into(),
                    ));
                }
                if record.radius != 0 {
                    return Err(ChemsimError::InvalidInput(format!(
                        "dense fingerprint record carries radius {}",
                        record.radius
                    )));
                }
                let vector = record.vector.as_deref().unwrap_or_default();
                if vector.len() != record.num_bits {
                    return Err(ChemsimError::InvalidInput(format!(
                        "record num_bits {} does not match vector length {}",
                        record.num_bits,
                        vector.len()
                    )));
                }
                let version = record.model_version.as_deref().unwrap_or_default();
                Fingerprint::dense(vector, version)?
            }
        };
        Ok(fp.with_computed_at(record.computed_at))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packed_record_restores_exactly() {
        let payload = [0xDE, 0xAD, 0xBE, 0xEF, 0x01];
        let fp = Fingerprint::bit_vector(FingerprintType::Morgan, &payload, 36, 2).unwrap();
        let record = fp.to_record();
        assert_eq!(record.bits.as_deref(), Some(payload.as_slice()));
        assert!(record.vector.is_none());
        let restored = Fingerprint::try_from(record).unwrap();
        assert_eq!(restored, fp);
        assert_eq!(restored.computed_at(), fp.computed_at());
    }

    #[test]
    fn dense_record_restores_exactly() {
        let values: Vec<f32> = (0..64).map(|i| (i as f32).sin() * 1e-3).collect();
        let fp = Fingerprint::dense(&values, "gnn-v3").unwrap();
        let restored = Fingerprint::try_from(FingerprintRecord::from(&fp)).unwrap();
        assert_eq!(restored.vector(), Some(values.as_slice()));
        assert_eq!(restored.model_version(), Some("gnn-v3"));
        assert_eq!(restored, fp);
    }

    #[test]
    fn invalid_records_are_revalidated() {
        let fp = Fingerprint::bit_vector(FingerprintType::Maccs, &[0u8; 21], 166, 0).unwrap();

        let mut record = fp.to_record();
        record.num_bits = 167;
        assert_eq!(
            Fingerprint::try_from(record).unwrap_err(),
            ChemsimError::InvalidMaccsLength(167)
        );

        let mut record = fp.to_record();
        record.bits = None;
        assert_eq!(
            Fingerprint::try_from(record).unwrap_err(),
            ChemsimError::EmptyPayload
        );

        let mut record = fp.to_record();
        record.encoding = FingerprintEncoding::DenseVector;
        assert!(matches!(
            Fingerprint::try_from(record).unwrap_err(),
            ChemsimError::InvalidFingerprintType(_)
        ));
    }

    #[test]
    fn dense_record_length_must_agree() {
        let fp = Fingerprint::dense(&[0.5; 32], "v1").unwrap();
        let mut record = fp.to_record();
        record.num_bits = 33;
        assert!(matches!(
            Fingerprint::try_from(record).unwrap_err(),
            ChemsimError::InvalidInput(_)
        ));

        let mut record = fp.to_record();
        record.model_version = None;
        assert_eq!(
            Fingerprint::try_from(record).unwrap_err(),
            ChemsimError::MissingModelVersion
        );
    }

    #[test]
    fn foreign_fields_are_rejected() {
        let packed = Fingerprint::bit_vector(FingerprintType::Morgan, &[0x0F], 8, 2).unwrap();
        let mut record = packed.to_record();
        record.model_version = Some("v1".into());
        assert!(matches!(
            Fingerprint::try_from(record).unwrap_err(),
            ChemsimError::InvalidInput(_)
        ));

        let dense = Fingerprint::dense(&[0.5; 32], "v1").unwrap();
        let mut record = dense.to_record();
        record.radius = 2;
        assert!(matches!(
            Fingerprint::try_from(record).unwrap_err(),
            ChemsimError::InvalidInput(_)
        ));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn json_round_trip() {
        let counts = [7, 0, 255, 3];
        let fp = Fingerprint::count_vector(FingerprintType::AtomPair, &counts, 32, 0).unwrap();
        let json = serde_json::to_string(&fp.to_record()).unwrap();
        assert!(json.contains("\"type\":\"AtomPair\""));
        assert!(json.contains("\"encoding\":\"CountVector\""));
        assert!(!json.contains("vector\":"));
        let record: FingerprintRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(Fingerprint::try_from(record).unwrap(), fp);

        let dense = Fingerprint::dense(&[0.1f32; 48], "v2").unwrap();
        let json = serde_json::to_string(&dense.to_record()).unwrap();
        assert!(json.contains("\"type\":\"GNN\""));
        let record: FingerprintRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(Fingerprint::try_from(record).unwrap(), dense);
    }
}
