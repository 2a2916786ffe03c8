//! Bit-set primitives over packed byte buffers.
//!
//! Fingerprint payloads are packed least-significant-bit first: bit `i` lives
//! in byte `i / 8` at position `i % 8`. The set-based similarity metrics are
//! all built from [`popcount`], [`bit_and`], and [`bit_or`].

use crate::{ChemsimError, Result};

/// Number of bytes needed to hold `num_bits` packed bits.
pub fn bytes_for_bits(num_bits: usize) -> usize {
    (num_bits + 7) / 8
}

/// Count the set bits in a byte buffer.
///
/// An empty buffer has zero set bits.
pub fn popcount(bytes: &[u8]) -> usize {
    let mut chunks = bytes.chunks_exact(8);
    let mut count = 0usize;
    for chunk in &mut chunks {
        let mut word = [0u8; 8];
        word.copy_from_slice(chunk);
        count += u64::from_le_bytes(word).count_ones() as usize;
    }
    count
        + chunks
            .remainder()
            .iter()
            .map(|b| b.count_ones() as usize)
            .sum::<usize>()
}

/// Byte-wise AND of two equal-length buffers into a new buffer.
///
/// # Errors
///
/// Returns [`ChemsimError::LengthMismatch`] if the buffers differ in length.
/// Two empty buffers are valid and produce an empty result.
pub fn bit_and(a: &[u8], b: &[u8]) -> Result<Vec<u8>> {
    check_lengths(a, b)?;
    Ok(a.iter().zip(b).map(|(x, y)| x & y).collect())
}

/// Byte-wise OR of two equal-length buffers into a new buffer.
///
/// # Errors
///
/// Returns [`ChemsimError::LengthMismatch`] if the buffers differ in length.
/// Two empty buffers are valid and produce an empty result.
pub fn bit_or(a: &[u8], b: &[u8]) -> Result<Vec<u8>> {
    check_lengths(a, b)?;
    Ok(a.iter().zip(b).map(|(x, y)| x | y).collect())
}

/// Popcount of `a & b` without materializing the intersection.
pub fn and_count(a: &[u8], b: &[u8]) -> Result<usize> {
    check_lengths(a, b)?;
    Ok(a.iter().zip(b).map(|(x, y)| (x & y).count_ones() as usize).sum())
}

/// Popcount of `a | b` without materializing the union.
pub fn or_count(a: &[u8], b: &[u8]) -> Result<usize> {
    check_lengths(a, b)?;
    Ok(a.iter().zip(b).map(|(x, y)| (x | y).count_ones() as usize).sum())
}

/// Read bit `pos` from a packed buffer. Positions past the end read as unset.
pub fn get_bit(bytes: &[u8], pos: usize) -> bool {
    bytes
        .get(pos / 8)
        .map_or(false, |byte| (byte >> (pos % 8)) & 1 == 1)
}

/// Copy the first `num_bits` bits of `bytes`, clearing everything after them.
///
/// The result is exactly `bytes_for_bits(num_bits)` long; missing input bytes
/// are zero-filled.
pub fn truncate_bits(bytes: &[u8], num_bits: usize) -> Vec<u8> {
    let len = bytes_for_bits(num_bits);
    let mut out = vec![0u8; len];
    let n = len.min(bytes.len());
    out[..n].copy_from_slice(&bytes[..n]);
    let tail = num_bits % 8;
    if tail != 0 {
        if let Some(last) = out.last_mut() {
            *last &= (1u8 << tail) - 1;
        }
    }
    out
}

fn check_lengths(a: &[u8], b: &[u8]) -> Result<()> {
    if a.len() != b.len() {
        return Err(ChemsimError::LengthMismatch {
            left: a.len(),
            right: b.len(),
        });
    }
    Ok(())
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn popcount_of_zeros_is_zero(n in 0usize..512) {
            prop_assert_eq!(popcount(&vec![0u8; n]), 0);
        }

        #[test]
        fn popcount_matches_bit_reads(bytes in proptest::collection::vec(any::<u8>(), 0..64)) {
            let by_bits = (0..bytes.len() * 8).filter(|&i| get_bit(&bytes, i)).count();
            prop_assert_eq!(popcount(&bytes), by_bits);
        }

        #[test]
        fn inclusion_exclusion(
            pair in (1usize..48).prop_flat_map(|n| (
                proptest::collection::vec(any::<u8>(), n),
                proptest::collection::vec(any::<u8>(), n),
            ))
        ) {
            let (a, b) = pair;
            let and = popcount(&bit_and(&a, &b).unwrap());
            let or = popcount(&bit_or(&a, &b).unwrap());
            prop_assert_eq!(and + or, popcount(&a) + popcount(&b));
            prop_assert_eq!(and, and_count(&a, &b).unwrap());
            prop_assert_eq!(or, or_count(&a, &b).unwrap());
        }
    }
}
