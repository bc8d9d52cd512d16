//! Persisted form of a [CalibrationMatrix].
//!
//! A record is 28 bytes: the six coefficients `a, b, c, d, e, f` as little-endian IEEE-754
//! single precision floats, followed by a little-endian CRC-32 of those 24 bytes.

use core::fmt::{Display, Formatter};
use crate::matrix::CalibrationMatrix;

const COEFFICIENT_BYTES: usize = 24;

/// Size of a serialized calibration record.
pub const RECORD_BYTES: usize = COEFFICIENT_BYTES + 4;

/// A matrix that cannot be serialized.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RecordError {
    /// Degenerate or non-finite matrices are never persisted.
    Degenerate,
    Encode,
}

impl Display for RecordError {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Degenerate => write!(f, "refusing to store a degenerate calibration matrix"),
            Self::Encode => write!(f, "failed to encode calibration matrix"),
        }
    }
}

impl core::error::Error for RecordError {}

/// A stored record that cannot be trusted.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DataCorrupt {
    /// Fewer than [RECORD_BYTES] bytes were stored.
    Truncated(usize),
    /// More than [RECORD_BYTES] bytes were stored.
    Oversized(usize),
    Checksum { expected: u32, found: u32 },
    /// The checksum matched but the coefficients did not decode to finite numbers.
    Malformed,
    Degenerate,
}

impl Display for DataCorrupt {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Truncated(len) => write!(f, "calibration record truncated ({len} of {RECORD_BYTES} bytes)"),
            Self::Oversized(len) => write!(f, "calibration record too long ({len} bytes, expected {RECORD_BYTES})"),
            Self::Checksum { expected, found } => write!(
                f,
                "calibration record checksum mismatch (expected {expected:#010x}, found {found:#010x})"
            ),
            Self::Malformed => write!(f, "calibration record is malformed"),
            Self::Degenerate => write!(f, "stored calibration matrix is degenerate"),
        }
    }
}

impl core::error::Error for DataCorrupt {}

impl CalibrationMatrix {
    /// Encode the matrix as a checksummed record.
    pub fn serialize(&self) -> Result<[u8; RECORD_BYTES], RecordError> {
        if !self.is_finite() || self.is_degenerate() {
            return Err(RecordError::Degenerate);
        }

        let mut record = [0u8; RECORD_BYTES];
        let used = postcard::to_slice(self, &mut record[..COEFFICIENT_BYTES])
            .map_err(|_| RecordError::Encode)?
            .len();
        if used != COEFFICIENT_BYTES {
            return Err(RecordError::Encode);
        }

        let crc = crc32fast::hash(&record[..COEFFICIENT_BYTES]);
        record[COEFFICIENT_BYTES..].copy_from_slice(&crc.to_le_bytes());
        Ok(record)
    }

    /// Decode and validate a record produced by [CalibrationMatrix::serialize].
    ///
    /// The result is bit-identical to the matrix that was serialized.
    pub fn deserialize(record: &[u8]) -> Result<Self, DataCorrupt> {
        if record.len() < RECORD_BYTES {
            return Err(DataCorrupt::Truncated(record.len()));
        }
        if record.len() > RECORD_BYTES {
            return Err(DataCorrupt::Oversized(record.len()));
        }

        let (coefficients, crc) = record.split_at(COEFFICIENT_BYTES);
        let found = u32::from_le_bytes([crc[0], crc[1], crc[2], crc[3]]);
        let expected = crc32fast::hash(coefficients);
        if found != expected {
            return Err(DataCorrupt::Checksum { expected, found });
        }

        let matrix: Self = postcard::from_bytes(coefficients).map_err(|_| DataCorrupt::Malformed)?;
        if !matrix.is_finite() {
            return Err(DataCorrupt::Malformed);
        }
        if matrix.is_degenerate() {
            return Err(DataCorrupt::Degenerate);
        }

        Ok(matrix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: CalibrationMatrix = CalibrationMatrix::new(0.0652, -0.0011, -12.5, 0.0004, 0.0871, -19.25);

    fn forge(coefficients: [f32; 6]) -> [u8; RECORD_BYTES] {
        let mut record = [0u8; RECORD_BYTES];
        for (chunk, value) in record.chunks_exact_mut(4).zip(coefficients) {
            chunk.copy_from_slice(&value.to_le_bytes());
        }
        let crc = crc32fast::hash(&record[..COEFFICIENT_BYTES]);
        record[COEFFICIENT_BYTES..].copy_from_slice(&crc.to_le_bytes());
        record
    }

    #[test]
    fn layout_is_little_endian_floats_then_crc() {
        let record = SAMPLE.serialize().unwrap();
        assert_eq!(record, forge([SAMPLE.a, SAMPLE.b, SAMPLE.c, SAMPLE.d, SAMPLE.e, SAMPLE.f]));
    }

    #[test]
    fn restores_bit_identical_matrix() {
        let restored = CalibrationMatrix::deserialize(&SAMPLE.serialize().unwrap()).unwrap();
        let bits = |m: &CalibrationMatrix| [m.a, m.b, m.c, m.d, m.e, m.f].map(f32::to_bits);
        assert_eq!(bits(&restored), bits(&SAMPLE));
    }

    #[test]
    fn rejects_wrong_length() {
        let record = SAMPLE.serialize().unwrap();
        for len in 0..RECORD_BYTES {
            assert_eq!(CalibrationMatrix::deserialize(&record[..len]), Err(DataCorrupt::Truncated(len)));
        }

        let mut long = [0u8; RECORD_BYTES + 1];
        long[..RECORD_BYTES].copy_from_slice(&record);
        assert_eq!(CalibrationMatrix::deserialize(&long), Err(DataCorrupt::Oversized(RECORD_BYTES + 1)));
    }

    #[test]
    fn detects_flipped_bits() {
        let mut record = SAMPLE.serialize().unwrap();
        record[5] ^= 0x10;
        assert!(matches!(CalibrationMatrix::deserialize(&record), Err(DataCorrupt::Checksum { .. })));

        let mut record = SAMPLE.serialize().unwrap();
        record[RECORD_BYTES - 1] ^= 0x80;
        assert!(matches!(CalibrationMatrix::deserialize(&record), Err(DataCorrupt::Checksum { .. })));
    }

    #[test]
    fn degenerate_matrices_are_not_stored() {
        assert_eq!(CalibrationMatrix::new(0.0, 0.0, 1.0, 0.0, 0.0, 2.0).serialize(), Err(RecordError::Degenerate));
        assert_eq!(
            CalibrationMatrix::new(f32::INFINITY, 0.0, 0.0, 0.0, 1.0, 0.0).serialize(),
            Err(RecordError::Degenerate)
        );
    }

    #[test]
    fn degenerate_or_non_finite_records_are_rejected() {
        let record = forge([1.0, 2.0, 0.0, 2.0, 4.0, 0.0]);
        assert_eq!(CalibrationMatrix::deserialize(&record), Err(DataCorrupt::Degenerate));

        let record = forge([1.0, 0.0, f32::NAN, 0.0, 1.0, 0.0]);
        assert_eq!(CalibrationMatrix::deserialize(&record), Err(DataCorrupt::Malformed));
    }
}
