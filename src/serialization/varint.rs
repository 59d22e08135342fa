//! Bitcoin CompactSize (VarInt) encoding
//!
//! - value < 0xfd: single byte
//! - value <= 0xffff: 0xfd prefix + 2 bytes LE
//! - value <= 0xffffffff: 0xfe prefix + 4 bytes LE
//! - otherwise: 0xff prefix + 8 bytes LE
//!
//! Decoding rejects non-minimal encodings, as Bitcoin Core does.

use crate::error::{ConsensusError, Result};

/// Encode `value` as a CompactSize.
///
/// ```
/// use script_consensus::serialization::varint::encode_varint;
///
/// assert_eq!(encode_varint(252), vec![252]);
/// assert_eq!(encode_varint(253), vec![0xfd, 253, 0]);
/// assert_eq!(encode_varint(65536), vec![0xfe, 0, 0, 1, 0]);
/// ```
pub fn encode_varint(value: u64) -> Vec<u8> {
    let mut out = Vec::with_capacity(varint_size(value));
    write_varint(&mut out, value);
    out
}

/// Append the CompactSize encoding of `value` to `out`.
pub fn write_varint(out: &mut Vec<u8>, value: u64) {
    if value < 0xfd {
        out.push(value as u8);
    } else if value <= 0xffff {
        out.push(0xfd);
        out.extend_from_slice(&(value as u16).to_le_bytes());
    } else if value <= 0xffff_ffff {
        out.push(0xfe);
        out.extend_from_slice(&(value as u32).to_le_bytes());
    } else {
        out.push(0xff);
        out.extend_from_slice(&value.to_le_bytes());
    }
}

/// Number of bytes `value` occupies as a CompactSize.
pub fn varint_size(value: u64) -> usize {
    match value {
        0..=0xfc => 1,
        0xfd..=0xffff => 3,
        0x1_0000..=0xffff_ffff => 5,
        _ => 9,
    }
}

/// Decode a CompactSize, returning the value and the number of bytes consumed.
///
/// ```
/// use script_consensus::serialization::varint::decode_varint;
///
/// assert_eq!(decode_varint(&[0xfd, 253, 0]).unwrap(), (253, 3));
/// assert!(decode_varint(&[0xfd, 1, 0]).is_err());
/// assert!(decode_varint(&[]).is_err());
/// ```
pub fn decode_varint(data: &[u8]) -> Result<(u64, usize)> {
    let first = *data.first().ok_or_else(insufficient)?;
    let (value, size, minimum) = match first {
        0xfd => (read_le(data, 2)?, 3, 0xfd),
        0xfe => (read_le(data, 4)?, 5, 0x1_0000),
        0xff => (read_le(data, 8)?, 9, 0x1_0000_0000),
        b => return Ok((u64::from(b), 1)),
    };
    if value < minimum {
        return Err(ConsensusError::Serialization(
            "Non-canonical VarInt encoding".into(),
        ));
    }
    Ok((value, size))
}

fn read_le(data: &[u8], width: usize) -> Result<u64> {
    let bytes = data.get(1..1 + width).ok_or_else(insufficient)?;
    Ok(bytes
        .iter()
        .rev()
        .fold(0u64, |acc, byte| (acc << 8) | u64::from(*byte)))
}

fn insufficient() -> ConsensusError {
    ConsensusError::Serialization("Insufficient bytes to decode VarInt".into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boundaries() {
        for value in [0u64, 0xfc, 0xfd, 0xffff, 0x1_0000, 0xffff_ffff, 0x1_0000_0000, u64::MAX] {
            let encoded = encode_varint(value);
            assert_eq!(encoded.len(), varint_size(value));
            assert_eq!(decode_varint(&encoded).unwrap(), (value, encoded.len()));
        }
    }

    #[test]
    fn test_non_canonical_rejected() {
        assert!(decode_varint(&[0xfd, 0xfc, 0x00]).is_err());
        assert!(decode_varint(&[0xfe, 0xff, 0xff, 0x00, 0x00]).is_err());
        assert!(decode_varint(&[0xff, 0xff, 0xff, 0xff, 0xff, 0, 0, 0, 0]).is_err());
    }

    #[test]
    fn test_truncated_rejected() {
        assert!(decode_varint(&[0xfd, 0x00]).is_err());
        assert!(decode_varint(&[0xfe, 0x00, 0x00, 0x01]).is_err());
        assert!(decode_varint(&[0xff]).is_err());
    }

    #[test]
    fn test_trailing_bytes_ignored() {
        assert_eq!(decode_varint(&[0x05, 0xaa, 0xbb]).unwrap(), (5, 1));
    }
}
