//! Hash primitives used by keys, scripts and transactions

use bitcoin_hashes::{sha1, sha256d, Hash as BitcoinHash};
use ripemd::Ripemd160;
use sha2::{Digest, Sha256};

use crate::error::{ConsensusError, Result};
use crate::types::Hash;

/// 20-byte digest
pub type ShortHash = [u8; 20];

/// SHA256(x)
pub fn sha256(data: &[u8]) -> Hash {
    Sha256::digest(data).into()
}

/// SHA256(SHA256(x)), the transaction and block "hash"
pub fn sha256d(data: &[u8]) -> Hash {
    sha256d::Hash::hash(data).into_inner()
}

pub fn ripemd160(data: &[u8]) -> ShortHash {
    Ripemd160::digest(data).into()
}

pub fn sha1(data: &[u8]) -> ShortHash {
    sha1::Hash::hash(data).into_inner()
}

/// RIPEMD160(SHA256(x)), the key and script "short hash"
pub fn hash160(data: &[u8]) -> ShortHash {
    ripemd160(&sha256(data))
}

/// First four bytes of SHA256d(x).
pub fn bitcoin_checksum(data: &[u8]) -> [u8; 4] {
    let digest = sha256d(data);
    [digest[0], digest[1], digest[2], digest[3]]
}

/// Append a four byte checksum, as used by Base58Check payloads.
pub fn append_checksum(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len() + 4);
    out.extend_from_slice(data);
    out.extend_from_slice(&bitcoin_checksum(data));
    out
}

/// Verify and strip a trailing four byte checksum.
pub fn verify_checksum(data: &[u8]) -> Result<&[u8]> {
    if data.len() < 4 {
        return Err(ConsensusError::Serialization(
            "Checksummed payload shorter than checksum".into(),
        ));
    }
    let (payload, checksum) = data.split_at(data.len() - 4);
    if bitcoin_checksum(payload) != checksum {
        return Err(ConsensusError::Serialization("Checksum mismatch".into()));
    }
    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_empty() {
        assert_eq!(
            hex::encode(sha256(b"")),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_sha256d_empty() {
        assert_eq!(
            hex::encode(sha256d(b"")),
            "5df6e0e2761359d30a8275058e299fcc0381534545f55cf43e41983f5d4c9456"
        );
    }

    #[test]
    fn test_ripemd160_empty() {
        assert_eq!(
            hex::encode(ripemd160(b"")),
            "9c1185a5c5e9fc54612808977ee8f548b2258d31"
        );
    }

    #[test]
    fn test_sha1_abc() {
        assert_eq!(
            hex::encode(sha1(b"abc")),
            "a9993e364706816aba3e25717850c26c9cd0d89d"
        );
    }

    #[test]
    fn test_hash160_is_ripemd_of_sha256() {
        let data = b"script-consensus";
        assert_eq!(hash160(data), ripemd160(&sha256(data)));
    }

    #[test]
    fn test_checksum_roundtrip() {
        let payload = [0x00, 0x01, 0x02, 0x03];
        let checked = append_checksum(&payload);
        assert_eq!(checked.len(), 8);
        assert_eq!(verify_checksum(&checked).unwrap(), &payload);
    }

    #[test]
    fn test_checksum_mismatch() {
        let mut checked = append_checksum(b"payload");
        let last = checked.len() - 1;
        checked[last] ^= 0x01;
        assert!(verify_checksum(&checked).is_err());
        assert!(verify_checksum(&[0x00, 0x01]).is_err());
    }
}
