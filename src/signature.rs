//! ECDSA signing, verification, public key recovery and DER encoding

use secp256k1::ecdsa::{self, RecoveryId};
use secp256k1::Message;
use serde::{Deserialize, Serialize};

use crate::constants::CURVE_HALF_ORDER;
use crate::ec::{to_public_key, to_secret_key, Curve, EcCompressed, EcSecret};
use crate::error::{ConsensusError, Result};
use crate::types::Hash;

/// Compact signature: r ‖ s, each 32 bytes big-endian
pub type EcSignature = [u8; 64];

/// DER-encoded signature
pub type DerSignature = Vec<u8>;

/// Compact signature together with the id needed to recover its public key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecoverableSignature {
    #[serde(with = "compact_bytes")]
    pub signature: EcSignature,
    pub recovery_id: u8,
}

/// Sign `hash` with RFC6979 nonces. The result is always low-s.
pub fn sign(curve: &Curve, secret: &EcSecret, hash: &Hash) -> Result<EcSignature> {
    let key = to_secret_key(secret)?;
    let message = Message::from_digest(*hash);
    Ok(curve.context().sign_ecdsa(&message, &key).serialize_compact())
}

/// Verify `signature` over `hash` against a compressed or uncompressed point.
///
/// High-s signatures are normalized before verification.
pub fn verify_signature(curve: &Curve, point: &[u8], hash: &Hash, signature: &EcSignature) -> bool {
    let Ok(public) = to_public_key(point) else {
        return false;
    };
    let Ok(mut sig) = ecdsa::Signature::from_compact(signature) else {
        return false;
    };
    sig.normalize_s();
    let message = Message::from_digest(*hash);
    curve.context().verify_ecdsa(&message, &sig, &public).is_ok()
}

pub fn sign_recoverable(curve: &Curve, secret: &EcSecret, hash: &Hash) -> Result<RecoverableSignature> {
    let key = to_secret_key(secret)?;
    let message = Message::from_digest(*hash);
    let (id, signature) = curve
        .context()
        .sign_ecdsa_recoverable(&message, &key)
        .serialize_compact();
    Ok(RecoverableSignature {
        signature,
        recovery_id: id.to_i32() as u8,
    })
}

/// Recover the compressed public key that produced `recoverable` over `hash`.
pub fn recover_public(
    curve: &Curve,
    recoverable: &RecoverableSignature,
    hash: &Hash,
) -> Result<EcCompressed> {
    let id = RecoveryId::from_i32(i32::from(recoverable.recovery_id))
        .map_err(|_| ConsensusError::MalformedSignature("Recovery id out of range".into()))?;
    let sig = ecdsa::RecoverableSignature::from_compact(&recoverable.signature, id)
        .map_err(|_| ConsensusError::MalformedSignature("Invalid recoverable signature".into()))?;
    let message = Message::from_digest(*hash);
    let public = curve
        .context()
        .recover_ecdsa(&message, &sig)
        .map_err(|_| ConsensusError::InvalidFieldElement("Public key not recoverable".into()))?;
    Ok(public.serialize())
}

/// DER-encode a compact signature.
pub fn encode_signature(signature: &EcSignature) -> Result<DerSignature> {
    let sig = ecdsa::Signature::from_compact(signature)
        .map_err(|_| ConsensusError::MalformedSignature("Invalid compact signature".into()))?;
    Ok(sig.serialize_der().to_vec())
}

/// Decode a DER signature.
///
/// `strict` enforces canonical BIP66 encoding; otherwise the lax pre-BIP66
/// parser is used. Strict parsing does not reject high-s values, which are a
/// relay-policy concern; callers that want low-s check [`is_low_s`].
pub fn parse_signature(der: &[u8], strict: bool) -> Result<EcSignature> {
    let parsed = if strict {
        if !is_strict_der(der) {
            return Err(ConsensusError::MalformedSignature("Non-canonical DER".into()));
        }
        ecdsa::Signature::from_der(der)
    } else {
        ecdsa::Signature::from_der_lax(der)
    };
    parsed
        .map(|sig| sig.serialize_compact())
        .map_err(|_| ConsensusError::MalformedSignature("Invalid DER signature".into()))
}

/// BIP66 structural check of a DER signature (without sighash byte).
///
/// 0x30 [total-length] 0x02 [R-length] [R] 0x02 [S-length] [S]
pub fn is_strict_der(der: &[u8]) -> bool {
    if der.len() < 8 || der.len() > 72 {
        return false;
    }
    if der[0] != 0x30 || der[1] as usize != der.len() - 2 {
        return false;
    }

    let len_r = der[3] as usize;
    if 5 + len_r >= der.len() {
        return false;
    }
    let len_s = der[5 + len_r] as usize;
    if len_r + len_s + 6 != der.len() {
        return false;
    }

    if der[2] != 0x02 || len_r == 0 {
        return false;
    }
    // Negative or needlessly padded R
    if der[4] & 0x80 != 0 {
        return false;
    }
    if len_r > 1 && der[4] == 0x00 && der[5] & 0x80 == 0 {
        return false;
    }

    if der[len_r + 4] != 0x02 || len_s == 0 {
        return false;
    }
    if der[len_r + 6] & 0x80 != 0 {
        return false;
    }
    if len_s > 1 && der[len_r + 6] == 0x00 && der[len_r + 7] & 0x80 == 0 {
        return false;
    }
    true
}

/// s ≤ n/2
pub fn is_low_s(signature: &EcSignature) -> bool {
    signature[32..] <= CURVE_HALF_ORDER[..]
}

/// Replace s by n - s when s is high.
pub fn normalize_signature(signature: &EcSignature) -> Result<EcSignature> {
    let mut sig = ecdsa::Signature::from_compact(signature)
        .map_err(|_| ConsensusError::MalformedSignature("Invalid compact signature".into()))?;
    sig.normalize_s();
    Ok(sig.serialize_compact())
}

mod compact_bytes {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8; 64], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_bytes(bytes)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<[u8; 64], D::Error> {
        let bytes: Vec<u8> = Deserialize::deserialize(deserializer)?;
        bytes
            .try_into()
            .map_err(|_| D::Error::custom("expected 64 signature bytes"))
    }
}
