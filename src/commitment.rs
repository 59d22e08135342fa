//! Pedersen commitments over secp256k1
//!
//! C = r·H + a·G, where G is the curve generator and H is a second generator
//! whose discrete log with respect to G is unknown. Commitments are additively
//! homomorphic: C(r1, a1) + C(r2, a2) = C(r1 + r2, a1 + a2).

use log::trace;

use crate::ec::{verify_point, Curve, EcCompressed, EcSecret, EC_COMPRESSED_SIZE};
use crate::error::{ConsensusError, Result};
use crate::hash::sha256;

/// Derive a generator H from `seed` by hash-and-increment.
///
/// Candidates are 0x02 ‖ sha256(seed ‖ counter) for counter = 0, 1, ...; the
/// first one that is on the curve wins. Nobody knows log_G(H) for the result.
pub fn derive_generator(seed: &[u8]) -> Result<EcCompressed> {
    for counter in 0u32..=u32::from(u8::MAX) {
        let mut preimage = seed.to_vec();
        preimage.extend_from_slice(&counter.to_le_bytes());
        let mut candidate = [0u8; EC_COMPRESSED_SIZE];
        candidate[0] = 0x02;
        candidate[1..].copy_from_slice(&sha256(&preimage));
        if verify_point(&candidate) {
            trace!("generator found after {} candidates", counter + 1);
            return Ok(candidate);
        }
    }
    Err(ConsensusError::InvalidFieldElement(
        "No curve point found for generator seed".into(),
    ))
}

/// Commitment to the scalar `value` under blinding factor `blinding`.
pub fn commit(
    curve: &Curve,
    generator_h: &EcCompressed,
    blinding: &EcSecret,
    value: &EcSecret,
) -> Result<EcCompressed> {
    let blinded = curve.multiply_point(generator_h, blinding)?;
    if value.iter().all(|byte| *byte == 0) {
        return Ok(blinded);
    }
    let committed = curve.secret_to_public(value)?;
    curve.add_points(&blinded, &committed)
}

/// Commitment to an amount; the amount is encoded as a big-endian scalar.
pub fn commit_amount(
    curve: &Curve,
    generator_h: &EcCompressed,
    blinding: &EcSecret,
    amount: u64,
) -> Result<EcCompressed> {
    let mut value = [0u8; 32];
    value[24..].copy_from_slice(&amount.to_be_bytes());
    commit(curve, generator_h, blinding, &value)
}

/// Sum of commitments.
pub fn sum_commitments(curve: &Curve, commitments: &[EcCompressed]) -> Result<EcCompressed> {
    curve.sum_points(commitments)
}
