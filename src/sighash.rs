//! Signature hashing for legacy and witness v0 inputs
//!
//! The digest a signature commits to depends on the sighash flag carried in
//! the endorsement's last byte and on whether the input is evaluated under
//! the original serialization or BIP143.

use log::trace;
use serde::{Deserialize, Serialize};

use crate::constants::ONE_HASH;
use crate::ec::{Curve, EcSecret};
use crate::error::{ConsensusError, Result};
use crate::hash::sha256d;
use crate::script::strip_code_separators;
use crate::serialization::transaction::{
    serialize_outpoint, serialize_output, serialize_transaction, write_var_bytes,
};
use crate::signature::{encode_signature, sign};
use crate::types::*;

pub const SIGHASH_ALL: u8 = 0x01;
pub const SIGHASH_NONE: u8 = 0x02;
pub const SIGHASH_SINGLE: u8 = 0x03;
pub const SIGHASH_ANYONECANPAY: u8 = 0x80;

const SIGHASH_BASE_MASK: u8 = 0x1f;

/// Outputs a signature commits to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SighashBase {
    All,
    None,
    Single,
}

/// A sighash flag byte. Any byte is accepted; unknown base types behave as ALL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SighashType(u8);

impl SighashType {
    pub const ALL: SighashType = SighashType(SIGHASH_ALL);
    pub const NONE: SighashType = SighashType(SIGHASH_NONE);
    pub const SINGLE: SighashType = SighashType(SIGHASH_SINGLE);

    pub const fn from_u8(flag: u8) -> Self {
        SighashType(flag)
    }

    pub const fn to_u8(self) -> u8 {
        self.0
    }

    pub fn base(self) -> SighashBase {
        match self.0 & SIGHASH_BASE_MASK {
            SIGHASH_NONE => SighashBase::None,
            SIGHASH_SINGLE => SighashBase::Single,
            _ => SighashBase::All,
        }
    }

    pub fn anyone_can_pay(self) -> bool {
        self.0 & SIGHASH_ANYONECANPAY != 0
    }

    pub fn with_anyone_can_pay(self) -> Self {
        SighashType(self.0 | SIGHASH_ANYONECANPAY)
    }
}

impl From<u8> for SighashType {
    fn from(flag: u8) -> Self {
        SighashType(flag)
    }
}

/// Serialization a signature hash is computed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScriptVersion {
    /// Bare scripts, P2SH, and witness programs evaluated without BIP143.
    Unversioned,
    /// Witness version 0 (BIP143).
    Zero,
}

/// Copy of `tx` reduced to what a legacy signature with `flag` commits to.
///
/// - every unlocking script is blanked and the signed input's is replaced by
///   `script_code` without its OP_CODESEPARATORs; witnesses are dropped
/// - NONE removes all outputs; SINGLE keeps outputs up to `index`, nulling
///   the earlier ones; both zero the other inputs' sequence numbers
/// - ANYONECANPAY keeps only the signed input
///
/// SINGLE without an output at `index` leaves every kept output nulled; the
/// legacy digest never reaches that case.
pub fn transient_for(
    tx: &Transaction,
    index: usize,
    script_code: &[u8],
    flag: SighashType,
) -> Result<Transaction> {
    if index >= tx.inputs.len() {
        return Err(ConsensusError::IndexOutOfRange(index));
    }

    let script_code = strip_code_separators(script_code);
    let base = flag.base();

    let mut inputs: Vec<TransactionInput> = tx
        .inputs
        .iter()
        .enumerate()
        .map(|(i, input)| {
            let signed = i == index;
            TransactionInput {
                prevout: input.prevout.clone(),
                script_sig: if signed { script_code.clone() } else { Vec::new() },
                witness: Vec::new(),
                sequence: if signed || base == SighashBase::All {
                    input.sequence
                } else {
                    0
                },
            }
        })
        .collect();

    if flag.anyone_can_pay() {
        inputs = vec![inputs.swap_remove(index)];
    }

    let outputs = match base {
        SighashBase::All => tx.outputs.clone(),
        SighashBase::None => Vec::new(),
        SighashBase::Single => {
            let keep = (index + 1).min(tx.outputs.len());
            tx.outputs[..keep]
                .iter()
                .enumerate()
                .map(|(i, output)| {
                    if i == index {
                        output.clone()
                    } else {
                        TransactionOutput::null()
                    }
                })
                .collect()
        }
    };

    Ok(Transaction {
        version: tx.version,
        inputs,
        outputs,
        lock_time: tx.lock_time,
    })
}

/// Original signature hash.
///
/// SIGHASH_SINGLE on an input without a corresponding output signs the
/// constant `0x01 00..00` rather than failing.
pub fn legacy_signature_hash(
    tx: &Transaction,
    index: usize,
    script_code: &[u8],
    flag: SighashType,
) -> Result<Hash> {
    if index >= tx.inputs.len() {
        return Err(ConsensusError::IndexOutOfRange(index));
    }
    if flag.base() == SighashBase::Single && index >= tx.outputs.len() {
        trace!("SIGHASH_SINGLE input {} has no matching output", index);
        return Ok(ONE_HASH);
    }

    let transient = transient_for(tx, index, script_code, flag)?;
    let mut preimage = serialize_transaction(&transient);
    preimage.extend_from_slice(&u32::from(flag.to_u8()).to_le_bytes());
    Ok(sha256d(&preimage))
}

/// BIP143 signature hash.
pub fn witness_v0_signature_hash(
    tx: &Transaction,
    index: usize,
    script_code: &[u8],
    amount: u64,
    flag: SighashType,
) -> Result<Hash> {
    let input = tx
        .inputs
        .get(index)
        .ok_or(ConsensusError::IndexOutOfRange(index))?;
    let base = flag.base();
    let anyone_can_pay = flag.anyone_can_pay();

    let hash_prevouts = if anyone_can_pay {
        [0u8; 32]
    } else {
        let mut buf = Vec::with_capacity(tx.inputs.len() * 36);
        for input in &tx.inputs {
            serialize_outpoint(&mut buf, &input.prevout);
        }
        sha256d(&buf)
    };

    let hash_sequence = if anyone_can_pay || base != SighashBase::All {
        [0u8; 32]
    } else {
        let buf: Vec<u8> = tx
            .inputs
            .iter()
            .flat_map(|input| input.sequence.to_le_bytes())
            .collect();
        sha256d(&buf)
    };

    let hash_outputs = match base {
        SighashBase::All => {
            let mut buf = Vec::new();
            for output in &tx.outputs {
                serialize_output(&mut buf, output);
            }
            sha256d(&buf)
        }
        SighashBase::Single if index < tx.outputs.len() => {
            let mut buf = Vec::new();
            serialize_output(&mut buf, &tx.outputs[index]);
            sha256d(&buf)
        }
        _ => [0u8; 32],
    };

    let mut preimage = Vec::with_capacity(156 + script_code.len());
    preimage.extend_from_slice(&tx.version.to_le_bytes());
    preimage.extend_from_slice(&hash_prevouts);
    preimage.extend_from_slice(&hash_sequence);
    serialize_outpoint(&mut preimage, &input.prevout);
    write_var_bytes(&mut preimage, script_code);
    preimage.extend_from_slice(&amount.to_le_bytes());
    preimage.extend_from_slice(&input.sequence.to_le_bytes());
    preimage.extend_from_slice(&hash_outputs);
    preimage.extend_from_slice(&tx.lock_time.to_le_bytes());
    preimage.extend_from_slice(&u32::from(flag.to_u8()).to_le_bytes());
    Ok(sha256d(&preimage))
}

/// Signature hash for `version`. `amount` is only committed to by witness v0.
pub fn signature_hash(
    tx: &Transaction,
    index: usize,
    script_code: &[u8],
    amount: u64,
    flag: SighashType,
    version: ScriptVersion,
) -> Result<Hash> {
    match version {
        ScriptVersion::Unversioned => legacy_signature_hash(tx, index, script_code, flag),
        ScriptVersion::Zero => witness_v0_signature_hash(tx, index, script_code, amount, flag),
    }
}

/// Sign input `index` and return the endorsement: DER signature ‖ flag.
#[allow(clippy::too_many_arguments)]
pub fn create_endorsement(
    curve: &Curve,
    secret: &EcSecret,
    tx: &Transaction,
    index: usize,
    script_code: &[u8],
    flag: SighashType,
    version: ScriptVersion,
    amount: u64,
) -> Result<ByteString> {
    let hash = signature_hash(tx, index, script_code, amount, flag, version)?;
    let mut endorsement = encode_signature(&sign(curve, secret, &hash)?)?;
    endorsement.push(flag.to_u8());
    Ok(endorsement)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::opcodes::{OP_CODESEPARATOR, OP_DUP};

    fn input(tag: u8, sequence: u32) -> TransactionInput {
        TransactionInput {
            prevout: OutPoint {
                hash: [tag; 32],
                index: u32::from(tag),
            },
            script_sig: vec![0x51, tag],
            witness: vec![vec![tag]],
            sequence,
        }
    }

    fn output(value: u64) -> TransactionOutput {
        TransactionOutput {
            value,
            script_pubkey: vec![0x51],
        }
    }

    fn sample() -> Transaction {
        Transaction {
            version: 1,
            inputs: vec![input(1, 10), input(2, 20), input(3, 30)],
            outputs: vec![output(100), output(200)],
            lock_time: 0,
        }
    }

    #[test]
    fn test_sighash_type_decomposition() {
        assert_eq!(SighashType::from_u8(0x82).base(), SighashBase::None);
        assert!(SighashType::from_u8(0x82).anyone_can_pay());
        assert_eq!(SighashType::from_u8(0x00).base(), SighashBase::All);
        assert_eq!(SighashType::from_u8(0x43).base(), SighashBase::Single);
        assert_eq!(SighashType::SINGLE.with_anyone_can_pay().to_u8(), 0x83);
    }

    #[test]
    fn test_transient_all() {
        let tx = sample();
        let code = vec![OP_CODESEPARATOR, OP_DUP];
        let transient = transient_for(&tx, 1, &code, SighashType::ALL).unwrap();
        assert_eq!(transient.inputs.len(), 3);
        assert!(transient.inputs[0].script_sig.is_empty());
        assert_eq!(transient.inputs[1].script_sig, vec![OP_DUP]);
        assert!(transient.inputs.iter().all(|i| i.witness.is_empty()));
        assert_eq!(transient.inputs[2].sequence, 30);
        assert_eq!(transient.outputs, tx.outputs);
        // The caller's transaction is untouched
        assert_eq!(tx, sample());
    }

    #[test]
    fn test_transient_none() {
        let transient = transient_for(&sample(), 0, &[], SighashType::NONE).unwrap();
        assert!(transient.outputs.is_empty());
        assert_eq!(transient.inputs[0].sequence, 10);
        assert_eq!(transient.inputs[1].sequence, 0);
        assert_eq!(transient.inputs[2].sequence, 0);
    }

    #[test]
    fn test_transient_single() {
        let transient = transient_for(&sample(), 1, &[], SighashType::SINGLE).unwrap();
        assert_eq!(transient.outputs, vec![TransactionOutput::null(), output(200)]);
        assert_eq!(transient.inputs[0].sequence, 0);
        assert_eq!(transient.inputs[1].sequence, 20);
    }

    #[test]
    fn test_transient_anyone_can_pay() {
        let flag = SighashType::ALL.with_anyone_can_pay();
        let transient = transient_for(&sample(), 2, &[OP_DUP], flag).unwrap();
        assert_eq!(transient.inputs.len(), 1);
        assert_eq!(transient.inputs[0].prevout, sample().inputs[2].prevout);
        assert_eq!(transient.inputs[0].script_sig, vec![OP_DUP]);
    }

    #[test]
    fn test_single_without_output_is_one_hash() {
        let hash = legacy_signature_hash(&sample(), 2, &[], SighashType::SINGLE).unwrap();
        assert_eq!(hash, ONE_HASH);
        let hash = legacy_signature_hash(&sample(), 1, &[], SighashType::SINGLE).unwrap();
        assert_ne!(hash, ONE_HASH);
    }

    #[test]
    fn test_index_out_of_range() {
        for version in [ScriptVersion::Unversioned, ScriptVersion::Zero] {
            assert_eq!(
                signature_hash(&sample(), 3, &[], 0, SighashType::ALL, version),
                Err(ConsensusError::IndexOutOfRange(3))
            );
        }
    }

    #[test]
    fn test_legacy_ignores_witness_and_other_scripts() {
        let tx = sample();
        let hash = legacy_signature_hash(&tx, 0, &[OP_DUP], SighashType::ALL).unwrap();
        let mut altered = tx.clone();
        altered.inputs[1].script_sig = vec![0x00; 10];
        altered.inputs[1].witness.clear();
        assert_eq!(
            legacy_signature_hash(&altered, 0, &[OP_DUP], SighashType::ALL).unwrap(),
            hash
        );
        altered.outputs[0].value = 101;
        assert_ne!(
            legacy_signature_hash(&altered, 0, &[OP_DUP], SighashType::ALL).unwrap(),
            hash
        );
    }

    #[test]
    fn test_witness_commits_to_amount() {
        let tx = sample();
        let a = witness_v0_signature_hash(&tx, 0, &[OP_DUP], 1000, SighashType::ALL).unwrap();
        let b = witness_v0_signature_hash(&tx, 0, &[OP_DUP], 1001, SighashType::ALL).unwrap();
        assert_ne!(a, b);
        let legacy = legacy_signature_hash(&tx, 0, &[OP_DUP], SighashType::ALL).unwrap();
        assert_ne!(a, legacy);
    }

    #[test]
    fn test_witness_keeps_code_separators() {
        let tx = sample();
        let with = witness_v0_signature_hash(&tx, 0, &[OP_CODESEPARATOR, OP_DUP], 1, SighashType::ALL)
            .unwrap();
        let without = witness_v0_signature_hash(&tx, 0, &[OP_DUP], 1, SighashType::ALL).unwrap();
        assert_ne!(with, without);

        let legacy_with =
            legacy_signature_hash(&tx, 0, &[OP_CODESEPARATOR, OP_DUP], SighashType::ALL).unwrap();
        let legacy_without = legacy_signature_hash(&tx, 0, &[OP_DUP], SighashType::ALL).unwrap();
        assert_eq!(legacy_with, legacy_without);
    }

    #[test]
    fn test_witness_anyone_can_pay_ignores_other_inputs() {
        let flag = SighashType::ALL.with_anyone_can_pay();
        let tx = sample();
        let hash = witness_v0_signature_hash(&tx, 0, &[], 5, flag).unwrap();
        let mut extended = tx.clone();
        extended.inputs.push(input(9, 90));
        assert_eq!(witness_v0_signature_hash(&extended, 0, &[], 5, flag).unwrap(), hash);
    }

    #[test]
    fn test_endorsement_ends_with_flag() {
        let curve = Curve::new();
        let mut secret = [0u8; 32];
        secret[31] = 7;
        let endorsement = create_endorsement(
            &curve,
            &secret,
            &sample(),
            0,
            &[OP_DUP],
            SighashType::from_u8(0x82),
            ScriptVersion::Unversioned,
            0,
        )
        .unwrap();
        assert_eq!(endorsement[0], 0x30);
        assert_eq!(*endorsement.last().unwrap(), 0x82);
    }
}
