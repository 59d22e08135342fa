//! Signature hash vectors and flag semantics

use anyhow::Result;
use script_consensus::hash::sha256d;
use script_consensus::serialization::transaction::{deserialize_transaction, serialize_transaction};
use script_consensus::sighash::*;
use script_consensus::types::*;
use script_consensus::ONE_HASH;

fn decode(hex_str: &str) -> Vec<u8> {
    hex::decode(hex_str).unwrap()
}

// BIP143 native P2WPKH example
const BIP143_UNSIGNED_TX: &str = "0100000002fff7f7881a8099afa6940d42d1e7f6362bec38171ea3edf433541db4e4ad969f0000000000eeffffffef51e1b804cc89d182d279655c3aa89e815b1b309fe287d9b2b55d57b90ec68a0100000000ffffffff02202cb206000000001976a9148280b37df378db99f66f85c95a783a76ac7a6d5988ac9093510d000000001976a9143bde42dbee7e4dbe6a21b2d50ce2f0167faa815988ac11000000";

#[test]
fn test_bip143_native_p2wpkh_vector() -> Result<()> {
    let tx = deserialize_transaction(&decode(BIP143_UNSIGNED_TX))?;
    assert_eq!(tx.inputs.len(), 2);
    assert_eq!(tx.lock_time, 0x11);

    let script_code = decode("76a9141d0f172a0ecb48aee1be1f2687d2963ae33f71a188ac");
    let hash = witness_v0_signature_hash(&tx, 1, &script_code, 600_000_000, SighashType::ALL)?;
    assert_eq!(
        hex::encode(hash),
        "c37af31116d1b27caf68aae9e3ac82f1477929014d5b917657d0eb49478cb670"
    );
    Ok(())
}

fn sample_tx() -> Transaction {
    let input = |tag: u8| TransactionInput {
        prevout: OutPoint {
            hash: [tag; 32],
            index: u32::from(tag),
        },
        script_sig: vec![0x51, tag],
        witness: vec![vec![tag; 3]],
        sequence: 0xffff_fff0 + u32::from(tag),
    };
    let output = |value: u64| TransactionOutput {
        value,
        script_pubkey: vec![0x76, 0xa9],
    };
    Transaction {
        version: 1,
        inputs: vec![input(1), input(2), input(3)],
        outputs: vec![output(10), output(20)],
        lock_time: 99,
    }
}

#[test]
fn test_legacy_all_matches_manual_preimage() -> Result<()> {
    let tx = sample_tx();
    let script_code = vec![0x51, 0xac];

    let mut manual = tx.clone();
    for (i, input) in manual.inputs.iter_mut().enumerate() {
        input.witness.clear();
        input.script_sig = if i == 1 { script_code.clone() } else { vec![] };
    }
    let mut preimage = serialize_transaction(&manual);
    preimage.extend_from_slice(&1u32.to_le_bytes());

    assert_eq!(
        legacy_signature_hash(&tx, 1, &script_code, SighashType::ALL)?,
        sha256d(&preimage)
    );
    Ok(())
}

#[test]
fn test_transient_copy_leaves_caller_untouched() -> Result<()> {
    let tx = sample_tx();
    let before = tx.clone();
    let transient = transient_for(&tx, 0, &[0x51], SighashType::NONE.with_anyone_can_pay())?;
    assert_eq!(tx, before);
    assert_eq!(transient.inputs.len(), 1);
    assert!(transient.outputs.is_empty());
    Ok(())
}

#[test]
fn test_signature_hash_deterministic() -> Result<()> {
    let tx = sample_tx();
    for version in [ScriptVersion::Unversioned, ScriptVersion::Zero] {
        for flag in [0x01u8, 0x02, 0x03, 0x81, 0x82, 0x83] {
            let flag = SighashType::from_u8(flag);
            let first = signature_hash(&tx, 2, &[0xac], 5_000, flag, version)?;
            let second = signature_hash(&tx, 2, &[0xac], 5_000, flag, version)?;
            assert_eq!(first, second);
        }
    }
    Ok(())
}

#[test]
fn test_flags_produce_distinct_digests() -> Result<()> {
    let tx = sample_tx();
    let all = legacy_signature_hash(&tx, 0, &[0xac], SighashType::ALL)?;
    let none = legacy_signature_hash(&tx, 0, &[0xac], SighashType::NONE)?;
    let single = legacy_signature_hash(&tx, 0, &[0xac], SighashType::SINGLE)?;
    assert_ne!(all, none);
    assert_ne!(all, single);
    assert_ne!(none, single);
    Ok(())
}

#[test]
fn test_single_fallback_only_in_legacy() -> Result<()> {
    let tx = sample_tx();
    assert_eq!(
        legacy_signature_hash(&tx, 2, &[0xac], SighashType::SINGLE)?,
        ONE_HASH
    );
    assert_ne!(
        witness_v0_signature_hash(&tx, 2, &[0xac], 0, SighashType::SINGLE)?,
        ONE_HASH
    );
    Ok(())
}

#[test]
fn test_witness_digest_commits_to_amount_and_script_code() -> Result<()> {
    let tx = sample_tx();
    let base = witness_v0_signature_hash(&tx, 0, &[0xac], 1_000, SighashType::ALL)?;
    assert_ne!(
        base,
        witness_v0_signature_hash(&tx, 0, &[0xac], 1_001, SighashType::ALL)?
    );
    assert_ne!(
        base,
        witness_v0_signature_hash(&tx, 0, &[0xab, 0xac], 1_000, SighashType::ALL)?
    );
    // Legacy digest ignores the amount
    assert_eq!(
        signature_hash(&tx, 0, &[0xac], 1, SighashType::ALL, ScriptVersion::Unversioned)?,
        signature_hash(&tx, 0, &[0xac], 2, SighashType::ALL, ScriptVersion::Unversioned)?
    );
    Ok(())
}

#[test]
fn test_legacy_strips_code_separators() -> Result<()> {
    let tx = sample_tx();
    assert_eq!(
        legacy_signature_hash(&tx, 0, &[0xab, 0xac], SighashType::ALL)?,
        legacy_signature_hash(&tx, 0, &[0xac], SighashType::ALL)?
    );
    Ok(())
}

#[test]
fn test_index_out_of_range() {
    let tx = sample_tx();
    assert!(legacy_signature_hash(&tx, 3, &[], SighashType::ALL).is_err());
    assert!(witness_v0_signature_hash(&tx, 3, &[], 0, SighashType::ALL).is_err());
}
