//! Tests for the public ScriptConsensus API

use script_consensus::commitment::{commit_amount, derive_generator, sum_commitments};
use script_consensus::segwit::*;
use script_consensus::transaction::*;
use script_consensus::*;

fn simple_tx() -> Transaction {
    Transaction {
        version: 1,
        inputs: vec![TransactionInput {
            prevout: OutPoint {
                hash: [1; 32],
                index: 0,
            },
            script_sig: vec![0x51],
            witness: vec![],
            sequence: 0xffffffff,
        }],
        outputs: vec![TransactionOutput {
            value: 1000,
            script_pubkey: vec![0x51],
        }],
        lock_time: 0,
    }
}

#[test]
fn test_script_consensus_default() {
    let consensus = ScriptConsensus::default();
    assert_eq!(consensus.config(), &EngineConfig::default());
    assert_eq!(consensus.rules(), ForkRules::ALL_RULES);
}

#[test]
fn test_with_config_from_json() {
    let config = EngineConfig::from_json(r#"{"default_rules": 1}"#).unwrap();
    let consensus = ScriptConsensus::with_config(config).unwrap();
    assert_eq!(consensus.rules(), ForkRules::BIP16);
    assert_eq!(consensus.config().limits, ScriptLimits::default());
}

#[test]
fn test_with_config_rejects_zero_limits() {
    let config = EngineConfig {
        limits: ScriptLimits {
            max_stack_size: 0,
            ..ScriptLimits::default()
        },
        ..EngineConfig::default()
    };
    assert!(matches!(
        ScriptConsensus::with_config(config),
        Err(ConsensusError::Configuration(_))
    ));
}

#[test]
fn test_validate_transaction() {
    let consensus = ScriptConsensus::new();
    let tx = simple_tx();
    assert_eq!(consensus.validate_transaction(&tx).unwrap(), ValidationResult::Valid);

    let mut over = tx.clone();
    over.outputs[0].value = MAX_MONEY + 1;
    assert!(matches!(
        consensus.validate_transaction(&over).unwrap(),
        ValidationResult::Invalid(_)
    ));
}

#[test]
fn test_verify_trivial_scripts() {
    let consensus = ScriptConsensus::new();
    let tx = simple_tx();
    let equal = Prevout {
        script_pubkey: vec![0x51, 0x87], // OP_1 OP_EQUAL
        value: 0,
    };
    assert_eq!(consensus.verify_input(&tx, 0, &equal, ForkRules::ALL_RULES), Ok(()));

    let unequal = Prevout {
        script_pubkey: vec![0x52, 0x87], // OP_2 OP_EQUAL
        value: 0,
    };
    assert_eq!(
        consensus.verify_input(&tx, 0, &unequal, ForkRules::ALL_RULES),
        Err(VerifyError::StackFalse)
    );
}

#[test]
fn test_tight_limits_from_config() {
    let consensus = ScriptConsensus::with_config(EngineConfig {
        limits: ScriptLimits {
            max_script_size: 1,
            ..ScriptLimits::default()
        },
        ..EngineConfig::default()
    })
    .unwrap();
    let tx = simple_tx();
    let prevout = Prevout {
        script_pubkey: vec![0x51, 0x87],
        value: 0,
    };
    assert_eq!(
        consensus.verify_input(&tx, 0, &prevout, ForkRules::ALL_RULES),
        Err(VerifyError::ResourceLimitExceeded(ResourceLimit::ScriptSize))
    );
}

#[test]
fn test_transaction_ids() {
    let mut tx = simple_tx();
    let txid = transaction_hash(&tx);
    assert_eq!(witness_transaction_hash(&tx), txid);
    assert!(!is_segwit_transaction(&tx));

    tx.inputs[0].witness = vec![vec![0xaa; 10]];
    assert_eq!(transaction_hash(&tx), txid);
    assert_ne!(witness_transaction_hash(&tx), txid);
    assert!(is_segwit_transaction(&tx));
}

#[test]
fn test_weight_and_virtual_size() {
    let mut tx = simple_tx();
    let base = calculate_transaction_size(&tx) as u64;
    assert_eq!(calculate_transaction_weight(&tx), base * 4);
    assert_eq!(calculate_virtual_size(&tx), base);

    // marker + flag + count + item length + item
    tx.inputs[0].witness = vec![vec![0xaa; 10]];
    assert_eq!(calculate_transaction_weight(&tx), base * 4 + 14);
    assert_eq!(calculate_virtual_size(&tx), base + 4);
}

#[test]
fn test_commitments_through_facade_curve() {
    let consensus = ScriptConsensus::new();
    let curve = consensus.curve();
    let h = derive_generator(b"facade").unwrap();
    let r1 = [0x21; 32];
    let r2 = [0x42; 32];
    let c1 = commit_amount(curve, &h, &r1, 40).unwrap();
    let c2 = commit_amount(curve, &h, &r2, 2).unwrap();
    let r = curve.add_scalars(&r1, &r2).unwrap();
    assert_eq!(
        sum_commitments(curve, &[c1, c2]).unwrap(),
        commit_amount(curve, &h, &r, 42).unwrap()
    );
}
