//! Transaction-level checks and identifiers
//!
//! These belong to the calling context rather than the script engine: the
//! interpreter never rejects an input because of output values or size.

use std::collections::HashSet;

use crate::constants::*;
use crate::error::Result;
use crate::hash::sha256d;
use crate::serialization::transaction::serialize_transaction;
use crate::types::*;

/// CheckTransaction: 𝒯𝒳 → {valid, invalid}
///
/// A transaction tx = (v, ins, outs, lt) is valid if and only if:
/// 1. |ins| > 0 ∧ |outs| > 0
/// 2. ∀o ∈ outs: o.value ≤ M_max
/// 3. Σ o.value ≤ M_max
/// 4. |Serialize(tx ∖ witness)| ≤ M_max_tx_size
/// 5. no two inputs spend the same outpoint
/// 6. only a coinbase may reference the null outpoint
pub fn check_transaction(tx: &Transaction) -> Result<ValidationResult> {
    if tx.inputs.is_empty() || tx.outputs.is_empty() {
        return Ok(ValidationResult::Invalid("Empty inputs or outputs".to_string()));
    }

    let mut total = 0u64;
    for (i, output) in tx.outputs.iter().enumerate() {
        if output.value > MAX_MONEY {
            return Ok(ValidationResult::Invalid(format!(
                "Invalid output value {} at index {}",
                output.value, i
            )));
        }
        total += output.value;
        if total > MAX_MONEY {
            return Ok(ValidationResult::Invalid(format!(
                "Total output value {} exceeds maximum",
                total
            )));
        }
    }

    let tx_size = calculate_transaction_size(tx);
    if tx_size > MAX_TX_SIZE {
        return Ok(ValidationResult::Invalid(format!(
            "Transaction too large: {} bytes",
            tx_size
        )));
    }

    let mut seen = HashSet::with_capacity(tx.inputs.len());
    for input in &tx.inputs {
        if !seen.insert(&input.prevout) {
            return Ok(ValidationResult::Invalid("Duplicate input".to_string()));
        }
    }

    if !is_coinbase(tx) && tx.inputs.iter().any(|input| input.prevout.is_null()) {
        return Ok(ValidationResult::Invalid(
            "Null prevout in non-coinbase transaction".to_string(),
        ));
    }

    Ok(ValidationResult::Valid)
}

/// Check if transaction is coinbase
pub fn is_coinbase(tx: &Transaction) -> bool {
    tx.inputs.len() == 1 && tx.inputs[0].prevout.is_null()
}

/// Serialized size without witness data
pub fn calculate_transaction_size(tx: &Transaction) -> usize {
    serialize_transaction(tx).len()
}

/// txid = SHA256d(Serialize(tx ∖ witness)), in internal byte order
pub fn transaction_hash(tx: &Transaction) -> Hash {
    sha256d(&serialize_transaction(tx))
}

/// Sum of output values, or `None` on overflow.
pub fn total_output_value(tx: &Transaction) -> Option<u64> {
    tx.outputs
        .iter()
        .try_fold(0u64, |acc, output| acc.checked_add(output.value))
}
