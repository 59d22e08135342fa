//! Core transaction types for script verification

use serde::{Deserialize, Serialize};

/// Hash type: 256-bit hash
pub type Hash = [u8; 32];

/// Byte string type
pub type ByteString = Vec<u8>;

/// Natural number type
pub type Natural = u64;

/// Witness: 𝒲 = 𝕊* (per-input stack of data items)
pub type Witness = Vec<ByteString>;

/// OutPoint: 𝒪 = ℍ × ℕ₃₂
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OutPoint {
    pub hash: Hash,
    pub index: u32,
}

impl OutPoint {
    /// The outpoint referenced by coinbase inputs.
    pub fn null() -> Self {
        OutPoint {
            hash: crate::constants::NULL_HASH,
            index: u32::MAX,
        }
    }

    pub fn is_null(&self) -> bool {
        self.hash == crate::constants::NULL_HASH && self.index == u32::MAX
    }
}

/// Transaction Input: ℐ = 𝒪 × 𝕊 × 𝒲 × ℕ₃₂
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionInput {
    pub prevout: OutPoint,
    pub script_sig: ByteString,
    #[serde(default)]
    pub witness: Witness,
    pub sequence: u32,
}

/// Transaction Output: 𝒯 = ℕ₆₄ × 𝕊
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionOutput {
    pub value: u64,
    pub script_pubkey: ByteString,
}

impl TransactionOutput {
    /// Output committed to by earlier slots of a SIGHASH_SINGLE digest.
    pub fn null() -> Self {
        TransactionOutput {
            value: u64::MAX,
            script_pubkey: Vec::new(),
        }
    }
}

/// Transaction: 𝒯𝒳 = ℕ₃₂ × ℐ* × 𝒯* × ℕ₃₂
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub version: u32,
    pub inputs: Vec<TransactionInput>,
    pub outputs: Vec<TransactionOutput>,
    pub lock_time: u32,
}

impl Transaction {
    /// True if any input carries witness data.
    pub fn has_witness(&self) -> bool {
        self.inputs.iter().any(|input| !input.witness.is_empty())
    }
}

/// Validation result
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationResult {
    Valid,
    Invalid(String),
}

/// The previous output an input spends, as needed by the interpreter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prevout {
    pub script_pubkey: ByteString,
    pub value: u64,
}
