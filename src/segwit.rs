//! Segregated Witness (BIP141) transaction measures

use bitcoin_hashes::{sha256d, Hash as BitcoinHash, HashEngine};

use crate::constants::WITNESS_SCALE_FACTOR;
use crate::serialization::transaction::{
    serialize_transaction, serialize_transaction_with_witness, write_witness,
};
use crate::types::*;

/// True if any input carries witness data
pub fn is_segwit_transaction(tx: &Transaction) -> bool {
    tx.has_witness()
}

/// Weight(tx) = 3 × |Serialize(tx ∖ witness)| + |Serialize(tx)|
pub fn calculate_transaction_weight(tx: &Transaction) -> Natural {
    let base_size = serialize_transaction(tx).len() as Natural;
    let total_size = serialize_transaction_with_witness(tx).len() as Natural;
    base_size * (WITNESS_SCALE_FACTOR - 1) + total_size
}

/// vsize = ⌈Weight(tx) / 4⌉
pub fn calculate_virtual_size(tx: &Transaction) -> Natural {
    calculate_transaction_weight(tx).div_ceil(WITNESS_SCALE_FACTOR)
}

/// wtxid = SHA256d(Serialize(tx)); equals the txid when no witness is present
pub fn witness_transaction_hash(tx: &Transaction) -> Hash {
    let mut engine = sha256d::Hash::engine();
    engine.input(&serialize_transaction_with_witness(tx));
    sha256d::Hash::from_engine(engine).into_inner()
}

/// SHA256d over one input's serialized witness stack
pub fn hash_witness(witness: &[ByteString]) -> Hash {
    let mut serialized = Vec::new();
    write_witness(&mut serialized, witness);
    let mut engine = sha256d::Hash::engine();
    engine.input(&serialized);
    sha256d::Hash::from_engine(engine).into_inner()
}
