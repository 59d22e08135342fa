//! Transaction serialization and deserialization
//!
//! Legacy form:  version ‖ inputs ‖ outputs ‖ lock_time
//! Witness form: version ‖ 0x00 ‖ 0x01 ‖ inputs ‖ outputs ‖ witnesses ‖ lock_time

use super::varint::{decode_varint, write_varint};
use crate::error::{ConsensusError, Result};
use crate::types::*;

const WITNESS_MARKER: u8 = 0x00;
const WITNESS_FLAG: u8 = 0x01;

/// Serialize without witness data. This is the form hashed for the txid.
pub fn serialize_transaction(tx: &Transaction) -> Vec<u8> {
    let mut out = Vec::with_capacity(estimate_size(tx));
    out.extend_from_slice(&tx.version.to_le_bytes());
    write_inputs(&mut out, &tx.inputs);
    write_outputs(&mut out, &tx.outputs);
    out.extend_from_slice(&tx.lock_time.to_le_bytes());
    out
}

/// Serialize in witness form when any input carries witness data, legacy form otherwise.
pub fn serialize_transaction_with_witness(tx: &Transaction) -> Vec<u8> {
    if !tx.has_witness() {
        return serialize_transaction(tx);
    }
    let mut out = Vec::with_capacity(estimate_size(tx) + 2);
    out.extend_from_slice(&tx.version.to_le_bytes());
    out.push(WITNESS_MARKER);
    out.push(WITNESS_FLAG);
    write_inputs(&mut out, &tx.inputs);
    write_outputs(&mut out, &tx.outputs);
    for input in &tx.inputs {
        write_witness(&mut out, &input.witness);
    }
    out.extend_from_slice(&tx.lock_time.to_le_bytes());
    out
}

/// Deserialize the legacy form. Every byte must be consumed.
pub fn deserialize_transaction(data: &[u8]) -> Result<Transaction> {
    let mut reader = Reader::new(data);
    let tx = read_legacy(&mut reader)?;
    reader.finish()?;
    Ok(tx)
}

/// Deserialize either form.
///
/// A marker/flag pair is ambiguous with a legacy transaction that has zero
/// inputs and one output, so the witness form is only accepted when it
/// consumes every byte and carries at least one witness item.
pub fn deserialize_transaction_with_witness(data: &[u8]) -> Result<Transaction> {
    if data.len() > 5 && data[4] == WITNESS_MARKER && data[5] == WITNESS_FLAG {
        let mut reader = Reader::new(data);
        if let Ok(tx) = read_witness_form(&mut reader) {
            if reader.finish().is_ok() && tx.has_witness() {
                return Ok(tx);
            }
        }
    }
    deserialize_transaction(data)
}

pub fn serialize_outpoint(out: &mut Vec<u8>, outpoint: &OutPoint) {
    out.extend_from_slice(&outpoint.hash);
    out.extend_from_slice(&outpoint.index.to_le_bytes());
}

pub fn serialize_output(out: &mut Vec<u8>, output: &TransactionOutput) {
    out.extend_from_slice(&output.value.to_le_bytes());
    write_var_bytes(out, &output.script_pubkey);
}

/// varint(len) ‖ bytes
pub fn write_var_bytes(out: &mut Vec<u8>, bytes: &[u8]) {
    write_varint(out, bytes.len() as u64);
    out.extend_from_slice(bytes);
}

pub fn write_witness(out: &mut Vec<u8>, witness: &[ByteString]) {
    write_varint(out, witness.len() as u64);
    for item in witness {
        write_var_bytes(out, item);
    }
}

fn write_inputs(out: &mut Vec<u8>, inputs: &[TransactionInput]) {
    write_varint(out, inputs.len() as u64);
    for input in inputs {
        serialize_outpoint(out, &input.prevout);
        write_var_bytes(out, &input.script_sig);
        out.extend_from_slice(&input.sequence.to_le_bytes());
    }
}

fn write_outputs(out: &mut Vec<u8>, outputs: &[TransactionOutput]) {
    write_varint(out, outputs.len() as u64);
    for output in outputs {
        serialize_output(out, output);
    }
}

fn estimate_size(tx: &Transaction) -> usize {
    let inputs: usize = tx.inputs.iter().map(|i| 41 + i.script_sig.len()).sum();
    let outputs: usize = tx.outputs.iter().map(|o| 9 + o.script_pubkey.len()).sum();
    10 + inputs + outputs
}

fn read_legacy(reader: &mut Reader<'_>) -> Result<Transaction> {
    let version = reader.read_u32()?;
    let inputs = read_inputs(reader)?;
    let outputs = read_outputs(reader)?;
    let lock_time = reader.read_u32()?;
    Ok(Transaction {
        version,
        inputs,
        outputs,
        lock_time,
    })
}

fn read_witness_form(reader: &mut Reader<'_>) -> Result<Transaction> {
    let version = reader.read_u32()?;
    let marker = reader.read_bytes(2)?;
    if marker != [WITNESS_MARKER, WITNESS_FLAG] {
        return Err(ConsensusError::Serialization("Missing witness marker".into()));
    }
    let mut inputs = read_inputs(reader)?;
    let outputs = read_outputs(reader)?;
    for input in &mut inputs {
        let count = reader.read_count()?;
        let mut witness = Vec::with_capacity(count.min(reader.remaining()));
        for _ in 0..count {
            witness.push(reader.read_var_bytes()?);
        }
        input.witness = witness;
    }
    let lock_time = reader.read_u32()?;
    Ok(Transaction {
        version,
        inputs,
        outputs,
        lock_time,
    })
}

fn read_inputs(reader: &mut Reader<'_>) -> Result<Vec<TransactionInput>> {
    let count = reader.read_count()?;
    // Each input occupies at least 41 bytes
    let mut inputs = Vec::with_capacity(count.min(reader.remaining() / 41));
    for _ in 0..count {
        let hash = reader.read_hash()?;
        let index = reader.read_u32()?;
        let script_sig = reader.read_var_bytes()?;
        let sequence = reader.read_u32()?;
        inputs.push(TransactionInput {
            prevout: OutPoint { hash, index },
            script_sig,
            witness: Vec::new(),
            sequence,
        });
    }
    Ok(inputs)
}

fn read_outputs(reader: &mut Reader<'_>) -> Result<Vec<TransactionOutput>> {
    let count = reader.read_count()?;
    let mut outputs = Vec::with_capacity(count.min(reader.remaining() / 9));
    for _ in 0..count {
        let value = reader.read_u64()?;
        let script_pubkey = reader.read_var_bytes()?;
        outputs.push(TransactionOutput {
            value,
            script_pubkey,
        });
    }
    Ok(outputs)
}

/// Forward-only cursor over a byte slice.
pub(crate) struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub(crate) fn new(data: &'a [u8]) -> Self {
        Reader { data, pos: 0 }
    }

    pub(crate) fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub(crate) fn read_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.data.len())
            .ok_or_else(|| {
                ConsensusError::Serialization(
                    format!("Unexpected end of data reading {} bytes at {}", len, self.pos).into(),
                )
            })?;
        let bytes = &self.data[self.pos..end];
        self.pos = end;
        Ok(bytes)
    }

    pub(crate) fn read_u32(&mut self) -> Result<u32> {
        let mut buf = [0u8; 4];
        buf.copy_from_slice(self.read_bytes(4)?);
        Ok(u32::from_le_bytes(buf))
    }

    pub(crate) fn read_u64(&mut self) -> Result<u64> {
        let mut buf = [0u8; 8];
        buf.copy_from_slice(self.read_bytes(8)?);
        Ok(u64::from_le_bytes(buf))
    }

    pub(crate) fn read_hash(&mut self) -> Result<Hash> {
        let mut hash = [0u8; 32];
        hash.copy_from_slice(self.read_bytes(32)?);
        Ok(hash)
    }

    pub(crate) fn read_varint(&mut self) -> Result<u64> {
        let (value, size) = decode_varint(&self.data[self.pos..])?;
        self.pos += size;
        Ok(value)
    }

    /// A varint count that cannot possibly exceed the remaining bytes.
    pub(crate) fn read_count(&mut self) -> Result<usize> {
        let count = self.read_varint()?;
        if count > self.remaining() as u64 {
            return Err(ConsensusError::Serialization(
                format!("Count {} exceeds remaining data", count).into(),
            ));
        }
        Ok(count as usize)
    }

    pub(crate) fn read_var_bytes(&mut self) -> Result<ByteString> {
        let len = self.read_count()?;
        Ok(self.read_bytes(len)?.to_vec())
    }

    pub(crate) fn finish(&self) -> Result<()> {
        if self.remaining() != 0 {
            return Err(ConsensusError::Serialization(
                format!("{} trailing bytes", self.remaining()).into(),
            ));
        }
        Ok(())
    }
}
