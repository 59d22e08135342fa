//! Script parsing, standard patterns and script-code editing

use crate::error::{ConsensusError, Result, VerifyError, VerifyResult};
use crate::opcodes::*;
use crate::stack::encode_num;
use crate::types::ByteString;

/// One parsed script instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    /// OP_0 or a push of explicit data; `opcode` is the encoding used.
    Push { opcode: Opcode, data: ByteString },
    Code(Opcode),
}

impl Operation {
    pub fn opcode(&self) -> Opcode {
        match self {
            Operation::Push { opcode, .. } => *opcode,
            Operation::Code(opcode) => *opcode,
        }
    }

    /// Serialized form of this instruction.
    pub fn to_bytes(&self) -> ByteString {
        match self {
            Operation::Push { opcode, data } => {
                let mut out = vec![opcode.to_u8()];
                match opcode {
                    Opcode::PushData1 => out.push(data.len() as u8),
                    Opcode::PushData2 => out.extend_from_slice(&(data.len() as u16).to_le_bytes()),
                    Opcode::PushData4 => out.extend_from_slice(&(data.len() as u32).to_le_bytes()),
                    _ => {}
                }
                out.extend_from_slice(data);
                out
            }
            Operation::Code(opcode) => vec![opcode.to_u8()],
        }
    }
}

/// Iterator over the instructions of a script.
///
/// Yields each operation with the byte offset just past it. A truncated push
/// yields a single error and ends the iteration.
pub struct Instructions<'a> {
    script: &'a [u8],
    pos: usize,
}

impl<'a> Instructions<'a> {
    pub fn new(script: &'a [u8]) -> Self {
        Instructions { script, pos: 0 }
    }

    fn fail(&mut self, message: &'static str) -> Option<VerifyResult<(usize, Operation)>> {
        self.pos = self.script.len();
        Some(Err(VerifyError::InvalidScript(message.into())))
    }

    fn read_len(&mut self, width: usize) -> Option<usize> {
        let bytes = self.script.get(self.pos..self.pos + width)?;
        self.pos += width;
        Some(
            bytes
                .iter()
                .rev()
                .fold(0usize, |acc, byte| (acc << 8) | usize::from(*byte)),
        )
    }
}

impl<'a> Iterator for Instructions<'a> {
    type Item = VerifyResult<(usize, Operation)>;

    fn next(&mut self) -> Option<Self::Item> {
        let byte = *self.script.get(self.pos)?;
        self.pos += 1;
        let opcode = Opcode::from_u8(byte);
        let len = match opcode {
            Opcode::PushSize0 => 0,
            Opcode::PushBytes(n) => usize::from(n),
            Opcode::PushData1 => match self.read_len(1) {
                Some(len) => len,
                None => return self.fail("Truncated pushdata1 length"),
            },
            Opcode::PushData2 => match self.read_len(2) {
                Some(len) => len,
                None => return self.fail("Truncated pushdata2 length"),
            },
            Opcode::PushData4 => match self.read_len(4) {
                Some(len) => len,
                None => return self.fail("Truncated pushdata4 length"),
            },
            _ => return Some(Ok((self.pos, Operation::Code(opcode)))),
        };
        let end = match self.pos.checked_add(len) {
            Some(end) if end <= self.script.len() => end,
            _ => return self.fail("Push past end of script"),
        };
        let data = self.script[self.pos..end].to_vec();
        self.pos = end;
        Some(Ok((end, Operation::Push { opcode, data })))
    }
}

pub fn parse_script(script: &[u8]) -> VerifyResult<Vec<Operation>> {
    Instructions::new(script)
        .map(|item| item.map(|(_, op)| op))
        .collect()
}

pub fn serialize_script(operations: &[Operation]) -> ByteString {
    operations.iter().flat_map(|op| op.to_bytes()).collect()
}

/// Smallest pushdata encoding of `data` (never an OP_n).
pub fn encode_push(data: &[u8]) -> ByteString {
    let mut out = Vec::with_capacity(data.len() + 5);
    match data.len() {
        0 => out.push(OP_0),
        len @ 1..=0x4b => out.push(len as u8),
        len @ 0x4c..=0xff => {
            out.push(OP_PUSHDATA1);
            out.push(len as u8);
        }
        len @ 0x100..=0xffff => {
            out.push(OP_PUSHDATA2);
            out.extend_from_slice(&(len as u16).to_le_bytes());
        }
        len => {
            out.push(OP_PUSHDATA4);
            out.extend_from_slice(&(len as u32).to_le_bytes());
        }
    }
    out.extend_from_slice(data);
    out
}

/// True if `opcode` is the shortest way to push `data`.
pub fn is_minimal_push(opcode: Opcode, data: &[u8]) -> bool {
    match data {
        [] => opcode == Opcode::PushSize0,
        [n @ 1..=16] => opcode == Opcode::PushPositive(*n),
        [0x81] => opcode == Opcode::PushNegative1,
        _ if data.len() <= 0x4b => opcode == Opcode::PushBytes(data.len() as u8),
        _ if data.len() <= 0xff => opcode == Opcode::PushData1,
        _ if data.len() <= 0xffff => opcode == Opcode::PushData2,
        _ => true,
    }
}

/// Only push opcodes (up to OP_16); unparseable scripts are not push-only.
pub fn is_push_only(script: &[u8]) -> bool {
    Instructions::new(script).all(|item| matches!(item, Ok((_, op)) if op.opcode().is_push()))
}

/// Version and program of a witness program script.
///
/// A witness program is a one-byte version opcode (OP_0, OP_1..OP_16)
/// followed by a single direct push of 2 to 40 bytes.
pub fn witness_program(script: &[u8]) -> Option<(u8, &[u8])> {
    if script.len() < 4 || script.len() > 42 {
        return None;
    }
    let version = match Opcode::from_u8(script[0]) {
        Opcode::PushSize0 => 0,
        Opcode::PushPositive(n) => n,
        _ => return None,
    };
    if usize::from(script[1]) + 2 != script.len() {
        return None;
    }
    Some((version, &script[2..]))
}

pub fn is_witness_program(script: &[u8]) -> bool {
    witness_program(script).is_some()
}

/// HASH160 <20 bytes> EQUAL
pub fn is_pay_script_hash_pattern(script: &[u8]) -> bool {
    script.len() == 23 && script[0] == OP_HASH160 && script[1] == 0x14 && script[22] == OP_EQUAL
}

/// DUP HASH160 <20 bytes> EQUALVERIFY CHECKSIG
pub fn is_pay_key_hash_pattern(script: &[u8]) -> bool {
    script.len() == 25
        && script[0] == OP_DUP
        && script[1] == OP_HASH160
        && script[2] == 0x14
        && script[23] == OP_EQUALVERIFY
        && script[24] == OP_CHECKSIG
}

pub fn to_pay_public_key_pattern(point: &[u8]) -> ByteString {
    Builder::new()
        .push_data(point)
        .push_opcode(Opcode::CheckSig)
        .into_bytes()
}

pub fn to_pay_key_hash_pattern(hash: &[u8; 20]) -> ByteString {
    Builder::new()
        .push_opcode(Opcode::Dup)
        .push_opcode(Opcode::Hash160)
        .push_data(hash)
        .push_opcode(Opcode::EqualVerify)
        .push_opcode(Opcode::CheckSig)
        .into_bytes()
}

pub fn to_pay_script_hash_pattern(hash: &[u8; 20]) -> ByteString {
    Builder::new()
        .push_opcode(Opcode::Hash160)
        .push_data(hash)
        .push_opcode(Opcode::Equal)
        .into_bytes()
}

/// m-of-n bare multisig: OP_m <points...> OP_n CHECKMULTISIG
pub fn to_pay_multisig_pattern(signatures: u8, points: &[Vec<u8>]) -> Result<ByteString> {
    let keys = u8::try_from(points.len()).unwrap_or(u8::MAX);
    if signatures == 0 || signatures > keys || keys > 16 {
        return Err(ConsensusError::TransactionValidation(
            format!("Invalid {}-of-{} multisig", signatures, points.len()).into(),
        ));
    }
    let mut builder = Builder::new().push_int(i64::from(signatures));
    for point in points {
        builder = builder.push_data(point);
    }
    Ok(builder
        .push_int(i64::from(keys))
        .push_opcode(Opcode::CheckMultisig)
        .into_bytes())
}

pub fn to_pay_witness_key_hash_pattern(hash: &[u8; 20]) -> ByteString {
    Builder::new()
        .push_opcode(Opcode::PushSize0)
        .push_data(hash)
        .into_bytes()
}

pub fn to_pay_witness_script_hash_pattern(hash: &[u8; 32]) -> ByteString {
    Builder::new()
        .push_opcode(Opcode::PushSize0)
        .push_data(hash)
        .into_bytes()
}

/// Remove every OP_CODESEPARATOR at an instruction boundary.
///
/// Bytes following a parse failure are kept verbatim.
pub fn strip_code_separators(script: &[u8]) -> ByteString {
    let mut out = Vec::with_capacity(script.len());
    let mut start = 0;
    for item in Instructions::new(script) {
        let Ok((end, op)) = item else {
            break;
        };
        if op.opcode() != Opcode::CodeSeparator {
            out.extend_from_slice(&script[start..end]);
        }
        start = end;
    }
    out.extend_from_slice(&script[start..]);
    out
}

/// Remove every instruction-aligned occurrence of `pattern` from `script`.
///
/// Returns the edited script and the number of occurrences removed.
pub fn find_and_delete(script: &[u8], pattern: &[u8]) -> (ByteString, usize) {
    if pattern.is_empty() {
        return (script.to_vec(), 0);
    }
    let mut out = Vec::with_capacity(script.len());
    let mut found = 0;
    let mut pc = 0;
    let mut copied = 0;
    loop {
        out.extend_from_slice(&script[copied..pc]);
        while script.len() - pc >= pattern.len() && script[pc..pc + pattern.len()] == *pattern {
            pc += pattern.len();
            found += 1;
        }
        copied = pc;
        match Instructions::new(&script[pc..]).next() {
            Some(Ok((len, _))) => pc += len,
            _ => break,
        }
    }
    if found == 0 {
        return (script.to_vec(), 0);
    }
    out.extend_from_slice(&script[copied..]);
    (out, found)
}

/// Consuming script builder.
#[derive(Debug, Clone, Default)]
pub struct Builder {
    code: ByteString,
}

impl Builder {
    pub fn new() -> Self {
        Builder { code: Vec::new() }
    }

    pub fn push_opcode(mut self, opcode: Opcode) -> Self {
        self.code.push(opcode.to_u8());
        self
    }

    /// Push `data` with the smallest pushdata encoding.
    pub fn push_data(mut self, data: &[u8]) -> Self {
        self.code.extend_from_slice(&encode_push(data));
        self
    }

    /// Push a number, using OP_0, OP_1NEGATE or OP_n where possible.
    pub fn push_int(self, value: i64) -> Self {
        match value {
            0 => self.push_opcode(Opcode::PushSize0),
            -1 => self.push_opcode(Opcode::PushNegative1),
            1..=16 => self.push_opcode(Opcode::PushPositive(value as u8)),
            _ => self.push_data(&encode_num(value)),
        }
    }

    /// Append raw bytes without a push prefix.
    pub fn push_slice(mut self, bytes: &[u8]) -> Self {
        self.code.extend_from_slice(bytes);
        self
    }

    pub fn into_bytes(self) -> ByteString {
        self.code
    }
}
