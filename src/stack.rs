//! Execution stack and script number encoding

use crate::error::{VerifyError, VerifyResult};
use crate::types::ByteString;

/// CastToBool: false iff every byte is zero, allowing a trailing sign bit (negative zero).
pub fn cast_to_bool(bytes: &[u8]) -> bool {
    for (i, byte) in bytes.iter().enumerate() {
        if *byte != 0 {
            return !(i == bytes.len() - 1 && *byte == 0x80);
        }
    }
    false
}

/// Minimal little-endian sign-magnitude encoding.
///
/// ```
/// use script_consensus::stack::encode_num;
///
/// assert_eq!(encode_num(0), Vec::<u8>::new());
/// assert_eq!(encode_num(-1), vec![0x81]);
/// assert_eq!(encode_num(128), vec![0x80, 0x00]);
/// ```
pub fn encode_num(value: i64) -> ByteString {
    if value == 0 {
        return Vec::new();
    }
    let negative = value < 0;
    let mut magnitude = value.unsigned_abs();
    let mut out = Vec::with_capacity(9);
    while magnitude > 0 {
        out.push((magnitude & 0xff) as u8);
        magnitude >>= 8;
    }
    let last = out.len() - 1;
    if out[last] & 0x80 != 0 {
        out.push(if negative { 0x80 } else { 0x00 });
    } else if negative {
        out[last] |= 0x80;
    }
    out
}

/// Decode a script number of at most `max_size` bytes.
pub fn decode_num(bytes: &[u8], max_size: usize) -> VerifyResult<i64> {
    if bytes.len() > max_size {
        return Err(VerifyError::InvalidNumber(
            format!("{} byte number exceeds {} bytes", bytes.len(), max_size).into(),
        ));
    }
    let Some(&last) = bytes.last() else {
        return Ok(0);
    };
    let mut magnitude = 0i64;
    for (i, byte) in bytes.iter().enumerate() {
        let byte = if i == bytes.len() - 1 { byte & 0x7f } else { *byte };
        magnitude |= i64::from(byte) << (8 * i);
    }
    Ok(if last & 0x80 != 0 { -magnitude } else { magnitude })
}

/// True if `bytes` is the shortest encoding of its value.
pub fn is_minimal_num(bytes: &[u8]) -> bool {
    match bytes {
        [] => true,
        [.., last] if last & 0x7f != 0 => true,
        [_] => false,
        [.., prev, _] => prev & 0x80 != 0,
    }
}

/// Main or alt stack of byte strings, top at the end.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Stack {
    items: Vec<ByteString>,
}

impl Stack {
    pub fn new() -> Self {
        Stack { items: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[ByteString] {
        &self.items
    }

    pub fn into_items(self) -> Vec<ByteString> {
        self.items
    }

    pub fn push(&mut self, item: ByteString) {
        self.items.push(item);
    }

    pub fn push_bool(&mut self, value: bool) {
        self.items.push(if value { vec![1] } else { Vec::new() });
    }

    pub fn push_num(&mut self, value: i64) {
        self.items.push(encode_num(value));
    }

    pub fn pop(&mut self) -> VerifyResult<ByteString> {
        self.items.pop().ok_or(VerifyError::InvalidStackOperation)
    }

    pub fn pop_bool(&mut self) -> VerifyResult<bool> {
        Ok(cast_to_bool(&self.pop()?))
    }

    pub fn pop_num(&mut self, max_size: usize) -> VerifyResult<i64> {
        decode_num(&self.pop()?, max_size)
    }

    /// Fail unless at least `count` items are present.
    pub fn require(&self, count: usize) -> VerifyResult<()> {
        if self.items.len() < count {
            return Err(VerifyError::InvalidStackOperation);
        }
        Ok(())
    }

    /// Item `depth` positions below the top (0 is the top).
    pub fn peek(&self, depth: usize) -> VerifyResult<&ByteString> {
        self.require(depth + 1)?;
        Ok(&self.items[self.items.len() - 1 - depth])
    }

    pub fn top(&self) -> VerifyResult<&ByteString> {
        self.peek(0)
    }

    pub fn peek_num(&self, depth: usize, max_size: usize) -> VerifyResult<i64> {
        decode_num(self.peek(depth)?, max_size)
    }

    /// Remove and return the item `depth` positions below the top.
    pub fn remove(&mut self, depth: usize) -> VerifyResult<ByteString> {
        self.require(depth + 1)?;
        let index = self.items.len() - 1 - depth;
        Ok(self.items.remove(index))
    }

    /// Insert `item` so that it ends up `depth` positions below the top.
    pub fn insert(&mut self, depth: usize, item: ByteString) -> VerifyResult<()> {
        self.require(depth)?;
        let index = self.items.len() - depth;
        self.items.insert(index, item);
        Ok(())
    }

    pub fn swap(&mut self, a: usize, b: usize) -> VerifyResult<()> {
        self.require(a.max(b) + 1)?;
        let len = self.items.len();
        self.items.swap(len - 1 - a, len - 1 - b);
        Ok(())
    }

    /// Push copies of the top `count` items, preserving order.
    pub fn dup_top(&mut self, count: usize) -> VerifyResult<()> {
        self.require(count)?;
        let start = self.items.len() - count;
        for i in start..start + count {
            let item = self.items[i].clone();
            self.items.push(item);
        }
        Ok(())
    }

    pub fn truncate_top(&mut self, count: usize) -> VerifyResult<()> {
        self.require(count)?;
        let len = self.items.len();
        self.items.truncate(len - count);
        Ok(())
    }
}

impl From<Vec<ByteString>> for Stack {
    fn from(items: Vec<ByteString>) -> Self {
        Stack { items }
    }
}
