//! Canonical binary serialization
//!
//! Bitcoin wire format: little-endian fixed-width integers, CompactSize
//! varints, and varint-prefixed byte strings.

pub mod transaction;
pub mod varint;

pub use transaction::*;
pub use varint::{decode_varint, encode_varint};
