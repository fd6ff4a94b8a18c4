//! Primitive codec utilities (cursor, compact-size, hashing) and the `Decode`/`Encode`
//! traits that every record type in this crate implements by hand, in schema order.
//!
//! This is the static-schema answer to a dynamic hook-pointer table: each record type's
//! `decode`/`encode` body reads like the wire layout it describes, instead of being driven
//! by a registry of field directives interpreted at runtime.

use ripemd::Ripemd160;
use sha2::{Digest, Sha256};

use crate::error::{Error, Result};

/// A read-only cursor over an immutable byte slice. Every read advances the position and
/// fails with [`Error::Truncated`] rather than panicking when the slice is exhausted.
pub struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Cursor { bytes, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    /// Bookmark the current position, to be passed to [`Cursor::since`] later.
    pub fn bookmark(&self) -> usize {
        self.pos
    }

    /// The exact bytes read between `bookmark` and the cursor's current position.
    pub fn since(&self, bookmark: usize) -> &'a [u8] {
        &self.bytes[bookmark..self.pos]
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        if self.remaining() < n {
            return Err(Error::Truncated {
                needed: n,
                available: self.remaining(),
            });
        }
        let slice = &self.bytes[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    /// Zero-copy view into the input; does not allocate.
    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        self.take(n)
    }

    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let slice = self.take(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(slice);
        Ok(out)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    pub fn read_u16_le(&mut self) -> Result<u16> {
        let b = self.take(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    pub fn read_u32_le(&mut self) -> Result<u32> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes(b.try_into().unwrap()))
    }

    pub fn read_u64_le(&mut self) -> Result<u64> {
        let b = self.take(8)?;
        Ok(u64::from_le_bytes(b.try_into().unwrap()))
    }

    pub fn read_i32_le(&mut self) -> Result<i32> {
        Ok(self.read_u32_le()? as i32)
    }

    pub fn read_i64_le(&mut self) -> Result<i64> {
        Ok(self.read_u64_le()? as i64)
    }

    /// Bitcoin-lineage compact-size length prefix: <0xFD => 1 byte, 0xFD => 2-byte LE,
    /// 0xFE => 4-byte LE, 0xFF => 8-byte LE.
    pub fn read_compact_size(&mut self) -> Result<u64> {
        let tag = self.read_u8()?;
        match tag {
            0..=0xFC => Ok(tag as u64),
            0xFD => Ok(self.read_u16_le()? as u64),
            0xFE => Ok(self.read_u32_le()? as u64),
            0xFF => self.read_u64_le(),
        }
    }
}

/// Types that can be read from a [`Cursor`] in a single, schema-fixed shape.
pub trait Decode<'a>: Sized {
    fn decode(cursor: &mut Cursor<'a>) -> Result<Self>;
}

/// Types that can be written out as consensus bytes.
pub trait Encode {
    fn encode(&self, out: &mut Vec<u8>);

    fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.encode(&mut out);
        out
    }
}

impl<'a> Decode<'a> for u32 {
    fn decode(cursor: &mut Cursor<'a>) -> Result<Self> {
        cursor.read_u32_le()
    }
}
impl Encode for u32 {
    fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.to_le_bytes());
    }
}

impl<'a> Decode<'a> for i32 {
    fn decode(cursor: &mut Cursor<'a>) -> Result<Self> {
        cursor.read_i32_le()
    }
}
impl Encode for i32 {
    fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.to_le_bytes());
    }
}

impl<'a> Decode<'a> for i64 {
    fn decode(cursor: &mut Cursor<'a>) -> Result<Self> {
        cursor.read_i64_le()
    }
}
impl Encode for i64 {
    fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.to_le_bytes());
    }
}

impl<'a, const N: usize> Decode<'a> for [u8; N] {
    fn decode(cursor: &mut Cursor<'a>) -> Result<Self> {
        cursor.read_array::<N>()
    }
}
impl<const N: usize> Encode for [u8; N] {
    fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(self);
    }
}

/// A compact-size-prefixed variable-length byte string (scripts, the Equihash solution,
/// ciphertexts-as-opaque-bytes never use this — only genuinely variable-length fields do).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VarBytes(pub Vec<u8>);

impl<'a> Decode<'a> for VarBytes {
    fn decode(cursor: &mut Cursor<'a>) -> Result<Self> {
        let len = cursor.read_compact_size()? as usize;
        Ok(VarBytes(cursor.read_bytes(len)?.to_vec()))
    }
}
impl Encode for VarBytes {
    fn encode(&self, out: &mut Vec<u8>) {
        write_compact_size(out, self.0.len() as u64);
        out.extend_from_slice(&self.0);
    }
}

/// Decodes `bytes` with `f`, then, if `strict`, requires every byte to have been consumed.
/// The single place `Block::decode`/`Transaction::decode` route their strict-mode check
/// through, rather than each re-checking `cursor.is_empty()` inline.
pub fn decode_strict<'a, T>(
    bytes: &'a [u8],
    strict: bool,
    f: impl FnOnce(&mut Cursor<'a>) -> Result<T>,
) -> Result<T> {
    let mut cursor = Cursor::new(bytes);
    let value = f(&mut cursor)?;
    if strict && !cursor.is_empty() {
        return Err(Error::StrictLength {
            trailing: cursor.remaining(),
            total: bytes.len(),
        });
    }
    Ok(value)
}

/// A compact-size-prefixed vector of nested records.
pub fn decode_vector<'a, T: Decode<'a>>(cursor: &mut Cursor<'a>) -> Result<Vec<T>> {
    let count = cursor.read_compact_size()? as usize;
    let mut items = Vec::with_capacity(count.min(1_000_000));
    for _ in 0..count {
        items.push(T::decode(cursor)?);
    }
    Ok(items)
}

pub fn encode_vector<T: Encode>(out: &mut Vec<u8>, items: &[T]) {
    write_compact_size(out, items.len() as u64);
    for item in items {
        item.encode(out);
    }
}

pub fn write_compact_size(out: &mut Vec<u8>, n: u64) {
    if n < 0xFD {
        out.push(n as u8);
    } else if n <= 0xFFFF {
        out.push(0xFD);
        out.extend_from_slice(&(n as u16).to_le_bytes());
    } else if n <= 0xFFFF_FFFF {
        out.push(0xFE);
        out.extend_from_slice(&(n as u32).to_le_bytes());
    } else {
        out.push(0xFF);
        out.extend_from_slice(&n.to_le_bytes());
    }
}

/// `sha256(sha256(x))`.
pub fn dbl_sha256(preimage: &[u8]) -> [u8; 32] {
    let first = Sha256::digest(preimage);
    let second = Sha256::digest(first);
    second.into()
}

/// `ripemd160(sha256(x))`.
pub fn hash160(preimage: &[u8]) -> [u8; 20] {
    let sha = Sha256::digest(preimage);
    Ripemd160::digest(sha).into()
}

/// Wire hashes are stored/transmitted little-endian-style; display hex is the
/// byte-reversed big-endian form the reference node prints.
pub fn hash_to_hex(hash: &[u8; 32]) -> String {
    let mut reversed = *hash;
    reversed.reverse();
    hex::encode(reversed)
}

pub fn hash_from_hex(hex_str: &str) -> Result<[u8; 32]> {
    let bytes = hex::decode(hex_str)
        .map_err(|e| Error::Porcelain(format!("invalid hash hex: {e}")))?;
    if bytes.len() != 32 {
        return Err(Error::Porcelain(format!(
            "hash hex must decode to 32 bytes, got {}",
            bytes.len()
        )));
    }
    let mut array = [0u8; 32];
    array.copy_from_slice(&bytes);
    array.reverse();
    Ok(array)
}

/// Bitcoin-style Merkle root: pair adjacent leaves, duplicating the last when the layer
/// has an odd count, concatenate and double-SHA-256 each pair, repeat until one hash
/// remains. Fails on an empty leaf set.
pub fn merkle_root(leaves: &[[u8; 32]]) -> Result<[u8; 32]> {
    if leaves.is_empty() {
        return Err(Error::Precondition("merkle_root called with no leaves"));
    }
    let mut layer: Vec<[u8; 32]> = leaves.to_vec();
    while layer.len() > 1 {
        if layer.len() % 2 != 0 {
            let last = *layer.last().unwrap();
            layer.push(last);
        }
        let mut next = Vec::with_capacity(layer.len() / 2);
        for pair in layer.chunks_exact(2) {
            let mut concat = Vec::with_capacity(64);
            concat.extend_from_slice(&pair[0]);
            concat.extend_from_slice(&pair[1]);
            next.push(dbl_sha256(&concat));
        }
        layer = next;
    }
    Ok(layer[0])
}

/// The sibling hashes needed to recompute `leaves[index]`'s inclusion in
/// [`merkle_root`], innermost pair first. Supplemental to the core spec: useful for
/// callers validating a single txid against `merkleroot` without rebuilding the tree.
pub fn merkle_path(leaves: &[[u8; 32]], mut index: usize) -> Result<Vec<[u8; 32]>> {
    if leaves.is_empty() {
        return Err(Error::Precondition("merkle_path called with no leaves"));
    }
    if index >= leaves.len() {
        return Err(Error::Precondition("merkle_path index out of range"));
    }
    let mut layer: Vec<[u8; 32]> = leaves.to_vec();
    let mut path = Vec::new();
    while layer.len() > 1 {
        if layer.len() % 2 != 0 {
            let last = *layer.last().unwrap();
            layer.push(last);
        }
        let sibling = if index % 2 == 0 { index + 1 } else { index - 1 };
        path.push(layer[sibling]);

        let mut next = Vec::with_capacity(layer.len() / 2);
        for pair in layer.chunks_exact(2) {
            let mut concat = Vec::with_capacity(64);
            concat.extend_from_slice(&pair[0]);
            concat.extend_from_slice(&pair[1]);
            next.push(dbl_sha256(&concat));
        }
        layer = next;
        index /= 2;
    }
    Ok(path)
}
