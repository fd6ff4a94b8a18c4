//! Block header and full block records (C3).

use tracing::instrument;

use crate::codec::{
    decode_strict, decode_vector, encode_vector, dbl_sha256, merkle_root, Cursor, Decode, Encode,
    VarBytes,
};
use crate::error::{Error, Result};
use crate::transaction::Transaction;

/// A decoded header is always exactly this many bytes.
pub const HEADER_BYTES: usize = 1487;

/// 1 Zcash coin, in zats.
pub const COIN: i64 = 100_000_000;

/// The genesis target against which [`Block::difficulty`] is computed.
const GENESIS_BITS: u32 = 0x1f07_ffff;

/// Porcelain omits `previousblockhash` entirely when it is this all-zero value
/// (the genesis block has no parent).
pub const GENESIS_PREVIOUSBLOCKHASH: [u8; 32] = [0u8; 32];

#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub version: i32,
    pub previousblockhash: [u8; 32],
    pub merkleroot: [u8; 32],
    pub finalsaplingroot: [u8; 32],
    pub time: u32,
    pub bits: u32,
    pub nonce: [u8; 32],
    pub solution: Vec<u8>,
    pub hash: [u8; 32],
    /// `None` when decoded via [`Block::decode_header_only`].
    pub tx: Option<Vec<Transaction>>,
    /// `None` when decoded via [`Block::decode_header_only`].
    pub size: Option<usize>,
}

impl Block {
    #[instrument(level = "debug", skip(bytes))]
    pub fn decode(bytes: &[u8], strict: bool) -> Result<Self> {
        decode_strict(bytes, strict, |cursor| Self::decode_from_cursor(cursor, true))
    }

    #[instrument(level = "debug", skip(bytes))]
    pub fn decode_header_only(bytes: &[u8], strict: bool) -> Result<Self> {
        decode_strict(bytes, strict, |cursor| Self::decode_from_cursor(cursor, false))
    }

    fn decode_from_cursor(cursor: &mut Cursor<'_>, with_transactions: bool) -> Result<Self> {
        let block_start = cursor.bookmark();

        let version = cursor.read_i32_le()?;
        let previousblockhash = cursor.read_array::<32>()?;
        let merkleroot = cursor.read_array::<32>()?;
        let finalsaplingroot = cursor.read_array::<32>()?;
        let time = cursor.read_u32_le()?;
        let bits = cursor.read_u32_le()?;
        let nonce = cursor.read_array::<32>()?;
        let solution = VarBytes::decode(cursor)?.0;

        let header_span = cursor.since(block_start);
        if header_span.len() != HEADER_BYTES {
            return Err(Error::Precondition(
                "decoded header span was not exactly HEADER_BYTES long",
            ));
        }
        let hash = dbl_sha256(header_span);

        let (tx, size) = if with_transactions {
            let tx: Vec<Transaction> = decode_vector(cursor)?;
            let size = cursor.position() - block_start;
            (Some(tx), Some(size))
        } else {
            (None, None)
        };

        Ok(Block {
            version,
            previousblockhash,
            merkleroot,
            finalsaplingroot,
            time,
            bits,
            nonce,
            solution,
            hash,
            tx,
            size,
        })
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.version.encode(&mut out);
        self.previousblockhash.encode(&mut out);
        self.merkleroot.encode(&mut out);
        self.finalsaplingroot.encode(&mut out);
        self.time.encode(&mut out);
        self.bits.encode(&mut out);
        self.nonce.encode(&mut out);
        VarBytes(self.solution.clone()).encode(&mut out);
        if let Some(tx) = &self.tx {
            encode_vector(&mut out, tx);
        }
        out
    }

    /// Merkle root of `tx`'s txids, using the doubled-last-node rule. Fails if `tx` is
    /// absent (header-only decode) or empty.
    pub fn calculate_merkle_root(&self) -> Result<[u8; 32]> {
        let tx = self
            .tx
            .as_ref()
            .ok_or(Error::Precondition("calculate_merkle_root requires tx"))?;
        if tx.is_empty() {
            return Err(Error::Precondition(
                "calculate_merkle_root called on a block with no transactions",
            ));
        }
        let leaves: Vec<[u8; 32]> = tx.iter().map(|t| t.txid).collect();
        merkle_root(&leaves)
    }

    /// Display-only convenience derived from `bits`; not consensus logic and not part of
    /// the byte-wise round trip.
    pub fn difficulty(&self) -> f64 {
        target_difficulty(GENESIS_BITS) / target_difficulty(self.bits)
    }
}

fn target_difficulty(bits: u32) -> f64 {
    let mantissa = (bits & 0x00FF_FFFF) as f64;
    let exponent = 8 * ((bits >> 24) as i32 - 3);
    mantissa * 2f64.powi(exponent)
}
