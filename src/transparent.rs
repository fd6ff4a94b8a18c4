//! Transparent transaction inputs and outputs (`vin` / `vout`).

use crate::codec::{Cursor, Decode, Encode, VarBytes};
use crate::error::Result;

/// All-zero prevout hash marks a coinbase input's outpoint.
pub const COINBASE_PREVOUT_HASH: [u8; 32] = [0u8; 32];
pub const COINBASE_PREVOUT_N: u32 = 0xFFFF_FFFF;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutPoint {
    pub hash: [u8; 32],
    pub n: u32,
}

impl OutPoint {
    pub fn is_coinbase(&self) -> bool {
        self.hash == COINBASE_PREVOUT_HASH
    }
}

impl<'a> Decode<'a> for OutPoint {
    fn decode(cursor: &mut Cursor<'a>) -> Result<Self> {
        let hash = cursor.read_array::<32>()?;
        let n = cursor.read_u32_le()?;
        Ok(OutPoint { hash, n })
    }
}

impl Encode for OutPoint {
    fn encode(&self, out: &mut Vec<u8>) {
        self.hash.encode(out);
        self.n.encode(out);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionIn {
    pub prevout: OutPoint,
    pub script_sig: Vec<u8>,
    pub sequence: u32,
}

impl TransactionIn {
    pub fn is_coinbase(&self) -> bool {
        self.prevout.is_coinbase()
    }
}

impl<'a> Decode<'a> for TransactionIn {
    fn decode(cursor: &mut Cursor<'a>) -> Result<Self> {
        let prevout = OutPoint::decode(cursor)?;
        let script_sig = VarBytes::decode(cursor)?.0;
        let sequence = cursor.read_u32_le()?;
        Ok(TransactionIn {
            prevout,
            script_sig,
            sequence,
        })
    }
}

impl Encode for TransactionIn {
    fn encode(&self, out: &mut Vec<u8>) {
        self.prevout.encode(out);
        VarBytes(self.script_sig.clone()).encode(out);
        self.sequence.encode(out);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionOut {
    pub value: i64,
    pub script_pub_key: Vec<u8>,
}

impl<'a> Decode<'a> for TransactionOut {
    fn decode(cursor: &mut Cursor<'a>) -> Result<Self> {
        let value = cursor.read_i64_le()?;
        let script_pub_key = VarBytes::decode(cursor)?.0;
        Ok(TransactionOut {
            value,
            script_pub_key,
        })
    }
}

impl Encode for TransactionOut {
    fn encode(&self, out: &mut Vec<u8>) {
        self.value.encode(out);
        VarBytes(self.script_pub_key.clone()).encode(out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transaction_in_round_trips() {
        let txin = TransactionIn {
            prevout: OutPoint {
                hash: [9u8; 32],
                n: 3,
            },
            script_sig: vec![0x51, 0x52],
            sequence: 0xFFFF_FFFF,
        };
        let bytes = txin.to_bytes();
        let mut cursor = Cursor::new(&bytes);
        assert_eq!(TransactionIn::decode(&mut cursor).unwrap(), txin);
    }

    #[test]
    fn coinbase_predicate_checks_prevout_hash() {
        let coinbase_in = TransactionIn {
            prevout: OutPoint {
                hash: COINBASE_PREVOUT_HASH,
                n: COINBASE_PREVOUT_N,
            },
            script_sig: vec![],
            sequence: 0,
        };
        assert!(coinbase_in.is_coinbase());
    }
}
