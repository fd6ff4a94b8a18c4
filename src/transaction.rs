//! The variant-heavy transaction record (C4): four on-wire shapes keyed by the
//! `(overwintered, version, versiongroupid)` tag, decoded and encoded through a single
//! struct whose conditional sections are always a deterministic function of that tag
//! plus the shielded/joinsplit vector lengths — never independently-settable flags.

use tracing::instrument;

use crate::codec::{decode_vector, encode_vector, dbl_sha256, Cursor, Decode, Encode};
use crate::error::{Error, Result};
use crate::joinsplit::JoinSplitDescription;
use crate::shielded::{OutputDescription, SpendDescription};
use crate::transparent::{TransactionIn, TransactionOut};

pub const OVERWINTER_VERSION_GROUP_ID: u32 = 0x03C4_8270;
pub const SAPLING_VERSION_GROUP_ID: u32 = 0x892F_2085;
pub const OVERWINTER_TX_VERSION: u32 = 3;
pub const SAPLING_TX_VERSION: u32 = 4;

const OVERWINTERED_FLAG: u32 = 1 << 31;

/// The `(overwintered, version, versiongroupid)` tag that selects a transaction's shape.
/// Exposed so callers (and [`crate::porcelain`]) can reason about shape without
/// re-deriving it from raw fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxContext {
    pub overwintered: bool,
    pub version: u32,
}

impl TxContext {
    pub fn is_sapling(&self) -> bool {
        self.overwintered && self.version >= SAPLING_TX_VERSION
    }

    pub fn has_joinsplits(&self) -> bool {
        self.version >= 2
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub overwintered: bool,
    pub version: u32,
    /// 0 when `!overwintered`; logically absent on the wire in that case.
    pub version_group_id: u32,
    pub vin: Vec<TransactionIn>,
    pub vout: Vec<TransactionOut>,
    pub lock_time: u32,
    /// 0 when not v3/v4.
    pub expiry_height: u32,
    /// 0 when not v4.
    pub value_balance_zat: i64,
    pub shielded_spends: Vec<SpendDescription>,
    pub shielded_outputs: Vec<OutputDescription>,
    pub join_splits: Vec<JoinSplitDescription>,
    pub join_split_pubkey: Option<[u8; 32]>,
    pub join_split_sig: Option<[u8; 64]>,
    pub binding_sig: Option<[u8; 64]>,
    pub txid: [u8; 32],
    pub raw_bytes: Vec<u8>,
}

impl Transaction {
    pub fn context(&self) -> TxContext {
        TxContext {
            overwintered: self.overwintered,
            version: self.version,
        }
    }

    /// Exactly one input whose prevout hash is the all-zero 32-byte value.
    pub fn is_coinbase(&self) -> bool {
        self.vin.len() == 1 && self.vin[0].is_coinbase()
    }

    pub(crate) fn is_sapling(&self) -> bool {
        self.context().is_sapling()
    }

    fn has_shielded_data(&self) -> bool {
        !self.shielded_spends.is_empty() || !self.shielded_outputs.is_empty()
    }

    /// Validates that `(ctx.overwintered, ctx.version, versiongroupid)` is one of the two
    /// legal overwintered combinations. Non-overwintered transactions are never rejected.
    pub(crate) fn validate_shape(ctx: TxContext, version_group_id: u32) -> Result<()> {
        if !ctx.overwintered {
            return Ok(());
        }
        let legal = (version_group_id == OVERWINTER_VERSION_GROUP_ID && ctx.version == OVERWINTER_TX_VERSION)
            || (version_group_id == SAPLING_VERSION_GROUP_ID && ctx.version == SAPLING_TX_VERSION);
        if legal {
            Ok(())
        } else {
            Err(Error::UnknownTransactionShape {
                overwintered: ctx.overwintered,
                version: ctx.version,
                versiongroupid: version_group_id,
            })
        }
    }

    #[instrument(level = "debug", skip(bytes))]
    pub fn decode(bytes: &[u8], strict: bool) -> Result<Self> {
        crate::codec::decode_strict(bytes, strict, |cursor| <Transaction as Decode>::decode(cursor))
    }

    pub fn encode(&self) -> Vec<u8> {
        <Transaction as Encode>::to_bytes(self)
    }
}

impl<'a> Decode<'a> for Transaction {
    fn decode(cursor: &mut Cursor<'a>) -> Result<Self> {
        let tx_start = cursor.bookmark();

        let header = cursor.read_u32_le()?;
        let overwintered = (header & OVERWINTERED_FLAG) != 0;
        let version = header & !OVERWINTERED_FLAG;
        let version_group_id = if overwintered {
            cursor.read_u32_le()?
        } else {
            0
        };
        let ctx = TxContext { overwintered, version };
        Transaction::validate_shape(ctx, version_group_id)?;

        let vin: Vec<TransactionIn> = decode_vector(cursor)?;
        let vout: Vec<TransactionOut> = decode_vector(cursor)?;
        let lock_time = cursor.read_u32_le()?;

        let expiry_height = if overwintered { cursor.read_u32_le()? } else { 0 };

        let (value_balance_zat, shielded_spends, shielded_outputs) = if ctx.is_sapling() {
            (
                cursor.read_i64_le()?,
                decode_vector(cursor)?,
                decode_vector(cursor)?,
            )
        } else {
            (0, Vec::new(), Vec::new())
        };

        let mut join_splits = Vec::new();
        let mut join_split_pubkey = None;
        let mut join_split_sig = None;
        if ctx.has_joinsplits() {
            let count = cursor.read_compact_size()? as usize;
            join_splits.reserve(count.min(1_000_000));
            for _ in 0..count {
                join_splits.push(JoinSplitDescription::decode(cursor, ctx)?);
            }
            if !join_splits.is_empty() {
                join_split_pubkey = Some(cursor.read_array()?);
                join_split_sig = Some(cursor.read_array()?);
            }
        }

        let binding_sig = if ctx.is_sapling()
            && (!shielded_spends.is_empty() || !shielded_outputs.is_empty())
        {
            Some(cursor.read_array()?)
        } else {
            None
        };

        let raw_bytes = cursor.since(tx_start).to_vec();
        let txid = dbl_sha256(&raw_bytes);

        Ok(Transaction {
            overwintered,
            version,
            version_group_id,
            vin,
            vout,
            lock_time,
            expiry_height,
            value_balance_zat,
            shielded_spends,
            shielded_outputs,
            join_splits,
            join_split_pubkey,
            join_split_sig,
            binding_sig,
            txid,
            raw_bytes,
        })
    }
}

impl Encode for Transaction {
    fn encode(&self, out: &mut Vec<u8>) {
        let header = if self.overwintered {
            OVERWINTERED_FLAG | self.version
        } else {
            self.version
        };
        header.encode(out);
        if self.overwintered {
            self.version_group_id.encode(out);
        }

        encode_vector(out, &self.vin);
        encode_vector(out, &self.vout);
        self.lock_time.encode(out);

        if self.overwintered {
            self.expiry_height.encode(out);
        }

        if self.is_sapling() {
            self.value_balance_zat.encode(out);
            encode_vector(out, &self.shielded_spends);
            encode_vector(out, &self.shielded_outputs);
        }

        if self.version >= 2 {
            encode_vector(out, &self.join_splits);
            if !self.join_splits.is_empty() {
                if let Some(pubkey) = &self.join_split_pubkey {
                    pubkey.encode(out);
                }
                if let Some(sig) = &self.join_split_sig {
                    sig.encode(out);
                }
            }
        }

        if self.is_sapling() && self.has_shielded_data() {
            if let Some(sig) = &self.binding_sig {
                sig.encode(out);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transparent::OutPoint;

    fn base_tx(overwintered: bool, version: u32, version_group_id: u32) -> Transaction {
        Transaction {
            overwintered,
            version,
            version_group_id,
            vin: vec![TransactionIn {
                prevout: OutPoint {
                    hash: [0; 32],
                    n: 0,
                },
                script_sig: vec![0xAB],
                sequence: 0xFFFF_FFFF,
            }],
            vout: vec![TransactionOut {
                value: 5000,
                script_pub_key: vec![0x76, 0xA9],
            }],
            lock_time: 0,
            expiry_height: 0,
            value_balance_zat: 0,
            shielded_spends: vec![],
            shielded_outputs: vec![],
            join_splits: vec![],
            join_split_pubkey: None,
            join_split_sig: None,
            binding_sig: None,
            txid: [0; 32],
            raw_bytes: vec![],
        }
    }

    fn round_trip(tx: &Transaction) -> Transaction {
        let bytes = tx.encode();
        Transaction::decode(&bytes, true).unwrap()
    }

    #[test]
    fn legacy_v1_round_trips() {
        let tx = base_tx(false, 1, 0);
        let decoded = round_trip(&tx);
        assert_eq!(decoded.version, 1);
        assert!(!decoded.overwintered);
        assert_eq!(decoded.txid, dbl_sha256(&decoded.raw_bytes));
    }

    #[test]
    fn overwinter_v3_requires_expiry_height_and_no_binding_sig() {
        let mut tx = base_tx(true, 3, OVERWINTER_VERSION_GROUP_ID);
        tx.expiry_height = 12345;
        let decoded = round_trip(&tx);
        assert_eq!(decoded.expiry_height, 12345);
        assert!(decoded.binding_sig.is_none());
        assert_eq!(decoded.value_balance_zat, 0);
    }

    #[test]
    fn sapling_v4_empty_shielded_has_no_binding_sig() {
        let mut tx = base_tx(true, 4, SAPLING_VERSION_GROUP_ID);
        tx.expiry_height = 1;
        let decoded = round_trip(&tx);
        assert!(decoded.binding_sig.is_none());
        assert_eq!(decoded.value_balance_zat, 0);
    }

    #[test]
    fn sapling_v4_with_shielded_output_requires_binding_sig() {
        let mut tx = base_tx(true, 4, SAPLING_VERSION_GROUP_ID);
        tx.expiry_height = 1;
        tx.shielded_outputs.push(OutputDescription {
            cv: [1; 32],
            cmu: [2; 32],
            ephemeral_key: [3; 32],
            enc_ciphertext: [4; 580],
            out_ciphertext: [5; 80],
            proof: [6; 192],
        });
        tx.binding_sig = Some([9; 64]);
        let decoded = round_trip(&tx);
        assert_eq!(decoded.binding_sig, Some([9; 64]));
        assert_eq!(decoded.shielded_outputs.len(), 1);
    }

    #[test]
    fn unknown_overwintered_shape_is_rejected() {
        let tx = base_tx(true, 99, 0xDEAD_BEEF);
        let bytes = tx.encode();
        assert!(matches!(
            Transaction::decode(&bytes, true),
            Err(Error::UnknownTransactionShape { .. })
        ));
    }

    #[test]
    fn coinbase_predicate_matches_single_all_zero_input() {
        let tx = base_tx(false, 1, 0);
        assert!(tx.is_coinbase());
        let mut multi = base_tx(false, 1, 0);
        multi.vin.push(TransactionIn {
            prevout: OutPoint {
                hash: [2; 32],
                n: 1,
            },
            script_sig: vec![],
            sequence: 0,
        });
        assert!(!multi.is_coinbase());
    }

    #[test]
    fn legacy_v2_with_joinsplits_round_trips_with_pubkey_and_sig() {
        use crate::joinsplit::Proof;
        use serde_json::json;

        let mut tx = base_tx(false, 2, 0);
        tx.join_splits.push(JoinSplitDescription {
            vpub_old_zat: 100,
            vpub_new_zat: 0,
            anchor: [1; 32],
            nullifiers: [[2; 32], [3; 32]],
            commitments: [[4; 32], [5; 32]],
            onetime_pubkey: [6; 32],
            random_seed: [7; 32],
            macs: [[8; 32], [9; 32]],
            proof: Proof::Phgr([9u8; 296]),
            ciphertexts: [[10; 601], [11; 601]],
        });
        tx.join_split_pubkey = Some([11; 32]);
        tx.join_split_sig = Some([12; 64]);

        let decoded = round_trip(&tx);
        assert_eq!(decoded.join_splits.len(), 1);
        assert_eq!(decoded.join_split_pubkey, Some([11; 32]));
        assert_eq!(decoded.join_split_sig, Some([12; 64]));
        assert!(decoded.binding_sig.is_none());

        let porcelain = decoded.to_porcelain();
        assert_eq!(porcelain["joinSplitPubKey"], json!(hex::encode([11u8; 32])));
        assert_eq!(porcelain["joinSplitSig"], json!(hex::encode([12u8; 64])));
        let rebuilt = Transaction::from_porcelain(&porcelain).unwrap();
        assert_eq!(rebuilt.encode(), decoded.encode());
        assert_eq!(rebuilt.txid, decoded.txid);
    }

    #[test]
    fn strict_decode_rejects_trailing_bytes() {
        let tx = base_tx(false, 1, 0);
        let mut bytes = tx.encode();
        bytes.push(0xFF);
        assert!(matches!(
            Transaction::decode(&bytes, true),
            Err(Error::StrictLength { .. })
        ));
        assert!(Transaction::decode(&bytes, false).is_ok());
    }
}
