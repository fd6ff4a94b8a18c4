//! Typed-object <-> `serde_json::Value` conversion (C6), mirroring the shape of the
//! reference Zcash node's RPC JSON.

use serde_json::{json, Map, Value};
use tracing::instrument;

use crate::block::{Block, COIN, GENESIS_PREVIOUSBLOCKHASH};
use crate::codec::{hash_from_hex, hash_to_hex, Encode};
use crate::error::{Error, Result};
use crate::joinsplit::{JoinSplitDescription, Proof, ProofKind};
use crate::script;
use crate::shielded::{OutputDescription, SpendDescription};
use crate::transaction::Transaction;
use crate::transparent::{OutPoint, TransactionIn, TransactionOut};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PorcelainMode {
    /// Fully expanded `tx` (each transaction rendered as full porcelain).
    Default,
    /// `tx` is a list of txid hex strings.
    Min,
    /// No `tx`, no `size`.
    Header,
}

fn coins(zats: i64) -> f64 {
    zats as f64 / COIN as f64
}

fn field<'a>(value: &'a Value, key: &str) -> Result<&'a Value> {
    value
        .get(key)
        .ok_or_else(|| Error::Porcelain(format!("missing required field `{key}`")))
}

fn str_field<'a>(value: &'a Value, key: &str) -> Result<&'a str> {
    field(value, key)?
        .as_str()
        .ok_or_else(|| Error::Porcelain(format!("field `{key}` must be a string")))
}

fn u64_field(value: &Value, key: &str) -> Result<u64> {
    field(value, key)?
        .as_u64()
        .ok_or_else(|| Error::Porcelain(format!("field `{key}` must be an unsigned integer")))
}

fn i64_field(value: &Value, key: &str) -> Result<i64> {
    field(value, key)?
        .as_i64()
        .ok_or_else(|| Error::Porcelain(format!("field `{key}` must be a signed integer")))
}

fn bool_field(value: &Value, key: &str) -> Result<bool> {
    field(value, key)?
        .as_bool()
        .ok_or_else(|| Error::Porcelain(format!("field `{key}` must be a boolean")))
}

fn hex_bytes_field(value: &Value, key: &str) -> Result<Vec<u8>> {
    let s = str_field(value, key)?;
    hex::decode(s).map_err(|e| Error::Porcelain(format!("field `{key}` has invalid hex: {e}")))
}

fn hex_array_field<const N: usize>(value: &Value, key: &str) -> Result<[u8; N]> {
    let bytes = hex_bytes_field(value, key)?;
    bytes
        .try_into()
        .map_err(|v: Vec<u8>| Error::Porcelain(format!("field `{key}` must be {N} bytes, got {}", v.len())))
}

fn reversed_hash_field(value: &Value, key: &str) -> Result<[u8; 32]> {
    hash_from_hex(str_field(value, key)?)
}

impl Block {
    #[instrument(level = "debug", skip(self))]
    pub fn to_porcelain(&self, mode: PorcelainMode) -> Value {
        let mut out = Map::new();
        out.insert("hash".to_string(), json!(hash_to_hex(&self.hash)));
        out.insert("version".to_string(), json!(self.version));
        if self.previousblockhash != GENESIS_PREVIOUSBLOCKHASH {
            out.insert(
                "previousblockhash".to_string(),
                json!(hash_to_hex(&self.previousblockhash)),
            );
        }
        out.insert("merkleroot".to_string(), json!(hash_to_hex(&self.merkleroot)));
        out.insert(
            "finalsaplingroot".to_string(),
            json!(hash_to_hex(&self.finalsaplingroot)),
        );
        out.insert("time".to_string(), json!(self.time));
        out.insert("bits".to_string(), json!(format!("{:x}", self.bits)));
        out.insert("difficulty".to_string(), json!(self.difficulty()));
        out.insert("nonce".to_string(), json!(hex::encode(self.nonce)));
        out.insert("solution".to_string(), json!(hex::encode(&self.solution)));
        insert_chain_context_fields(&mut out);

        match mode {
            PorcelainMode::Header => {}
            PorcelainMode::Min => {
                if let Some(tx) = &self.tx {
                    let txids: Vec<Value> = tx.iter().map(|t| json!(hash_to_hex(&t.txid))).collect();
                    out.insert("tx".to_string(), Value::Array(txids));
                }
                if let Some(size) = self.size {
                    out.insert("size".to_string(), json!(size));
                }
            }
            PorcelainMode::Default => {
                if let Some(tx) = &self.tx {
                    let rendered: Vec<Value> = tx.iter().map(|t| t.to_porcelain()).collect();
                    out.insert("tx".to_string(), Value::Array(rendered));
                }
                if let Some(size) = self.size {
                    out.insert("size".to_string(), json!(size));
                }
            }
        }

        Value::Object(out)
    }

    #[instrument(level = "debug", skip(value))]
    pub fn from_porcelain(value: &Value) -> Result<Block> {
        let version = i64_field(value, "version")? as i32;
        let previousblockhash = match value.get("previousblockhash").and_then(Value::as_str) {
            Some(s) => hash_from_hex(s)?,
            None => GENESIS_PREVIOUSBLOCKHASH,
        };
        let finalsaplingroot = reversed_hash_field(value, "finalsaplingroot")?;
        let time = u64_field(value, "time")? as u32;
        let bits = u32::from_str_radix(str_field(value, "bits")?, 16)
            .map_err(|e| Error::Porcelain(format!("invalid `bits` hex: {e}")))?;
        let nonce = hex_array_field::<32>(value, "nonce")?;
        let solution = hex_bytes_field(value, "solution")?;

        let tx = match value.get("tx") {
            Some(Value::Array(items)) => {
                let mut decoded = Vec::with_capacity(items.len());
                for item in items {
                    match item {
                        Value::String(txid_hex) => {
                            // `min` mode porcelain only carries txids; a block built from
                            // that alone cannot reconstruct transaction bodies.
                            return Err(Error::Porcelain(format!(
                                "cannot reconstruct block from `min` porcelain (txid {txid_hex})"
                            )));
                        }
                        full => decoded.push(Transaction::from_porcelain(full)?),
                    }
                }
                Some(decoded)
            }
            Some(_) => return Err(Error::Porcelain("`tx` must be an array".to_string())),
            None => None,
        };

        let mut block = Block {
            version,
            previousblockhash,
            merkleroot: [0u8; 32],
            finalsaplingroot,
            time,
            bits,
            nonce,
            solution,
            hash: [0u8; 32],
            size: None,
            tx,
        };

        block.merkleroot = match &block.tx {
            Some(tx) if !tx.is_empty() => {
                let leaves: Vec<[u8; 32]> = tx.iter().map(|t| t.txid).collect();
                crate::codec::merkle_root(&leaves)?
            }
            _ => match value.get("merkleroot").and_then(Value::as_str) {
                Some(s) => hash_from_hex(s)?,
                None => return Err(Error::Porcelain("missing required field `merkleroot`".to_string())),
            },
        };

        let mut header_bytes = Vec::new();
        block.version.encode(&mut header_bytes);
        block.previousblockhash.encode(&mut header_bytes);
        block.merkleroot.encode(&mut header_bytes);
        block.finalsaplingroot.encode(&mut header_bytes);
        block.time.encode(&mut header_bytes);
        block.bits.encode(&mut header_bytes);
        block.nonce.encode(&mut header_bytes);
        crate::codec::VarBytes(block.solution.clone()).encode(&mut header_bytes);
        block.hash = crate::codec::dbl_sha256(&header_bytes);

        if block.tx.is_some() {
            block.size = Some(header_bytes.len() + {
                let mut tx_bytes = Vec::new();
                crate::codec::encode_vector(&mut tx_bytes, block.tx.as_ref().unwrap());
                tx_bytes.len()
            });
        }

        Ok(block)
    }
}

impl Transaction {
    #[instrument(level = "debug", skip(self))]
    pub fn to_porcelain(&self) -> Value {
        let mut out = Map::new();
        out.insert("txid".to_string(), json!(hash_to_hex(&self.txid)));
        out.insert("overwintered".to_string(), json!(self.overwintered));
        out.insert("version".to_string(), json!(self.version));
        if self.overwintered {
            out.insert(
                "versiongroupid".to_string(),
                json!(format!("{:08x}", self.version_group_id)),
            );
        }
        out.insert(
            "vin".to_string(),
            Value::Array(self.vin.iter().map(vin_porcelain).collect()),
        );
        out.insert(
            "vout".to_string(),
            Value::Array(
                self.vout
                    .iter()
                    .enumerate()
                    .map(|(n, o)| vout_porcelain(o, n as u64))
                    .collect(),
            ),
        );
        out.insert("locktime".to_string(), json!(self.lock_time));
        if self.overwintered {
            out.insert("expiryheight".to_string(), json!(self.expiry_height));
        }

        if self.is_sapling() {
            out.insert("valueBalance".to_string(), json!(coins(self.value_balance_zat)));
            out.insert("valueBalanceZat".to_string(), json!(self.value_balance_zat));
            out.insert(
                "vShieldedSpend".to_string(),
                Value::Array(self.shielded_spends.iter().map(spend_porcelain).collect()),
            );
            out.insert(
                "vShieldedOutput".to_string(),
                Value::Array(self.shielded_outputs.iter().map(output_porcelain).collect()),
            );
        }

        if self.version >= 2 {
            out.insert(
                "vjoinsplit".to_string(),
                Value::Array(self.join_splits.iter().map(joinsplit_porcelain).collect()),
            );
            if let Some(pubkey) = &self.join_split_pubkey {
                out.insert("joinSplitPubKey".to_string(), json!(hex::encode(pubkey)));
            }
            if let Some(sig) = &self.join_split_sig {
                out.insert("joinSplitSig".to_string(), json!(hex::encode(sig)));
            }
        }

        if let Some(sig) = &self.binding_sig {
            out.insert("bindingSig".to_string(), json!(hex::encode(sig)));
        }

        Value::Object(out)
    }

    #[instrument(level = "debug", skip(value))]
    pub fn from_porcelain(value: &Value) -> Result<Transaction> {
        let overwintered = bool_field(value, "overwintered")?;
        let version = u64_field(value, "version")? as u32;
        let ctx = crate::transaction::TxContext { overwintered, version };
        let version_group_id = if overwintered {
            u32::from_str_radix(str_field(value, "versiongroupid")?, 16)
                .map_err(|e| Error::Porcelain(format!("invalid versiongroupid hex: {e}")))?
        } else {
            0
        };

        let vin = match field(value, "vin")? {
            Value::Array(items) => items.iter().map(vin_from_porcelain).collect::<Result<Vec<_>>>()?,
            _ => return Err(Error::Porcelain("`vin` must be an array".to_string())),
        };
        let vout = match field(value, "vout")? {
            Value::Array(items) => items.iter().map(vout_from_porcelain).collect::<Result<Vec<_>>>()?,
            _ => return Err(Error::Porcelain("`vout` must be an array".to_string())),
        };

        let lock_time = u64_field(value, "locktime")? as u32;
        let expiry_height = if overwintered {
            u64_field(value, "expiryheight")? as u32
        } else {
            0
        };

        let (value_balance_zat, shielded_spends, shielded_outputs) = if ctx.is_sapling() {
            let balance = i64_field(value, "valueBalanceZat")?;
            let spends = match value.get("vShieldedSpend") {
                Some(Value::Array(items)) => {
                    items.iter().map(spend_from_porcelain).collect::<Result<Vec<_>>>()?
                }
                _ => Vec::new(),
            };
            let outputs = match value.get("vShieldedOutput") {
                Some(Value::Array(items)) => {
                    items.iter().map(output_from_porcelain).collect::<Result<Vec<_>>>()?
                }
                _ => Vec::new(),
            };
            (balance, spends, outputs)
        } else {
            (0, Vec::new(), Vec::new())
        };

        let proof_kind = Proof::select(ctx);
        let join_splits = match value.get("vjoinsplit") {
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| joinsplit_from_porcelain(item, proof_kind))
                .collect::<Result<Vec<_>>>()?,
            _ => Vec::new(),
        };
        let (join_split_pubkey, join_split_sig) = if !join_splits.is_empty() {
            (
                Some(hex_array_field::<32>(value, "joinSplitPubKey")?),
                Some(hex_array_field::<64>(value, "joinSplitSig")?),
            )
        } else {
            (None, None)
        };

        let binding_sig = match value.get("bindingSig").and_then(Value::as_str) {
            Some(s) => Some(
                hex::decode(s)
                    .map_err(|e| Error::Porcelain(format!("invalid bindingSig hex: {e}")))?
                    .try_into()
                    .map_err(|_| Error::Porcelain("bindingSig must be 64 bytes".to_string()))?,
            ),
            None => None,
        };

        Transaction::validate_shape(ctx, version_group_id)?;

        let mut tx = Transaction {
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
            txid: [0u8; 32],
            raw_bytes: Vec::new(),
        };

        let raw_bytes = tx.encode();
        tx.txid = crate::codec::dbl_sha256(&raw_bytes);
        tx.raw_bytes = raw_bytes;
        Ok(tx)
    }
}

/// Fields the reference RPC only fills in with full-chain context (confirmations, chain
/// height, cumulative work, the shielded commitment-tree anchor, the next block, ...).
/// A decoder working from raw bytes alone has none of that, so these always render as
/// `null` here; `from_porcelain` accepts and ignores them rather than requiring them.
fn insert_chain_context_fields(out: &mut Map<String, Value>) {
    for key in [
        "confirmations",
        "height",
        "chainwork",
        "anchor",
        "chainhistoryroot",
        "mediantime",
        "nextblockhash",
        "valuePools",
    ] {
        out.insert(key.to_string(), Value::Null);
    }
}

fn vin_porcelain(txin: &TransactionIn) -> Value {
    if txin.is_coinbase() {
        json!({
            "coinbase": hex::encode(&txin.script_sig),
            "sequence": txin.sequence,
        })
    } else {
        json!({
            "txid": hash_to_hex(&txin.prevout.hash),
            "vout": txin.prevout.n,
            "scriptSig": {
                "asm": script::disassemble(&txin.script_sig),
                "hex": hex::encode(&txin.script_sig),
            },
            "sequence": txin.sequence,
        })
    }
}

fn vin_from_porcelain(value: &Value) -> Result<TransactionIn> {
    if let Some(coinbase_hex) = value.get("coinbase").and_then(Value::as_str) {
        let script_sig = hex::decode(coinbase_hex)
            .map_err(|e| Error::Porcelain(format!("invalid coinbase hex: {e}")))?;
        let sequence = u64_field(value, "sequence")? as u32;
        return Ok(TransactionIn {
            prevout: OutPoint {
                hash: crate::transparent::COINBASE_PREVOUT_HASH,
                n: crate::transparent::COINBASE_PREVOUT_N,
            },
            script_sig,
            sequence,
        });
    }
    let hash = reversed_hash_field(value, "txid")?;
    let n = u64_field(value, "vout")? as u32;
    let script_sig_hex = str_field(field(value, "scriptSig")?, "hex")?;
    let script_sig =
        hex::decode(script_sig_hex).map_err(|e| Error::Porcelain(format!("invalid scriptSig hex: {e}")))?;
    let sequence = u64_field(value, "sequence")? as u32;
    Ok(TransactionIn {
        prevout: OutPoint { hash, n },
        script_sig,
        sequence,
    })
}

fn vout_porcelain(txout: &TransactionOut, n: u64) -> Value {
    let mut script_pub_key = json!({
        "asm": script::disassemble(&txout.script_pub_key),
        "hex": hex::encode(&txout.script_pub_key),
    });
    if let Some((req_sigs, addresses)) = script::destinations(&txout.script_pub_key) {
        let class = script::classify(&txout.script_pub_key);
        let obj = script_pub_key.as_object_mut().unwrap();
        obj.insert("type".to_string(), json!(class.rpc_name()));
        obj.insert("reqSigs".to_string(), json!(req_sigs));
        obj.insert("addresses".to_string(), json!(addresses));
    } else {
        script_pub_key
            .as_object_mut()
            .unwrap()
            .insert("type".to_string(), json!(script::ScriptClass::NonStandard.rpc_name()));
    }

    json!({
        "value": coins(txout.value),
        "valueZat": txout.value,
        "valueSat": txout.value,
        "n": n,
        "scriptPubKey": script_pub_key,
    })
}

fn vout_from_porcelain(value: &Value) -> Result<TransactionOut> {
    let script_pub_key = field(value, "scriptPubKey")?;
    let hex_str = str_field(script_pub_key, "hex")?;
    let script_pub_key_bytes =
        hex::decode(hex_str).map_err(|e| Error::Porcelain(format!("invalid scriptPubKey hex: {e}")))?;
    let value_zat = i64_field(value, "valueZat")?;
    Ok(TransactionOut {
        value: value_zat,
        script_pub_key: script_pub_key_bytes,
    })
}

fn spend_porcelain(spend: &SpendDescription) -> Value {
    json!({
        "cv": hex::encode(spend.cv),
        "anchor": hex::encode(spend.anchor),
        "nullifier": hex::encode(spend.nullifier),
        "rk": hex::encode(spend.rk),
        "proof": hex::encode(spend.proof),
        "spendAuthSig": hex::encode(spend.spend_auth_sig),
    })
}

fn spend_from_porcelain(value: &Value) -> Result<SpendDescription> {
    Ok(SpendDescription {
        cv: hex_array_field(value, "cv")?,
        anchor: hex_array_field(value, "anchor")?,
        nullifier: hex_array_field(value, "nullifier")?,
        rk: hex_array_field(value, "rk")?,
        proof: hex_array_field(value, "proof")?,
        spend_auth_sig: hex_array_field(value, "spendAuthSig")?,
    })
}

fn output_porcelain(output: &OutputDescription) -> Value {
    json!({
        "cv": hex::encode(output.cv),
        "cmu": hex::encode(output.cmu),
        "ephemeralKey": hex::encode(output.ephemeral_key),
        "encCiphertext": hex::encode(output.enc_ciphertext),
        "outCiphertext": hex::encode(output.out_ciphertext),
        "proof": hex::encode(output.proof),
    })
}

fn output_from_porcelain(value: &Value) -> Result<OutputDescription> {
    Ok(OutputDescription {
        cv: hex_array_field(value, "cv")?,
        cmu: hex_array_field(value, "cmu")?,
        ephemeral_key: hex_array_field(value, "ephemeralKey")?,
        enc_ciphertext: hex_array_field(value, "encCiphertext")?,
        out_ciphertext: hex_array_field(value, "outCiphertext")?,
        proof: hex_array_field(value, "proof")?,
    })
}

fn joinsplit_porcelain(js: &JoinSplitDescription) -> Value {
    json!({
        "vpub_old": coins(js.vpub_old_zat),
        "vpub_oldZat": js.vpub_old_zat,
        "vpub_new": coins(js.vpub_new_zat),
        "vpub_newZat": js.vpub_new_zat,
        "anchor": hex::encode(js.anchor),
        "nullifiers": [hex::encode(js.nullifiers[0]), hex::encode(js.nullifiers[1])],
        "commitments": [hex::encode(js.commitments[0]), hex::encode(js.commitments[1])],
        "onetimePubKey": hex::encode(js.onetime_pubkey),
        "randomSeed": hex::encode(js.random_seed),
        "macs": [hex::encode(js.macs[0]), hex::encode(js.macs[1])],
        "proof": hex::encode(js.proof.bytes()),
        "ciphertexts": [hex::encode(js.ciphertexts[0]), hex::encode(js.ciphertexts[1])],
    })
}

fn joinsplit_from_porcelain(value: &Value, kind: ProofKind) -> Result<JoinSplitDescription> {
    let nullifiers = hex_array_pair(value, "nullifiers")?;
    let commitments = hex_array_pair(value, "commitments")?;
    let macs = hex_array_pair(value, "macs")?;
    let ciphertexts: [crate::joinsplit::JoinSplitCiphertext; 2] = {
        let arr = field(value, "ciphertexts")?
            .as_array()
            .ok_or_else(|| Error::Porcelain("`ciphertexts` must be an array".to_string()))?;
        if arr.len() != 2 {
            return Err(Error::Porcelain("`ciphertexts` must have exactly 2 entries".to_string()));
        }
        let decode_one = |v: &Value| -> Result<crate::joinsplit::JoinSplitCiphertext> {
            let s = v
                .as_str()
                .ok_or_else(|| Error::Porcelain("ciphertext entry must be a string".to_string()))?;
            hex::decode(s)
                .map_err(|e| Error::Porcelain(format!("invalid ciphertext hex: {e}")))?
                .try_into()
                .map_err(|_| Error::Porcelain("ciphertext must be 601 bytes".to_string()))
        };
        [decode_one(&arr[0])?, decode_one(&arr[1])?]
    };
    let proof_hex = str_field(value, "proof")?;
    let proof_bytes =
        hex::decode(proof_hex).map_err(|e| Error::Porcelain(format!("invalid proof hex: {e}")))?;
    let proof = Proof::from_porcelain_bytes(&proof_bytes, kind)?;

    Ok(JoinSplitDescription {
        vpub_old_zat: i64_field(value, "vpub_oldZat")?,
        vpub_new_zat: i64_field(value, "vpub_newZat")?,
        anchor: hex_array_field(value, "anchor")?,
        nullifiers,
        commitments,
        onetime_pubkey: hex_array_field(value, "onetimePubKey")?,
        random_seed: hex_array_field(value, "randomSeed")?,
        macs,
        proof,
        ciphertexts,
    })
}

fn hex_array_pair(value: &Value, key: &str) -> Result<[[u8; 32]; 2]> {
    let arr = field(value, key)?
        .as_array()
        .ok_or_else(|| Error::Porcelain(format!("`{key}` must be an array")))?;
    if arr.len() != 2 {
        return Err(Error::Porcelain(format!("`{key}` must have exactly 2 entries")));
    }
    let decode_one = |v: &Value| -> Result<[u8; 32]> {
        let s = v
            .as_str()
            .ok_or_else(|| Error::Porcelain(format!("`{key}` entry must be a string")))?;
        hex::decode(s)
            .map_err(|e| Error::Porcelain(format!("invalid `{key}` hex: {e}")))?
            .try_into()
            .map_err(|_| Error::Porcelain(format!("`{key}` entry must be 32 bytes")))
    };
    Ok([decode_one(&arr[0])?, decode_one(&arr[1])?])
}
