//! Minimal, opaque script handling: ASM disassembly and template classification only.
//! No opcode is ever executed — full script interpretation is an external collaborator
//! this crate does not implement.

use crate::codec::hash160;

const OP_DUP: u8 = 0x76;
const OP_HASH160: u8 = 0xa9;
const OP_EQUALVERIFY: u8 = 0x88;
const OP_EQUAL: u8 = 0x87;
const OP_CHECKSIG: u8 = 0xac;
const OP_RETURN: u8 = 0x6a;
const OP_0: u8 = 0x00;
const OP_1NEGATE: u8 = 0x4f;
const OP_1: u8 = 0x51;
const OP_16: u8 = 0x60;
const OP_PUSHDATA1: u8 = 0x4c;
const OP_PUSHDATA2: u8 = 0x4d;
const OP_PUSHDATA4: u8 = 0x4e;

/// P2PKH/P2PK addresses use this prefix; P2SH uses [`P2SH_PREFIX`].
pub const P2PKH_PREFIX: [u8; 2] = [0x1c, 0xb8];
pub const P2SH_PREFIX: [u8; 2] = [0x1c, 0xbd];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptClass {
    PubKeyHash,
    ScriptHash,
    PubKey,
    NonStandard,
}

impl ScriptClass {
    pub fn rpc_name(&self) -> &'static str {
        match self {
            ScriptClass::PubKeyHash => "pubkeyhash",
            ScriptClass::ScriptHash => "scripthash",
            ScriptClass::PubKey => "pubkey",
            ScriptClass::NonStandard => "nonstandard",
        }
    }
}

/// Best-effort, presentation-only disassembly. Unrecognized opcodes render as
/// `OP_UNKNOWN(0x..)`; this never fails and never executes anything.
pub fn disassemble(script: &[u8]) -> String {
    let mut parts = Vec::new();
    let mut i = 0;
    while i < script.len() {
        let op = script[i];
        i += 1;
        match op {
            0x01..=0x4b => {
                let len = op as usize;
                if i + len > script.len() {
                    parts.push(format!("OP_PUSHBYTES_{len}[truncated]"));
                    break;
                }
                parts.push(format!(
                    "OP_PUSHBYTES_{len} {}",
                    hex::encode(&script[i..i + len])
                ));
                i += len;
            }
            OP_PUSHDATA1 | OP_PUSHDATA2 | OP_PUSHDATA4 => {
                let len_bytes = match op {
                    OP_PUSHDATA1 => 1,
                    OP_PUSHDATA2 => 2,
                    _ => 4,
                };
                if i + len_bytes > script.len() {
                    parts.push("OP_PUSHDATA[truncated]".to_string());
                    break;
                }
                let len = match len_bytes {
                    1 => script[i] as usize,
                    2 => u16::from_le_bytes([script[i], script[i + 1]]) as usize,
                    _ => u32::from_le_bytes(script[i..i + 4].try_into().unwrap()) as usize,
                };
                i += len_bytes;
                if i + len > script.len() {
                    parts.push("OP_PUSHDATA[truncated]".to_string());
                    break;
                }
                parts.push(format!(
                    "OP_PUSHDATA{len_bytes} {}",
                    hex::encode(&script[i..i + len])
                ));
                i += len;
            }
            OP_0 => parts.push("OP_0".to_string()),
            OP_1NEGATE => parts.push("OP_1NEGATE".to_string()),
            n if (OP_1..=OP_16).contains(&n) => parts.push(format!("OP_{}", n - OP_1 + 1)),
            OP_DUP => parts.push("OP_DUP".to_string()),
            OP_HASH160 => parts.push("OP_HASH160".to_string()),
            OP_EQUALVERIFY => parts.push("OP_EQUALVERIFY".to_string()),
            OP_EQUAL => parts.push("OP_EQUAL".to_string()),
            OP_CHECKSIG => parts.push("OP_CHECKSIG".to_string()),
            OP_RETURN => parts.push("OP_RETURN".to_string()),
            other => parts.push(format!("OP_UNKNOWN(0x{other:02x})")),
        }
    }
    parts.join(" ")
}

/// Recognizes the handful of transparent script templates the porcelain form needs for
/// `type`/`reqSigs`/`addresses`. Anything else classifies as [`ScriptClass::NonStandard`].
pub fn classify(script: &[u8]) -> ScriptClass {
    if script.len() == 25
        && script[0] == OP_DUP
        && script[1] == OP_HASH160
        && script[2] == 0x14
        && script[23] == OP_EQUALVERIFY
        && script[24] == OP_CHECKSIG
    {
        return ScriptClass::PubKeyHash;
    }
    if script.len() == 23 && script[0] == OP_HASH160 && script[1] == 0x14 && script[22] == OP_EQUAL
    {
        return ScriptClass::ScriptHash;
    }
    if (script.len() == 35 || script.len() == 67)
        && script[0] as usize == script.len() - 2
        && script[script.len() - 1] == OP_CHECKSIG
    {
        return ScriptClass::PubKey;
    }
    ScriptClass::NonStandard
}

/// `(reqSigs, addresses)` for a classified script, or `None` for `NonStandard`.
pub fn destinations(script: &[u8]) -> Option<(u32, Vec<String>)> {
    match classify(script) {
        ScriptClass::PubKeyHash => {
            let hash: [u8; 20] = script[3..23].try_into().ok()?;
            Some((1, vec![encode_address(&hash, P2PKH_PREFIX)]))
        }
        ScriptClass::ScriptHash => {
            let hash: [u8; 20] = script[2..22].try_into().ok()?;
            Some((1, vec![encode_address(&hash, P2SH_PREFIX)]))
        }
        ScriptClass::PubKey => {
            let pubkey = &script[1..script.len() - 1];
            Some((1, vec![encode_address(&hash160(pubkey), P2PKH_PREFIX)]))
        }
        ScriptClass::NonStandard => None,
    }
}

/// Zcash transparent address: `prefix ++ hash160 ++ checksum`, base58 encoded, where
/// `checksum` is the first 4 bytes of `dbl_sha256(prefix ++ hash160)`.
pub fn encode_address(hash: &[u8; 20], prefix: [u8; 2]) -> String {
    let mut payload = Vec::with_capacity(2 + 20 + 4);
    payload.extend_from_slice(&prefix);
    payload.extend_from_slice(hash);
    let checksum = crate::codec::dbl_sha256(&payload);
    payload.extend_from_slice(&checksum[..4]);
    bs58::encode(payload).into_string()
}
