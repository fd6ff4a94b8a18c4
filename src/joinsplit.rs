//! Sprout-era JoinSplit descriptions (`version >= 2`), including the PHGR/Groth proof
//! split that depends on the enclosing transaction's shape.

use crate::codec::{Cursor, Decode, Encode};
use crate::error::{Error, Result};
use crate::transaction::TxContext;

pub const SAPLING_TX_VERSION: u32 = 4;

/// Eight compressed curve-group elements with tagged y-sign bits; fixed width 296 bytes,
/// captured verbatim and never cryptographically interpreted.
pub type PhgrProof = [u8; 296];
/// A single Groth16 proof, 192 bytes, as used by Sapling-onward shielded sections.
pub type GrothProof = [u8; 192];

/// Which proof encoding a JoinSplit uses. The choice is a function of the enclosing
/// transaction's version, not of the JoinSplit bytes themselves — see [`Proof::select`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Proof {
    Phgr(PhgrProof),
    Groth(GrothProof),
}

impl Proof {
    /// The enclosing transaction's shape selects Groth from Sapling onward; everything
    /// else (pre-Sapling transactions, including Overwinter v3) uses PHGR.
    pub fn select(ctx: TxContext) -> ProofKind {
        if ctx.is_sapling() {
            ProofKind::Groth
        } else {
            ProofKind::Phgr
        }
    }

    /// Porcelain never records which proof encoding was used (both render as a hex
    /// string of the raw bytes). When reconstructing without transaction context, the
    /// byte length disambiguates: 192 bytes can only be Groth, anything else is PHGR.
    pub fn from_porcelain_bytes(bytes: &[u8], kind: ProofKind) -> Result<Self> {
        match kind {
            ProofKind::Groth => {
                let arr: GrothProof = bytes.try_into().map_err(|_| {
                    Error::Porcelain(format!(
                        "groth proof must be {} bytes, got {}",
                        std::mem::size_of::<GrothProof>(),
                        bytes.len()
                    ))
                })?;
                Ok(Proof::Groth(arr))
            }
            ProofKind::Phgr => {
                let arr: PhgrProof = bytes.try_into().map_err(|_| {
                    Error::Porcelain(format!(
                        "phgr proof must be {} bytes, got {}",
                        std::mem::size_of::<PhgrProof>(),
                        bytes.len()
                    ))
                })?;
                Ok(Proof::Phgr(arr))
            }
        }
    }

    pub fn bytes(&self) -> &[u8] {
        match self {
            Proof::Phgr(p) => p.as_slice(),
            Proof::Groth(p) => p.as_slice(),
        }
    }

    fn decode(cursor: &mut Cursor<'_>, kind: ProofKind) -> Result<Self> {
        match kind {
            ProofKind::Phgr => Ok(Proof::Phgr(cursor.read_array()?)),
            ProofKind::Groth => Ok(Proof::Groth(cursor.read_array()?)),
        }
    }

    fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(self.bytes());
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProofKind {
    Phgr,
    Groth,
}

/// A single JoinSplit ciphertext, fixed width 601 bytes.
pub type JoinSplitCiphertext = [u8; 601];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinSplitDescription {
    pub vpub_old_zat: i64,
    pub vpub_new_zat: i64,
    pub anchor: [u8; 32],
    pub nullifiers: [[u8; 32]; 2],
    pub commitments: [[u8; 32]; 2],
    pub onetime_pubkey: [u8; 32],
    pub random_seed: [u8; 32],
    pub macs: [[u8; 32]; 2],
    pub proof: Proof,
    pub ciphertexts: [JoinSplitCiphertext; 2],
}

impl JoinSplitDescription {
    /// `ctx` is the enclosing transaction's shape and selects the proof encoding (§4.5);
    /// this is the one record type in this crate whose decode cannot be expressed through
    /// the plain [`Decode`] trait, since the trait carries no context.
    pub fn decode(cursor: &mut Cursor<'_>, ctx: TxContext) -> Result<Self> {
        let vpub_old_zat = cursor.read_i64_le()?;
        let vpub_new_zat = cursor.read_i64_le()?;
        let anchor = cursor.read_array()?;
        let nullifiers = [cursor.read_array()?, cursor.read_array()?];
        let commitments = [cursor.read_array()?, cursor.read_array()?];
        let onetime_pubkey = cursor.read_array()?;
        let random_seed = cursor.read_array()?;
        let macs = [cursor.read_array()?, cursor.read_array()?];
        let proof = Proof::decode(cursor, Proof::select(ctx))?;
        let ciphertexts = [cursor.read_array()?, cursor.read_array()?];
        Ok(JoinSplitDescription {
            vpub_old_zat,
            vpub_new_zat,
            anchor,
            nullifiers,
            commitments,
            onetime_pubkey,
            random_seed,
            macs,
            proof,
            ciphertexts,
        })
    }
}

impl Encode for JoinSplitDescription {
    fn encode(&self, out: &mut Vec<u8>) {
        self.vpub_old_zat.encode(out);
        self.vpub_new_zat.encode(out);
        self.anchor.encode(out);
        self.nullifiers[0].encode(out);
        self.nullifiers[1].encode(out);
        self.commitments[0].encode(out);
        self.commitments[1].encode(out);
        self.onetime_pubkey.encode(out);
        self.random_seed.encode(out);
        self.macs[0].encode(out);
        self.macs[1].encode(out);
        self.proof.encode(out);
        self.ciphertexts[0].encode(out);
        self.ciphertexts[1].encode(out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(proof: Proof) -> JoinSplitDescription {
        JoinSplitDescription {
            vpub_old_zat: 100,
            vpub_new_zat: 0,
            anchor: [1; 32],
            nullifiers: [[2; 32], [3; 32]],
            commitments: [[4; 32], [5; 32]],
            onetime_pubkey: [6; 32],
            random_seed: [7; 32],
            macs: [[8; 32], [9; 32]],
            proof,
            ciphertexts: [[10; 601], [11; 601]],
        }
    }

    #[test]
    fn phgr_proof_selected_pre_sapling() {
        assert_eq!(
            Proof::select(TxContext { overwintered: false, version: 2 }),
            ProofKind::Phgr
        );
        assert_eq!(
            Proof::select(TxContext { overwintered: true, version: 3 }),
            ProofKind::Phgr
        );
    }

    #[test]
    fn groth_proof_selected_for_sapling_and_later() {
        assert_eq!(
            Proof::select(TxContext { overwintered: true, version: 4 }),
            ProofKind::Groth
        );
    }

    #[test]
    fn joinsplit_with_phgr_round_trips() {
        let js = sample(Proof::Phgr([9u8; 296]));
        let mut bytes = Vec::new();
        js.encode(&mut bytes);
        let mut cursor = Cursor::new(&bytes);
        let ctx = TxContext { overwintered: false, version: 2 };
        let decoded = JoinSplitDescription::decode(&mut cursor, ctx).unwrap();
        assert_eq!(decoded, js);
    }

    #[test]
    fn joinsplit_with_groth_round_trips() {
        let js = sample(Proof::Groth([9u8; 192]));
        let mut bytes = Vec::new();
        js.encode(&mut bytes);
        let mut cursor = Cursor::new(&bytes);
        let ctx = TxContext { overwintered: true, version: 4 };
        let decoded = JoinSplitDescription::decode(&mut cursor, ctx).unwrap();
        assert_eq!(decoded, js);
    }

    #[test]
    fn porcelain_proof_length_heuristic_disambiguates() {
        let groth = Proof::from_porcelain_bytes(&[0u8; 192], ProofKind::Groth).unwrap();
        assert!(matches!(groth, Proof::Groth(_)));
        let phgr = Proof::from_porcelain_bytes(&[0u8; 296], ProofKind::Phgr).unwrap();
        assert!(matches!(phgr, Proof::Phgr(_)));
    }
}
