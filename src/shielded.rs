//! Sapling shielded spend and output descriptions (v4 transactions only).

use crate::codec::{Cursor, Decode, Encode};
use crate::error::Result;

/// `(32 + 32 + 32 + 32 + 192 + 64) = 384` bytes on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpendDescription {
    pub cv: [u8; 32],
    pub anchor: [u8; 32],
    pub nullifier: [u8; 32],
    pub rk: [u8; 32],
    pub proof: [u8; 192],
    pub spend_auth_sig: [u8; 64],
}

impl<'a> Decode<'a> for SpendDescription {
    fn decode(cursor: &mut Cursor<'a>) -> Result<Self> {
        Ok(SpendDescription {
            cv: cursor.read_array()?,
            anchor: cursor.read_array()?,
            nullifier: cursor.read_array()?,
            rk: cursor.read_array()?,
            proof: cursor.read_array()?,
            spend_auth_sig: cursor.read_array()?,
        })
    }
}

impl Encode for SpendDescription {
    fn encode(&self, out: &mut Vec<u8>) {
        self.cv.encode(out);
        self.anchor.encode(out);
        self.nullifier.encode(out);
        self.rk.encode(out);
        self.proof.encode(out);
        self.spend_auth_sig.encode(out);
    }
}

/// `(32 + 32 + 32 + 580 + 80 + 192) = 948` bytes on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputDescription {
    pub cv: [u8; 32],
    pub cmu: [u8; 32],
    pub ephemeral_key: [u8; 32],
    pub enc_ciphertext: [u8; 580],
    pub out_ciphertext: [u8; 80],
    pub proof: [u8; 192],
}

impl<'a> Decode<'a> for OutputDescription {
    fn decode(cursor: &mut Cursor<'a>) -> Result<Self> {
        Ok(OutputDescription {
            cv: cursor.read_array()?,
            cmu: cursor.read_array()?,
            ephemeral_key: cursor.read_array()?,
            enc_ciphertext: cursor.read_array()?,
            out_ciphertext: cursor.read_array()?,
            proof: cursor.read_array()?,
        })
    }
}

impl Encode for OutputDescription {
    fn encode(&self, out: &mut Vec<u8>) {
        self.cv.encode(out);
        self.cmu.encode(out);
        self.ephemeral_key.encode(out);
        self.enc_ciphertext.encode(out);
        self.out_ciphertext.encode(out);
        self.proof.encode(out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spend_description_is_exactly_384_bytes() {
        let spend = SpendDescription {
            cv: [1; 32],
            anchor: [2; 32],
            nullifier: [3; 32],
            rk: [4; 32],
            proof: [5; 192],
            spend_auth_sig: [6; 64],
        };
        assert_eq!(spend.to_bytes().len(), 384);
        let bytes = spend.to_bytes();
        let mut cursor = Cursor::new(&bytes);
        assert_eq!(SpendDescription::decode(&mut cursor).unwrap(), spend);
    }

    #[test]
    fn output_description_is_exactly_948_bytes() {
        let output = OutputDescription {
            cv: [1; 32],
            cmu: [2; 32],
            ephemeral_key: [3; 32],
            enc_ciphertext: [4; 580],
            out_ciphertext: [5; 80],
            proof: [6; 192],
        };
        assert_eq!(output.to_bytes().len(), 948);
        let bytes = output.to_bytes();
        let mut cursor = Cursor::new(&bytes);
        assert_eq!(OutputDescription::decode(&mut cursor).unwrap(), output);
    }
}
