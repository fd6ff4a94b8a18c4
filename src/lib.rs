//! Bidirectional codec between Zcash consensus-serialized block/transaction bytes and a
//! porcelain object form mirroring the reference node's RPC JSON.
//!
//! The wire-format half (decode/encode) lives in [`block`], [`transaction`],
//! [`shielded`], [`joinsplit`] and [`transparent`], built on the cursor and trait
//! primitives in [`codec`]. The JSON half lives in [`porcelain`]. [`script`] holds a
//! minimal, opaque-by-design ASM/classification helper; no opcode is ever executed.

pub mod block;
pub mod codec;
pub mod error;
pub mod joinsplit;
pub mod porcelain;
pub mod script;
pub mod shielded;
pub mod transaction;
pub mod transparent;

pub use block::{Block, COIN, HEADER_BYTES};
pub use codec::{dbl_sha256, hash_from_hex, hash_to_hex, hash160, merkle_path, merkle_root};
pub use error::{Error, Result};
pub use porcelain::PorcelainMode;
pub use transaction::Transaction;
