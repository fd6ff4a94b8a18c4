use thiserror::Error;

/// Everything that can go wrong decoding, encoding, or converting porcelain.
///
/// No operation in this crate panics on attacker-controlled input; every failure mode
/// surfaces here instead.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum Error {
    #[error("truncated input: needed {needed} more byte(s), {available} available")]
    Truncated { needed: usize, available: usize },

    #[error(
        "unknown transaction shape: overwintered={overwintered} version={version} versiongroupid=0x{versiongroupid:08x}"
    )]
    UnknownTransactionShape {
        overwintered: bool,
        version: u32,
        versiongroupid: u32,
    },

    #[error("strict decode left {trailing} trailing byte(s) of {total} total")]
    StrictLength { trailing: usize, total: usize },

    #[error("porcelain validation failed: {0}")]
    Porcelain(String),

    #[error("precondition violated: {0}")]
    Precondition(&'static str),
}

pub type Result<T> = std::result::Result<T, Error>;
