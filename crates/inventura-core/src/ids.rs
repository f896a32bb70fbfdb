//! Identifier minting.
//!
//! Store ids are `<prefix>-<12 hex>` derived from 16 random bytes through
//! BLAKE3; row keys are shorter and only need to be unique per session.

use rand::RngCore;

pub const ITEM_PREFIX: &str = "itm";
pub const SNAPSHOT_PREFIX: &str = "inv";
pub const USER_PREFIX: &str = "usr";

/// Mint a new store id with the given prefix.
#[must_use]
pub fn new_id(prefix: &str) -> String {
    let mut seed = [0_u8; 16];
    rand::thread_rng().fill_bytes(&mut seed);
    let digest = blake3::hash(&seed).to_hex();
    format!("{prefix}-{}", &digest[..12])
}

/// Ephemeral key for a freshly built row.
#[must_use]
pub fn row_key() -> String {
    format!("r{:08x}", rand::thread_rng().next_u32())
}

/// Random bearer/confirmation token material as lowercase hex.
#[must_use]
pub fn random_hex(bytes: usize) -> String {
    let mut buf = vec![0_u8; bytes];
    rand::thread_rng().fill_bytes(&mut buf);
    buf.iter().fold(String::with_capacity(bytes * 2), |mut out, byte| {
        use std::fmt::Write as _;
        let _ = write!(out, "{byte:02x}");
        out
    })
}
