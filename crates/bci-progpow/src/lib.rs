//! Ethash/ProgPoW verification kernel.
//!
//! This crate is the hashing seam of the consensus core: Keccak primitives,
//! per-epoch light caches, and the ProgPoW inner loop. Callers hand it a
//! Keccak-derived header hash, an 8-byte nonce, a 32-byte mix hash and a
//! big-endian target; it answers whether the claimed work is real.
//!
//! All 256-bit values cross this boundary as big-endian byte arrays. The
//! conversion quirks of the wider system (which stores hashes little-endian)
//! are the caller's business.

pub mod keccak;

mod cache;
mod progpow;

pub use cache::{get_global_epoch_context, EpochContext};
pub use keccak::keccak256;
pub use progpow::{verify_final_progpow_hash, verify_progpow};

/// Number of blocks sharing one epoch context (light cache / DAG).
pub const EPOCH_LENGTH: u32 = 30_000;

/// Epoch index for a block height.
pub fn get_epoch_number(height: u32) -> u32 {
    height / EPOCH_LENGTH
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn epoch_number_boundaries() {
        assert_eq!(get_epoch_number(0), 0);
        assert_eq!(get_epoch_number(29_999), 0);
        assert_eq!(get_epoch_number(30_000), 1);
        assert_eq!(get_epoch_number(90_001), 3);
    }
}
