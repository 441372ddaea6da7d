//! Proof-of-work verification.
//!
//! Three checks, all returning plain booleans: the target range/compare
//! check every header passes through, plus the era-appropriate solution
//! check (Equihash before the ProgPoW fork, ProgPoW after). Diagnostics go
//! to the log; they never participate in the verdict.

use bitcoin::hashes::Hash;
use bitcoin::BlockHash;
use primitive_types::U256;
use tracing::{debug, error};

use crate::blockdata::block::BlockHeader;
use crate::consensus::params::NetworkParams;
use crate::pow::{CompactTarget, Target};

/// Does `hash` satisfy `bits` under the era's target ceiling?
///
/// Rejects malformed encodings (negative, zero, overflow), targets past the
/// era's limit, and hashes above the target, in that order.
pub fn check_target(
    hash: &BlockHash,
    bits: CompactTarget,
    postfork: bool,
    params: &NetworkParams,
) -> bool {
    let target = match Target::from_compact(bits) {
        Ok(target) => target,
        Err(err) => {
            debug!(bits = %bits, %err, "rejecting header with malformed target");
            return false;
        }
    };

    if target > params.pow_limit(postfork) {
        debug!(bits = %bits, postfork, "target above proof-of-work limit");
        return false;
    }

    U256::from_little_endian(&hash.to_byte_array()) <= target.as_u256()
}

/// Validates a pre-ProgPoW header's Equihash solution.
///
/// The Blake2b state is seeded with the network's (n, k) and fed the
/// 108-byte header prefix followed by the full 256-bit nonce; the nonce is
/// not zeroed here, unlike in the ProgPoW preimage.
pub fn check_equihash(header: &BlockHeader, params: &NetworkParams) -> bool {
    match equihash::is_valid_solution(
        params.equihash_n,
        params.equihash_k,
        &header.equihash_input(),
        header.nonce.as_bytes(),
        &header.solution,
    ) {
        Ok(()) => true,
        Err(err) => {
            error!(height = header.height, ?err, "invalid Equihash solution");
            false
        }
    }
}

/// Validates a ProgPoW-era header's solution against the epoch dataset.
///
/// The solution's first 32 bytes are the claimed mix hash; the 8-byte nonce
/// comes from lane 3 of the nonce field; the target crosses the kernel
/// boundary in big-endian byte order.
pub fn check_progpow(header: &BlockHeader, _params: &NetworkParams) -> bool {
    let Some(mix_bytes) = header.solution.get(..32) else {
        error!(
            height = header.height,
            len = header.solution.len(),
            "solution too short to carry a mix hash"
        );
        return false;
    };
    let mix: [u8; 32] = mix_bytes.try_into().expect("sliced to 32 bytes");

    let epoch = bci_progpow::get_epoch_number(header.height);
    let context = bci_progpow::get_global_epoch_context(epoch);

    let header_hash = bci_progpow::keccak256(&header.progpow_input());
    let target = Target::from_compact_lossy(header.bits).to_be_bytes();

    let valid = bci_progpow::verify_progpow(
        &context,
        header.height,
        &header_hash,
        &mix,
        header.nonce.progpow_nonce(),
        &target,
    );
    if !valid {
        error!(height = header.height, epoch, "verify_progpow failed");
    }
    valid
}
