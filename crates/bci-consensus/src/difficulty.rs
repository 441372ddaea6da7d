//! Difficulty retargeting.
//!
//! Two retargeting algorithms coexist. Pre-BCI heights use Bitcoin's
//! every-2016-blocks retarget with 4x damping; post-BCI heights use a
//! sliding-window average over the last 30 targets, driven by the
//! median-time-past of the window's endpoints and recomputed every block.
//! Between the fork and a filled window sit two fixed bootstrap regimes.
//!
//! The arithmetic wraps modulo 2^256, matching the deployed 256-bit
//! integers. Operation order is consensus-critical: the windowed path
//! divides before multiplying, the legacy path multiplies before dividing.
//! They are not interchangeable.

use primitive_types::U256;

use crate::blockdata::block::BlockHeader;
use crate::chain::BlockIndex;
use crate::consensus::params::NetworkParams;
use crate::pow::{CompactTarget, Target};

/// Compact target the block after `prev` must carry.
pub fn next_required_bits<I: BlockIndex + ?Sized>(
    prev: &I,
    candidate: &BlockHeader,
    params: &NetworkParams,
) -> CompactTarget {
    let height = prev.height() + 1;
    let postfork = height >= params.bci_height;
    let pow_limit_bits = params.pow_limit(postfork).to_compact();

    if !postfork {
        return legacy_next_bits(prev, candidate, params);
    }

    // The first blocks after the premine run at the ceiling so the retarget
    // cannot panic while history is this short.
    if height < params.bci_height + params.bci_premine_window + 10 {
        return pow_limit_bits;
    }

    // Fixed bootstrap target until the averaging window has enough samples.
    if height < params.bci_height + params.bci_premine_window + params.pow_averaging_window {
        return params.pow_limit_start.to_compact();
    }

    let mut total = U256::zero();
    let mut cursor = Some(prev);
    for _ in 0..params.pow_averaging_window {
        match cursor {
            Some(entry) => {
                let (sum, _) =
                    total.overflowing_add(Target::from_compact_lossy(entry.bits()).as_u256());
                total = sum;
                cursor = entry.prev();
            }
            None => break,
        }
    }

    // `first` is the block just below the window; a chain too short to
    // provide it keeps the ceiling.
    let Some(first) = cursor else {
        return pow_limit_bits;
    };

    let average = Target::new(total / U256::from(params.pow_averaging_window));
    windowed_retarget(
        average,
        prev.median_time_past(),
        first.median_time_past(),
        params,
    )
}

/// Digishield-style retarget over the averaged window target.
///
/// The observed timespan between the window endpoints' medians is clamped
/// into the configured band, then scaled onto the average: dividing by the
/// ideal window duration first keeps the product inside 256 bits for any
/// in-range average.
fn windowed_retarget(
    average: Target,
    last_median_time: i64,
    first_median_time: i64,
    params: &NetworkParams,
) -> CompactTarget {
    let actual_timespan = (last_median_time - first_median_time)
        .clamp(params.min_actual_timespan(), params.max_actual_timespan());

    let pow_limit = params.pow_limit_postfork.as_u256();
    let scaled = average.as_u256() / U256::from(params.averaging_window_timespan() as u64);
    let (mut next, _) = scaled.overflowing_mul(U256::from(actual_timespan as u64));

    if next > pow_limit {
        next = pow_limit;
    }
    Target::new(next).to_compact()
}

/// Bitcoin-era retarget selection for pre-BCI heights.
fn legacy_next_bits<I: BlockIndex + ?Sized>(
    prev: &I,
    candidate: &BlockHeader,
    params: &NetworkParams,
) -> CompactTarget {
    let pow_limit_bits = params.pow_limit(false).to_compact();
    let interval = params.difficulty_adjustment_interval();

    if (prev.height() + 1) % interval != 0 {
        if params.allow_min_difficulty {
            // Testnet rule: a block arriving more than two spacings late may
            // carry minimum difficulty.
            if i64::from(candidate.time)
                > prev.block_time() + 2 * params.pow_target_spacing as i64
            {
                return pow_limit_bits;
            }
            // Otherwise return the last non-special target. The walk stops
            // on an interval boundary even if that block's genuine target
            // equals the limit.
            let mut entry = prev;
            while let Some(parent) = entry.prev() {
                if entry.height() % interval == 0 || entry.bits() != pow_limit_bits {
                    break;
                }
                entry = parent;
            }
            return entry.bits();
        }
        return prev.bits();
    }

    let first_height = prev.height() - (interval - 1);
    let first = prev
        .ancestor(first_height)
        .expect("interval-start ancestor must exist");
    legacy_retarget(prev, first.block_time(), params)
}

/// Bitcoin-era retarget: scale the previous target by the observed timespan,
/// damped to a factor of four either way.
fn legacy_retarget<I: BlockIndex + ?Sized>(
    prev: &I,
    first_block_time: i64,
    params: &NetworkParams,
) -> CompactTarget {
    if params.no_retargeting {
        return prev.bits();
    }

    let timespan = params.pow_target_timespan_legacy as i64;
    let actual_timespan =
        (prev.block_time() - first_block_time).clamp(timespan / 4, timespan * 4);

    let pow_limit = params.pow_limit(false).as_u256();
    let previous = Target::from_compact_lossy(prev.bits()).as_u256();
    let (product, _) = previous.overflowing_mul(U256::from(actual_timespan as u64));
    let mut next = product / U256::from(timespan as u64);

    if next > pow_limit {
        next = pow_limit;
    }
    Target::new(next).to_compact()
}
