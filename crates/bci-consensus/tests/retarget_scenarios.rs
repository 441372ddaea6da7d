//! Cross-module difficulty scenarios over synthetic ancestry.

use bci_consensus::chain::ChainEntry;
use bci_consensus::{next_required_bits, CompactTarget, GenesisInfo, Network, NetworkParams};
use primitive_types::U256;

const SPACING: i64 = 600;

fn candidate(network: Network, time: u32) -> bci_consensus::BlockHeader {
    let mut header = GenesisInfo::for_network(network).header();
    header.time = time;
    header
}

fn target_value(bits: CompactTarget) -> U256 {
    // Recover the numeric target through the encode/decode pair the engine
    // itself uses.
    let mantissa = U256::from(bits.to_u32() & 0x007f_ffff);
    let exponent = bits.to_u32() >> 24;
    if exponent <= 3 {
        mantissa >> (8 * (3 - exponent))
    } else {
        mantissa << (8 * (exponent - 3))
    }
}

#[test]
fn premine_heights_demand_the_postfork_ceiling() {
    let params = NetworkParams::for_network(Network::Mainnet);
    // Any ancestry shape: the regime is selected by height alone.
    let mut tip = ChainEntry::root(0, CompactTarget::new(0x1c010101), 0);
    for h in 1..=5u32 {
        tip = tip.extend(CompactTarget::new(0x1c010101), i64::from(h) * SPACING);
    }
    // prev.height == bci_height + 5.
    assert_eq!(
        next_required_bits(&tip, &candidate(Network::Mainnet, 0), &params),
        CompactTarget::new(0x1f00ffff)
    );
}

#[test]
fn windowed_retarget_clamps_fast_windows() {
    let params = NetworkParams::for_network(Network::Mainnet);
    let bits = CompactTarget::new(0x1d00ffff);

    // 31+ ancestors whose median-time-past gap is a tenth of the ideal
    // window duration: well below the clamp floor.
    let tenth = params.averaging_window_timespan() / 10 / 30;
    let mut tip = ChainEntry::root(100, bits, 0);
    for h in 101..=200u32 {
        tip = tip.extend(bits, i64::from(h - 100) * tenth);
    }

    let next = next_required_bits(&tip, &candidate(Network::Mainnet, 0), &params);
    let expected = {
        let average = target_value(bits);
        let scaled = average / U256::from(params.averaging_window_timespan() as u64)
            * U256::from(params.min_actual_timespan() as u64);
        let mut be = [0u8; 32];
        scaled.to_big_endian(&mut be);
        bci_consensus::Target::from_be_bytes(&be).to_compact()
    };
    assert_eq!(next, expected);
    assert!(target_value(next) < target_value(bits));
    // Emitted target stays within the postfork ceiling.
    assert!(
        bci_consensus::Target::from_compact(next).unwrap() <= params.pow_limit_postfork
    );
}

#[test]
fn legacy_hundredfold_stall_only_quarters_difficulty() {
    let mut params = NetworkParams::for_network(Network::Mainnet);
    params.bci_height = u32::MAX; // keep every height in the legacy era

    let interval = params.difficulty_adjustment_interval();
    let bits = CompactTarget::new(0x1c0f0f0f);
    let timespan = params.pow_target_timespan_legacy as i64;

    let mut tip = ChainEntry::root(0, bits, 0);
    for h in 1..interval - 1 {
        tip = tip.extend(bits, i64::from(h) * SPACING);
    }
    tip = tip.extend(bits, 100 * timespan);

    let next = next_required_bits(&tip, &candidate(Network::Mainnet, 0), &params);
    assert_eq!(target_value(next), target_value(bits) * U256::from(4u32));
}

#[test]
fn regtest_legacy_path_never_retargets() {
    let mut params = NetworkParams::for_network(Network::Regtest);
    params.bci_height = u32::MAX; // route through the legacy engine
    params.allow_min_difficulty = false;

    let bits = CompactTarget::new(0x207f0000);
    let interval = params.difficulty_adjustment_interval();
    let mut tip = ChainEntry::root(0, bits, 0);
    for h in 1..interval {
        tip = tip.extend(bits, i64::from(h) * 7919); // wildly off-spacing
    }
    assert_eq!(
        next_required_bits(&tip, &candidate(Network::Regtest, 0), &params),
        bits
    );
}
