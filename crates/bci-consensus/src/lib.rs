//! Proof-of-work consensus core for the BCI network.
//!
//! BCI is a Bitcoin-derived chain that hard-forked twice: once to a new
//! address format and premine window (the BCI fork), and once from
//! Equihash-style double-SHA256 hashing to ProgPoW. For a candidate header
//! anchored to a known tip this crate answers two questions: what compact
//! target must the header carry, and does its claimed solution satisfy that
//! target under the rules of the correct era.
//!
//! The crate is a pure function family over `(header, ancestry view,
//! network params)`. It does not mine, choose tips, reorganise or persist.

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod blockdata;
pub mod chain;
pub mod consensus;
pub mod difficulty;
pub mod network;
pub mod pow;
pub mod util;
pub mod validate;

pub use blockdata::block::{hash_header, BlockHeader, BlockNonce};
pub use blockdata::genesis::GenesisInfo;
pub use chain::BlockIndex;
pub use consensus::params::{
    select_params, selected_params, update_deployment_params, Deployment, NetworkParams,
};
pub use difficulty::next_required_bits;
pub use network::Network;
pub use pow::{CompactTarget, Target, Work};
pub use validate::{check_equihash, check_progpow, check_target};

/// Wire protocol version the post-fork header layout serializes under.
pub const PROTOCOL_VERSION: u32 = 70015;
