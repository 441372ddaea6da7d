//! Block-header primitives: the era-aware header, its wire forms and the
//! per-network genesis fixtures.

pub mod block;
pub mod genesis;

pub use block::{hash_header, BlockHeader, BlockNonce};
pub use genesis::GenesisInfo;
