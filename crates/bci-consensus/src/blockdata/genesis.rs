//! Genesis block fixtures for the BCI networks.
//!
//! Hash and merkle bytes are stored in internal (little-endian) order, the
//! same order they serialize in; display formatting reverses them.

use bitcoin::hashes::Hash;
use bitcoin::{BlockHash, TxMerkleNode};
use serde::{Deserialize, Serialize};

use crate::blockdata::block::{BlockHeader, BlockNonce};
use crate::network::Network;
use crate::pow::CompactTarget;

/// Genesis block constants for one network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisInfo {
    /// Canonical hash of the genesis header.
    pub hash: BlockHash,
    /// Merkle root of the genesis coinbase.
    pub merkle_root: TxMerkleNode,
    /// Genesis timestamp.
    pub time: u32,
    /// Genesis compact target.
    pub bits: CompactTarget,
    /// Genesis block version.
    pub version: i32,
    /// Full 256-bit nonce; the miner nonce sits in lane 3.
    pub nonce: BlockNonce,
    /// 32-byte ProgPoW mix hash carried as the genesis solution.
    pub solution: [u8; 32],
}

impl GenesisInfo {
    /// Genesis constants for `network`.
    pub fn for_network(network: Network) -> Self {
        match network {
            Network::Mainnet => Self::mainnet(),
            Network::Testnet => Self::testnet(),
            Network::Regtest => Self::regtest(),
        }
    }

    /// Rebuilds the genesis header from the fixture.
    pub fn header(&self) -> BlockHeader {
        BlockHeader {
            version: self.version,
            prev_blockhash: BlockHash::all_zeros(),
            merkle_root: self.merkle_root,
            height: 0,
            reserved: [0; 28],
            time: self.time,
            bits: self.bits,
            nonce: self.nonce,
            solution: self.solution.to_vec(),
        }
    }

    /// BCI main network genesis.
    pub fn mainnet() -> Self {
        Self {
            hash: BlockHash::from_byte_array([
                0x78, 0x90, 0xf5, 0x99, 0x38, 0x3e, 0x02, 0x52, 0xc0, 0xae, 0xfa, 0x13, 0x9b,
                0x93, 0x72, 0x7f, 0x29, 0x40, 0x14, 0x08, 0x69, 0xc2, 0xc6, 0x1b, 0x0f, 0xd4,
                0xf0, 0xc4, 0x74, 0x0d, 0x00, 0x00,
            ]),
            merkle_root: TxMerkleNode::from_byte_array([
                0xe1, 0x4a, 0xfb, 0xb4, 0xaa, 0x88, 0xc5, 0x8b, 0x87, 0xe8, 0x7e, 0x7a, 0x26,
                0xa9, 0x7e, 0x58, 0xb3, 0x15, 0x85, 0xea, 0x67, 0x02, 0x2b, 0xd1, 0xd1, 0xa1,
                0x15, 0xf8, 0xef, 0x51, 0xc6, 0x41,
            ]),
            time: 1_535_680_000,
            bits: CompactTarget::new(0x1f00ffff),
            version: 1,
            nonce: BlockNonce::from_progpow_nonce(0xc5bb_71e3_dbec_6a1f),
            solution: [
                0x6b, 0xa3, 0x7f, 0x45, 0xf7, 0x21, 0xc0, 0x49, 0x6f, 0xd5, 0xd8, 0xb0, 0xe4,
                0xe3, 0xcd, 0xe0, 0x33, 0xba, 0x6b, 0x9c, 0xc6, 0x55, 0xba, 0x6e, 0x35, 0xc0,
                0x18, 0x50, 0x6e, 0x49, 0x63, 0x2c,
            ],
        }
    }

    /// BCI test network genesis.
    pub fn testnet() -> Self {
        Self {
            hash: BlockHash::from_byte_array([
                0x07, 0x7a, 0x3b, 0x3e, 0xe3, 0xf0, 0x78, 0xe9, 0xba, 0xbf, 0x01, 0x7d, 0x3a,
                0xb1, 0x7e, 0x9f, 0xb4, 0xb4, 0xba, 0xf2, 0xfa, 0x61, 0xb0, 0xc2, 0x36, 0x16,
                0xb3, 0xb3, 0x57, 0x20, 0x00, 0x00,
            ]),
            merkle_root: TxMerkleNode::from_byte_array([
                0x8f, 0x98, 0xeb, 0xcd, 0xb2, 0xea, 0x7c, 0xb2, 0x57, 0xcc, 0x81, 0x2f, 0xc3,
                0x63, 0x32, 0xc0, 0x97, 0xba, 0x8c, 0x4f, 0x88, 0x61, 0xdf, 0x76, 0x96, 0x45,
                0xd6, 0x8b, 0x59, 0xca, 0x17, 0xb9,
            ]),
            time: 1_535_730_000,
            bits: CompactTarget::new(0x1f00ffff),
            version: 1,
            nonce: BlockNonce::from_progpow_nonce(0x63e5_9b59_ca41_c608),
            solution: [
                0x6b, 0xdc, 0x7a, 0xbb, 0x86, 0x56, 0x51, 0x05, 0xf5, 0x93, 0xef, 0x3e, 0x9c,
                0xe4, 0x42, 0xf0, 0xd1, 0x43, 0x0d, 0xfc, 0x6c, 0x84, 0x6a, 0x34, 0x47, 0x62,
                0x23, 0xee, 0x15, 0x03, 0x4f, 0xb5,
            ],
        }
    }

    /// Regression test network genesis.
    ///
    /// The recorded hash is chain data carried from the deployed chain; it
    /// does not re-derive from the header fields (see DESIGN.md).
    pub fn regtest() -> Self {
        Self {
            hash: BlockHash::from_byte_array([
                0xcb, 0x42, 0x48, 0x6a, 0xc7, 0xbe, 0x6e, 0xd2, 0x1a, 0xaf, 0x52, 0xee, 0xa8,
                0x5c, 0xc5, 0x1c, 0xab, 0x3a, 0x8d, 0x75, 0x8f, 0xa6, 0xd2, 0x67, 0xe0, 0x65,
                0xf1, 0x13, 0x00, 0x00, 0x00, 0x00,
            ]),
            merkle_root: TxMerkleNode::from_byte_array([
                0x3f, 0x06, 0xca, 0xc1, 0x25, 0x37, 0x7c, 0x17, 0x48, 0x87, 0xe9, 0x26, 0x7e,
                0x4d, 0x3e, 0x2a, 0xf8, 0xc8, 0xe4, 0x64, 0xa0, 0x17, 0x3d, 0x43, 0x47, 0x88,
                0x7b, 0x0f, 0x5d, 0xaf, 0x69, 0x27,
            ]),
            time: 1_535_561_891,
            bits: CompactTarget::new(0x1e00ffff),
            version: 1,
            nonce: BlockNonce::from_progpow_nonce(0x3e69_2e7c_0820_997c),
            solution: [
                0x0d, 0x33, 0xbb, 0x78, 0xec, 0x96, 0x1a, 0x87, 0xee, 0xb0, 0x2e, 0xae, 0xd1,
                0x05, 0x7e, 0x0e, 0x1e, 0x54, 0x37, 0x43, 0x93, 0xb0, 0xc7, 0x16, 0x2c, 0x3f,
                0x29, 0x2b, 0xdc, 0xe6, 0x35, 0x71,
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixtures_display_canonical_hashes() {
        assert_eq!(
            GenesisInfo::mainnet().hash.to_string(),
            "00000d74c4f0d40f1bc6c269081440297f72939b13faaec052023e3899f59078"
        );
        assert_eq!(
            GenesisInfo::testnet().hash.to_string(),
            "00002057b3b31636c2b061faf2bab4b49f7eb13a7d01bfbae978f0e33e3b7a07"
        );
        assert_eq!(
            GenesisInfo::regtest().hash.to_string(),
            "0000000013f165e067d2a68f758d3aab1cc55ca8ee52af1ad26ebec76a4842cb"
        );
    }

    #[test]
    fn headers_rebuild_with_expected_shape() {
        for network in [Network::Mainnet, Network::Testnet, Network::Regtest] {
            let info = GenesisInfo::for_network(network);
            let header = info.header();
            assert_eq!(header.height, 0);
            assert_eq!(header.prev_blockhash, BlockHash::all_zeros());
            assert_eq!(header.solution.len(), 32);
            assert_eq!(header.merkle_root, info.merkle_root);
        }
    }

    #[test]
    fn miner_nonces_sit_in_lane_three() {
        assert_eq!(
            GenesisInfo::mainnet().nonce.progpow_nonce(),
            0xc5bb_71e3_dbec_6a1f
        );
        assert_eq!(GenesisInfo::mainnet().nonce.lane(0), 0);
    }
}
