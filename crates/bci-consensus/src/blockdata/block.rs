//! The BCI block header and its three hashing eras.
//!
//! One struct carries every era's fields. Pre-BCI headers hash over the
//! 80-byte Bitcoin layout; post-BCI headers hash over the widened layout that
//! adds `height`, a reserved region, a 256-bit nonce and the solution blob;
//! ProgPoW-era headers hash through a Keccak construction that deliberately
//! ignores the nonce bytes embedded in the serialization.

use bitcoin::consensus::encode::{self, Decodable, Encodable};
use bitcoin::hashes::Hash;
use bitcoin::io::{self, BufRead, Read, Write};
use bitcoin::{BlockHash, TxMerkleNode};
use serde::{Deserialize, Serialize};

use crate::consensus::params::{selected_params, NetworkParams};
use crate::pow::CompactTarget;

/// Byte length of the post-fork header fields preceding the nonce; also the
/// Equihash input length.
pub const EQUIHASH_INPUT_SIZE: usize = 108;

/// Byte length of the ProgPoW hashing preimage (Equihash input plus the
/// zeroed nonce region).
pub const PROGPOW_INPUT_SIZE: usize = 140;

/// 256-bit header nonce, stored little-endian and read as four u64 lanes.
///
/// Equihash consumed the whole field; ProgPoW consumes only lane 3 and the
/// header hash is computed with all 32 bytes zeroed, so entropy outside
/// lane 3 buys a miner nothing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockNonce([u8; 32]);

impl BlockNonce {
    pub const ZERO: Self = BlockNonce([0; 32]);

    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        BlockNonce(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Little-endian u64 lane `index` (0..4).
    pub fn lane(&self, index: usize) -> u64 {
        let at = index * 8;
        u64::from_le_bytes(self.0[at..at + 8].try_into().expect("8-byte lane"))
    }

    /// The 8-byte miner nonce ProgPoW consumes.
    pub fn progpow_nonce(&self) -> u64 {
        self.lane(3)
    }

    /// Builds a nonce carrying `nonce` in lane 3, as ProgPoW miners roll it.
    pub fn from_progpow_nonce(nonce: u64) -> Self {
        let mut bytes = [0u8; 32];
        bytes[24..32].copy_from_slice(&nonce.to_le_bytes());
        BlockNonce(bytes)
    }
}

impl Encodable for BlockNonce {
    fn consensus_encode<W: Write + ?Sized>(&self, writer: &mut W) -> Result<usize, io::Error> {
        self.0.consensus_encode(writer)
    }
}

impl Decodable for BlockNonce {
    fn consensus_decode<R: Read + ?Sized>(reader: &mut R) -> Result<Self, encode::Error> {
        Ok(BlockNonce(Decodable::consensus_decode(reader)?))
    }
}

/// A BCI block header.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    /// Block version, repurposed for soft-fork signalling.
    pub version: i32,
    /// Hash of the predecessor block.
    pub prev_blockhash: BlockHash,
    /// Merkle root of the block's transactions.
    pub merkle_root: TxMerkleNode,
    /// Height, committed in the post-fork wire form.
    pub height: u32,
    /// Reserved region of the post-fork layout; zero on the wire.
    pub reserved: [u8; 28],
    /// Miner-claimed timestamp.
    pub time: u32,
    /// Compact difficulty target this header claims to satisfy.
    pub bits: CompactTarget,
    /// 256-bit nonce field.
    pub nonce: BlockNonce,
    /// Equihash solution before the ProgPoW fork; afterwards a 32-byte mix
    /// hash (plus padding, if a miner emits any).
    pub solution: Vec<u8>,
}

impl BlockHeader {
    /// Canonical hash under the era `params` selects for this header.
    ///
    /// A post-ProgPoW-fork header with an empty solution falls back to the
    /// serialization hash, so partially built headers remain hashable for
    /// logging and debugging.
    pub fn hash(&self, params: &NetworkParams) -> BlockHash {
        if self.height >= params.prog_fork_height && !self.solution.is_empty() {
            return self.progpow_hash();
        }
        if self.height >= params.bci_height {
            self.postfork_hash()
        } else {
            self.legacy_hash()
        }
    }

    /// [`BlockHeader::hash`] against the process-selected params.
    ///
    /// # Panics
    ///
    /// If no network has been selected.
    pub fn hash_with_selected(&self) -> BlockHash {
        self.hash(&selected_params())
    }

    /// The header fields Equihash commits to: everything up to and excluding
    /// the nonce and solution, in wire order.
    pub fn equihash_input(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(EQUIHASH_INPUT_SIZE);
        self.encode_equihash_input(&mut out)
            .expect("vec writers don't fail");
        debug_assert_eq!(out.len(), EQUIHASH_INPUT_SIZE);
        out
    }

    /// The 140-byte ProgPoW preimage: Equihash input, then the nonce region
    /// zeroed so the header hash cannot depend on it.
    pub fn progpow_input(&self) -> [u8; PROGPOW_INPUT_SIZE] {
        let mut out = self.equihash_input();
        out.extend_from_slice(self.nonce.as_bytes());
        for byte in &mut out[EQUIHASH_INPUT_SIZE..] {
            *byte = 0;
        }
        out.try_into().expect("fixed-size preimage")
    }

    fn encode_equihash_input<W: Write + ?Sized>(&self, writer: &mut W) -> Result<usize, io::Error> {
        let mut len = 0;
        len += self.version.consensus_encode(writer)?;
        len += self.prev_blockhash.consensus_encode(writer)?;
        len += self.merkle_root.consensus_encode(writer)?;
        len += self.height.consensus_encode(writer)?;
        writer.write_all(&self.reserved)?;
        len += self.reserved.len();
        len += self.time.consensus_encode(writer)?;
        len += self.bits.consensus_encode(writer)?;
        Ok(len)
    }

    /// Serializes the 80-byte pre-BCI wire form. The legacy layout has no
    /// height, reserved region or solution, and truncates the nonce to the
    /// low 32 bits of lane 0.
    pub fn consensus_encode_legacy<W: Write + ?Sized>(
        &self,
        writer: &mut W,
    ) -> Result<usize, io::Error> {
        let mut len = 0;
        len += self.version.consensus_encode(writer)?;
        len += self.prev_blockhash.consensus_encode(writer)?;
        len += self.merkle_root.consensus_encode(writer)?;
        len += self.time.consensus_encode(writer)?;
        len += self.bits.consensus_encode(writer)?;
        len += (self.nonce.lane(0) as u32).consensus_encode(writer)?;
        Ok(len)
    }

    /// Parses the 80-byte pre-BCI wire form.
    pub fn consensus_decode_legacy<R: BufRead + ?Sized>(
        reader: &mut R,
    ) -> Result<Self, encode::Error> {
        let version = Decodable::consensus_decode(reader)?;
        let prev_blockhash = Decodable::consensus_decode(reader)?;
        let merkle_root = Decodable::consensus_decode(reader)?;
        let time = Decodable::consensus_decode(reader)?;
        let bits = Decodable::consensus_decode(reader)?;
        let legacy_nonce: u32 = Decodable::consensus_decode(reader)?;
        let mut nonce = [0u8; 32];
        nonce[..4].copy_from_slice(&legacy_nonce.to_le_bytes());
        Ok(BlockHeader {
            version,
            prev_blockhash,
            merkle_root,
            height: 0,
            reserved: [0; 28],
            time,
            bits,
            nonce: BlockNonce::from_bytes(nonce),
            solution: Vec::new(),
        })
    }

    fn postfork_hash(&self) -> BlockHash {
        let mut engine = BlockHash::engine();
        self.consensus_encode(&mut engine)
            .expect("hash engines don't fail");
        BlockHash::from_engine(engine)
    }

    fn legacy_hash(&self) -> BlockHash {
        let mut engine = BlockHash::engine();
        self.consensus_encode_legacy(&mut engine)
            .expect("hash engines don't fail");
        BlockHash::from_engine(engine)
    }

    fn progpow_hash(&self) -> BlockHash {
        let header_hash = bci_progpow::keccak256(&self.progpow_input());

        let mut mix = [0u8; 32];
        let len = self.solution.len().min(32);
        mix[..len].copy_from_slice(&self.solution[..len]);

        let final_be =
            bci_progpow::verify_final_progpow_hash(&header_hash, &mix, self.nonce.progpow_nonce());

        // The kernel speaks big-endian; block hashes store little-endian.
        let mut le = final_be;
        le.reverse();
        BlockHash::from_byte_array(le)
    }
}

impl Encodable for BlockHeader {
    fn consensus_encode<W: Write + ?Sized>(&self, writer: &mut W) -> Result<usize, io::Error> {
        let mut len = self.encode_equihash_input(writer)?;
        len += self.nonce.consensus_encode(writer)?;
        len += self.solution.consensus_encode(writer)?;
        Ok(len)
    }
}

impl Decodable for BlockHeader {
    fn consensus_decode<R: Read + ?Sized>(reader: &mut R) -> Result<Self, encode::Error> {
        let version = Decodable::consensus_decode(reader)?;
        let prev_blockhash = Decodable::consensus_decode(reader)?;
        let merkle_root = Decodable::consensus_decode(reader)?;
        let height = Decodable::consensus_decode(reader)?;
        let mut reserved = [0u8; 28];
        reader.read_exact(&mut reserved)?;
        Ok(BlockHeader {
            version,
            prev_blockhash,
            merkle_root,
            height,
            reserved,
            time: Decodable::consensus_decode(reader)?,
            bits: Decodable::consensus_decode(reader)?,
            nonce: Decodable::consensus_decode(reader)?,
            solution: Decodable::consensus_decode(reader)?,
        })
    }
}

/// Canonical header hash under `params` — the free-function face of
/// [`BlockHeader::hash`].
pub fn hash_header(header: &BlockHeader, params: &NetworkParams) -> BlockHash {
    header.hash(params)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockdata::genesis::GenesisInfo;
    use crate::network::Network;
    use crate::util::{hex_to_blockhash, hex_to_merkle_node};

    fn sample_header() -> BlockHeader {
        GenesisInfo::for_network(Network::Mainnet).header()
    }

    #[test]
    fn nonce_lanes_read_little_endian() {
        let mut bytes = [0u8; 32];
        bytes[24..32].copy_from_slice(&0xc5bb71e3dbec6a1fu64.to_le_bytes());
        let nonce = BlockNonce::from_bytes(bytes);
        assert_eq!(nonce.lane(0), 0);
        assert_eq!(nonce.progpow_nonce(), 0xc5bb71e3dbec6a1f);
        assert_eq!(nonce, BlockNonce::from_progpow_nonce(0xc5bb71e3dbec6a1f));
    }

    #[test]
    fn equihash_input_is_108_bytes() {
        assert_eq!(sample_header().equihash_input().len(), EQUIHASH_INPUT_SIZE);
    }

    #[test]
    fn progpow_input_zeroes_the_nonce_region() {
        let header = sample_header();
        let input = header.progpow_input();
        assert_eq!(&input[..EQUIHASH_INPUT_SIZE], &header.equihash_input()[..]);
        assert!(input[EQUIHASH_INPUT_SIZE..].iter().all(|&b| b == 0));
    }

    #[test]
    fn progpow_input_ignores_nonce_entropy() {
        let mut a = sample_header();
        let mut b = a.clone();
        a.nonce = BlockNonce::from_progpow_nonce(1);
        b.nonce = BlockNonce::from_progpow_nonce(u64::MAX);
        assert_eq!(a.progpow_input(), b.progpow_input());
    }

    #[test]
    fn postfork_round_trip_preserves_nonce_and_solution() {
        let header = sample_header();
        let mut bytes = Vec::new();
        header.consensus_encode(&mut bytes).unwrap();
        // 108 field bytes, 32 nonce bytes, varint, 32 solution bytes.
        assert_eq!(bytes.len(), 108 + 32 + 1 + 32);

        let decoded = BlockHeader::consensus_decode(&mut bytes.as_slice()).unwrap();
        assert_eq!(decoded, header);
        assert_eq!(decoded.nonce, header.nonce);
        assert_eq!(decoded.solution, header.solution);
    }

    #[test]
    fn legacy_round_trip_is_80_bytes() {
        let mut header = sample_header();
        header.nonce = BlockNonce::from_bytes({
            let mut b = [0u8; 32];
            b[..4].copy_from_slice(&0xdeadbeefu32.to_le_bytes());
            b
        });
        header.solution.clear();

        let mut bytes = Vec::new();
        header.consensus_encode_legacy(&mut bytes).unwrap();
        assert_eq!(bytes.len(), 80);

        let decoded = BlockHeader::consensus_decode_legacy(&mut bytes.as_slice()).unwrap();
        assert_eq!(decoded.nonce.lane(0), 0xdeadbeef);
        assert_eq!(decoded.time, header.time);
        assert_eq!(decoded.bits, header.bits);
    }

    #[test]
    fn legacy_hash_matches_bitcoin_genesis() {
        // The pre-fork layout is byte-compatible with Bitcoin's, so Bitcoin's
        // genesis pins the legacy serialization hash.
        let header = BlockHeader {
            version: 1,
            prev_blockhash: BlockHash::all_zeros(),
            merkle_root: hex_to_merkle_node(
                "3ba3edfd7a7b12b27ac72c3e67768f617fc81bc3888a51323a9fb8aa4b1e5e4a",
            )
            .unwrap(),
            height: 0,
            reserved: [0; 28],
            time: 1231006505,
            bits: CompactTarget::new(0x1d00ffff),
            nonce: BlockNonce::from_bytes({
                let mut b = [0u8; 32];
                b[..4].copy_from_slice(&2083236893u32.to_le_bytes());
                b
            }),
            solution: Vec::new(),
        };
        let expected =
            hex_to_blockhash("6fe28c0ab6f1b372c1a6a246ae63f74f931e8365e15a089c68d6190000000000")
                .unwrap();
        assert_eq!(header.legacy_hash(), expected);
    }

    #[test]
    fn hash_is_deterministic() {
        let header = sample_header();
        let params = crate::consensus::params::NetworkParams::mainnet();
        assert_eq!(header.hash(&params), header.hash(&params));
    }

    #[test]
    fn progpow_hash_matches_kernel_for_any_lane3_nonce() {
        let params = crate::consensus::params::NetworkParams::mainnet();
        for nonce in [0u64, 1, 0xffff_ffff, u64::MAX] {
            let mut header = sample_header();
            header.nonce = BlockNonce::from_progpow_nonce(nonce);

            let header_hash = bci_progpow::keccak256(&header.progpow_input());
            let mix: [u8; 32] = header.solution[..32].try_into().unwrap();
            let mut expected = bci_progpow::verify_final_progpow_hash(&header_hash, &mix, nonce);
            expected.reverse();

            assert_eq!(header.hash(&params).to_byte_array(), expected);
        }
    }

    #[test]
    fn empty_solution_falls_back_to_serialization_hash() {
        let mut header = sample_header();
        header.solution.clear();
        let params = crate::consensus::params::NetworkParams::mainnet();
        // Still past the fork height, but with no solution the ProgPoW branch
        // is unreachable.
        assert_eq!(header.hash(&params), header.postfork_hash());
    }
}
