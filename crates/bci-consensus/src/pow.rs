//!
//! Difficulty targets and their compact encoding.
//!
//! A [`Target`] is a 256-bit threshold: a block hash less than or equal to it
//! satisfies proof-of-work. Headers carry targets in the 32-bit compact form
//! ([`CompactTarget`]): one exponent byte and a 3-byte mantissa, so
//! `target = mantissa * 256^(exponent - 3)`.
//!
//! Two decoders exist on purpose. [`Target::from_compact`] is strict and
//! reports negative, zero and overflowing encodings; the proof-of-work range
//! check consults those verdicts. [`Target::from_compact_lossy`] reproduces
//! the raw numeric semantics the retargeting arithmetic runs on, where the
//! input bits were validated when their block was accepted.
//!
use bitcoin::consensus::encode::{self, Decodable, Encodable};
use bitcoin::io;
use primitive_types::U256;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a compact encoding does not denote a usable target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum TargetError {
    /// The sign bit of the mantissa is set.
    #[error("compact target encodes a negative value")]
    Negative,
    /// The exponent pushes the mantissa past 256 bits.
    #[error("compact target overflows 256 bits")]
    Overflow,
    /// The encoded value is zero.
    #[error("compact target encodes zero")]
    Zero,
}

/// A 256-bit difficulty target.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Target(U256);

impl Target {
    pub(crate) const fn new(target: U256) -> Self {
        Target(target)
    }

    /// Parses a big-endian hex string.
    pub fn from_hex(hex: &str) -> Option<Self> {
        U256::from_str_radix(hex, 16).ok().map(Target)
    }

    /// Interprets 32 big-endian bytes as a target.
    pub fn from_be_bytes(bytes: &[u8; 32]) -> Self {
        Self(U256::from_big_endian(bytes))
    }

    /// Big-endian byte form, as consumed by the ProgPoW boundary.
    pub fn to_be_bytes(self) -> [u8; 32] {
        let mut out = [0u8; 32];
        self.0.to_big_endian(&mut out);
        out
    }

    pub(crate) fn as_u256(self) -> U256 {
        self.0
    }

    /// Strict compact decode.
    ///
    /// Mirrors the flag semantics of the consensus arithmetic: a non-zero
    /// mantissa with the sign bit set is negative; an exponent that shifts
    /// set mantissa bytes past the top of 256 bits is an overflow; anything
    /// decoding to zero is unusable.
    pub fn from_compact(compact: CompactTarget) -> Result<Self, TargetError> {
        let n = compact.to_u32();
        let size = n >> 24;
        let word = n & 0x007f_ffff;

        if word != 0 && (n & 0x0080_0000) != 0 {
            return Err(TargetError::Negative);
        }
        if word != 0 && (size > 34 || (word > 0xff && size > 33) || (word > 0xffff && size > 32)) {
            return Err(TargetError::Overflow);
        }

        let target = Self::from_compact_lossy(compact);
        if target.0.is_zero() {
            return Err(TargetError::Zero);
        }
        Ok(target)
    }

    /// Raw compact decode without range verdicts.
    ///
    /// `mantissa * 256^(exponent - 3)`, with out-of-range shifts collapsing
    /// to zero. The retargeting paths run on this form.
    pub fn from_compact_lossy(compact: CompactTarget) -> Self {
        let n = compact.to_u32();
        let size = n >> 24;
        let word = n & 0x007f_ffff;

        let value = if size <= 3 {
            U256::from(word >> (8 * (3 - size)))
        } else {
            let shift = 8 * (size - 3);
            if shift >= 256 {
                U256::zero()
            } else {
                U256::from(word) << shift
            }
        };
        Target(value)
    }

    /// Packs the target into compact form.
    ///
    /// The mantissa is the three most significant bytes; when its high bit
    /// would read as a sign it is shifted down and the exponent bumped, so
    /// the result always round-trips as a positive value.
    pub fn to_compact(self) -> CompactTarget {
        let mut size = (self.0.bits() + 7) / 8;
        let mut compact = if size <= 3 {
            (self.0.low_u64() << (8 * (3 - size))) as u32
        } else {
            (self.0 >> (8 * (size - 3))).low_u64() as u32
        };

        if compact & 0x0080_0000 != 0 {
            compact >>= 8;
            size += 1;
        }
        CompactTarget::new(compact | ((size as u32) << 24))
    }

    /// Expected hashes to find a block at this target: `2^256 / (target + 1)`.
    pub fn to_work(self) -> Work {
        if self.0.is_zero() || self.0 == U256::one() {
            return Work(U256::MAX);
        }
        if self.0 == U256::MAX {
            return Work(U256::one());
        }
        // ~x / (x + 1) + 1 computes 2^256 / (x + 1) without 257-bit math.
        Work((!self.0 / (self.0 + U256::one())) + U256::one())
    }
}

/// Compact (exponent/mantissa) representation of a target, as carried in
/// block headers.
#[derive(
    Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct CompactTarget(u32);

impl CompactTarget {
    pub const fn new(bits: u32) -> Self {
        CompactTarget(bits)
    }

    pub const fn to_u32(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for CompactTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:08x}", self.0)
    }
}

impl Encodable for CompactTarget {
    fn consensus_encode<W: io::Write + ?Sized>(&self, writer: &mut W) -> Result<usize, io::Error> {
        self.0.consensus_encode(writer)
    }
}

impl Decodable for CompactTarget {
    fn consensus_decode<R: io::Read + ?Sized>(reader: &mut R) -> Result<Self, encode::Error> {
        Ok(CompactTarget(Decodable::consensus_decode(reader)?))
    }
}

/// Accumulated expected work, the fork-choice metric derived from targets.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Work(U256);

impl Work {
    pub fn new(work: U256) -> Self {
        Work(work)
    }
}

impl std::ops::Add for Work {
    type Output = Work;

    fn add(self, rhs: Work) -> Work {
        Work(self.0 + rhs.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_bitcoin_limit_encoding() {
        let target = Target::from_compact(CompactTarget::new(0x1d00ffff)).unwrap();
        let expected =
            Target::from_hex("00000000ffff0000000000000000000000000000000000000000000000000000")
                .unwrap();
        assert_eq!(target, expected);
        assert_eq!(target.to_compact(), CompactTarget::new(0x1d00ffff));
    }

    #[test]
    fn decodes_bci_limit_encoding() {
        let target = Target::from_compact(CompactTarget::new(0x1f00ffff)).unwrap();
        let expected =
            Target::from_hex("0000ffff00000000000000000000000000000000000000000000000000000000")
                .unwrap();
        assert_eq!(target, expected);
        assert_eq!(target.to_compact(), CompactTarget::new(0x1f00ffff));
    }

    #[test]
    fn rejects_negative_encoding() {
        assert_eq!(
            Target::from_compact(CompactTarget::new(0x0180_0001)),
            Err(TargetError::Negative)
        );
        // Sign bit with zero mantissa is not negative, just zero.
        assert_eq!(
            Target::from_compact(CompactTarget::new(0x0080_0000)),
            Err(TargetError::Zero)
        );
    }

    #[test]
    fn rejects_overflow_encoding() {
        assert_eq!(
            Target::from_compact(CompactTarget::new(0xff00_0001)),
            Err(TargetError::Overflow)
        );
        assert_eq!(
            Target::from_compact(CompactTarget::new(0x2201_0000)),
            Err(TargetError::Overflow)
        );
        // 0x21 with a one-byte mantissa still fits.
        assert!(Target::from_compact(CompactTarget::new(0x2100_00ff)).is_ok());
    }

    #[test]
    fn rejects_zero_encoding() {
        assert_eq!(
            Target::from_compact(CompactTarget::new(0)),
            Err(TargetError::Zero)
        );
        assert_eq!(
            Target::from_compact(CompactTarget::new(0x0100_0000)),
            Err(TargetError::Zero)
        );
    }

    #[test]
    fn lossy_matches_strict_for_valid_encodings() {
        for bits in [0x1d00ffffu32, 0x1f00ffff, 0x1e00ffff, 0x207fffff, 0x1b04864c] {
            let strict = Target::from_compact(CompactTarget::new(bits)).unwrap();
            let lossy = Target::from_compact_lossy(CompactTarget::new(bits));
            assert_eq!(strict, lossy);
        }
    }

    #[test]
    fn small_values_pad_into_the_mantissa() {
        assert_eq!(Target(U256::from(0x12)).to_compact(), CompactTarget::new(0x01120000));
        assert_eq!(Target(U256::from(0x1234)).to_compact(), CompactTarget::new(0x02123400));
        assert_eq!(Target(U256::from(0x123456)).to_compact(), CompactTarget::new(0x03123456));
    }

    #[test]
    fn high_mantissa_bit_normalizes() {
        assert_eq!(Target(U256::from(0x7fffff)).to_compact(), CompactTarget::new(0x037fffff));
        assert_eq!(Target(U256::from(0x800000)).to_compact(), CompactTarget::new(0x04008000));
    }

    #[test]
    fn zero_encodes_to_zero() {
        assert_eq!(Target(U256::zero()).to_compact(), CompactTarget::new(0));
    }

    #[test]
    fn round_trip_only_loses_mantissa_precision() {
        let samples = [
            U256::from(0x12u32),
            U256::from(0x123456u32),
            U256::from(0x12345678u64),
            U256::from_str_radix(
                "00000000ffff0000000000000000000000000000000000000000000000000000",
                16,
            )
            .unwrap(),
            U256::from_str_radix(
                "0000ffff00000000000000000000000000000000000000000000000000000000",
                16,
            )
            .unwrap(),
        ];
        for value in samples {
            let compact = Target(value).to_compact();
            let decoded = Target::from_compact(compact).unwrap();
            // Decoding never gains value, and re-encoding is stable.
            assert!(decoded.0 <= value);
            assert_eq!(decoded.to_compact(), compact);
        }
    }

    #[test]
    fn encoding_preserves_order() {
        let mut previous = Target(U256::from(1u32));
        for exponent in 4..32u32 {
            let value = Target(U256::from(0x00ffffu32) << (8 * (exponent - 3)));
            assert!(previous <= value);
            let a = Target::from_compact(previous.to_compact()).unwrap();
            let b = Target::from_compact(value.to_compact()).unwrap();
            assert!(a <= b);
            previous = value;
        }
    }

    #[test]
    fn work_of_genesis_era_target() {
        let target =
            Target::from_hex("00000000ffff0000000000000000000000000000000000000000000000000000")
                .unwrap();
        let expected = U256::from_str_radix(
            "0000000000000000000000000000000000000000000000000000000100010001",
            16,
        )
        .unwrap();
        assert_eq!(target.to_work(), Work::new(expected));
    }

    #[test]
    fn work_edge_cases() {
        assert_eq!(Target(U256::zero()).to_work(), Work::new(U256::MAX));
        assert_eq!(Target(U256::one()).to_work(), Work::new(U256::MAX));
        assert_eq!(Target(U256::MAX).to_work(), Work::new(U256::one()));
        // 2^256 / 3
        let expected = U256::from_str_radix(
            "5555555555555555555555555555555555555555555555555555555555555555",
            16,
        )
        .unwrap();
        assert_eq!(Target(U256::from(2u32)).to_work(), Work::new(expected));
    }
}
