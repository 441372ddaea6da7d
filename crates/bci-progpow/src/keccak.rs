//! Keccak primitives used by the kernel.
//!
//! Keccak-256 and Keccak-512 (original padding, not SHA-3) come from
//! `tiny-keccak`; the raw Keccak-f[800] permutation that ProgPoW builds its
//! sponge on is not exposed by any published crate, so it lives here.

use tiny_keccak::{Hasher, Keccak};

/// Keccak-256 over `data`.
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut out = [0u8; 32];
    let mut k = Keccak::v256();
    k.update(data);
    k.finalize(&mut out);
    out
}

/// Keccak-512 over `data`.
pub fn keccak512(data: &[u8]) -> [u8; 64] {
    let mut out = [0u8; 64];
    let mut k = Keccak::v512();
    k.update(data);
    k.finalize(&mut out);
    out
}

const ROUNDS: usize = 22;

// Keccak-f[1600] iota constants truncated to the 32-bit lane width.
const ROUND_CONSTANTS: [u32; ROUNDS] = [
    0x0000_0001, 0x0000_8082, 0x0000_808a, 0x8000_8000, 0x0000_808b, 0x8000_0001,
    0x8000_8081, 0x0000_8009, 0x0000_008a, 0x0000_0088, 0x8000_8009, 0x8000_000a,
    0x8000_808b, 0x0000_008b, 0x0000_8089, 0x0000_8003, 0x0000_8002, 0x0000_0080,
    0x0000_800a, 0x8000_000a, 0x8000_8081, 0x0000_8080,
];

// Rho rotation offsets (mod 32) for lane x + 5y.
const ROTATIONS: [u32; 25] = [
    0, 1, 30, 28, 27, //
    4, 12, 6, 23, 20, //
    3, 10, 11, 25, 7, //
    9, 13, 15, 21, 8, //
    18, 2, 29, 24, 14,
];

/// The Keccak-f[800] permutation (22 rounds) over 25 32-bit lanes.
///
/// Lane `i` sits at coordinates `(x, y) = (i % 5, i / 5)`.
pub fn keccak_f800(state: &mut [u32; 25]) {
    for &rc in &ROUND_CONSTANTS {
        // Theta
        let mut c = [0u32; 5];
        for x in 0..5 {
            c[x] = state[x] ^ state[x + 5] ^ state[x + 10] ^ state[x + 15] ^ state[x + 20];
        }
        for x in 0..5 {
            let d = c[(x + 4) % 5] ^ c[(x + 1) % 5].rotate_left(1);
            for y in 0..5 {
                state[x + 5 * y] ^= d;
            }
        }

        // Rho and pi
        let mut b = [0u32; 25];
        for x in 0..5 {
            for y in 0..5 {
                let i = x + 5 * y;
                b[y + 5 * ((2 * x + 3 * y) % 5)] = state[i].rotate_left(ROTATIONS[i]);
            }
        }

        // Chi
        for y in 0..5 {
            for x in 0..5 {
                state[x + 5 * y] =
                    b[x + 5 * y] ^ (!b[(x + 1) % 5 + 5 * y] & b[(x + 2) % 5 + 5 * y]);
            }
        }

        // Iota
        state[0] ^= rc;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keccak256_known_vectors() {
        assert_eq!(
            hex_str(&keccak256(b"")),
            "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
        assert_eq!(
            hex_str(&keccak256(b"abc")),
            "4e03657aea45a94fc7d47ba826c8d667c0d1e6e33a64a036ec44f58fa12d6c45"
        );
    }

    #[test]
    fn keccak512_known_vector() {
        let out = keccak512(b"");
        assert_eq!(
            hex_str(&out[..16]),
            "0eab42de4c3ceb9235fc91acffe746b2"
        );
    }

    #[test]
    fn f800_zero_state() {
        let mut st = [0u32; 25];
        keccak_f800(&mut st);
        assert_eq!(
            &st[..8],
            &[
                0xe531_d45d, 0xf404_c6fb, 0x23a0_bf99, 0xf1f8_452f, 0x51ff_d042, 0xe539_f578,
                0xf00b_80a7, 0xaf97_3664
            ]
        );
    }

    fn hex_str(bytes: &[u8]) -> String {
        bytes.iter().map(|b| format!("{b:02x}")).collect()
    }
}
