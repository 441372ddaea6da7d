//! The ProgPoW inner loop (revision 0.9.2) and the verification entry points.
//!
//! Byte-order contract: the 32-byte header hash, mix hash and target are
//! big-endian values. Internally a 256-bit value is absorbed into the
//! Keccak-f[800] sponge as its eight little-endian u32 limbs (limb 0 least
//! significant) and the final digest is emitted most-significant-word first.
//! Both directions funnel through [`value_limbs`] and [`value_from_words`];
//! nothing else converts.

use crate::cache::EpochContext;
use crate::keccak::keccak_f800;

pub(crate) const PROGPOW_CACHE_BYTES: usize = 16 * 1024;

const PROGPOW_PERIOD: u32 = 50;
const PROGPOW_LANES: usize = 16;
const PROGPOW_REGS: usize = 32;
const PROGPOW_DAG_LOADS: usize = 4;
const PROGPOW_CNT_DAG: usize = 64;
const PROGPOW_CNT_CACHE: usize = 11;
const PROGPOW_CNT_MATH: usize = 18;

const FNV_PRIME: u32 = 0x0100_0193;
const FNV_OFFSET_BASIS: u32 = 0x811c_9dc5;

#[inline]
fn fnv1a(h: &mut u32, d: u32) -> u32 {
    *h = (*h ^ d).wrapping_mul(FNV_PRIME);
    *h
}

/// KISS99 PRNG; drives program generation and lane seeding.
#[derive(Clone, Copy)]
struct Kiss99 {
    z: u32,
    w: u32,
    jsr: u32,
    jcong: u32,
}

impl Kiss99 {
    fn next(&mut self) -> u32 {
        self.z = 36969u32
            .wrapping_mul(self.z & 0xffff)
            .wrapping_add(self.z >> 16);
        self.w = 18000u32
            .wrapping_mul(self.w & 0xffff)
            .wrapping_add(self.w >> 16);
        let mwc = (self.z << 16).wrapping_add(self.w);
        self.jsr ^= self.jsr << 17;
        self.jsr ^= self.jsr >> 13;
        self.jsr ^= self.jsr << 5;
        self.jcong = 69069u32.wrapping_mul(self.jcong).wrapping_add(1234567);
        (mwc ^ self.jcong).wrapping_add(self.jsr)
    }
}

/// Expands the per-hash seed into one lane's 32 mix registers.
fn fill_mix(seed: u64, lane_id: u32) -> [u32; PROGPOW_REGS] {
    let mut h = FNV_OFFSET_BASIS;
    let z = fnv1a(&mut h, seed as u32);
    let w = fnv1a(&mut h, (seed >> 32) as u32);
    let jsr = fnv1a(&mut h, lane_id);
    let jcong = fnv1a(&mut h, lane_id);
    let mut rng = Kiss99 { z, w, jsr, jcong };

    let mut mix = [0u32; PROGPOW_REGS];
    for reg in mix.iter_mut() {
        *reg = rng.next();
    }
    mix
}

/// Seeds the program RNG and shuffles the merge-destination and cache-source
/// register sequences for one program period.
fn progpow_init(prog_seed: u64) -> (Kiss99, [usize; PROGPOW_REGS], [usize; PROGPOW_REGS]) {
    let mut h = FNV_OFFSET_BASIS;
    let z = fnv1a(&mut h, prog_seed as u32);
    let w = fnv1a(&mut h, (prog_seed >> 32) as u32);
    let jsr = fnv1a(&mut h, prog_seed as u32);
    let jcong = fnv1a(&mut h, (prog_seed >> 32) as u32);
    let mut rng = Kiss99 { z, w, jsr, jcong };

    let mut dst = [0usize; PROGPOW_REGS];
    let mut src = [0usize; PROGPOW_REGS];
    for i in 0..PROGPOW_REGS {
        dst[i] = i;
        src[i] = i;
    }
    for i in (1..PROGPOW_REGS).rev() {
        let j = rng.next() as usize % (i + 1);
        dst.swap(i, j);
        let j = rng.next() as usize % (i + 1);
        src.swap(i, j);
    }
    (rng, dst, src)
}

/// Entropy-preserving merge of `b` into `a`.
fn merge(a: &mut u32, b: u32, r: u32) {
    *a = match r % 4 {
        0 => a.wrapping_mul(33).wrapping_add(b),
        1 => (*a ^ b).wrapping_mul(33),
        2 => a.rotate_left(((r >> 16) % 31) + 1) ^ b,
        _ => a.rotate_right(((r >> 16) % 31) + 1) ^ b,
    };
}

/// Random math between two registers.
fn math(a: u32, b: u32, r: u32) -> u32 {
    match r % 11 {
        0 => a.wrapping_add(b),
        1 => a.wrapping_mul(b),
        2 => ((u64::from(a) * u64::from(b)) >> 32) as u32,
        3 => a.min(b),
        4 => a.rotate_left(b),
        5 => a.rotate_right(b),
        6 => a & b,
        7 => a | b,
        8 => a ^ b,
        9 => a.leading_zeros() + b.leading_zeros(),
        _ => a.count_ones() + b.count_ones(),
    }
}

/// Limbs of a big-endian 256-bit value, least significant first.
fn value_limbs(bytes: &[u8; 32]) -> [u32; 8] {
    let mut limbs = [0u32; 8];
    for (i, limb) in limbs.iter_mut().enumerate() {
        let at = 28 - 4 * i;
        *limb = u32::from_be_bytes(bytes[at..at + 4].try_into().expect("4-byte chunk"));
    }
    limbs
}

/// Big-endian bytes of a digest emitted most-significant-word first.
fn value_from_words(words: &[u32; 8]) -> [u8; 32] {
    let mut out = [0u8; 32];
    for (i, w) in words.iter().enumerate() {
        out[4 * i..4 * i + 4].copy_from_slice(&w.to_be_bytes());
    }
    out
}

/// One Keccak-f[800] sponge pass: header limbs, a 64-bit seed and a 256-bit
/// digest in, the first eight state words out.
fn keccak_progpow(header: &[u32; 8], seed: u64, digest: &[u32; 8]) -> [u32; 8] {
    let mut state = [0u32; 25];
    state[..8].copy_from_slice(header);
    state[8] = seed as u32;
    state[9] = (seed >> 32) as u32;
    state[10..18].copy_from_slice(digest);
    keccak_f800(&mut state);
    let mut out = [0u32; 8];
    out.copy_from_slice(&state[..8]);
    out
}

/// Per-hash seed from header limbs and nonce.
fn progpow_seed(header: &[u32; 8], nonce: u64) -> u64 {
    let words = keccak_progpow(header, nonce, &[0u32; 8]);
    (u64::from(words[0]) << 32) | u64::from(words[1])
}

fn progpow_loop(
    ctx: &EpochContext,
    prog_seed: u64,
    loop_idx: usize,
    mix: &mut [[u32; PROGPOW_REGS]; PROGPOW_LANES],
) {
    // 256-byte dag entry shared by all lanes this iteration.
    let num_entries = ctx.full_dataset_bytes() / (PROGPOW_LANES * PROGPOW_DAG_LOADS * 4);
    let base = mix[loop_idx % PROGPOW_LANES][0] as usize % num_entries;
    let mut entry = [0u32; PROGPOW_LANES * PROGPOW_DAG_LOADS];
    for k in 0..4 {
        let item = ctx.dataset_item(base * 4 + k);
        entry[16 * k..16 * (k + 1)].copy_from_slice(&item);
    }

    let (mut rng, dst_seq, src_seq) = progpow_init(prog_seed);
    let mut dst_cnt = 0usize;
    let mut src_cnt = 0usize;

    for i in 0..PROGPOW_CNT_CACHE.max(PROGPOW_CNT_MATH) {
        if i < PROGPOW_CNT_CACHE {
            let src = src_seq[src_cnt % PROGPOW_REGS];
            src_cnt += 1;
            let dst = dst_seq[dst_cnt % PROGPOW_REGS];
            dst_cnt += 1;
            let sel = rng.next();
            for lane in mix.iter_mut() {
                let offset = lane[src] as usize % (PROGPOW_CACHE_BYTES / 4);
                merge(&mut lane[dst], ctx.l1_word(offset), sel);
            }
        }
        if i < PROGPOW_CNT_MATH {
            let src_rnd = rng.next() as usize % (PROGPOW_REGS * (PROGPOW_REGS - 1));
            let src1 = src_rnd % PROGPOW_REGS;
            let mut src2 = src_rnd / PROGPOW_REGS;
            if src2 >= src1 {
                src2 += 1;
            }
            let sel1 = rng.next();
            let dst = dst_seq[dst_cnt % PROGPOW_REGS];
            dst_cnt += 1;
            let sel2 = rng.next();
            for lane in mix.iter_mut() {
                let data = math(lane[src1], lane[src2], sel1);
                merge(&mut lane[dst], data, sel2);
            }
        }
    }

    // Global loads merge last; load 0 always feeds the address register.
    for i in 0..PROGPOW_DAG_LOADS {
        let dst = if i == 0 {
            0
        } else {
            let d = dst_seq[dst_cnt % PROGPOW_REGS];
            dst_cnt += 1;
            d
        };
        let sel = rng.next();
        for (l, lane) in mix.iter_mut().enumerate() {
            let local = ((l ^ loop_idx) % PROGPOW_LANES) * PROGPOW_DAG_LOADS + i;
            merge(&mut lane[dst], entry[local], sel);
        }
    }
}

/// Full mix computation for one (header, nonce) over the epoch dataset.
fn hash_mix(ctx: &EpochContext, height: u32, seed: u64) -> [u32; 8] {
    let prog_seed = u64::from(height / PROGPOW_PERIOD);

    let mut mix = [[0u32; PROGPOW_REGS]; PROGPOW_LANES];
    for (lane_id, lane) in mix.iter_mut().enumerate() {
        *lane = fill_mix(seed, lane_id as u32);
    }

    for loop_idx in 0..PROGPOW_CNT_DAG {
        progpow_loop(ctx, prog_seed, loop_idx, &mut mix);
    }

    let mut lane_hash = [0u32; PROGPOW_LANES];
    for (l, lane) in mix.iter().enumerate() {
        lane_hash[l] = FNV_OFFSET_BASIS;
        for reg in lane {
            fnv1a(&mut lane_hash[l], *reg);
        }
    }

    let mut digest = [FNV_OFFSET_BASIS; 8];
    for (l, h) in lane_hash.iter().enumerate() {
        fnv1a(&mut digest[l % 8], *h);
    }
    digest
}

/// Final ProgPoW hash from a header hash, claimed mix and nonce.
///
/// Cheap: two sponge passes, no dataset access. This is what block identity
/// is built on.
pub fn verify_final_progpow_hash(header_hash: &[u8; 32], mix: &[u8; 32], nonce: u64) -> [u8; 32] {
    let header = value_limbs(header_hash);
    let seed = progpow_seed(&header, nonce);
    let words = keccak_progpow(&header, seed, &value_limbs(mix));
    value_from_words(&words)
}

/// Full ProgPoW verification: recomputes the mix over the epoch dataset,
/// checks it against the claimed mix, and checks the final hash against the
/// big-endian target.
pub fn verify_progpow(
    ctx: &EpochContext,
    height: u32,
    header_hash: &[u8; 32],
    mix: &[u8; 32],
    nonce: u64,
    target: &[u8; 32],
) -> bool {
    let header = value_limbs(header_hash);
    let seed = progpow_seed(&header, nonce);

    let digest = hash_mix(ctx, height, seed);
    if digest != value_limbs(mix) {
        return false;
    }

    let final_hash = value_from_words(&keccak_progpow(&header, seed, &digest));
    final_hash <= *target
}
