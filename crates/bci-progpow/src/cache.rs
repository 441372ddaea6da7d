//! Ethash epoch contexts.
//!
//! Each epoch owns a light cache (~16 MB at epoch 0, grown per epoch) from
//! which 64-byte dataset items are derived on demand, plus the first 16 KB of
//! the dataset kept resident as ProgPoW's L1 cache. Contexts are shared
//! process-wide; construction of a new epoch is serialised, readers clone an
//! `Arc`.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};

use crate::keccak::{keccak256, keccak512};
use crate::progpow::PROGPOW_CACHE_BYTES;

const HASH_BYTES: usize = 64;
const MIX_BYTES: usize = 128;
const CACHE_BYTES_INIT: usize = 1 << 24;
const CACHE_BYTES_GROWTH: usize = 1 << 17;
const DATASET_BYTES_INIT: usize = 1 << 30;
const DATASET_BYTES_GROWTH: usize = 1 << 23;
const CACHE_ROUNDS: usize = 3;
const DATASET_PARENTS: u32 = 256;

const FNV_PRIME: u32 = 0x0100_0193;

#[inline]
fn fnv(a: u32, b: u32) -> u32 {
    a.wrapping_mul(FNV_PRIME) ^ b
}

/// One 512-bit cache/dataset item as 16 little-endian words.
type Item = [u32; 16];

fn item_to_bytes(item: &Item) -> [u8; HASH_BYTES] {
    let mut out = [0u8; HASH_BYTES];
    for (i, w) in item.iter().enumerate() {
        out[4 * i..4 * i + 4].copy_from_slice(&w.to_le_bytes());
    }
    out
}

fn item_from_bytes(bytes: &[u8; HASH_BYTES]) -> Item {
    let mut out = [0u32; 16];
    for (i, w) in out.iter_mut().enumerate() {
        *w = u32::from_le_bytes(bytes[4 * i..4 * i + 4].try_into().expect("4-byte chunk"));
    }
    out
}

fn is_prime(n: usize) -> bool {
    if n < 2 {
        return false;
    }
    if n % 2 == 0 {
        return n == 2;
    }
    let mut d = 3;
    while d * d <= n {
        if n % d == 0 {
            return false;
        }
        d += 2;
    }
    true
}

fn cache_size(epoch: u32) -> usize {
    let mut size = CACHE_BYTES_INIT + CACHE_BYTES_GROWTH * epoch as usize - HASH_BYTES;
    while !is_prime(size / HASH_BYTES) {
        size -= 2 * HASH_BYTES;
    }
    size
}

fn dataset_size(epoch: u32) -> usize {
    let mut size = DATASET_BYTES_INIT + DATASET_BYTES_GROWTH * epoch as usize - MIX_BYTES;
    while !is_prime(size / MIX_BYTES) {
        size -= 2 * MIX_BYTES;
    }
    size
}

/// Seed hash for an epoch: `keccak256` iterated `epoch` times over zero.
fn epoch_seed(epoch: u32) -> [u8; 32] {
    let mut seed = [0u8; 32];
    for _ in 0..epoch {
        seed = keccak256(&seed);
    }
    seed
}

/// Shared per-epoch verification state.
pub struct EpochContext {
    epoch: u32,
    light_cache: Vec<Item>,
    full_dataset_bytes: usize,
    l1_cache: Vec<u32>,
}

impl EpochContext {
    /// Builds the light cache and L1 cache for `epoch`. Expensive (seconds).
    pub fn new(epoch: u32) -> Self {
        let num_items = cache_size(epoch) / HASH_BYTES;
        let seed = epoch_seed(epoch);

        // Sequential fill.
        let mut cache: Vec<Item> = Vec::with_capacity(num_items);
        cache.push(item_from_bytes(&keccak512(&seed)));
        for i in 1..num_items {
            let prev = item_to_bytes(&cache[i - 1]);
            cache.push(item_from_bytes(&keccak512(&prev)));
        }

        // Low-round memo-hash strengthening.
        for _ in 0..CACHE_ROUNDS {
            for i in 0..num_items {
                let v = cache[i][0] as usize % num_items;
                let u = (i + num_items - 1) % num_items;
                let mut mixed = [0u8; HASH_BYTES];
                let a = item_to_bytes(&cache[u]);
                let b = item_to_bytes(&cache[v]);
                for (m, (x, y)) in mixed.iter_mut().zip(a.iter().zip(b.iter())) {
                    *m = x ^ y;
                }
                cache[i] = item_from_bytes(&keccak512(&mixed));
            }
        }

        let mut ctx = EpochContext {
            epoch,
            light_cache: cache,
            full_dataset_bytes: dataset_size(epoch),
            l1_cache: Vec::new(),
        };

        // First PROGPOW_CACHE_BYTES of the dataset, kept resident.
        let l1_items = PROGPOW_CACHE_BYTES / HASH_BYTES;
        let mut l1 = Vec::with_capacity(l1_items * 16);
        for i in 0..l1_items {
            l1.extend_from_slice(&ctx.dataset_item(i));
        }
        ctx.l1_cache = l1;
        ctx
    }

    pub fn epoch(&self) -> u32 {
        self.epoch
    }

    /// Total bytes of the (virtual) full dataset; bounds ProgPoW addressing.
    pub(crate) fn full_dataset_bytes(&self) -> usize {
        self.full_dataset_bytes
    }

    pub(crate) fn l1_word(&self, index: usize) -> u32 {
        self.l1_cache[index]
    }

    /// 512-bit dataset item `index`, derived from the light cache.
    pub(crate) fn dataset_item(&self, index: usize) -> Item {
        let n = self.light_cache.len();
        let mut mix = self.light_cache[index % n];
        mix[0] ^= index as u32;
        mix = item_from_bytes(&keccak512(&item_to_bytes(&mix)));

        for j in 0..DATASET_PARENTS {
            let parent = fnv(index as u32 ^ j, mix[j as usize % 16]) as usize % n;
            let parent_item = &self.light_cache[parent];
            for (m, p) in mix.iter_mut().zip(parent_item.iter()) {
                *m = fnv(*m, *p);
            }
        }

        item_from_bytes(&keccak512(&item_to_bytes(&mix)))
    }
}

/// Process-wide epoch context cache.
///
/// Safe for concurrent readers; building a missing epoch happens under the
/// map lock, so exactly one builder runs at a time.
pub fn get_global_epoch_context(epoch: u32) -> Arc<EpochContext> {
    static CONTEXTS: OnceLock<Mutex<HashMap<u32, Arc<EpochContext>>>> = OnceLock::new();
    let map = CONTEXTS.get_or_init(|| Mutex::new(HashMap::new()));
    let mut guard = map.lock().expect("epoch context lock poisoned");
    guard
        .entry(epoch)
        .or_insert_with(|| Arc::new(EpochContext::new(epoch)))
        .clone()
}
