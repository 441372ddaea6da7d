//! Read-only ancestry view the difficulty engine walks.
//!
//! Ownership of block metadata lives with the caller (a chainstate, a header
//! tree, a test fixture); the engine only reads `height`, `bits`, times and
//! the parent link through this trait.

use crate::pow::CompactTarget;

/// Median-time-past window, in blocks.
const MEDIAN_TIME_SPAN: usize = 11;

/// One entry of the caller's block index.
pub trait BlockIndex {
    fn height(&self) -> u32;
    fn bits(&self) -> CompactTarget;
    fn block_time(&self) -> i64;
    fn prev(&self) -> Option<&Self>;

    /// Median of the last eleven block times, this block included.
    fn median_time_past(&self) -> i64 {
        let mut times = Vec::with_capacity(MEDIAN_TIME_SPAN);
        let mut cursor = Some(self);
        while let Some(entry) = cursor {
            if times.len() == MEDIAN_TIME_SPAN {
                break;
            }
            times.push(entry.block_time());
            cursor = entry.prev();
        }
        times.sort_unstable();
        times[times.len() / 2]
    }

    /// Ancestor at exactly `height`, walking parent links.
    fn ancestor(&self, height: u32) -> Option<&Self> {
        if height > self.height() {
            return None;
        }
        let mut cursor = self;
        while cursor.height() > height {
            cursor = cursor.prev()?;
        }
        Some(cursor)
    }
}

/// Owned singly-linked chain entry; the in-memory index used by tests and
/// tools that do not carry a full chainstate.
#[derive(Clone, Debug)]
pub struct ChainEntry {
    height: u32,
    bits: CompactTarget,
    time: i64,
    prev: Option<Box<ChainEntry>>,
}

impl ChainEntry {
    /// A chain root at `height` (not necessarily zero; difficulty walks only
    /// need the tail of a chain).
    pub fn root(height: u32, bits: CompactTarget, time: i64) -> Self {
        ChainEntry { height, bits, time, prev: None }
    }

    /// Extends the chain by one block, consuming the old tip.
    pub fn extend(self, bits: CompactTarget, time: i64) -> Self {
        ChainEntry {
            height: self.height + 1,
            bits,
            time,
            prev: Some(Box::new(self)),
        }
    }
}

impl BlockIndex for ChainEntry {
    fn height(&self) -> u32 {
        self.height
    }

    fn bits(&self) -> CompactTarget {
        self.bits
    }

    fn block_time(&self) -> i64 {
        self.time
    }

    fn prev(&self) -> Option<&Self> {
        self.prev.as_deref()
    }
}

// Long chains would otherwise recurse in the Box chain's drop glue.
impl Drop for ChainEntry {
    fn drop(&mut self) {
        let mut cursor = self.prev.take();
        while let Some(mut entry) = cursor {
            cursor = entry.prev.take();
        }
    }
}
