//! Index Module
//!
//! In-memory map from key to the offset of that key's latest record.
//!
//! ## Responsibilities
//! - O(1) key → offset lookups for reads
//! - Rebuild by replaying the data file on startup
//! - Decide which records are still live during merge
//!
//! Nothing here touches the disk except through [`LogFile::iter`] during
//! replay. The index is never persisted.

use std::collections::HashMap;

use crate::error::Result;
use crate::log::{LogFile, Mark};

/// Counters collected while replaying the data file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplayStats {
    /// Records decoded
    pub entries_replayed: u64,

    /// PUT records seen
    pub puts: u64,

    /// DEL records seen
    pub deletes: u64,

    /// Keys left in the index after replay
    pub live_keys: usize,

    /// Bytes of the log consumed
    pub bytes_scanned: u64,
}

/// Key → latest offset
#[derive(Debug, Default)]
pub struct Index {
    offsets: HashMap<Vec<u8>, u64>,
}

impl Index {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from the whole log
    pub fn rebuild(log: &LogFile) -> Result<Self> {
        Self::rebuild_with_stats(log).map(|(index, _)| index)
    }

    /// Rebuild from the whole log, reporting what was seen
    ///
    /// Records are replayed in write order so the last one for a key wins:
    /// a PUT points the key at its offset, a DEL removes the key. A record
    /// that cannot be decoded aborts the rebuild.
    pub fn rebuild_with_stats(log: &LogFile) -> Result<(Self, ReplayStats)> {
        let mut index = Self::new();
        let mut stats = ReplayStats::default();

        for item in log.iter()? {
            let (offset, entry) = item?;

            stats.entries_replayed += 1;
            stats.bytes_scanned += entry.encoded_size();

            match entry.mark {
                Mark::Put => {
                    stats.puts += 1;
                    index.set(entry.key, offset);
                }
                Mark::Del => {
                    stats.deletes += 1;
                    index.remove(&entry.key);
                }
            }
        }

        stats.live_keys = index.len();
        Ok((index, stats))
    }

    pub fn get(&self, key: &[u8]) -> Option<u64> {
        self.offsets.get(key).copied()
    }

    /// Point `key` at `offset`, returning the previous offset
    pub fn set(&mut self, key: Vec<u8>, offset: u64) -> Option<u64> {
        self.offsets.insert(key, offset)
    }

    pub fn remove(&mut self, key: &[u8]) -> Option<u64> {
        self.offsets.remove(key)
    }

    pub fn contains(&self, key: &[u8]) -> bool {
        self.offsets.contains_key(key)
    }

    /// True if the record for `key` at `offset` is the one the index points at
    pub fn is_live(&self, key: &[u8], offset: u64) -> bool {
        self.get(key) == Some(offset)
    }

    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// Indexed keys in no particular order
    pub fn keys(&self) -> impl Iterator<Item = &[u8]> {
        self.offsets.keys().map(|k| k.as_slice())
    }

    pub fn clear(&mut self) {
        self.offsets.clear();
    }
}
