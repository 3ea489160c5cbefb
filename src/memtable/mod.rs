pub mod skiplist;

use skiplist::{SkipList, SkipListIterator};

use crate::types::{Key, TOMBSTONE, Value};

/// In-memory sorted buffer for writes. Wraps a [`SkipList`].
///
/// Every write lands here first. Once the engine's mutation counter reaches
/// its flush threshold, the whole memtable is written out as a segment and
/// cleared.
///
/// Deletes are handled via tombstones — the key is written back with the
/// reserved [`TOMBSTONE`] value prefix rather than removed. The key can't
/// simply be unlinked because an older version may exist in a segment on
/// disk, and the tombstone must shadow it until compaction.
///
/// The memtable never touches the WAL or disk; durability is the engine's
/// responsibility.
pub struct MemTable {
    data: SkipList,
}

impl MemTable {
    /// Create a new empty memtable.
    pub fn new() -> Self {
        MemTable {
            data: SkipList::new(),
        }
    }

    /// Insert or update a key-value pair.
    pub fn put(&mut self, key: Key, value: Value) {
        self.data.insert(key, value);
    }

    /// Mark a key as deleted by writing a tombstone value.
    pub fn remove(&mut self, key: Key) {
        self.data.insert(key, TOMBSTONE.to_vec());
    }

    /// Look up a key. The returned value may be a tombstone — callers must
    /// check [`is_tombstone`](crate::types::is_tombstone) before surfacing it.
    pub fn get(&self, key: &[u8]) -> Option<&[u8]> {
        self.data.get(key)
    }

    /// Up to `limit` entries in ascending key order, tombstones included.
    /// `None` means unbounded.
    pub fn get_range(&self, limit: Option<usize>) -> Vec<(Key, Value)> {
        let pairs = self
            .data
            .iter()
            .map(|(k, v)| (k.to_vec(), v.to_vec()));
        match limit {
            Some(n) => pairs.take(n).collect(),
            None => pairs.collect(),
        }
    }

    /// Sorted iterator over all entries, tombstones included.
    pub fn iter(&self) -> SkipListIterator<'_> {
        self.data.iter()
    }

    /// Number of entries, tombstones included.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the memtable holds no entries at all.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Drop every entry, resetting to the empty state. Called by the engine
    /// immediately after a successful flush.
    pub fn clear(&mut self) {
        self.data.clear();
    }
}

impl Default for MemTable {
    fn default() -> Self {
        MemTable::new()
    }
}
