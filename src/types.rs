/// Raw key bytes.
pub type Key = Vec<u8>;

/// Raw value bytes.
pub type Value = Vec<u8>;

/// Reserved value prefix marking a key as logically deleted.
///
/// A delete doesn't remove the key from the memtable or segments — it writes
/// the key back with a value carrying this prefix. Every reader that can
/// surface a raw value must check [`is_tombstone`] and treat a match as
/// "key absent". The prefix starts with 0x1E (the ASCII record separator),
/// which keeps it out of the way of ordinary text values.
pub const TOMBSTONE: &[u8] = b"\x1ETOMB";

/// Whether a raw value is a tombstone (starts with the reserved prefix).
pub fn is_tombstone(value: &[u8]) -> bool {
    value.starts_with(TOMBSTONE)
}
