// MemTable tests
// The memtable stores tombstones as ordinary values; callers decide what a
// tombstone means. These tests pin that contract down.

use lsmkv::memtable::MemTable;
use lsmkv::types::{is_tombstone, TOMBSTONE};

// =============================================================================
// Test 1: Basic put and get
// =============================================================================
#[test]
fn put_then_get_returns_value() {
    let mut mt = MemTable::new();
    mt.put(b"key".to_vec(), b"value".to_vec());

    assert_eq!(mt.get(b"key"), Some(b"value".as_slice()));
}

// =============================================================================
// Test 2: Get non-existent key
// =============================================================================
#[test]
fn get_nonexistent_returns_none() {
    let mt = MemTable::new();
    assert_eq!(mt.get(b"missing"), None);
}

// =============================================================================
// Test 3: Remove writes a tombstone, not an absence
// =============================================================================
// The engine layer filters tombstones; the memtable itself hands back the
// raw marker so flushes can carry it to disk.
#[test]
fn remove_writes_tombstone() {
    let mut mt = MemTable::new();
    mt.put(b"key".to_vec(), b"value".to_vec());
    mt.remove(b"key".to_vec());

    let raw = mt.get(b"key").unwrap();
    assert_eq!(raw, TOMBSTONE);
    assert!(is_tombstone(raw));
    assert_eq!(mt.len(), 1);
}

// =============================================================================
// Test 4: Put after remove restores a live value
// =============================================================================
#[test]
fn put_after_remove_restores_value() {
    let mut mt = MemTable::new();
    mt.put(b"key".to_vec(), b"first".to_vec());
    mt.remove(b"key".to_vec());
    mt.put(b"key".to_vec(), b"second".to_vec());

    let raw = mt.get(b"key").unwrap();
    assert_eq!(raw, b"second");
    assert!(!is_tombstone(raw));
}

// =============================================================================
// Test 5: Remove of a key never seen still leaves a tombstone
// =============================================================================
#[test]
fn remove_unknown_key_leaves_tombstone() {
    let mut mt = MemTable::new();
    mt.remove(b"never_existed".to_vec());

    assert!(is_tombstone(mt.get(b"never_existed").unwrap()));
}

// =============================================================================
// Test 6: get_range is ascending and includes tombstones
// =============================================================================
// Flushes depend on this: the tombstone must travel to disk so it can
// shadow older segment entries.
#[test]
fn get_range_includes_tombstones_in_order() {
    let mut mt = MemTable::new();
    mt.put(b"c".to_vec(), b"3".to_vec());
    mt.put(b"a".to_vec(), b"1".to_vec());
    mt.put(b"b".to_vec(), b"2".to_vec());
    mt.remove(b"b".to_vec());

    let entries = mt.get_range(None);
    let keys: Vec<&[u8]> = entries.iter().map(|(k, _)| k.as_slice()).collect();
    assert_eq!(keys, vec![&b"a"[..], b"b", b"c"]);
    assert!(is_tombstone(&entries[1].1));
}

// =============================================================================
// Test 7: get_range honors the limit
// =============================================================================
#[test]
fn get_range_respects_limit() {
    let mut mt = MemTable::new();
    for i in 0..10u32 {
        mt.put(format!("key{i}").into_bytes(), b"v".to_vec());
    }

    let entries = mt.get_range(Some(3));
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0].0, b"key0");
    assert_eq!(entries[2].0, b"key2");

    assert_eq!(mt.get_range(Some(0)).len(), 0);
    assert_eq!(mt.get_range(Some(100)).len(), 10);
}

// =============================================================================
// Test 8: Clear empties the table
// =============================================================================
#[test]
fn clear_empties_table() {
    let mut mt = MemTable::new();
    mt.put(b"a".to_vec(), b"1".to_vec());
    mt.remove(b"b".to_vec());
    assert_eq!(mt.len(), 2);

    mt.clear();
    assert!(mt.is_empty());
    assert_eq!(mt.get(b"a"), None);
    assert!(mt.get_range(None).is_empty());
}

// =============================================================================
// Test 9: iter walks live entries and tombstones alike
// =============================================================================
#[test]
fn iter_walks_all_entries() {
    let mut mt = MemTable::new();
    mt.put(b"a".to_vec(), b"1".to_vec());
    mt.remove(b"z".to_vec());

    let entries: Vec<(&[u8], &[u8])> = mt.iter().collect();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].0, b"a");
    assert_eq!(entries[1].0, b"z");
    assert!(is_tombstone(entries[1].1));
}
