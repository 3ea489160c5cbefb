//! Immutable on-disk segments and the index that spans them.
//!
//! A flush turns the memtable into one new segment file; compaction merges
//! every live record into a single replacement segment and deletes the
//! rest. [`SegmentManager`] owns the directory, the `key → (file, offset)`
//! index, and both of those operations.

pub mod reader;
pub mod writer;

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{debug, info, warn};

use crate::error::Result;
use crate::types::{Key, Value, is_tombstone};
use reader::{SegmentScan, read_value_at};
use writer::SegmentWriter;

const SEGMENT_PREFIX: &str = "segment_";
const SEGMENT_EXT: &str = "dat";

/// Where an indexed key's newest on-disk record lives.
#[derive(Debug, Clone)]
struct SegmentLocation {
    path: PathBuf,
    offset: u64,
}

/// Manages the segment directory: immutable data files named
/// `segment_<millis>.dat` plus one in-memory index mapping each key to its
/// newest record across all of them.
///
/// The index is a `BTreeMap`, so ranged reads and compaction walk keys in
/// ascending order deterministically. Lookups open, read, and drop a file
/// handle per call; no descriptor outlives its operation.
///
/// Not internally synchronized — the engine wraps the manager in a
/// read-write lock shared with the compaction scheduler.
pub struct SegmentManager {
    dir: PathBuf,
    index: BTreeMap<Key, SegmentLocation>,
    /// Millisecond timestamp embedded in the most recently created segment
    /// name. New names must exceed it, so two flushes within one
    /// millisecond (or a clock step backwards) cannot collide.
    last_timestamp: u64,
}

impl SegmentManager {
    /// Open a manager over `dir`, creating the directory if missing, and
    /// rebuild the index from the segment files already present.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;

        let mut manager = SegmentManager {
            dir,
            index: BTreeMap::new(),
            last_timestamp: 0,
        };
        manager.load_segments()?;
        Ok(manager)
    }

    /// Scan the directory and rebuild the index from scratch.
    ///
    /// Files are read in embedded-timestamp order so that for a key present
    /// in several segments the newest record wins; directory enumeration
    /// order is never trusted. Files that don't parse as
    /// `segment_<millis>.dat` are skipped. A truncated record tail ends one
    /// file's scan without failing the load.
    fn load_segments(&mut self) -> Result<()> {
        self.index.clear();

        let mut segments: Vec<(u64, PathBuf)> = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            match parse_timestamp(&path) {
                Some(ts) => segments.push((ts, path)),
                None => {
                    warn!(path = %path.display(), "skipping unrecognized file in segment directory");
                }
            }
        }
        segments.sort();

        for (ts, path) in &segments {
            let mut records = 0usize;
            for (offset, key, _value) in SegmentScan::open(path)? {
                self.index.insert(
                    key,
                    SegmentLocation {
                        path: path.clone(),
                        offset,
                    },
                );
                records += 1;
            }
            debug!(path = %path.display(), records, "scanned segment");
            self.last_timestamp = self.last_timestamp.max(*ts);
        }

        info!(
            segments = segments.len(),
            keys = self.index.len(),
            "loaded segment directory"
        );
        Ok(())
    }

    /// Write `entries` (in the order supplied) into a brand-new segment
    /// file, then index each record's offset.
    ///
    /// The index is only touched once the file is durably complete, so a
    /// failed flush leaves the manager exactly as it was.
    pub fn flush(&mut self, entries: &[(Key, Value)]) -> Result<PathBuf> {
        let path = self.next_segment_path();
        let offsets = match write_segment(&path, entries.iter().map(|(k, v)| (&k[..], &v[..]))) {
            Ok(offsets) => offsets,
            Err(e) => {
                let _ = fs::remove_file(&path);
                return Err(e);
            }
        };

        for ((key, _), offset) in entries.iter().zip(offsets) {
            self.index.insert(
                key.clone(),
                SegmentLocation {
                    path: path.clone(),
                    offset,
                },
            );
        }

        info!(path = %path.display(), entries = entries.len(), "flushed new segment");
        Ok(path)
    }

    /// Point lookup via the index. `Ok(None)` when the key isn't indexed;
    /// the returned value may be a tombstone — the engine checks.
    pub fn get(&self, key: &[u8]) -> Result<Option<Value>> {
        match self.index.get(key) {
            Some(loc) => Ok(Some(read_value_at(&loc.path, loc.offset)?)),
            None => Ok(None),
        }
    }

    /// Up to `limit` indexed entries in ascending key order, each re-read
    /// from its segment file. `None` means all. Tombstones are included;
    /// the engine strips them after merging with the memtable.
    pub fn get_range(&self, limit: Option<usize>) -> Result<Vec<(Key, Value)>> {
        let take = limit.unwrap_or(usize::MAX);
        let mut out = Vec::with_capacity(take.min(self.index.len()));
        for (key, loc) in self.index.iter().take(take) {
            out.push((key.clone(), read_value_at(&loc.path, loc.offset)?));
        }
        Ok(out)
    }

    /// Merge every indexed entry into one fresh segment and delete the
    /// files it supersedes.
    ///
    /// The index already holds exactly one location per key (newest record
    /// wins at load and flush time), so the merge is a single ascending
    /// pass over it. Tombstoned keys are dropped outright: after a full
    /// merge no older segment remains for a tombstone to shadow, and the
    /// memtable takes precedence over segments regardless, so the marker
    /// has nothing left to guard.
    ///
    /// Existing files are deleted only after the replacement segment is
    /// fully written, fsynced, and indexed; a failed compaction leaves the
    /// previous files and index untouched.
    pub fn compact(&mut self) -> Result<()> {
        if self.index.is_empty() {
            return Ok(());
        }

        let mut merged: Vec<(Key, Value)> = Vec::with_capacity(self.index.len());
        let mut dropped = 0usize;
        for (key, loc) in &self.index {
            let value = read_value_at(&loc.path, loc.offset)?;
            if is_tombstone(&value) {
                dropped += 1;
                continue;
            }
            merged.push((key.clone(), value));
        }

        let mut new_index = BTreeMap::new();
        let survivor = if merged.is_empty() {
            // Every key was tombstoned; nothing to rewrite.
            None
        } else {
            let path = self.next_segment_path();
            let offsets = match write_segment(&path, merged.iter().map(|(k, v)| (&k[..], &v[..]))) {
                Ok(offsets) => offsets,
                Err(e) => {
                    let _ = fs::remove_file(&path);
                    return Err(e);
                }
            };
            for ((key, _), offset) in merged.iter().zip(offsets) {
                new_index.insert(
                    key.clone(),
                    SegmentLocation {
                        path: path.clone(),
                        offset,
                    },
                );
            }
            Some(path)
        };

        self.index = new_index;
        self.remove_superseded(survivor.as_deref())?;

        info!(
            keys = self.index.len(),
            tombstones_dropped = dropped,
            "compaction finished"
        );
        Ok(())
    }

    /// Number of keys currently indexed.
    pub fn indexed_keys(&self) -> usize {
        self.index.len()
    }

    /// Number of distinct segment files referenced by the index.
    pub fn segment_count(&self) -> usize {
        let paths: HashSet<&Path> = self.index.values().map(|loc| loc.path.as_path()).collect();
        paths.len()
    }

    /// Delete every recognized segment file except `keep`. Deletion
    /// failures are logged and skipped — the leftover file only holds
    /// records the new segment already supersedes, and the next load
    /// reads it first.
    fn remove_superseded(&self, keep: Option<&Path>) -> Result<()> {
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if parse_timestamp(&path).is_none() {
                continue;
            }
            if keep == Some(path.as_path()) {
                continue;
            }
            if let Err(e) = fs::remove_file(&path) {
                warn!(path = %path.display(), "failed to delete superseded segment: {e}");
            }
        }
        Ok(())
    }

    /// Path for the next segment file: `segment_<millis>.dat`, with the
    /// timestamp bumped forward if the clock hasn't advanced past the last
    /// name handed out.
    fn next_segment_path(&mut self) -> PathBuf {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        let ts = now.max(self.last_timestamp + 1);
        self.last_timestamp = ts;
        self.dir.join(format!("{SEGMENT_PREFIX}{ts}.{SEGMENT_EXT}"))
    }
}

/// Write all `entries` to a new file at `path` and return each record's
/// offset. The file is fsynced before this returns.
fn write_segment<'a>(
    path: &Path,
    entries: impl Iterator<Item = (&'a [u8], &'a [u8])>,
) -> Result<Vec<u64>> {
    let mut writer = SegmentWriter::create(path)?;
    let mut offsets = Vec::new();
    for (key, value) in entries {
        offsets.push(writer.append(key, value)?);
    }
    writer.finish()?;
    Ok(offsets)
}

/// The millisecond timestamp embedded in a segment filename, or `None` if
/// the path doesn't look like `segment_<millis>.dat`.
fn parse_timestamp(path: &Path) -> Option<u64> {
    if path.extension().and_then(|e| e.to_str()) != Some(SEGMENT_EXT) {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;
    stem.strip_prefix(SEGMENT_PREFIX)?.parse().ok()
}
