use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use tracing::{debug, info};

use crate::compaction::CompactionScheduler;
use crate::engine::StorageEngine;
use crate::error::Result;
use crate::memtable::MemTable;
use crate::segment::SegmentManager;
use crate::types::{Key, Value, is_tombstone};
use crate::wal::{OpType, WALReader, WALRecord, WALWriter};

/// Configuration for a [`Db`].
#[derive(Debug, Clone)]
pub struct Options {
    /// Write-ahead log file path.
    pub wal_path: PathBuf,
    /// Directory holding segment files.
    pub segment_dir: PathBuf,
    /// Mutation count that triggers a memtable flush.
    pub flush_threshold: usize,
    /// How often the background scheduler compacts the segments.
    pub compaction_interval: Duration,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            wal_path: PathBuf::from("data/db.wal"),
            segment_dir: PathBuf::from("data/segments"),
            flush_threshold: 2000,
            compaction_interval: Duration::from_secs(10),
        }
    }
}

impl Options {
    /// Place both the WAL and the segment directory under one data
    /// directory, keeping the default tuning.
    pub fn at(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        Options {
            wal_path: dir.join("db.wal"),
            segment_dir: dir.join("segments"),
            ..Options::default()
        }
    }
}

/// Point-in-time counters for inspection and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stats {
    /// Entries in the memtable, tombstones included.
    pub memtable_entries: usize,
    /// Bytes currently in the WAL file.
    pub wal_bytes: u64,
    /// Distinct segment files referenced by the index.
    pub segment_files: usize,
    /// Keys in the on-disk index.
    pub indexed_keys: usize,
}

/// The LSM storage engine.
///
/// Opening a `Db` loads the segment index, replays the WAL into a fresh
/// memtable, and starts the background compaction scheduler; from then on
/// it is ready and fully thread-safe. Writers serialize on one mutex so
/// WAL order always matches memtable order; readers share the memtable and
/// segment locks. Consuming the value with [`Db::close`] (or dropping it)
/// stops the scheduler, waits out any in-flight compaction, and releases
/// the file handles.
///
/// Lock order, where two are held at once: write lock → WAL → memtable →
/// segments.
pub struct Db {
    // Declared first: dropped first, joining the scheduler thread before
    // any file handle below goes away.
    scheduler: CompactionScheduler,
    write_lock: Mutex<()>,
    wal: Mutex<WALWriter>,
    memtable: RwLock<MemTable>,
    segments: Arc<RwLock<SegmentManager>>,
    /// Mutations applied to the current memtable generation; reset on
    /// flush. Only a writer holding the write lock updates it.
    mutations: AtomicUsize,
    flush_threshold: usize,
}

impl Db {
    /// Open (or create) an engine over the paths in `options`.
    ///
    /// Fails fatally on any I/O error — a half-initialized engine is never
    /// returned.
    pub fn open(options: Options) -> Result<Db> {
        if let Some(parent) = options.wal_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let segments = SegmentManager::open(&options.segment_dir)?;
        let wal = WALWriter::open(&options.wal_path)?;

        let mut memtable = MemTable::new();
        let mut replayed = 0usize;
        for record in WALReader::open(&options.wal_path)?.iter() {
            if replay(&mut memtable, record) {
                replayed += 1;
            }
        }
        info!(
            applied = replayed,
            entries = memtable.len(),
            "replayed write-ahead log"
        );

        let segments = Arc::new(RwLock::new(segments));
        let scheduler =
            CompactionScheduler::start(Arc::clone(&segments), options.compaction_interval)?;

        info!(
            wal = %options.wal_path.display(),
            segments = %options.segment_dir.display(),
            "storage engine ready"
        );

        Ok(Db {
            scheduler,
            write_lock: Mutex::new(()),
            wal: Mutex::new(wal),
            memtable: RwLock::new(memtable),
            segments,
            mutations: AtomicUsize::new(0),
            flush_threshold: options.flush_threshold,
        })
    }

    /// Store `value` under `key`. Logged as a `Create`, then applied to the
    /// memtable; durable once this returns.
    pub fn put(&self, key: &[u8], value: &[u8]) -> Result<()> {
        self.apply_write(WALRecord::create(key.to_vec(), value.to_vec()))
    }

    /// Remove `key` by logging a `Delete` and writing a tombstone over it.
    /// Removing an absent key still logs and counts — the tombstone must
    /// shadow whatever a segment might hold.
    pub fn remove(&self, key: &[u8]) -> Result<()> {
        self.apply_write(WALRecord::delete(key.to_vec()))
    }

    /// Current value for `key`: the memtable's if it has one, else the
    /// newest on-disk record's. A tombstone in either place means `None`.
    pub fn get(&self, key: &[u8]) -> Result<Option<Value>> {
        if let Some(value) = self.memtable.read().get(key) {
            if is_tombstone(value) {
                return Ok(None);
            }
            return Ok(Some(value.to_vec()));
        }

        match self.segments.read().get(key)? {
            Some(value) if is_tombstone(&value) => Ok(None),
            other => Ok(other),
        }
    }

    /// Up to `limit` live entries in ascending key order (`None` means
    /// unbounded): on-disk entries merged with the memtable, memtable
    /// winning on conflict, tombstoned keys stripped, the limit applied to
    /// the final merged result.
    pub fn get_range(&self, limit: Option<usize>) -> Result<Vec<(Key, Value)>> {
        // Memtable snapshot first: a concurrent flush moves entries from
        // memtable to segments, so reading the other way around could miss
        // them entirely.
        let mem = self.memtable.read().get_range(None);
        let disk = self.segments.read().get_range(None)?;

        let mut merged: BTreeMap<Key, Value> = disk.into_iter().collect();
        merged.extend(mem);

        Ok(merged
            .into_iter()
            .filter(|(_, value)| !is_tombstone(value))
            .take(limit.unwrap_or(usize::MAX))
            .collect())
    }

    /// Point-in-time counters. Each lock is taken and released on its own;
    /// the snapshot is not atomic across them.
    pub fn stats(&self) -> Stats {
        let (segment_files, indexed_keys) = {
            let segments = self.segments.read();
            (segments.segment_count(), segments.indexed_keys())
        };
        let wal_bytes = self.wal.lock().len();
        let memtable_entries = self.memtable.read().len();
        Stats {
            memtable_entries,
            wal_bytes,
            segment_files,
            indexed_keys,
        }
    }

    /// Shut down: stop the compaction scheduler, wait for any in-flight
    /// compaction, and release the file handles. Dropping the engine does
    /// the same; `close` just makes the point explicit at call sites.
    pub fn close(mut self) {
        self.scheduler.stop();
    }

    /// Log the record, apply it to the memtable, and flush if the mutation
    /// counter has reached the threshold. The WAL append happens strictly
    /// before the memtable changes; if it fails, no state has moved.
    fn apply_write(&self, record: WALRecord) -> Result<()> {
        let _guard = self.write_lock.lock();

        self.wal.lock().append(&record)?;

        let WALRecord { op, key, value } = record;
        {
            let mut memtable = self.memtable.write();
            if op == OpType::Delete {
                memtable.remove(key);
            } else {
                memtable.put(key, value);
            }
        }

        let mutations = self.mutations.fetch_add(1, Ordering::Relaxed) + 1;
        if mutations >= self.flush_threshold {
            self.flush_memtable()?;
        }
        Ok(())
    }

    /// Flush the memtable into a new segment, then truncate the WAL, clear
    /// the memtable, and reset the counter — in that order, so a failure
    /// at any step leaves everything still recoverable and the next
    /// mutation retries. Caller holds the write lock.
    fn flush_memtable(&self) -> Result<()> {
        let entries = self.memtable.read().get_range(None);
        if entries.is_empty() {
            return Ok(());
        }

        self.segments.write().flush(&entries)?;
        self.wal.lock().clear()?;
        self.memtable.write().clear();
        self.mutations.store(0, Ordering::Relaxed);

        debug!(entries = entries.len(), "memtable flushed and cleared");
        Ok(())
    }
}

impl StorageEngine for Db {
    fn put(&self, key: &[u8], value: &[u8]) -> Result<()> {
        Db::put(self, key, value)
    }

    fn get(&self, key: &[u8]) -> Result<Option<Value>> {
        Db::get(self, key)
    }

    fn remove(&self, key: &[u8]) -> Result<()> {
        Db::remove(self, key)
    }

    fn get_range(&self, limit: Option<usize>) -> Result<Vec<(Key, Value)>> {
        Db::get_range(self, limit)
    }
}

/// Conservative WAL replay policy: a `Create` only fills an absent key, an
/// `Update` only touches a present one, a `Delete` always lands (as a
/// tombstone), and `Read` records are ignored. Returns whether the record
/// was applied.
///
/// Note the asymmetry is deliberate and not a general merge rule: a delete
/// followed by a replayed create leaves the tombstone in place, because the
/// tombstoned key counts as present.
fn replay(memtable: &mut MemTable, record: WALRecord) -> bool {
    match record.op {
        OpType::Create => {
            if memtable.get(&record.key).is_none() {
                memtable.put(record.key, record.value);
                true
            } else {
                debug!("replay skipped create for existing key");
                false
            }
        }
        OpType::Update => {
            if memtable.get(&record.key).is_some() {
                memtable.put(record.key, record.value);
                true
            } else {
                debug!("replay skipped update for unknown key");
                false
            }
        }
        OpType::Delete => {
            memtable.remove(record.key);
            true
        }
        OpType::Read => false,
    }
}
