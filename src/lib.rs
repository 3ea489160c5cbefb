//! # lsmkv — an embedded LSM-tree key-value storage engine
//!
//! A single-node key-value store using the Log-Structured Merge design:
//! writes land in a write-ahead log and an in-memory sorted buffer, the
//! buffer is periodically flushed into immutable on-disk segments, and a
//! background task periodically merges those segments back into one.
//!
//! ## Core idea
//! Instead of updating data in place (B-Tree), buffer writes in memory,
//! flush them as sorted files, and merge those files in the background.
//! This turns random writes into sequential writes.
//!
//! ```no_run
//! use lsmkv::{Db, Options};
//!
//! # fn main() -> lsmkv::Result<()> {
//! let db = Db::open(Options::at("data"))?;
//! db.put(b"a", b"apple")?;
//! assert_eq!(db.get(b"a")?.as_deref(), Some(&b"apple"[..]));
//! db.remove(b"a")?;
//! assert_eq!(db.get(b"a")?, None);
//! db.close();
//! # Ok(())
//! # }
//! ```

pub mod compaction;
pub mod db;
pub mod engine;
pub mod error;
pub mod memtable;
pub mod segment;
pub mod types;
pub mod wal;

// Public re-exports for the top-level API
pub use db::{Db, Options, Stats};
pub use engine::StorageEngine;
pub use error::{Error, Result};
pub use types::{Key, Value};
