//! Write-ahead log: the durability layer.
//!
//! Every mutation is appended here, synced, and only then applied to the
//! memtable. [`writer::WALWriter`] appends and truncates, [`reader::WALReader`]
//! replays in append order at startup, and [`record::WALRecord`] is the
//! binary codec shared by both.

pub mod reader;
pub mod record;
pub mod writer;

pub use reader::{WALIterator, WALReader};
pub use record::{OpType, WALRecord};
pub use writer::WALWriter;
