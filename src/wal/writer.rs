use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::Result;
use crate::wal::record::WALRecord;

/// Appends WAL records to a file on disk.
///
/// Every append is durable before it returns — a write is only acknowledged
/// to the caller once its record survives a crash. On restart, replaying the
/// WAL reconstructs the memtable.
///
/// Two layers of buffering to get through:
/// ```text
/// BufWriter.flush()  → Rust buffer → OS page cache
/// file.sync_all()    → OS page cache → physical disk
/// ```
pub struct WALWriter {
    writer: BufWriter<File>,
    len: u64,
}

impl WALWriter {
    /// Open (creating if missing) the WAL file at `path` for appending.
    /// Fails fatally if the file cannot be opened or created.
    pub fn open(path: &Path) -> Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let len = file.metadata()?.len();

        Ok(WALWriter {
            writer: BufWriter::new(file),
            len,
        })
    }

    /// Append a record and sync it to stable storage.
    pub fn append(&mut self, record: &WALRecord) -> Result<()> {
        let encoded = record.encode();

        self.writer.write_all(&encoded)?;
        self.writer.flush()?;
        self.writer.get_ref().sync_all()?;
        self.len += encoded.len() as u64;

        Ok(())
    }

    /// Truncate the log to empty. Called only once the memtable contents it
    /// covers have been durably flushed to a segment; the file handle stays
    /// open and subsequent appends start from the beginning.
    pub fn clear(&mut self) -> Result<()> {
        self.writer.flush()?;
        self.writer.get_ref().set_len(0)?;
        self.writer.get_ref().sync_all()?;
        self.len = 0;

        Ok(())
    }

    /// Bytes currently in the log file.
    pub fn len(&self) -> u64 {
        self.len
    }

    /// Whether the log file is empty.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}
