use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::Result;

/// Builds one immutable segment file from a stream of key-value pairs.
///
/// Used during memtable flush and compaction. Record layout (lengths
/// little-endian):
/// ```text
/// ┌─────────────┬───────────┬─────────────┬─────────────┐
/// │ Key Len(4B) │ Key (var) │ Val Len(4B) │ Value (var) │
/// └─────────────┴───────────┴─────────────┴─────────────┘
/// ```
/// No op byte — a segment stores only current key/value state, with
/// tombstones written as ordinary values carrying the reserved prefix.
pub struct SegmentWriter {
    writer: BufWriter<File>,
    offset: u64,
}

impl SegmentWriter {
    /// Create a new segment file at the given path.
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path)?;
        Ok(SegmentWriter {
            writer: BufWriter::new(file),
            offset: 0,
        })
    }

    /// Append one record, returning the file offset it starts at. The
    /// caller records that offset in the index.
    pub fn append(&mut self, key: &[u8], value: &[u8]) -> Result<u64> {
        let offset = self.offset;

        self.writer.write_all(&(key.len() as u32).to_le_bytes())?;
        self.writer.write_all(key)?;
        self.writer.write_all(&(value.len() as u32).to_le_bytes())?;
        self.writer.write_all(value)?;

        self.offset += (4 + key.len() + 4 + value.len()) as u64;
        Ok(offset)
    }

    /// Finalize the segment: flush buffers and fsync. Only after this
    /// returns may the file's records be indexed — the file is immutable
    /// from here on.
    pub fn finish(mut self) -> Result<()> {
        self.writer.flush()?;
        self.writer.get_ref().sync_all()?;
        Ok(())
    }
}
