use std::fs;
use std::path::Path;

use tracing::warn;

use crate::error::Result;
use crate::wal::record::WALRecord;

/// Reads WAL records back for crash recovery.
///
/// Loads the entire file into memory, then iterates record by record in
/// append order. A record that decodes cleanly is yielded; the first one
/// that doesn't ends the replay.
pub struct WALReader {
    data: Vec<u8>,
}

impl WALReader {
    /// Open a WAL file for reading.
    pub fn open(path: &Path) -> Result<Self> {
        let data = fs::read(path)?;
        Ok(WALReader { data })
    }

    /// Iterator over all valid records in the log.
    pub fn iter(&self) -> WALIterator<'_> {
        WALIterator {
            data: &self.data,
            offset: 0,
        }
    }
}

/// Iterator over WAL records. Yields records until the bytes run out.
///
/// A record that ends past the end of the file was a partial write from a
/// crash mid-append. WAL writes are sequential and append-only, so nothing
/// valid can follow it — iteration stops there and the tail is discarded.
pub struct WALIterator<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> Iterator for WALIterator<'a> {
    type Item = WALRecord;

    fn next(&mut self) -> Option<Self::Item> {
        if self.offset >= self.data.len() {
            return None;
        }

        match WALRecord::decode(&self.data[self.offset..]) {
            Ok(record) => {
                self.offset += record.encoded_size();
                Some(record)
            }
            Err(e) => {
                warn!(
                    discarded_bytes = self.data.len() - self.offset,
                    "stopping WAL replay at corrupt tail: {e}"
                );
                self.offset = self.data.len();
                None
            }
        }
    }
}
