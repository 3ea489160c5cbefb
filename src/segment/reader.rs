use std::fs::{self, File};
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use tracing::warn;

use crate::error::Result;
use crate::types::{Key, Value};

const LEN_SIZE: usize = 4;

/// Sequential scan over one whole segment file, yielding
/// `(offset, key, value)` per record.
///
/// Used to rebuild the index at startup; point lookups go through
/// [`read_value_at`] instead. The file is loaded once and walked in
/// memory. A record cut short by a partial write ends the scan — every
/// record before it is valid.
pub struct SegmentScan {
    data: Vec<u8>,
    offset: usize,
}

impl SegmentScan {
    /// Open a segment file for scanning.
    pub fn open(path: &Path) -> Result<Self> {
        let data = fs::read(path)?;
        Ok(SegmentScan { data, offset: 0 })
    }
}

impl Iterator for SegmentScan {
    type Item = (u64, Key, Value);

    fn next(&mut self) -> Option<Self::Item> {
        if self.offset >= self.data.len() {
            return None;
        }

        let start = self.offset;
        match decode_at(&self.data, start) {
            Some((key, value, next)) => {
                self.offset = next;
                Some((start as u64, key, value))
            }
            None => {
                warn!(
                    discarded_bytes = self.data.len() - start,
                    "stopping segment scan at truncated record"
                );
                self.offset = self.data.len();
                None
            }
        }
    }
}

/// Decode the record starting at `offset`; `None` if the bytes run out
/// before the record does.
fn decode_at(data: &[u8], offset: usize) -> Option<(Key, Value, usize)> {
    let key_len = read_len(data, offset)?;
    let key_start = offset + LEN_SIZE;
    let key_end = key_start.checked_add(key_len)?;
    if key_end + LEN_SIZE > data.len() {
        return None;
    }

    let value_len = read_len(data, key_end)?;
    let value_start = key_end + LEN_SIZE;
    let value_end = value_start.checked_add(value_len)?;
    if value_end > data.len() {
        return None;
    }

    Some((
        data[key_start..key_end].to_vec(),
        data[value_start..value_end].to_vec(),
        value_end,
    ))
}

fn read_len(data: &[u8], offset: usize) -> Option<usize> {
    let bytes = data.get(offset..offset + LEN_SIZE)?;
    Some(u32::from_le_bytes(bytes.try_into().unwrap()) as usize)
}

/// Read the record at `offset` in `path` and return its value.
///
/// The key bytes are skipped rather than compared — the index recorded
/// this exact position when the record was written or scanned.
pub fn read_value_at(path: &Path, offset: u64) -> Result<Value> {
    let mut file = File::open(path)?;
    file.seek(SeekFrom::Start(offset))?;

    let mut len_buf = [0u8; LEN_SIZE];
    file.read_exact(&mut len_buf)?;
    let key_len = u32::from_le_bytes(len_buf) as i64;
    file.seek(SeekFrom::Current(key_len))?;

    file.read_exact(&mut len_buf)?;
    let value_len = u32::from_le_bytes(len_buf) as usize;
    let mut value = vec![0u8; value_len];
    file.read_exact(&mut value)?;

    Ok(value)
}
