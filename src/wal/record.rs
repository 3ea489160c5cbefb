use crate::error::{Error, Result};
use crate::types::{Key, Value};

/// Operation type stored in the WAL.
///
/// `Read` exists in the on-disk encoding but the engine never appends it;
/// replay accepts and ignores it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpType {
    Create = 0x00,
    Read = 0x01,
    Update = 0x02,
    Delete = 0x03,
}

impl OpType {
    fn from_u8(byte: u8) -> Result<Self> {
        match byte {
            0x00 => Ok(OpType::Create),
            0x01 => Ok(OpType::Read),
            0x02 => Ok(OpType::Update),
            0x03 => Ok(OpType::Delete),
            _ => Err(Error::Corruption(format!("invalid op type: {}", byte))),
        }
    }
}

// Field sizes
const OP_SIZE: usize = 1;
const LEN_SIZE: usize = 4;

/// A single record in the WAL.
///
/// On-disk format:
/// ```text
/// ┌─────────┬─────────────┬───────────┬─────────────┬─────────────┐
/// │ Op (1B) │ Key Len(4B) │ Key (var) │ Val Len(4B) │ Value (var) │
/// └─────────┴─────────────┴───────────┴─────────────┴─────────────┘
/// ```
///
/// Lengths are little-endian. There is no checksum: a record that runs past
/// the end of the file was a partial write (crash mid-append), and recovery
/// stops there — all preceding records are valid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WALRecord {
    pub op: OpType,
    pub key: Key,
    pub value: Value,
}

impl WALRecord {
    /// Create a `Create` record. Every put is logged as a create; replay
    /// sorts out duplicates with its first-writer-wins policy.
    pub fn create(key: Key, value: Value) -> Self {
        WALRecord {
            op: OpType::Create,
            key,
            value,
        }
    }

    /// Create an `Update` record.
    pub fn update(key: Key, value: Value) -> Self {
        WALRecord {
            op: OpType::Update,
            key,
            value,
        }
    }

    /// Create a `Delete` record. Deletes carry no value.
    pub fn delete(key: Key) -> Self {
        WALRecord {
            op: OpType::Delete,
            key,
            value: Vec::new(),
        }
    }

    /// Serialize this record to bytes.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.encoded_size());

        buf.push(self.op as u8);
        buf.extend_from_slice(&(self.key.len() as u32).to_le_bytes());
        buf.extend_from_slice(&self.key);
        buf.extend_from_slice(&(self.value.len() as u32).to_le_bytes());
        buf.extend_from_slice(&self.value);

        buf
    }

    /// Deserialize one record from the front of `data`. Returns
    /// `Corruption` if the bytes end before the record does; callers
    /// replaying a log treat that as end-of-valid-data.
    pub fn decode(data: &[u8]) -> Result<Self> {
        if data.len() < OP_SIZE + LEN_SIZE {
            return Err(Error::Corruption("record header truncated".into()));
        }

        let op = OpType::from_u8(data[0])?;

        let key_len = u32::from_le_bytes(data[1..5].try_into().unwrap()) as usize;
        let key_end = OP_SIZE + LEN_SIZE + key_len;
        if data.len() < key_end + LEN_SIZE {
            return Err(Error::Corruption("record truncated in key".into()));
        }
        let key = data[OP_SIZE + LEN_SIZE..key_end].to_vec();

        let value_len =
            u32::from_le_bytes(data[key_end..key_end + LEN_SIZE].try_into().unwrap()) as usize;
        let total = key_end + LEN_SIZE + value_len;
        if data.len() < total {
            return Err(Error::Corruption("record truncated in value".into()));
        }
        let value = data[key_end + LEN_SIZE..total].to_vec();

        Ok(WALRecord { op, key, value })
    }

    /// Size of this record when serialized on disk.
    pub fn encoded_size(&self) -> usize {
        OP_SIZE + LEN_SIZE + self.key.len() + LEN_SIZE + self.value.len()
    }
}
