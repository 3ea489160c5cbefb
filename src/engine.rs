use crate::error::Result;
use crate::types::{Key, Value};

/// The capability a storage engine exposes to its callers.
///
/// The CLI and daemon layers talk to storage exclusively through this
/// trait, so the LSM engine is one implementation among possible others —
/// a test double backed by a plain map satisfies the same contract.
///
/// All methods take `&self`; implementations handle their own interior
/// synchronization.
pub trait StorageEngine {
    /// Store `value` under `key`, overwriting any previous value. The
    /// write is durable when this returns.
    fn put(&self, key: &[u8], value: &[u8]) -> Result<()>;

    /// Current value for `key`, or `None` if the key was never written or
    /// has been removed. Deletion markers never leak out of this method.
    fn get(&self, key: &[u8]) -> Result<Option<Value>>;

    /// Remove `key`. Removing an absent key is a no-op.
    fn remove(&self, key: &[u8]) -> Result<()>;

    /// Up to `limit` live entries in ascending key order; `None` means
    /// unbounded.
    fn get_range(&self, limit: Option<usize>) -> Result<Vec<(Key, Value)>>;
}
