use std::io;

use thiserror::Error;

/// Unified error type for the storage engine.
///
/// Absent keys are not an error: lookups return `Ok(None)` and ranged scans
/// simply omit the key. A truncated or malformed record encountered while
/// replaying the WAL or loading a segment is treated as end-of-valid-data by
/// the caller rather than surfaced, so `Corruption` mostly travels within
/// the crate.
#[derive(Debug, Error)]
pub enum Error {
    /// IO error from disk operations.
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    /// Truncated or malformed on-disk record.
    #[error("corruption: {0}")]
    Corruption(String),
}

/// Result type alias used throughout the engine.
pub type Result<T> = std::result::Result<T, Error>;
