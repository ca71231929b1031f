//! Error types for storage operations.

use std::io;
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Attempted to read beyond the end of storage.
    #[error("read beyond end of storage: offset {offset}, len {len}, size {size}")]
    ReadPastEnd {
        /// The requested read offset.
        offset: u64,
        /// The requested read length.
        len: usize,
        /// The current storage size.
        size: u64,
    },

    /// An append completed only partially before failing.
    ///
    /// The number of bytes that may have reached the medium is reported,
    /// but callers must not trust it: the medium gives no atomicity
    /// guarantee for the written prefix.
    #[error("partial append: {written} of {requested} bytes written")]
    PartialAppend {
        /// Bytes reported written before the failure.
        written: usize,
        /// Bytes requested.
        requested: usize,
    },

    /// Durability could not be confirmed for previously appended data.
    #[error("sync failed: {0}")]
    SyncFailed(String),
}
