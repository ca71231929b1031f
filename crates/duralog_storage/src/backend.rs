//! Storage backend trait definition.

use crate::error::StorageResult;

/// A low-level storage backend for Duralog.
///
/// Storage backends are **opaque byte stores**. They provide simple
/// operations for reading, appending, and flushing data. Duralog owns all
/// format interpretation - backends do not understand chunks, transactions,
/// or snapshots.
///
/// # Invariants
///
/// - `append` returns the offset where data was written
/// - `read_at` returns exactly the bytes previously written at that offset
/// - `sync` ensures all appended data survives process termination
/// - Data fully synced by a prior `sync` is never altered by a later crash
/// - Backends must be `Send + Sync` for concurrent access
///
/// # What backends do NOT guarantee
///
/// An `append` is not atomic: a crash or error mid-call may leave any
/// prefix of the requested bytes on the medium, regardless of what the
/// call reported. Callers that need all-or-nothing semantics must frame
/// and checksum their data (see `duralog_core::log`).
///
/// # Implementors
///
/// - [`super::InMemoryBackend`] - For testing
/// - [`super::FileBackend`] - For persistent storage
/// - [`super::FaultBackend`] - For fault-injection tests
pub trait StorageBackend: Send + Sync {
    /// Reads `len` bytes starting at `offset`.
    ///
    /// # Errors
    ///
    /// Returns an error if the read would extend beyond the current size
    /// or an I/O error occurs.
    fn read_at(&self, offset: u64, len: usize) -> StorageResult<Vec<u8>>;

    /// Appends data to the end of the storage.
    ///
    /// Returns the offset where the data was written. The data is not
    /// durable until a subsequent [`StorageBackend::sync`] succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error if an I/O error occurs. On error, an unknown
    /// prefix of `data` may still have reached the medium.
    fn append(&mut self, data: &[u8]) -> StorageResult<u64>;

    /// Flushes buffered writes towards the medium.
    ///
    /// This pushes data to the operating system but does not guarantee
    /// it survives power loss; use [`StorageBackend::sync`] for that.
    ///
    /// # Errors
    ///
    /// Returns an error if the flush operation fails.
    fn flush(&mut self) -> StorageResult<()>;

    /// Syncs all data and metadata to durable storage.
    ///
    /// After this returns successfully, all previously appended data is
    /// guaranteed to survive process termination and power loss.
    ///
    /// # Errors
    ///
    /// Returns an error if durability could not be confirmed.
    fn sync(&mut self) -> StorageResult<()>;

    /// Returns the current size of the storage in bytes.
    ///
    /// This is the offset where the next `append` will write.
    ///
    /// # Errors
    ///
    /// Returns an error if the size cannot be determined.
    fn size(&self) -> StorageResult<u64>;

    /// Truncates the storage to the given size.
    ///
    /// This removes all data after the specified offset. Used to discard
    /// a torn tail after recovery and to void unsynced appends after a
    /// failed commit.
    ///
    /// # Errors
    ///
    /// Returns an error if the truncation fails or `new_size` is greater
    /// than the current size.
    fn truncate(&mut self, new_size: u64) -> StorageResult<()>;

    /// Atomically replaces the entire contents with `data`.
    ///
    /// Used for log compaction: after a snapshot chunk is durable, the
    /// log is rewritten to begin at that chunk. A crash at any point
    /// during `replace` must leave either the complete old contents or
    /// the complete new contents, never a mixture.
    ///
    /// # Errors
    ///
    /// Returns an error if the replacement fails. On error the old
    /// contents remain intact.
    fn replace(&mut self, data: &[u8]) -> StorageResult<()>;
}
