//! Error types for Duralog core.

use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in Duralog core operations.
///
/// Note that an invalid chunk is deliberately *not* an error: a truncated
/// or checksum-failing chunk is the expected shape of a crash mid-write
/// and is treated as the end of the log by the scanner.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Storage backend error.
    #[error("storage error: {0}")]
    Storage(#[from] duralog_storage::StorageError),

    /// The underlying medium rejected or partially completed an append.
    ///
    /// The in-flight transaction aborts; prior durable state is unaffected.
    #[error("write failed: {message}")]
    WriteFailed {
        /// Description of the failure.
        message: String,
    },

    /// Durability could not be confirmed by the medium.
    ///
    /// Handled identically to `WriteFailed`: the in-flight transaction
    /// aborts and nothing is applied in memory.
    #[error("sync failed: {message}")]
    SyncFailed {
        /// Description of the failure.
        message: String,
    },

    /// Transaction was aborted.
    #[error("transaction aborted: {reason}")]
    TransactionAborted {
        /// Reason for abort.
        reason: String,
    },

    /// A snapshot chunk passed its checksum but failed to deserialize.
    ///
    /// Fatal for that snapshot only; recovery falls back to the previous
    /// snapshot or to a from-scratch replay.
    #[error("corrupt snapshot: {message}")]
    CorruptSnapshot {
        /// Description of the corruption.
        message: String,
    },

    /// Operation not permitted in current state.
    #[error("invalid operation: {message}")]
    InvalidOperation {
        /// Description of why the operation is invalid.
        message: String,
    },

    /// The caller-supplied state adapter reported a failure.
    #[error("adapter error: {message}")]
    Adapter {
        /// Description of the failure.
        message: String,
    },
}

impl CoreError {
    /// Creates a write-failed error.
    pub fn write_failed(message: impl Into<String>) -> Self {
        Self::WriteFailed {
            message: message.into(),
        }
    }

    /// Creates a sync-failed error.
    pub fn sync_failed(message: impl Into<String>) -> Self {
        Self::SyncFailed {
            message: message.into(),
        }
    }

    /// Creates a transaction-aborted error.
    pub fn transaction_aborted(reason: impl Into<String>) -> Self {
        Self::TransactionAborted {
            reason: reason.into(),
        }
    }

    /// Creates a corrupt-snapshot error.
    pub fn corrupt_snapshot(message: impl Into<String>) -> Self {
        Self::CorruptSnapshot {
            message: message.into(),
        }
    }

    /// Creates an invalid-operation error.
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Self::InvalidOperation {
            message: message.into(),
        }
    }

    /// Creates an adapter error.
    pub fn adapter(message: impl Into<String>) -> Self {
        Self::Adapter {
            message: message.into(),
        }
    }
}
