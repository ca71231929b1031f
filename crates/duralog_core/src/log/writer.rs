//! Log writer: appends framed records to the durable medium.

use crate::error::{CoreError, CoreResult};
use crate::log::frame;
use crate::log::record::Record;
use crate::log::scanner::Scanner;
use duralog_storage::StorageBackend;
use parking_lot::Mutex;
use tracing::debug;

/// Appends records to the log and controls flush/sync ordering.
///
/// Appending does not by itself guarantee durability: data is durable
/// only after a subsequent [`LogWriter::sync`] returns successfully.
///
/// The writer never retries a failed append silently, and it never
/// trusts the write call's own error reporting for correctness: the
/// logical log length is defined as the longest prefix the chunk codec
/// verifies, not as the bytes physically present.
pub struct LogWriter {
    backend: Mutex<Box<dyn StorageBackend>>,
}

impl LogWriter {
    /// Creates a writer over the given backend.
    pub fn new(backend: Box<dyn StorageBackend>) -> Self {
        Self {
            backend: Mutex::new(backend),
        }
    }

    /// Encodes a record into a chunk and appends it.
    ///
    /// Returns the offset where the chunk was written.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::WriteFailed`] if the medium rejected or
    /// partially completed the append. Bytes past the last valid chunk
    /// are ignored by readers regardless.
    pub fn append(&self, record: &Record) -> CoreResult<u64> {
        let chunk = frame::encode(&record.encode())?;
        let mut backend = self.backend.lock();
        backend
            .append(&chunk)
            .map_err(|e| CoreError::write_failed(e.to_string()))
    }

    /// Flushes buffered writes towards the medium.
    ///
    /// # Errors
    ///
    /// Returns an error if the flush fails.
    pub fn flush(&self) -> CoreResult<()> {
        self.backend.lock().flush()?;
        Ok(())
    }

    /// Forces the medium to persist all bytes written since the previous
    /// successful sync.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::SyncFailed`] if durability could not be
    /// confirmed.
    pub fn sync(&self) -> CoreResult<()> {
        self.backend
            .lock()
            .sync()
            .map_err(|e| CoreError::sync_failed(e.to_string()))
    }

    /// Returns the current physical size of the log.
    pub fn size(&self) -> CoreResult<u64> {
        Ok(self.backend.lock().size()?)
    }

    /// Truncates the log to `offset`, discarding everything after it.
    ///
    /// Used to drop a torn tail after recovery and to void the chunks of
    /// a failed commit.
    pub fn truncate(&self, offset: u64) -> CoreResult<()> {
        self.backend.lock().truncate(offset)?;
        Ok(())
    }

    /// Rewrites the log to begin at `keep_from`, discarding the
    /// superseded prefix.
    ///
    /// The replacement is atomic at the backend level: a crash leaves
    /// either the old log or the compacted one, both of which are valid.
    /// Callers must only pass an offset at a chunk boundary whose suffix
    /// is self-sufficient (in practice: the offset of a durable snapshot
    /// chunk).
    pub fn compact(&self, keep_from: u64) -> CoreResult<()> {
        if keep_from == 0 {
            return Ok(());
        }

        let mut backend = self.backend.lock();
        let size = backend.size()?;
        if keep_from > size {
            return Err(CoreError::invalid_operation(format!(
                "compact offset {keep_from} beyond log size {size}"
            )));
        }
        let tail = backend.read_at(keep_from, (size - keep_from) as usize)?;
        backend.replace(&tail)?;
        debug!(reclaimed = keep_from, kept = tail.len(), "log compacted");
        Ok(())
    }

    /// Returns a streaming scanner over the log from offset 0.
    ///
    /// The scanner holds the log lock until dropped.
    pub fn scan(&self) -> CoreResult<Scanner<'_>> {
        self.scan_from(0)
    }

    /// Returns a streaming scanner starting at a chunk boundary.
    pub fn scan_from(&self, offset: u64) -> CoreResult<Scanner<'_>> {
        Scanner::new(self.backend.lock(), offset)
    }
}

impl std::fmt::Debug for LogWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogWriter").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{SequenceNumber, TransactionId};
    use duralog_storage::InMemoryBackend;

    fn create_log() -> LogWriter {
        LogWriter::new(Box::new(InMemoryBackend::new()))
    }

    fn mutation(txid: u64, data: &[u8]) -> Record {
        Record::Mutation {
            txid: TransactionId::new(txid),
            data: data.to_vec(),
        }
    }

    fn read_all(log: &LogWriter) -> Vec<(u64, Record)> {
        log.scan().unwrap().collect()
    }

    #[test]
    fn append_and_scan() {
        let log = create_log();
        let record = mutation(1, b"hello");
        let offset = log.append(&record).unwrap();
        assert_eq!(offset, 0);

        let records = read_all(&log);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0], (0, record));
    }

    #[test]
    fn append_multiple_records() {
        let log = create_log();
        let r1 = mutation(1, b"a");
        let r2 = Record::Commit {
            txid: TransactionId::new(1),
            sequence: SequenceNumber::new(1),
        };
        let r3 = Record::Snapshot {
            sequence: SequenceNumber::new(1),
            state: vec![9, 9],
        };

        log.append(&r1).unwrap();
        log.append(&r2).unwrap();
        log.append(&r3).unwrap();

        let records = read_all(&log);
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].1, r1);
        assert_eq!(records[1].1, r2);
        assert_eq!(records[2].1, r3);
    }

    #[test]
    fn size_increases() {
        let log = create_log();
        assert_eq!(log.size().unwrap(), 0);
        log.append(&mutation(1, b"x")).unwrap();
        assert!(log.size().unwrap() > 0);
    }

    #[test]
    fn truncate_drops_tail() {
        let log = create_log();
        log.append(&mutation(1, b"keep")).unwrap();
        let boundary = log.size().unwrap();
        log.append(&mutation(2, b"drop")).unwrap();

        log.truncate(boundary).unwrap();

        let records = read_all(&log);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].1, mutation(1, b"keep"));
    }

    #[test]
    fn compact_keeps_suffix() {
        let log = create_log();
        log.append(&mutation(1, b"superseded")).unwrap();
        let snapshot_offset = log
            .append(&Record::Snapshot {
                sequence: SequenceNumber::new(1),
                state: vec![42],
            })
            .unwrap();
        log.append(&mutation(2, b"after")).unwrap();

        log.compact(snapshot_offset).unwrap();

        let records = read_all(&log);
        assert_eq!(records.len(), 2);
        assert!(matches!(records[0].1, Record::Snapshot { .. }));
        assert_eq!(records[0].0, 0);
        assert_eq!(records[1].1, mutation(2, b"after"));
    }

    #[test]
    fn compact_beyond_log_size_is_rejected() {
        let log = create_log();
        log.append(&mutation(1, b"data")).unwrap();
        let size = log.size().unwrap();

        let err = log.compact(size + 1).unwrap_err();
        assert!(matches!(err, crate::error::CoreError::InvalidOperation { .. }));
        assert_eq!(log.size().unwrap(), size);
    }

    #[test]
    fn compact_at_zero_is_noop() {
        let log = create_log();
        log.append(&mutation(1, b"data")).unwrap();
        let before = log.size().unwrap();
        log.compact(0).unwrap();
        assert_eq!(log.size().unwrap(), before);
    }

    #[test]
    fn flush_and_sync_succeed() {
        let log = create_log();
        log.append(&mutation(1, b"data")).unwrap();
        log.flush().unwrap();
        log.sync().unwrap();
    }
}
