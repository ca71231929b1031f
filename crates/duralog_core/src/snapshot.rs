//! Snapshots: full-state checkpoints that bound log growth.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::adapter::DurableState;
use crate::error::CoreResult;
use crate::log::{LogWriter, Record};
use crate::types::SequenceNumber;

/// Decides when the log has grown enough to warrant a snapshot.
#[derive(Debug, Clone, Copy)]
pub struct SnapshotPolicy {
    threshold_bytes: u64,
}

impl SnapshotPolicy {
    /// Creates a policy that snapshots after `threshold_bytes` of log
    /// growth since the last snapshot.
    #[must_use]
    pub const fn new(threshold_bytes: u64) -> Self {
        Self { threshold_bytes }
    }

    /// Whether `bytes_since_snapshot` of growth calls for a snapshot.
    #[must_use]
    pub fn should_snapshot(&self, bytes_since_snapshot: u64) -> bool {
        bytes_since_snapshot >= self.threshold_bytes
    }
}

/// Writes snapshots and reclaims the log prefix they supersede.
///
/// A snapshot is an ordinary log record, so the write-ahead guarantees
/// cover it: it is appended, synced, and only then does compaction
/// discard the prefix it replaces. At no point is the log in a state
/// where neither the old prefix nor the snapshot is durable. A crash
/// before the sync leaves the old log intact (an unsynced snapshot
/// chunk at the tail is just a torn tail); a crash during compaction
/// leaves either the old log or the compacted one.
pub struct SnapshotManager {
    log: Arc<LogWriter>,
}

impl SnapshotManager {
    /// Creates a manager over the shared log.
    pub fn new(log: Arc<LogWriter>) -> Self {
        Self { log }
    }

    /// Serializes `state`, appends it as a snapshot record, confirms
    /// durability, and compacts the log to start at the snapshot.
    ///
    /// Returns the log size after compaction, which is the new baseline
    /// for growth-based snapshot policies.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization, the append, or the sync fails.
    /// On append or sync failure the log is restored to its prior size
    /// and remains fully usable; the snapshot simply did not happen.
    pub fn write_snapshot<S: DurableState>(
        &self,
        state: &S,
        sequence: SequenceNumber,
    ) -> CoreResult<u64> {
        let bytes = state.serialize()?;
        let start = self.log.size()?;

        let offset = match self.log.append(&Record::Snapshot {
            sequence,
            state: bytes,
        }) {
            Ok(offset) => offset,
            Err(e) => {
                self.rollback(start);
                return Err(e);
            }
        };
        if let Err(e) = self.log.sync() {
            self.rollback(start);
            return Err(e);
        }

        self.log.compact(offset)?;
        let base = self.log.size()?;
        debug!(seq = %sequence, reclaimed = offset, size = base, "snapshot written");
        Ok(base)
    }

    fn rollback(&self, start: u64) {
        if let Err(e) = self.log.truncate(start) {
            warn!(offset = start, error = %e, "failed to truncate after failed snapshot");
        }
    }
}

impl std::fmt::Debug for SnapshotManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnapshotManager").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;
    use crate::types::TransactionId;
    use duralog_storage::{FaultBackend, InMemoryBackend};

    struct Blob(Vec<u8>);

    impl DurableState for Blob {
        fn serialize(&self) -> CoreResult<Vec<u8>> {
            Ok(self.0.clone())
        }

        fn deserialize(bytes: &[u8]) -> CoreResult<Self> {
            Ok(Self(bytes.to_vec()))
        }

        fn apply(&mut self, mutation: &[u8]) -> CoreResult<()> {
            self.0.extend_from_slice(mutation);
            Ok(())
        }
    }

    struct Unserializable;

    impl DurableState for Unserializable {
        fn serialize(&self) -> CoreResult<Vec<u8>> {
            Err(CoreError::adapter("not serializable"))
        }

        fn deserialize(_bytes: &[u8]) -> CoreResult<Self> {
            Ok(Self)
        }

        fn apply(&mut self, _mutation: &[u8]) -> CoreResult<()> {
            Ok(())
        }
    }

    fn mutation(data: &[u8]) -> Record {
        Record::Mutation {
            txid: TransactionId::new(1),
            data: data.to_vec(),
        }
    }

    #[test]
    fn policy_thresholds() {
        let policy = SnapshotPolicy::new(100);
        assert!(!policy.should_snapshot(0));
        assert!(!policy.should_snapshot(99));
        assert!(policy.should_snapshot(100));
        assert!(policy.should_snapshot(1000));
    }

    #[test]
    fn snapshot_compacts_away_prior_records() {
        let log = Arc::new(LogWriter::new(Box::new(InMemoryBackend::new())));
        log.append(&mutation(b"old history")).unwrap();
        log.append(&mutation(b"more old history")).unwrap();

        let manager = SnapshotManager::new(Arc::clone(&log));
        let base = manager
            .write_snapshot(&Blob(b"current".to_vec()), SequenceNumber::new(5))
            .unwrap();

        let records: Vec<(u64, Record)> = log.scan().unwrap().collect();
        assert_eq!(records.len(), 1);
        assert_eq!(
            records[0],
            (
                0,
                Record::Snapshot {
                    sequence: SequenceNumber::new(5),
                    state: b"current".to_vec(),
                }
            )
        );
        assert_eq!(base, log.size().unwrap());
    }

    #[test]
    fn failed_serialize_leaves_log_untouched() {
        let log = Arc::new(LogWriter::new(Box::new(InMemoryBackend::new())));
        log.append(&mutation(b"history")).unwrap();
        let before = log.size().unwrap();

        let manager = SnapshotManager::new(Arc::clone(&log));
        let err = manager
            .write_snapshot(&Unserializable, SequenceNumber::new(1))
            .unwrap_err();

        assert!(matches!(err, CoreError::Adapter { .. }));
        assert_eq!(log.size().unwrap(), before);
    }

    #[test]
    fn failed_sync_restores_log() {
        let backend = FaultBackend::new();
        let faults = backend.controls();
        let log = Arc::new(LogWriter::new(Box::new(backend)));
        log.append(&mutation(b"history")).unwrap();
        log.sync().unwrap();
        let before = log.size().unwrap();

        faults.fail_next_sync();
        let manager = SnapshotManager::new(Arc::clone(&log));
        let err = manager
            .write_snapshot(&Blob(b"state".to_vec()), SequenceNumber::new(1))
            .unwrap_err();

        assert!(matches!(err, CoreError::SyncFailed { .. }));
        assert_eq!(log.size().unwrap(), before);
        // Old history still scans cleanly.
        let records: Vec<(u64, Record)> = log.scan().unwrap().collect();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].1, mutation(b"history"));
    }

    #[test]
    fn failed_append_restores_log() {
        let backend = FaultBackend::new();
        let faults = backend.controls();
        let log = Arc::new(LogWriter::new(Box::new(backend)));
        log.append(&mutation(b"history")).unwrap();
        let before = log.size().unwrap();

        faults.fail_next_append();
        let manager = SnapshotManager::new(Arc::clone(&log));
        let err = manager
            .write_snapshot(&Blob(b"state".to_vec()), SequenceNumber::new(1))
            .unwrap_err();

        assert!(matches!(err, CoreError::WriteFailed { .. }));
        assert_eq!(log.size().unwrap(), before);
    }
}
