//! High-level durable store facade.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{info, warn};

use crate::adapter::DurableState;
use crate::config::Config;
use crate::error::CoreResult;
use crate::log::LogWriter;
use crate::recovery::recover;
use crate::snapshot::{SnapshotManager, SnapshotPolicy};
use crate::txn::{Coordinator, Transaction};
use crate::types::SequenceNumber;
use duralog_storage::StorageBackend;

/// A durable wrapper around a caller-supplied state type.
///
/// Opening a store recovers the state from whatever the backend holds,
/// replaying committed transactions on top of the newest usable
/// snapshot. From then on, every committed transaction is durable
/// before its mutations are visible in memory.
///
/// Reads see only committed state: a transaction's staged mutations are
/// invisible to everyone, including its own creator, until commit.
///
/// The store is `Sync`; reads run concurrently under a read lock while
/// commits serialize behind a write lock.
pub struct Store<S: DurableState> {
    log: Arc<LogWriter>,
    coordinator: Coordinator,
    snapshots: SnapshotManager,
    policy: SnapshotPolicy,
    auto_snapshot: bool,
    state: RwLock<S>,
    /// Log size at the end of the last snapshot; growth is measured
    /// against it.
    snapshot_base: AtomicU64,
}

impl<S: DurableState> Store<S> {
    /// Opens a store over a backend, recovering any existing history.
    ///
    /// `initial` is the state's value for an empty history; it is used
    /// when the backend holds no log or no usable snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails or recovery cannot replay
    /// committed history.
    pub fn open(backend: Box<dyn StorageBackend>, config: Config, initial: S) -> CoreResult<Self> {
        let log = Arc::new(LogWriter::new(backend));
        let recovered = recover(&log, initial)?;

        let coordinator = Coordinator::resume(
            Arc::clone(&log),
            recovered.last_txid,
            recovered.last_seq,
            config.sync_on_commit,
        );
        let snapshots = SnapshotManager::new(Arc::clone(&log));
        let policy = SnapshotPolicy::new(config.snapshot_threshold_bytes);

        info!(log_end = recovered.log_end, last_seq = %recovered.last_seq, "store opened");
        Ok(Self {
            log,
            coordinator,
            snapshots,
            policy,
            auto_snapshot: config.auto_snapshot,
            state: RwLock::new(recovered.state),
            snapshot_base: AtomicU64::new(recovered.snapshot_base),
        })
    }

    /// Begins a new transaction.
    pub fn begin(&self) -> Transaction {
        self.coordinator.begin()
    }

    /// Commits a transaction and applies it to the store's state.
    ///
    /// May also take an automatic snapshot afterwards if the log has
    /// outgrown the configured threshold; a snapshot failure does not
    /// fail the commit, which is already durable.
    ///
    /// # Errors
    ///
    /// See [`Coordinator::commit`].
    pub fn commit(&self, txn: &mut Transaction) -> CoreResult<SequenceNumber> {
        let mut state = self.state.write();
        let sequence = self.coordinator.commit(txn, &mut *state)?;

        if self.auto_snapshot {
            let grown = self
                .log
                .size()?
                .saturating_sub(self.snapshot_base.load(Ordering::SeqCst));
            if self.policy.should_snapshot(grown) {
                if let Err(e) = self.write_snapshot_locked(&state) {
                    warn!(error = %e, "automatic snapshot failed, log keeps growing");
                }
            }
        }

        Ok(sequence)
    }

    /// Aborts a transaction, discarding its staged mutations.
    ///
    /// # Errors
    ///
    /// See [`Coordinator::abort`].
    pub fn abort(&self, txn: &mut Transaction) -> CoreResult<()> {
        self.coordinator.abort(txn)
    }

    /// Runs a closure inside a transaction: commits if it returns `Ok`,
    /// aborts if it returns `Err`.
    ///
    /// # Errors
    ///
    /// Returns the closure's error after aborting, or the commit error.
    pub fn transaction<T>(
        &self,
        f: impl FnOnce(&mut Transaction) -> CoreResult<T>,
    ) -> CoreResult<T> {
        let mut txn = self.begin();
        match f(&mut txn) {
            Ok(value) => {
                self.commit(&mut txn)?;
                Ok(value)
            }
            Err(e) => {
                self.abort(&mut txn)?;
                Err(e)
            }
        }
    }

    /// Reads the committed state through a closure.
    pub fn read<T>(&self, f: impl FnOnce(&S) -> T) -> T {
        f(&self.state.read())
    }

    /// Takes a snapshot now, regardless of log growth.
    ///
    /// Holds the state write lock for the duration, so snapshots are
    /// serialized against each other and against commits; two snapshot
    /// writers interleaving their append-sync-compact sequences would
    /// compact at offsets the other has already rewritten.
    ///
    /// # Errors
    ///
    /// See [`SnapshotManager::write_snapshot`].
    pub fn snapshot(&self) -> CoreResult<()> {
        let state = self.state.write();
        self.write_snapshot_locked(&state)
    }

    /// Sequence number of the most recently committed transaction.
    #[must_use]
    pub fn committed_seq(&self) -> SequenceNumber {
        self.coordinator.committed_seq()
    }

    /// Current physical size of the log.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot report its size.
    pub fn log_size(&self) -> CoreResult<u64> {
        self.log.size()
    }

    /// Writes a snapshot while the caller holds the state lock, so the
    /// serialized bytes cannot race a concurrent commit.
    fn write_snapshot_locked(&self, state: &S) -> CoreResult<()> {
        let base = self
            .snapshots
            .write_snapshot(state, self.coordinator.committed_seq())?;
        self.snapshot_base.store(base, Ordering::SeqCst);
        Ok(())
    }
}

impl<S: DurableState> std::fmt::Debug for Store<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("committed_seq", &self.committed_seq())
            .finish_non_exhaustive()
    }
}
