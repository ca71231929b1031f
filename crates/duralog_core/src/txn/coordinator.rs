//! Commit coordinator.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::adapter::DurableState;
use crate::error::{CoreError, CoreResult};
use crate::log::{LogWriter, Record};
use crate::txn::state::{Transaction, TransactionState};
use crate::types::{SequenceNumber, TransactionId};

/// Serializes commits and enforces the write-ahead ordering.
///
/// Commit protocol, in order:
///
/// 1. append one [`Record::Mutation`] chunk per staged mutation
/// 2. append the [`Record::Commit`] marker
/// 3. sync (or flush, when configured for deferred durability)
/// 4. apply the staged mutations to the in-memory state
///
/// Step 4 never happens before step 3 succeeds, so the in-memory state
/// only ever reflects durable history. If any of steps 1-3 fail, the
/// log is truncated back to its pre-commit size: a commit marker that
/// landed but was never confirmed durable must not survive, or a later
/// recovery could resurrect a transaction the caller was told failed.
///
/// Commits are fully serialized by an internal lock. Sequence numbers
/// are assigned under that lock, so sequence order and log order agree.
pub struct Coordinator {
    log: Arc<LogWriter>,
    next_txid: AtomicU64,
    next_seq: AtomicU64,
    committed_seq: AtomicU64,
    commit_lock: Mutex<()>,
    sync_on_commit: bool,
}

impl Coordinator {
    /// Creates a coordinator over an empty history.
    pub fn new(log: Arc<LogWriter>, sync_on_commit: bool) -> Self {
        Self::resume(log, TransactionId::new(0), SequenceNumber::new(0), sync_on_commit)
    }

    /// Creates a coordinator resuming after recovery.
    ///
    /// `last_txid` and `last_seq` are the highest values observed in the
    /// recovered log; fresh transactions continue after them.
    pub fn resume(
        log: Arc<LogWriter>,
        last_txid: TransactionId,
        last_seq: SequenceNumber,
        sync_on_commit: bool,
    ) -> Self {
        Self {
            log,
            next_txid: AtomicU64::new(last_txid.as_u64() + 1),
            next_seq: AtomicU64::new(last_seq.as_u64() + 1),
            committed_seq: AtomicU64::new(last_seq.as_u64()),
            commit_lock: Mutex::new(()),
            sync_on_commit,
        }
    }

    /// Begins a new transaction.
    ///
    /// Purely an in-memory operation; the log is untouched until commit.
    pub fn begin(&self) -> Transaction {
        Transaction::new(TransactionId::new(
            self.next_txid.fetch_add(1, Ordering::SeqCst),
        ))
    }

    /// Sequence number of the most recently committed transaction.
    #[must_use]
    pub fn committed_seq(&self) -> SequenceNumber {
        SequenceNumber::new(self.committed_seq.load(Ordering::SeqCst))
    }

    /// Commits a transaction: logs its mutations and marker, confirms
    /// durability, then applies the mutations to `state`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::TransactionAborted`] if any log write or the
    /// durability sync fails. The transaction is then aborted, the log
    /// is restored to its pre-commit size, and `state` is untouched.
    ///
    /// Returns [`CoreError::InvalidOperation`] if the transaction is not
    /// open.
    ///
    /// A [`DurableState::apply`] error after durability is confirmed is
    /// propagated as-is; the commit is durable and a re-open will replay
    /// it, but the in-memory state is behind the log until then.
    pub fn commit<S: DurableState>(
        &self,
        txn: &mut Transaction,
        state: &mut S,
    ) -> CoreResult<SequenceNumber> {
        if !txn.state().is_open() {
            return Err(CoreError::invalid_operation(format!(
                "cannot commit {} in state {:?}",
                txn.id(),
                txn.state()
            )));
        }

        let _guard = self.commit_lock.lock();

        let start = self.log.size()?;
        let sequence = SequenceNumber::new(self.next_seq.load(Ordering::SeqCst));
        txn.set_state(TransactionState::Committing);

        if let Err(e) = self.write_and_confirm(txn, sequence) {
            self.rollback(txn, start);
            return Err(CoreError::transaction_aborted(e.to_string()));
        }

        // Durable from here on.
        self.next_seq.store(sequence.as_u64() + 1, Ordering::SeqCst);
        self.committed_seq.store(sequence.as_u64(), Ordering::SeqCst);

        for mutation in txn.staged() {
            state.apply(mutation)?;
        }
        txn.set_state(TransactionState::Applied);

        debug!(txid = %txn.id(), seq = %sequence, mutations = txn.staged_len(), "transaction committed");
        Ok(sequence)
    }

    /// Aborts an open transaction, discarding its staged mutations.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidOperation`] if the transaction has
    /// already been applied.
    pub fn abort(&self, txn: &mut Transaction) -> CoreResult<()> {
        if txn.state() == TransactionState::Applied {
            return Err(CoreError::invalid_operation(format!(
                "cannot abort {}: already applied",
                txn.id()
            )));
        }
        txn.mark_aborted();
        Ok(())
    }

    fn write_and_confirm(&self, txn: &Transaction, sequence: SequenceNumber) -> CoreResult<()> {
        for mutation in txn.staged() {
            self.log.append(&Record::Mutation {
                txid: txn.id(),
                data: mutation.clone(),
            })?;
        }
        self.log.append(&Record::Commit {
            txid: txn.id(),
            sequence,
        })?;

        if self.sync_on_commit {
            self.log.sync()
        } else {
            self.log.flush()
        }
    }

    /// Restores the log to its pre-commit size after a failed commit.
    ///
    /// Best-effort: if truncation itself fails, the leftover chunks end
    /// in an unsynced marker the medium may or may not persist, which is
    /// why the failure is logged loudly. Conservative truncation at the
    /// chunk level still bounds the damage to this one transaction.
    fn rollback(&self, txn: &mut Transaction, start: u64) {
        txn.mark_aborted();
        if let Err(e) = self.log.truncate(start) {
            warn!(txid = %txn.id(), offset = start, error = %e, "failed to truncate after aborted commit");
        }
    }
}

impl std::fmt::Debug for Coordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Coordinator")
            .field("next_txid", &self.next_txid.load(Ordering::SeqCst))
            .field("next_seq", &self.next_seq.load(Ordering::SeqCst))
            .field("sync_on_commit", &self.sync_on_commit)
            .finish()
    }
}
