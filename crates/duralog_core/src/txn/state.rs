//! Transaction handle and lifecycle states.

use crate::error::{CoreError, CoreResult};
use crate::types::TransactionId;

/// Lifecycle state of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionState {
    /// Created, nothing staged yet.
    Begun,
    /// At least one mutation staged, not yet committed.
    Staged,
    /// Commit in progress: log writes issued, durability not yet
    /// confirmed.
    Committing,
    /// Durably committed and applied in memory.
    Applied,
    /// Aborted; staged mutations discarded, nothing reached the log.
    Aborted,
}

impl TransactionState {
    /// Whether the transaction can still accept mutations or commit.
    #[must_use]
    pub const fn is_open(self) -> bool {
        matches!(self, Self::Begun | Self::Staged)
    }

    /// Whether the transaction has reached a terminal state.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Applied | Self::Aborted)
    }
}

/// An in-flight transaction.
///
/// Mutations are staged in memory in call order. The log sees nothing
/// until the transaction is handed to [`Coordinator::commit`], which
/// writes the staged mutations followed by a commit marker.
///
/// Dropping a transaction without committing is equivalent to aborting
/// it: the staged mutations vanish and the log is untouched.
///
/// [`Coordinator::commit`]: crate::Coordinator::commit
#[derive(Debug)]
pub struct Transaction {
    id: TransactionId,
    state: TransactionState,
    staged: Vec<Vec<u8>>,
}

impl Transaction {
    pub(crate) fn new(id: TransactionId) -> Self {
        Self {
            id,
            state: TransactionState::Begun,
            staged: Vec::new(),
        }
    }

    /// Returns the transaction's identifier.
    #[must_use]
    pub fn id(&self) -> TransactionId {
        self.id
    }

    /// Returns the current lifecycle state.
    #[must_use]
    pub fn state(&self) -> TransactionState {
        self.state
    }

    /// Number of mutations staged so far.
    #[must_use]
    pub fn staged_len(&self) -> usize {
        self.staged.len()
    }

    /// Stages one serialized mutation.
    ///
    /// The bytes are opaque to the core; the same bytes are handed to
    /// [`DurableState::apply`] at commit time and during recovery.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidOperation`] if the transaction is no
    /// longer open.
    ///
    /// [`DurableState::apply`]: crate::DurableState::apply
    pub fn stage(&mut self, mutation: Vec<u8>) -> CoreResult<()> {
        if !self.state.is_open() {
            return Err(CoreError::invalid_operation(format!(
                "cannot stage into {} transaction in state {:?}",
                self.id, self.state
            )));
        }
        self.staged.push(mutation);
        self.state = TransactionState::Staged;
        Ok(())
    }

    pub(crate) fn staged(&self) -> &[Vec<u8>] {
        &self.staged
    }

    pub(crate) fn set_state(&mut self, state: TransactionState) {
        self.state = state;
    }

    pub(crate) fn mark_aborted(&mut self) {
        self.staged.clear();
        self.state = TransactionState::Aborted;
    }
}
