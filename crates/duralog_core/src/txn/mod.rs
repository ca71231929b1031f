//! Transactions: staging, commit ordering, and abort semantics.
//!
//! A transaction is a unit of atomicity: after a crash, either all of
//! its mutations are recovered or none are. The boundary is the commit
//! marker in the log - mutations without a following marker for their
//! transaction are invisible to recovery.
//!
//! Transactions stage mutations in memory; nothing touches the log
//! until commit. Abort is therefore free: the staged buffer is dropped
//! and no log write ever happened.

mod coordinator;
mod state;

pub use coordinator::Coordinator;
pub use state::{Transaction, TransactionState};
