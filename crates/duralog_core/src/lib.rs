//! Duralog core: a write-ahead-logged durability layer for in-memory state.
//!
//! Duralog makes an arbitrary in-memory data structure crash-safe. The
//! structure implements [`DurableState`] - serialize, deserialize, and
//! apply-mutation over opaque bytes - and [`Store`] wraps it with
//! transactions, a checksummed append-only log, snapshots, and recovery.
//!
//! Guarantees, assuming the backend's sync actually reaches stable
//! storage:
//!
//! - **Atomicity**: a transaction's mutations are recovered all-or-nothing
//! - **Durability**: once [`Store::commit`] returns, the transaction
//!   survives any crash
//! - **Consistency**: recovery always yields a state produced by some
//!   prefix of the committed history, in commit order
//!
//! No write atomicity is assumed of the medium itself; torn and corrupt
//! tail chunks are detected by checksum and treated as the end of the
//! log.
//!
//! # Example
//!
//! ```rust
//! use duralog_core::{Config, CoreResult, DurableState, Store};
//! use duralog_storage::InMemoryBackend;
//!
//! #[derive(Default)]
//! struct Counter(i64);
//!
//! impl DurableState for Counter {
//!     fn serialize(&self) -> CoreResult<Vec<u8>> {
//!         Ok(self.0.to_le_bytes().to_vec())
//!     }
//!     fn deserialize(bytes: &[u8]) -> CoreResult<Self> {
//!         let raw = bytes.try_into().map_err(|_| {
//!             duralog_core::CoreError::adapter("counter state must be 8 bytes")
//!         })?;
//!         Ok(Counter(i64::from_le_bytes(raw)))
//!     }
//!     fn apply(&mut self, mutation: &[u8]) -> CoreResult<()> {
//!         let raw = mutation.try_into().map_err(|_| {
//!             duralog_core::CoreError::adapter("counter mutation must be 8 bytes")
//!         })?;
//!         self.0 += i64::from_le_bytes(raw);
//!         Ok(())
//!     }
//! }
//!
//! # fn main() -> CoreResult<()> {
//! let store = Store::open(
//!     Box::new(InMemoryBackend::new()),
//!     Config::default(),
//!     Counter::default(),
//! )?;
//!
//! store.transaction(|txn| txn.stage(5i64.to_le_bytes().to_vec()))?;
//! assert_eq!(store.read(|c| c.0), 5);
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod adapter;
mod config;
mod error;
pub mod log;
mod recovery;
mod snapshot;
mod store;
mod txn;
mod types;

pub use adapter::DurableState;
pub use config::Config;
pub use error::{CoreError, CoreResult};
pub use recovery::{recover, Recovered};
pub use snapshot::{SnapshotManager, SnapshotPolicy};
pub use store::Store;
pub use txn::{Coordinator, Transaction, TransactionState};
pub use types::{SequenceNumber, TransactionId};
