//! # Duralog Storage
//!
//! Storage backend trait and implementations for Duralog.
//!
//! This crate provides the lowest-level storage abstraction for Duralog.
//! Storage backends are **opaque byte stores** - they do not interpret
//! the data they store.
//!
//! ## Design Principles
//!
//! - Backends are simple byte stores (read, append, flush, sync)
//! - No knowledge of Duralog chunk framing, transactions, or snapshots
//! - No atomicity assumption above the hardware write unit: an append that
//!   fails (or a crash mid-append) may leave any prefix of the requested
//!   bytes on the medium. Layers above detect this with checksummed framing.
//! - Must be `Send + Sync` for concurrent access
//!
//! ## Available Backends
//!
//! - [`InMemoryBackend`] - For testing and ephemeral storage
//! - [`FileBackend`] - For persistent storage using OS file APIs
//! - [`FaultBackend`] - Test wrapper that injects append/sync failures
//!
//! ## Example
//!
//! ```rust
//! use duralog_storage::{StorageBackend, InMemoryBackend};
//!
//! let mut backend = InMemoryBackend::new();
//! let offset = backend.append(b"hello world").unwrap();
//! let data = backend.read_at(offset, 11).unwrap();
//! assert_eq!(&data, b"hello world");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod error;
mod fault;
mod file;
mod memory;

pub use backend::StorageBackend;
pub use error::{StorageError, StorageResult};
pub use fault::{FaultBackend, FaultControls};
pub use file::FileBackend;
pub use memory::InMemoryBackend;
