//! Durable counter demo.
//!
//! Each run opens (or recovers) a counter from a log file, increments it
//! a few times inside transactions, takes a snapshot, and prints the
//! value. Kill it at any point and the next run recovers every committed
//! increment.
//!
//! Usage: `counter-demo [path]` (default `counter.duralog`).

use std::error::Error;

use duralog_core::{Config, CoreError, CoreResult, DurableState, Store};
use duralog_storage::FileBackend;
use tracing::info;
use tracing_subscriber::EnvFilter;

struct Counter(i64);

impl DurableState for Counter {
    fn serialize(&self) -> CoreResult<Vec<u8>> {
        Ok(self.0.to_le_bytes().to_vec())
    }

    fn deserialize(bytes: &[u8]) -> CoreResult<Self> {
        let raw = bytes
            .try_into()
            .map_err(|_| CoreError::adapter("counter state must be 8 bytes"))?;
        Ok(Self(i64::from_le_bytes(raw)))
    }

    fn apply(&mut self, mutation: &[u8]) -> CoreResult<()> {
        let raw = mutation
            .try_into()
            .map_err(|_| CoreError::adapter("counter mutation must be 8 bytes"))?;
        self.0 += i64::from_le_bytes(raw);
        Ok(())
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "counter.duralog".to_string());

    let backend = FileBackend::open(std::path::Path::new(&path))?;
    let store = Store::open(Box::new(backend), Config::default(), Counter(0))?;
    info!(value = store.read(|c| c.0), "recovered counter");

    for delta in [1i64, 10, 100] {
        store.transaction(|txn| txn.stage(delta.to_le_bytes().to_vec()))?;
    }

    store.snapshot()?;
    let value = store.read(|c| c.0);
    info!(value, log_bytes = store.log_size()?, "counter after this run");
    println!("counter = {value}");
    Ok(())
}
