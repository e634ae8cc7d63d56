use std::path::PathBuf;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{PersistError, PersistResult, StoreError, StoreResult};
use crate::sink::{FileSink, DEFAULT_SNAPSHOT_PATH};
use crate::table::{Lookup, SlotTable};
use crate::traits::{PersistPolicy, SnapshotSink};

/// Default number of slots.
pub const DEFAULT_CAPACITY: usize = 1000;

/// Construction options for a file-backed store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreOptions {
    /// Number of slots (fixed for the store's lifetime).
    pub capacity: usize,
    /// File every snapshot overwrites.
    pub snapshot_path: PathBuf,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            snapshot_path: PathBuf::from(DEFAULT_SNAPSHOT_PATH),
        }
    }
}

/// What happened to the snapshot after a successful put.
#[derive(Debug)]
pub enum FlushOutcome {
    /// The policy did not ask for a flush.
    Skipped,
    /// A full snapshot of `bytes` bytes was written.
    Written { bytes: usize },
    /// The flush was attempted and failed. The put itself still committed.
    Failed(PersistError),
}

impl FlushOutcome {
    pub fn is_written(&self) -> bool {
        matches!(self, Self::Written { .. })
    }
}

/// Result of a successful put.
#[derive(Debug)]
pub struct PutReceipt {
    /// Slot the entry was placed in.
    pub index: usize,
    pub flush: FlushOutcome,
}

/// Fixed-capacity key-value store with edge-triggered persistence.
///
/// A single `RwLock` guards the whole slot table: any number of `get` calls
/// share it, while `put` holds it exclusively for the insert *and* for the
/// policy check and flush that follow. Nothing outside the store can reach
/// the table except through these calls or the read-only view given to the
/// policy.
pub struct ConcurrentStore<V> {
    table: RwLock<SlotTable<V>>,
    policy: Box<dyn PersistPolicy<V>>,
    sink: Box<dyn SnapshotSink>,
}

impl<V> ConcurrentStore<V>
where
    V: Clone + Serialize + Send + Sync,
{
    /// Create a store with the default capacity, persisting to `kvs.json`.
    pub fn new(policy: impl PersistPolicy<V> + 'static) -> Self {
        Self {
            table: RwLock::new(SlotTable::empty(DEFAULT_CAPACITY)),
            policy: Box::new(policy),
            sink: Box::new(FileSink::default()),
        }
    }

    /// Create a file-backed store from options.
    pub fn open(options: StoreOptions, policy: impl PersistPolicy<V> + 'static) -> StoreResult<Self> {
        Self::with_sink(options.capacity, policy, FileSink::new(options.snapshot_path))
    }

    /// Create a store with an arbitrary snapshot sink.
    pub fn with_sink(
        capacity: usize,
        policy: impl PersistPolicy<V> + 'static,
        sink: impl SnapshotSink + 'static,
    ) -> StoreResult<Self> {
        let table = SlotTable::with_capacity(capacity)?;
        debug!(capacity, sink = %sink.describe(), "store created");
        Ok(Self {
            table: RwLock::new(table),
            policy: Box::new(policy),
            sink: Box::new(sink),
        })
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, SlotTable<V>>> {
        self.table.read().map_err(|_| StoreError::LockPoisoned)
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, SlotTable<V>>> {
        self.table.write().map_err(|_| StoreError::LockPoisoned)
    }

    /// Look `key` up under shared access.
    pub fn get(&self, key: &str) -> StoreResult<Lookup<V>> {
        let table = self.read()?;
        Ok(table.lookup(key))
    }

    /// Insert `key` under exclusive access, then run the persistence policy.
    ///
    /// Fails with [`StoreError::Collision`] if the key's slot is occupied,
    /// whether by another key or by an earlier put of the same key. A failed
    /// flush is reported in the receipt and never undoes the insert.
    pub fn put(&self, key: impl Into<String>, value: V) -> StoreResult<PutReceipt> {
        let key = key.into();
        let mut table = self.write()?;
        let index = table.insert(key, value)?;
        debug!(index, occupied = table.occupied(), "put");

        let flush = if self.policy.should_persist(&table) {
            match self.flush_locked(&table) {
                Ok(bytes) => FlushOutcome::Written { bytes },
                Err(e) => {
                    warn!(error = %e, sink = %self.sink.describe(), "snapshot flush failed");
                    FlushOutcome::Failed(e)
                }
            }
        } else {
            FlushOutcome::Skipped
        };

        Ok(PutReceipt { index, flush })
    }

    /// Flush a full snapshot now, regardless of the policy.
    ///
    /// Takes the write lock so it can never overlap a policy-triggered flush.
    pub fn persist(&self) -> StoreResult<usize> {
        let table = self.write()?;
        let bytes = self.flush_locked(&table)?;
        info!(bytes, sink = %self.sink.describe(), "snapshot persisted");
        Ok(bytes)
    }

    /// Caller must hold the write lock.
    fn flush_locked(&self, table: &SlotTable<V>) -> PersistResult<usize> {
        let bytes = table.to_json_pretty()?;
        self.sink.write_snapshot(&bytes)?;
        debug!(bytes = bytes.len(), occupied = table.occupied(), "snapshot flushed");
        Ok(bytes.len())
    }

    /// Returns `true` if `key` itself occupies its slot.
    pub fn contains(&self, key: &str) -> StoreResult<bool> {
        Ok(self.get(key)?.is_found())
    }

    /// Owned copy of the table, taken under shared access.
    pub fn snapshot(&self) -> StoreResult<SlotTable<V>> {
        Ok(self.read()?.clone())
    }

    /// Number of slots.
    pub fn capacity(&self) -> usize {
        match self.table.read() {
            Ok(t) => t.capacity(),
            Err(poisoned) => poisoned.into_inner().capacity(),
        }
    }

    /// Number of occupied slots.
    pub fn len(&self) -> StoreResult<usize> {
        Ok(self.read()?.occupied())
    }

    pub fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.read()?.is_empty())
    }

    pub fn load_factor(&self) -> StoreResult<f64> {
        Ok(self.read()?.load_factor())
    }
}

impl<V> std::fmt::Debug for ConcurrentStore<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut s = f.debug_struct("ConcurrentStore");
        match self.table.read() {
            Ok(t) => s.field("capacity", &t.capacity()).field("occupied", &t.occupied()),
            Err(_) => s.field("poisoned", &true),
        };
        s.field("sink", &self.sink.describe()).finish()
    }
}
