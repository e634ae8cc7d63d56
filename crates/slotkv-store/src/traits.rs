use crate::error::PersistResult;
use crate::table::SlotTable;

/// Decides, after each successful put, whether to flush a snapshot.
///
/// Implementations must satisfy these rules:
/// - The decision is a pure function of the table passed in. The policy gets
///   a shared reference only and can never mutate the table.
/// - It is re-evaluated from scratch on every successful put, while the
///   store's write lock is held, so it should be cheap.
///
/// Any `Fn(&SlotTable<V>) -> bool` closure is a policy.
pub trait PersistPolicy<V>: Send + Sync {
    fn should_persist(&self, table: &SlotTable<V>) -> bool;
}

impl<V, F> PersistPolicy<V> for F
where
    F: Fn(&SlotTable<V>) -> bool + Send + Sync,
{
    fn should_persist(&self, table: &SlotTable<V>) -> bool {
        self(table)
    }
}

/// Durable destination for serialized snapshots.
///
/// Every call replaces the previous snapshot in full. Sinks are only invoked
/// while the store holds its write lock, so two writes never overlap.
pub trait SnapshotSink: Send + Sync {
    /// Write `bytes` as the complete current snapshot.
    fn write_snapshot(&self, bytes: &[u8]) -> PersistResult<()>;

    /// Human-readable location for logs.
    fn describe(&self) -> String {
        "snapshot sink".into()
    }
}
