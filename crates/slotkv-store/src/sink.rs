//! Snapshot sinks.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::PersistResult;
use crate::traits::SnapshotSink;

/// Default snapshot location, relative to the working directory.
pub const DEFAULT_SNAPSHOT_PATH: &str = "kvs.json";

/// Writes each snapshot to a fixed file path, replacing its previous contents.
///
/// The file is truncated and rewritten in place: there is no temp-file rename
/// and no fsync, so a crash mid-write can leave a torn file.
#[derive(Clone, Debug)]
pub struct FileSink {
    path: PathBuf,
}

impl FileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileSink {
    fn default() -> Self {
        Self::new(DEFAULT_SNAPSHOT_PATH)
    }
}

impl SnapshotSink for FileSink {
    fn write_snapshot(&self, bytes: &[u8]) -> PersistResult<()> {
        std::fs::write(&self.path, bytes)?;
        Ok(())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Keeps the most recent snapshot in memory. Useful for tests and embedding.
#[derive(Debug, Default)]
pub struct MemorySink {
    last: Mutex<Option<Vec<u8>>>,
    writes: Mutex<usize>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes of the last snapshot written, if any.
    pub fn last(&self) -> Option<Vec<u8>> {
        self.last.lock().ok().and_then(|g| g.clone())
    }

    /// Number of snapshots written so far.
    pub fn writes(&self) -> usize {
        self.writes.lock().map(|g| *g).unwrap_or(0)
    }
}

impl SnapshotSink for MemorySink {
    fn write_snapshot(&self, bytes: &[u8]) -> PersistResult<()> {
        let poisoned = || std::io::Error::other("memory sink lock poisoned");
        *self.last.lock().map_err(|_| poisoned())? = Some(bytes.to_vec());
        *self.writes.lock().map_err(|_| poisoned())? += 1;
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".into()
    }
}

impl<S: SnapshotSink + ?Sized> SnapshotSink for std::sync::Arc<S> {
    fn write_snapshot(&self, bytes: &[u8]) -> PersistResult<()> {
        (**self).write_snapshot(bytes)
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}
