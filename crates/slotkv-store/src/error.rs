/// Errors from store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The key's slot is already occupied (by another key or by this one).
    #[error("collision at index {index} when trying to put key {key}")]
    Collision { index: usize, key: String },

    /// A store cannot be built with zero slots.
    #[error("invalid capacity {0}: must be at least 1")]
    InvalidCapacity(usize),

    /// A thread panicked while holding the table lock.
    #[error("store lock poisoned")]
    LockPoisoned,

    /// `ConcurrentStore::persist` could not serialize or write the snapshot.
    #[error(transparent)]
    Persist(#[from] PersistError),
}

/// Errors from serializing a snapshot or handing it to a sink.
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    /// The table could not be converted to its persisted representation.
    #[error("could not serialize snapshot: {0}")]
    Serialization(String),

    /// The durable sink rejected or failed the write.
    #[error("snapshot write failed: {0}")]
    Io(#[from] std::io::Error),

    /// A snapshot read back from disk does not describe a valid table.
    #[error("invalid snapshot: {0}")]
    InvalidSnapshot(String),
}

impl From<serde_json::Error> for PersistError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Result alias for persistence operations.
pub type PersistResult<T> = Result<T, PersistError>;
