//! Fixed-capacity concurrent key-value store with edge-triggered snapshots.
//!
//! Keys are strings, values are any `V`. The store holds a fixed number of
//! slots and places every key at the slot its hash names. There is no
//! probing, chaining, resizing or eviction: a put into an occupied slot is
//! rejected as a collision.
//!
//! # Concurrency
//!
//! One `RwLock` guards the whole table. Gets share it; a put holds it
//! exclusively, including the persistence check and any flush it triggers.
//!
//! # Persistence
//!
//! After every successful put the store asks its [`PersistPolicy`] whether to
//! flush. If so, the whole table (empty slots included) is serialized as
//! indented JSON and handed to a [`SnapshotSink`], which replaces the previous
//! snapshot. A failed flush is reported but never undoes the put.
//!
//! ```no_run
//! use slotkv_store::{ConcurrentStore, Lookup, policy::EveryN};
//!
//! let store = ConcurrentStore::new(EveryN(100));
//! store.put("a", 1u32).unwrap();
//! assert_eq!(store.get("a").unwrap(), Lookup::Found(1));
//! ```

pub mod error;
pub mod hash;
pub mod policy;
pub mod sink;
pub mod store;
pub mod table;
pub mod traits;

pub use error::{PersistError, PersistResult, StoreError, StoreResult};
pub use hash::slot_index;
pub use sink::{FileSink, MemorySink, DEFAULT_SNAPSHOT_PATH};
pub use store::{ConcurrentStore, FlushOutcome, PutReceipt, StoreOptions, DEFAULT_CAPACITY};
pub use table::{Entry, Lookup, SlotTable};
pub use traits::{PersistPolicy, SnapshotSink};
