//! The fixed-size slot table and its snapshot format.
//!
//! A [`SlotTable`] is an arena of optional [`Entry`] values whose length is
//! fixed at construction. An entry always lives at the slot its key hashes
//! to; there is no probing and no chaining.
//!
//! # Snapshot format
//!
//! A table serializes as a JSON array with one element per slot, in slot
//! order. Empty slots are `null`, occupied slots are `{"key": .., "value": ..}`.

use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize, Serializer};

use crate::error::{PersistError, PersistResult, StoreError, StoreResult};
use crate::hash::slot_index;

/// An immutable key/value pairing stored in one slot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry<V> {
    key: String,
    value: V,
}

impl<V> Entry<V> {
    pub fn new(key: impl Into<String>, value: V) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn value(&self) -> &V {
        &self.value
    }
}

/// Outcome of looking a key up in its slot.
///
/// An empty slot and a slot held by a different key are reported as distinct
/// outcomes so a caller can never mistake them for a stored value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Lookup<V> {
    /// The slot holds the requested key.
    Found(V),
    /// Nothing is stored at the key's slot.
    EmptySlot { index: usize },
    /// Another key occupies the key's slot.
    KeyMismatch { index: usize, actual_key: String },
}

impl<V> Lookup<V> {
    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }
}

/// Fixed-length sequence of optional entries, indexed by key hash.
///
/// This is also the read-only view handed to persistence policies.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SlotTable<V> {
    slots: Vec<Option<Entry<V>>>,
    occupied: usize,
}

impl<V> SlotTable<V> {
    /// Allocate a table of `capacity` empty slots.
    pub fn with_capacity(capacity: usize) -> StoreResult<Self> {
        if capacity == 0 {
            return Err(StoreError::InvalidCapacity(capacity));
        }
        Ok(Self::empty(capacity))
    }

    /// `capacity` must be non-zero.
    pub(crate) fn empty(capacity: usize) -> Self {
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || None);
        Self { slots, occupied: 0 }
    }

    /// Number of slots. Never changes after construction.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of occupied slots.
    pub fn occupied(&self) -> usize {
        self.occupied
    }

    pub fn is_empty(&self) -> bool {
        self.occupied == 0
    }

    /// Ratio of occupied slots to capacity.
    pub fn load_factor(&self) -> f64 {
        self.occupied as f64 / self.capacity() as f64
    }

    /// Slot index for `key` in this table.
    pub fn index_of(&self, key: &str) -> usize {
        slot_index(key, self.capacity())
    }

    /// Entry at slot `index`, if any.
    pub fn get(&self, index: usize) -> Option<&Entry<V>> {
        self.slots.get(index).and_then(Option::as_ref)
    }

    /// All slots in index order, empty ones included.
    pub fn slots(&self) -> &[Option<Entry<V>>] {
        &self.slots
    }

    /// Occupied slots with their indices, in index order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &Entry<V>)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|e| (i, e)))
    }

    /// Place `key` at its slot. Fails with `Collision` if the slot is taken,
    /// leaving the table unchanged.
    pub(crate) fn insert(&mut self, key: String, value: V) -> StoreResult<usize> {
        let index = self.index_of(&key);
        let slot = &mut self.slots[index];
        if slot.is_some() {
            return Err(StoreError::Collision { index, key });
        }
        *slot = Some(Entry { key, value });
        self.occupied += 1;
        Ok(index)
    }
}

impl<V: Clone> SlotTable<V> {
    /// Resolve `key` against its slot.
    pub fn lookup(&self, key: &str) -> Lookup<V> {
        let index = self.index_of(key);
        match &self.slots[index] {
            None => Lookup::EmptySlot { index },
            Some(entry) if entry.key == key => Lookup::Found(entry.value.clone()),
            Some(entry) => Lookup::KeyMismatch {
                index,
                actual_key: entry.key.clone(),
            },
        }
    }
}

impl<V: Serialize> SlotTable<V> {
    /// Serialize the whole table, empty slots included, as indented JSON.
    pub fn to_json_pretty(&self) -> PersistResult<Vec<u8>> {
        Ok(serde_json::to_vec_pretty(self)?)
    }
}

impl<V: DeserializeOwned> SlotTable<V> {
    /// Rebuild a table from snapshot bytes.
    ///
    /// The slot count becomes the capacity, and every entry must sit at the
    /// slot its key hashes to for that capacity.
    pub fn from_json_slice(bytes: &[u8]) -> PersistResult<Self> {
        let slots: Vec<Option<Entry<V>>> = serde_json::from_slice(bytes)
            .map_err(|e| PersistError::InvalidSnapshot(e.to_string()))?;
        if slots.is_empty() {
            return Err(PersistError::InvalidSnapshot(
                "snapshot has no slots".into(),
            ));
        }
        let capacity = slots.len();
        let mut occupied = 0;
        for (i, slot) in slots.iter().enumerate() {
            if let Some(entry) = slot {
                let expected = slot_index(&entry.key, capacity);
                if expected != i {
                    return Err(PersistError::InvalidSnapshot(format!(
                        "key {:?} found at slot {i}, hashes to {expected}",
                        entry.key
                    )));
                }
                occupied += 1;
            }
        }
        Ok(Self { slots, occupied })
    }

    /// Read and decode a snapshot file.
    pub fn load(path: &Path) -> PersistResult<Self> {
        let bytes = std::fs::read(path)?;
        Self::from_json_slice(&bytes)
    }
}

impl<V: Serialize> Serialize for SlotTable<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.slots.serialize(serializer)
    }
}
