use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use slotkv_store::policy::PolicyKind;
use slotkv_store::{StoreOptions, DEFAULT_CAPACITY, DEFAULT_SNAPSHOT_PATH};

/// Settings for a `slotkv` session, read from TOML.
///
/// ```toml
/// capacity = 1000
/// snapshot_path = "kvs.json"
///
/// [persist]
/// mode = "every_n"
/// n = 10
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlotkvConfig {
    pub capacity: usize,
    pub snapshot_path: PathBuf,
    pub persist: PolicyKind,
}

impl Default for SlotkvConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            snapshot_path: PathBuf::from(DEFAULT_SNAPSHOT_PATH),
            persist: PolicyKind::default(),
        }
    }
}

impl SlotkvConfig {
    pub fn from_toml_str(text: &str) -> anyhow::Result<Self> {
        toml::from_str(text).context("invalid slotkv config")
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_toml_str(&text)
    }

    /// Apply command-line overrides on top of file or default values.
    pub fn with_overrides(mut self, capacity: Option<usize>, snapshot: Option<PathBuf>) -> Self {
        if let Some(capacity) = capacity {
            self.capacity = capacity;
        }
        if let Some(snapshot) = snapshot {
            self.snapshot_path = snapshot;
        }
        self
    }

    pub fn store_options(&self) -> StoreOptions {
        StoreOptions {
            capacity: self.capacity,
            snapshot_path: self.snapshot_path.clone(),
        }
    }
}
