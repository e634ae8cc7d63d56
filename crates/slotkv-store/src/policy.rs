//! Stock persistence policies.
//!
//! Closures cover anything bespoke; these cover the common triggers.

use serde::{Deserialize, Serialize};

use crate::table::SlotTable;
use crate::traits::PersistPolicy;

/// Never flush automatically.
#[derive(Clone, Copy, Debug, Default)]
pub struct Never;

impl<V> PersistPolicy<V> for Never {
    fn should_persist(&self, _table: &SlotTable<V>) -> bool {
        false
    }
}

/// Flush after every successful put.
#[derive(Clone, Copy, Debug, Default)]
pub struct Always;

impl<V> PersistPolicy<V> for Always {
    fn should_persist(&self, _table: &SlotTable<V>) -> bool {
        true
    }
}

/// Flush whenever the number of occupied slots is a non-zero multiple of `n`.
///
/// `EveryN(0)` never fires.
#[derive(Clone, Copy, Debug)]
pub struct EveryN(pub usize);

impl<V> PersistPolicy<V> for EveryN {
    fn should_persist(&self, table: &SlotTable<V>) -> bool {
        let occupied = table.occupied();
        self.0 != 0 && occupied != 0 && occupied % self.0 == 0
    }
}

/// Flush whenever the load factor is at or above the threshold.
#[derive(Clone, Copy, Debug)]
pub struct LoadFactorAbove(pub f64);

impl<V> PersistPolicy<V> for LoadFactorAbove {
    fn should_persist(&self, table: &SlotTable<V>) -> bool {
        table.load_factor() >= self.0
    }
}

/// Serializable choice of stock policy, as it appears in configuration files.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum PolicyKind {
    #[default]
    Never,
    Always,
    EveryN { n: usize },
    LoadFactor { threshold: f64 },
}

impl PolicyKind {
    /// Build the policy this kind names.
    pub fn build<V>(self) -> Box<dyn PersistPolicy<V>> {
        match self {
            Self::Never => Box::new(Never),
            Self::Always => Box::new(Always),
            Self::EveryN { n } => Box::new(EveryN(n)),
            Self::LoadFactor { threshold } => Box::new(LoadFactorAbove(threshold)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_with(occupied: usize, capacity: usize) -> SlotTable<u8> {
        let mut t = SlotTable::with_capacity(capacity).unwrap();
        let mut i = 0u32;
        while t.occupied() < occupied {
            // Skip keys that would collide.
            let _ = t.insert(format!("k{i}"), 0);
            i += 1;
        }
        t
    }

    #[test]
    fn never_and_always() {
        let t = table_with(3, 100);
        assert!(!PersistPolicy::should_persist(&Never, &t));
        assert!(PersistPolicy::should_persist(&Always, &t));
    }

    #[test]
    fn every_n_fires_on_multiples_only() {
        let policy = EveryN(3);
        assert!(!policy.should_persist(&table_with(0, 100)));
        assert!(!policy.should_persist(&table_with(2, 100)));
        assert!(policy.should_persist(&table_with(3, 100)));
        assert!(!policy.should_persist(&table_with(4, 100)));
        assert!(policy.should_persist(&table_with(6, 100)));
    }

    #[test]
    fn every_zero_never_fires() {
        assert!(!EveryN(0).should_persist(&table_with(5, 100)));
    }

    #[test]
    fn load_factor_threshold_is_inclusive() {
        let policy = LoadFactorAbove(0.5);
        assert!(!policy.should_persist(&table_with(4, 10)));
        assert!(policy.should_persist(&table_with(5, 10)));
    }

    #[test]
    fn closures_are_policies() {
        let policy = |t: &SlotTable<u8>| t.occupied() > 1;
        assert!(!policy.should_persist(&table_with(1, 10)));
        assert!(policy.should_persist(&table_with(2, 10)));
    }

    #[test]
    fn kind_builds_matching_policy() {
        let t = table_with(2, 10);
        assert!(PolicyKind::EveryN { n: 2 }.build::<u8>().should_persist(&t));
        assert!(!PolicyKind::Never.build::<u8>().should_persist(&t));
        assert!(PolicyKind::LoadFactor { threshold: 0.2 }
            .build::<u8>()
            .should_persist(&t));
    }

    #[test]
    fn default_kind_is_never() {
        assert_eq!(PolicyKind::default(), PolicyKind::Never);
    }

    #[test]
    fn kind_parses_from_tagged_form() {
        let kind: PolicyKind = serde_json::from_str(r#"{"mode": "every_n", "n": 10}"#).unwrap();
        assert_eq!(kind, PolicyKind::EveryN { n: 10 });
    }
}
