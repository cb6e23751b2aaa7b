//! Immutable, shared-ownership string-keyed map used on the engine side.
//!
//! Engine requests and responses hold their key and value mappings as
//! snapshots: once built, nothing can mutate them, and clones share the
//! same allocation.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::btree_map;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Persistent snapshot of a `String -> V` mapping
///
/// # Example
/// ```
/// use feature_fetch_core_rs::FrozenMap;
///
/// let map: FrozenMap<i64> = [("a".to_string(), 1), ("b".to_string(), 2)]
///     .into_iter()
///     .collect();
/// let shared = map.clone();
///
/// assert_eq!(shared.get("b"), Some(&2));
/// assert_eq!(map, shared);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct FrozenMap<V> {
    entries: Arc<BTreeMap<String, V>>,
}

impl<V> FrozenMap<V> {
    /// Empty snapshot
    pub fn empty() -> Self {
        Self {
            entries: Arc::new(BTreeMap::new()),
        }
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        self.entries.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in ascending key order
    pub fn iter(&self) -> btree_map::Iter<'_, String, V> {
        self.entries.iter()
    }

    pub fn keys(&self) -> btree_map::Keys<'_, String, V> {
        self.entries.keys()
    }

    /// True when both handles point at the same snapshot allocation
    pub fn shares_snapshot_with(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.entries, &other.entries)
    }
}

impl<V> Default for FrozenMap<V> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<V> From<BTreeMap<String, V>> for FrozenMap<V> {
    fn from(entries: BTreeMap<String, V>) -> Self {
        Self {
            entries: Arc::new(entries),
        }
    }
}

impl<V> FromIterator<(String, V)> for FrozenMap<V> {
    fn from_iter<I: IntoIterator<Item = (String, V)>>(iter: I) -> Self {
        Self::from(iter.into_iter().collect::<BTreeMap<_, _>>())
    }
}

impl<'a, V> IntoIterator for &'a FrozenMap<V> {
    type Item = (&'a String, &'a V);
    type IntoIter = btree_map::Iter<'a, String, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl<V: Serialize> Serialize for FrozenMap<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.entries.as_ref().serialize(serializer)
    }
}

impl<'de, V: Deserialize<'de>> Deserialize<'de> for FrozenMap<V> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        BTreeMap::<String, V>::deserialize(deserializer).map(Self::from)
    }
}
