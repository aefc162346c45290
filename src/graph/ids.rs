//! Dense deterministic index assignment.

use std::collections::{BTreeMap, HashMap, HashSet};

use super::EntityType;

/// Bijection between one type's external keys and `0..len()`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdMap {
    index: HashMap<String, usize>,
    keys: Vec<String>,
}

/// ID maps of every declared entity type.
pub type IdMaps = BTreeMap<EntityType, IdMap>;

impl IdMap {
    /// Map whose key at position `i` gets index `i`. Later duplicates are ignored.
    pub fn from_ordered_keys(keys: Vec<String>) -> Self {
        let mut map = Self::default();
        for key in keys {
            if !map.index.contains_key(&key) {
                map.index.insert(key.clone(), map.keys.len());
                map.keys.push(key);
            }
        }
        map
    }

    pub fn get(&self, key: &str) -> Option<usize> {
        self.index.get(key).copied()
    }

    /// External key of `index`.
    pub fn key(&self, index: usize) -> Option<&str> {
        self.keys.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// (key, index) pairs in index order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.keys.iter().enumerate().map(|(i, k)| (k.as_str(), i))
    }
}

/// Sort the key set by byte order and number it from 0.
pub fn assign_ids(keys: &HashSet<String>) -> IdMap {
    let mut sorted: Vec<String> = keys.iter().cloned().collect();
    sorted.sort_unstable();
    IdMap::from_ordered_keys(sorted)
}
