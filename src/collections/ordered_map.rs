//! Insertion-ordered map
//!
//! Object keys and rule sets must keep their declaration order for AST export
//! and error messages, while lookups stay O(1). Entries live in a vector and a
//! hash index maps each key to its slot.

use std::collections::HashMap;
use std::hash::Hash;

/// Map preserving insertion order with constant-time lookup.
#[derive(Debug, Clone)]
pub struct OrderedMap<K, V> {
    entries: Vec<(K, V)>,
    index: HashMap<K, usize>,
}

impl<K, V> Default for OrderedMap<K, V> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<K: Eq + Hash + Clone, V> OrderedMap<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a new entry at the end.
    ///
    /// Returns the rejected value back if the key is already present; the
    /// existing entry is left untouched.
    pub fn insert(&mut self, key: K, value: V) -> Result<(), V> {
        if self.index.contains_key(&key) {
            return Err(value);
        }
        self.index.insert(key.clone(), self.entries.len());
        self.entries.push((key, value));
        Ok(())
    }

    /// Inserts or replaces an entry, keeping the original slot on replace.
    pub fn set(&mut self, key: K, value: V) {
        match self.index.get(&key) {
            Some(&slot) => self.entries[slot].1 = value,
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key, value));
            }
        }
    }

    /// Removes an entry, shifting later entries down.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        let slot = self.index.remove(key)?;
        let (_, value) = self.entries.remove(slot);
        for position in self.index.values_mut() {
            if *position > slot {
                *position -= 1;
            }
        }
        Some(value)
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.index.get(key).map(|&slot| &self.entries[slot].1)
    }

    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        match self.index.get(key) {
            Some(&slot) => Some(&mut self.entries[slot].1),
            None => None,
        }
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.index.contains_key(key)
    }

    /// Returns the position of a key in insertion order.
    pub fn position(&self, key: &K) -> Option<usize> {
        self.index.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.entries.iter().map(|(k, _)| k)
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.entries.iter().map(|(_, v)| v)
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut V> {
        self.entries.iter_mut().map(|(_, v)| v)
    }

    /// Returns the first entry in insertion order.
    pub fn first(&self) -> Option<(&K, &V)> {
        self.entries.first().map(|(k, v)| (k, v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keeps_insertion_order() {
        let mut map = OrderedMap::new();
        map.insert("zebra", 1).unwrap();
        map.insert("apple", 2).unwrap();
        map.insert("mango", 3).unwrap();

        let keys: Vec<_> = map.keys().copied().collect();
        assert_eq!(keys, vec!["zebra", "apple", "mango"]);
        assert_eq!(map.get(&"apple"), Some(&2));
    }

    #[test]
    fn test_duplicate_insert_is_rejected() {
        let mut map = OrderedMap::new();
        map.insert("a", 1).unwrap();
        assert_eq!(map.insert("a", 2), Err(2));
        assert_eq!(map.get(&"a"), Some(&1));
    }

    #[test]
    fn test_remove_reindexes() {
        let mut map = OrderedMap::new();
        map.insert("a", 1).unwrap();
        map.insert("b", 2).unwrap();
        map.insert("c", 3).unwrap();

        assert_eq!(map.remove(&"a"), Some(1));
        assert_eq!(map.position(&"c"), Some(1));
        assert_eq!(map.get(&"c"), Some(&3));
        assert_eq!(map.first(), Some((&"b", &2)));
    }

    #[test]
    fn test_set_replaces_in_place() {
        let mut map = OrderedMap::new();
        map.insert("a", 1).unwrap();
        map.insert("b", 2).unwrap();
        map.set("a", 10);

        let values: Vec<_> = map.values().copied().collect();
        assert_eq!(values, vec![10, 2]);
    }
}
