//! Hash map with source-location tracking for duplicate-definition errors.
//!
//! `FabMap` wraps `IndexMap` so iteration follows insertion order, and its
//! `validate_insert` raises the already-defined diagnostic with both the old
//! and the new definition's source span.

use std::hash::Hash;

use indexmap::{Equivalent, IndexMap};

use crate::error::FabError;
use crate::nom_tools::SpanInfo;

/// Trait for values that can report where they were defined.
pub trait Spanned {
    fn span(&self) -> SpanInfo;
}

#[derive(Debug, Clone)]
struct Entry<V> {
    value: V,
    defined_at: SpanInfo,
}

/// An insertion-ordered map that remembers where each value was defined.
#[derive(Debug, Clone)]
pub struct FabMap<K: Hash + Eq, V: Spanned> {
    map: IndexMap<K, Entry<V>>,
}

impl<K: Hash + Eq, V: Spanned> Default for FabMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Hash + Eq, V: Spanned> FabMap<K, V> {
    pub fn new() -> Self {
        Self { map: IndexMap::new() }
    }

    /// Inserts without validation, returning the previous value if any.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        let defined_at = value.span();
        self.map
            .insert(key, Entry { value, defined_at })
            .map(|entry| entry.value)
    }

    /// Inserts a key-value pair, raising a semantic error if the key is
    /// already defined. The error labels both definition sites.
    pub fn validate_insert(&mut self, key: K, value: V) -> Result<(), FabError> {
        let defined_at = value.span();

        if let Some(old) = self.map.get(&key) {
            return Err(FabError::already_defined(
                defined_at,
                old.defined_at.clone(),
            ));
        }

        self.map.insert(key, Entry { value, defined_at });
        Ok(())
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        Q: ?Sized + Hash + Equivalent<K>,
    {
        self.map.get(key).map(|entry| &entry.value)
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        Q: ?Sized + Hash + Equivalent<K>,
    {
        self.map.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.map.keys()
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.map.values().map(|entry| &entry.value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.map.iter().map(|(key, entry)| (key, &entry.value))
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Probe(i64);

    impl Spanned for Probe {
        fn span(&self) -> SpanInfo {
            SpanInfo::none()
        }
    }

    #[test]
    fn insert_and_get() {
        let mut map = FabMap::new();
        map.validate_insert("a", Probe(1)).unwrap();
        assert_eq!(map.get("a"), Some(&Probe(1)));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn duplicate_insert_fails() {
        let mut map = FabMap::new();
        map.validate_insert("a", Probe(1)).unwrap();
        assert!(map.validate_insert("a", Probe(2)).is_err());
    }

    #[test]
    fn iteration_follows_insertion_order() {
        let mut map = FabMap::new();
        map.validate_insert("z", Probe(1)).unwrap();
        map.validate_insert("a", Probe(2)).unwrap();
        let keys: Vec<_> = map.keys().copied().collect();
        assert_eq!(keys, vec!["z", "a"]);
    }
}
