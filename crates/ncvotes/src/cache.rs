use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Session-scoped key/value store. Values are cloned out so no lock is
/// held across an await point.
#[derive(Debug)]
pub struct Cache<K, V> {
    entries: Mutex<HashMap<K, V>>,
}

impl<K, V> Default for Cache<K, V> {
    fn default() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }
}

impl<K: Eq + Hash, V: Clone> Cache<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.lock().get(key).cloned()
    }

    /// Stores `value` unless the key is already present; returns whichever
    /// value ends up cached.
    pub fn insert(&self, key: K, value: V) -> V {
        self.lock().entry(key).or_insert(value).clone()
    }

    pub fn get_or_insert_with(&self, key: K, make: impl FnOnce() -> V) -> V {
        self.lock().entry(key).or_insert_with(make).clone()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<K, V>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_keeps_first_value() {
        let cache: Cache<String, u32> = Cache::new();
        assert_eq!(cache.insert("a".into(), 1), 1);
        assert_eq!(cache.insert("a".into(), 2), 1);
        assert_eq!(cache.get("a"), Some(1));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_get_or_insert_with_runs_once() {
        let cache: Cache<String, u32> = Cache::new();
        let mut calls = 0;
        cache.get_or_insert_with("k".into(), || {
            calls += 1;
            7
        });
        let value = cache.get_or_insert_with("k".into(), || 8);
        assert_eq!(value, 7);
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_clear() {
        let cache: Cache<&'static str, u32> = Cache::new();
        cache.insert("a", 1);
        cache.insert("b", 2);
        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.get("a"), None);
    }
}
