//! Shared in-memory collection that optimistic mutations edit in place.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Cloneable handle over an ordered, shared map of items.
///
/// Every clone observes the same items. The lock is never held across an
/// await point; readers always see either the state before or after a whole
/// local update or rollback.
#[derive(Debug)]
pub struct LiveCollection<K, V> {
    items: Arc<Mutex<BTreeMap<K, V>>>,
}

impl<K, V> Clone for LiveCollection<K, V> {
    fn clone(&self) -> Self {
        Self {
            items: Arc::clone(&self.items),
        }
    }
}

impl<K: Ord, V> Default for LiveCollection<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Ord, V> LiveCollection<K, V> {
    /// Empty collection.
    pub fn new() -> Self {
        Self {
            items: Arc::new(Mutex::new(BTreeMap::new())),
        }
    }

    /// Collection seeded with `items`.
    pub fn from_items(items: impl IntoIterator<Item = (K, V)>) -> Self {
        Self {
            items: Arc::new(Mutex::new(items.into_iter().collect())),
        }
    }

    /// Insert or replace an item, returning the previous value.
    pub fn insert(&self, key: K, value: V) -> Option<V> {
        self.lock().insert(key, value)
    }

    /// Remove an item.
    pub fn remove(&self, key: &K) -> Option<V> {
        self.lock().remove(key)
    }

    /// Apply `edit` to one item; returns `false` when the key is absent.
    pub fn update(&self, key: &K, edit: impl FnOnce(&mut V)) -> bool {
        match self.lock().get_mut(key) {
            Some(value) => {
                edit(value);
                true
            }
            None => false,
        }
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.lock().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Run `f` with exclusive access to the whole map.
    pub(crate) fn with_items<R>(&self, f: impl FnOnce(&mut BTreeMap<K, V>) -> R) -> R {
        f(&mut self.lock())
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<K, V>> {
        self.items.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<K: Ord + Clone, V: Clone> LiveCollection<K, V> {
    /// Copy of one item.
    pub fn get(&self, key: &K) -> Option<V> {
        self.lock().get(key).cloned()
    }

    /// Copy of every item in key order.
    pub fn items(&self) -> Vec<(K, V)> {
        self.lock()
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }

    /// Copy of every value in key order.
    pub fn values(&self) -> Vec<V> {
        self.lock().values().cloned().collect()
    }
}
