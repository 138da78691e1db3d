//! Mutation scopes, scoped edits and the snapshots that undo them.

use std::collections::{BTreeMap, BTreeSet};

use super::LiveCollection;

/// Keys an optimistic mutation is allowed to touch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationScope<K> {
    keys: BTreeSet<K>,
}

impl<K: Ord> MutationScope<K> {
    /// Scope over a single key.
    pub fn single(key: K) -> Self {
        Self {
            keys: BTreeSet::from([key]),
        }
    }

    /// Whether `key` is covered by the scope.
    pub fn contains(&self, key: &K) -> bool {
        self.keys.contains(key)
    }

    /// Covered keys in order.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.keys.iter()
    }

    /// Number of covered keys.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether the scope covers nothing.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl<K: Ord> FromIterator<K> for MutationScope<K> {
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        Self {
            keys: iter.into_iter().collect(),
        }
    }
}

/// Write access to the items of one scope.
///
/// Keys outside the scope are invisible, so every change made through this
/// view is covered by the snapshot taken before it.
pub struct ScopedEdit<'a, K, V> {
    items: &'a mut BTreeMap<K, V>,
    scope: &'a MutationScope<K>,
}

impl<'a, K: Ord, V> ScopedEdit<'a, K, V> {
    pub(crate) fn new(items: &'a mut BTreeMap<K, V>, scope: &'a MutationScope<K>) -> Self {
        Self { items, scope }
    }

    /// Scoped item, or `None` when absent or out of scope.
    pub fn get(&self, key: &K) -> Option<&V> {
        if self.scope.contains(key) {
            self.items.get(key)
        } else {
            None
        }
    }

    /// Mutable scoped item, or `None` when absent or out of scope.
    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        if self.scope.contains(key) {
            self.items.get_mut(key)
        } else {
            None
        }
    }

    /// Insert or replace an item; returns `false` when `key` is out of scope.
    pub fn insert(&mut self, key: K, value: V) -> bool {
        if !self.scope.contains(&key) {
            return false;
        }
        self.items.insert(key, value);
        true
    }

    /// Remove an item from the snapshot.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        if self.scope.contains(key) {
            self.items.remove(key)
        } else {
            None
        }
    }

    /// Visit every in-scope item that exists.
    pub fn for_each_mut(&mut self, mut f: impl FnMut(&K, &mut V)) {
        for key in self.scope.keys() {
            if let Some(value) = self.items.get_mut(key) {
                f(key, value);
            }
        }
    }
}

/// Pre-mutation copy of every key in a scope.
///
/// Absent keys are captured as `None`, so restoring also undoes inserts.
#[derive(Debug, Clone, PartialEq)]
pub struct MutationSnapshot<K, V> {
    entries: Vec<(K, Option<V>)>,
}

impl<K: Ord + Clone, V: Clone> MutationSnapshot<K, V> {
    /// Copy the scoped entries of `items`.
    pub(crate) fn capture(items: &BTreeMap<K, V>, scope: &MutationScope<K>) -> Self {
        let entries = scope
            .keys()
            .map(|key| (key.clone(), items.get(key).cloned()))
            .collect();
        Self { entries }
    }

    /// Put every captured entry back in one lock acquisition.
    pub fn restore(self, collection: &LiveCollection<K, V>) {
        collection.with_items(|items| {
            for (key, previous) in self.entries {
                match previous {
                    Some(value) => {
                        items.insert(key, value);
                    }
                    None => {
                        items.remove(&key);
                    }
                }
            }
        });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
