//! External key to id mapping.

use core::fmt::Debug;
use core::hash::Hash;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use twofold_core::ElemId;

/// Requirements on an external element key.
pub trait Key: Eq + Hash + Clone + Debug + Send + Sync + 'static {}

impl<K: Eq + Hash + Clone + Debug + Send + Sync + 'static> Key for K {}

/// Concurrent map from key to the id of the live element carrying it.
pub struct KeyIndex<K> {
    map: DashMap<K, ElemId>,
}

impl<K: Key> Default for KeyIndex<K> {
    fn default() -> Self {
        Self {
            map: DashMap::new(),
        }
    }
}

impl<K: Key> KeyIndex<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `key` to `id` unless it is already bound.
    ///
    /// On conflict returns the id currently holding the key.
    pub fn reserve(&self, key: K, id: ElemId) -> Result<(), ElemId> {
        match self.map.entry(key) {
            Entry::Occupied(entry) => Err(*entry.get()),
            Entry::Vacant(entry) => {
                entry.insert(id);
                Ok(())
            }
        }
    }

    pub fn get(&self, key: &K) -> Option<ElemId> {
        self.map.get(key).map(|id| *id)
    }

    /// Unbinds `key` if it still points at `id`.
    pub fn release(&self, key: &K, id: ElemId) -> bool {
        self.map.remove_if(key, |_, bound| *bound == id).is_some()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn clear(&self) {
        self.map.clear();
    }
}
