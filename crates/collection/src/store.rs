//! Element storage.
//!
//! Records live in a `DashMap`, so the unit of mutual exclusion is one shard
//! rather than the whole table. Accessor guards never escape this module:
//! every method copies out what it needs and releases the shard before
//! returning, which keeps callers from holding a record lock while they go on
//! to take the ordered-index lock.

use core::sync::atomic::{AtomicUsize, Ordering};
use dashmap::DashMap;
use twofold_core::ElemId;
use twofold_incremental::Field;
use twofold_index::SnapshotLookup;
use twofold_reactive::ReactiveCell;

/// One live element.
pub struct ElementRecord<E1, E2, K> {
    elem1: ReactiveCell<E1>,
    elem2: ReactiveCell<E2>,
    /// Field values as last folded into the totals.
    last: (E1, E2),
    key: Option<K>,
}

impl<E1: Field, E2: Field, K> ElementRecord<E1, E2, K> {
    /// Creates a record whose cells and snapshot start at `(e1, e2)`.
    pub fn new(e1: E1, e2: E2, key: Option<K>) -> Self {
        Self {
            elem1: ReactiveCell::new(e1.clone()),
            elem2: ReactiveCell::new(e2.clone()),
            last: (e1, e2),
            key,
        }
    }

    #[inline]
    pub fn elem1(&self) -> &ReactiveCell<E1> {
        &self.elem1
    }

    #[inline]
    pub fn elem2(&self) -> &ReactiveCell<E2> {
        &self.elem2
    }

    /// Consumes the record, returning its final snapshot and key.
    pub fn into_parts(self) -> ((E1, E2), Option<K>) {
        (self.last, self.key)
    }
}

/// Point-in-time copy of an element.
#[derive(Clone, Debug, PartialEq)]
pub struct ElementSnapshot<E1, E2, K> {
    pub id: ElemId,
    pub elem1: E1,
    pub elem2: E2,
    pub key: Option<K>,
}

impl<E1: Field, E2: Field, K: Clone> ElementSnapshot<E1, E2, K> {
    fn of(id: ElemId, record: &ElementRecord<E1, E2, K>) -> Self {
        Self {
            id,
            elem1: record.last.0.clone(),
            elem2: record.last.1.clone(),
            key: record.key.clone(),
        }
    }
}

/// Concurrent map from id to record with a lock-free live count.
pub struct ElementStore<E1, E2, K> {
    records: DashMap<ElemId, ElementRecord<E1, E2, K>>,
    live: AtomicUsize,
}

impl<E1, E2, K> Default for ElementStore<E1, E2, K> {
    fn default() -> Self {
        Self {
            records: DashMap::new(),
            live: AtomicUsize::new(0),
        }
    }
}

impl<E1, E2, K> ElementStore<E1, E2, K>
where
    E1: Field,
    E2: Field,
    K: Clone + PartialEq,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a record under a fresh id.
    pub fn insert(&self, id: ElemId, record: ElementRecord<E1, E2, K>) {
        if self.records.insert(id, record).is_none() {
            self.live.fetch_add(1, Ordering::AcqRel);
        }
    }

    /// Removes a record, returning it.
    pub fn remove(&self, id: ElemId) -> Option<ElementRecord<E1, E2, K>> {
        let (_, record) = self.records.remove(&id)?;
        self.live.fetch_sub(1, Ordering::AcqRel);
        Some(record)
    }

    /// Folds the cells' current values into the record's snapshot.
    ///
    /// Both cells are read under the record's lock, so two fields changed by
    /// different threads are captured together. Returns `(old, new)` if the
    /// snapshot moved, None if the element is gone or nothing changed.
    pub fn refresh(&self, id: ElemId) -> Option<((E1, E2), (E1, E2))> {
        let mut record = self.records.get_mut(&id)?;
        let current = (record.elem1.get(), record.elem2.get());
        if current == record.last {
            return None;
        }
        let old = core::mem::replace(&mut record.last, current.clone());
        Some((old, current))
    }

    #[inline]
    pub fn contains(&self, id: ElemId) -> bool {
        self.records.contains_key(&id)
    }

    /// Returns handles to the element's cells.
    pub fn cells(&self, id: ElemId) -> Option<(ReactiveCell<E1>, ReactiveCell<E2>)> {
        self.records
            .get(&id)
            .map(|record| (record.elem1.clone(), record.elem2.clone()))
    }

    pub fn get(&self, id: ElemId) -> Option<ElementSnapshot<E1, E2, K>> {
        self.records
            .get(&id)
            .map(|record| ElementSnapshot::of(id, &record))
    }

    /// Copies out every element. Tolerates concurrent writers on other shards.
    pub fn snapshots(&self) -> Vec<ElementSnapshot<E1, E2, K>> {
        self.records
            .iter()
            .map(|entry| ElementSnapshot::of(*entry.key(), entry.value()))
            .collect()
    }

    pub fn ids(&self) -> Vec<ElemId> {
        self.records.iter().map(|entry| *entry.key()).collect()
    }

    /// Full scan for the element carrying `key`.
    pub fn find_by_key_linear(&self, key: &K) -> Option<ElemId> {
        self.records
            .iter()
            .find(|entry| entry.value().key.as_ref() == Some(key))
            .map(|entry| *entry.key())
    }

    /// Number of live elements, read from the counter.
    #[inline]
    pub fn len(&self) -> usize {
        self.live.load(Ordering::Acquire)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.records.clear();
        self.live.store(0, Ordering::Release);
    }
}

impl<E1, E2, K> SnapshotLookup<E1, E2> for ElementStore<E1, E2, K>
where
    E1: Field,
    E2: Field,
{
    fn snapshot(&self, id: ElemId) -> Option<(E1, E2)> {
        self.records.get(&id).map(|record| record.last.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Store = ElementStore<i64, i64, &'static str>;

    fn id(n: u64) -> ElemId {
        ElemId::new(n)
    }

    #[test]
    fn test_insert_remove_counts() {
        let store = Store::new();
        store.insert(id(1), ElementRecord::new(1, 10, None));
        store.insert(id(2), ElementRecord::new(2, 20, Some("b")));
        assert_eq!(store.len(), 2);
        assert!(store.contains(id(2)));

        let record = store.remove(id(1)).unwrap();
        assert_eq!(record.into_parts(), ((1, 10), None));
        assert_eq!(store.len(), 1);
        assert!(store.remove(id(1)).is_none());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_refresh_captures_both_fields() {
        let store = Store::new();
        store.insert(id(1), ElementRecord::new(1, 10, None));
        let (c1, c2) = store.cells(id(1)).unwrap();

        assert_eq!(store.refresh(id(1)), None);

        c1.set(2);
        c2.set(30);
        assert_eq!(store.refresh(id(1)), Some(((1, 10), (2, 30))));
        assert_eq!(store.refresh(id(1)), None);
        assert_eq!(store.get(id(1)).unwrap().elem2, 30);
    }

    #[test]
    fn test_refresh_of_missing_id() {
        let store = Store::new();
        assert_eq!(store.refresh(id(9)), None);
    }

    #[test]
    fn test_lookup_and_linear_find() {
        let store = Store::new();
        store.insert(id(1), ElementRecord::new(1, 10, Some("a")));
        store.insert(id(2), ElementRecord::new(2, 20, Some("b")));

        assert_eq!(store.snapshot(id(2)), Some((2, 20)));
        assert_eq!(store.find_by_key_linear(&"b"), Some(id(2)));
        assert_eq!(store.find_by_key_linear(&"z"), None);

        let mut ids = store.ids();
        ids.sort();
        assert_eq!(ids, vec![id(1), id(2)]);
        assert_eq!(store.snapshots().len(), 2);

        store.clear();
        assert!(store.is_empty());
    }
}
