//! Ordered set of element ids under a runtime comparator.
//!
//! Each indexed id is placed by a copy of the fields it had when the index
//! last positioned it. Searches compare those placed copies only, so a
//! concurrent field write can never make the ordering inconsistent; the
//! owner repositions the id afterwards. Ties are broken by id, which makes
//! the order strict even when field pairs compare equal.
//!
//! Entries live in a `BTreeSet`, so insert, remove and reposition are
//! O(log n) and the `k` extreme ids are reached in O(log n + k).
//!
//! Readers share an `RwLock`; inserts, removals, repositioning and rebuilds
//! take it exclusively. Callers that must update another structure together
//! with the index (e.g. the element store) do so while holding
//! [`OrderedIndex::write`].

use crate::comparator::FieldComparator;
use core::cmp::Ordering;
use hashbrown::HashMap;
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::collections::BTreeSet;
use twofold_core::ElemId;

/// Resolves an id to the current field values of its element.
pub trait SnapshotLookup<E1, E2> {
    /// Returns the element's fields, or None if it is not live.
    fn snapshot(&self, id: ElemId) -> Option<(E1, E2)>;
}

/// One id at the fields it was placed by.
struct Entry<E1, E2> {
    fields: (E1, E2),
    id: ElemId,
    by: FieldComparator<E1, E2>,
}

impl<E1, E2> Ord for Entry<E1, E2> {
    fn cmp(&self, other: &Self) -> Ordering {
        let (a, b) = (&self.fields, &other.fields);
        self.by
            .ordering(&a.0, &a.1, &b.0, &b.1)
            .then_with(|| self.id.cmp(&other.id))
    }
}

impl<E1, E2> PartialOrd for Entry<E1, E2> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<E1, E2> PartialEq for Entry<E1, E2> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<E1, E2> Eq for Entry<E1, E2> {}

struct OrderedState<E1, E2> {
    entries: BTreeSet<Entry<E1, E2>>,
    placed: HashMap<ElemId, (E1, E2)>,
    cmp: FieldComparator<E1, E2>,
}

impl<E1, E2> OrderedState<E1, E2> {
    fn entry(&self, id: ElemId, fields: (E1, E2)) -> Entry<E1, E2> {
        Entry {
            fields,
            id,
            by: self.cmp.clone(),
        }
    }

    fn unplace(&mut self, id: ElemId) -> bool {
        match self.placed.remove(&id) {
            Some(fields) => {
                let key = self.entry(id, fields);
                self.entries.remove(&key)
            }
            None => false,
        }
    }
}

impl<E1: Clone, E2: Clone> OrderedState<E1, E2> {
    fn place(&mut self, id: ElemId, fields: (E1, E2)) {
        self.unplace(id);
        self.placed.insert(id, fields.clone());
        let entry = self.entry(id, fields);
        self.entries.insert(entry);
    }
}

/// Shared view of the index.
pub struct OrderedRead<'a, E1, E2> {
    state: RwLockReadGuard<'a, OrderedState<E1, E2>>,
}

impl<'a, E1, E2> OrderedRead<'a, E1, E2> {
    #[inline]
    pub fn len(&self) -> usize {
        self.state.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.state.entries.is_empty()
    }

    /// Returns true if `id` is indexed.
    pub fn contains(&self, id: ElemId) -> bool {
        self.state.placed.contains_key(&id)
    }

    /// The fields `id` is currently placed by.
    pub fn placed(&self, id: ElemId) -> Option<&(E1, E2)> {
        self.state.placed.get(&id)
    }

    /// Up to `k` ids from the high end, highest first.
    pub fn top_k(&self, k: usize) -> Vec<ElemId> {
        self.iter().rev().take(k).collect()
    }

    /// Up to `k` ids from the low end, lowest first.
    pub fn bottom_k(&self, k: usize) -> Vec<ElemId> {
        self.iter().take(k).collect()
    }

    /// The lowest id, if any.
    pub fn first(&self) -> Option<ElemId> {
        self.state.entries.first().map(|e| e.id)
    }

    /// The highest id, if any.
    pub fn last(&self) -> Option<ElemId> {
        self.state.entries.last().map(|e| e.id)
    }

    /// Iterates ids from lowest to highest.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = ElemId> + '_ {
        self.state.entries.iter().map(|e| e.id)
    }
}

/// Exclusive view of the index.
pub struct OrderedWrite<'a, E1, E2> {
    state: RwLockWriteGuard<'a, OrderedState<E1, E2>>,
}

impl<'a, E1: Clone, E2: Clone> OrderedWrite<'a, E1, E2> {
    /// Places `id` at `fields`, moving it if it was already indexed. O(log n).
    pub fn insert(&mut self, id: ElemId, fields: (E1, E2)) {
        self.state.place(id, fields);
    }

    /// Removes `id`. Returns false if it was not indexed. O(log n).
    pub fn remove(&mut self, id: ElemId) -> bool {
        self.state.unplace(id)
    }

    /// Moves `id` after its fields changed from `old` to `new`.
    ///
    /// Returns true if the id was moved. Nothing happens if the id is not
    /// indexed, or if the comparator considers `old` and `new` equivalent, in
    /// which case the current position is still correct. The id is placed at
    /// its *current* snapshot, which may already be newer than `new` when
    /// changes to the same element race. O(log n).
    pub fn reposition<L>(&mut self, id: ElemId, old: &(E1, E2), new: &(E1, E2), lookup: &L) -> bool
    where
        L: SnapshotLookup<E1, E2> + ?Sized,
    {
        if self.state.cmp.equivalent(&old.0, &old.1, &new.0, &new.1) {
            return false;
        }
        if !self.state.placed.contains_key(&id) {
            return false;
        }
        match lookup.snapshot(id) {
            Some(current) => self.state.place(id, current),
            None => {
                self.state.unplace(id);
            }
        }
        true
    }

    /// Re-places every indexed id at its current snapshot. O(n log n).
    ///
    /// Ids whose element is gone are dropped.
    pub fn rebuild<L>(&mut self, lookup: &L)
    where
        L: SnapshotLookup<E1, E2> + ?Sized,
    {
        let ids: Vec<ElemId> = self.state.placed.keys().copied().collect();
        self.state.entries.clear();
        self.state.placed.clear();
        for id in ids {
            if let Some(fields) = lookup.snapshot(id) {
                self.state.place(id, fields);
            }
        }
    }

    /// Replaces the comparator and rebuilds in one exclusive section.
    pub fn set_compare<L>(&mut self, cmp: FieldComparator<E1, E2>, lookup: &L)
    where
        L: SnapshotLookup<E1, E2> + ?Sized,
    {
        self.state.cmp = cmp;
        self.rebuild(lookup);
    }

    /// Removes every id.
    pub fn clear(&mut self) {
        self.state.entries.clear();
        self.state.placed.clear();
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.state.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.state.entries.is_empty()
    }

    /// Iterates ids from lowest to highest.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = ElemId> + '_ {
        self.state.entries.iter().map(|e| e.id)
    }
}

/// Ids of live elements kept sorted by a replaceable comparator.
pub struct OrderedIndex<E1, E2> {
    state: RwLock<OrderedState<E1, E2>>,
}

impl<E1, E2> OrderedIndex<E1, E2> {
    /// Creates an empty index ordered by `cmp`.
    pub fn new(cmp: FieldComparator<E1, E2>) -> Self {
        Self {
            state: RwLock::new(OrderedState {
                entries: BTreeSet::new(),
                placed: HashMap::new(),
                cmp,
            }),
        }
    }

    /// Acquires the shared lock.
    pub fn read(&self) -> OrderedRead<'_, E1, E2> {
        OrderedRead {
            state: self.state.read(),
        }
    }

    /// Acquires the exclusive lock.
    pub fn write(&self) -> OrderedWrite<'_, E1, E2> {
        OrderedWrite {
            state: self.state.write(),
        }
    }

    /// Returns the current comparator.
    pub fn comparator(&self) -> FieldComparator<E1, E2> {
        self.state.read().cmp.clone()
    }

    /// Returns true if a change from `old` to `new` can move an element,
    /// i.e. the current comparator does not consider them equivalent.
    ///
    /// Takes the shared lock only, so callers can skip the exclusive lock for
    /// changes that leave every position intact.
    pub fn reorders(&self, old: &(E1, E2), new: &(E1, E2)) -> bool {
        !self
            .state
            .read()
            .cmp
            .equivalent(&old.0, &old.1, &new.0, &new.1)
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    pub fn top_k(&self, k: usize) -> Vec<ElemId> {
        self.read().top_k(k)
    }

    pub fn bottom_k(&self, k: usize) -> Vec<ElemId> {
        self.read().bottom_k(k)
    }

    /// Copies out all ids from lowest to highest.
    pub fn to_vec(&self) -> Vec<ElemId> {
        self.read().iter().collect()
    }
}

impl<E1, E2> Default for OrderedIndex<E1, E2>
where
    E1: PartialOrd + 'static,
    E2: PartialOrd + 'static,
{
    fn default() -> Self {
        Self::new(FieldComparator::lexicographic())
    }
}
