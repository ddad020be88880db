//! The reactive collection.

use crate::builder::CollectionBuilder;
use crate::keys::{Key, KeyIndex};
use crate::monitor::ChangeMonitor;
use crate::store::{ElementRecord, ElementSnapshot, ElementStore};
use core::ops::{AddAssign, Mul, Sub};
use parking_lot::{ReentrantMutex, ReentrantMutexGuard};
use std::sync::Arc;
use tracing::{debug, trace, warn};
use twofold_core::{CollectionConfig, ElemId, Error, IdGenerator, Result};
use twofold_incremental::{AggMode, AggregateEngine, AggregateSpec, Field, Total, Transition};
use twofold_index::{FieldComparator, OrderedIndex};
use twofold_reactive::{batch, BatchGuard, ReactiveCell};

/// State shared between the collection handle and its element monitors.
pub(crate) struct Inner<E1, E2, T1, T2, K> {
    pub(crate) ids: IdGenerator,
    pub(crate) store: ElementStore<E1, E2, K>,
    pub(crate) keys: KeyIndex<K>,
    pub(crate) ordered: Option<OrderedIndex<E1, E2>>,
    pub(crate) engine: AggregateEngine<E1, E2, T1, T2>,
    pub(crate) monitors: ChangeMonitor,
    pub(crate) writer: Option<ReentrantMutex<()>>,
    pub(crate) config: CollectionConfig,
}

/// A concurrent set of two-field elements with two reactive totals.
///
/// Every element holds its fields in two [`ReactiveCell`]s. Writing either
/// cell, from any thread, updates `total1`/`total2` and the optional ordered
/// index synchronously on the writing thread.
///
/// # Example
///
/// ```
/// use twofold_collection::{CollectionConfig, ReactiveCollection};
///
/// let book: ReactiveCollection<i64, i64, i64, i64> =
///     ReactiveCollection::with_default_totals(CollectionConfig::default());
///
/// let a = book.push_back(100, 2);
/// book.push_back(50, 4);
/// assert_eq!(book.total1(), 6);
/// assert_eq!(book.total2(), 400);
///
/// book.set_elem2(a, 3).unwrap();
/// assert_eq!(book.total2(), 500);
///
/// book.erase(a);
/// assert_eq!((book.total1(), book.total2()), (4, 200));
/// ```
pub struct ReactiveCollection<E1, E2, T1, T2, K = ()>
where
    E1: Field,
    E2: Field,
    T1: Total,
    T2: Total,
    K: Key,
{
    inner: Arc<Inner<E1, E2, T1, T2, K>>,
}

impl<E1, E2, T1, T2, K> ReactiveCollection<E1, E2, T1, T2, K>
where
    E1: Field,
    E2: Field,
    T1: Total,
    T2: Total,
    K: Key,
{
    /// Creates an empty collection.
    ///
    /// `compare` is only used when the ordered index is enabled.
    pub fn new(
        config: CollectionConfig,
        total1: AggregateSpec<E1, E2, T1>,
        total2: AggregateSpec<E1, E2, T2>,
        compare: FieldComparator<E1, E2>,
    ) -> Self {
        let engine = AggregateEngine::new(total1, total2, config.combined_atomic);
        debug!(
            combined_atomic = config.combined_atomic,
            ordered = config.maintain_ordered_index,
            serialize_writers = config.serialize_writers,
            mode1 = ?engine.mode1(),
            mode2 = ?engine.mode2(),
            "created collection"
        );
        Self {
            inner: Arc::new(Inner {
                ids: IdGenerator::new(),
                store: ElementStore::new(),
                keys: KeyIndex::new(),
                ordered: config
                    .maintain_ordered_index
                    .then(|| OrderedIndex::new(compare)),
                engine,
                monitors: ChangeMonitor::new(),
                writer: config.serialize_writers.then(|| ReentrantMutex::new(())),
                config,
            }),
        }
    }

    /// Starts a builder.
    pub fn builder() -> CollectionBuilder<E1, E2, T1, T2, K> {
        CollectionBuilder::new()
    }

    #[inline]
    pub fn config(&self) -> CollectionConfig {
        self.inner.config
    }

    fn serialize(&self) -> Option<ReentrantMutexGuard<'_, ()>> {
        self.inner.writer.as_ref().map(|writer| writer.lock())
    }

    // ---------------------------------------------------------------------
    // Insertion
    // ---------------------------------------------------------------------

    /// Appends an element and returns its id.
    pub fn push_back(&self, e1: E1, e2: E2) -> ElemId {
        let _batch = BatchGuard::enter();
        let _writer = self.serialize();
        let id = self.inner.ids.next_id();
        self.insert_record(id, e1, e2, None);
        id
    }

    /// Appends an element carrying an external key.
    ///
    /// Fails with [`Error::DuplicateKey`] if a live element already has `key`;
    /// nothing is inserted in that case.
    pub fn push_back_keyed(&self, e1: E1, e2: E2, key: K) -> Result<ElemId> {
        let _batch = BatchGuard::enter();
        let _writer = self.serialize();
        let id = self.inner.ids.next_id();
        self.reserve_key(&key, id)?;
        self.insert_record(id, e1, e2, Some(key));
        Ok(id)
    }

    /// Appends every pair as one unit.
    ///
    /// Totals notify their subscribers once for the whole batch.
    pub fn push_batch<I>(&self, pairs: I) -> Vec<ElemId>
    where
        I: IntoIterator<Item = (E1, E2)>,
    {
        let _batch = BatchGuard::enter();
        let _writer = self.serialize();
        let ids: Vec<ElemId> = pairs
            .into_iter()
            .map(|(e1, e2)| {
                let id = self.inner.ids.next_id();
                self.insert_record(id, e1, e2, None);
                id
            })
            .collect();
        debug!(count = ids.len(), "pushed batch");
        ids
    }

    /// Appends every keyed triple as one unit.
    ///
    /// Stops at the first duplicate key; elements before it stay inserted.
    pub fn push_batch_keyed<I>(&self, triples: I) -> Result<Vec<ElemId>>
    where
        I: IntoIterator<Item = (E1, E2, K)>,
    {
        let _batch = BatchGuard::enter();
        let _writer = self.serialize();
        let mut ids = Vec::new();
        for (e1, e2, key) in triples {
            let id = self.inner.ids.next_id();
            if let Err(err) = self.reserve_key(&key, id) {
                debug!(count = ids.len(), "keyed batch stopped at duplicate");
                return Err(err);
            }
            self.insert_record(id, e1, e2, Some(key));
            ids.push(id);
        }
        debug!(count = ids.len(), "pushed keyed batch");
        Ok(ids)
    }

    fn reserve_key(&self, key: &K, id: ElemId) -> Result<()> {
        self.inner.keys.reserve(key.clone(), id).map_err(|existing| {
            warn!(?key, %existing, "rejected duplicate key");
            Error::duplicate_key(key, existing)
        })
    }

    fn insert_record(&self, id: ElemId, e1: E1, e2: E2, key: Option<K>) {
        let record = ElementRecord::new(e1.clone(), e2.clone(), key);

        // The cells are unreachable until the record is stored, so no write
        // can slip in before the monitor is listening.
        let weak = Arc::downgrade(&self.inner);
        self.inner
            .monitors
            .attach(id, record.elem1(), record.elem2(), move |id| {
                if let Some(inner) = weak.upgrade() {
                    inner.on_field_change(id);
                }
            });

        self.inner
            .engine
            .apply(&Transition::inserted(e1.clone(), e2.clone()));

        match &self.inner.ordered {
            Some(index) => {
                let mut index = index.write();
                self.inner.store.insert(id, record);
                index.insert(id, (e1, e2));
            }
            None => self.inner.store.insert(id, record),
        }
        trace!(%id, "pushed element");
    }

    // ---------------------------------------------------------------------
    // Removal
    // ---------------------------------------------------------------------

    /// Removes an element. Erasing an absent id does nothing.
    ///
    /// Returns true if an element was removed.
    pub fn erase(&self, id: ElemId) -> bool {
        let _batch = BatchGuard::enter();
        let _writer = self.serialize();

        // Store and index change together under the index lock.
        let record = match &self.inner.ordered {
            Some(index) => {
                let mut index = index.write();
                let Some(record) = self.inner.store.remove(id) else {
                    return false;
                };
                index.remove(id);
                record
            }
            None => match self.inner.store.remove(id) {
                Some(record) => record,
                None => return false,
            },
        };

        self.inner.monitors.detach(id);

        let ((e1, e2), key) = record.into_parts();
        if let Some(key) = &key {
            self.inner.keys.release(key, id);
        }
        self.inner.engine.apply(&Transition::removed(e1, e2));
        trace!(%id, "erased element");
        true
    }

    /// Removes the element carrying `key`, if any.
    pub fn erase_by_key(&self, key: &K) -> bool {
        let _batch = BatchGuard::enter();
        let _writer = self.serialize();
        match self.find_by_key(key) {
            Some(id) => self.erase(id),
            None => false,
        }
    }

    // ---------------------------------------------------------------------
    // Element access
    // ---------------------------------------------------------------------

    /// Returns the id of the live element carrying `key`.
    ///
    /// A key is reserved before its element is stored, so a push still in
    /// flight on another thread already blocks the key but is not reported
    /// here until [`contains`](Self::contains) agrees.
    pub fn find_by_key(&self, key: &K) -> Option<ElemId> {
        self.inner
            .keys
            .get(key)
            .filter(|&id| self.inner.store.contains(id))
    }

    /// Scans every element for `key` without using the key index.
    pub fn find_by_key_linear(&self, key: &K) -> Option<ElemId> {
        self.inner.store.find_by_key_linear(key)
    }

    /// Returns handles to both cells of element `id`.
    ///
    /// The handles hold no lock; writing through them drives the totals and
    /// the index like any other write.
    pub fn find_by_id(&self, id: ElemId) -> Option<(ReactiveCell<E1>, ReactiveCell<E2>)> {
        self.inner.store.cells(id)
    }

    /// Returns the first field's cell of element `id`.
    pub fn elem1(&self, id: ElemId) -> Result<ReactiveCell<E1>> {
        self.inner
            .store
            .cells(id)
            .map(|(elem1, _)| elem1)
            .ok_or_else(|| Error::not_found(id))
    }

    /// Returns the second field's cell of element `id`.
    pub fn elem2(&self, id: ElemId) -> Result<ReactiveCell<E2>> {
        self.inner
            .store
            .cells(id)
            .map(|(_, elem2)| elem2)
            .ok_or_else(|| Error::not_found(id))
    }

    /// Writes the first field. Returns whether the value changed.
    pub fn set_elem1(&self, id: ElemId, value: E1) -> Result<bool> {
        Ok(self.elem1(id)?.set(value))
    }

    /// Writes the second field. Returns whether the value changed.
    pub fn set_elem2(&self, id: ElemId, value: E2) -> Result<bool> {
        Ok(self.elem2(id)?.set(value))
    }

    /// Writes both fields as one transition.
    pub fn set_fields(&self, id: ElemId, e1: E1, e2: E2) -> Result<()> {
        let (elem1, elem2) = self.inner.store.cells(id).ok_or_else(|| Error::not_found(id))?;
        batch(|| {
            elem1.set(e1);
            elem2.set(e2);
        });
        Ok(())
    }

    /// Returns the last observed values of element `id`.
    pub fn get(&self, id: ElemId) -> Option<ElementSnapshot<E1, E2, K>> {
        self.inner.store.get(id)
    }

    pub fn contains(&self, id: ElemId) -> bool {
        self.inner.store.contains(id)
    }

    /// Number of live elements.
    #[inline]
    pub fn size(&self) -> usize {
        self.inner.store.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.store.is_empty()
    }

    /// Snapshot of every element in no particular order.
    pub fn iter(&self) -> std::vec::IntoIter<ElementSnapshot<E1, E2, K>> {
        self.inner.store.snapshots().into_iter()
    }

    // ---------------------------------------------------------------------
    // Totals
    // ---------------------------------------------------------------------

    #[inline]
    pub fn total1(&self) -> T1 {
        self.inner.engine.total1()
    }

    #[inline]
    pub fn total2(&self) -> T2 {
        self.inner.engine.total2()
    }

    /// Handle to the first total's cell, for subscribing.
    pub fn total1_cell(&self) -> ReactiveCell<T1> {
        self.inner.engine.total1_cell().clone()
    }

    /// Handle to the second total's cell, for subscribing.
    pub fn total2_cell(&self) -> ReactiveCell<T2> {
        self.inner.engine.total2_cell().clone()
    }

    pub fn modes(&self) -> (AggMode, AggMode) {
        (self.inner.engine.mode1(), self.inner.engine.mode2())
    }

    // ---------------------------------------------------------------------
    // Ordered access
    // ---------------------------------------------------------------------

    /// Returns true if the ordered index is maintained.
    #[inline]
    pub fn is_ordered(&self) -> bool {
        self.inner.ordered.is_some()
    }

    /// Ids from lowest to highest. Empty when ordering is disabled.
    pub fn ordered_ids(&self) -> Vec<ElemId> {
        self.inner
            .ordered
            .as_ref()
            .map(OrderedIndex::to_vec)
            .unwrap_or_default()
    }

    /// Elements from lowest to highest. Empty when ordering is disabled.
    pub fn ordered(&self) -> Vec<ElementSnapshot<E1, E2, K>> {
        let Some(index) = &self.inner.ordered else {
            return Vec::new();
        };
        let index = index.read();
        index
            .iter()
            .filter_map(|id| self.inner.store.get(id))
            .collect()
    }

    /// Elements from highest to lowest. Empty when ordering is disabled.
    pub fn ordered_rev(&self) -> Vec<ElementSnapshot<E1, E2, K>> {
        let Some(index) = &self.inner.ordered else {
            return Vec::new();
        };
        let index = index.read();
        index
            .iter()
            .rev()
            .filter_map(|id| self.inner.store.get(id))
            .collect()
    }

    /// Up to `k` ids from the high end, highest first.
    pub fn top_k(&self, k: usize) -> Vec<ElemId> {
        self.inner
            .ordered
            .as_ref()
            .map(|index| index.top_k(k))
            .unwrap_or_default()
    }

    /// Up to `k` ids from the low end, lowest first.
    pub fn bottom_k(&self, k: usize) -> Vec<ElemId> {
        self.inner
            .ordered
            .as_ref()
            .map(|index| index.bottom_k(k))
            .unwrap_or_default()
    }

    /// Replaces the comparator and re-sorts the index.
    ///
    /// Returns false, ignoring `compare`, when ordering is disabled.
    pub fn set_compare(&self, compare: FieldComparator<E1, E2>) -> bool {
        let Some(index) = &self.inner.ordered else {
            debug!("ordering disabled, comparator ignored");
            return false;
        };
        let _writer = self.serialize();
        index.write().set_compare(compare, &self.inner.store);
        debug!(len = index.len(), "replaced comparator");
        true
    }

    /// Re-sorts the index against current snapshots.
    pub fn rebuild_ordered_index(&self) -> bool {
        let Some(index) = &self.inner.ordered else {
            return false;
        };
        let _writer = self.serialize();
        index.write().rebuild(&self.inner.store);
        debug!(len = index.len(), "rebuilt ordered index");
        true
    }
}

impl<E1, E2, T1, T2, K> ReactiveCollection<E1, E2, T1, T2, K>
where
    E1: Field + PartialOrd,
    E2: Field + PartialOrd,
    T1: Total + From<E2> + Sub<Output = T1> + AddAssign,
    T2: Total + From<E1> + From<E2> + Mul<Output = T2> + Sub<Output = T2> + AddAssign,
    K: Key,
{
    /// Creates a collection with the default totals: the running sum of
    /// `elem2` and the running sum of `elem1 * elem2`, ordered
    /// lexicographically when ordering is enabled.
    pub fn with_default_totals(config: CollectionConfig) -> Self {
        Self::new(
            config,
            AggregateSpec::quantity_sum(),
            AggregateSpec::notional_sum(),
            FieldComparator::lexicographic(),
        )
    }
}

impl<E1, E2, T1, T2, K> Drop for ReactiveCollection<E1, E2, T1, T2, K>
where
    E1: Field,
    E2: Field,
    T1: Total,
    T2: Total,
    K: Key,
{
    fn drop(&mut self) {
        // Monitors first, so no callback observes a half torn down collection.
        self.inner.monitors.detach_all();
        if let Some(index) = &self.inner.ordered {
            index.write().clear();
        }
        self.inner.keys.clear();
        self.inner.store.clear();
    }
}
