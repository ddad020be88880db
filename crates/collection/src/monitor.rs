//! Per-element change monitoring.
//!
//! Every live element has one subscription on each of its two cells. When
//! either fires, the monitor folds the cells into the record's snapshot, moves
//! the id in the ordered index if the comparator cares, and feeds the
//! transition to the aggregate engine. The index write lock is only taken for
//! changes the comparator does not consider equivalent. No record lock is
//! held while the index lock is acquired, and no index lock while the totals
//! are updated.

use crate::collection::Inner;
use crate::keys::Key;
use dashmap::DashMap;
use tracing::trace;
use twofold_core::ElemId;
use twofold_incremental::{Field, Total, Transition};
use twofold_reactive::{ReactiveCell, Subscription};

/// Subscriptions of all monitored elements.
///
/// Subscriptions are removed from the map before they are closed, so closing
/// (which waits for an in-flight callback) never happens under a shard lock.
#[derive(Default)]
pub struct ChangeMonitor {
    subs: DashMap<ElemId, [Subscription; 2]>,
}

impl ChangeMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribes `react` to both cells of element `id`.
    pub fn attach<E1, E2, F>(&self, id: ElemId, elem1: &ReactiveCell<E1>, elem2: &ReactiveCell<E2>, react: F)
    where
        E1: Clone + PartialEq + Send + Sync + 'static,
        E2: Clone + PartialEq + Send + Sync + 'static,
        F: Fn(ElemId) + Clone + Send + Sync + 'static,
    {
        let react1 = react.clone();
        let sub1 = elem1.subscribe(move |_, _| react1(id));
        let sub2 = elem2.subscribe(move |_, _| react(id));
        self.subs.insert(id, [sub1, sub2]);
    }

    /// Closes the subscriptions of element `id`.
    ///
    /// Waits for a callback of this element running on another thread to
    /// finish. Returns false if the element was not monitored.
    pub fn detach(&self, id: ElemId) -> bool {
        let Some((_, subs)) = self.subs.remove(&id) else {
            return false;
        };
        for mut sub in subs {
            sub.close();
        }
        true
    }

    /// Closes every subscription.
    pub fn detach_all(&self) {
        let ids: Vec<ElemId> = self.subs.iter().map(|entry| *entry.key()).collect();
        for id in ids {
            self.detach(id);
        }
    }

    pub fn is_attached(&self, id: ElemId) -> bool {
        self.subs.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.subs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subs.is_empty()
    }
}

impl<E1, E2, T1, T2, K> Inner<E1, E2, T1, T2, K>
where
    E1: Field,
    E2: Field,
    T1: Total,
    T2: Total,
    K: Key,
{
    /// Reacts to a write on either cell of element `id`.
    pub(crate) fn on_field_change(&self, id: ElemId) {
        let Some((old, new)) = self.store.refresh(id) else {
            return;
        };

        // The index orders by the fields it placed ids at, so the snapshot may
        // move ahead of it. A racing change to the same element that does
        // reorder repositions from the snapshot it reads afterwards.
        if let Some(index) = &self.ordered {
            if index.reorders(&old, &new)
                && index.write().reposition(id, &old, &new, &self.store)
            {
                trace!(%id, "repositioned element");
            }
        }

        self.engine.apply(&Transition::changed(old, new));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_attach_fires_for_either_cell() {
        let monitor = ChangeMonitor::new();
        let e1 = ReactiveCell::new(1i64);
        let e2 = ReactiveCell::new(10i64);
        let hits = Arc::new(AtomicUsize::new(0));

        let hits_clone = hits.clone();
        monitor.attach(ElemId::new(1), &e1, &e2, move |id| {
            assert_eq!(id, ElemId::new(1));
            hits_clone.fetch_add(1, Ordering::SeqCst);
        });

        e1.set(2);
        e2.set(20);
        assert_eq!(hits.load(Ordering::SeqCst), 2);
        assert!(monitor.is_attached(ElemId::new(1)));
    }

    #[test]
    fn test_detach_stops_callbacks() {
        let monitor = ChangeMonitor::new();
        let e1 = ReactiveCell::new(0i64);
        let e2 = ReactiveCell::new(0i64);
        let hits = Arc::new(AtomicUsize::new(0));

        let hits_clone = hits.clone();
        monitor.attach(ElemId::new(7), &e1, &e2, move |_| {
            hits_clone.fetch_add(1, Ordering::SeqCst);
        });

        assert!(monitor.detach(ElemId::new(7)));
        assert!(!monitor.detach(ElemId::new(7)));
        e1.set(1);
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert_eq!(e1.subscriber_count(), 0);
        assert_eq!(e2.subscriber_count(), 0);
    }

    #[test]
    fn test_detach_all() {
        let monitor = ChangeMonitor::new();
        let cells: Vec<_> = (0..4).map(|n| (ReactiveCell::new(n), ReactiveCell::new(n))).collect();
        for (n, (a, b)) in cells.iter().enumerate() {
            monitor.attach(ElemId::new(n as u64 + 1), a, b, |_| {});
        }
        assert_eq!(monitor.len(), 4);

        monitor.detach_all();
        assert!(monitor.is_empty());
        assert!(cells.iter().all(|(a, _)| a.subscriber_count() == 0));
    }
}
