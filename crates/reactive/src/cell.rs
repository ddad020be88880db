//! Thread-safe reactive value cell.
//!
//! A `ReactiveCell` holds one value and synchronously notifies its subscribers
//! with `(old, new)` on the writing thread whenever the value changes.

use crate::batch::{self, BatchGuard};
use crate::subscription::{Subscription, SubscriptionManager};
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;

struct CellInner<T> {
    value: RwLock<T>,
    subscribers: SubscriptionManager<T>,
}

/// A shared, observable value.
///
/// Cloning the cell clones the handle: all clones observe and write the same
/// value. Writes that do not change the value (by `PartialEq`) publish nothing.
///
/// # Example
///
/// ```
/// use twofold_reactive::ReactiveCell;
/// use std::sync::Arc;
/// use parking_lot::Mutex;
///
/// let price = ReactiveCell::new(10);
/// let seen = Arc::new(Mutex::new(Vec::new()));
/// let seen_clone = seen.clone();
///
/// let _sub = price.subscribe(move |old, new| seen_clone.lock().push((*old, *new)));
///
/// price.set(12);
/// price.set(12); // unchanged, no notification
/// price.update(|v| { *v += 1; true });
///
/// assert_eq!(price.get(), 13);
/// assert_eq!(*seen.lock(), vec![(10, 12), (12, 13)]);
/// ```
pub struct ReactiveCell<T> {
    inner: Arc<CellInner<T>>,
}

impl<T> Clone for ReactiveCell<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Default + Clone + PartialEq + Send + Sync + 'static> Default for ReactiveCell<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T> ReactiveCell<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    /// Creates a new cell holding `value`.
    pub fn new(value: T) -> Self {
        Self {
            inner: Arc::new(CellInner {
                value: RwLock::new(value),
                subscribers: SubscriptionManager::new(),
            }),
        }
    }

    /// Returns a clone of the current value.
    #[inline]
    pub fn get(&self) -> T {
        self.inner.value.read().clone()
    }

    /// Runs `f` against the current value without cloning it.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.value.read())
    }

    /// Stores `value` and notifies subscribers if it differs from the current value.
    ///
    /// Returns true if the value changed. Subscribers run on this thread before
    /// `set` returns, unless a batch is open, in which case they run when the
    /// outermost batch closes.
    pub fn set(&self, value: T) -> bool {
        let (old, new) = {
            let mut current = self.inner.value.write();
            if *current == value {
                return false;
            }
            let new = value.clone();
            (core::mem::replace(&mut *current, value), new)
        };
        self.publish(old, new);
        true
    }

    /// Atomically modifies the value in place.
    ///
    /// `f` reports whether it changed the value; the write is published only if
    /// it says so and the result differs from the previous value.
    pub fn update(&self, f: impl FnOnce(&mut T) -> bool) -> bool {
        let (old, new) = {
            let mut current = self.inner.value.write();
            let before = current.clone();
            if !f(&mut current) || *current == before {
                *current = before;
                return false;
            }
            (before, current.clone())
        };
        self.publish(old, new);
        true
    }

    /// Registers a callback invoked with `(old, new)` on every change.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&T, &T) + Send + Sync + 'static,
    {
        let id = self.inner.subscribers.subscribe(callback);
        let weak = Arc::downgrade(&self.inner);
        Subscription::new(id, move || {
            if let Some(inner) = weak.upgrade() {
                inner.subscribers.unsubscribe(id);
            }
        })
    }

    /// Returns the number of attached subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.len()
    }

    /// Returns true if both handles refer to the same cell.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Queues `old -> new` as written by this thread. Both values are captured
    /// under the write lock; the cell is not read again when subscribers run.
    fn publish(&self, old: T, new: T) {
        let _batch = BatchGuard::enter();
        let inner = Arc::clone(&self.inner);
        let key = Arc::as_ptr(&self.inner) as *const () as usize;
        batch::defer_change(key, old, new, move |old: T, new: T| {
            if old != new {
                inner.subscribers.notify_all(&old, &new);
            }
        });
    }
}

impl<T: fmt::Debug> fmt::Debug for ReactiveCell<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ReactiveCell")
            .field(&*self.inner.value.read())
            .finish()
    }
}
