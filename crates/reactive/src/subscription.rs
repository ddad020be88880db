//! Subscription management for reactive cells.
//!
//! This module provides subscription IDs, the per-cell listener table and the
//! `Subscription` handle returned to callers.

use std::sync::Arc;
use core::sync::atomic::{AtomicU64, Ordering};
use hashbrown::HashMap;
use parking_lot::RwLock;

/// Unique identifier for a subscription.
pub type SubscriptionId = u64;

/// Callback type for change notifications, invoked with `(old, new)`.
pub type ChangeCallback<T> = Box<dyn Fn(&T, &T) + Send + Sync>;

/// A registered change callback.
///
/// The `active` gate is held shared for the whole duration of a callback and
/// exclusively by `deactivate`, so deactivation waits out an in-flight call
/// and the callback can never fire afterwards.
pub struct Listener<T> {
    id: SubscriptionId,
    callback: ChangeCallback<T>,
    active: RwLock<bool>,
}

impl<T> Listener<T> {
    /// Creates a new, active listener.
    pub fn new<F>(id: SubscriptionId, callback: F) -> Self
    where
        F: Fn(&T, &T) + Send + Sync + 'static,
    {
        Self {
            id,
            callback: Box::new(callback),
            active: RwLock::new(true),
        }
    }

    /// Returns the subscription ID.
    #[inline]
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Returns whether this listener is active.
    #[inline]
    pub fn is_active(&self) -> bool {
        *self.active.read_recursive()
    }

    /// Deactivates this listener, blocking until any in-flight call returns.
    ///
    /// Must not be called from inside this listener's own callback.
    pub fn deactivate(&self) {
        *self.active.write() = false;
    }

    /// Notifies this listener of a change.
    pub fn notify(&self, old: &T, new: &T) {
        let active = self.active.read_recursive();
        if *active {
            (self.callback)(old, new);
        }
    }
}

/// Manages the listeners attached to one cell.
pub struct SubscriptionManager<T> {
    /// Active listeners
    listeners: RwLock<HashMap<SubscriptionId, Arc<Listener<T>>>>,
    /// Next subscription ID to assign
    next_id: AtomicU64,
}

impl<T> Default for SubscriptionManager<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> SubscriptionManager<T> {
    /// Creates a new subscription manager.
    pub fn new() -> Self {
        Self {
            listeners: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Subscribes to changes with the given callback.
    ///
    /// Returns the subscription ID that can be used to unsubscribe.
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&T, &T) + Send + Sync + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let listener = Arc::new(Listener::new(id, callback));
        self.listeners.write().insert(id, listener);
        id
    }

    /// Unsubscribes by ID.
    ///
    /// Returns true if the subscription was found and removed. Once this
    /// returns the callback will not run again.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let removed = self.listeners.write().remove(&id);
        match removed {
            Some(listener) => {
                listener.deactivate();
                true
            }
            None => false,
        }
    }

    /// Notifies all active listeners of a change.
    ///
    /// The listener table lock is not held while callbacks run.
    pub fn notify_all(&self, old: &T, new: &T) {
        let listeners: Vec<Arc<Listener<T>>> = self.listeners.read().values().cloned().collect();
        for listener in listeners {
            listener.notify(old, new);
        }
    }

    /// Returns the number of active subscriptions.
    #[inline]
    pub fn len(&self) -> usize {
        self.listeners.read().len()
    }

    /// Returns true if there are no subscriptions.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.listeners.read().is_empty()
    }

    /// Returns all subscription IDs.
    pub fn subscription_ids(&self) -> Vec<SubscriptionId> {
        self.listeners.read().keys().copied().collect()
    }

    /// Deactivates and removes every subscription.
    pub fn clear(&self) {
        let drained: Vec<Arc<Listener<T>>> =
            self.listeners.write().drain().map(|(_, l)| l).collect();
        for listener in drained {
            listener.deactivate();
        }
    }
}

/// Handle to a live subscription.
///
/// Dropping the handle detaches the callback. Use [`Subscription::detach`] to
/// keep the callback attached for the lifetime of the cell instead.
#[must_use = "dropping a Subscription detaches its callback"]
pub struct Subscription {
    id: SubscriptionId,
    detach: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    pub(crate) fn new<F>(id: SubscriptionId, detach: F) -> Self
    where
        F: FnOnce() + Send + Sync + 'static,
    {
        Self {
            id,
            detach: Some(Box::new(detach)),
        }
    }

    /// Returns the subscription ID.
    #[inline]
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Returns whether the callback is still attached through this handle.
    #[inline]
    pub fn is_active(&self) -> bool {
        self.detach.is_some()
    }

    /// Detaches the callback. Idempotent.
    pub fn close(&mut self) {
        if let Some(detach) = self.detach.take() {
            detach();
        }
    }

    /// Gives up the handle without detaching the callback.
    pub fn detach(mut self) -> SubscriptionId {
        self.detach = None;
        self.id
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.close();
    }
}

impl core::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("active", &self.is_active())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::sync::atomic::AtomicUsize;

    #[test]
    fn test_listener_new() {
        let listener: Listener<i32> = Listener::new(1, |_, _| {});
        assert_eq!(listener.id(), 1);
        assert!(listener.is_active());
    }

    #[test]
    fn test_listener_deactivate() {
        let listener: Listener<i32> = Listener::new(1, |_, _| {});
        listener.deactivate();
        assert!(!listener.is_active());
    }

    #[test]
    fn test_listener_notify() {
        let seen = Arc::new(RwLock::new(None));
        let seen_clone = seen.clone();

        let listener = Listener::new(1, move |old: &i32, new: &i32| {
            *seen_clone.write() = Some((*old, *new));
        });
        listener.notify(&1, &2);

        assert_eq!(*seen.read(), Some((1, 2)));
    }

    #[test]
    fn test_listener_notify_inactive() {
        let called = Arc::new(AtomicUsize::new(0));
        let called_clone = called.clone();

        let listener = Listener::new(1, move |_: &i32, _: &i32| {
            called_clone.fetch_add(1, Ordering::SeqCst);
        });
        listener.deactivate();
        listener.notify(&1, &2);

        assert_eq!(called.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_subscription_manager_subscribe() {
        let manager: SubscriptionManager<i32> = SubscriptionManager::new();

        let id1 = manager.subscribe(|_, _| {});
        let id2 = manager.subscribe(|_, _| {});

        assert_eq!(id1, 1);
        assert_eq!(id2, 2);
        assert_eq!(manager.len(), 2);
    }

    #[test]
    fn test_subscription_manager_unsubscribe() {
        let manager: SubscriptionManager<i32> = SubscriptionManager::new();

        let id = manager.subscribe(|_, _| {});
        assert_eq!(manager.len(), 1);

        assert!(manager.unsubscribe(id));
        assert_eq!(manager.len(), 0);

        assert!(!manager.unsubscribe(id)); // Already removed
    }

    #[test]
    fn test_subscription_manager_notify_all() {
        let manager: SubscriptionManager<i32> = SubscriptionManager::new();

        let count = Arc::new(AtomicUsize::new(0));
        let count1 = count.clone();
        let count2 = count.clone();

        manager.subscribe(move |_, _| {
            count1.fetch_add(1, Ordering::SeqCst);
        });
        manager.subscribe(move |_, _| {
            count2.fetch_add(1, Ordering::SeqCst);
        });

        manager.notify_all(&0, &1);

        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_subscription_manager_clear() {
        let manager: SubscriptionManager<i32> = SubscriptionManager::new();

        manager.subscribe(|_, _| {});
        manager.subscribe(|_, _| {});

        assert_eq!(manager.len(), 2);
        manager.clear();
        assert!(manager.is_empty());
    }

    #[test]
    fn test_subscription_handle_close_is_idempotent() {
        let closed = Arc::new(AtomicUsize::new(0));
        let closed_clone = closed.clone();

        let mut sub = Subscription::new(9, move || {
            closed_clone.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(sub.id(), 9);
        assert!(sub.is_active());

        sub.close();
        sub.close();
        drop(sub);

        assert_eq!(closed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_subscription_handle_detach_skips_close() {
        let closed = Arc::new(AtomicUsize::new(0));
        let closed_clone = closed.clone();

        let sub = Subscription::new(3, move || {
            closed_clone.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(sub.detach(), 3);

        assert_eq!(closed.load(Ordering::SeqCst), 0);
    }
}
