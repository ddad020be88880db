//! Thread-local batching of change notifications.
//!
//! While a batch is open on a thread, cells written on that thread defer their
//! notifications. Deferred notifications are coalesced per cell: a cell that is
//! written several times inside one batch notifies once, with the value it had
//! before this thread's first write as `old` and the value this thread last
//! wrote as `new`. The cell is never re-read at flush, so writes made by other
//! threads in the meantime are reported by those threads alone and the pairs
//! each thread delivers chain. Notifications flush when the outermost batch on
//! the thread closes.

use hashbrown::HashMap;
use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

type PendingNotify = Box<dyn FnOnce()>;

/// Transition accumulated for one cell while the batch is open.
type Slot<T> = Rc<RefCell<(T, T)>>;

#[derive(Default)]
struct BatchState {
    depth: usize,
    pending: Vec<PendingNotify>,
    slots: HashMap<usize, Box<dyn Any>>,
}

thread_local! {
    static BATCH: RefCell<BatchState> = RefCell::new(BatchState::default());
}

/// RAII guard for an open batch.
///
/// Declare the guard before any lock guard whose critical section writes
/// cells; locals drop in reverse order, so the lock is released before the
/// deferred notifications run.
#[must_use = "the batch closes when the guard is dropped"]
pub struct BatchGuard {
    _not_send: core::marker::PhantomData<*const ()>,
}

impl BatchGuard {
    /// Opens a batch on the current thread.
    pub fn enter() -> Self {
        BATCH.with(|b| b.borrow_mut().depth += 1);
        Self {
            _not_send: core::marker::PhantomData,
        }
    }
}

impl Drop for BatchGuard {
    fn drop(&mut self) {
        let depth = BATCH.with(|b| {
            let mut state = b.borrow_mut();
            state.depth -= 1;
            state.depth
        });
        if depth == 0 {
            if std::thread::panicking() {
                BATCH.with(|b| {
                    let mut state = b.borrow_mut();
                    state.pending.clear();
                    state.slots.clear();
                });
            } else {
                flush();
            }
        }
    }
}

/// Runs `f` inside a batch and flushes the coalesced notifications after it.
///
/// # Example
///
/// ```
/// use twofold_reactive::{batch, ReactiveCell};
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::sync::Arc;
///
/// let cell = ReactiveCell::new(0);
/// let calls = Arc::new(AtomicUsize::new(0));
/// let calls_clone = calls.clone();
/// let _sub = cell.subscribe(move |_, _| {
///     calls_clone.fetch_add(1, Ordering::SeqCst);
/// });
///
/// batch(|| {
///     cell.set(1);
///     cell.set(2);
///     cell.set(3);
/// });
///
/// assert_eq!(calls.load(Ordering::SeqCst), 1);
/// ```
pub fn batch<R>(f: impl FnOnce() -> R) -> R {
    let _guard = BatchGuard::enter();
    f()
}

/// Returns true if a batch is open on the current thread.
pub fn is_batching() -> bool {
    BATCH.with(|b| b.borrow().depth > 0)
}

/// Queues the transition `old -> new` for the cell identified by `key`.
///
/// If the cell already has a transition queued in this batch, only its `new`
/// side is replaced and `notify` is dropped. Otherwise `notify` runs at flush
/// with the accumulated pair. Must be called with a batch open.
pub(crate) fn defer_change<T: 'static>(
    key: usize,
    old: T,
    new: T,
    notify: impl FnOnce(T, T) + 'static,
) -> bool {
    BATCH.with(|b| {
        let mut state = b.borrow_mut();
        debug_assert!(state.depth > 0, "defer_change called outside a batch");
        if let Some(slot) = state
            .slots
            .get(&key)
            .and_then(|slot| slot.downcast_ref::<Slot<T>>())
        {
            slot.borrow_mut().1 = new;
            return false;
        }

        let slot: Slot<T> = Rc::new(RefCell::new((old, new)));
        state.slots.insert(key, Box::new(Rc::clone(&slot)));
        state.pending.push(Box::new(move || {
            // The slot table was cleared before this runs, so this is the last handle.
            if let Ok(cell) = Rc::try_unwrap(slot) {
                let (old, new) = cell.into_inner();
                notify(old, new);
            }
        }));
        true
    })
}

fn flush() {
    loop {
        let pending = BATCH.with(|b| {
            let mut state = b.borrow_mut();
            state.slots.clear();
            core::mem::take(&mut state.pending)
        });
        if pending.is_empty() {
            break;
        }
        for notify in pending {
            // Writes made by subscribers are deferred until this one returns.
            let _guard = BatchGuard::enter();
            notify();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_is_batching() {
        assert!(!is_batching());
        batch(|| {
            assert!(is_batching());
            batch(|| assert!(is_batching()));
            assert!(is_batching());
        });
        assert!(!is_batching());
    }

    fn recorder(seen: &Rc<RefCell<Vec<(i32, i32)>>>) -> impl FnOnce(i32, i32) + 'static {
        let seen = seen.clone();
        move |old, new| seen.borrow_mut().push((old, new))
    }

    #[test]
    fn test_defer_runs_on_outermost_exit() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        batch(|| {
            batch(|| {
                assert!(defer_change(1, 0, 1, recorder(&seen)));
            });
            assert!(seen.borrow().is_empty());
        });
        assert_eq!(*seen.borrow(), vec![(0, 1)]);
    }

    #[test]
    fn test_defer_keeps_first_old_and_last_new() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        batch(|| {
            assert!(defer_change(7, 0, 1, recorder(&seen)));
            assert!(!defer_change(7, 1, 2, recorder(&seen)));
            // A gap between pairs is another thread's write; it is not ours to report.
            assert!(!defer_change(7, 5, 6, recorder(&seen)));
            assert!(defer_change(8, 10, 20, recorder(&seen)));
        });
        assert_eq!(*seen.borrow(), vec![(0, 6), (10, 20)]);
    }

    #[test]
    fn test_notifications_queued_during_flush_also_run() {
        let ran = Rc::new(Cell::new(0));
        let outer = ran.clone();
        batch(|| {
            defer_change(1, 0, 1, move |_: i32, _: i32| {
                let inner = outer.clone();
                defer_change(1, 1, 2, move |_: i32, _: i32| inner.set(inner.get() + 1));
                outer.set(outer.get() + 1);
            });
        });
        assert_eq!(ran.get(), 2);
    }
}
