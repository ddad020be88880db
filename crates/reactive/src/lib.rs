//! Twofold Reactive - Synchronous, thread-safe reactive cells.
//!
//! This crate implements the push-based notification primitive the collection
//! is built on. Writes notify subscribers inline on the writing thread; there
//! is no scheduler and no background executor.
//!
//! # Core Concepts
//!
//! - `ReactiveCell<T>`: A shared value that notifies `(old, new)` on change
//! - `Subscription`: Handle that detaches its callback when closed or dropped
//! - `SubscriptionManager`: Listener table behind every cell
//! - `batch` / `BatchGuard`: Defer and coalesce notifications on a thread
//!
//! # Example
//!
//! ```rust
//! use twofold_reactive::{batch, ReactiveCell};
//! use std::sync::atomic::{AtomicI64, Ordering};
//! use std::sync::Arc;
//!
//! let qty = ReactiveCell::new(5i64);
//! let last = Arc::new(AtomicI64::new(0));
//! let last_clone = last.clone();
//!
//! let sub = qty.subscribe(move |_old, new| last_clone.store(*new, Ordering::SeqCst));
//!
//! qty.set(7);
//! assert_eq!(last.load(Ordering::SeqCst), 7);
//!
//! batch(|| {
//!     qty.set(8);
//!     qty.set(9);
//!     assert_eq!(last.load(Ordering::SeqCst), 7);
//! });
//! assert_eq!(last.load(Ordering::SeqCst), 9);
//!
//! drop(sub);
//! qty.set(10);
//! assert_eq!(last.load(Ordering::SeqCst), 9);
//! ```

pub mod batch;
pub mod cell;
pub mod subscription;

pub use batch::{batch, is_batching, BatchGuard};
pub use cell::ReactiveCell;
pub use subscription::{ChangeCallback, Listener, Subscription, SubscriptionId, SubscriptionManager};
