//! Twofold Collection - a concurrent collection of two-field reactive elements.
//!
//! Each element holds two fields, each in its own [`ReactiveCell`]. The
//! collection keeps two running totals over all live elements and, optionally,
//! an ordered index of element ids. Writing any element's cell, from any
//! thread, updates the totals and the index synchronously on that thread.
//!
//! # Components
//!
//! - `ElementStore`: concurrent id to record map with a lock-free live count
//! - `KeyIndex`: optional external key to id map
//! - `ChangeMonitor`: one subscription pair per element driving updates
//! - `ReactiveCollection`: the public facade tying them to an
//!   `AggregateEngine` and an `OrderedIndex`
//!
//! # Lock order
//!
//! The ordered-index lock may be held while record locks are taken (pushes,
//! erases and repositioning update the store under it), never the other way
//! round. Field changes the comparator considers equivalent never take the
//! index write lock. Both are released before any total is updated.
//!
//! # Example
//!
//! ```rust
//! use twofold_collection::{CollectionConfig, ReactiveCollection};
//!
//! let orders: ReactiveCollection<i64, i64, i64, i64, &'static str> =
//!     ReactiveCollection::with_default_totals(CollectionConfig::new().with_ordered_index(true));
//!
//! let a = orders.push_back_keyed(101, 5, "a").unwrap();
//! let b = orders.push_back_keyed(99, 2, "b").unwrap();
//!
//! assert_eq!(orders.total1(), 7);
//! assert_eq!(orders.bottom_k(1), vec![b]);
//!
//! orders.elem1(b).unwrap().set(200);
//! assert_eq!(orders.bottom_k(1), vec![a]);
//! assert_eq!(orders.total2(), 101 * 5 + 200 * 2);
//! ```

pub mod builder;
pub mod collection;
pub mod keys;
pub mod monitor;
pub mod store;

pub use builder::CollectionBuilder;
pub use collection::ReactiveCollection;
pub use keys::{Key, KeyIndex};
pub use monitor::ChangeMonitor;
pub use store::{ElementRecord, ElementSnapshot, ElementStore};

pub use twofold_core::{CollectionConfig, ElemId, Error, Result};
pub use twofold_incremental::{AggMode, AggregateSpec, ApplyFn, DeltaFn, ExtractFn, Field, Total};
pub use twofold_index::{FieldComparator, Order};
pub use twofold_reactive::{batch, ReactiveCell, Subscription};
