//! Twofold Index - ordered id index over element field pairs.
//!
//! - `FieldComparator`: runtime, replaceable "less than" over `(e1, e2)` pairs
//! - `OrderedIndex`: ids sorted by the comparator with id as tie-break,
//!   O(log n) placement, shared readers and exclusive writers
//!
//! # Example
//!
//! ```rust
//! use std::collections::HashMap;
//! use twofold_core::ElemId;
//! use twofold_index::{FieldComparator, OrderedIndex, SnapshotLookup};
//!
//! struct Fields(HashMap<ElemId, (i64, i64)>);
//!
//! impl SnapshotLookup<i64, i64> for Fields {
//!     fn snapshot(&self, id: ElemId) -> Option<(i64, i64)> {
//!         self.0.get(&id).copied()
//!     }
//! }
//!
//! let fields = Fields(HashMap::from([
//!     (ElemId::new(1), (1, 5)),
//!     (ElemId::new(2), (2, 3)),
//! ]));
//!
//! let index = OrderedIndex::new(FieldComparator::lexicographic());
//! {
//!     let mut w = index.write();
//!     w.insert(ElemId::new(2), (2, 3));
//!     w.insert(ElemId::new(1), (1, 5));
//! }
//! assert_eq!(index.bottom_k(1), vec![ElemId::new(1)]);
//!
//! // The element's fields changed elsewhere; move it to its new place.
//! let mut fields = fields;
//! fields.0.insert(ElemId::new(1), (9, 0));
//! index
//!     .write()
//!     .reposition(ElemId::new(1), &(1, 5), &(9, 0), &fields);
//! assert_eq!(index.top_k(1), vec![ElemId::new(1)]);
//! ```

pub mod comparator;
pub mod ordered;

pub use comparator::{FieldComparator, Order};
pub use ordered::{OrderedIndex, OrderedRead, OrderedWrite, SnapshotLookup};
