//! Twofold Incremental - running totals over a changing element set.
//!
//! Each element of a collection carries two fields. Two totals are maintained
//! over all live elements and updated from per-element transitions rather than
//! recomputed:
//!
//! - `Delta<T>`: a +1/-1 change to a multiset of extracted values
//! - `AggregateSpec`: how one total is computed (`Add`, `Min` or `Max`)
//! - `ExtremeTracker`: counted multiset answering min/max after deletions
//! - `AggregateEngine`: owns both totals and publishes them as reactive cells
//!
//! # Example
//!
//! ```
//! use twofold_incremental::{AggregateEngine, AggregateSpec, Transition};
//!
//! let engine: AggregateEngine<i64, i64, i64, i64> = AggregateEngine::new(
//!     AggregateSpec::quantity_sum(),
//!     AggregateSpec::notional_sum(),
//!     false,
//! );
//!
//! engine.apply(&Transition::inserted(2, 10));
//! engine.apply(&Transition::changed((2, 10), (3, 10)));
//!
//! assert_eq!(engine.total1(), 10);
//! assert_eq!(engine.total2(), 30);
//! ```

pub mod delta;
pub mod engine;
pub mod extremes;
pub mod strategy;

pub use delta::{transition_deltas, Delta, DeltaBatch};
pub use engine::{AggregateEngine, Field, Lane, Total, Transition};
pub use extremes::{Extreme, ExtremeTracker};
pub use strategy::{AggMode, AggregateSpec, ApplyFn, DeltaFn, ExtractFn};
