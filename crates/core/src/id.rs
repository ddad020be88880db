//! Element identifiers.
//!
//! Ids are assigned from a per-collection counter, start at 1 and are never
//! reused once the element they named has been erased.

use core::fmt;
use core::sync::atomic::{AtomicU64, Ordering};

/// Unique identifier for an element of a collection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ElemId(u64);

impl ElemId {
    /// Wraps a raw id value.
    #[inline]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw id value.
    #[inline]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ElemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<ElemId> for u64 {
    fn from(id: ElemId) -> Self {
        id.0
    }
}

/// Lock-free, monotonically increasing id source.
#[derive(Debug)]
pub struct IdGenerator {
    next: AtomicU64,
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl IdGenerator {
    /// Creates a generator whose first id is 1.
    pub const fn new() -> Self {
        Self {
            next: AtomicU64::new(1),
        }
    }

    /// Gets the next unique id.
    #[inline]
    pub fn next_id(&self) -> ElemId {
        ElemId(self.next.fetch_add(1, Ordering::Relaxed))
    }

    /// Reserves `count` consecutive ids and returns the first one.
    pub fn reserve(&self, count: u64) -> ElemId {
        ElemId(self.next.fetch_add(count, Ordering::Relaxed))
    }

    /// Returns the id the next call to `next_id` would hand out.
    pub fn peek(&self) -> ElemId {
        ElemId(self.next.load(Ordering::Relaxed))
    }
}
