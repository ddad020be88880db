//! Incremental MIN / MAX over a counted multiset.
//!
//! Extremes are not invertible by subtraction: removing the current minimum
//! says nothing about the next one. Instead of flagging the aggregate for a
//! full rescan, the tracker keeps a count per distinct value, so every
//! insertion and deletion is O(log n) and the extreme is always available.
//!
//! Counts are signed. Transitions of one element produced on different
//! threads can reach the tracker out of order, so a deletion may arrive before
//! the insertion it cancels. It is held as a negative count until then and
//! never contributes to the extreme.

use crate::delta::Delta;
use core::cmp::Ordering;
use std::collections::BTreeMap;

/// Total order over a `PartialOrd` value.
///
/// Incomparable pairs (e.g. NaN) are treated as equal; extractors are
/// expected to produce comparable values.
#[derive(Clone, Debug)]
struct Ranked<T>(T);

impl<T: PartialOrd> PartialEq for Ranked<T> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<T: PartialOrd> Eq for Ranked<T> {}

impl<T: PartialOrd> PartialOrd for Ranked<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T: PartialOrd> Ord for Ranked<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.partial_cmp(&other.0).unwrap_or(Ordering::Equal)
    }
}

/// Which end of the multiset a tracker reports.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Extreme {
    Min,
    Max,
}

/// Counted multiset of extracted values reporting its minimum or maximum.
#[derive(Clone, Debug)]
pub struct ExtremeTracker<T> {
    counts: BTreeMap<Ranked<T>, i64>,
    extreme: Extreme,
    len: i64,
}

impl<T: PartialOrd + Clone> ExtremeTracker<T> {
    /// Creates an empty tracker.
    pub fn new(extreme: Extreme) -> Self {
        Self {
            counts: BTreeMap::new(),
            extreme,
            len: 0,
        }
    }

    /// Creates a tracker reporting the minimum.
    pub fn min() -> Self {
        Self::new(Extreme::Min)
    }

    /// Creates a tracker reporting the maximum.
    pub fn max() -> Self {
        Self::new(Extreme::Max)
    }

    /// Applies a batch of deltas.
    pub fn apply(&mut self, deltas: &[Delta<T>]) {
        for d in deltas.iter().filter(|d| !d.is_noop()) {
            self.adjust(d.value.clone(), i64::from(d.diff));
        }
    }

    fn adjust(&mut self, value: T, diff: i64) {
        let key = Ranked(value);
        let count = self.counts.entry(key.clone()).or_insert(0);
        *count += diff;
        if *count == 0 {
            self.counts.remove(&key);
        }
        self.len += diff;
    }

    /// Returns the current extreme, or None if nothing is counted.
    pub fn get<'a>(&'a self) -> Option<&'a T> {
        fn positive<'a, T>((value, &count): (&'a Ranked<T>, &'a i64)) -> Option<&'a T> {
            (count > 0).then_some(&value.0)
        }
        match self.extreme {
            Extreme::Min => self.counts.iter().find_map(positive),
            Extreme::Max => self.counts.iter().rev().find_map(positive),
        }
    }

    /// Returns the number of values counted, duplicates included.
    #[inline]
    pub fn len(&self) -> usize {
        usize::try_from(self.len).unwrap_or(0)
    }

    /// Returns true if no value is counted.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len <= 0
    }

    /// Returns which extreme this tracker reports.
    #[inline]
    pub fn extreme(&self) -> Extreme {
        self.extreme
    }
}
