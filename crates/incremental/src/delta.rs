//! Multiplicity deltas.
//!
//! A Delta records a change to the multiset of extracted values a min/max
//! total is derived from: `+1` when a value enters the multiset, `-1` when it
//! leaves. An element moving from one extracted value to another produces a
//! pair of deltas.

/// A differential change to one value of a multiset.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Delta<T> {
    /// The value being counted
    pub value: T,
    /// The differential: +1 for insert, -1 for delete
    pub diff: i32,
}

impl<T> Delta<T> {
    /// Creates a new delta with the given value and diff.
    #[inline]
    pub fn new(value: T, diff: i32) -> Self {
        Self { value, diff }
    }

    /// Creates an insertion delta (+1).
    #[inline]
    pub fn insert(value: T) -> Self {
        Self { value, diff: 1 }
    }

    /// Creates a deletion delta (-1).
    #[inline]
    pub fn delete(value: T) -> Self {
        Self { value, diff: -1 }
    }

    /// Returns true if this delta has no effect (diff == 0).
    #[inline]
    pub fn is_noop(&self) -> bool {
        self.diff == 0
    }
}

/// A batch of deltas.
pub type DeltaBatch<T> = Vec<Delta<T>>;

/// Builds the deltas for one element moving from `old` to `new`.
///
/// `None` stands for "not in the collection": a push has no `old`, an erase
/// has no `new`. A transition between equal values is a no-op and yields an
/// empty batch.
pub fn transition_deltas<T: PartialEq>(old: Option<T>, new: Option<T>) -> DeltaBatch<T> {
    match (old, new) {
        (Some(o), Some(n)) if o == n => Vec::new(),
        (old, new) => old
            .map(Delta::delete)
            .into_iter()
            .chain(new.map(Delta::insert))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delta_insert() {
        let d = Delta::insert(42);
        assert!(!d.is_noop());
        assert_eq!(d.diff, 1);
        assert_eq!(d.value, 42);
    }

    #[test]
    fn test_delta_delete() {
        let d = Delta::delete(42);
        assert_eq!(d.diff, -1);
        assert!(Delta::new(1, 0).is_noop());
    }

    #[test]
    fn test_transition_push() {
        assert_eq!(transition_deltas(None, Some(5)), vec![Delta::insert(5)]);
    }

    #[test]
    fn test_transition_erase() {
        assert_eq!(transition_deltas(Some(5), None), vec![Delta::delete(5)]);
    }

    #[test]
    fn test_transition_change() {
        assert_eq!(
            transition_deltas(Some(5), Some(9)),
            vec![Delta::delete(5), Delta::insert(9)]
        );
    }

    #[test]
    fn test_transition_unchanged_is_empty() {
        assert!(transition_deltas(Some(5), Some(5)).is_empty());
        assert!(transition_deltas::<i32>(None, None).is_empty());
    }
}
