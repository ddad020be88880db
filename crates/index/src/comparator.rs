//! Comparators ordering elements by their two fields.
//!
//! A `FieldComparator` wraps a user-supplied strict "less than" predicate over
//! `(a1, a2)` and `(b1, b2)`. Callers replace it at runtime, so it is stored
//! behind an `Arc` and cloned cheaply into the index.

use core::cmp::Ordering;
use core::fmt;
use std::sync::Arc;

/// Sort order of one field.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Order {
    /// Smallest first
    #[default]
    Asc,
    /// Largest first
    Desc,
}

impl Order {
    /// Applies this order to a comparison result.
    #[inline]
    pub fn apply(&self, ord: Ordering) -> Ordering {
        match self {
            Order::Asc => ord,
            Order::Desc => ord.reverse(),
        }
    }
}

type LessFn<E1, E2> = dyn Fn(&E1, &E2, &E1, &E2) -> bool + Send + Sync;

/// Runtime comparator over element field pairs.
///
/// The predicate must be a strict weak ordering: `less(a, a)` is false and
/// incomparability is transitive. Ties are broken by id in the index.
pub struct FieldComparator<E1, E2> {
    less: Arc<LessFn<E1, E2>>,
}

impl<E1, E2> Clone for FieldComparator<E1, E2> {
    fn clone(&self) -> Self {
        Self {
            less: Arc::clone(&self.less),
        }
    }
}

impl<E1, E2> FieldComparator<E1, E2> {
    /// Creates a comparator from a "less than" predicate `(a1, a2, b1, b2)`.
    pub fn new<F>(less: F) -> Self
    where
        F: Fn(&E1, &E2, &E1, &E2) -> bool + Send + Sync + 'static,
    {
        Self {
            less: Arc::new(less),
        }
    }

    /// Returns true if `(a1, a2)` orders strictly before `(b1, b2)`.
    #[inline]
    pub fn precedes(&self, a1: &E1, a2: &E2, b1: &E1, b2: &E2) -> bool {
        (self.less)(a1, a2, b1, b2)
    }

    /// Returns true if neither pair orders before the other.
    pub fn equivalent(&self, a1: &E1, a2: &E2, b1: &E1, b2: &E2) -> bool {
        !self.precedes(a1, a2, b1, b2) && !self.precedes(b1, b2, a1, a2)
    }

    /// Three-way comparison derived from the predicate.
    pub fn ordering(&self, a1: &E1, a2: &E2, b1: &E1, b2: &E2) -> Ordering {
        if self.precedes(a1, a2, b1, b2) {
            Ordering::Less
        } else if self.precedes(b1, b2, a1, a2) {
            Ordering::Greater
        } else {
            Ordering::Equal
        }
    }
}

impl<E1, E2> FieldComparator<E1, E2>
where
    E1: PartialOrd + 'static,
    E2: PartialOrd + 'static,
{
    /// Orders by the first field, then the second, each with its own order.
    pub fn by(first: Order, second: Order) -> Self {
        Self::new(move |a1: &E1, a2: &E2, b1: &E1, b2: &E2| {
            let ord = first
                .apply(partial(a1, b1))
                .then_with(|| second.apply(partial(a2, b2)));
            ord == Ordering::Less
        })
    }

    /// Ascending on `(elem1, elem2)`.
    pub fn lexicographic() -> Self {
        Self::by(Order::Asc, Order::Asc)
    }

    /// Orders by the second field only.
    pub fn by_second(order: Order) -> Self {
        Self::new(move |_: &E1, a2: &E2, _: &E1, b2: &E2| {
            order.apply(partial(a2, b2)) == Ordering::Less
        })
    }
}

impl<E1, E2> Default for FieldComparator<E1, E2>
where
    E1: PartialOrd + 'static,
    E2: PartialOrd + 'static,
{
    fn default() -> Self {
        Self::lexicographic()
    }
}

impl<E1, E2> fmt::Debug for FieldComparator<E1, E2> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FieldComparator(..)")
    }
}

#[inline]
fn partial<T: PartialOrd>(a: &T, b: &T) -> Ordering {
    a.partial_cmp(b).unwrap_or(Ordering::Equal)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_apply() {
        assert_eq!(Order::Asc.apply(Ordering::Less), Ordering::Less);
        assert_eq!(Order::Asc.apply(Ordering::Greater), Ordering::Greater);
        assert_eq!(Order::Desc.apply(Ordering::Less), Ordering::Greater);
        assert_eq!(Order::Desc.apply(Ordering::Greater), Ordering::Less);
        assert_eq!(Order::default(), Order::Asc);
    }

    #[test]
    fn test_lexicographic() {
        let cmp: FieldComparator<i64, i64> = FieldComparator::lexicographic();
        assert!(cmp.precedes(&1, &9, &2, &0));
        assert!(cmp.precedes(&1, &3, &1, &4));
        assert!(!cmp.precedes(&1, &4, &1, &4));
        assert!(cmp.equivalent(&1, &4, &1, &4));
        assert_eq!(cmp.ordering(&2, &0, &1, &9), Ordering::Greater);
    }

    #[test]
    fn test_mixed_orders() {
        let cmp: FieldComparator<i64, i64> = FieldComparator::by(Order::Asc, Order::Desc);

        // First field decides
        assert!(cmp.precedes(&1, &0, &2, &10));
        // Same first field, second descending
        assert!(cmp.precedes(&1, &10, &1, &5));
        assert!(!cmp.precedes(&1, &5, &1, &10));
    }

    #[test]
    fn test_by_second_ignores_first() {
        let cmp: FieldComparator<i64, i64> = FieldComparator::by_second(Order::Asc);
        assert!(cmp.precedes(&100, &1, &0, &2));
        assert!(cmp.equivalent(&1, &5, &9, &5));
    }

    #[test]
    fn test_custom_predicate() {
        // Larger product first
        let cmp = FieldComparator::<i64, i64>::new(|a1, a2, b1, b2| a1 * a2 > b1 * b2);
        assert!(cmp.precedes(&3, &3, &2, &4));
        assert!(cmp.equivalent(&2, &6, &3, &4));
        assert_eq!(cmp.ordering(&5, &5, &1, &1), Ordering::Less);
    }

    #[test]
    fn test_float_fields() {
        let cmp: FieldComparator<f64, f64> = FieldComparator::default();
        assert!(cmp.precedes(&-1.5, &0.0, &0.5, &0.0));
        assert!(cmp.equivalent(&f64::NAN, &1.0, &2.0, &1.0));
    }
}
