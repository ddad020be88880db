//! Builder for reactive collections.

use crate::collection::ReactiveCollection;
use crate::keys::Key;
use twofold_core::CollectionConfig;
use twofold_incremental::{AggregateSpec, Field, Total};
use twofold_index::FieldComparator;

/// Builder for creating reactive collections.
///
/// Both totals must be given; `build` returns None otherwise. The comparator
/// defaults to ascending `(elem1, elem2)`.
///
/// ```
/// use twofold_collection::{AggregateSpec, ExtractFn, ReactiveCollection};
///
/// let c: ReactiveCollection<i64, i64, i64, i64> = ReactiveCollection::builder()
///     .ordered(true)
///     .total1(AggregateSpec::quantity_sum())
///     .total2(AggregateSpec::max(ExtractFn::product()))
///     .build()
///     .unwrap();
///
/// c.push_back(3, 4);
/// c.push_back(5, 1);
/// assert_eq!((c.total1(), c.total2()), (5, 12));
/// ```
pub struct CollectionBuilder<E1, E2, T1, T2, K> {
    config: CollectionConfig,
    total1: Option<AggregateSpec<E1, E2, T1>>,
    total2: Option<AggregateSpec<E1, E2, T2>>,
    compare: Option<FieldComparator<E1, E2>>,
    _key: core::marker::PhantomData<fn() -> K>,
}

impl<E1, E2, T1, T2, K> Default for CollectionBuilder<E1, E2, T1, T2, K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E1, E2, T1, T2, K> CollectionBuilder<E1, E2, T1, T2, K> {
    pub fn new() -> Self {
        Self {
            config: CollectionConfig::default(),
            total1: None,
            total2: None,
            compare: None,
            _key: core::marker::PhantomData,
        }
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, config: CollectionConfig) -> Self {
        self.config = config;
        self
    }

    pub fn combined_atomic(mut self, enabled: bool) -> Self {
        self.config.combined_atomic = enabled;
        self
    }

    pub fn ordered(mut self, enabled: bool) -> Self {
        self.config.maintain_ordered_index = enabled;
        self
    }

    pub fn serialize_writers(mut self, enabled: bool) -> Self {
        self.config.serialize_writers = enabled;
        self
    }

    pub fn total1(mut self, spec: AggregateSpec<E1, E2, T1>) -> Self {
        self.total1 = Some(spec);
        self
    }

    pub fn total2(mut self, spec: AggregateSpec<E1, E2, T2>) -> Self {
        self.total2 = Some(spec);
        self
    }

    pub fn compare(mut self, compare: FieldComparator<E1, E2>) -> Self {
        self.compare = Some(compare);
        self
    }
}

impl<E1, E2, T1, T2, K> CollectionBuilder<E1, E2, T1, T2, K>
where
    E1: Field + PartialOrd,
    E2: Field + PartialOrd,
    T1: Total,
    T2: Total,
    K: Key,
{
    pub fn build(self) -> Option<ReactiveCollection<E1, E2, T1, T2, K>> {
        let total1 = self.total1?;
        let total2 = self.total2?;
        let compare = self.compare.unwrap_or_else(FieldComparator::lexicographic);
        Some(ReactiveCollection::new(self.config, total1, total2, compare))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use twofold_index::Order;

    type Builder = CollectionBuilder<i64, i64, i64, i64, ()>;

    #[test]
    fn test_build_requires_totals() {
        assert!(Builder::new().build().is_none());
        assert!(Builder::new()
            .total1(AggregateSpec::quantity_sum())
            .build()
            .is_none());
    }

    #[test]
    fn test_builder_switches() {
        let c = Builder::new()
            .combined_atomic(true)
            .ordered(true)
            .serialize_writers(true)
            .total1(AggregateSpec::quantity_sum())
            .total2(AggregateSpec::notional_sum())
            .compare(FieldComparator::by(Order::Desc, Order::Asc))
            .build()
            .unwrap();

        let config = c.config();
        assert!(config.combined_atomic && config.maintain_ordered_index && config.serialize_writers);

        let low = c.push_back(1, 0);
        let high = c.push_back(9, 0);
        assert_eq!(c.ordered_ids(), vec![high, low]);
    }

    #[test]
    fn test_config_replaces_switches() {
        let c = Builder::new()
            .ordered(true)
            .config(CollectionConfig::default())
            .total1(AggregateSpec::quantity_sum())
            .total2(AggregateSpec::notional_sum())
            .build()
            .unwrap();
        assert!(!c.is_ordered());
    }
}
