//! Aggregation strategies.
//!
//! Each total is configured with one `AggregateSpec`:
//!
//! - `Add`: a delta function turns an element transition into an increment,
//!   and an apply function folds the increment into the running total.
//! - `Min` / `Max`: an extractor maps an element to a scalar, and the total is
//!   the extreme of the extracted values of all live elements.
//!
//! Delta functions take `(new1, new2, old1, old2)`. A push is evaluated against
//! the zero element (`Default`) as old values, an erase against it as new values.

use core::fmt;
use core::ops::{Add, AddAssign, Mul, Sub};
use std::sync::Arc;

/// Aggregation mode of a total.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AggMode {
    /// Running fold of per-transition deltas.
    Add,
    /// Minimum of the extracted values of live elements.
    Min,
    /// Maximum of the extracted values of live elements.
    Max,
}

/// Computes the increment one element transition contributes to a total.
pub struct DeltaFn<E1, E2, T> {
    f: Arc<dyn Fn(&E1, &E2, &E1, &E2) -> T + Send + Sync>,
}

impl<E1, E2, T> Clone for DeltaFn<E1, E2, T> {
    fn clone(&self) -> Self {
        Self { f: Arc::clone(&self.f) }
    }
}

impl<E1, E2, T> DeltaFn<E1, E2, T> {
    /// Wraps a custom `(new1, new2, old1, old2) -> delta` function.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&E1, &E2, &E1, &E2) -> T + Send + Sync + 'static,
    {
        Self { f: Arc::new(f) }
    }

    /// Evaluates the delta for a transition.
    #[inline]
    pub fn eval(&self, new1: &E1, new2: &E2, old1: &E1, old2: &E2) -> T {
        (self.f)(new1, new2, old1, old2)
    }
}

impl<E1, E2, T> DeltaFn<E1, E2, T>
where
    E1: 'static,
    E2: Clone + 'static,
    T: From<E2> + Sub<Output = T> + 'static,
{
    /// `new2 - old2`: the change of the second field (e.g. quantity).
    pub fn quantity() -> Self {
        Self::new(|_, n2: &E2, _, o2: &E2| T::from(n2.clone()) - T::from(o2.clone()))
    }
}

impl<E1, E2, T> DeltaFn<E1, E2, T>
where
    E1: Clone + 'static,
    E2: Clone + 'static,
    T: From<E1> + From<E2> + Mul<Output = T> + Sub<Output = T> + 'static,
{
    /// `new2*new1 - old2*old1`: the change of the fields' product (e.g. notional).
    pub fn notional() -> Self {
        Self::new(|n1: &E1, n2: &E2, o1: &E1, o2: &E2| {
            T::from(n2.clone()) * T::from(n1.clone()) - T::from(o2.clone()) * T::from(o1.clone())
        })
    }
}

impl<E1: 'static, E2: 'static, T: Default + 'static> DeltaFn<E1, E2, T> {
    /// Always yields the zero delta.
    pub fn noop() -> Self {
        Self::new(|_, _, _, _| T::default())
    }
}

impl<E1, E2, T> fmt::Debug for DeltaFn<E1, E2, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DeltaFn(..)")
    }
}

/// Folds a delta into a total, reporting whether the total changed.
pub struct ApplyFn<T> {
    f: Arc<dyn Fn(&mut T, &T) -> bool + Send + Sync>,
}

impl<T> Clone for ApplyFn<T> {
    fn clone(&self) -> Self {
        Self { f: Arc::clone(&self.f) }
    }
}

impl<T> ApplyFn<T> {
    /// Wraps a custom `(total, delta) -> changed` function.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&mut T, &T) -> bool + Send + Sync + 'static,
    {
        Self { f: Arc::new(f) }
    }

    /// Folds `delta` into `total`.
    #[inline]
    pub fn apply(&self, total: &mut T, delta: &T) -> bool {
        (self.f)(total, delta)
    }
}

impl<T: 'static> ApplyFn<T> {
    /// Never changes the total.
    pub fn noop() -> Self {
        Self::new(|_, _| false)
    }
}

impl<T: AddAssign + Clone + 'static> ApplyFn<T> {
    /// `total += delta`.
    pub fn add() -> Self {
        Self::new(|total: &mut T, delta: &T| {
            *total += delta.clone();
            true
        })
    }
}

impl<T: PartialEq + Clone + 'static> ApplyFn<T> {
    /// Interprets the delta as the new total.
    pub fn set() -> Self {
        Self::new(|total: &mut T, delta: &T| {
            if *total == *delta {
                return false;
            }
            *total = delta.clone();
            true
        })
    }
}

impl<T> ApplyFn<T>
where
    T: Add<Output = T> + PartialOrd + Clone + Send + Sync + 'static,
{
    /// Adds the delta, then clamps the result to `[lo, hi]`.
    pub fn saturating(lo: T, hi: T) -> Self {
        Self::new(move |total: &mut T, delta: &T| {
            let mut next = total.clone() + delta.clone();
            if next < lo {
                next = lo.clone();
            }
            if next > hi {
                next = hi.clone();
            }
            if next == *total {
                return false;
            }
            *total = next;
            true
        })
    }
}

impl<T> fmt::Debug for ApplyFn<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApplyFn(..)")
    }
}

/// Maps an element's fields to the scalar a min/max total ranges over.
pub struct ExtractFn<E1, E2, T> {
    f: Arc<dyn Fn(&E1, &E2) -> T + Send + Sync>,
}

impl<E1, E2, T> Clone for ExtractFn<E1, E2, T> {
    fn clone(&self) -> Self {
        Self { f: Arc::clone(&self.f) }
    }
}

impl<E1, E2, T> ExtractFn<E1, E2, T> {
    /// Wraps a custom `(elem1, elem2) -> value` function.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&E1, &E2) -> T + Send + Sync + 'static,
    {
        Self { f: Arc::new(f) }
    }

    /// Extracts the value of one element.
    #[inline]
    pub fn eval(&self, e1: &E1, e2: &E2) -> T {
        (self.f)(e1, e2)
    }
}

impl<E1: 'static, E2: Clone + 'static, T: From<E2> + 'static> ExtractFn<E1, E2, T> {
    /// The second field.
    pub fn second() -> Self {
        Self::new(|_, e2: &E2| T::from(e2.clone()))
    }
}

impl<E1, E2, T> ExtractFn<E1, E2, T>
where
    E1: Clone + 'static,
    E2: Clone + 'static,
    T: From<E1> + From<E2> + Mul<Output = T> + 'static,
{
    /// The product of both fields.
    pub fn product() -> Self {
        Self::new(|e1: &E1, e2: &E2| T::from(e2.clone()) * T::from(e1.clone()))
    }
}

impl<E1, E2, T> fmt::Debug for ExtractFn<E1, E2, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ExtractFn(..)")
    }
}

/// How one total is computed.
pub enum AggregateSpec<E1, E2, T> {
    /// Fold deltas with an apply function.
    Add { delta: DeltaFn<E1, E2, T>, apply: ApplyFn<T> },
    /// Minimum of extracted values.
    Min { extract: ExtractFn<E1, E2, T> },
    /// Maximum of extracted values.
    Max { extract: ExtractFn<E1, E2, T> },
}

impl<E1, E2, T> Clone for AggregateSpec<E1, E2, T> {
    fn clone(&self) -> Self {
        match self {
            AggregateSpec::Add { delta, apply } => AggregateSpec::Add {
                delta: delta.clone(),
                apply: apply.clone(),
            },
            AggregateSpec::Min { extract } => AggregateSpec::Min { extract: extract.clone() },
            AggregateSpec::Max { extract } => AggregateSpec::Max { extract: extract.clone() },
        }
    }
}

impl<E1, E2, T> AggregateSpec<E1, E2, T> {
    /// Running fold with a custom delta and apply function.
    pub fn fold(delta: DeltaFn<E1, E2, T>, apply: ApplyFn<T>) -> Self {
        AggregateSpec::Add { delta, apply }
    }

    /// Minimum of `extract` over live elements.
    pub fn min(extract: ExtractFn<E1, E2, T>) -> Self {
        AggregateSpec::Min { extract }
    }

    /// Maximum of `extract` over live elements.
    pub fn max(extract: ExtractFn<E1, E2, T>) -> Self {
        AggregateSpec::Max { extract }
    }

    /// Returns the aggregation mode.
    pub fn mode(&self) -> AggMode {
        match self {
            AggregateSpec::Add { .. } => AggMode::Add,
            AggregateSpec::Min { .. } => AggMode::Min,
            AggregateSpec::Max { .. } => AggMode::Max,
        }
    }
}

impl<E1, E2, T: AddAssign + Clone + 'static> AggregateSpec<E1, E2, T> {
    /// Additive running sum of `delta`.
    pub fn sum(delta: DeltaFn<E1, E2, T>) -> Self {
        AggregateSpec::Add {
            delta,
            apply: ApplyFn::add(),
        }
    }
}

impl<E1, E2, T> AggregateSpec<E1, E2, T>
where
    E1: 'static,
    E2: Clone + 'static,
    T: From<E2> + Sub<Output = T> + AddAssign + Clone + 'static,
{
    /// Default first total: running sum of `new2 - old2`.
    pub fn quantity_sum() -> Self {
        Self::sum(DeltaFn::quantity())
    }
}

impl<E1, E2, T> AggregateSpec<E1, E2, T>
where
    E1: Clone + 'static,
    E2: Clone + 'static,
    T: From<E1> + From<E2> + Mul<Output = T> + Sub<Output = T> + AddAssign + Clone + 'static,
{
    /// Default second total: running sum of `new2*new1 - old2*old1`.
    pub fn notional_sum() -> Self {
        Self::sum(DeltaFn::notional())
    }
}

impl<E1, E2, T> fmt::Debug for AggregateSpec<E1, E2, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AggregateSpec::{:?}", self.mode())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quantity_delta() {
        let d: DeltaFn<i64, i64, i64> = DeltaFn::quantity();
        assert_eq!(d.eval(&1, &10, &0, &0), 10);
        assert_eq!(d.eval(&1, &4, &1, &10), -6);
    }

    #[test]
    fn test_notional_delta() {
        let d: DeltaFn<f64, i32, f64> = DeltaFn::notional();
        assert_eq!(d.eval(&2.5, &4, &0.0, &0), 10.0);
        assert_eq!(d.eval(&3.0, &4, &2.5, &4), 2.0);
    }

    #[test]
    fn test_noop_delta() {
        let d: DeltaFn<i64, i64, i64> = DeltaFn::noop();
        assert_eq!(d.eval(&9, &9, &1, &1), 0);
    }

    #[test]
    fn test_add_apply() {
        let a: ApplyFn<i64> = ApplyFn::add();
        let mut total = 5;
        assert!(a.apply(&mut total, &3));
        assert_eq!(total, 8);
    }

    #[test]
    fn test_set_apply() {
        let a: ApplyFn<i64> = ApplyFn::set();
        let mut total = 5;
        assert!(!a.apply(&mut total, &5));
        assert!(a.apply(&mut total, &7));
        assert_eq!(total, 7);
    }

    #[test]
    fn test_saturating_apply() {
        let a: ApplyFn<i64> = ApplyFn::saturating(0, 100);
        let mut total = 90;
        assert!(a.apply(&mut total, &50));
        assert_eq!(total, 100);
        assert!(!a.apply(&mut total, &1));
        assert!(a.apply(&mut total, &-500));
        assert_eq!(total, 0);
    }

    #[test]
    fn test_noop_apply() {
        let a: ApplyFn<i64> = ApplyFn::noop();
        let mut total = 1;
        assert!(!a.apply(&mut total, &10));
        assert_eq!(total, 1);
    }

    #[test]
    fn test_extractors() {
        let second: ExtractFn<i64, i64, i64> = ExtractFn::second();
        let product: ExtractFn<i64, i64, i64> = ExtractFn::product();
        assert_eq!(second.eval(&3, &7), 7);
        assert_eq!(product.eval(&3, &7), 21);
    }

    #[test]
    fn test_spec_modes() {
        let add: AggregateSpec<i64, i64, i64> = AggregateSpec::quantity_sum();
        let min: AggregateSpec<i64, i64, i64> = AggregateSpec::min(ExtractFn::second());
        let max: AggregateSpec<i64, i64, i64> = AggregateSpec::max(ExtractFn::second());
        assert_eq!(add.mode(), AggMode::Add);
        assert_eq!(min.mode(), AggMode::Min);
        assert_eq!(max.clone().mode(), AggMode::Max);
        assert_eq!(format!("{:?}", min), "AggregateSpec::Min");
    }
}
