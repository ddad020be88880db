//! Aggregate engine maintaining the two totals.
//!
//! Every element transition (push, field change, erase) is fed to the engine
//! once. Each total is a *lane* with its own strategy and its own reactive
//! cell. Lanes publish independently unless the engine is combined-atomic,
//! in which case both lanes are updated inside one critical section and their
//! notifications are released together after it.

use crate::delta::transition_deltas;
use crate::extremes::{Extreme, ExtremeTracker};
use crate::strategy::{AggMode, AggregateSpec, ApplyFn, DeltaFn, ExtractFn};
use parking_lot::Mutex;
use twofold_reactive::{BatchGuard, ReactiveCell};

/// Requirements on an element field type.
pub trait Field: Clone + Default + PartialEq + Send + Sync + 'static {}

impl<F: Clone + Default + PartialEq + Send + Sync + 'static> Field for F {}

/// Requirements on a total type.
pub trait Total: Clone + Default + PartialOrd + Send + Sync + 'static {}

impl<T: Clone + Default + PartialOrd + Send + Sync + 'static> Total for T {}

/// One element moving between two states.
///
/// `None` means the element is not part of the collection on that side: a
/// push has no `old`, an erase has no `new`.
#[derive(Clone, Debug, PartialEq)]
pub struct Transition<E1, E2> {
    pub old: Option<(E1, E2)>,
    pub new: Option<(E1, E2)>,
}

impl<E1, E2> Transition<E1, E2> {
    /// An element entering the collection.
    pub fn inserted(e1: E1, e2: E2) -> Self {
        Self {
            old: None,
            new: Some((e1, e2)),
        }
    }

    /// An element leaving the collection.
    pub fn removed(e1: E1, e2: E2) -> Self {
        Self {
            old: Some((e1, e2)),
            new: None,
        }
    }

    /// A live element changing its fields.
    pub fn changed(old: (E1, E2), new: (E1, E2)) -> Self {
        Self {
            old: Some(old),
            new: Some(new),
        }
    }
}

enum LaneKind<E1, E2, T> {
    Fold {
        delta: DeltaFn<E1, E2, T>,
        apply: ApplyFn<T>,
    },
    Extreme {
        extract: ExtractFn<E1, E2, T>,
        tracker: Mutex<ExtremeTracker<T>>,
    },
}

/// One total: its strategy plus the cell it publishes to.
pub struct Lane<E1, E2, T> {
    mode: AggMode,
    kind: LaneKind<E1, E2, T>,
    cell: ReactiveCell<T>,
}

impl<E1: Field, E2: Field, T: Total> Lane<E1, E2, T> {
    /// Creates a lane starting at `T::default()`.
    pub fn new(spec: AggregateSpec<E1, E2, T>) -> Self {
        let mode = spec.mode();
        let kind = match spec {
            AggregateSpec::Add { delta, apply } => LaneKind::Fold { delta, apply },
            AggregateSpec::Min { extract } => LaneKind::Extreme {
                extract,
                tracker: Mutex::new(ExtremeTracker::new(Extreme::Min)),
            },
            AggregateSpec::Max { extract } => LaneKind::Extreme {
                extract,
                tracker: Mutex::new(ExtremeTracker::new(Extreme::Max)),
            },
        };
        Self {
            mode,
            kind,
            cell: ReactiveCell::new(T::default()),
        }
    }

    /// Folds one transition into the total. Returns true if the total changed.
    pub fn apply(&self, transition: &Transition<E1, E2>) -> bool {
        match &self.kind {
            LaneKind::Fold { delta, apply } => {
                let zero = (E1::default(), E2::default());
                let (n1, n2) = transition.new.as_ref().unwrap_or(&zero);
                let (o1, o2) = transition.old.as_ref().unwrap_or(&zero);
                let d = delta.eval(n1, n2, o1, o2);
                self.cell.update(|total| apply.apply(total, &d))
            }
            LaneKind::Extreme { extract, tracker } => {
                let deltas = transition_deltas(
                    transition.old.as_ref().map(|(e1, e2)| extract.eval(e1, e2)),
                    transition.new.as_ref().map(|(e1, e2)| extract.eval(e1, e2)),
                );
                if deltas.is_empty() {
                    return false;
                }
                let _batch = BatchGuard::enter();
                let mut tracker = tracker.lock();
                tracker.apply(&deltas);
                // An empty multiset publishes the zero total.
                let next = tracker.get().cloned().unwrap_or_default();
                self.cell.set(next)
            }
        }
    }

    /// Returns the aggregation mode.
    #[inline]
    pub fn mode(&self) -> AggMode {
        self.mode
    }

    /// Returns the current total.
    #[inline]
    pub fn get(&self) -> T {
        self.cell.get()
    }

    /// Returns the cell the total is published to.
    #[inline]
    pub fn cell(&self) -> &ReactiveCell<T> {
        &self.cell
    }
}

/// Maintains `total1` and `total2` for a collection.
pub struct AggregateEngine<E1, E2, T1, T2> {
    lane1: Lane<E1, E2, T1>,
    lane2: Lane<E1, E2, T2>,
    combined: Option<Mutex<()>>,
}

impl<E1: Field, E2: Field, T1: Total, T2: Total> AggregateEngine<E1, E2, T1, T2> {
    /// Creates an engine with both totals at zero.
    pub fn new(
        total1: AggregateSpec<E1, E2, T1>,
        total2: AggregateSpec<E1, E2, T2>,
        combined_atomic: bool,
    ) -> Self {
        Self {
            lane1: Lane::new(total1),
            lane2: Lane::new(total2),
            combined: combined_atomic.then(|| Mutex::new(())),
        }
    }

    /// Folds one transition into both totals.
    ///
    /// Returns which totals changed. In combined-atomic mode both cells are
    /// written before either notifies.
    pub fn apply(&self, transition: &Transition<E1, E2>) -> (bool, bool) {
        match &self.combined {
            Some(serial) => {
                let _batch = BatchGuard::enter();
                let _serial = serial.lock();
                (self.lane1.apply(transition), self.lane2.apply(transition))
            }
            None => (self.lane1.apply(transition), self.lane2.apply(transition)),
        }
    }

    /// Returns true if totals are published together.
    #[inline]
    pub fn is_combined_atomic(&self) -> bool {
        self.combined.is_some()
    }

    #[inline]
    pub fn total1(&self) -> T1 {
        self.lane1.get()
    }

    #[inline]
    pub fn total2(&self) -> T2 {
        self.lane2.get()
    }

    #[inline]
    pub fn total1_cell(&self) -> &ReactiveCell<T1> {
        self.lane1.cell()
    }

    #[inline]
    pub fn total2_cell(&self) -> &ReactiveCell<T2> {
        self.lane2.cell()
    }

    #[inline]
    pub fn mode1(&self) -> AggMode {
        self.lane1.mode()
    }

    #[inline]
    pub fn mode2(&self) -> AggMode {
        self.lane2.mode()
    }
}
