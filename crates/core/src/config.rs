//! Collection configuration.

/// Runtime switches selected when a collection is built.
///
/// All switches default to off: independent publication of the two totals,
/// no ordered index and no writer serialization.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CollectionConfig {
    /// Recompute and publish both totals inside one critical section per
    /// mutation, so observers never see one total updated without the other
    /// for the same mutation.
    pub combined_atomic: bool,
    /// Maintain the ordered secondary index over live ids.
    pub maintain_ordered_index: bool,
    /// Serialize structural writers (`push*`, `erase*`, comparator changes)
    /// behind one re-entrant lock.
    pub serialize_writers: bool,
}

impl CollectionConfig {
    /// Creates the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_combined_atomic(mut self, enabled: bool) -> Self {
        self.combined_atomic = enabled;
        self
    }

    pub fn with_ordered_index(mut self, enabled: bool) -> Self {
        self.maintain_ordered_index = enabled;
        self
    }

    pub fn with_serialized_writers(mut self, enabled: bool) -> Self {
        self.serialize_writers = enabled;
        self
    }
}
