//! Error types for twofold collections.

use crate::id::ElemId;
use thiserror::Error;

/// Result type alias for collection operations.
pub type Result<T> = core::result::Result<T, Error>;

/// Errors raised by collection operations.
///
/// Only operations that require an element to exist fail. Presence queries
/// (`find_by_key`, `get`, `contains`) return `Option`/`bool` instead, and
/// `erase` of an absent id is a silent no-op.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// No live element carries this id.
    #[error("element {id} not found")]
    NotFound { id: ElemId },
    /// A keyed insert named a key that already belongs to a live element.
    #[error("key {key} is already bound to element {existing}")]
    DuplicateKey { key: String, existing: ElemId },
}

impl Error {
    /// Creates a not found error.
    pub fn not_found(id: ElemId) -> Self {
        Error::NotFound { id }
    }

    /// Creates a duplicate key error, rendering the key with `Debug`.
    pub fn duplicate_key(key: &impl core::fmt::Debug, existing: ElemId) -> Self {
        Error::DuplicateKey {
            key: format!("{:?}", key),
            existing,
        }
    }

    /// Returns true if this is a not found error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }
}
