//! Twofold Core - Shared identifiers, errors and configuration.
//!
//! This crate provides the foundational types used by every other twofold crate:
//!
//! - `ElemId`: Identifier of a collection element, never reused
//! - `IdGenerator`: Lock-free monotonically increasing id source
//! - `Error`: Error type for collection operations
//! - `CollectionConfig`: Runtime switches chosen at construction
//!
//! # Example
//!
//! ```rust
//! use twofold_core::{CollectionConfig, Error, IdGenerator};
//!
//! let ids = IdGenerator::new();
//! let first = ids.next_id();
//! assert_eq!(first.get(), 1);
//!
//! let err = Error::not_found(first);
//! assert!(err.is_not_found());
//!
//! let config = CollectionConfig::new().with_ordered_index(true);
//! assert!(config.maintain_ordered_index);
//! ```

mod config;
mod error;
mod id;

pub use config::CollectionConfig;
pub use error::{Error, Result};
pub use id::{ElemId, IdGenerator};
