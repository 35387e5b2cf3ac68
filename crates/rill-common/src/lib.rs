//! # rill-common
//!
//! Common types, errors, and utilities for RillDB.
//!
//! This crate provides the foundational types shared by every RillDB
//! component:
//!
//! - **Types**: core identifiers (`Oid`, `FileId`, `RecordId`) and the
//!   [`Datum`](types::Datum) value carrier
//! - **Errors**: unified error handling with [`RillError`](error::RillError)
//! - **Config**: database configuration structures
//! - **Constants**: system-wide constants and alignment helpers
//!
//! ## Example
//!
//! ```rust
//! use rill_common::types::{Datum, Oid, RecordId};
//! use rill_common::error::RillResult;
//!
//! fn example() -> RillResult<()> {
//!     let oid = Oid::new(42);
//!     let d = Datum::from_i32(7);
//!     assert_eq!(d.get_i32(), 7);
//!     assert!(oid.is_valid());
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod align;
pub mod config;
pub mod constants;
pub mod error;
pub mod types;

// Re-export commonly used items at the crate root
pub use constants::*;
pub use error::{RillError, RillResult};
pub use types::{Datum, DatumRef, FieldId, FieldOffset, FileId, NullableDatumRef, Oid, PageNumber, RecordId, SlotId};
