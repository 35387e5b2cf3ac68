//! # rill-storage
//!
//! The catalog file substrate for RillDB.
//!
//! The catalog cache stores its systable rows through an abstract substrate
//! with two flavors of file:
//!
//! - **Heap files**: append/iterate/update-current access to records, one
//!   file per systable
//! - **Raw files**: a single page of [`PAGE_SIZE`](rill_common::PAGE_SIZE)
//!   bytes, used for the database meta page
//!
//! The [`CatalogStore`] trait captures the contract; [`VolatileStore`] is
//! the in-memory implementation, which keeps every file alive only for the
//! lifetime of the process.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod error;
mod record;
mod store;
mod volatile;

pub use error::{StorageError, StorageResult};
pub use record::Record;
pub use store::{CatalogStore, FileHandle, FileIterator, PageGuard};
pub use volatile::VolatileStore;
