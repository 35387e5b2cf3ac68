//! # rill-catalog
//!
//! The catalog core of RillDB: the tuple layout engine, the function-call
//! interface with its built-in function registry, the self-describing
//! bootstrap catalog, the init data file reader, and the catalog cache over
//! an abstract file substrate.
//!
//! The catalog has a dependency cycle at its heart: the schema engine needs
//! type metadata from the catalog, and the catalog stores its own metadata
//! in records laid out by the schema engine. The cycle is broken by
//! [`BootstrapCatCache`](bootstrap::BootstrapCatCache), which hard-codes
//! just enough rows to decode the rest.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod bootstrap;
pub mod catcache;
pub mod db;
pub mod desc;
pub mod fmgr;
pub mod idxtyps;
pub mod initfile;
pub mod optypes;
pub mod schema;
pub mod systables;
pub mod typsupp;

pub use bootstrap::BootstrapCatCache;
pub use catcache::{CatCache, VolatileCatCache};
pub use db::Database;
pub use desc::{IndexDesc, TableDesc};
pub use schema::{Schema, SchemaCatalog};
