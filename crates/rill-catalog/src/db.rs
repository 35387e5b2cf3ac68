//! The database handle.
//!
//! A [`Database`] owns the catalog cache and its function registry for one
//! database instance. Opening is a constructor, so a handle can never be
//! re-initialized; dropping it tears the catalog down.

use std::io::Cursor;

use tracing::info;

use rill_common::config::DbConfig;
use rill_common::types::{FieldId, FileId, Oid};
use rill_common::{RillError, RillResult};

use rill_storage::VolatileStore;

use crate::bootstrap::BootstrapCatCache;
use crate::catcache::{CatCache, VolatileCatCache};
use crate::idxtyps::IdxType;
use crate::initfile::init_file_contents;

/// A database instance over the volatile substrate.
#[derive(Debug)]
pub struct Database {
    config: DbConfig,
    catcache: VolatileCatCache,
}

impl Database {
    /// Opens a database.
    ///
    /// With `create` set, the catalog is built from the init data file
    /// named in the configuration, or from the canonical generated init
    /// data when none is configured. Without `create`, the catalog is
    /// restored from existing data, which the volatile substrate cannot
    /// provide.
    pub fn open(config: DbConfig, create: bool) -> RillResult<Self> {
        config
            .validate()
            .map_err(RillError::invalid_argument)?;

        let bootstrap = BootstrapCatCache::new()?;
        let mut catcache = CatCache::new(VolatileStore::new());

        if create {
            match &config.init_data_file {
                Some(path) => {
                    let text = std::fs::read_to_string(path)?;
                    catcache.initialize_from_init_data(
                        Cursor::new(text.into_bytes()),
                        &bootstrap,
                    )?;
                }
                None => {
                    let text = init_file_contents(&bootstrap);
                    catcache.initialize_from_init_data(
                        Cursor::new(text.into_bytes()),
                        &bootstrap,
                    )?;
                }
            }
        } else {
            catcache.initialize_from_existing(&bootstrap)?;
        }

        let db = Self { config, catcache };
        if !db.config.disable_logs {
            info!(created = create, "database open");
        }
        Ok(db)
    }

    /// Returns the configuration the database was opened with.
    #[must_use]
    pub fn config(&self) -> &DbConfig {
        &self.config
    }

    /// Returns the catalog cache.
    #[must_use]
    pub fn catcache(&self) -> &VolatileCatCache {
        &self.catcache
    }

    /// Creates a table named `tabname` with `coltypid.len()` columns.
    ///
    /// The remaining vectors may be empty, in which case defaults apply:
    /// type parameter 0, field names `col_0`, `col_1`, ..., and columns
    /// that are neither nullable nor arrays. Non-empty vectors must have
    /// one entry per column.
    ///
    /// The snapshot has no heap file manager for user tables, so the table
    /// is registered in the catalog without any backing storage.
    pub fn create_table(
        &self,
        tabname: &str,
        coltypid: &[Oid],
        coltypparam: &[u64],
        field_names: &[&str],
        colisnullable: &[bool],
        colisarray: &[bool],
    ) -> RillResult<Oid> {
        let ncols = coltypid.len();
        let coltypparam = if coltypparam.is_empty() {
            vec![0; ncols]
        } else {
            coltypparam.to_vec()
        };
        let field_names: Vec<String> = if field_names.is_empty() {
            (0..ncols).map(|i| format!("col_{i}")).collect()
        } else {
            field_names.iter().map(|s| (*s).to_string()).collect()
        };
        let colisnullable = if colisnullable.is_empty() {
            vec![false; ncols]
        } else {
            colisnullable.to_vec()
        };
        let colisarray = if colisarray.is_empty() {
            vec![false; ncols]
        } else {
            colisarray.to_vec()
        };

        self.catcache.add_table(
            tabname,
            coltypid,
            &coltypparam,
            &field_names,
            &colisnullable,
            &colisarray,
            FileId::INVALID,
        )
    }

    /// Creates an index named `idxname` over table `idxtabid`.
    ///
    /// An empty name gets a generated one. The comparison function vectors
    /// may be empty or shorter than the key column list; missing entries
    /// are resolved from the default operators of each key column's type.
    pub fn create_index(
        &self,
        idxname: &str,
        idxtabid: Oid,
        idxtyp: IdxType,
        idxunique: bool,
        idxcoltabcolids: &[FieldId],
        idxcolltfuncids: &[Oid],
        idxcoleqfuncids: &[Oid],
    ) -> RillResult<Oid> {
        let generated;
        let idxname = if idxname.is_empty() {
            let cols: Vec<String> = idxcoltabcolids.iter().map(ToString::to_string).collect();
            generated = format!("idx_{}_{}", idxtabid, cols.join("_"));
            &generated
        } else {
            idxname
        };

        self.catcache.add_index(
            idxname,
            idxtabid,
            idxtyp,
            idxunique,
            idxcoltabcolids,
            FileId::INVALID,
            idxcolltfuncids,
            idxcoleqfuncids,
        )
    }

    /// Closes the database, releasing the catalog.
    pub fn close(self) {
        if !self.config.disable_logs {
            info!("database closed");
        }
        drop(self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::systables::initoids;

    #[test]
    fn test_open_create_and_lookup() {
        let db = Database::open(DbConfig::for_testing(), true).unwrap();
        assert!(db.catcache().is_initialized());
        assert_eq!(
            db.catcache().find_table_by_name("Type").unwrap(),
            Some(initoids::TAB_TYPE)
        );
        db.close();
    }

    #[test]
    fn test_open_existing_fails_on_volatile() {
        let err = Database::open(DbConfig::for_testing(), false).unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_create_table_defaults() {
        let db = Database::open(DbConfig::for_testing(), true).unwrap();
        let tabid = db
            .create_table(
                "metrics",
                &[initoids::TYP_INT8, initoids::TYP_DOUBLE],
                &[],
                &[],
                &[],
                &[],
            )
            .unwrap();

        let desc = db.catcache().find_table_desc(tabid).unwrap().unwrap();
        assert_eq!(desc.schema().num_fields(), 2);
        assert_eq!(desc.schema().field_name(0), "col_0");
        assert_eq!(desc.schema().field_name(1), "col_1");
        assert!(!desc.schema().field_is_nullable(0));
    }

    #[test]
    fn test_create_index_generated_name() {
        let db = Database::open(DbConfig::for_testing(), true).unwrap();
        let tabid = db
            .create_table("t", &[initoids::TYP_INT4], &[], &[], &[], &[])
            .unwrap();
        let idxid = db
            .create_index("", tabid, IdxType::VolatileTree, false, &[0], &[], &[])
            .unwrap();

        let idx = db.catcache().find_index(idxid).unwrap().unwrap();
        assert_eq!(idx.idxname, format!("idx_{tabid}_0"));
    }

    #[test]
    fn test_btree_index_queued_for_build() {
        let db = Database::open(DbConfig::for_testing(), true).unwrap();
        let tabid = db
            .create_table("t", &[initoids::TYP_INT4], &[], &[], &[], &[])
            .unwrap();
        let idxid = db
            .create_index("t_btree", tabid, IdxType::BTree, false, &[0], &[], &[])
            .unwrap();
        assert_eq!(db.catcache().pending_index_builds(), vec![idxid]);
    }
}
