//! The bootstrap catalog.
//!
//! [`BootstrapCatCache`] holds the hard-coded catalog rows needed to
//! bootstrap the database: the systables' own Table, Type, Column and
//! Function rows. That is enough for the schema engine to compute the
//! layout of every systable before any regular catalog exists, which is
//! how the init data file gets decoded in the first place. The regular
//! catalog cache references this cache while it loads.

use std::collections::HashMap;
use std::sync::Arc;

use rill_common::types::Oid;
use rill_common::{RillError, RillResult};

use crate::desc::TableDesc;
use crate::fmgr::{FuncRegistry, FunctionPtr};
use crate::schema::{Schema, SchemaCatalog};
use crate::systables::{bootstrap_data, ColumnEntry, FunctionEntry, TableEntry, TypeEntry};

/// The hard-coded, self-describing bootstrap catalog.
#[derive(Debug)]
pub struct BootstrapCatCache {
    tables: HashMap<Oid, Arc<TableEntry>>,
    types: HashMap<Oid, Arc<TypeEntry>>,
    functions: HashMap<Oid, Arc<FunctionEntry>>,
    /// All bootstrap Column rows, grouped by table in column order.
    columns: Vec<Arc<ColumnEntry>>,
    table_descs: HashMap<Oid, Arc<TableDesc>>,
    registry: FuncRegistry,
}

impl BootstrapCatCache {
    /// Builds the bootstrap catalog and the table descriptor of every
    /// systable, computing each schema layout against this catalog
    /// itself.
    pub fn new() -> RillResult<Self> {
        let mut tables = HashMap::new();
        for t in bootstrap_data::tables() {
            if tables.insert(t.tabid, Arc::new(t)).is_some() {
                return Err(RillError::corruption("duplicate bootstrap table OID"));
            }
        }

        let mut types = HashMap::new();
        for t in bootstrap_data::types() {
            if types.insert(t.typid, Arc::new(t)).is_some() {
                return Err(RillError::corruption("duplicate bootstrap type OID"));
            }
        }

        let mut functions = HashMap::new();
        for f in bootstrap_data::functions() {
            if functions.insert(f.funcid, Arc::new(f)).is_some() {
                return Err(RillError::corruption("duplicate bootstrap function OID"));
            }
        }

        let columns: Vec<Arc<ColumnEntry>> = bootstrap_data::columns()
            .into_iter()
            .map(Arc::new)
            .collect();

        let mut cache = Self {
            tables,
            types,
            functions,
            columns,
            table_descs: HashMap::new(),
            registry: FuncRegistry::builtin(),
        };

        // The self-describing step: build a descriptor for every systable
        // by running the layout computation against the rows above.
        let mut descs = HashMap::new();
        for table in cache.tables.values() {
            let schema = cache.build_table_schema(table.tabid)?;
            descs.insert(
                table.tabid,
                Arc::new(TableDesc::new(Arc::clone(table), schema)),
            );
        }
        cache.table_descs = descs;
        Ok(cache)
    }

    fn build_table_schema(&self, tabid: Oid) -> RillResult<Schema> {
        let columns = self.find_columns(tabid);
        if columns.is_empty() {
            return Err(RillError::corruption(format!(
                "bootstrap table {tabid} has no columns"
            )));
        }

        let mut typid = vec![Oid::INVALID; columns.len()];
        let mut typparam = vec![0u64; columns.len()];
        let mut nullable = vec![false; columns.len()];
        let mut names = vec![String::new(); columns.len()];
        for c in &columns {
            let i = c.colid as usize;
            typid[i] = c.coltypid;
            typparam[i] = c.coltypparam;
            nullable[i] = c.colisnullable;
            names[i] = c.colname.clone();
        }

        let mut schema = Schema::create_with_names(&typid, &typparam, &nullable, names)?;
        schema.compute_layout(self)?;
        Ok(schema)
    }

    /// Returns the bootstrap Table row with OID `oid`.
    #[must_use]
    pub fn find_table(&self, oid: Oid) -> Option<Arc<TableEntry>> {
        self.tables.get(&oid).map(Arc::clone)
    }

    /// Returns the bootstrap Type row with OID `oid`.
    #[must_use]
    pub fn find_type(&self, oid: Oid) -> Option<Arc<TypeEntry>> {
        self.types.get(&oid).map(Arc::clone)
    }

    /// Returns the bootstrap Function row with OID `oid`.
    #[must_use]
    pub fn find_function(&self, oid: Oid) -> Option<Arc<FunctionEntry>> {
        self.functions.get(&oid).map(Arc::clone)
    }

    /// Returns the bootstrap Column rows of table `tabid`, in column
    /// order.
    #[must_use]
    pub fn find_columns(&self, tabid: Oid) -> Vec<Arc<ColumnEntry>> {
        self.columns
            .iter()
            .filter(|c| c.coltabid == tabid)
            .map(Arc::clone)
            .collect()
    }

    /// Returns the descriptor of systable `oid`.
    #[must_use]
    pub fn find_table_desc(&self, oid: Oid) -> Option<Arc<TableDesc>> {
        self.table_descs.get(&oid).map(Arc::clone)
    }

    /// Returns the built-in function registry.
    #[must_use]
    pub fn registry(&self) -> &FuncRegistry {
        &self.registry
    }
}

impl SchemaCatalog for BootstrapCatCache {
    fn find_type(&self, typid: Oid) -> RillResult<Arc<TypeEntry>> {
        self.types
            .get(&typid)
            .map(Arc::clone)
            .ok_or_else(|| RillError::corruption(format!("type {typid} is not in the catalog")))
    }

    fn function(&self, funcid: Oid) -> RillResult<FunctionPtr> {
        self.registry.lookup(funcid)
    }
}
