//! Table and index descriptors.

use std::sync::Arc;

use rill_common::types::FieldId;

use crate::schema::Schema;
use crate::systables::{IndexColumnEntry, IndexEntry, TableEntry};

/// A table descriptor: the cached Table row plus the table's
/// layout-computed schema.
#[derive(Debug, Clone)]
pub struct TableDesc {
    table: Arc<TableEntry>,
    schema: Schema,
}

impl TableDesc {
    /// Creates a table descriptor. `schema` must be layout-computed.
    #[must_use]
    pub fn new(table: Arc<TableEntry>, schema: Schema) -> Self {
        debug_assert!(schema.is_layout_computed());
        Self { table, schema }
    }

    /// Returns the cached Table row.
    #[inline]
    #[must_use]
    pub fn table(&self) -> &Arc<TableEntry> {
        &self.table
    }

    /// Returns the table's schema, always layout-computed.
    #[inline]
    #[must_use]
    pub fn schema(&self) -> &Schema {
        &self.schema
    }
}

/// An index descriptor: the cached Index row, its key columns, and the
/// layout-computed schema of the key tuple.
#[derive(Debug, Clone)]
pub struct IndexDesc {
    index: Arc<IndexEntry>,
    columns: Vec<Arc<IndexColumnEntry>>,
    key_schema: Schema,
}

impl IndexDesc {
    /// Creates an index descriptor. `key_schema` must be layout-computed.
    #[must_use]
    pub fn new(
        index: Arc<IndexEntry>,
        columns: Vec<Arc<IndexColumnEntry>>,
        key_schema: Schema,
    ) -> Self {
        debug_assert!(key_schema.is_layout_computed());
        Self {
            index,
            columns,
            key_schema,
        }
    }

    /// Returns the cached Index row.
    #[inline]
    #[must_use]
    pub fn index(&self) -> &Arc<IndexEntry> {
        &self.index
    }

    /// Returns the IndexColumn row of key column `keyid`.
    #[inline]
    #[must_use]
    pub fn index_column(&self, keyid: FieldId) -> &Arc<IndexColumnEntry> {
        &self.columns[keyid as usize]
    }

    /// Returns the number of key columns.
    #[inline]
    #[must_use]
    pub fn num_key_columns(&self) -> FieldId {
        self.columns.len() as FieldId
    }

    /// Returns the schema of the key tuple, always layout-computed.
    #[inline]
    #[must_use]
    pub fn key_schema(&self) -> &Schema {
        &self.key_schema
    }
}
