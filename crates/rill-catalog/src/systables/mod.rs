//! In-memory representations of system catalog rows.
//!
//! Each systable has a row struct with typed fields, a decoder from the
//! datum vector of a stored record, and an encoder back into datums for
//! insertion through the schema engine. Column index constants follow each
//! struct; they are what the catalog cache's predicate lookups use.

pub mod bootstrap_data;
pub mod initoids;

use std::sync::Arc;

use rill_common::types::{Datum, FieldId, FileId, Oid};
use rill_common::{RillError, RillResult};

use crate::idxtyps::IdxType;
use crate::optypes::OpType;

fn expect_arity(tab: &'static str, data: &[Datum<'_>], n: usize) -> RillResult<()> {
    if data.len() != n {
        return Err(RillError::corruption(format!(
            "{tab} row has {} fields, expected {n}",
            data.len()
        )));
    }
    Ok(())
}

fn decode_name(tab: &'static str, d: &Datum<'_>) -> RillResult<String> {
    String::from_utf8(d.varlen_bytes().to_vec())
        .map_err(|_| RillError::corruption(format!("{tab} row has a non-UTF-8 name")))
}

/// A row of the Table systable: one entry per table in the database,
/// including the systables themselves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableEntry {
    /// The table OID.
    pub tabid: Oid,
    /// True for the systables.
    pub tabissys: bool,
    /// True if any column of the table is variable-length.
    pub tabisvarlen: bool,
    /// Number of columns.
    pub tabncols: i16,
    /// The file holding the table's records.
    pub tabfid: FileId,
    /// The table name.
    pub tabname: String,
}

impl TableEntry {
    /// Column index of `tabid`.
    pub const TABID_COL: FieldId = 0;
    /// Column index of `tabname`.
    pub const TABNAME_COL: FieldId = 5;
    /// Number of columns.
    pub const NUM_COLS: usize = 6;

    /// Decodes a Table row from its datum vector.
    pub fn from_datums(data: &[Datum<'_>]) -> RillResult<Self> {
        expect_arity("Table", data, Self::NUM_COLS)?;
        Ok(Self {
            tabid: data[0].get_oid(),
            tabissys: data[1].get_bool(),
            tabisvarlen: data[2].get_bool(),
            tabncols: data[3].get_i16(),
            tabfid: FileId::new(data[4].get_u32()),
            tabname: decode_name("Table", &data[5])?,
        })
    }

    /// Encodes this row as a datum vector in column order.
    #[must_use]
    pub fn datum_vector(&self) -> Vec<Datum<'_>> {
        vec![
            Datum::from_oid(self.tabid),
            Datum::from_bool(self.tabissys),
            Datum::from_bool(self.tabisvarlen),
            Datum::from_i16(self.tabncols),
            Datum::from_u32(self.tabfid.as_u32()),
            Datum::from_varlen_bytes(self.tabname.as_bytes()),
        ]
    }
}

/// A row of the Type systable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeEntry {
    /// The type OID.
    pub typid: Oid,
    /// Fixed length in bytes; -1 for variable-length types and for
    /// fixed-length types whose length comes from a type length function.
    pub typlen: i16,
    /// True for variable-length types.
    pub typisvarlen: bool,
    /// True if values are passed by reference rather than inline.
    pub typbyref: bool,
    /// Required alignment of stored values. A power of two, at most 8.
    pub typalign: u8,
    /// The type input function.
    pub typinfunc: Oid,
    /// The type output function.
    pub typoutfunc: Oid,
    /// The type length function, or the invalid OID when `typlen` is the
    /// cached constant.
    pub typlenfunc: Oid,
    /// The type name.
    pub typname: String,
}

impl TypeEntry {
    /// Column index of `typid`.
    pub const TYPID_COL: FieldId = 0;
    /// Column index of `typname`.
    pub const TYPNAME_COL: FieldId = 8;
    /// Number of columns.
    pub const NUM_COLS: usize = 9;

    /// Decodes a Type row from its datum vector.
    pub fn from_datums(data: &[Datum<'_>]) -> RillResult<Self> {
        expect_arity("Type", data, Self::NUM_COLS)?;
        Ok(Self {
            typid: data[0].get_oid(),
            typlen: data[1].get_i16(),
            typisvarlen: data[2].get_bool(),
            typbyref: data[3].get_bool(),
            typalign: data[4].get_u8(),
            typinfunc: data[5].get_oid(),
            typoutfunc: data[6].get_oid(),
            typlenfunc: data[7].get_oid(),
            typname: decode_name("Type", &data[8])?,
        })
    }

    /// Encodes this row as a datum vector in column order.
    #[must_use]
    pub fn datum_vector(&self) -> Vec<Datum<'_>> {
        vec![
            Datum::from_oid(self.typid),
            Datum::from_i16(self.typlen),
            Datum::from_bool(self.typisvarlen),
            Datum::from_bool(self.typbyref),
            Datum::from_u8(self.typalign),
            Datum::from_oid(self.typinfunc),
            Datum::from_oid(self.typoutfunc),
            Datum::from_oid(self.typlenfunc),
            Datum::from_varlen_bytes(self.typname.as_bytes()),
        ]
    }
}

/// A row of the Column systable: one entry per column of every table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnEntry {
    /// The OID of the owning table.
    pub coltabid: Oid,
    /// The column's position in the table, starting at 0.
    pub colid: i16,
    /// The column's type OID.
    pub coltypid: Oid,
    /// The column's type parameter (e.g. the `n` of `VARCHAR(n)`).
    pub coltypparam: u64,
    /// True if the column may store nulls.
    pub colisnullable: bool,
    /// True if the column is an array. Arrays are declared in the catalog
    /// but not interpreted by this core.
    pub colisarray: bool,
    /// The column name.
    pub colname: String,
}

impl ColumnEntry {
    /// Column index of `coltabid`.
    pub const COLTABID_COL: FieldId = 0;
    /// Column index of `colid`.
    pub const COLID_COL: FieldId = 1;
    /// Number of columns.
    pub const NUM_COLS: usize = 7;

    /// Decodes a Column row from its datum vector.
    pub fn from_datums(data: &[Datum<'_>]) -> RillResult<Self> {
        expect_arity("Column", data, Self::NUM_COLS)?;
        Ok(Self {
            coltabid: data[0].get_oid(),
            colid: data[1].get_i16(),
            coltypid: data[2].get_oid(),
            coltypparam: data[3].get_u64(),
            colisnullable: data[4].get_bool(),
            colisarray: data[5].get_bool(),
            colname: decode_name("Column", &data[6])?,
        })
    }

    /// Encodes this row as a datum vector in column order.
    #[must_use]
    pub fn datum_vector(&self) -> Vec<Datum<'_>> {
        vec![
            Datum::from_oid(self.coltabid),
            Datum::from_i16(self.colid),
            Datum::from_oid(self.coltypid),
            Datum::from_u64(self.coltypparam),
            Datum::from_bool(self.colisnullable),
            Datum::from_bool(self.colisarray),
            Datum::from_varlen_bytes(self.colname.as_bytes()),
        ]
    }
}

/// A row of the Function systable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionEntry {
    /// The function OID.
    pub funcid: Oid,
    /// The number of arguments.
    pub funcnargs: i16,
    /// The OID of the return type.
    pub funcrettypid: Oid,
    /// The function name.
    pub funcname: String,
}

impl FunctionEntry {
    /// Column index of `funcid`.
    pub const FUNCID_COL: FieldId = 0;
    /// Column index of `funcname`.
    pub const FUNCNAME_COL: FieldId = 3;
    /// Number of columns.
    pub const NUM_COLS: usize = 4;

    /// Decodes a Function row from its datum vector.
    pub fn from_datums(data: &[Datum<'_>]) -> RillResult<Self> {
        expect_arity("Function", data, Self::NUM_COLS)?;
        Ok(Self {
            funcid: data[0].get_oid(),
            funcnargs: data[1].get_i16(),
            funcrettypid: data[2].get_oid(),
            funcname: decode_name("Function", &data[3])?,
        })
    }

    /// Encodes this row as a datum vector in column order.
    #[must_use]
    pub fn datum_vector(&self) -> Vec<Datum<'_>> {
        vec![
            Datum::from_oid(self.funcid),
            Datum::from_i16(self.funcnargs),
            Datum::from_oid(self.funcrettypid),
            Datum::from_varlen_bytes(self.funcname.as_bytes()),
        ]
    }
}

/// A row of the FunctionArgs systable: one entry per (function, argument
/// position) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionArgsEntry {
    /// The function OID.
    pub funcid: Oid,
    /// The argument position, starting at 0.
    pub funcargid: i16,
    /// The OID of the argument type.
    pub funcargtypid: Oid,
}

impl FunctionArgsEntry {
    /// Column index of `funcid`.
    pub const FUNCID_COL: FieldId = 0;
    /// Column index of `funcargid`.
    pub const FUNCARGID_COL: FieldId = 1;
    /// Number of columns.
    pub const NUM_COLS: usize = 3;

    /// Decodes a FunctionArgs row from its datum vector.
    pub fn from_datums(data: &[Datum<'_>]) -> RillResult<Self> {
        expect_arity("FunctionArgs", data, Self::NUM_COLS)?;
        Ok(Self {
            funcid: data[0].get_oid(),
            funcargid: data[1].get_i16(),
            funcargtypid: data[2].get_oid(),
        })
    }

    /// Encodes this row as a datum vector in column order.
    #[must_use]
    pub fn datum_vector(&self) -> Vec<Datum<'_>> {
        vec![
            Datum::from_oid(self.funcid),
            Datum::from_i16(self.funcargid),
            Datum::from_oid(self.funcargtypid),
        ]
    }
}

/// A row of the Index systable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    /// The index OID.
    pub idxid: Oid,
    /// The OID of the indexed table.
    pub idxtabid: Oid,
    /// The access method.
    pub idxtyp: IdxType,
    /// True if the index enforces key uniqueness.
    pub idxunique: bool,
    /// The file holding the index, or the invalid file ID for in-memory
    /// index types.
    pub idxfid: FileId,
    /// The index name.
    pub idxname: String,
}

impl IndexEntry {
    /// Column index of `idxid`.
    pub const IDXID_COL: FieldId = 0;
    /// Column index of `idxtabid`.
    pub const IDXTABID_COL: FieldId = 1;
    /// Column index of `idxname`.
    pub const IDXNAME_COL: FieldId = 5;
    /// Number of columns.
    pub const NUM_COLS: usize = 6;

    /// Decodes an Index row from its datum vector.
    pub fn from_datums(data: &[Datum<'_>]) -> RillResult<Self> {
        expect_arity("Index", data, Self::NUM_COLS)?;
        let raw_typ = data[2].get_u8();
        let idxtyp = IdxType::from_u8(raw_typ)
            .ok_or_else(|| RillError::corruption(format!("unknown index type {raw_typ}")))?;
        Ok(Self {
            idxid: data[0].get_oid(),
            idxtabid: data[1].get_oid(),
            idxtyp,
            idxunique: data[3].get_bool(),
            idxfid: FileId::new(data[4].get_u32()),
            idxname: decode_name("Index", &data[5])?,
        })
    }

    /// Encodes this row as a datum vector in column order.
    #[must_use]
    pub fn datum_vector(&self) -> Vec<Datum<'_>> {
        vec![
            Datum::from_oid(self.idxid),
            Datum::from_oid(self.idxtabid),
            Datum::from_u8(self.idxtyp.as_u8()),
            Datum::from_bool(self.idxunique),
            Datum::from_u32(self.idxfid.as_u32()),
            Datum::from_varlen_bytes(self.idxname.as_bytes()),
        ]
    }
}

/// A row of the IndexColumn systable: one entry per key column of every
/// index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexColumnEntry {
    /// The OID of the owning index.
    pub idxcolidxid: Oid,
    /// The key column's position in the index, starting at 0.
    pub idxcolid: i16,
    /// The indexed column's position in the table.
    pub idxcoltabcolid: i16,
    /// The less-than comparison function for this key column.
    pub idxcolltfuncid: Oid,
    /// The equality comparison function for this key column.
    pub idxcoleqfuncid: Oid,
}

impl IndexColumnEntry {
    /// Column index of `idxcolidxid`.
    pub const IDXCOLIDXID_COL: FieldId = 0;
    /// Column index of `idxcolid`.
    pub const IDXCOLID_COL: FieldId = 1;
    /// Number of columns.
    pub const NUM_COLS: usize = 5;

    /// Decodes an IndexColumn row from its datum vector.
    pub fn from_datums(data: &[Datum<'_>]) -> RillResult<Self> {
        expect_arity("IndexColumn", data, Self::NUM_COLS)?;
        Ok(Self {
            idxcolidxid: data[0].get_oid(),
            idxcolid: data[1].get_i16(),
            idxcoltabcolid: data[2].get_i16(),
            idxcolltfuncid: data[3].get_oid(),
            idxcoleqfuncid: data[4].get_oid(),
        })
    }

    /// Encodes this row as a datum vector in column order.
    #[must_use]
    pub fn datum_vector(&self) -> Vec<Datum<'_>> {
        vec![
            Datum::from_oid(self.idxcolidxid),
            Datum::from_i16(self.idxcolid),
            Datum::from_i16(self.idxcoltabcolid),
            Datum::from_oid(self.idxcolltfuncid),
            Datum::from_oid(self.idxcoleqfuncid),
        ]
    }
}

/// A row of the Operator systable: the mapping from (operator type, operand
/// types) to the implementing function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperatorEntry {
    /// The operator type.
    pub oprtype: OpType,
    /// The left (or only) operand type OID.
    pub oproparg0typid: Oid,
    /// The right operand type OID, or the invalid OID for unary operators.
    pub oproparg1typid: Oid,
    /// The implementing function.
    pub oprfuncid: Oid,
}

impl OperatorEntry {
    /// Column index of `oprtype`.
    pub const OPRTYPE_COL: FieldId = 0;
    /// Column index of `oproparg0typid`.
    pub const OPRARG0_COL: FieldId = 1;
    /// Column index of `oproparg1typid`.
    pub const OPRARG1_COL: FieldId = 2;
    /// Number of columns.
    pub const NUM_COLS: usize = 4;

    /// Decodes an Operator row from its datum vector.
    pub fn from_datums(data: &[Datum<'_>]) -> RillResult<Self> {
        expect_arity("Operator", data, Self::NUM_COLS)?;
        let raw = data[0].get_u8();
        let oprtype = OpType::from_u8(raw)
            .ok_or_else(|| RillError::corruption(format!("unknown operator type {raw}")))?;
        Ok(Self {
            oprtype,
            oproparg0typid: data[1].get_oid(),
            oproparg1typid: data[2].get_oid(),
            oprfuncid: data[3].get_oid(),
        })
    }

    /// Encodes this row as a datum vector in column order.
    #[must_use]
    pub fn datum_vector(&self) -> Vec<Datum<'_>> {
        vec![
            Datum::from_u8(self.oprtype.as_u8()),
            Datum::from_oid(self.oproparg0typid),
            Datum::from_oid(self.oproparg1typid),
            Datum::from_oid(self.oprfuncid),
        ]
    }
}

/// A decoded systable row of any of the eight systables, shared through a
/// refcounted pointer.
///
/// Cache entries hand these out to callers; the structs are immutable after
/// decode.
#[derive(Debug, Clone)]
pub enum SysTableRow {
    /// A Table row.
    Table(Arc<TableEntry>),
    /// A Type row.
    Type(Arc<TypeEntry>),
    /// A Column row.
    Column(Arc<ColumnEntry>),
    /// A Function row.
    Function(Arc<FunctionEntry>),
    /// A FunctionArgs row.
    FunctionArgs(Arc<FunctionArgsEntry>),
    /// An Index row.
    Index(Arc<IndexEntry>),
    /// An IndexColumn row.
    IndexColumn(Arc<IndexColumnEntry>),
    /// An Operator row.
    Operator(Arc<OperatorEntry>),
}

impl SysTableRow {
    /// Decodes a row of systable `systabid` from its datum vector.
    pub fn decode(systabid: Oid, data: &[Datum<'_>]) -> RillResult<Self> {
        Ok(match systabid {
            initoids::TAB_TABLE => Self::Table(Arc::new(TableEntry::from_datums(data)?)),
            initoids::TAB_TYPE => Self::Type(Arc::new(TypeEntry::from_datums(data)?)),
            initoids::TAB_COLUMN => Self::Column(Arc::new(ColumnEntry::from_datums(data)?)),
            initoids::TAB_FUNCTION => {
                Self::Function(Arc::new(FunctionEntry::from_datums(data)?))
            }
            initoids::TAB_FUNCTION_ARGS => {
                Self::FunctionArgs(Arc::new(FunctionArgsEntry::from_datums(data)?))
            }
            initoids::TAB_INDEX => Self::Index(Arc::new(IndexEntry::from_datums(data)?)),
            initoids::TAB_INDEX_COLUMN => {
                Self::IndexColumn(Arc::new(IndexColumnEntry::from_datums(data)?))
            }
            initoids::TAB_OPERATOR => {
                Self::Operator(Arc::new(OperatorEntry::from_datums(data)?))
            }
            other => {
                return Err(RillError::corruption(format!(
                    "OID {other} does not name a systable"
                )))
            }
        })
    }

    /// Returns the Table row, if this is one.
    #[must_use]
    pub fn as_table(&self) -> Option<Arc<TableEntry>> {
        match self {
            Self::Table(e) => Some(Arc::clone(e)),
            _ => None,
        }
    }

    /// Returns the Type row, if this is one.
    #[must_use]
    pub fn as_type(&self) -> Option<Arc<TypeEntry>> {
        match self {
            Self::Type(e) => Some(Arc::clone(e)),
            _ => None,
        }
    }

    /// Returns the Column row, if this is one.
    #[must_use]
    pub fn as_column(&self) -> Option<Arc<ColumnEntry>> {
        match self {
            Self::Column(e) => Some(Arc::clone(e)),
            _ => None,
        }
    }

    /// Returns the Function row, if this is one.
    #[must_use]
    pub fn as_function(&self) -> Option<Arc<FunctionEntry>> {
        match self {
            Self::Function(e) => Some(Arc::clone(e)),
            _ => None,
        }
    }

    /// Returns the FunctionArgs row, if this is one.
    #[must_use]
    pub fn as_function_args(&self) -> Option<Arc<FunctionArgsEntry>> {
        match self {
            Self::FunctionArgs(e) => Some(Arc::clone(e)),
            _ => None,
        }
    }

    /// Returns the Index row, if this is one.
    #[must_use]
    pub fn as_index(&self) -> Option<Arc<IndexEntry>> {
        match self {
            Self::Index(e) => Some(Arc::clone(e)),
            _ => None,
        }
    }

    /// Returns the IndexColumn row, if this is one.
    #[must_use]
    pub fn as_index_column(&self) -> Option<Arc<IndexColumnEntry>> {
        match self {
            Self::IndexColumn(e) => Some(Arc::clone(e)),
            _ => None,
        }
    }

    /// Returns the Operator row, if this is one.
    #[must_use]
    pub fn as_operator(&self) -> Option<Arc<OperatorEntry>> {
        match self {
            Self::Operator(e) => Some(Arc::clone(e)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_entry_roundtrip() {
        let entry = TableEntry {
            tabid: Oid::new(1),
            tabissys: true,
            tabisvarlen: true,
            tabncols: 6,
            tabfid: FileId::new(2),
            tabname: "Table".to_string(),
        };
        let back = TableEntry::from_datums(&entry.datum_vector()).unwrap();
        assert_eq!(back, entry);
    }

    #[test]
    fn test_type_entry_roundtrip() {
        let entry = TypeEntry {
            typid: initoids::TYP_INT4,
            typlen: 4,
            typisvarlen: false,
            typbyref: false,
            typalign: 4,
            typinfunc: Oid::new(160),
            typoutfunc: Oid::new(161),
            typlenfunc: Oid::INVALID,
            typname: "INT4".to_string(),
        };
        let back = TypeEntry::from_datums(&entry.datum_vector()).unwrap();
        assert_eq!(back, entry);
    }

    #[test]
    fn test_operator_entry_roundtrip() {
        let entry = OperatorEntry {
            oprtype: OpType::Lt,
            oproparg0typid: initoids::TYP_INT4,
            oproparg1typid: initoids::TYP_INT4,
            oprfuncid: Oid::new(170),
        };
        let back = OperatorEntry::from_datums(&entry.datum_vector()).unwrap();
        assert_eq!(back, entry);
    }

    #[test]
    fn test_arity_mismatch_is_corruption() {
        let err = TableEntry::from_datums(&[Datum::from_i32(1)]).unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_systable_row_decode_dispatch() {
        let entry = FunctionArgsEntry {
            funcid: Oid::new(160),
            funcargid: 0,
            funcargtypid: initoids::TYP_STRING,
        };
        let row = SysTableRow::decode(initoids::TAB_FUNCTION_ARGS, &entry.datum_vector()).unwrap();
        assert_eq!(row.as_function_args().unwrap().funcid, Oid::new(160));
        assert!(row.as_table().is_none());
    }
}
