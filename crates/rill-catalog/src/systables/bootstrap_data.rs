//! Hard-coded rows of the system catalog.
//!
//! The bootstrap catalog is built from these arrays; the init data file is
//! rendered from them as well, so the stored catalog and the in-memory
//! bootstrap can never drift apart. Function, FunctionArgs and Operator
//! rows are derived from the built-in function table instead of being
//! written out by hand.

use rill_common::types::{FileId, Oid};

use crate::idxtyps::IdxType;
use crate::typsupp::builtin_defs;

use super::initoids::*;
use super::{
    ColumnEntry, FunctionArgsEntry, FunctionEntry, IndexColumnEntry, IndexEntry, OperatorEntry,
    TableEntry, TypeEntry,
};

fn table(tabid: Oid, tabisvarlen: bool, tabncols: i16, tabname: &str) -> TableEntry {
    TableEntry {
        tabid,
        tabissys: true,
        tabisvarlen,
        tabncols,
        // Systable file IDs are allocated when the catalog files are
        // created; the stored rows are patched then and the meta page is
        // the authoritative mapping.
        tabfid: FileId::INVALID,
        tabname: tabname.to_string(),
    }
}

/// The Table rows of the eight systables.
#[must_use]
pub fn tables() -> Vec<TableEntry> {
    vec![
        table(TAB_TABLE, true, 6, "Table"),
        table(TAB_TYPE, true, 9, "Type"),
        table(TAB_COLUMN, true, 7, "Column"),
        table(TAB_FUNCTION, true, 4, "Function"),
        table(TAB_FUNCTION_ARGS, false, 3, "FunctionArgs"),
        table(TAB_INDEX, true, 6, "Index"),
        table(TAB_INDEX_COLUMN, false, 5, "IndexColumn"),
        table(TAB_OPERATOR, false, 4, "Operator"),
    ]
}

#[allow(clippy::too_many_arguments)]
fn typ(
    typid: Oid,
    typlen: i16,
    typisvarlen: bool,
    typbyref: bool,
    typalign: u8,
    typinfunc: u32,
    typoutfunc: u32,
    typlenfunc: u32,
    typname: &str,
) -> TypeEntry {
    TypeEntry {
        typid,
        typlen,
        typisvarlen,
        typbyref,
        typalign,
        typinfunc: Oid::new(typinfunc),
        typoutfunc: Oid::new(typoutfunc),
        typlenfunc: Oid::new(typlenfunc),
        typname: typname.to_string(),
    }
}

/// The Type rows of the built-in types.
#[must_use]
pub fn types() -> Vec<TypeEntry> {
    vec![
        typ(TYP_BOOL, 1, false, false, 1, 100, 101, 0, "BOOL"),
        typ(TYP_INT1, 1, false, false, 1, 120, 121, 0, "INT1"),
        typ(TYP_INT2, 2, false, false, 2, 140, 141, 0, "INT2"),
        typ(TYP_INT4, 4, false, false, 4, 160, 161, 0, "INT4"),
        typ(TYP_INT8, 8, false, false, 8, 180, 181, 0, "INT8"),
        typ(TYP_UINT1, 1, false, false, 1, 200, 201, 0, "UINT1"),
        typ(TYP_UINT2, 2, false, false, 2, 220, 221, 0, "UINT2"),
        typ(TYP_UINT4, 4, false, false, 4, 240, 241, 0, "UINT4"),
        typ(TYP_UINT8, 8, false, false, 8, 260, 261, 0, "UINT8"),
        typ(TYP_FLOAT, 4, false, false, 4, 280, 281, 0, "FLOAT"),
        typ(TYP_DOUBLE, 8, false, false, 8, 300, 301, 0, "DOUBLE"),
        typ(TYP_OID, 4, false, false, 4, 320, 321, 0, "OID"),
        // CHAR(n) is fixed-length but the length comes from the type
        // parameter through CHAR_typlen, so no constant length is cached.
        typ(TYP_CHAR, -1, false, true, 1, 340, 341, 342, "CHAR"),
        typ(TYP_VARCHAR, -1, true, true, 1, 360, 361, 0, "VARCHAR"),
        // The internal string type is the text carrier of the type input
        // and output functions; it is never stored in a table.
        typ(TYP_STRING, -1, true, true, 1, 0, 0, 0, "__STRING"),
    ]
}

fn col(coltabid: Oid, colid: i16, coltypid: Oid, coltypparam: u64, colname: &str) -> ColumnEntry {
    ColumnEntry {
        coltabid,
        colid,
        coltypid,
        coltypparam,
        colisnullable: false,
        colisarray: false,
        colname: colname.to_string(),
    }
}

/// The Column rows of the eight systables, grouped by table in column
/// order.
#[must_use]
pub fn columns() -> Vec<ColumnEntry> {
    vec![
        // Table
        col(TAB_TABLE, 0, TYP_OID, 0, "tabid"),
        col(TAB_TABLE, 1, TYP_BOOL, 0, "tabissys"),
        col(TAB_TABLE, 2, TYP_BOOL, 0, "tabisvarlen"),
        col(TAB_TABLE, 3, TYP_INT2, 0, "tabncols"),
        col(TAB_TABLE, 4, TYP_UINT4, 0, "tabfid"),
        col(TAB_TABLE, 5, TYP_VARCHAR, NAME_LEN, "tabname"),
        // Type
        col(TAB_TYPE, 0, TYP_OID, 0, "typid"),
        col(TAB_TYPE, 1, TYP_INT2, 0, "typlen"),
        col(TAB_TYPE, 2, TYP_BOOL, 0, "typisvarlen"),
        col(TAB_TYPE, 3, TYP_BOOL, 0, "typbyref"),
        col(TAB_TYPE, 4, TYP_UINT1, 0, "typalign"),
        col(TAB_TYPE, 5, TYP_OID, 0, "typinfunc"),
        col(TAB_TYPE, 6, TYP_OID, 0, "typoutfunc"),
        col(TAB_TYPE, 7, TYP_OID, 0, "typlenfunc"),
        col(TAB_TYPE, 8, TYP_VARCHAR, NAME_LEN, "typname"),
        // Column
        col(TAB_COLUMN, 0, TYP_OID, 0, "coltabid"),
        col(TAB_COLUMN, 1, TYP_INT2, 0, "colid"),
        col(TAB_COLUMN, 2, TYP_OID, 0, "coltypid"),
        col(TAB_COLUMN, 3, TYP_UINT8, 0, "coltypparam"),
        col(TAB_COLUMN, 4, TYP_BOOL, 0, "colisnullable"),
        col(TAB_COLUMN, 5, TYP_BOOL, 0, "colisarray"),
        col(TAB_COLUMN, 6, TYP_VARCHAR, NAME_LEN, "colname"),
        // Function
        col(TAB_FUNCTION, 0, TYP_OID, 0, "funcid"),
        col(TAB_FUNCTION, 1, TYP_INT2, 0, "funcnargs"),
        col(TAB_FUNCTION, 2, TYP_OID, 0, "funcrettypid"),
        col(TAB_FUNCTION, 3, TYP_VARCHAR, NAME_LEN, "funcname"),
        // FunctionArgs
        col(TAB_FUNCTION_ARGS, 0, TYP_OID, 0, "funcid"),
        col(TAB_FUNCTION_ARGS, 1, TYP_INT2, 0, "funcargid"),
        col(TAB_FUNCTION_ARGS, 2, TYP_OID, 0, "funcargtypid"),
        // Index
        col(TAB_INDEX, 0, TYP_OID, 0, "idxid"),
        col(TAB_INDEX, 1, TYP_OID, 0, "idxtabid"),
        col(TAB_INDEX, 2, TYP_UINT1, 0, "idxtyp"),
        col(TAB_INDEX, 3, TYP_BOOL, 0, "idxunique"),
        col(TAB_INDEX, 4, TYP_UINT4, 0, "idxfid"),
        col(TAB_INDEX, 5, TYP_VARCHAR, NAME_LEN, "idxname"),
        // IndexColumn
        col(TAB_INDEX_COLUMN, 0, TYP_OID, 0, "idxcolidxid"),
        col(TAB_INDEX_COLUMN, 1, TYP_INT2, 0, "idxcolid"),
        col(TAB_INDEX_COLUMN, 2, TYP_INT2, 0, "idxcoltabcolid"),
        col(TAB_INDEX_COLUMN, 3, TYP_OID, 0, "idxcolltfuncid"),
        col(TAB_INDEX_COLUMN, 4, TYP_OID, 0, "idxcoleqfuncid"),
        // Operator
        col(TAB_OPERATOR, 0, TYP_UINT1, 0, "oprtype"),
        col(TAB_OPERATOR, 1, TYP_OID, 0, "oproparg0typid"),
        col(TAB_OPERATOR, 2, TYP_OID, 0, "oproparg1typid"),
        col(TAB_OPERATOR, 3, TYP_OID, 0, "oprfuncid"),
    ]
}

/// The Function rows, one per built-in function.
#[must_use]
pub fn functions() -> Vec<FunctionEntry> {
    builtin_defs()
        .into_iter()
        .map(|def| FunctionEntry {
            funcid: def.oid,
            funcnargs: def.argtypes.len() as i16,
            funcrettypid: def.rettype,
            funcname: def.name.to_string(),
        })
        .collect()
}

/// The FunctionArgs rows, one per (built-in function, argument) pair.
#[must_use]
pub fn function_args() -> Vec<FunctionArgsEntry> {
    let mut rows = Vec::new();
    for def in builtin_defs() {
        for (i, &argtyp) in def.argtypes.iter().enumerate() {
            rows.push(FunctionArgsEntry {
                funcid: def.oid,
                funcargid: i as i16,
                funcargtypid: argtyp,
            });
        }
    }
    rows
}

/// The Operator rows, one per built-in function that implements an
/// operator.
#[must_use]
pub fn operators() -> Vec<OperatorEntry> {
    builtin_defs()
        .into_iter()
        .filter_map(|def| {
            def.opr.map(|oprtype| OperatorEntry {
                oprtype,
                oproparg0typid: def.argtypes[0],
                oproparg1typid: def.argtypes.get(1).copied().unwrap_or(Oid::INVALID),
                oprfuncid: def.oid,
            })
        })
        .collect()
}

struct IdxDef {
    idxid: Oid,
    idxtabid: Oid,
    idxunique: bool,
    idxname: &'static str,
    /// (table column, less-than function, equality function)
    keys: &'static [(i16, Oid, Oid)],
}

const FUNC_OID_LT: Oid = Oid::new(324);
const FUNC_INT2_LT: Oid = Oid::new(150);
const FUNC_VARCHAR_LT_CI: Oid = Oid::new(372);
const FUNC_VARCHAR_EQ_CI: Oid = Oid::new(370);

/// The catalog's own indexes. Name columns compare case-insensitively.
const CATALOG_INDEXES: &[IdxDef] = &[
    IdxDef {
        idxid: IDX_TABLE_TABID,
        idxtabid: TAB_TABLE,
        idxunique: true,
        idxname: "Table_tabid",
        keys: &[(0, FUNC_OID_LT, FUNC_OID_EQ)],
    },
    IdxDef {
        idxid: IDX_TABLE_TABNAME,
        idxtabid: TAB_TABLE,
        idxunique: true,
        idxname: "Table_tabname",
        keys: &[(5, FUNC_VARCHAR_LT_CI, FUNC_VARCHAR_EQ_CI)],
    },
    IdxDef {
        idxid: IDX_TYPE_TYPID,
        idxtabid: TAB_TYPE,
        idxunique: true,
        idxname: "Type_typid",
        keys: &[(0, FUNC_OID_LT, FUNC_OID_EQ)],
    },
    IdxDef {
        idxid: IDX_COLUMN_COLTABID_COLID,
        idxtabid: TAB_COLUMN,
        idxunique: true,
        idxname: "Column_coltabid_colid",
        keys: &[
            (0, FUNC_OID_LT, FUNC_OID_EQ),
            (1, FUNC_INT2_LT, FUNC_INT2_EQ),
        ],
    },
    IdxDef {
        idxid: IDX_FUNCTION_FUNCID,
        idxtabid: TAB_FUNCTION,
        idxunique: true,
        idxname: "Function_funcid",
        keys: &[(0, FUNC_OID_LT, FUNC_OID_EQ)],
    },
    IdxDef {
        idxid: IDX_FUNCTION_FUNCNAME,
        idxtabid: TAB_FUNCTION,
        idxunique: true,
        idxname: "Function_funcname",
        keys: &[(3, FUNC_VARCHAR_LT_CI, FUNC_VARCHAR_EQ_CI)],
    },
    IdxDef {
        idxid: IDX_FUNCTION_ARGS_FUNCID_FUNCARGID,
        idxtabid: TAB_FUNCTION_ARGS,
        idxunique: true,
        idxname: "FunctionArgs_funcid_funcargid",
        keys: &[
            (0, FUNC_OID_LT, FUNC_OID_EQ),
            (1, FUNC_INT2_LT, FUNC_INT2_EQ),
        ],
    },
    IdxDef {
        idxid: IDX_INDEX_IDXID,
        idxtabid: TAB_INDEX,
        idxunique: true,
        idxname: "Index_idxid",
        keys: &[(0, FUNC_OID_LT, FUNC_OID_EQ)],
    },
    IdxDef {
        idxid: IDX_INDEX_IDXTABID,
        idxtabid: TAB_INDEX,
        idxunique: false,
        idxname: "Index_idxtabid",
        keys: &[(1, FUNC_OID_LT, FUNC_OID_EQ)],
    },
    IdxDef {
        idxid: IDX_INDEX_COLUMN_IDXCOLIDXID,
        idxtabid: TAB_INDEX_COLUMN,
        idxunique: false,
        idxname: "IndexColumn_idxcolidxid",
        keys: &[(0, FUNC_OID_LT, FUNC_OID_EQ)],
    },
];

/// The Index rows of the catalog's own indexes.
#[must_use]
pub fn indexes() -> Vec<IndexEntry> {
    CATALOG_INDEXES
        .iter()
        .map(|def| IndexEntry {
            idxid: def.idxid,
            idxtabid: def.idxtabid,
            idxtyp: IdxType::VolatileTree,
            idxunique: def.idxunique,
            idxfid: FileId::INVALID,
            idxname: def.idxname.to_string(),
        })
        .collect()
}

/// The IndexColumn rows of the catalog's own indexes.
#[must_use]
pub fn index_columns() -> Vec<IndexColumnEntry> {
    let mut rows = Vec::new();
    for def in CATALOG_INDEXES {
        for (i, &(tabcol, ltfunc, eqfunc)) in def.keys.iter().enumerate() {
            rows.push(IndexColumnEntry {
                idxcolidxid: def.idxid,
                idxcolid: i as i16,
                idxcoltabcolid: tabcol,
                idxcolltfuncid: ltfunc,
                idxcoleqfuncid: eqfunc,
            });
        }
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_counts_match_table_rows() {
        let cols = columns();
        for tab in tables() {
            let n = cols.iter().filter(|c| c.coltabid == tab.tabid).count();
            assert_eq!(n as i16, tab.tabncols, "table {}", tab.tabname);
        }
    }

    #[test]
    fn test_column_ids_dense_and_ordered() {
        let cols = columns();
        for tab in tables() {
            let ids: Vec<i16> = cols
                .iter()
                .filter(|c| c.coltabid == tab.tabid)
                .map(|c| c.colid)
                .collect();
            let expected: Vec<i16> = (0..ids.len() as i16).collect();
            assert_eq!(ids, expected, "table {}", tab.tabname);
        }
    }

    #[test]
    fn test_tabisvarlen_matches_columns() {
        let cols = columns();
        let types = types();
        for tab in tables() {
            let has_varlen = cols
                .iter()
                .filter(|c| c.coltabid == tab.tabid)
                .any(|c| types.iter().any(|t| t.typid == c.coltypid && t.typisvarlen));
            assert_eq!(has_varlen, tab.tabisvarlen, "table {}", tab.tabname);
        }
    }

    #[test]
    fn test_type_support_functions_exist() {
        let defs = crate::typsupp::builtin_defs();
        let by_oid = |oid: Oid| defs.iter().find(|d| d.oid == oid).copied();

        for t in types() {
            if t.typinfunc.is_valid() {
                let def = by_oid(t.typinfunc).expect("typinfunc registered");
                assert!(def.name.ends_with("_in"), "{} in-func {}", t.typname, def.name);
            }
            if t.typoutfunc.is_valid() {
                let def = by_oid(t.typoutfunc).expect("typoutfunc registered");
                assert!(def.name.ends_with("_out"), "{}", t.typname);
            }
            if t.typlenfunc.is_valid() {
                let def = by_oid(t.typlenfunc).expect("typlenfunc registered");
                assert!(def.name.ends_with("_typlen"), "{}", t.typname);
            }
        }
    }

    #[test]
    fn test_index_keys_reference_real_columns() {
        let cols = columns();
        for idx in indexes() {
            for key in index_columns()
                .iter()
                .filter(|k| k.idxcolidxid == idx.idxid)
            {
                assert!(
                    cols.iter()
                        .any(|c| c.coltabid == idx.idxtabid && c.colid == key.idxcoltabcolid),
                    "index {}",
                    idx.idxname
                );
            }
        }
    }

    #[test]
    fn test_operator_rows_cover_default_comparisons() {
        let ops = operators();
        use crate::optypes::OpType;
        // Every storable type with comparisons has a default < and =.
        for t in [TYP_INT4, TYP_VARCHAR, TYP_OID, TYP_BOOL] {
            assert!(ops
                .iter()
                .any(|o| o.oprtype == OpType::Lt && o.oproparg0typid == t));
            assert!(ops
                .iter()
                .any(|o| o.oprtype == OpType::Eq && o.oproparg0typid == t));
        }
    }
}
