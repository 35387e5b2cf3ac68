//! Well-known OIDs of the objects shipped in the init data.
//!
//! Everything here is in the reserved system OID range. The per-function
//! OIDs of the built-in function families live next to their definitions in
//! [`typsupp`](crate::typsupp); this module names the objects the catalog
//! core itself refers to.

use rill_common::types::Oid;

// =============================================================================
// Systables
// =============================================================================

/// The Table systable.
pub const TAB_TABLE: Oid = Oid::new(1);
/// The Type systable.
pub const TAB_TYPE: Oid = Oid::new(2);
/// The Column systable.
pub const TAB_COLUMN: Oid = Oid::new(3);
/// The Function systable.
pub const TAB_FUNCTION: Oid = Oid::new(4);
/// The FunctionArgs systable.
pub const TAB_FUNCTION_ARGS: Oid = Oid::new(5);
/// The Index systable.
pub const TAB_INDEX: Oid = Oid::new(6);
/// The IndexColumn systable.
pub const TAB_INDEX_COLUMN: Oid = Oid::new(7);
/// The Operator systable.
pub const TAB_OPERATOR: Oid = Oid::new(8);

/// All systable OIDs, in catalog load order. The first four are the
/// bootstrap tables.
pub const ALL_SYSTABLES: &[Oid] = &[
    TAB_TABLE,
    TAB_TYPE,
    TAB_COLUMN,
    TAB_FUNCTION,
    TAB_FUNCTION_ARGS,
    TAB_INDEX,
    TAB_INDEX_COLUMN,
    TAB_OPERATOR,
];

// =============================================================================
// Systable indexes
// =============================================================================

/// Index on Table(tabid).
pub const IDX_TABLE_TABID: Oid = Oid::new(20);
/// Index on Table(tabname).
pub const IDX_TABLE_TABNAME: Oid = Oid::new(21);
/// Index on Type(typid).
pub const IDX_TYPE_TYPID: Oid = Oid::new(22);
/// Index on Column(coltabid, colid).
pub const IDX_COLUMN_COLTABID_COLID: Oid = Oid::new(23);
/// Index on Function(funcid).
pub const IDX_FUNCTION_FUNCID: Oid = Oid::new(24);
/// Index on Function(funcname).
pub const IDX_FUNCTION_FUNCNAME: Oid = Oid::new(25);
/// Index on FunctionArgs(funcid, funcargid).
pub const IDX_FUNCTION_ARGS_FUNCID_FUNCARGID: Oid = Oid::new(26);
/// Index on Index(idxid).
pub const IDX_INDEX_IDXID: Oid = Oid::new(27);
/// Index on Index(idxtabid).
pub const IDX_INDEX_IDXTABID: Oid = Oid::new(28);
/// Index on IndexColumn(idxcolidxid).
pub const IDX_INDEX_COLUMN_IDXCOLIDXID: Oid = Oid::new(29);

// =============================================================================
// Types
// =============================================================================

/// Boolean.
pub const TYP_BOOL: Oid = Oid::new(50);
/// 8-bit signed integer.
pub const TYP_INT1: Oid = Oid::new(51);
/// 16-bit signed integer.
pub const TYP_INT2: Oid = Oid::new(52);
/// 32-bit signed integer.
pub const TYP_INT4: Oid = Oid::new(53);
/// 64-bit signed integer.
pub const TYP_INT8: Oid = Oid::new(54);
/// 8-bit unsigned integer.
pub const TYP_UINT1: Oid = Oid::new(55);
/// 16-bit unsigned integer.
pub const TYP_UINT2: Oid = Oid::new(56);
/// 32-bit unsigned integer.
pub const TYP_UINT4: Oid = Oid::new(57);
/// 64-bit unsigned integer.
pub const TYP_UINT8: Oid = Oid::new(58);
/// Single-precision floating point.
pub const TYP_FLOAT: Oid = Oid::new(59);
/// Double-precision floating point.
pub const TYP_DOUBLE: Oid = Oid::new(60);
/// Object identifier.
pub const TYP_OID: Oid = Oid::new(61);
/// Fixed-width character string `CHAR(n)`.
pub const TYP_CHAR: Oid = Oid::new(62);
/// Variable-width character string `VARCHAR(n)`.
pub const TYP_VARCHAR: Oid = Oid::new(63);
/// The internal string type used as the text carrier of type input and
/// output functions. Never stored in a table.
pub const TYP_STRING: Oid = Oid::new(64);

// =============================================================================
// Functions the catalog core calls by OID
// =============================================================================

/// `OID_eq`, the equality function for OID-typed predicates.
pub const FUNC_OID_EQ: Oid = Oid::new(322);
/// `INT2_eq`, the equality function for INT2-typed predicates.
pub const FUNC_INT2_EQ: Oid = Oid::new(148);
/// `UINT1_eq`, the equality function for UINT1-typed predicates.
pub const FUNC_UINT1_EQ: Oid = Oid::new(207);
/// `CHAR_typlen`, the type length function of `CHAR(n)`.
pub const FUNC_CHAR_TYPLEN: Oid = Oid::new(342);
/// `VARCHAR___STRING_eq_ci`, the case-insensitive comparison of a VARCHAR
/// field against an internal string. Used for all name lookups.
pub const FUNC_VARCHAR_STR_EQ_CI: Oid = Oid::new(377);

/// Maximum length of an object name (`VARCHAR` type parameter of the name
/// columns of the systables).
pub const NAME_LEN: u64 = 64;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_in_system_range() {
        for oid in ALL_SYSTABLES {
            assert!(oid.is_system());
        }
        assert!(TYP_VARCHAR.is_system());
        assert!(FUNC_VARCHAR_STR_EQ_CI.is_system());
    }

    #[test]
    fn test_systables_distinct() {
        let mut seen = std::collections::HashSet::new();
        for oid in ALL_SYSTABLES {
            assert!(seen.insert(*oid));
        }
    }
}
