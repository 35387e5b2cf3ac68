//! Built-in support functions for the SQL types.
//!
//! Each submodule contributes a `DEFS` table of [`BuiltinDef`] entries; the
//! whole collection is what the function registry and the Function,
//! FunctionArgs and Operator systable rows are built from. Function OIDs
//! are assigned in per-type blocks and must be unique across the whole
//! table, which the registry checks when it is built.

use rill_common::types::{Datum, Oid};
use rill_common::{RillError, RillResult};

use crate::fmgr::{FunctionCallInfo, FunctionPtr};
use crate::optypes::OpType;

mod boolean;
mod charn;
mod float;
mod integer;
mod oid;
mod varchar;

/// One built-in function: its catalog identity plus its callable.
#[derive(Debug, Clone, Copy)]
pub struct BuiltinDef {
    /// The function OID.
    pub oid: Oid,
    /// The function name, as registered in the Function systable.
    pub name: &'static str,
    /// The OID of the return type.
    pub rettype: Oid,
    /// The OIDs of the argument types.
    pub argtypes: &'static [Oid],
    /// The operator this function implements, if any.
    pub opr: Option<OpType>,
    /// The callable.
    pub func: FunctionPtr,
}

/// Returns the full table of built-in function definitions.
#[must_use]
pub fn builtin_defs() -> Vec<&'static BuiltinDef> {
    let mut defs: Vec<&'static BuiltinDef> = Vec::new();
    defs.extend(boolean::DEFS);
    for family in integer::DEFS {
        defs.extend(*family);
    }
    for family in float::DEFS {
        defs.extend(*family);
    }
    defs.extend(oid::DEFS);
    defs.extend(charn::DEFS);
    defs.extend(varchar::DEFS);
    defs
}

/// Reads argument `n` as a string slice.
///
/// Fails with an invalid-argument error when the bytes are not UTF-8; text
/// function arguments always travel as the internal string type.
fn text_arg<'a>(fcinfo: &FunctionCallInfo<'a>, n: usize) -> RillResult<&'a str> {
    std::str::from_utf8(fcinfo.arg(n).varlen_bytes())
        .map_err(|_| RillError::invalid_argument("text argument is not valid UTF-8"))
}

/// Returns a datum owning the bytes of `s`.
fn owned_text(s: String) -> Datum<'static> {
    Datum::from_varlen_owned(s.into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_builtin_oids_unique() {
        let mut seen = HashSet::new();
        for def in builtin_defs() {
            assert!(seen.insert(def.oid), "duplicate builtin OID {}", def.oid);
            assert!(def.oid.is_system());
        }
    }

    #[test]
    fn test_builtin_names_unique() {
        let mut seen = HashSet::new();
        for def in builtin_defs() {
            assert!(seen.insert(def.name), "duplicate builtin name {}", def.name);
        }
    }

    #[test]
    fn test_operator_defs_have_operator_arity() {
        for def in builtin_defs() {
            if let Some(op) = def.opr {
                if op.is_unary() {
                    assert_eq!(def.argtypes.len(), 1, "{}", def.name);
                } else if op.is_binary() {
                    assert_eq!(def.argtypes.len(), 2, "{}", def.name);
                }
            }
        }
    }
}
