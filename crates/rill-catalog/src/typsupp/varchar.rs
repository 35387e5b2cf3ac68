//! Built-in support functions for `VARCHAR(n)`.
//!
//! A `VARCHAR(n)` datum of length `l <= n` is stored as an array of `l`
//! bytes. Besides the plain byte-wise comparisons there is a
//! case-insensitive family, and two functions comparing a `VARCHAR` field
//! against an internal string; the case-insensitive one of those is what
//! the catalog cache uses for all name lookups.

use std::cmp::Ordering;

use rill_common::types::{Datum, FieldOffset, Oid};
use rill_common::{RillError, RillResult};

use crate::fmgr::FunctionCallInfo;
use crate::optypes::OpType;
use crate::systables::initoids::{TYP_BOOL, TYP_CHAR, TYP_INT2, TYP_STRING, TYP_VARCHAR};

use super::BuiltinDef;

/// ASCII case-insensitive equality.
pub(crate) fn bytes_eq_ci(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len()
        && a.iter()
            .zip(b.iter())
            .all(|(x, y)| x.to_ascii_lowercase() == y.to_ascii_lowercase())
}

/// ASCII case-insensitive lexicographic comparison.
pub(crate) fn bytes_cmp_ci(a: &[u8], b: &[u8]) -> Ordering {
    let la = a.iter().map(u8::to_ascii_lowercase);
    let lb = b.iter().map(u8::to_ascii_lowercase);
    la.cmp(lb)
}

fn varchar_in(fcinfo: &FunctionCallInfo<'_>) -> RillResult<Datum<'static>> {
    if fcinfo.arg(0).is_null() {
        return Ok(Datum::null());
    }

    let bytes = fcinfo.arg(0).varlen_bytes();
    let max_size = fcinfo.typparam as usize;

    // Remove trailing spaces if the given string is longer than the
    // declared maximum; anything else over-length is rejected.
    let mut size = bytes.len();
    while size > max_size && bytes[size - 1] == b' ' {
        size -= 1;
    }
    if size > max_size {
        return Err(RillError::invalid_argument(format!(
            "the length {size} of the given string exceeds the specified maximum {max_size}"
        )));
    }

    Ok(Datum::from_varlen_owned(bytes[..size].to_vec()))
}

fn varchar_out(fcinfo: &FunctionCallInfo<'_>) -> RillResult<Datum<'static>> {
    if fcinfo.arg(0).is_null() {
        return Ok(Datum::null());
    }
    Ok(Datum::from_varlen_owned(fcinfo.arg(0).varlen_bytes().to_vec()))
}

fn varchar_length(fcinfo: &FunctionCallInfo<'_>) -> RillResult<Datum<'static>> {
    if fcinfo.arg(0).is_null() {
        return Ok(Datum::null());
    }
    Ok(Datum::from_i16(fcinfo.arg(0).varlen_len() as i16))
}

fn varchar_concat(fcinfo: &FunctionCallInfo<'_>) -> RillResult<Datum<'static>> {
    if fcinfo.arg(0).is_null() || fcinfo.arg(1).is_null() {
        return Ok(Datum::null());
    }

    let a = fcinfo.arg(0).varlen_bytes();
    let b = fcinfo.arg(1).varlen_bytes();
    let new_len = a.len() + b.len();
    if new_len > FieldOffset::MAX as usize {
        return Err(RillError::invalid_argument(format!(
            "string too long: {new_len}"
        )));
    }

    let mut buf = Vec::with_capacity(new_len);
    buf.extend_from_slice(a);
    buf.extend_from_slice(b);
    Ok(Datum::from_varlen_owned(buf))
}

fn varchar_to_char(fcinfo: &FunctionCallInfo<'_>) -> RillResult<Datum<'static>> {
    if fcinfo.arg(0).is_null() {
        return Ok(Datum::null());
    }

    let bytes = fcinfo.arg(0).varlen_bytes();
    let max_size = fcinfo.typparam as usize;
    let max_size = if max_size == 0 { bytes.len() } else { max_size };

    let keep = bytes.len().min(max_size);
    let mut buf = vec![b' '; max_size];
    buf[..keep].copy_from_slice(&bytes[..keep]);
    Ok(Datum::from_varlen_owned(buf))
}

macro_rules! varchar_cmp_fn {
    ($name:ident, $cmp:ident) => {
        fn $name(fcinfo: &FunctionCallInfo<'_>) -> RillResult<Datum<'static>> {
            if fcinfo.arg(0).is_null() || fcinfo.arg(1).is_null() {
                return Ok(Datum::null());
            }
            Ok(Datum::from_bool(
                fcinfo.arg(0).varlen_bytes().$cmp(fcinfo.arg(1).varlen_bytes()),
            ))
        }
    };
}

varchar_cmp_fn!(varchar_eq, eq);
varchar_cmp_fn!(varchar_ne, ne);
varchar_cmp_fn!(varchar_lt, lt);
varchar_cmp_fn!(varchar_le, le);
varchar_cmp_fn!(varchar_gt, gt);
varchar_cmp_fn!(varchar_ge, ge);

macro_rules! varchar_cmp_ci_fn {
    ($name:ident, $($ord:pat_param)|+) => {
        fn $name(fcinfo: &FunctionCallInfo<'_>) -> RillResult<Datum<'static>> {
            if fcinfo.arg(0).is_null() || fcinfo.arg(1).is_null() {
                return Ok(Datum::null());
            }
            let ord = bytes_cmp_ci(
                fcinfo.arg(0).varlen_bytes(),
                fcinfo.arg(1).varlen_bytes(),
            );
            Ok(Datum::from_bool(matches!(ord, $($ord)|+)))
        }
    };
}

varchar_cmp_ci_fn!(varchar_eq_ci, Ordering::Equal);
varchar_cmp_ci_fn!(varchar_ne_ci, Ordering::Less | Ordering::Greater);
varchar_cmp_ci_fn!(varchar_lt_ci, Ordering::Less);
varchar_cmp_ci_fn!(varchar_le_ci, Ordering::Less | Ordering::Equal);
varchar_cmp_ci_fn!(varchar_gt_ci, Ordering::Greater);
varchar_cmp_ci_fn!(varchar_ge_ci, Ordering::Greater | Ordering::Equal);

/// Compares a `VARCHAR` field to an internal string.
fn varchar_str_eq(fcinfo: &FunctionCallInfo<'_>) -> RillResult<Datum<'static>> {
    if fcinfo.arg(0).is_null() || fcinfo.arg(1).is_null() {
        return Ok(Datum::null());
    }
    Ok(Datum::from_bool(
        fcinfo.arg(0).varlen_bytes() == fcinfo.arg(1).varlen_bytes(),
    ))
}

/// Case-insensitively compares a `VARCHAR` field to an internal string.
fn varchar_str_eq_ci(fcinfo: &FunctionCallInfo<'_>) -> RillResult<Datum<'static>> {
    if fcinfo.arg(0).is_null() || fcinfo.arg(1).is_null() {
        return Ok(Datum::null());
    }
    Ok(Datum::from_bool(bytes_eq_ci(
        fcinfo.arg(0).varlen_bytes(),
        fcinfo.arg(1).varlen_bytes(),
    )))
}

pub(super) const DEFS: &[BuiltinDef] = &[
    BuiltinDef {
        oid: Oid::new(360),
        name: "VARCHAR_in",
        rettype: TYP_VARCHAR,
        argtypes: &[TYP_STRING],
        opr: None,
        func: varchar_in,
    },
    BuiltinDef {
        oid: Oid::new(361),
        name: "VARCHAR_out",
        rettype: TYP_STRING,
        argtypes: &[TYP_VARCHAR],
        opr: None,
        func: varchar_out,
    },
    BuiltinDef {
        oid: Oid::new(362),
        name: "VARCHAR_length",
        rettype: TYP_INT2,
        argtypes: &[TYP_VARCHAR],
        opr: None,
        func: varchar_length,
    },
    BuiltinDef {
        oid: Oid::new(363),
        name: "VARCHAR_concat",
        rettype: TYP_VARCHAR,
        argtypes: &[TYP_VARCHAR, TYP_VARCHAR],
        opr: Some(OpType::Add),
        func: varchar_concat,
    },
    BuiltinDef {
        oid: Oid::new(364),
        name: "VARCHAR_eq",
        rettype: TYP_BOOL,
        argtypes: &[TYP_VARCHAR, TYP_VARCHAR],
        opr: Some(OpType::Eq),
        func: varchar_eq,
    },
    BuiltinDef {
        oid: Oid::new(365),
        name: "VARCHAR_ne",
        rettype: TYP_BOOL,
        argtypes: &[TYP_VARCHAR, TYP_VARCHAR],
        opr: Some(OpType::Ne),
        func: varchar_ne,
    },
    BuiltinDef {
        oid: Oid::new(366),
        name: "VARCHAR_lt",
        rettype: TYP_BOOL,
        argtypes: &[TYP_VARCHAR, TYP_VARCHAR],
        opr: Some(OpType::Lt),
        func: varchar_lt,
    },
    BuiltinDef {
        oid: Oid::new(367),
        name: "VARCHAR_le",
        rettype: TYP_BOOL,
        argtypes: &[TYP_VARCHAR, TYP_VARCHAR],
        opr: Some(OpType::Le),
        func: varchar_le,
    },
    BuiltinDef {
        oid: Oid::new(368),
        name: "VARCHAR_gt",
        rettype: TYP_BOOL,
        argtypes: &[TYP_VARCHAR, TYP_VARCHAR],
        opr: Some(OpType::Gt),
        func: varchar_gt,
    },
    BuiltinDef {
        oid: Oid::new(369),
        name: "VARCHAR_ge",
        rettype: TYP_BOOL,
        argtypes: &[TYP_VARCHAR, TYP_VARCHAR],
        opr: Some(OpType::Ge),
        func: varchar_ge,
    },
    BuiltinDef {
        oid: Oid::new(370),
        name: "VARCHAR_eq_ci",
        rettype: TYP_BOOL,
        argtypes: &[TYP_VARCHAR, TYP_VARCHAR],
        opr: None,
        func: varchar_eq_ci,
    },
    BuiltinDef {
        oid: Oid::new(371),
        name: "VARCHAR_ne_ci",
        rettype: TYP_BOOL,
        argtypes: &[TYP_VARCHAR, TYP_VARCHAR],
        opr: None,
        func: varchar_ne_ci,
    },
    BuiltinDef {
        oid: Oid::new(372),
        name: "VARCHAR_lt_ci",
        rettype: TYP_BOOL,
        argtypes: &[TYP_VARCHAR, TYP_VARCHAR],
        opr: None,
        func: varchar_lt_ci,
    },
    BuiltinDef {
        oid: Oid::new(373),
        name: "VARCHAR_le_ci",
        rettype: TYP_BOOL,
        argtypes: &[TYP_VARCHAR, TYP_VARCHAR],
        opr: None,
        func: varchar_le_ci,
    },
    BuiltinDef {
        oid: Oid::new(374),
        name: "VARCHAR_gt_ci",
        rettype: TYP_BOOL,
        argtypes: &[TYP_VARCHAR, TYP_VARCHAR],
        opr: None,
        func: varchar_gt_ci,
    },
    BuiltinDef {
        oid: Oid::new(375),
        name: "VARCHAR_ge_ci",
        rettype: TYP_BOOL,
        argtypes: &[TYP_VARCHAR, TYP_VARCHAR],
        opr: None,
        func: varchar_ge_ci,
    },
    BuiltinDef {
        oid: Oid::new(376),
        name: "VARCHAR___STRING_eq",
        rettype: TYP_BOOL,
        argtypes: &[TYP_VARCHAR, TYP_STRING],
        opr: None,
        func: varchar_str_eq,
    },
    BuiltinDef {
        oid: Oid::new(377),
        name: "VARCHAR___STRING_eq_ci",
        rettype: TYP_BOOL,
        argtypes: &[TYP_VARCHAR, TYP_STRING],
        opr: None,
        func: varchar_str_eq_ci,
    },
    BuiltinDef {
        oid: Oid::new(378),
        name: "VARCHAR_to_CHAR",
        rettype: TYP_CHAR,
        argtypes: &[TYP_VARCHAR],
        opr: Some(OpType::Cast),
        func: varchar_to_char,
    },
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fmgr::{function_call, function_call_with_typparam};
    use rill_common::types::NullableDatumRef;

    fn varchar_in_call(s: &str, n: u64) -> RillResult<Datum<'static>> {
        let text = Datum::from_cstr(s).unwrap();
        let args = [NullableDatumRef::from(&text)];
        function_call_with_typparam(varchar_in, n, &args)
    }

    #[test]
    fn test_varchar_in_accepts_within_limit() {
        let v = varchar_in_call("hello", 10).unwrap();
        assert_eq!(v.varlen_bytes(), b"hello");
    }

    #[test]
    fn test_varchar_in_truncates_trailing_spaces_only() {
        let v = varchar_in_call("abc   ", 4).unwrap();
        assert_eq!(v.varlen_bytes(), b"abc");
        assert!(varchar_in_call("abcde", 4).is_err());
    }

    #[test]
    fn test_varchar_out_roundtrip() {
        let v = varchar_in_call("RillDB", 16).unwrap();
        let args = [NullableDatumRef::from(&v)];
        let out = function_call(varchar_out, &args).unwrap();
        assert_eq!(out.varlen_bytes(), b"RillDB");
    }

    #[test]
    fn test_varchar_concat_and_length() {
        let a = Datum::from_varlen_owned(b"foo".to_vec());
        let b = Datum::from_varlen_owned(b"bar".to_vec());
        let args = [NullableDatumRef::from(&a), NullableDatumRef::from(&b)];
        let joined = function_call(varchar_concat, &args).unwrap();
        assert_eq!(joined.varlen_bytes(), b"foobar");

        let args = [NullableDatumRef::from(&joined)];
        assert_eq!(function_call(varchar_length, &args).unwrap().get_i16(), 6);
    }

    #[test]
    fn test_case_insensitive_family() {
        let a = Datum::from_varlen_owned(b"Alpha".to_vec());
        let b = Datum::from_varlen_owned(b"aLPHA".to_vec());
        let args = [NullableDatumRef::from(&a), NullableDatumRef::from(&b)];
        assert!(function_call(varchar_eq_ci, &args).unwrap().get_bool());
        assert!(!function_call(varchar_eq, &args).unwrap().get_bool());
    }

    #[test]
    fn test_str_eq_ci() {
        let field = Datum::from_varlen_owned(b"Table".to_vec());
        let probe = Datum::from_cstr("table").unwrap();
        let args = [
            NullableDatumRef::from(&field),
            NullableDatumRef::from(&probe),
        ];
        assert!(function_call(varchar_str_eq_ci, &args).unwrap().get_bool());
        assert!(!function_call(varchar_str_eq, &args).unwrap().get_bool());
    }

    #[test]
    fn test_varchar_to_char_pads() {
        let v = Datum::from_varlen_owned(b"ab".to_vec());
        let args = [NullableDatumRef::from(&v)];
        let c = function_call_with_typparam(varchar_to_char, 4, &args).unwrap();
        assert_eq!(c.varlen_bytes(), b"ab  ");
    }
}
