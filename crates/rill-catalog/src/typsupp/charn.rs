//! Built-in support functions for the fixed-width string type `CHAR(n)`.
//!
//! A `CHAR(n)` value is always exactly `n` bytes, padded with trailing
//! spaces. The type is fixed-length but passed by reference; its length
//! comes from the type parameter through the `CHAR_typlen` function.

use rill_common::types::{Datum, Oid};
use rill_common::{RillError, RillResult};

use crate::fmgr::FunctionCallInfo;
use crate::optypes::OpType;
use crate::systables::initoids::{TYP_BOOL, TYP_CHAR, TYP_INT2, TYP_STRING, TYP_UINT8, TYP_VARCHAR};

use super::BuiltinDef;

fn char_in(fcinfo: &FunctionCallInfo<'_>) -> RillResult<Datum<'static>> {
    if fcinfo.arg(0).is_null() {
        return Ok(Datum::null());
    }

    let bytes = fcinfo.arg(0).varlen_bytes();
    let max_size = fcinfo.typparam as usize;

    // Trailing spaces beyond the declared width are not significant.
    let mut size = bytes.len();
    while size > max_size && bytes[size - 1] == b' ' {
        size -= 1;
    }
    if size > max_size {
        return Err(RillError::invalid_argument(format!(
            "the length {size} of the given string exceeds the specified maximum {max_size}"
        )));
    }

    let mut buf = vec![b' '; max_size];
    buf[..size].copy_from_slice(&bytes[..size]);
    Ok(Datum::from_varlen_owned(buf))
}

fn char_out(fcinfo: &FunctionCallInfo<'_>) -> RillResult<Datum<'static>> {
    if fcinfo.arg(0).is_null() {
        return Ok(Datum::null());
    }
    Ok(Datum::from_varlen_owned(fcinfo.arg(0).varlen_bytes().to_vec()))
}

/// Resolves the storage length of `CHAR(n)` from its type parameter.
fn char_typlen(fcinfo: &FunctionCallInfo<'_>) -> RillResult<Datum<'static>> {
    if fcinfo.arg(0).is_null() {
        return Err(RillError::invalid_argument("NULL type parameter"));
    }

    let max_size = fcinfo.arg(0).get_u64();
    if max_size == 0 || max_size > i16::MAX as u64 {
        return Err(RillError::invalid_argument(format!(
            "CHAR does not support a maximum length of {max_size}"
        )));
    }
    Ok(Datum::from_i16(max_size as i16))
}

fn char_to_varchar(fcinfo: &FunctionCallInfo<'_>) -> RillResult<Datum<'static>> {
    if fcinfo.arg(0).is_null() {
        return Ok(Datum::null());
    }

    let bytes = fcinfo.arg(0).varlen_bytes();
    let max_size = fcinfo.typparam as usize;

    let mut end = bytes.len();
    while end > 0 && bytes[end - 1] == b' ' {
        end -= 1;
    }
    // A zero type parameter denotes an implicit cast with no declared
    // maximum; otherwise the value is silently truncated to the maximum.
    let end = if max_size == 0 { end } else { end.min(max_size) };
    Ok(Datum::from_varlen_owned(bytes[..end].to_vec()))
}

macro_rules! char_cmp_fn {
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

char_cmp_fn!(char_eq, eq);
char_cmp_fn!(char_ne, ne);
char_cmp_fn!(char_lt, lt);
char_cmp_fn!(char_le, le);
char_cmp_fn!(char_gt, gt);
char_cmp_fn!(char_ge, ge);

pub(super) const DEFS: &[BuiltinDef] = &[
    BuiltinDef {
        oid: Oid::new(340),
        name: "CHAR_in",
        rettype: TYP_CHAR,
        argtypes: &[TYP_STRING],
        opr: None,
        func: char_in,
    },
    BuiltinDef {
        oid: Oid::new(341),
        name: "CHAR_out",
        rettype: TYP_STRING,
        argtypes: &[TYP_CHAR],
        opr: None,
        func: char_out,
    },
    BuiltinDef {
        oid: Oid::new(342),
        name: "CHAR_typlen",
        rettype: TYP_INT2,
        argtypes: &[TYP_UINT8],
        opr: None,
        func: char_typlen,
    },
    BuiltinDef {
        oid: Oid::new(343),
        name: "CHAR_eq",
        rettype: TYP_BOOL,
        argtypes: &[TYP_CHAR, TYP_CHAR],
        opr: Some(OpType::Eq),
        func: char_eq,
    },
    BuiltinDef {
        oid: Oid::new(344),
        name: "CHAR_ne",
        rettype: TYP_BOOL,
        argtypes: &[TYP_CHAR, TYP_CHAR],
        opr: Some(OpType::Ne),
        func: char_ne,
    },
    BuiltinDef {
        oid: Oid::new(345),
        name: "CHAR_lt",
        rettype: TYP_BOOL,
        argtypes: &[TYP_CHAR, TYP_CHAR],
        opr: Some(OpType::Lt),
        func: char_lt,
    },
    BuiltinDef {
        oid: Oid::new(346),
        name: "CHAR_le",
        rettype: TYP_BOOL,
        argtypes: &[TYP_CHAR, TYP_CHAR],
        opr: Some(OpType::Le),
        func: char_le,
    },
    BuiltinDef {
        oid: Oid::new(347),
        name: "CHAR_gt",
        rettype: TYP_BOOL,
        argtypes: &[TYP_CHAR, TYP_CHAR],
        opr: Some(OpType::Gt),
        func: char_gt,
    },
    BuiltinDef {
        oid: Oid::new(348),
        name: "CHAR_ge",
        rettype: TYP_BOOL,
        argtypes: &[TYP_CHAR, TYP_CHAR],
        opr: Some(OpType::Ge),
        func: char_ge,
    },
    BuiltinDef {
        oid: Oid::new(349),
        name: "CHAR_to_VARCHAR",
        rettype: TYP_VARCHAR,
        argtypes: &[TYP_CHAR],
        opr: Some(OpType::Cast),
        func: char_to_varchar,
    },
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fmgr::{function_call_with_typparam, function_call};
    use rill_common::types::NullableDatumRef;

    fn char_in_call(s: &str, n: u64) -> RillResult<Datum<'static>> {
        let text = Datum::from_cstr(s).unwrap();
        let args = [NullableDatumRef::from(&text)];
        function_call_with_typparam(char_in, n, &args)
    }

    #[test]
    fn test_char_in_pads() {
        let v = char_in_call("ab", 5).unwrap();
        assert_eq!(v.varlen_bytes(), b"ab   ");
    }

    #[test]
    fn test_char_in_trailing_spaces_tolerated() {
        let v = char_in_call("abc   ", 3).unwrap();
        assert_eq!(v.varlen_bytes(), b"abc");
        assert!(char_in_call("abcd", 3).is_err());
    }

    #[test]
    fn test_char_typlen() {
        let n = Datum::from_u64(10);
        let args = [NullableDatumRef::from(&n)];
        let v = function_call(char_typlen, &args).unwrap();
        assert_eq!(v.get_i16(), 10);

        let too_big = Datum::from_u64(1 << 20);
        let args = [NullableDatumRef::from(&too_big)];
        assert!(function_call(char_typlen, &args).is_err());
    }

    #[test]
    fn test_char_to_varchar_strips_padding() {
        let v = char_in_call("hi", 6).unwrap();
        let args = [NullableDatumRef::from(&v)];
        let cast = function_call(char_to_varchar, &args).unwrap();
        assert_eq!(cast.varlen_bytes(), b"hi");
    }
}
