//! Built-in support functions for `OID`.

use rill_common::types::{Datum, Oid};
use rill_common::{RillError, RillResult};

use crate::fmgr::FunctionCallInfo;
use crate::optypes::OpType;
use crate::systables::initoids::{TYP_BOOL, TYP_OID, TYP_STRING};

use super::{owned_text, text_arg, BuiltinDef};

fn oid_in(fcinfo: &FunctionCallInfo<'_>) -> RillResult<Datum<'static>> {
    if fcinfo.arg(0).is_null() {
        return Ok(Datum::null());
    }
    let s = text_arg(fcinfo, 0)?;
    let val = s
        .parse::<u32>()
        .map_err(|_| RillError::invalid_argument(format!("cannot parse \"{s}\" as an OID")))?;
    Ok(Datum::from_oid(Oid::new(val)))
}

fn oid_out(fcinfo: &FunctionCallInfo<'_>) -> RillResult<Datum<'static>> {
    if fcinfo.arg(0).is_null() {
        return Ok(Datum::null());
    }
    Ok(owned_text(fcinfo.arg(0).get_oid().as_u32().to_string()))
}

macro_rules! oid_cmp_fn {
    ($name:ident, $cmp:ident) => {
        fn $name(fcinfo: &FunctionCallInfo<'_>) -> RillResult<Datum<'static>> {
            if fcinfo.arg(0).is_null() || fcinfo.arg(1).is_null() {
                return Ok(Datum::null());
            }
            Ok(Datum::from_bool(
                fcinfo.arg(0).get_oid().$cmp(&fcinfo.arg(1).get_oid()),
            ))
        }
    };
}

oid_cmp_fn!(oid_eq, eq);
oid_cmp_fn!(oid_ne, ne);
oid_cmp_fn!(oid_lt, lt);
oid_cmp_fn!(oid_le, le);
oid_cmp_fn!(oid_gt, gt);
oid_cmp_fn!(oid_ge, ge);

pub(super) const DEFS: &[BuiltinDef] = &[
    BuiltinDef {
        oid: Oid::new(320),
        name: "OID_in",
        rettype: TYP_OID,
        argtypes: &[TYP_STRING],
        opr: None,
        func: oid_in,
    },
    BuiltinDef {
        oid: Oid::new(321),
        name: "OID_out",
        rettype: TYP_STRING,
        argtypes: &[TYP_OID],
        opr: None,
        func: oid_out,
    },
    BuiltinDef {
        oid: Oid::new(322),
        name: "OID_eq",
        rettype: TYP_BOOL,
        argtypes: &[TYP_OID, TYP_OID],
        opr: Some(OpType::Eq),
        func: oid_eq,
    },
    BuiltinDef {
        oid: Oid::new(323),
        name: "OID_ne",
        rettype: TYP_BOOL,
        argtypes: &[TYP_OID, TYP_OID],
        opr: Some(OpType::Ne),
        func: oid_ne,
    },
    BuiltinDef {
        oid: Oid::new(324),
        name: "OID_lt",
        rettype: TYP_BOOL,
        argtypes: &[TYP_OID, TYP_OID],
        opr: Some(OpType::Lt),
        func: oid_lt,
    },
    BuiltinDef {
        oid: Oid::new(325),
        name: "OID_le",
        rettype: TYP_BOOL,
        argtypes: &[TYP_OID, TYP_OID],
        opr: Some(OpType::Le),
        func: oid_le,
    },
    BuiltinDef {
        oid: Oid::new(326),
        name: "OID_gt",
        rettype: TYP_BOOL,
        argtypes: &[TYP_OID, TYP_OID],
        opr: Some(OpType::Gt),
        func: oid_gt,
    },
    BuiltinDef {
        oid: Oid::new(327),
        name: "OID_ge",
        rettype: TYP_BOOL,
        argtypes: &[TYP_OID, TYP_OID],
        opr: Some(OpType::Ge),
        func: oid_ge,
    },
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fmgr::function_call;
    use rill_common::types::NullableDatumRef;

    #[test]
    fn test_oid_in_out() {
        let text = Datum::from_cstr("12345").unwrap();
        let args = [NullableDatumRef::from(&text)];
        let v = function_call(oid_in, &args).unwrap();
        assert_eq!(v.get_oid(), Oid::new(12345));

        let args = [NullableDatumRef::from(&v)];
        let out = function_call(oid_out, &args).unwrap();
        assert_eq!(out.varlen_bytes(), b"12345");
    }

    #[test]
    fn test_oid_eq() {
        let a = Datum::from_oid(Oid::new(9));
        let b = Datum::from_oid(Oid::new(9));
        let c = Datum::from_oid(Oid::new(10));
        let args = [NullableDatumRef::from(&a), NullableDatumRef::from(&b)];
        assert!(function_call(oid_eq, &args).unwrap().get_bool());
        let args = [NullableDatumRef::from(&a), NullableDatumRef::from(&c)];
        assert!(!function_call(oid_eq, &args).unwrap().get_bool());
    }
}
