//! Built-in support functions for `BOOL`.

use rill_common::types::Datum;
use rill_common::{RillError, RillResult};

use crate::fmgr::FunctionCallInfo;
use crate::optypes::OpType;
use crate::systables::initoids::{TYP_BOOL, TYP_STRING};

use super::{text_arg, BuiltinDef};
use rill_common::types::Oid;

fn bool_in(fcinfo: &FunctionCallInfo<'_>) -> RillResult<Datum<'static>> {
    if fcinfo.arg(0).is_null() {
        return Ok(Datum::null());
    }

    let s = text_arg(fcinfo, 0)?;
    let val = match s.trim().to_ascii_lowercase().as_str() {
        "t" | "true" | "y" | "yes" | "on" | "1" => true,
        "f" | "false" | "n" | "no" | "off" | "0" => false,
        _ => {
            return Err(RillError::invalid_argument(format!(
                "cannot parse \"{s}\" as a BOOL"
            )))
        }
    };
    Ok(Datum::from_bool(val))
}

fn bool_out(fcinfo: &FunctionCallInfo<'_>) -> RillResult<Datum<'static>> {
    if fcinfo.arg(0).is_null() {
        return Ok(Datum::null());
    }

    let s = if fcinfo.arg(0).get_bool() {
        "true"
    } else {
        "false"
    };
    Ok(Datum::from_varlen_owned(s.as_bytes().to_vec()))
}

fn bool_not(fcinfo: &FunctionCallInfo<'_>) -> RillResult<Datum<'static>> {
    if fcinfo.arg(0).is_null() {
        return Ok(Datum::null());
    }
    Ok(Datum::from_bool(!fcinfo.arg(0).get_bool()))
}

/// SQL three-valued OR: `NULL OR true` is true, `NULL OR false` is NULL.
fn bool_or(fcinfo: &FunctionCallInfo<'_>) -> RillResult<Datum<'static>> {
    let (a, b) = (fcinfo.arg(0), fcinfo.arg(1));
    if a.is_null() {
        if b.is_null() || !b.get_bool() {
            return Ok(Datum::null());
        }
        return Ok(Datum::from_bool(true));
    }
    if a.get_bool() {
        return Ok(Datum::from_bool(true));
    }
    if b.is_null() {
        return Ok(Datum::null());
    }
    Ok(Datum::from_bool(b.get_bool()))
}

/// SQL three-valued AND: `NULL AND false` is false, `NULL AND true` is NULL.
fn bool_and(fcinfo: &FunctionCallInfo<'_>) -> RillResult<Datum<'static>> {
    let (a, b) = (fcinfo.arg(0), fcinfo.arg(1));
    if a.is_null() {
        if b.is_null() || b.get_bool() {
            return Ok(Datum::null());
        }
        return Ok(Datum::from_bool(false));
    }
    if !a.get_bool() {
        return Ok(Datum::from_bool(false));
    }
    if b.is_null() {
        return Ok(Datum::null());
    }
    Ok(Datum::from_bool(b.get_bool()))
}

macro_rules! bool_cmp {
    ($name:ident, $op:tt) => {
        fn $name(fcinfo: &FunctionCallInfo<'_>) -> RillResult<Datum<'static>> {
            if fcinfo.arg(0).is_null() || fcinfo.arg(1).is_null() {
                return Ok(Datum::null());
            }
            Ok(Datum::from_bool(
                fcinfo.arg(0).get_bool() $op fcinfo.arg(1).get_bool(),
            ))
        }
    };
}

bool_cmp!(bool_eq, ==);
bool_cmp!(bool_ne, !=);
bool_cmp!(bool_lt, <);
bool_cmp!(bool_le, <=);
bool_cmp!(bool_gt, >);
bool_cmp!(bool_ge, >=);

pub(super) const DEFS: &[BuiltinDef] = &[
    BuiltinDef {
        oid: Oid::new(100),
        name: "BOOL_in",
        rettype: TYP_BOOL,
        argtypes: &[TYP_STRING],
        opr: None,
        func: bool_in,
    },
    BuiltinDef {
        oid: Oid::new(101),
        name: "BOOL_out",
        rettype: TYP_STRING,
        argtypes: &[TYP_BOOL],
        opr: None,
        func: bool_out,
    },
    BuiltinDef {
        oid: Oid::new(102),
        name: "BOOL_eq",
        rettype: TYP_BOOL,
        argtypes: &[TYP_BOOL, TYP_BOOL],
        opr: Some(OpType::Eq),
        func: bool_eq,
    },
    BuiltinDef {
        oid: Oid::new(103),
        name: "BOOL_ne",
        rettype: TYP_BOOL,
        argtypes: &[TYP_BOOL, TYP_BOOL],
        opr: Some(OpType::Ne),
        func: bool_ne,
    },
    BuiltinDef {
        oid: Oid::new(104),
        name: "BOOL_lt",
        rettype: TYP_BOOL,
        argtypes: &[TYP_BOOL, TYP_BOOL],
        opr: Some(OpType::Lt),
        func: bool_lt,
    },
    BuiltinDef {
        oid: Oid::new(105),
        name: "BOOL_le",
        rettype: TYP_BOOL,
        argtypes: &[TYP_BOOL, TYP_BOOL],
        opr: Some(OpType::Le),
        func: bool_le,
    },
    BuiltinDef {
        oid: Oid::new(106),
        name: "BOOL_gt",
        rettype: TYP_BOOL,
        argtypes: &[TYP_BOOL, TYP_BOOL],
        opr: Some(OpType::Gt),
        func: bool_gt,
    },
    BuiltinDef {
        oid: Oid::new(107),
        name: "BOOL_ge",
        rettype: TYP_BOOL,
        argtypes: &[TYP_BOOL, TYP_BOOL],
        opr: Some(OpType::Ge),
        func: bool_ge,
    },
    BuiltinDef {
        oid: Oid::new(108),
        name: "BOOL_and",
        rettype: TYP_BOOL,
        argtypes: &[TYP_BOOL, TYP_BOOL],
        opr: Some(OpType::And),
        func: bool_and,
    },
    BuiltinDef {
        oid: Oid::new(109),
        name: "BOOL_or",
        rettype: TYP_BOOL,
        argtypes: &[TYP_BOOL, TYP_BOOL],
        opr: Some(OpType::Or),
        func: bool_or,
    },
    BuiltinDef {
        oid: Oid::new(110),
        name: "BOOL_not",
        rettype: TYP_BOOL,
        argtypes: &[TYP_BOOL],
        opr: Some(OpType::Not),
        func: bool_not,
    },
];
