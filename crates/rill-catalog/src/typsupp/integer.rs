//! Built-in support functions for the eight fixed-width integer types.
//!
//! The families are uniform, so they are stamped out by macros: the signed
//! types get `in`, `out`, the five arithmetic operators, negation, and the
//! six comparisons; the unsigned types get the same minus negation.
//! Arithmetic wraps on overflow; division and modulus by zero are errors.

use rill_common::types::{Datum, Oid};
use rill_common::{RillError, RillResult};

use crate::fmgr::FunctionCallInfo;
use crate::optypes::OpType;
use crate::systables::initoids::{
    TYP_BOOL, TYP_INT1, TYP_INT2, TYP_INT4, TYP_INT8, TYP_STRING, TYP_UINT1, TYP_UINT2,
    TYP_UINT4, TYP_UINT8,
};

use super::{owned_text, text_arg, BuiltinDef};

macro_rules! int_common {
    ($ty:ty, $get:ident, $from:ident, $tyname:literal) => {
        fn in_fn(fcinfo: &FunctionCallInfo<'_>) -> RillResult<Datum<'static>> {
            if fcinfo.arg(0).is_null() {
                return Ok(Datum::null());
            }
            let s = text_arg(fcinfo, 0)?;
            let val = s.parse::<$ty>().map_err(|_| {
                RillError::invalid_argument(format!(
                    concat!("cannot parse \"{}\" as a ", $tyname),
                    s
                ))
            })?;
            Ok(Datum::$from(val))
        }

        fn out_fn(fcinfo: &FunctionCallInfo<'_>) -> RillResult<Datum<'static>> {
            if fcinfo.arg(0).is_null() {
                return Ok(Datum::null());
            }
            Ok(owned_text(fcinfo.arg(0).$get().to_string()))
        }

        fn add_fn(fcinfo: &FunctionCallInfo<'_>) -> RillResult<Datum<'static>> {
            if fcinfo.arg(0).is_null() || fcinfo.arg(1).is_null() {
                return Ok(Datum::null());
            }
            Ok(Datum::$from(
                fcinfo.arg(0).$get().wrapping_add(fcinfo.arg(1).$get()),
            ))
        }

        fn sub_fn(fcinfo: &FunctionCallInfo<'_>) -> RillResult<Datum<'static>> {
            if fcinfo.arg(0).is_null() || fcinfo.arg(1).is_null() {
                return Ok(Datum::null());
            }
            Ok(Datum::$from(
                fcinfo.arg(0).$get().wrapping_sub(fcinfo.arg(1).$get()),
            ))
        }

        fn mul_fn(fcinfo: &FunctionCallInfo<'_>) -> RillResult<Datum<'static>> {
            if fcinfo.arg(0).is_null() || fcinfo.arg(1).is_null() {
                return Ok(Datum::null());
            }
            Ok(Datum::$from(
                fcinfo.arg(0).$get().wrapping_mul(fcinfo.arg(1).$get()),
            ))
        }

        fn div_fn(fcinfo: &FunctionCallInfo<'_>) -> RillResult<Datum<'static>> {
            if fcinfo.arg(0).is_null() || fcinfo.arg(1).is_null() {
                return Ok(Datum::null());
            }
            let divisor = fcinfo.arg(1).$get();
            if divisor == 0 {
                return Err(RillError::invalid_argument("division by zero"));
            }
            Ok(Datum::$from(fcinfo.arg(0).$get().wrapping_div(divisor)))
        }

        fn mod_fn(fcinfo: &FunctionCallInfo<'_>) -> RillResult<Datum<'static>> {
            if fcinfo.arg(0).is_null() || fcinfo.arg(1).is_null() {
                return Ok(Datum::null());
            }
            let divisor = fcinfo.arg(1).$get();
            if divisor == 0 {
                return Err(RillError::invalid_argument("division by zero"));
            }
            Ok(Datum::$from(fcinfo.arg(0).$get().wrapping_rem(divisor)))
        }

        int_cmp_fn!(eq_fn, $get, eq);
        int_cmp_fn!(ne_fn, $get, ne);
        int_cmp_fn!(lt_fn, $get, lt);
        int_cmp_fn!(le_fn, $get, le);
        int_cmp_fn!(gt_fn, $get, gt);
        int_cmp_fn!(ge_fn, $get, ge);
    };
}

macro_rules! int_cmp_fn {
    ($name:ident, $get:ident, $cmp:ident) => {
        fn $name(fcinfo: &FunctionCallInfo<'_>) -> RillResult<Datum<'static>> {
            if fcinfo.arg(0).is_null() || fcinfo.arg(1).is_null() {
                return Ok(Datum::null());
            }
            Ok(Datum::from_bool(
                fcinfo.arg(0).$get().$cmp(&fcinfo.arg(1).$get()),
            ))
        }
    };
}

macro_rules! int_common_defs {
    ($typ_oid:expr, $base:expr, $tyname:literal) => {
        &[
            BuiltinDef {
                oid: Oid::new($base),
                name: concat!($tyname, "_in"),
                rettype: $typ_oid,
                argtypes: &[TYP_STRING],
                opr: None,
                func: in_fn,
            },
            BuiltinDef {
                oid: Oid::new($base + 1),
                name: concat!($tyname, "_out"),
                rettype: TYP_STRING,
                argtypes: &[$typ_oid],
                opr: None,
                func: out_fn,
            },
            BuiltinDef {
                oid: Oid::new($base + 2),
                name: concat!($tyname, "_add"),
                rettype: $typ_oid,
                argtypes: &[$typ_oid, $typ_oid],
                opr: Some(OpType::Add),
                func: add_fn,
            },
            BuiltinDef {
                oid: Oid::new($base + 3),
                name: concat!($tyname, "_sub"),
                rettype: $typ_oid,
                argtypes: &[$typ_oid, $typ_oid],
                opr: Some(OpType::Sub),
                func: sub_fn,
            },
            BuiltinDef {
                oid: Oid::new($base + 4),
                name: concat!($tyname, "_mul"),
                rettype: $typ_oid,
                argtypes: &[$typ_oid, $typ_oid],
                opr: Some(OpType::Mul),
                func: mul_fn,
            },
            BuiltinDef {
                oid: Oid::new($base + 5),
                name: concat!($tyname, "_div"),
                rettype: $typ_oid,
                argtypes: &[$typ_oid, $typ_oid],
                opr: Some(OpType::Div),
                func: div_fn,
            },
            BuiltinDef {
                oid: Oid::new($base + 6),
                name: concat!($tyname, "_mod"),
                rettype: $typ_oid,
                argtypes: &[$typ_oid, $typ_oid],
                opr: Some(OpType::Mod),
                func: mod_fn,
            },
        ]
    };
}

macro_rules! int_cmp_defs {
    ($typ_oid:expr, $eq_base:expr, $tyname:literal) => {
        &[
            BuiltinDef {
                oid: Oid::new($eq_base),
                name: concat!($tyname, "_eq"),
                rettype: TYP_BOOL,
                argtypes: &[$typ_oid, $typ_oid],
                opr: Some(OpType::Eq),
                func: eq_fn,
            },
            BuiltinDef {
                oid: Oid::new($eq_base + 1),
                name: concat!($tyname, "_ne"),
                rettype: TYP_BOOL,
                argtypes: &[$typ_oid, $typ_oid],
                opr: Some(OpType::Ne),
                func: ne_fn,
            },
            BuiltinDef {
                oid: Oid::new($eq_base + 2),
                name: concat!($tyname, "_lt"),
                rettype: TYP_BOOL,
                argtypes: &[$typ_oid, $typ_oid],
                opr: Some(OpType::Lt),
                func: lt_fn,
            },
            BuiltinDef {
                oid: Oid::new($eq_base + 3),
                name: concat!($tyname, "_le"),
                rettype: TYP_BOOL,
                argtypes: &[$typ_oid, $typ_oid],
                opr: Some(OpType::Le),
                func: le_fn,
            },
            BuiltinDef {
                oid: Oid::new($eq_base + 4),
                name: concat!($tyname, "_gt"),
                rettype: TYP_BOOL,
                argtypes: &[$typ_oid, $typ_oid],
                opr: Some(OpType::Gt),
                func: gt_fn,
            },
            BuiltinDef {
                oid: Oid::new($eq_base + 5),
                name: concat!($tyname, "_ge"),
                rettype: TYP_BOOL,
                argtypes: &[$typ_oid, $typ_oid],
                opr: Some(OpType::Ge),
                func: ge_fn,
            },
        ]
    };
}

macro_rules! signed_int_builtins {
    ($mod_name:ident, $ty:ty, $get:ident, $from:ident, $typ_oid:expr, $base:expr, $tyname:literal) => {
        mod $mod_name {
            use super::*;

            int_common!($ty, $get, $from, $tyname);

            fn neg_fn(fcinfo: &FunctionCallInfo<'_>) -> RillResult<Datum<'static>> {
                if fcinfo.arg(0).is_null() {
                    return Ok(Datum::null());
                }
                Ok(Datum::$from(fcinfo.arg(0).$get().wrapping_neg()))
            }

            pub(super) const COMMON: &[BuiltinDef] = int_common_defs!($typ_oid, $base, $tyname);
            pub(super) const NEG: &[BuiltinDef] = &[BuiltinDef {
                oid: Oid::new($base + 7),
                name: concat!($tyname, "_neg"),
                rettype: $typ_oid,
                argtypes: &[$typ_oid],
                opr: Some(OpType::Neg),
                func: neg_fn,
            }];
            pub(super) const CMP: &[BuiltinDef] = int_cmp_defs!($typ_oid, $base + 8, $tyname);
        }
    };
}

macro_rules! unsigned_int_builtins {
    ($mod_name:ident, $ty:ty, $get:ident, $from:ident, $typ_oid:expr, $base:expr, $tyname:literal) => {
        mod $mod_name {
            use super::*;

            int_common!($ty, $get, $from, $tyname);

            pub(super) const COMMON: &[BuiltinDef] = int_common_defs!($typ_oid, $base, $tyname);
            pub(super) const CMP: &[BuiltinDef] = int_cmp_defs!($typ_oid, $base + 7, $tyname);
        }
    };
}

signed_int_builtins!(int1, i8, get_i8, from_i8, TYP_INT1, 120, "INT1");
signed_int_builtins!(int2, i16, get_i16, from_i16, TYP_INT2, 140, "INT2");
signed_int_builtins!(int4, i32, get_i32, from_i32, TYP_INT4, 160, "INT4");
signed_int_builtins!(int8, i64, get_i64, from_i64, TYP_INT8, 180, "INT8");
unsigned_int_builtins!(uint1, u8, get_u8, from_u8, TYP_UINT1, 200, "UINT1");
unsigned_int_builtins!(uint2, u16, get_u16, from_u16, TYP_UINT2, 220, "UINT2");
unsigned_int_builtins!(uint4, u32, get_u32, from_u32, TYP_UINT4, 240, "UINT4");
unsigned_int_builtins!(uint8, u64, get_u64, from_u64, TYP_UINT8, 260, "UINT8");

/// All integer built-ins. Kept as a runtime concatenation because the
/// per-family tables are separate consts.
pub(super) const DEFS: &[&[BuiltinDef]] = &[
    int1::COMMON,
    int1::NEG,
    int1::CMP,
    int2::COMMON,
    int2::NEG,
    int2::CMP,
    int4::COMMON,
    int4::NEG,
    int4::CMP,
    int8::COMMON,
    int8::NEG,
    int8::CMP,
    uint1::COMMON,
    uint1::CMP,
    uint2::COMMON,
    uint2::CMP,
    uint4::COMMON,
    uint4::CMP,
    uint8::COMMON,
    uint8::CMP,
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fmgr::function_call;
    use rill_common::types::NullableDatumRef;

    #[test]
    fn test_int4_in_out_roundtrip() {
        let reg_in = int4::COMMON[0].func;
        let reg_out = int4::COMMON[1].func;

        for s in ["0", "42", "-2147483648", "2147483647"] {
            let text = Datum::from_cstr(s).unwrap();
            let args = [NullableDatumRef::from(&text)];
            let v = function_call(reg_in, &args).unwrap();
            let args = [NullableDatumRef::from(&v)];
            let out = function_call(reg_out, &args).unwrap();
            assert_eq!(out.varlen_bytes(), s.as_bytes());
        }
    }

    #[test]
    fn test_int4_in_rejects_out_of_range() {
        let reg_in = int4::COMMON[0].func;
        let text = Datum::from_cstr("2147483648").unwrap();
        let args = [NullableDatumRef::from(&text)];
        assert!(function_call(reg_in, &args).is_err());

        let text = Datum::from_cstr("12abc").unwrap();
        let args = [NullableDatumRef::from(&text)];
        assert!(function_call(reg_in, &args).is_err());
    }

    #[test]
    fn test_division_by_zero() {
        let div = int4::COMMON[5].func;
        let a = Datum::from_i32(10);
        let b = Datum::from_i32(0);
        let args = [NullableDatumRef::from(&a), NullableDatumRef::from(&b)];
        assert!(function_call(div, &args).is_err());
    }

    #[test]
    fn test_int2_eq_and_neg() {
        let eq = int2::CMP[0].func;
        let a = Datum::from_i16(-3);
        let b = Datum::from_i16(-3);
        let args = [NullableDatumRef::from(&a), NullableDatumRef::from(&b)];
        assert!(function_call(eq, &args).unwrap().get_bool());

        let neg = int2::NEG[0].func;
        let args = [NullableDatumRef::from(&a)];
        assert_eq!(function_call(neg, &args).unwrap().get_i16(), 3);
    }

    #[test]
    fn test_null_propagation() {
        let add = int8::COMMON[2].func;
        let a = Datum::from_i64(1);
        let null = Datum::null();
        let args = [NullableDatumRef::from(&a), NullableDatumRef::from(&null)];
        assert!(function_call(add, &args).unwrap().is_null());
    }

    #[test]
    fn test_uint_comparison() {
        let lt = uint4::CMP[2].func;
        let a = Datum::from_u32(1);
        let b = Datum::from_u32(u32::MAX);
        let args = [NullableDatumRef::from(&a), NullableDatumRef::from(&b)];
        assert!(function_call(lt, &args).unwrap().get_bool());
    }
}
