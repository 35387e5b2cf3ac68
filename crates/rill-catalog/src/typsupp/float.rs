//! Built-in support functions for `FLOAT` and `DOUBLE`.

use rill_common::types::{Datum, Oid};
use rill_common::{RillError, RillResult};

use crate::fmgr::FunctionCallInfo;
use crate::optypes::OpType;
use crate::systables::initoids::{TYP_BOOL, TYP_DOUBLE, TYP_FLOAT, TYP_STRING};

use super::{owned_text, text_arg, BuiltinDef};

macro_rules! float_builtins {
    ($mod_name:ident, $ty:ty, $get:ident, $from:ident, $typ_oid:expr, $base:expr, $tyname:literal) => {
        mod $mod_name {
            use super::*;

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

            float_arith_fn!(add_fn, $get, $from, +);
            float_arith_fn!(sub_fn, $get, $from, -);
            float_arith_fn!(mul_fn, $get, $from, *);
            float_arith_fn!(div_fn, $get, $from, /);

            fn neg_fn(fcinfo: &FunctionCallInfo<'_>) -> RillResult<Datum<'static>> {
                if fcinfo.arg(0).is_null() {
                    return Ok(Datum::null());
                }
                Ok(Datum::$from(-fcinfo.arg(0).$get()))
            }

            int_cmp_like_fn!(eq_fn, $get, eq);
            int_cmp_like_fn!(ne_fn, $get, ne);
            int_cmp_like_fn!(lt_fn, $get, lt);
            int_cmp_like_fn!(le_fn, $get, le);
            int_cmp_like_fn!(gt_fn, $get, gt);
            int_cmp_like_fn!(ge_fn, $get, ge);

            pub(super) const DEFS: &[BuiltinDef] = &[
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
                    name: concat!($tyname, "_neg"),
                    rettype: $typ_oid,
                    argtypes: &[$typ_oid],
                    opr: Some(OpType::Neg),
                    func: neg_fn,
                },
                BuiltinDef {
                    oid: Oid::new($base + 7),
                    name: concat!($tyname, "_eq"),
                    rettype: TYP_BOOL,
                    argtypes: &[$typ_oid, $typ_oid],
                    opr: Some(OpType::Eq),
                    func: eq_fn,
                },
                BuiltinDef {
                    oid: Oid::new($base + 8),
                    name: concat!($tyname, "_ne"),
                    rettype: TYP_BOOL,
                    argtypes: &[$typ_oid, $typ_oid],
                    opr: Some(OpType::Ne),
                    func: ne_fn,
                },
                BuiltinDef {
                    oid: Oid::new($base + 9),
                    name: concat!($tyname, "_lt"),
                    rettype: TYP_BOOL,
                    argtypes: &[$typ_oid, $typ_oid],
                    opr: Some(OpType::Lt),
                    func: lt_fn,
                },
                BuiltinDef {
                    oid: Oid::new($base + 10),
                    name: concat!($tyname, "_le"),
                    rettype: TYP_BOOL,
                    argtypes: &[$typ_oid, $typ_oid],
                    opr: Some(OpType::Le),
                    func: le_fn,
                },
                BuiltinDef {
                    oid: Oid::new($base + 11),
                    name: concat!($tyname, "_gt"),
                    rettype: TYP_BOOL,
                    argtypes: &[$typ_oid, $typ_oid],
                    opr: Some(OpType::Gt),
                    func: gt_fn,
                },
                BuiltinDef {
                    oid: Oid::new($base + 12),
                    name: concat!($tyname, "_ge"),
                    rettype: TYP_BOOL,
                    argtypes: &[$typ_oid, $typ_oid],
                    opr: Some(OpType::Ge),
                    func: ge_fn,
                },
            ];
        }
    };
}

macro_rules! float_arith_fn {
    ($name:ident, $get:ident, $from:ident, $op:tt) => {
        fn $name(fcinfo: &FunctionCallInfo<'_>) -> RillResult<Datum<'static>> {
            if fcinfo.arg(0).is_null() || fcinfo.arg(1).is_null() {
                return Ok(Datum::null());
            }
            Ok(Datum::$from(fcinfo.arg(0).$get() $op fcinfo.arg(1).$get()))
        }
    };
}

macro_rules! int_cmp_like_fn {
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

float_builtins!(float4, f32, get_f32, from_f32, TYP_FLOAT, 280, "FLOAT");
float_builtins!(float8, f64, get_f64, from_f64, TYP_DOUBLE, 300, "DOUBLE");

pub(super) const DEFS: &[&[BuiltinDef]] = &[float4::DEFS, float8::DEFS];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fmgr::function_call;
    use rill_common::types::NullableDatumRef;

    #[test]
    fn test_float_in_out_roundtrip() {
        let in_fn = float4::DEFS[0].func;
        let out_fn = float4::DEFS[1].func;
        for s in ["0", "1.5", "-3.25"] {
            let text = Datum::from_cstr(s).unwrap();
            let args = [NullableDatumRef::from(&text)];
            let v = function_call(in_fn, &args).unwrap();
            let args = [NullableDatumRef::from(&v)];
            let out = function_call(out_fn, &args).unwrap();
            // Shortest-round-trip formatting preserves the value.
            let back: f32 = std::str::from_utf8(out.varlen_bytes())
                .unwrap()
                .parse()
                .unwrap();
            assert_eq!(back, s.parse::<f32>().unwrap());
        }
    }

    #[test]
    fn test_double_arith() {
        let add = float8::DEFS[2].func;
        let a = Datum::from_f64(1.25);
        let b = Datum::from_f64(2.5);
        let args = [NullableDatumRef::from(&a), NullableDatumRef::from(&b)];
        assert_eq!(function_call(add, &args).unwrap().get_f64(), 3.75);
    }

    #[test]
    fn test_float_cmp() {
        let lt = float4::DEFS[9].func;
        let a = Datum::from_f32(-1.0);
        let b = Datum::from_f32(1.0);
        let args = [NullableDatumRef::from(&a), NullableDatumRef::from(&b)];
        assert!(function_call(lt, &args).unwrap().get_bool());
    }

    #[test]
    fn test_float_in_rejects_garbage() {
        let in_fn = float8::DEFS[0].func;
        let text = Datum::from_cstr("1.2.3").unwrap();
        let args = [NullableDatumRef::from(&text)];
        assert!(function_call(in_fn, &args).is_err());
    }
}
