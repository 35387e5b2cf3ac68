//! The function manager: the call interface for built-in functions and the
//! registry mapping function OIDs to callables.
//!
//! A built-in function receives a slice of nullable datum references plus a
//! 64-bit type parameter (consulted by polymorphic types such as
//! `VARCHAR(n)`, whose input function needs the declared maximum length),
//! and returns one datum. Parse and domain failures are returned as errors;
//! a function that conceptually returns nothing returns the integer-zero
//! datum instead of a null.

use std::collections::HashMap;

use rill_common::types::{Datum, NullableDatumRef, Oid};
use rill_common::{RillError, RillResult};

use crate::typsupp::builtin_defs;

/// The data passed to a function at a call site.
#[derive(Debug)]
pub struct FunctionCallInfo<'a> {
    /// The arguments, possibly null.
    pub args: &'a [NullableDatumRef<'a>],
    /// The type parameter of the polymorphic result or argument type, or 0
    /// when the function does not care.
    pub typparam: u64,
}

impl<'a> FunctionCallInfo<'a> {
    /// Returns the number of arguments.
    #[inline]
    #[must_use]
    pub fn nargs(&self) -> usize {
        self.args.len()
    }

    /// Returns the n-th argument.
    #[inline]
    #[must_use]
    pub fn arg(&self, n: usize) -> NullableDatumRef<'a> {
        self.args[n]
    }
}

/// The shape of every built-in function.
pub type FunctionPtr = fn(&FunctionCallInfo<'_>) -> RillResult<Datum<'static>>;

/// Calls a function without a type parameter.
#[inline]
pub fn function_call(
    func: FunctionPtr,
    args: &[NullableDatumRef<'_>],
) -> RillResult<Datum<'static>> {
    func(&FunctionCallInfo { args, typparam: 0 })
}

/// Calls a function with a type parameter.
#[inline]
pub fn function_call_with_typparam(
    func: FunctionPtr,
    typparam: u64,
    args: &[NullableDatumRef<'_>],
) -> RillResult<Datum<'static>> {
    func(&FunctionCallInfo { args, typparam })
}

/// The registry of built-in functions, keyed by function OID.
///
/// One registry is built per database instance from the compile-time table
/// of built-in definitions; it never changes afterwards.
#[derive(Debug)]
pub struct FuncRegistry {
    funcs: HashMap<Oid, FunctionPtr>,
}

impl FuncRegistry {
    /// Builds the registry of all built-in functions.
    ///
    /// # Panics
    ///
    /// Panics if two built-in definitions claim the same function OID; the
    /// built-in table is checked for duplicates when the registry is built.
    #[must_use]
    pub fn builtin() -> Self {
        let defs = builtin_defs();
        let mut funcs = HashMap::with_capacity(defs.len());
        for def in defs {
            if funcs.insert(def.oid, def.func).is_some() {
                panic!("duplicate built-in function OID {}", def.oid);
            }
        }
        Self { funcs }
    }

    /// Looks up a built-in function. Returns `None` if the OID is not
    /// registered.
    #[inline]
    #[must_use]
    pub fn find(&self, oid: Oid) -> Option<FunctionPtr> {
        self.funcs.get(&oid).copied()
    }

    /// Looks up a built-in function that is required to exist.
    pub fn lookup(&self, oid: Oid) -> RillResult<FunctionPtr> {
        self.find(oid)
            .ok_or_else(|| RillError::not_found(format!("built-in function {oid}")))
    }

    /// Returns the number of registered functions.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.funcs.len()
    }

    /// Returns true if the registry is empty.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.funcs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::systables::initoids;

    #[test]
    fn test_builtin_registry_builds() {
        let reg = FuncRegistry::builtin();
        assert!(!reg.is_empty());
        assert!(reg.find(initoids::FUNC_OID_EQ).is_some());
        assert!(reg.find(Oid::new(99_999)).is_none());
    }

    #[test]
    fn test_lookup_missing_is_not_found() {
        let reg = FuncRegistry::builtin();
        let err = reg.lookup(Oid::new(99_999)).unwrap_err();
        assert_eq!(
            err.code(),
            rill_common::error::ErrorCode::NotFound
        );
    }

    #[test]
    fn test_function_call() {
        let reg = FuncRegistry::builtin();
        let eq = reg.lookup(initoids::FUNC_OID_EQ).unwrap();

        let a = Datum::from_oid(Oid::new(7));
        let b = Datum::from_oid(Oid::new(7));
        let args = [NullableDatumRef::from(&a), NullableDatumRef::from(&b)];
        let res = function_call(eq, &args).unwrap();
        assert!(res.get_bool());
    }
}
