//! Comparison operations: =, not=, <, >, <=, >=
//!
//! `=` and `not=` test all arguments against the first; the orderings hold
//! pairwise across the whole argument sequence.

use crate::error::{Error, ARITY_AT_LEAST_ONE};
use crate::namespace::{Namespace, NsRegistry};
use crate::numeric;
use crate::value::Value;
use std::cmp::Ordering;

fn all_equal(name: &'static str, args: &[Value]) -> Result<bool, Error> {
    if args.is_empty() {
        return Err(Error::arity(name, ARITY_AT_LEAST_ONE, 0));
    }
    Ok(args[1..].iter().all(|arg| args[0].equiv(arg)))
}

/// True when every argument equals the first. Numbers compare across
/// Int/Float/Ratio.
pub fn builtin_eq(args: &[Value], _registry: &NsRegistry) -> Result<Value, Error> {
    all_equal("=", args).map(Value::Bool)
}

pub fn builtin_not_eq(args: &[Value], _registry: &NsRegistry) -> Result<Value, Error> {
    all_equal("not=", args).map(|eq| Value::Bool(!eq))
}

fn pairwise(
    name: &'static str,
    args: &[Value],
    holds: fn(Ordering) -> bool,
) -> Result<Value, Error> {
    if args.is_empty() {
        return Err(Error::arity(name, ARITY_AT_LEAST_ONE, 0));
    }

    for (i, arg) in args.iter().enumerate() {
        if !arg.is_number() {
            return Err(Error::type_error(name, "number", arg, i));
        }
    }

    for window in args.windows(2) {
        match numeric::try_compare(&window[0], &window[1]) {
            Some(ordering) if holds(ordering) => {}
            Some(_) => return Ok(Value::Bool(false)),
            None => return Err(Error::user(format!("{}: arguments are unordered", name))),
        }
    }
    Ok(Value::Bool(true))
}

pub fn builtin_lt(args: &[Value], _registry: &NsRegistry) -> Result<Value, Error> {
    pairwise("<", args, |o| o == Ordering::Less)
}

pub fn builtin_gt(args: &[Value], _registry: &NsRegistry) -> Result<Value, Error> {
    pairwise(">", args, |o| o == Ordering::Greater)
}

pub fn builtin_le(args: &[Value], _registry: &NsRegistry) -> Result<Value, Error> {
    pairwise("<=", args, |o| o != Ordering::Greater)
}

pub fn builtin_ge(args: &[Value], _registry: &NsRegistry) -> Result<Value, Error> {
    pairwise(">=", args, |o| o != Ordering::Less)
}

pub fn install(ns: &Namespace) {
    super::define(ns, "=", builtin_eq);
    super::define(ns, "not=", builtin_not_eq);
    super::define(ns, "<", builtin_lt);
    super::define(ns, ">", builtin_gt);
    super::define(ns, "<=", builtin_le);
    super::define(ns, ">=", builtin_ge);
}
