//! Arithmetic operations: +, -, *, /, mod, zero?
//!
//! The four operators left-fold over one or more arguments across the
//! Int/Float/Ratio tower; `/` on integers divides exactly into a ratio.

use crate::error::{Error, ARITY_AT_LEAST_ONE, ARITY_ONE, ARITY_TWO};
use crate::namespace::{Namespace, NsRegistry};
use crate::numeric;
use crate::value::Value;
use num_integer::Integer;

fn fold(
    name: &'static str,
    args: &[Value],
    op: fn(&Value, &Value) -> Result<Value, Error>,
) -> Result<Value, Error> {
    if args.is_empty() {
        return Err(Error::arity(name, ARITY_AT_LEAST_ONE, 0));
    }

    for (i, arg) in args.iter().enumerate() {
        if !arg.is_number() {
            return Err(Error::type_error(name, "number", arg, i));
        }
    }

    let mut acc = args[0].clone();
    for arg in &args[1..] {
        acc = op(&acc, arg)?;
    }
    Ok(acc)
}

/// Sums all arguments.
///
/// ```lisp
/// (+ 1 2 3) => 6
/// (+ 5) => 5
/// ```
pub fn builtin_add(args: &[Value], _registry: &NsRegistry) -> Result<Value, Error> {
    fold("+", args, numeric::add)
}

/// Subtracts subsequent arguments from the first.
pub fn builtin_sub(args: &[Value], _registry: &NsRegistry) -> Result<Value, Error> {
    fold("-", args, numeric::sub)
}

/// Multiplies all arguments.
pub fn builtin_mul(args: &[Value], _registry: &NsRegistry) -> Result<Value, Error> {
    fold("*", args, numeric::mul)
}

/// Divides the first argument by the rest. Integer operands divide exactly:
///
/// ```lisp
/// (/ 6 3) => 2
/// (/ 1 3) => 1/3
/// ```
pub fn builtin_div(args: &[Value], _registry: &NsRegistry) -> Result<Value, Error> {
    fold("/", args, numeric::div)
}

/// Floored remainder over integers, following the sign of the divisor.
pub fn builtin_mod(args: &[Value], _registry: &NsRegistry) -> Result<Value, Error> {
    if args.len() != 2 {
        return Err(Error::arity("mod", ARITY_TWO, args.len()));
    }

    let a = match &args[0] {
        Value::Int(n) => *n,
        other => return Err(Error::type_error("mod", "integer", other, 0)),
    };
    let b = match &args[1] {
        Value::Int(n) => *n,
        other => return Err(Error::type_error("mod", "integer", other, 1)),
    };
    if b == 0 {
        return Err(Error::user("Division by zero"));
    }

    Ok(Value::Int(a.mod_floor(&b)))
}

/// True when the argument equals zero.
pub fn builtin_zero_q(args: &[Value], _registry: &NsRegistry) -> Result<Value, Error> {
    if args.len() != 1 {
        return Err(Error::arity("zero?", ARITY_ONE, args.len()));
    }

    numeric::is_zero(&args[0])
        .map(Value::Bool)
        .ok_or_else(|| Error::type_error("zero?", "number", &args[0], 0))
}

pub fn install(ns: &Namespace) {
    super::define(ns, "+", builtin_add);
    super::define(ns, "-", builtin_sub);
    super::define(ns, "*", builtin_mul);
    super::define(ns, "/", builtin_div);
    super::define(ns, "mod", builtin_mod);
    super::define(ns, "zero?", builtin_zero_q);
}
