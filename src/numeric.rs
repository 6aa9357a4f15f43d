// ABOUTME: Numeric tower: Int/Float/Ratio promotion, arithmetic, comparison

use crate::error::Error;
use crate::value::Value;
use num_rational::Rational64;
use num_traits::{ToPrimitive, Zero};
use std::cmp::Ordering;

/// Operand pair promoted to a common representation. Integers and ratios
/// stay exact with each other; a float on either side makes the pair float.
enum Promoted {
    Ints(i64, i64),
    Ratios(Rational64, Rational64),
    Floats(f64, f64),
}

fn promote(a: &Value, b: &Value) -> Option<Promoted> {
    Some(match (a, b) {
        (Value::Int(x), Value::Int(y)) => Promoted::Ints(*x, *y),
        (Value::Int(x), Value::Ratio(y)) => Promoted::Ratios(Rational64::from_integer(*x), *y),
        (Value::Ratio(x), Value::Int(y)) => Promoted::Ratios(*x, Rational64::from_integer(*y)),
        (Value::Ratio(x), Value::Ratio(y)) => Promoted::Ratios(*x, *y),
        (x, y) => Promoted::Floats(as_f64(x)?, as_f64(y)?),
    })
}

fn as_f64(v: &Value) -> Option<f64> {
    match v {
        Value::Int(n) => Some(*n as f64),
        Value::Float(n) => Some(*n),
        Value::Ratio(r) => r.to_f64(),
        _ => None,
    }
}

/// A ratio that reduced to a whole number becomes an Int.
fn normalize(r: Rational64) -> Value {
    if r.is_integer() {
        Value::Int(r.to_integer())
    } else {
        Value::Ratio(r)
    }
}

fn overflow(op: &str) -> Error {
    Error::user(format!("integer overflow in {}", op))
}

fn not_a_number(v: &Value) -> Error {
    Error::user(format!("{} is not a number", v))
}

pub fn add(a: &Value, b: &Value) -> Result<Value, Error> {
    match promote(a, b).ok_or_else(|| not_a_number(if a.is_number() { b } else { a }))? {
        Promoted::Ints(x, y) => x.checked_add(y).map(Value::Int).ok_or_else(|| overflow("+")),
        Promoted::Ratios(x, y) => Ok(normalize(x + y)),
        Promoted::Floats(x, y) => Ok(Value::Float(x + y)),
    }
}

pub fn sub(a: &Value, b: &Value) -> Result<Value, Error> {
    match promote(a, b).ok_or_else(|| not_a_number(if a.is_number() { b } else { a }))? {
        Promoted::Ints(x, y) => x.checked_sub(y).map(Value::Int).ok_or_else(|| overflow("-")),
        Promoted::Ratios(x, y) => Ok(normalize(x - y)),
        Promoted::Floats(x, y) => Ok(Value::Float(x - y)),
    }
}

pub fn mul(a: &Value, b: &Value) -> Result<Value, Error> {
    match promote(a, b).ok_or_else(|| not_a_number(if a.is_number() { b } else { a }))? {
        Promoted::Ints(x, y) => x.checked_mul(y).map(Value::Int).ok_or_else(|| overflow("*")),
        Promoted::Ratios(x, y) => Ok(normalize(x * y)),
        Promoted::Floats(x, y) => Ok(Value::Float(x * y)),
    }
}

/// Generic numeric division: two integers divide exactly, yielding a reduced
/// ratio (an Int when the denominator reduces to 1).
pub fn div(a: &Value, b: &Value) -> Result<Value, Error> {
    match promote(a, b).ok_or_else(|| not_a_number(if a.is_number() { b } else { a }))? {
        Promoted::Ints(x, y) => {
            if y == 0 {
                return Err(Error::user("Division by zero"));
            }
            Ok(normalize(Rational64::new(x, y)))
        }
        Promoted::Ratios(x, y) => {
            if y.is_zero() {
                return Err(Error::user("Division by zero"));
            }
            Ok(normalize(x / y))
        }
        Promoted::Floats(x, y) => {
            if y == 0.0 {
                return Err(Error::user("Division by zero"));
            }
            Ok(Value::Float(x / y))
        }
    }
}

/// Numeric ordering across Int/Float/Ratio. None when either operand is not
/// a number or a NaN makes the pair unordered.
pub fn try_compare(a: &Value, b: &Value) -> Option<Ordering> {
    match promote(a, b)? {
        Promoted::Ints(x, y) => Some(x.cmp(&y)),
        Promoted::Ratios(x, y) => Some(x.cmp(&y)),
        Promoted::Floats(x, y) => x.partial_cmp(&y),
    }
}

pub fn is_zero(v: &Value) -> Option<bool> {
    match v {
        Value::Int(n) => Some(*n == 0),
        Value::Float(n) => Some(*n == 0.0),
        Value::Ratio(r) => Some(r.is_zero()),
        _ => None,
    }
}
