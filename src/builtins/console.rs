//! Console output: print

use crate::error::Error;
use crate::namespace::{Namespace, NsRegistry};
use crate::value::Value;

// Strings and chars print their raw contents; everything else uses the
// readable representation.
fn render(value: &Value) -> String {
    match value {
        Value::Str(s) => s.clone(),
        Value::Char(c) => c.to_string(),
        other => other.to_string(),
    }
}

/// Prints each argument on its own line and returns nil.
pub fn builtin_print(args: &[Value], _registry: &NsRegistry) -> Result<Value, Error> {
    for arg in args {
        println!("{}", render(arg));
    }
    Ok(Value::Nil)
}

pub fn install(ns: &Namespace) {
    super::define(ns, "print", builtin_print);
}
