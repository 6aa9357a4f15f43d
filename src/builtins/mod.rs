//! # Built-in bindings
//!
//! The initial bindings installed into every new namespace, organized by
//! category:
//!
//! - **[arithmetic]**: `+ - * / mod zero?`
//! - **[comparison]**: `= not= < > <= >=`
//! - **[lists]**: `list list? map filter reduce range`
//! - **[console]**: `print`
//!
//! Builtins are installed as referenced values rather than interned vars, so
//! a `def` over a builtin name shadows it in that namespace only.

use crate::error::Error;
use crate::namespace::{Namespace, NsRegistry};
use crate::symbol::Symbol;
use crate::value::{NativeFn, Value};

pub mod arithmetic;
pub mod comparison;
pub mod console;
pub mod lists;

/// Install every builtin category into a namespace. Called once per
/// namespace at creation.
pub fn install(ns: &Namespace) {
    arithmetic::install(ns);
    comparison::install(ns);
    lists::install(ns);
    console::install(ns);
}

pub(crate) fn define(
    ns: &Namespace,
    name: &'static str,
    func: fn(&[Value], &NsRegistry) -> Result<Value, Error>,
) {
    // Builtin names are statically unqualified.
    ns.reference(Symbol::new(name), Value::Native(NativeFn { name, func }))
        .expect("builtin symbol is unqualified");
}
