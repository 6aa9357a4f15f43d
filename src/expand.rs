// ABOUTME: Expander: syntactic rewrites and validation between reader and evaluator

use crate::env::Env;
use crate::error::Error;
use crate::eval;
use crate::macros::MacroTable;
use crate::namespace::{Namespace, NsRegistry};
use crate::symbol::Symbol;
use crate::value::Value;
use log::debug;
use std::rc::Rc;

fn head_is(items: &[Value], name: &str) -> bool {
    matches!(&items[0], Value::Symbol(s) if s.is(name))
}

/// Rewrite a reader form into the shape the evaluator walks. `let` becomes
/// nested immediately-invoked `fn`s, `defmacro` is evaluated now and
/// registered in the table, macro calls are applied to their raw argument
/// forms, and special forms are validated.
pub fn expand(
    form: &Value,
    ns: &Rc<Namespace>,
    macros: &mut MacroTable,
    registry: &NsRegistry,
) -> Result<Value, Error> {
    let items = match form {
        Value::List(items) if !items.is_empty() => items,
        _ => return Ok(form.clone()),
    };

    if head_is(items, "quote") {
        return Ok(form.clone());
    }

    if head_is(items, "if") {
        return expand_children(items, ns, macros, registry);
    }

    if head_is(items, "fn") {
        return expand_fn(items, ns, macros, registry);
    }

    if head_is(items, "def") {
        return expand_def(items, ns, macros, registry);
    }

    if head_is(items, "defmacro") {
        return expand_defmacro(items, ns, macros, registry);
    }

    if head_is(items, "let") {
        return expand_let(items, ns, macros, registry);
    }

    if head_is(items, "do") {
        if items.len() > 1 {
            return expand_children(items, ns, macros, registry);
        }
        return Ok(Value::Nil);
    }

    if head_is(items, "`") {
        return Err(Error::syntax("syntax-quote is reserved and not supported"));
    }

    if let Value::Symbol(sym) = &items[0] {
        if let Some(expander) = macros.get(sym) {
            // Macros receive the raw, unexpanded argument forms.
            let raw_args = items[1..].to_vec();
            let rewritten = eval::apply(&expander, raw_args, registry)?;
            return expand(&rewritten, ns, macros, registry);
        }
    }

    expand_children(items, ns, macros, registry)
}

fn expand_children(
    items: &[Value],
    ns: &Rc<Namespace>,
    macros: &mut MacroTable,
    registry: &NsRegistry,
) -> Result<Value, Error> {
    let expanded = items
        .iter()
        .map(|f| expand(f, ns, macros, registry))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Value::List(expanded))
}

/// `(fn PARAMS BODY…)`: PARAMS must be a vector of symbols; a multi-form
/// body is wrapped in `do`, an absent body becomes nil.
fn expand_fn(
    items: &[Value],
    ns: &Rc<Namespace>,
    macros: &mut MacroTable,
    registry: &NsRegistry,
) -> Result<Value, Error> {
    let params = match items.get(1) {
        Some(Value::Vector(params)) => params,
        _ => return Err(Error::syntax("Parameter declaration should be a vector")),
    };

    for param in params {
        if !matches!(param, Value::Symbol(s) if s.ns().is_none()) {
            return Err(Error::syntax(format!("Unsupported binding form: {}", param)));
        }
    }

    let body = match items.len() {
        2 => Value::Nil,
        3 => items[2].clone(),
        _ => {
            let mut wrapped = vec![Value::Symbol(Symbol::new("do"))];
            wrapped.extend_from_slice(&items[2..]);
            Value::List(wrapped)
        }
    };

    Ok(Value::List(vec![
        items[0].clone(),
        Value::Vector(params.clone()),
        expand(&body, ns, macros, registry)?,
    ]))
}

fn expand_def(
    items: &[Value],
    ns: &Rc<Namespace>,
    macros: &mut MacroTable,
    registry: &NsRegistry,
) -> Result<Value, Error> {
    if items.len() != 3 {
        return Err(Error::syntax("Wrong number of forms given to def"));
    }

    let sym = match &items[1] {
        Value::Symbol(s) => s,
        _ => return Err(Error::syntax("First argument to def must be a Symbol")),
    };

    Ok(Value::List(vec![
        items[0].clone(),
        Value::Symbol(sym.clone()),
        expand(&items[2], ns, macros, registry)?,
    ]))
}

/// `(defmacro NAME PARAMS BODY?)`: assemble the equivalent `fn`, evaluate it
/// in the current namespace, and register the callable. No residual form.
fn expand_defmacro(
    items: &[Value],
    ns: &Rc<Namespace>,
    macros: &mut MacroTable,
    registry: &NsRegistry,
) -> Result<Value, Error> {
    if items.len() != 3 && items.len() != 4 {
        return Err(Error::syntax("Bad macro form"));
    }

    let name = match &items[1] {
        Value::Symbol(s) => s.clone(),
        _ => return Err(Error::syntax("First argument to defmacro must be a Symbol")),
    };

    let mut fn_form = vec![Value::Symbol(Symbol::new("fn")), items[2].clone()];
    if let Some(body) = items.get(3) {
        fn_form.push(body.clone());
    }

    let expanded = expand(&Value::List(fn_form), ns, macros, registry)?;
    let expander = eval::eval(expanded, Env::Namespace(Rc::clone(ns)), registry)?;

    debug!("registered macro {}", name);
    macros.define(name, expander);
    Ok(Value::Nil)
}

/// `(let BINDINGS BODY?)` rewrites right-to-left into nested
/// immediately-invoked `fn`s:
///
///   (let [x e1 y e2] body) -> ((fn [x] ((fn [y] body) e2)) e1)
fn expand_let(
    items: &[Value],
    ns: &Rc<Namespace>,
    macros: &mut MacroTable,
    registry: &NsRegistry,
) -> Result<Value, Error> {
    let (bindings, body) = match items.len() {
        2 => (&items[1], None),
        3 => (&items[1], Some(&items[2])),
        _ => return Err(Error::syntax("Bad let form")),
    };

    let bindings = match bindings {
        Value::Vector(bindings) => bindings,
        _ => return Err(Error::syntax("let requires a vector for its bindings")),
    };

    if bindings.len() % 2 != 0 {
        return Err(Error::syntax(
            "let requires an even number of forms in binding vector",
        ));
    }

    for binding in bindings.iter().step_by(2) {
        if !matches!(binding, Value::Symbol(s) if s.ns().is_none()) {
            return Err(Error::syntax(format!(
                "Unsupported binding form: {}",
                binding
            )));
        }
    }

    let mut inner = body.cloned().unwrap_or(Value::Nil);
    for pair in bindings.chunks(2).rev() {
        let closure = Value::List(vec![
            Value::Symbol(Symbol::new("fn")),
            Value::Vector(vec![pair[0].clone()]),
            inner,
        ]);
        inner = Value::List(vec![closure, pair[1].clone()]);
    }

    expand(&inner, ns, macros, registry)
}
