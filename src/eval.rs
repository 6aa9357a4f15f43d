// ABOUTME: Tree-walking evaluator with tail-position rebinding of (form, env)

use crate::env::{Closure, Env};
use crate::error::Error;
use crate::namespace::NsRegistry;
use crate::symbol::Symbol;
use crate::value::{Lambda, Value};
use std::rc::Rc;

fn head_is(items: &[Value], name: &str) -> bool {
    matches!(&items[0], Value::Symbol(s) if s.is(name))
}

fn unresolved(sym: &Symbol) -> Error {
    Error::resolution(format!(
        "Unable to resolve symbol: {} in this context",
        sym
    ))
}

/// Resolve `ns/name` through the current namespace's aliases, falling back
/// to the registry.
fn resolve_qualified(sym: &Symbol, env: &Env, registry: &NsRegistry) -> Result<Value, Error> {
    let ns_name = Symbol::new(sym.ns().expect("qualified symbol"));
    let target = env
        .namespace()
        .lookup_alias(&ns_name)
        .or_else(|| registry.find(&ns_name))
        .ok_or_else(|| Error::resolution(format!("No such namespace: {}", ns_name)))?;

    target.lookup(&sym.without_ns()).ok_or_else(|| unresolved(sym))
}

fn bind_params(lambda: &Rc<Lambda>, args: Vec<Value>) -> Result<Rc<Closure>, Error> {
    if lambda.params.len() != args.len() {
        return Err(Error::arity(
            "fn",
            lambda.params.len().to_string(),
            args.len(),
        ));
    }

    let scope_sym = Symbol::new(format!("fn__{:p}", Rc::as_ptr(lambda)));
    let closure = Closure::new(scope_sym, lambda.outer.clone());
    for (param, arg) in lambda.params.iter().zip(args) {
        closure.intern(param).bind_root(arg);
    }
    Ok(closure)
}

/// Evaluate an expanded form. `do`, `if`, and direct Lambda calls rebind
/// `form`/`env` and continue at the dispatch head instead of recursing, so
/// self-recursive tail loops run in bounded host stack.
pub fn eval(form: Value, env: Env, registry: &NsRegistry) -> Result<Value, Error> {
    let mut form = form;
    let mut env = env;

    loop {
        let items = match form {
            Value::Symbol(sym) => {
                return if sym.ns().is_some() {
                    resolve_qualified(&sym, &env, registry)
                } else {
                    env.lookup(&sym).ok_or_else(|| unresolved(&sym))
                };
            }
            Value::List(items) => items,
            other => return Ok(other),
        };

        // The empty list evaluates to itself.
        if items.is_empty() {
            return Ok(Value::List(items));
        }

        if head_is(&items, "def") {
            if items.len() != 3 {
                return Err(Error::syntax("Wrong number of forms given to def"));
            }
            let sym = match &items[1] {
                Value::Symbol(s) => s.clone(),
                _ => return Err(Error::syntax("First argument to def must be a Symbol")),
            };
            let var = env.intern(&sym)?;
            let value = eval(items[2].clone(), env.clone(), registry)?;
            var.bind_root(value);
            return Ok(Value::Var(var));
        }

        if head_is(&items, "do") {
            let mut items = items;
            let last = items.pop().expect("non-empty do");
            for f in items.into_iter().skip(1) {
                eval(f, env.clone(), registry)?;
            }
            form = last;
            continue;
        }

        if head_is(&items, "if") {
            if items.len() != 3 && items.len() != 4 {
                return Err(Error::syntax("Wrong number of forms given to if"));
            }
            let mut items = items.into_iter();
            items.next();
            let question = items.next().expect("if question");
            let answer = items.next().expect("if answer");
            let alternative = items.next();

            form = if eval(question, env.clone(), registry)?.is_truthy() {
                answer
            } else {
                alternative.unwrap_or(Value::Nil)
            };
            continue;
        }

        if head_is(&items, "quote") {
            if items.len() != 2 {
                return Err(Error::syntax("Wrong number of forms given to quote"));
            }
            let mut items = items;
            return Ok(items.swap_remove(1));
        }

        if head_is(&items, "fn") {
            let params = match items.get(1) {
                Some(Value::Vector(params)) => params
                    .iter()
                    .map(|p| match p {
                        Value::Symbol(s) => Ok(s.clone()),
                        other => Err(Error::syntax(format!(
                            "Unsupported binding form: {}",
                            other
                        ))),
                    })
                    .collect::<Result<Vec<_>, _>>()?,
                _ => return Err(Error::syntax("Parameter declaration should be a vector")),
            };
            let body = items.get(2).cloned().unwrap_or(Value::Nil);
            return Ok(Value::Lambda(Rc::new(Lambda {
                params,
                body,
                outer: env.clone(),
            })));
        }

        // Application: evaluate every sub-form, then enter the function.
        let mut evaluated = Vec::with_capacity(items.len());
        for item in items {
            evaluated.push(eval(item, env.clone(), registry)?);
        }
        let func = evaluated.remove(0);
        let args = evaluated;

        match func {
            Value::Lambda(lambda) => {
                let closure = bind_params(&lambda, args)?;
                form = lambda.body.clone();
                env = Env::Closure(closure);
            }
            Value::Native(native) => return (native.func)(&args, registry),
            other => return Err(Error::NotCallable(other.to_string())),
        }
    }
}

/// Apply a callable outside the evaluator's tail loop; used by the expander
/// for macros and by the higher-order builtins.
pub fn apply(func: &Value, args: Vec<Value>, registry: &NsRegistry) -> Result<Value, Error> {
    match func {
        Value::Native(native) => (native.func)(&args, registry),
        Value::Lambda(lambda) => {
            let closure = bind_params(lambda, args)?;
            eval(lambda.body.clone(), Env::Closure(closure), registry)
        }
        other => Err(Error::NotCallable(other.to_string())),
    }
}
