//! List operations: list, list?, map, filter, reduce, range
//!
//! The higher-order transforms are eager: they walk a List or Vector and
//! return a List.

use crate::error::{Error, ARITY_ONE, ARITY_ONE_TO_THREE, ARITY_TWO, ARITY_TWO_OR_THREE};
use crate::eval;
use crate::namespace::{Namespace, NsRegistry};
use crate::value::Value;

/// Constructs a List from its arguments.
pub fn builtin_list(args: &[Value], _registry: &NsRegistry) -> Result<Value, Error> {
    Ok(Value::List(args.to_vec()))
}

/// Tests for List; vectors and nil are not lists.
pub fn builtin_list_q(args: &[Value], _registry: &NsRegistry) -> Result<Value, Error> {
    if args.len() != 1 {
        return Err(Error::arity("list?", ARITY_ONE, args.len()));
    }
    Ok(Value::Bool(matches!(args[0], Value::List(_))))
}

fn seq_arg<'a>(name: &'static str, args: &'a [Value], position: usize) -> Result<&'a [Value], Error> {
    args[position]
        .seq_items()
        .ok_or_else(|| Error::type_error(name, "list or vector", &args[position], position))
}

/// Applies a function to every element, collecting the results.
///
/// ```lisp
/// (map (fn [x] (* x x)) (list 1 2 3)) => (1 4 9)
/// ```
pub fn builtin_map(args: &[Value], registry: &NsRegistry) -> Result<Value, Error> {
    if args.len() != 2 {
        return Err(Error::arity("map", ARITY_TWO, args.len()));
    }

    let items = seq_arg("map", args, 1)?;
    let mut out = Vec::with_capacity(items.len());
    for item in items {
        out.push(eval::apply(&args[0], vec![item.clone()], registry)?);
    }
    Ok(Value::List(out))
}

/// Keeps the elements for which the predicate is truthy.
pub fn builtin_filter(args: &[Value], registry: &NsRegistry) -> Result<Value, Error> {
    if args.len() != 2 {
        return Err(Error::arity("filter", ARITY_TWO, args.len()));
    }

    let items = seq_arg("filter", args, 1)?;
    let mut out = Vec::new();
    for item in items {
        if eval::apply(&args[0], vec![item.clone()], registry)?.is_truthy() {
            out.push(item.clone());
        }
    }
    Ok(Value::List(out))
}

/// Left-folds a two-argument function over a sequence:
/// `(reduce f coll)` seeds with the first element, `(reduce f coll init)`
/// with the given value.
pub fn builtin_reduce(args: &[Value], registry: &NsRegistry) -> Result<Value, Error> {
    if args.len() != 2 && args.len() != 3 {
        return Err(Error::arity("reduce", ARITY_TWO_OR_THREE, args.len()));
    }

    let items = seq_arg("reduce", args, 1)?;
    let (mut acc, rest) = match args.get(2) {
        Some(init) => (init.clone(), items),
        None => {
            let (first, rest) = items.split_first().ok_or_else(|| {
                Error::user("reduce of empty sequence with no initial value")
            })?;
            (first.clone(), rest)
        }
    };

    for item in rest {
        acc = eval::apply(&args[0], vec![acc, item.clone()], registry)?;
    }
    Ok(acc)
}

/// Integer range: `(range end)`, `(range start end)`, or
/// `(range start end step)`.
pub fn builtin_range(args: &[Value], _registry: &NsRegistry) -> Result<Value, Error> {
    if args.is_empty() || args.len() > 3 {
        return Err(Error::arity("range", ARITY_ONE_TO_THREE, args.len()));
    }

    let mut bounds = [0i64; 3];
    for (i, arg) in args.iter().enumerate() {
        match arg {
            Value::Int(n) => bounds[i] = *n,
            other => return Err(Error::type_error("range", "integer", other, i)),
        }
    }

    let (start, end, step) = match args.len() {
        1 => (0, bounds[0], 1),
        2 => (bounds[0], bounds[1], 1),
        _ => (bounds[0], bounds[1], bounds[2]),
    };
    if step == 0 {
        return Err(Error::user("range step must not be zero"));
    }

    let mut out = Vec::new();
    let mut i = start;
    while (step > 0 && i < end) || (step < 0 && i > end) {
        out.push(Value::Int(i));
        i += step;
    }
    Ok(Value::List(out))
}

pub fn install(ns: &Namespace) {
    super::define(ns, "list", builtin_list);
    super::define(ns, "list?", builtin_list_q);
    super::define(ns, "map", builtin_map);
    super::define(ns, "filter", builtin_filter);
    super::define(ns, "reduce", builtin_reduce);
    super::define(ns, "range", builtin_range);
}
