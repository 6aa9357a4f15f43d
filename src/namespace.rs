// ABOUTME: Namespaces owning symbol->var mappings, plus the process registry

use crate::builtins;
use crate::error::Error;
use crate::symbol::Symbol;
use crate::value::Value;
use crate::var::Var;
use log::debug;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// A mapping entry: a var interned here, or an arbitrary referenced value
/// (how the builtin bindings are seeded).
#[derive(Debug, Clone)]
pub enum Binding {
    Var(Rc<Var>),
    Value(Value),
}

#[derive(Debug)]
pub struct Namespace {
    name: Symbol,
    mappings: RefCell<HashMap<Symbol, Binding>>,
    aliases: RefCell<HashMap<Symbol, Rc<Namespace>>>,
}

impl Namespace {
    /// A fresh namespace, seeded with the builtin bindings.
    pub fn new(name: Symbol) -> Rc<Self> {
        let ns = Rc::new(Namespace {
            name,
            mappings: RefCell::new(HashMap::new()),
            aliases: RefCell::new(HashMap::new()),
        });
        builtins::install(&ns);
        ns
    }

    pub fn name(&self) -> &Symbol {
        &self.name
    }

    /// Intern a symbol, creating its var on first use. An existing mapping
    /// is returned only if it is a var homed in this namespace; a referenced
    /// value (such as a builtin) is displaced by a fresh var, so `def` over
    /// a builtin shadows it here without touching other namespaces.
    pub fn intern(&self, sym: &Symbol) -> Result<Rc<Var>, Error> {
        if sym.ns().is_some() {
            return Err(Error::user(format!(
                "Can't intern namespace-qualified symbol: {}",
                sym
            )));
        }

        let mut mappings = self.mappings.borrow_mut();
        if let Some(Binding::Var(v)) = mappings.get(sym) {
            if v.ns() == Some(&self.name) {
                return Ok(Rc::clone(v));
            }
        }

        let v = Rc::new(Var::new(sym.clone(), Some(self.name.clone())));
        mappings.insert(sym.clone(), Binding::Var(Rc::clone(&v)));
        Ok(v)
    }

    /// The value a symbol resolves to here: a var's root, or a referenced
    /// value verbatim.
    pub fn lookup(&self, sym: &Symbol) -> Option<Value> {
        match self.mappings.borrow().get(sym) {
            Some(Binding::Var(v)) => Some(v.root()),
            Some(Binding::Value(v)) => Some(v.clone()),
            None => None,
        }
    }

    pub fn find_interned_var(&self, sym: &Symbol) -> Option<Rc<Var>> {
        match self.mappings.borrow().get(sym) {
            Some(Binding::Var(v)) => Some(Rc::clone(v)),
            _ => None,
        }
    }

    /// Map a symbol directly to a value without creating a var.
    pub fn reference(&self, sym: Symbol, value: Value) -> Result<(), Error> {
        if sym.ns().is_some() {
            return Err(Error::user(format!(
                "Can't intern namespace-qualified symbol: {}",
                sym
            )));
        }

        self.mappings.borrow_mut().insert(sym, Binding::Value(value));
        Ok(())
    }

    /// Every symbol mapped here; feeds REPL tab completion.
    pub fn mapped_symbols(&self) -> Vec<Symbol> {
        self.mappings.borrow().keys().cloned().collect()
    }

    pub fn add_alias(&self, alias: Symbol, ns: Rc<Namespace>) {
        self.aliases.borrow_mut().entry(alias).or_insert(ns);
    }

    pub fn lookup_alias(&self, alias: &Symbol) -> Option<Rc<Namespace>> {
        self.aliases.borrow().get(alias).cloned()
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// The process-wide namespace registry. Owned by the embedder and threaded
/// explicitly so tests get isolated worlds; namespaces are never removed.
#[derive(Debug, Default)]
pub struct NsRegistry {
    namespaces: RefCell<HashMap<Symbol, Rc<Namespace>>>,
}

impl NsRegistry {
    pub fn new() -> Self {
        NsRegistry {
            namespaces: RefCell::new(HashMap::new()),
        }
    }

    pub fn find(&self, name: &Symbol) -> Option<Rc<Namespace>> {
        self.namespaces.borrow().get(name).cloned()
    }

    pub fn find_or_create(&self, name: &Symbol) -> Rc<Namespace> {
        if let Some(ns) = self.find(name) {
            return ns;
        }

        debug!("creating namespace {}", name);
        let ns = Namespace::new(name.clone());
        self.namespaces
            .borrow_mut()
            .insert(name.clone(), Rc::clone(&ns));
        ns
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intern_is_idempotent() {
        let ns = Namespace::new(Symbol::new("user"));
        let a = ns.intern(&Symbol::new("x")).unwrap();
        let b = ns.intern(&Symbol::new("x")).unwrap();
        assert!(Rc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_intern_rejects_qualified_symbol() {
        let ns = Namespace::new(Symbol::new("user"));
        assert!(ns.intern(&Symbol::qualified("other", "x")).is_err());
    }

    #[test]
    fn test_new_namespace_seeds_builtins() {
        let ns = Namespace::new(Symbol::new("user"));
        assert!(ns.lookup(&Symbol::new("+")).is_some());
        assert!(ns.lookup(&Symbol::new("list")).is_some());
        assert!(ns.lookup(&Symbol::new("zero?")).is_some());
    }

    #[test]
    fn test_intern_displaces_referenced_builtin() {
        let ns = Namespace::new(Symbol::new("user"));
        let v = ns.intern(&Symbol::new("+")).unwrap();
        v.bind_root(Value::Int(42));
        assert_eq!(ns.lookup(&Symbol::new("+")), Some(Value::Int(42)));

        // Other namespaces keep the builtin.
        let other = Namespace::new(Symbol::new("other"));
        assert!(matches!(
            other.lookup(&Symbol::new("+")),
            Some(Value::Native(_))
        ));
    }

    #[test]
    fn test_lookup_missing_symbol() {
        let ns = Namespace::new(Symbol::new("user"));
        assert!(ns.lookup(&Symbol::new("nope")).is_none());
    }

    #[test]
    fn test_aliases() {
        let registry = NsRegistry::new();
        let core = registry.find_or_create(&Symbol::new("mage.core"));
        let user = registry.find_or_create(&Symbol::new("user"));

        user.add_alias(Symbol::new("core"), Rc::clone(&core));
        let found = user.lookup_alias(&Symbol::new("core")).unwrap();
        assert!(Rc::ptr_eq(&found, &core));

        // First alias wins.
        let other = registry.find_or_create(&Symbol::new("other"));
        user.add_alias(Symbol::new("core"), other);
        let still = user.lookup_alias(&Symbol::new("core")).unwrap();
        assert!(Rc::ptr_eq(&still, &core));
    }

    #[test]
    fn test_find_or_create_is_idempotent() {
        let registry = NsRegistry::new();
        let a = registry.find_or_create(&Symbol::new("user"));
        let b = registry.find_or_create(&Symbol::new("user"));
        assert!(Rc::ptr_eq(&a, &b));
        assert!(registry.find(&Symbol::new("user")).is_some());
        assert!(registry.find(&Symbol::new("missing")).is_none());
    }
}
