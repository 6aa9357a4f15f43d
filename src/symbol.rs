// ABOUTME: Interned identifiers with an optional namespace qualifier

use std::fmt;
use std::rc::Rc;

/// An identifier, optionally qualified as `ns/name`.
///
/// Equality and hashing are structural over both fields, so interning the
/// same text twice always yields equal symbols; the `Rc` fields just make
/// clones cheap.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Symbol {
    ns: Option<Rc<str>>,
    name: Rc<str>,
}

impl Symbol {
    /// An unqualified symbol. The text is taken as-is; use [`Symbol::intern`]
    /// for reader-facing `ns/name` parsing and validation.
    pub fn new(name: impl AsRef<str>) -> Self {
        Symbol {
            ns: None,
            name: Rc::from(name.as_ref()),
        }
    }

    pub fn qualified(ns: impl AsRef<str>, name: impl AsRef<str>) -> Self {
        Symbol {
            ns: Some(Rc::from(ns.as_ref())),
            name: Rc::from(name.as_ref()),
        }
    }

    /// Parse symbol text, accepting `name`, `ns/name`, and the lone symbol
    /// `/`. Returns None when the text is not a valid symbol: a qualifier
    /// ending in `:`, a name ending in `:`, any `::` after position 0, an
    /// empty part, or a `/` inside the name.
    pub fn intern(s: &str) -> Option<Self> {
        if s.is_empty() {
            return None;
        }

        if s == "/" {
            return Some(Symbol::new("/"));
        }

        if s.len() > 1 && s[1..].contains("::") {
            return None;
        }

        match s.find('/') {
            None => {
                if s.ends_with(':') {
                    return None;
                }
                Some(Symbol::new(s))
            }
            Some(idx) => {
                let (ns, name) = (&s[..idx], &s[idx + 1..]);
                if ns.is_empty() || name.is_empty() {
                    return None;
                }
                if ns.ends_with(':') || name.ends_with(':') || name.contains('/') {
                    return None;
                }
                Some(Symbol::qualified(ns, name))
            }
        }
    }

    pub fn ns(&self) -> Option<&str> {
        self.ns.as_deref()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The bare (unqualified) form of this symbol.
    pub fn without_ns(&self) -> Symbol {
        Symbol {
            ns: None,
            name: Rc::clone(&self.name),
        }
    }

    /// True for an unqualified symbol with exactly this name. The expander
    /// and evaluator dispatch special forms through this.
    pub fn is(&self, name: &str) -> bool {
        self.ns.is_none() && &*self.name == name
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.ns {
            Some(ns) => write!(f, "{}/{}", ns, self.name),
            None => write!(f, "{}", self.name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intern_idempotence() {
        for s in ["foo", "my.ns/bar", "+", ":kw", "/"] {
            let a = Symbol::intern(s).unwrap();
            let b = Symbol::intern(s).unwrap();
            assert_eq!(a, b);
        }
    }

    #[test]
    fn test_intern_splits_qualifier() {
        let sym = Symbol::intern("mage.core/inc").unwrap();
        assert_eq!(sym.ns(), Some("mage.core"));
        assert_eq!(sym.name(), "inc");
        assert_eq!(sym.to_string(), "mage.core/inc");
    }

    #[test]
    fn test_lone_slash_is_a_symbol() {
        let sym = Symbol::intern("/").unwrap();
        assert_eq!(sym.ns(), None);
        assert_eq!(sym.name(), "/");
    }

    #[test]
    fn test_leading_colon_is_allowed() {
        let sym = Symbol::intern(":a").unwrap();
        assert_eq!(sym.name(), ":a");
        assert_eq!(sym.ns(), None);
    }

    #[test]
    fn test_invalid_symbols_rejected() {
        assert!(Symbol::intern("").is_none());
        assert!(Symbol::intern("name:").is_none());
        assert!(Symbol::intern("ns:/name").is_none());
        assert!(Symbol::intern("ns/name:").is_none());
        assert!(Symbol::intern("a::b").is_none());
        assert!(Symbol::intern("ns/").is_none());
        assert!(Symbol::intern("/name").is_none());
        assert!(Symbol::intern("a/b/c").is_none());
    }

    #[test]
    fn test_double_colon_at_start_is_allowed() {
        // Only `::` after position 0 invalidates.
        assert!(Symbol::intern("::a").is_some());
    }

    #[test]
    fn test_is_matches_unqualified_only() {
        assert!(Symbol::new("def").is("def"));
        assert!(!Symbol::qualified("user", "def").is("def"));
    }

    #[test]
    fn test_without_ns() {
        let sym = Symbol::qualified("user", "x");
        assert_eq!(sym.without_ns(), Symbol::new("x"));
    }
}
