//! Identifier interning.
//!
//! Every identifier the lexer sees is interned once. The AST carries
//! [`Symbol`]s, which compare as integers and resolve back to text through
//! the shared [`SymbolInterner`].

use std::fmt;

use string_interner::{backend::StringBackend, DefaultSymbol, StringInterner};

/// An interned identifier. [`Symbol::DUMMY`] names nothing.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Symbol(pub(crate) Option<DefaultSymbol>);

impl Symbol {
    pub const DUMMY: Symbol = Symbol(None);
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use string_interner::Symbol as _;
        match self.0 {
            Some(s) => write!(f, "#{}", s.to_usize()),
            None => f.write_str("#-"),
        }
    }
}

type Backend = StringBackend<DefaultSymbol>;

/// The identifiers of one analysis, shared by the parser and the checker.
#[derive(Clone)]
pub struct SymbolInterner {
    strings: StringInterner<Backend>,
}

impl SymbolInterner {
    pub fn new() -> Self {
        SymbolInterner {
            strings: StringInterner::new(),
        }
    }

    pub fn intern(&mut self, name: &str) -> Symbol {
        Symbol(Some(self.strings.get_or_intern(name)))
    }

    pub fn resolve(&self, symbol: Symbol) -> Option<&str> {
        self.strings.resolve(symbol.0?)
    }
}

impl Default for SymbolInterner {
    fn default() -> Self {
        SymbolInterner::new()
    }
}

impl fmt::Debug for SymbolInterner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SymbolInterner({} names)", self.strings.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intern_once() {
        let mut names = SymbolInterner::new();
        let list = names.intern("List");
        let push = names.intern("Push");
        assert_eq!(names.intern("List"), list);
        assert_ne!(list, push);
        assert_eq!(names.resolve(push), Some("Push"));
        assert_eq!(format!("{:?}", names), "SymbolInterner(2 names)");
    }

    #[test]
    fn test_dummy_resolves_to_nothing() {
        let names = SymbolInterner::new();
        assert_eq!(names.resolve(Symbol::DUMMY), None);
        assert_eq!(format!("{:?}", Symbol::DUMMY), "#-");
    }
}
