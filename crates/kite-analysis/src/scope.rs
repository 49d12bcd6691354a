//! Lexical scopes.
//!
//! ```text
//! universe
//!   └── package
//!         ├── file (imports)
//!         └── function / type-parameter scopes
//! ```

use std::collections::HashMap;

use crate::objects::{ObjKey, ScopeKey, TCObjects};

#[derive(Debug)]
pub struct Scope {
    parent: Option<ScopeKey>,
    children: Vec<ScopeKey>,
    elems: HashMap<String, ObjKey>,
    comment: String,
}

impl Scope {
    pub fn new(parent: Option<ScopeKey>, comment: String) -> Scope {
        Scope {
            parent,
            children: Vec::new(),
            elems: HashMap::new(),
            comment,
        }
    }

    pub fn parent(&self) -> Option<ScopeKey> {
        self.parent
    }

    pub fn children(&self) -> &[ScopeKey] {
        &self.children
    }

    pub fn add_child(&mut self, child: ScopeKey) {
        self.children.push(child);
    }

    pub fn comment(&self) -> &str {
        &self.comment
    }

    pub fn len(&self) -> usize {
        self.elems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elems.is_empty()
    }

    pub fn lookup(&self, name: &str) -> Option<ObjKey> {
        self.elems.get(name).copied()
    }

    /// Names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.elems.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Inserts `obj` unless the scope already has an object with the same
    /// name, in which case that object is returned and nothing changes.
    pub fn insert(key: ScopeKey, obj: ObjKey, objs: &mut TCObjects) -> Option<ObjKey> {
        let name = objs.lobjs[obj].name().to_string();
        if let Some(alt) = objs.scopes[key].lookup(&name) {
            return Some(alt);
        }
        objs.scopes[key].elems.insert(name, obj);
        if objs.lobjs[obj].parent().is_none() {
            objs.lobjs[obj].set_parent(Some(key));
        }
        None
    }

    /// Looks `name` up in `key` and its parents. Returns the scope the object
    /// was found in along with the object.
    pub fn lookup_parent(key: ScopeKey, name: &str, objs: &TCObjects) -> Option<(ScopeKey, ObjKey)> {
        let mut cur = Some(key);
        while let Some(k) = cur {
            let scope = &objs.scopes[k];
            if let Some(obj) = scope.lookup(name) {
                return Some((k, obj));
            }
            cur = scope.parent;
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kite_common::span::Span;

    #[test]
    fn test_insert_reports_existing() {
        let mut objs = TCObjects::new();
        let s = objs.new_scope(None, "test");
        let a = objs.new_var(Span::dummy(), None, "a".into(), None);
        let a2 = objs.new_var(Span::dummy(), None, "a".into(), None);
        assert_eq!(Scope::insert(s, a, &mut objs), None);
        assert_eq!(Scope::insert(s, a2, &mut objs), Some(a));
        assert_eq!(objs.lobjs[a].parent(), Some(s));
        assert_eq!(objs.lobjs[a2].parent(), None);
    }

    #[test]
    fn test_lookup_parent_walks_outward() {
        let mut objs = TCObjects::new();
        let outer = objs.new_scope(None, "outer");
        let inner = objs.new_scope(Some(outer), "inner");
        let x = objs.new_var(Span::dummy(), None, "x".into(), None);
        Scope::insert(outer, x, &mut objs);
        assert_eq!(Scope::lookup_parent(inner, "x", &objs), Some((outer, x)));
        assert_eq!(Scope::lookup_parent(inner, "y", &objs), None);
        assert_eq!(objs.scopes[outer].children(), &[inner]);
    }
}
