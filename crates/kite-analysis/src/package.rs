//! Packages.

use std::fmt;

use crate::objects::{PackageKey, ScopeKey};

#[derive(Debug)]
pub struct Package {
    path: String,
    name: Option<String>,
    scope: ScopeKey,
    imports: Vec<PackageKey>,
    /// Stand-in for a package that failed to import. Member lookups on a
    /// fake package are not reported.
    fake: bool,
    /// The `"C"` pseudo-package.
    foreign: bool,
}

impl Package {
    pub fn new(path: String, scope: ScopeKey) -> Package {
        Package {
            path,
            name: None,
            scope,
            imports: Vec::new(),
            fake: false,
            foreign: false,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// The package name, falling back to the last path element.
    pub fn name(&self) -> &str {
        match &self.name {
            Some(name) => name,
            None => self.path.rsplit('/').next().unwrap_or(&self.path),
        }
    }

    pub fn set_name(&mut self, name: String) {
        self.name = Some(name);
    }

    pub fn scope(&self) -> ScopeKey {
        self.scope
    }

    pub fn imports(&self) -> &[PackageKey] {
        &self.imports
    }

    pub fn add_import(&mut self, pkg: PackageKey) {
        if !self.imports.contains(&pkg) {
            self.imports.push(pkg);
        }
    }

    pub fn fake(&self) -> bool {
        self.fake
    }

    pub fn mark_fake(&mut self) {
        self.fake = true;
    }

    pub fn foreign(&self) -> bool {
        self.foreign
    }

    pub fn mark_foreign(&mut self) {
        self.foreign = true;
    }
}

impl fmt::Display for Package {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "package {} ({:?})", self.name(), self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::ArenaKey;

    #[test]
    fn test_name_falls_back_to_path() {
        let mut p = Package::new("x/y/util".to_string(), ScopeKey::from_usize(0));
        assert_eq!(p.name(), "util");
        p.set_name("u".to_string());
        assert_eq!(p.name(), "u");
        assert_eq!(p.to_string(), "package u (\"x/y/util\")");
    }
}
