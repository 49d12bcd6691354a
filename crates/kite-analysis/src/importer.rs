//! Package importer.
//!
//! The checker resolves import paths through this seam. Project analysis
//! checks packages in dependency order and hands already checked packages
//! to dependents through a `MapImporter`.

use std::collections::{HashMap, HashSet};

use crate::objects::PackageKey;

/// Identifies an import: the path as written and the package importing it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImportKey {
    pub path: String,
    pub from: String,
}

impl ImportKey {
    pub fn new(path: &str, from: &str) -> Self {
        ImportKey {
            path: path.to_string(),
            from: from.to_string(),
        }
    }
}

/// Result of an import operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportResult {
    Ok(PackageKey),
    Err(String),
    /// The package is still being checked.
    Cycle,
}

pub trait Importer {
    fn import(&mut self, key: &ImportKey) -> ImportResult;
}

/// An importer that knows no packages.
#[derive(Debug, Default)]
pub struct NullImporter;

impl Importer for NullImporter {
    fn import(&mut self, key: &ImportKey) -> ImportResult {
        ImportResult::Err(format!("cannot import \"{}\"", key.path))
    }
}

/// Imports packages that were checked earlier in the same project.
#[derive(Debug, Default)]
pub struct MapImporter {
    packages: HashMap<String, PackageKey>,
    in_progress: HashSet<String>,
}

impl MapImporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&mut self, path: &str) {
        self.in_progress.insert(path.to_string());
    }

    pub fn finish(&mut self, path: &str, pkg: PackageKey) {
        self.in_progress.remove(path);
        self.packages.insert(path.to_string(), pkg);
    }

    pub fn get(&self, path: &str) -> Option<PackageKey> {
        self.packages.get(path).copied()
    }
}

impl Importer for MapImporter {
    fn import(&mut self, key: &ImportKey) -> ImportResult {
        if self.in_progress.contains(&key.path) {
            return ImportResult::Cycle;
        }
        match self.packages.get(&key.path) {
            Some(pkg) => ImportResult::Ok(*pkg),
            None => ImportResult::Err(format!("package \"{}\" not found", key.path)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::ArenaKey;

    #[test]
    fn test_map_importer() {
        let mut imp = MapImporter::new();
        let key = ImportKey::new("a/b", "main");
        assert_eq!(
            imp.import(&key),
            ImportResult::Err("package \"a/b\" not found".to_string())
        );
        imp.begin("a/b");
        assert_eq!(imp.import(&key), ImportResult::Cycle);
        let pkg = PackageKey::from_usize(3);
        imp.finish("a/b", pkg);
        assert_eq!(imp.import(&key), ImportResult::Ok(pkg));
        assert_eq!(imp.get("a/b"), Some(pkg));
    }

    #[test]
    fn test_null_importer() {
        let mut imp = NullImporter;
        assert!(matches!(imp.import(&ImportKey::new("x", "")), ImportResult::Err(_)));
    }
}
