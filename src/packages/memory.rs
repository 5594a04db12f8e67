// src/packages/memory.rs

//! In-memory package backend for tests and dry runs

use super::PackageBackend;
use crate::error::{Error, Result};
use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone)]
struct MemoryPackage {
    version: String,
    foreign: bool,
    dependencies: Vec<String>,
}

/// A fixed package table; versions can be changed to simulate upgrades
#[derive(Debug, Default)]
pub struct MemoryBackend {
    packages: RefCell<BTreeMap<String, MemoryPackage>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a repository package
    pub fn with_package(self, name: &str, version: &str) -> Self {
        self.insert(name, version, false, &[]);
        self
    }

    /// Add a foreign (non-repository) package
    pub fn with_foreign(self, name: &str, version: &str) -> Self {
        self.insert(name, version, true, &[]);
        self
    }

    /// Add a foreign package together with its dependencies
    pub fn with_dependencies(self, name: &str, version: &str, deps: &[&str]) -> Self {
        self.insert(name, version, true, deps);
        self
    }

    /// Change the installed version of an existing package
    pub fn set_version(&self, name: &str, version: &str) {
        if let Some(pkg) = self.packages.borrow_mut().get_mut(name) {
            pkg.version = version.to_string();
        }
    }

    fn insert(&self, name: &str, version: &str, foreign: bool, deps: &[&str]) {
        self.packages.borrow_mut().insert(
            name.to_string(),
            MemoryPackage {
                version: version.to_string(),
                foreign,
                dependencies: deps.iter().map(|d| d.to_string()).collect(),
            },
        );
    }

    fn not_found(name: &str) -> Error {
        Error::NotFoundError(format!("Package '{}' is not installed", name))
    }
}

impl PackageBackend for MemoryBackend {
    fn installed_packages(&self) -> Result<BTreeSet<String>> {
        Ok(self.packages.borrow().keys().cloned().collect())
    }

    fn foreign_packages(&self) -> Result<BTreeSet<String>> {
        Ok(self
            .packages
            .borrow()
            .iter()
            .filter(|(_, pkg)| pkg.foreign)
            .map(|(name, _)| name.clone())
            .collect())
    }

    fn package_version(&self, name: &str) -> Result<String> {
        self.packages
            .borrow()
            .get(name)
            .map(|pkg| pkg.version.clone())
            .ok_or_else(|| Self::not_found(name))
    }

    fn dependencies(&self, name: &str) -> Result<Vec<String>> {
        self.packages
            .borrow()
            .get(name)
            .map(|pkg| pkg.dependencies.clone())
            .ok_or_else(|| Self::not_found(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_backend_queries() {
        let backend = MemoryBackend::new()
            .with_package("glibc", "2.39-1")
            .with_dependencies("libfoo", "1.0-1", &["glibc"]);

        assert_eq!(backend.installed_packages().unwrap().len(), 2);
        assert_eq!(
            backend.foreign_packages().unwrap().into_iter().collect::<Vec<_>>(),
            vec!["libfoo"]
        );
        assert_eq!(backend.dependencies("libfoo").unwrap(), vec!["glibc"]);

        backend.set_version("glibc", "2.40-1");
        assert_eq!(backend.package_version("glibc").unwrap(), "2.40-1");
        assert!(matches!(
            backend.package_version("missing"),
            Err(Error::NotFoundError(_))
        ));
    }
}
