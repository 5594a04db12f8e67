// src/packages/mod.rs

//! Access to the system package database
//!
//! The rule store and the resolver only need a handful of read-only queries,
//! collected in the `PackageBackend` trait. `Pacman` answers them from the
//! local pacman database, `MemoryBackend` from a fixed in-memory table.

pub mod memory;
pub mod pacman_query;

pub use memory::MemoryBackend;
pub use pacman_query::Pacman;

use crate::error::Result;
use std::collections::BTreeSet;

/// Read-only queries against the installed package set
pub trait PackageBackend {
    /// Names of all installed packages
    fn installed_packages(&self) -> Result<BTreeSet<String>>;

    /// Installed packages that no sync repository provides (AUR and local builds)
    fn foreign_packages(&self) -> Result<BTreeSet<String>>;

    /// Installed version of `name`; fails if the package is not installed
    fn package_version(&self, name: &str) -> Result<String>;

    /// Runtime dependencies of `name`, without version constraints
    fn dependencies(&self, name: &str) -> Result<Vec<String>>;
}
