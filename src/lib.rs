// src/lib.rs

//! repkg: track and run package rebuilds after dependency updates
//!
//! Some packages, typically AUR packages linking against a library or
//! built for a specific language runtime, must be rebuilt when a dependency
//! is updated. repkg keeps the bookkeeping for this:
//!
//! - `rules`: rule files declaring which dependencies trigger which owner
//! - `resolver`: the persistent pending set, fed by update events, and its
//!   ordering into rebuild waves
//! - `version`: decides whether a version change is relevant for a rule
//! - `frontend`: runs the actual rebuild through an AUR helper or pacman
//!
//! State lives in a small SQLite database, package information comes from
//! a `PackageBackend` (pacman in production).

pub mod config;
pub mod db;
mod error;
pub mod frontend;
pub mod logging;
pub mod packages;
pub mod privilege;
pub mod resolver;
pub mod rules;
pub mod version;

pub use config::Config;
pub use error::{Error, Result};
pub use frontend::FrontendConfig;
pub use packages::{MemoryBackend, PackageBackend, Pacman};
pub use privilege::Privilege;
pub use resolver::{PendingMap, RebuildResolver, UpdateReport, Wave};
pub use rules::{Rule, RuleDirs, RuleIndex, RuleSource, RuleStore, RuleTier, WildcardMatch};
pub use version::{PkgVersion, RuleScope, VersionRange};
