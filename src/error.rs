// src/error.rs

//! Error types for repkg
//!
//! Version parse failures are not part of this enum: they are recovered
//! inside the version module and never reach a caller.

use std::path::PathBuf;
use thiserror::Error;

/// Errors produced by the rule store, the resolver and their collaborators
#[derive(Debug, Error)]
pub enum Error {
    /// A privileged operation was attempted by an unprivileged caller
    #[error("Permission denied: '{0}' must be run as root")]
    PermissionDenied(String),

    /// Wave computation found packages that wait on each other
    #[error("Dependency cycle detected between pending packages: {}", .0.join(", "))]
    CycleError(Vec<String>),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to write rule file {path}: {source}")]
    RuleWriteError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to remove rule file {path}: {source}")]
    RuleRemoveError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Not found: {0}")]
    NotFoundError(String),

    #[error("Database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// The package manager could not be queried
    #[error("Package query failed: {0}")]
    QueryError(String),

    #[error("Frontend error: {0}")]
    FrontendError(String),
}

/// Result type for repkg operations
pub type Result<T> = std::result::Result<T, Error>;
