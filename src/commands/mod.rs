// src/commands/mod.rs
//! Command handlers for the repkg CLI

mod frontend;
mod pending;
mod rebuild;
mod rules;
mod update;

pub use frontend::cmd_frontend;
pub use pending::{cmd_clear, cmd_list};
pub use rebuild::cmd_rebuild;
pub use rules::{cmd_create, cmd_remove, cmd_rules};
pub use update::cmd_update;

use anyhow::{Context as _, Result};
use repkg::{Config, PackageBackend, Privilege, RuleStore};
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Everything a command needs besides its own arguments
pub struct Context {
    pub config: Config,
    pub db_path: PathBuf,
    pub privilege: Privilege,
}

impl Context {
    /// `db_path` overrides the database location from `config`
    pub fn new(config: Config, db_path: Option<PathBuf>, privilege: Privilege) -> Self {
        let db_path = db_path.unwrap_or_else(|| config.state.db_path.clone());
        Self {
            config,
            db_path,
            privilege,
        }
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Rule store over the configured directories
    pub fn rule_store<'a>(&self, backend: &'a dyn PackageBackend) -> RuleStore<'a> {
        RuleStore::new(self.config.rule_dirs(), backend, self.privilege)
            .with_wildcard_match(self.config.rules.wildcard_match)
    }

    /// Open the state database, creating it if needed
    pub fn open_db(&self) -> Result<Connection> {
        repkg::db::open_or_init(&self.db_path)
            .with_context(|| format!("Failed to open state database {}", self.db_path().display()))
    }

    /// Open the state database for reading; `None` if it was never created
    pub fn open_existing_db(&self) -> Result<Option<Connection>> {
        if !self.db_path.exists() {
            debug!("State database {} does not exist yet", self.db_path.display());
            return Ok(None);
        }
        repkg::db::open(&self.db_path)
            .map(Some)
            .with_context(|| format!("Failed to open state database {}", self.db_path().display()))
    }
}
