// src/config.rs

//! Configuration file
//!
//! ```toml
//! [rules]
//! user_dir = "/home/me/.config/repkg/rules"
//! override_dir = "/etc/repkg/rules"
//! system_dir = "/usr/lib/repkg/rules"
//! wildcard_match = "foreign"   # or "installed"
//!
//! [state]
//! db_path = "/var/lib/repkg/state.db"
//!
//! [log]
//! level = "warn"
//! ```
//!
//! Every key is optional. A missing file means defaults.

use crate::db::DEFAULT_DB_PATH;
use crate::error::{Error, Result};
use crate::rules::{RuleDirs, WildcardMatch};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Default location of the configuration file
pub const DEFAULT_CONFIG_PATH: &str = "/etc/repkg/config.toml";

/// Environment variable overriding the configuration file location
pub const CONFIG_ENV: &str = "REPKG_CONFIG";

pub const DEFAULT_OVERRIDE_DIR: &str = "/etc/repkg/rules";
pub const DEFAULT_SYSTEM_DIR: &str = "/usr/lib/repkg/rules";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub rules: RulesConfig,
    #[serde(default)]
    pub state: StateConfig,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RulesConfig {
    /// Per-user rule directory; derived from the invoking user when unset
    #[serde(default)]
    pub user_dir: Option<PathBuf>,
    #[serde(default = "default_override_dir")]
    pub override_dir: PathBuf,
    #[serde(default = "default_system_dir")]
    pub system_dir: PathBuf,
    #[serde(default)]
    pub wildcard_match: WildcardMatch,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            user_dir: None,
            override_dir: default_override_dir(),
            system_dir: default_system_dir(),
            wildcard_match: WildcardMatch::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StateConfig {
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LogConfig {
    /// Default filter directive, e.g. `warn` or `repkg=debug`
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_override_dir() -> PathBuf {
    PathBuf::from(DEFAULT_OVERRIDE_DIR)
}

fn default_system_dir() -> PathBuf {
    PathBuf::from(DEFAULT_SYSTEM_DIR)
}

fn default_db_path() -> PathBuf {
    PathBuf::from(DEFAULT_DB_PATH)
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Config {
    /// Load the configuration
    ///
    /// `path` wins over `$REPKG_CONFIG`, which wins over the default path.
    /// Only an explicitly requested file has to exist.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let env_path = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
        let explicit = path.map(Path::to_path_buf).or(env_path);

        match explicit {
            Some(path) => Self::from_file(&path),
            None => match Self::from_file(Path::new(DEFAULT_CONFIG_PATH)) {
                Err(Error::NotFoundError(_)) => {
                    debug!("No configuration at {}, using defaults", DEFAULT_CONFIG_PATH);
                    Ok(Self::default())
                }
                other => other,
            },
        }
    }

    /// Parse a configuration file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(Error::NotFoundError(format!(
                    "Configuration file {} does not exist",
                    path.display()
                )));
            }
            Err(e) => return Err(Error::IoError(e)),
        };

        debug!("Loading configuration from {}", path.display());
        Self::parse(&content)
            .map_err(|e| Error::ConfigError(format!("{}: {}", path.display(), e)))
    }

    fn parse(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Rule directories, resolving the user directory for the invoking user
    pub fn rule_dirs(&self) -> RuleDirs {
        RuleDirs {
            user: self.rules.user_dir.clone().unwrap_or_else(default_user_dir),
            override_dir: self.rules.override_dir.clone(),
            system: self.rules.system_dir.clone(),
        }
    }
}

/// `~/.config/repkg/rules` of the user who invoked repkg
///
/// Under sudo this is the calling user's directory, not root's.
fn default_user_dir() -> PathBuf {
    if let Ok(name) = std::env::var("SUDO_USER")
        && let Ok(Some(user)) = nix::unistd::User::from_name(&name)
    {
        return user.dir.join(".config/repkg/rules");
    }

    dirs::config_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join("repkg/rules")
}
