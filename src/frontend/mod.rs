// src/frontend/mod.rs

//! Rebuild frontend
//!
//! The actual rebuild is delegated to an AUR helper or pacman itself. The
//! command line is stored in the state database; without a stored value
//! the first helper found in `PATH` is used. In waved mode the frontend runs
//! once per wave and the run stops at the first failure, otherwise it runs
//! once with every package in wave order.

use crate::db::models::Setting;
use crate::error::{Error, Result};
use crate::privilege::Privilege;
use crate::resolver::Wave;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::process::{Command, Stdio};
use tracing::{debug, info, warn};

const SETTING_KEY: &str = "frontend";

/// Helpers tried in order when no frontend is configured
const DEFAULT_FRONTENDS: &[&[&str]] = &[
    &["yay", "-S", "--rebuild"],
    &["pacaur", "-S", "--rebuild"],
    &["trizen", "-S"],
];

const FALLBACK_FRONTEND: &[&str] = &["pacman", "-S"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrontendConfig {
    /// Program followed by its arguments; package names are appended
    pub command: Vec<String>,
    /// Run once per wave instead of once for all packages
    #[serde(default)]
    pub waved: bool,
}

impl FrontendConfig {
    pub fn new(command: Vec<String>, waved: bool) -> Result<Self> {
        if command.first().is_none_or(|program| program.trim().is_empty()) {
            return Err(Error::FrontendError("Frontend command must not be empty".to_string()));
        }
        Ok(Self { command, waved })
    }

    /// First installed default helper, `pacman -S` if none is found
    pub fn detect() -> Self {
        let command = DEFAULT_FRONTENDS
            .iter()
            .find(|candidate| which::which(candidate[0]).is_ok())
            .copied()
            .unwrap_or(FALLBACK_FRONTEND);

        debug!("Using default frontend {}", command[0]);
        Self {
            command: command.iter().map(|s| s.to_string()).collect(),
            waved: false,
        }
    }

    /// The stored frontend, if any
    pub fn stored(conn: &Connection) -> Result<Option<Self>> {
        let Some(value) = Setting::get(conn, SETTING_KEY)? else {
            return Ok(None);
        };

        let config = serde_json::from_str(&value).map_err(|e| {
            Error::FrontendError(format!("Stored frontend setting is invalid: {}", e))
        })?;
        Ok(Some(config))
    }

    /// The stored frontend, or the detected default
    pub fn load(conn: &Connection) -> Result<Self> {
        Ok(Self::stored(conn)?.unwrap_or_else(Self::detect))
    }

    /// Persist this frontend; requires root
    pub fn save(&self, conn: &Connection, privilege: Privilege) -> Result<()> {
        privilege.require_root("frontend --set")?;

        let value = serde_json::to_string(self)
            .map_err(|e| Error::FrontendError(format!("Failed to encode frontend: {}", e)))?;
        Setting::set(conn, SETTING_KEY, &value)?;

        info!("Updated rebuild frontend to {}", self);
        Ok(())
    }

    /// Forget the stored frontend; returns whether one was stored
    pub fn reset(conn: &Connection, privilege: Privilege) -> Result<bool> {
        privilege.require_root("frontend --reset")?;
        let removed = Setting::delete(conn, SETTING_KEY)?;
        if removed {
            info!("Reset rebuild frontend to the default");
        }
        Ok(removed)
    }

    pub fn program(&self) -> &str {
        self.command.first().map(String::as_str).unwrap_or_default()
    }

    /// Rebuild `waves` and return the frontend's exit code
    pub fn run_rebuild(&self, waves: &[Wave]) -> Result<i32> {
        if waves.iter().all(|w| w.is_empty()) {
            debug!("Nothing to rebuild");
            return Ok(0);
        }

        if self.waved {
            for (i, wave) in waves.iter().enumerate() {
                info!("Rebuilding wave {} of {}", i + 1, waves.len());
                let code = self.spawn(wave.iter())?;
                if code != 0 {
                    warn!("Frontend failed on wave {} with exit code {}", i + 1, code);
                    return Ok(code);
                }
            }
            Ok(0)
        } else {
            self.spawn(waves.iter().flatten())
        }
    }

    fn spawn<'p>(&self, packages: impl Iterator<Item = &'p String>) -> Result<i32> {
        let (program, args) = self
            .command
            .split_first()
            .ok_or_else(|| Error::FrontendError("Frontend command is empty".to_string()))?;
        let packages: Vec<&String> = packages.collect();

        debug!("Executing: {} {:?} {:?}", program, args, packages);
        let status = Command::new(program)
            .args(args)
            .args(&packages)
            .stdin(Stdio::inherit())
            .status()
            .map_err(|e| Error::FrontendError(format!("Failed to run '{}': {}", program, e)))?;

        Ok(match status.code() {
            Some(code) => code,
            None => {
                warn!("Frontend '{}' was terminated by a signal", program);
                1
            }
        })
    }
}

impl fmt::Display for FrontendConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({})",
            self.command.join(" "),
            if self.waved { "waved" } else { "batched" }
        )
    }
}
