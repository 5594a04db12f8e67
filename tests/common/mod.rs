// tests/common/mod.rs

//! Shared test utilities and helpers for integration tests.

#![allow(dead_code)]

use repkg::{RuleDirs, RuleTier, db};
use rusqlite::Connection;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// Rule directories and a state database inside a temporary directory
pub struct TestEnv {
    pub temp: TempDir,
    pub dirs: RuleDirs,
    pub db_path: PathBuf,
}

impl TestEnv {
    pub fn new() -> Self {
        let temp = tempfile::tempdir().unwrap();
        let dirs = RuleDirs {
            user: temp.path().join("home/.config/repkg/rules"),
            override_dir: temp.path().join("etc/repkg/rules"),
            system: temp.path().join("usr/lib/repkg/rules"),
        };
        let db_path = temp.path().join("var/lib/repkg/state.db");
        Self { temp, dirs, db_path }
    }

    /// Write `<name>.rule` into the directory of `tier`
    pub fn write_rule(&self, tier: RuleTier, name: &str, content: &str) {
        let dir = match tier {
            RuleTier::User => &self.dirs.user,
            RuleTier::Override => &self.dirs.override_dir,
            RuleTier::System => &self.dirs.system,
        };
        fs::create_dir_all(dir).unwrap();
        fs::write(dir.join(format!("{}.rule", name)), content).unwrap();
    }

    /// Open the state database, creating it on first use
    pub fn connect(&self) -> Connection {
        db::open_or_init(&self.db_path).unwrap()
    }
}

pub fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}
