// src/db/models/baseline.rs

//! Last observed dependency versions
//!
//! Scoped rules compare the new version of a dependency with the version
//! seen the last time the owner's rule was evaluated.

use crate::error::Result;
use rusqlite::{Connection, OptionalExtension, Row, params};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionBaseline {
    pub owner: String,
    pub dependency: String,
    pub version: String,
    pub updated_at: Option<String>,
}

impl VersionBaseline {
    /// Version of `dependency` last recorded for `owner`
    pub fn find(conn: &Connection, owner: &str, dependency: &str) -> Result<Option<String>> {
        let version = conn
            .query_row(
                "SELECT version FROM version_baselines WHERE owner = ?1 AND dependency = ?2",
                params![owner, dependency],
                |row| row.get(0),
            )
            .optional()?;
        Ok(version)
    }

    /// Record `version` as the new baseline, replacing any earlier one
    pub fn upsert(conn: &Connection, owner: &str, dependency: &str, version: &str) -> Result<()> {
        conn.execute(
            "INSERT INTO version_baselines (owner, dependency, version) VALUES (?1, ?2, ?3)
             ON CONFLICT(owner, dependency)
             DO UPDATE SET version = excluded.version, updated_at = CURRENT_TIMESTAMP",
            params![owner, dependency, version],
        )?;
        Ok(())
    }

    pub fn list_all(conn: &Connection) -> Result<Vec<Self>> {
        let mut stmt = conn.prepare(
            "SELECT owner, dependency, version, updated_at FROM version_baselines
             ORDER BY owner, dependency",
        )?;

        let baselines = stmt
            .query_map([], Self::from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(baselines)
    }

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            owner: row.get(0)?,
            dependency: row.get(1)?,
            version: row.get(2)?,
            updated_at: row.get(3)?,
        })
    }
}
