// src/db/models/pending.rs

//! Pending rebuild model
//!
//! Each row says that `package` needs a rebuild because `triggered_by` was
//! updated. A package can be pending for several reasons at once.

use crate::error::Result;
use rusqlite::{Connection, Row, params};
use std::collections::{BTreeMap, BTreeSet};

/// Package awaiting rebuild -> packages whose update caused it
pub type PendingMap = BTreeMap<String, BTreeSet<String>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRebuild {
    pub id: Option<i64>,
    pub package: String,
    pub triggered_by: String,
    pub created_at: Option<String>,
}

impl PendingRebuild {
    /// Record that `package` needs a rebuild because of `triggered_by`
    ///
    /// Returns false if the pair was already recorded.
    pub fn insert(conn: &Connection, package: &str, triggered_by: &str) -> Result<bool> {
        let rows = conn.execute(
            "INSERT OR IGNORE INTO pending_rebuilds (package, triggered_by) VALUES (?1, ?2)",
            params![package, triggered_by],
        )?;
        Ok(rows > 0)
    }

    /// All rows recorded for `package`
    pub fn find_by_package(conn: &Connection, package: &str) -> Result<Vec<Self>> {
        let mut stmt = conn.prepare(
            "SELECT id, package, triggered_by, created_at FROM pending_rebuilds
             WHERE package = ?1 ORDER BY triggered_by",
        )?;

        let entries = stmt
            .query_map([package], Self::from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(entries)
    }

    /// List all rows ordered by package, then trigger
    pub fn list_all(conn: &Connection) -> Result<Vec<Self>> {
        let mut stmt = conn.prepare(
            "SELECT id, package, triggered_by, created_at FROM pending_rebuilds
             ORDER BY package, triggered_by",
        )?;

        let entries = stmt
            .query_map([], Self::from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(entries)
    }

    /// The whole table as a map
    pub fn load_map(conn: &Connection) -> Result<PendingMap> {
        let mut map = PendingMap::new();
        for entry in Self::list_all(conn)? {
            map.entry(entry.package).or_default().insert(entry.triggered_by);
        }
        Ok(map)
    }

    /// Names of all pending packages, sorted
    pub fn packages(conn: &Connection) -> Result<Vec<String>> {
        let mut stmt =
            conn.prepare("SELECT DISTINCT package FROM pending_rebuilds ORDER BY package")?;

        let packages = stmt
            .query_map([], |row| row.get(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(packages)
    }

    /// Drop every row of `package`, returning the number removed
    pub fn delete_package(conn: &Connection, package: &str) -> Result<usize> {
        let rows = conn.execute("DELETE FROM pending_rebuilds WHERE package = ?1", [package])?;
        Ok(rows)
    }

    pub fn delete_all(conn: &Connection) -> Result<usize> {
        let rows = conn.execute("DELETE FROM pending_rebuilds", [])?;
        Ok(rows)
    }

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: Some(row.get(0)?),
            package: row.get(1)?,
            triggered_by: row.get(2)?,
            created_at: row.get(3)?,
        })
    }
}
