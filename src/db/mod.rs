// src/db/mod.rs

//! Persistent state for repkg
//!
//! A single SQLite file holds the pending rebuild map, the version
//! baselines used for scoped rules and a few settings. Every mutation of
//! the pending map runs inside one transaction, so a crash never leaves a
//! half-applied update behind.

pub mod models;
pub mod schema;

use crate::error::{Error, Result};
use rusqlite::{Connection, Transaction};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// Default location of the state database
pub const DEFAULT_DB_PATH: &str = "/var/lib/repkg/state.db";

/// Create the database file, its directory and the schema
pub fn init(db_path: &Path) -> Result<()> {
    if let Some(parent) = db_path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }

    let conn = Connection::open(db_path)?;
    configure(&conn)?;
    schema::migrate(&conn)?;

    info!("Initialized state database at {}", db_path.display());
    Ok(())
}

/// Open an existing database, migrating it to the current schema
pub fn open(db_path: &Path) -> Result<Connection> {
    if !db_path.exists() {
        return Err(Error::NotFoundError(format!(
            "State database {} does not exist",
            db_path.display()
        )));
    }

    debug!("Opening state database {}", db_path.display());
    let conn = Connection::open(db_path)?;
    configure(&conn)?;
    schema::migrate(&conn)?;
    Ok(conn)
}

/// Open the database, creating it first if needed
pub fn open_or_init(db_path: &Path) -> Result<Connection> {
    if !db_path.exists() {
        init(db_path)?;
    }
    open(db_path)
}

/// Run `f` inside a transaction; commits on `Ok`, rolls back on `Err`
pub fn transaction<T, F>(conn: &mut Connection, f: F) -> Result<T>
where
    F: FnOnce(&Transaction) -> Result<T>,
{
    let tx = conn.transaction()?;
    let value = f(&tx)?;
    tx.commit()?;
    Ok(value)
}

fn configure(conn: &Connection) -> Result<()> {
    conn.pragma_update(None, "foreign_keys", "ON")?;
    conn.busy_timeout(std::time::Duration::from_secs(5))?;
    Ok(())
}
