// src/db/models/setting.rs

//! Key/value settings stored alongside the state

use crate::error::Result;
use rusqlite::{Connection, OptionalExtension, params};

pub struct Setting;

impl Setting {
    pub fn get(conn: &Connection, key: &str) -> Result<Option<String>> {
        let value = conn
            .query_row("SELECT value FROM settings WHERE key = ?1", [key], |row| row.get(0))
            .optional()?;
        Ok(value)
    }

    pub fn set(conn: &Connection, key: &str, value: &str) -> Result<()> {
        conn.execute(
            "INSERT INTO settings (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }

    /// Remove `key`; returns whether it was set
    pub fn delete(conn: &Connection, key: &str) -> Result<bool> {
        let rows = conn.execute("DELETE FROM settings WHERE key = ?1", [key])?;
        Ok(rows > 0)
    }
}
