// src/db/models/mod.rs

//! Data models for the repkg state database
//!
//! Each model maps one table and offers plain functions taking a
//! `&Connection`, so they work the same inside and outside a transaction.

mod baseline;
mod pending;
mod setting;

pub use baseline::VersionBaseline;
pub use pending::{PendingMap, PendingRebuild};
pub use setting::Setting;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schema;
    use rusqlite::Connection;
    use tempfile::NamedTempFile;

    fn create_test_db() -> (NamedTempFile, Connection) {
        let temp_file = NamedTempFile::new().unwrap();
        let conn = Connection::open(temp_file.path()).unwrap();
        schema::migrate(&conn).unwrap();
        (temp_file, conn)
    }

    #[test]
    fn test_pending_crud() {
        let (_temp, conn) = create_test_db();

        assert!(PendingRebuild::insert(&conn, "libfoo", "libbar").unwrap());
        assert!(PendingRebuild::insert(&conn, "libfoo", "glibc").unwrap());
        assert!(PendingRebuild::insert(&conn, "app", "libfoo").unwrap());
        // duplicate pair is ignored
        assert!(!PendingRebuild::insert(&conn, "libfoo", "libbar").unwrap());

        let map = PendingRebuild::load_map(&conn).unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(
            map["libfoo"].iter().cloned().collect::<Vec<_>>(),
            vec!["glibc", "libbar"]
        );

        let entries = PendingRebuild::find_by_package(&conn, "libfoo").unwrap();
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|e| e.created_at.is_some()));

        assert_eq!(PendingRebuild::delete_package(&conn, "libfoo").unwrap(), 2);
        assert_eq!(PendingRebuild::delete_package(&conn, "libfoo").unwrap(), 0);
        assert_eq!(PendingRebuild::packages(&conn).unwrap(), vec!["app"]);

        assert_eq!(PendingRebuild::delete_all(&conn).unwrap(), 1);
        assert!(PendingRebuild::load_map(&conn).unwrap().is_empty());
    }

    #[test]
    fn test_baseline_upsert() {
        let (_temp, conn) = create_test_db();

        assert_eq!(VersionBaseline::find(&conn, "libfoo", "libbar").unwrap(), None);

        VersionBaseline::upsert(&conn, "libfoo", "libbar", "1.0-1").unwrap();
        VersionBaseline::upsert(&conn, "libfoo", "libbar", "1.1-1").unwrap();
        VersionBaseline::upsert(&conn, "app", "libbar", "1.0-1").unwrap();

        assert_eq!(
            VersionBaseline::find(&conn, "libfoo", "libbar").unwrap().as_deref(),
            Some("1.1-1")
        );
        assert_eq!(VersionBaseline::list_all(&conn).unwrap().len(), 2);
    }

    #[test]
    fn test_settings() {
        let (_temp, conn) = create_test_db();

        assert_eq!(Setting::get(&conn, "frontend").unwrap(), None);
        Setting::set(&conn, "frontend", "yay -S").unwrap();
        Setting::set(&conn, "frontend", "paru -S").unwrap();
        assert_eq!(Setting::get(&conn, "frontend").unwrap().as_deref(), Some("paru -S"));

        assert!(Setting::delete(&conn, "frontend").unwrap());
        assert!(!Setting::delete(&conn, "frontend").unwrap());
    }
}
