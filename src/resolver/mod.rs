// src/resolver/mod.rs

//! Pending rebuild tracking
//!
//! `RebuildResolver` owns the persistent map of packages waiting for a
//! rebuild. An update event propagates through the rule index: every owner
//! whose rule considers the version change significant becomes pending,
//! and is itself propagated so chains of rules cascade. Packages reported
//! as updated are rebuilt by definition and leave the pending map.

mod waves;

pub use crate::db::models::PendingMap;
pub use waves::{Wave, compute_waves};

use crate::db::{self, models::PendingRebuild, models::VersionBaseline};
use crate::error::Result;
use crate::packages::PackageBackend;
use crate::privilege::Privilege;
use crate::rules::{Rule, RuleIndex};
use rusqlite::Connection;
use std::collections::{HashSet, VecDeque};
use tracing::{debug, info, warn};

/// Outcome of one update event
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateReport {
    /// Newly recorded (package, trigger) pairs
    pub triggered: PendingMap,
    /// Updated packages that were pending and are now done
    pub rebuilt: Vec<String>,
}

pub struct RebuildResolver<'a> {
    conn: &'a mut Connection,
    backend: &'a dyn PackageBackend,
    privilege: Privilege,
}

impl<'a> RebuildResolver<'a> {
    pub fn new(conn: &'a mut Connection, backend: &'a dyn PackageBackend, privilege: Privilege) -> Self {
        Self {
            conn,
            backend,
            privilege,
        }
    }

    /// Record that `updated` were just installed or rebuilt
    ///
    /// Runs in a single transaction. Each package is visited at most once
    /// per call, so cyclic rules terminate here; the cycle itself surfaces
    /// later in [`compute_waves`].
    pub fn update_pkgs(&mut self, updated: &[String], rules: &RuleIndex) -> Result<UpdateReport> {
        self.privilege.require_root("update")?;

        let backend = self.backend;
        let report = db::transaction(self.conn, |tx| {
            let direct: HashSet<&str> = updated.iter().map(String::as_str).collect();
            let mut queue: VecDeque<String> = updated.iter().cloned().collect();
            let mut processed: HashSet<String> = HashSet::new();
            let mut report = UpdateReport::default();

            while let Some(pkg) = queue.pop_front() {
                if !processed.insert(pkg.clone()) {
                    continue;
                }

                let candidates = rules.find_rules(&pkg);
                if candidates.is_empty() {
                    continue;
                }

                // packages reached through propagation have not changed yet
                let current = if direct.contains(pkg.as_str()) {
                    match backend.package_version(&pkg) {
                        Ok(version) => Some(version),
                        Err(e) => {
                            warn!("Cannot read version of {}, assuming a relevant change: {}", pkg, e);
                            None
                        }
                    }
                } else {
                    None
                };

                for rule in candidates {
                    if rule.package == pkg {
                        debug!("Ignoring rule of {} on itself", pkg);
                        continue;
                    }

                    if !is_significant(tx, rule, &pkg, current.as_deref())? {
                        debug!("Update of {} is not relevant for {}", pkg, rule.package);
                        continue;
                    }

                    if PendingRebuild::insert(tx, &rule.package, &pkg)? {
                        info!("Marked {} for rebuild (triggered by {})", rule.package, pkg);
                        report
                            .triggered
                            .entry(rule.package.clone())
                            .or_default()
                            .insert(pkg.clone());
                    }
                    queue.push_back(rule.package.clone());
                }
            }

            for pkg in updated {
                if PendingRebuild::delete_package(tx, pkg)? > 0 {
                    debug!("{} was rebuilt, removing it from pending", pkg);
                    report.rebuilt.push(pkg.clone());
                }
            }

            Ok(report)
        })?;

        Ok(report)
    }

    /// Current pending map
    pub fn pending(&self) -> Result<PendingMap> {
        PendingRebuild::load_map(&*self.conn)
    }

    /// Order the pending packages into rebuild waves
    pub fn compute_waves(&self) -> Result<Vec<Wave>> {
        compute_waves(&self.pending()?)
    }

    /// Names of all pending packages
    pub fn list_pkgs(&self) -> Result<Vec<String>> {
        PendingRebuild::packages(&*self.conn)
    }

    /// One `name: Triggered by a, b` line per pending package
    pub fn list_detail_pkgs(&self) -> Result<Vec<String>> {
        Ok(self
            .pending()?
            .into_iter()
            .map(|(pkg, triggers)| {
                let triggers: Vec<String> = triggers.into_iter().collect();
                format!("{}: Triggered by {}", pkg, triggers.join(", "))
            })
            .collect())
    }

    /// Drop pending entries: all of them if `pkgs` is empty
    ///
    /// Returns the number of packages removed. Version baselines are kept.
    pub fn clear(&mut self, pkgs: &[String]) -> Result<usize> {
        self.privilege.require_root("clear")?;

        db::transaction(self.conn, |tx| {
            if pkgs.is_empty() {
                let count = PendingRebuild::packages(tx)?.len();
                PendingRebuild::delete_all(tx)?;
                info!("Cleared all {} pending packages", count);
                return Ok(count);
            }

            let mut count = 0;
            for pkg in pkgs {
                if PendingRebuild::delete_package(tx, pkg)? > 0 {
                    info!("Cleared pending rebuild of {}", pkg);
                    count += 1;
                } else {
                    warn!("Package {} is not pending a rebuild", pkg);
                }
            }
            Ok(count)
        })
    }
}

/// Decide whether `dep` moving to `current` matters for `rule`'s owner
///
/// The baseline is refreshed on every check. Without a current version, or
/// without a baseline to compare with, the change is treated as relevant.
fn is_significant(conn: &Connection, rule: &Rule, dep: &str, current: Option<&str>) -> Result<bool> {
    let Some(current) = current else {
        return Ok(true);
    };

    let previous = VersionBaseline::find(conn, &rule.package, dep)?;
    VersionBaseline::upsert(conn, &rule.package, dep, current)?;

    Ok(match previous {
        Some(previous) => rule.is_significant(&previous, current),
        None => true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schema;
    use crate::error::Error;
    use crate::packages::MemoryBackend;
    use crate::rules::parse::parse_rules;
    use tempfile::NamedTempFile;

    fn create_test_db() -> (NamedTempFile, Connection) {
        let temp_file = NamedTempFile::new().unwrap();
        let conn = Connection::open(temp_file.path()).unwrap();
        schema::migrate(&conn).unwrap();
        (temp_file, conn)
    }

    /// Build an index from `(owner, rule file body)` pairs
    fn index(files: &[(&str, &str)]) -> RuleIndex {
        let mut index = RuleIndex::default();
        for (owner, body) in files {
            for rule in parse_rules(body) {
                index.insert(owner, rule);
            }
        }
        index
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_update_requires_root() {
        let (_temp, mut conn) = create_test_db();
        let backend = MemoryBackend::new();
        let mut resolver = RebuildResolver::new(&mut conn, &backend, Privilege::User);

        let result = resolver.update_pkgs(&names(&["libbar"]), &RuleIndex::default());
        assert!(matches!(result, Err(Error::PermissionDenied(_))));
        assert!(matches!(resolver.clear(&[]), Err(Error::PermissionDenied(_))));
    }

    #[test]
    fn test_update_marks_owner_and_ignores_unchanged_version() {
        let (_temp, mut conn) = create_test_db();
        let backend = MemoryBackend::new().with_package("libbar", "1.2.3-1");
        let rules = index(&[("libfoo", "libbar=v2")]);
        let mut resolver = RebuildResolver::new(&mut conn, &backend, Privilege::Root);

        let report = resolver.update_pkgs(&names(&["libbar"]), &rules).unwrap();
        assert_eq!(report.triggered["libfoo"].len(), 1);
        assert_eq!(resolver.list_pkgs().unwrap(), vec!["libfoo"]);

        backend.set_version("libbar", "1.3.0-1");
        resolver.clear(&names(&["libfoo"])).unwrap();
        resolver.update_pkgs(&names(&["libbar"]), &rules).unwrap();
        assert_eq!(resolver.list_detail_pkgs().unwrap(), vec!["libfoo: Triggered by libbar"]);

        // same version again: nothing new, no duplicate trigger
        let report = resolver.update_pkgs(&names(&["libbar"]), &rules).unwrap();
        assert!(report.triggered.is_empty());
        assert_eq!(resolver.pending().unwrap()["libfoo"].len(), 1);
    }

    #[test]
    fn test_scoped_rule_skips_revision_bump() {
        let (_temp, mut conn) = create_test_db();
        let backend = MemoryBackend::new().with_package("libbar", "1.2-1");
        let rules = index(&[("libfoo", "libbar=v")]);
        let mut resolver = RebuildResolver::new(&mut conn, &backend, Privilege::Root);

        // first observation is always relevant
        resolver.update_pkgs(&names(&["libbar"]), &rules).unwrap();
        resolver.clear(&[]).unwrap();

        backend.set_version("libbar", "1.2-2");
        resolver.update_pkgs(&names(&["libbar"]), &rules).unwrap();
        assert!(resolver.list_pkgs().unwrap().is_empty());

        backend.set_version("libbar", "1.3-1");
        resolver.update_pkgs(&names(&["libbar"]), &rules).unwrap();
        assert_eq!(resolver.list_pkgs().unwrap(), vec!["libfoo"]);
    }

    #[test]
    fn test_update_cascades_and_removes_rebuilt() {
        let (_temp, mut conn) = create_test_db();
        let backend = MemoryBackend::new()
            .with_package("libbar", "1.0-1")
            .with_foreign("libfoo", "1.0-1");
        let rules = index(&[("libfoo", "libbar"), ("app", "libfoo"), ("plugin", "app")]);
        let mut resolver = RebuildResolver::new(&mut conn, &backend, Privilege::Root);

        resolver.update_pkgs(&names(&["libbar"]), &rules).unwrap();
        assert_eq!(resolver.list_pkgs().unwrap(), vec!["app", "libfoo", "plugin"]);

        let waves = resolver.compute_waves().unwrap();
        assert_eq!(waves.len(), 3);
        assert!(waves[0].contains("libfoo"));
        assert!(waves[2].contains("plugin"));

        // libfoo got rebuilt; its dependents stay pending
        let report = resolver.update_pkgs(&names(&["libfoo"]), &rules).unwrap();
        assert_eq!(report.rebuilt, vec!["libfoo"]);
        let pending = resolver.pending().unwrap();
        assert!(!pending.contains_key("libfoo"));
        assert!(pending["app"].contains("libfoo"));
        assert_eq!(resolver.compute_waves().unwrap().len(), 2);
    }

    #[test]
    fn test_cyclic_rules_terminate_and_fail_ordering() {
        let (_temp, mut conn) = create_test_db();
        let backend = MemoryBackend::new().with_package("libbar", "1.0-1");
        let rules = index(&[("a", "libbar b"), ("b", "a")]);
        let mut resolver = RebuildResolver::new(&mut conn, &backend, Privilege::Root);

        resolver.update_pkgs(&names(&["libbar"]), &rules).unwrap();
        let before = resolver.pending().unwrap();
        assert_eq!(before.len(), 2);

        assert!(matches!(resolver.compute_waves(), Err(Error::CycleError(_))));
        assert_eq!(resolver.pending().unwrap(), before);
    }

    #[test]
    fn test_missing_version_is_treated_as_relevant() {
        let (_temp, mut conn) = create_test_db();
        let backend = MemoryBackend::new();
        let rules = index(&[("libfoo", "libbar=r")]);
        let mut resolver = RebuildResolver::new(&mut conn, &backend, Privilege::Root);

        resolver.update_pkgs(&names(&["libbar"]), &rules).unwrap();
        assert_eq!(resolver.list_pkgs().unwrap(), vec!["libfoo"]);
        assert!(VersionBaseline::list_all(&*resolver.conn).unwrap().is_empty());
    }

    #[test]
    fn test_clear_selected_and_all() {
        let (_temp, mut conn) = create_test_db();
        let backend = MemoryBackend::new().with_package("libbar", "1.0-1");
        let rules = index(&[("libfoo", "libbar"), ("app", "libbar"), ("tool", "libbar")]);
        let mut resolver = RebuildResolver::new(&mut conn, &backend, Privilege::Root);
        resolver.update_pkgs(&names(&["libbar"]), &rules).unwrap();

        // unknown names are only warned about
        assert_eq!(resolver.clear(&names(&["libfoo", "missing"])).unwrap(), 1);
        assert_eq!(resolver.list_pkgs().unwrap(), vec!["app", "tool"]);

        assert_eq!(resolver.clear(&[]).unwrap(), 2);
        assert!(resolver.list_pkgs().unwrap().is_empty());
        // baselines survive a clear
        assert_eq!(VersionBaseline::list_all(&*resolver.conn).unwrap().len(), 3);
    }
}
