// src/resolver/waves.rs

//! Rebuild ordering
//!
//! Pending packages are layered with Kahn's algorithm: a package lands in
//! the first wave after all of its pending triggers. Triggers that are not
//! pending themselves impose no ordering.

use crate::db::models::PendingMap;
use crate::error::{Error, Result};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::debug;

/// Packages that can be rebuilt together
pub type Wave = BTreeSet<String>;

/// Partition `pending` into waves
///
/// Fails with `CycleError` naming the packages that could not be placed
/// when triggers wait on each other.
pub fn compute_waves(pending: &PendingMap) -> Result<Vec<Wave>> {
    let mut in_degree: BTreeMap<&str, usize> = BTreeMap::new();
    let mut dependents: HashMap<&str, Vec<&str>> = HashMap::new();

    for (package, triggers) in pending {
        let blocking = triggers
            .iter()
            .filter(|t| pending.contains_key(t.as_str()))
            .inspect(|t| dependents.entry(t.as_str()).or_default().push(package))
            .count();
        in_degree.insert(package, blocking);
    }

    let mut waves = Vec::new();
    let mut placed = 0;
    let mut current: Vec<&str> = in_degree
        .iter()
        .filter(|&(_, &degree)| degree == 0)
        .map(|(name, _)| *name)
        .collect();

    while !current.is_empty() {
        let mut next = Vec::new();
        for name in &current {
            for dependent in dependents.get(name).into_iter().flatten() {
                if let Some(degree) = in_degree.get_mut(dependent) {
                    *degree -= 1;
                    if *degree == 0 {
                        next.push(*dependent);
                    }
                }
            }
        }

        placed += current.len();
        waves.push(current.iter().map(|s| s.to_string()).collect::<Wave>());
        current = next;
    }

    if placed != pending.len() {
        let stuck: Vec<String> = in_degree
            .into_iter()
            .filter(|&(_, degree)| degree > 0)
            .map(|(name, _)| name.to_string())
            .collect();
        return Err(Error::CycleError(stuck));
    }

    debug!("Ordered {} pending packages into {} waves", placed, waves.len());
    Ok(waves)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pending(entries: &[(&str, &[&str])]) -> PendingMap {
        entries
            .iter()
            .map(|(pkg, triggers)| {
                (
                    pkg.to_string(),
                    triggers.iter().map(|t| t.to_string()).collect(),
                )
            })
            .collect()
    }

    fn names(wave: &Wave) -> Vec<&str> {
        wave.iter().map(String::as_str).collect()
    }

    #[test]
    fn test_empty_pending_has_no_waves() {
        assert!(compute_waves(&PendingMap::new()).unwrap().is_empty());
    }

    #[test]
    fn test_external_triggers_form_one_wave() {
        let map = pending(&[("libfoo", &["libbar"]), ("app", &["qt5-base", "glibc"])]);
        let waves = compute_waves(&map).unwrap();
        assert_eq!(waves.len(), 1);
        assert_eq!(names(&waves[0]), vec!["app", "libfoo"]);
    }

    #[test]
    fn test_chain_is_layered() {
        // libbar updated -> libfoo pending -> app pending (via libfoo)
        let map = pending(&[
            ("libfoo", &["libbar"]),
            ("app", &["libfoo", "glibc"]),
            ("plugin", &["app", "libfoo"]),
            ("tool", &["glibc"]),
        ]);
        let waves = compute_waves(&map).unwrap();

        assert_eq!(waves.len(), 3);
        assert_eq!(names(&waves[0]), vec!["libfoo", "tool"]);
        assert_eq!(names(&waves[1]), vec!["app"]);
        assert_eq!(names(&waves[2]), vec!["plugin"]);

        let total: usize = waves.iter().map(|w| w.len()).sum();
        assert_eq!(total, map.len());
    }

    #[test]
    fn test_cycle_is_reported() {
        let map = pending(&[("a", &["b"]), ("b", &["a"]), ("c", &["x"])]);
        match compute_waves(&map) {
            Err(Error::CycleError(pkgs)) => assert_eq!(pkgs, vec!["a", "b"]),
            other => panic!("expected cycle error, got {:?}", other),
        }
    }

    #[test]
    fn test_cycle_reports_blocked_dependents() {
        let map = pending(&[("a", &["b"]), ("b", &["a"]), ("d", &["a"])]);
        match compute_waves(&map) {
            Err(Error::CycleError(pkgs)) => assert_eq!(pkgs, vec!["a", "b", "d"]),
            other => panic!("expected cycle error, got {:?}", other),
        }
    }
}
