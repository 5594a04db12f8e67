// src/commands/update.rs
//! Record package updates, usually called from the pacman hook

use super::Context;
use anyhow::{Context as _, Result};
use repkg::{PackageBackend, RebuildResolver};
use std::io::{self, Read};
use tracing::{debug, info};

/// Propagate rebuild triggers for updated packages
///
/// Package names come from `packages` and, with `read_stdin`, from
/// standard input (one or more per line, as pacman hooks pass them).
pub fn cmd_update(
    ctx: &Context,
    backend: &dyn PackageBackend,
    packages: &[String],
    read_stdin: bool,
) -> Result<()> {
    ctx.privilege.require_root("update")?;

    let mut names = packages.to_vec();
    if read_stdin {
        names.extend(read_package_names(io::stdin().lock()).context("Failed to read package names from stdin")?);
    }
    let names = dedup(names);

    if names.is_empty() {
        info!("No updated packages given");
        return Ok(());
    }
    debug!("Processing update of {} packages", names.len());

    let index = ctx.rule_store(backend).load().context("Failed to load rebuild rules")?;
    let mut conn = ctx.open_db()?;
    let report = RebuildResolver::new(&mut conn, backend, ctx.privilege)
        .update_pkgs(&names, &index)
        .context("Failed to update pending rebuilds")?;

    for (pkg, triggers) in &report.triggered {
        let triggers: Vec<&str> = triggers.iter().map(String::as_str).collect();
        println!("{} needs a rebuild (triggered by {})", pkg, triggers.join(", "));
    }

    Ok(())
}

/// Whitespace separated names from `reader`
fn read_package_names(mut reader: impl Read) -> io::Result<Vec<String>> {
    let mut input = String::new();
    reader.read_to_string(&mut input)?;
    Ok(input.split_whitespace().map(str::to_string).collect())
}

/// Drop repeated names, keeping the first occurrence
fn dedup(names: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    names.into_iter().filter(|name| seen.insert(name.clone())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::context;
    use repkg::{MemoryBackend, Privilege};
    use repkg::db::models::PendingRebuild;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_read_package_names() {
        let names = read_package_names("libbar\nglibc  qt5-base\n\n".as_bytes()).unwrap();
        assert_eq!(names, vec!["libbar", "glibc", "qt5-base"]);
    }

    #[test]
    fn test_dedup_keeps_order() {
        let names = dedup(vec!["b".into(), "a".into(), "b".into()]);
        assert_eq!(names, vec!["b", "a"]);
    }

    #[test]
    fn test_update_requires_root() {
        let temp = TempDir::new().unwrap();
        let ctx = context(&temp, Privilege::User);
        let backend = MemoryBackend::new();

        let err = cmd_update(&ctx, &backend, &["libbar".to_string()], false).unwrap_err();
        assert!(err.to_string().contains("must be run as root"));
        assert!(!ctx.db_path().exists());
    }

    #[test]
    fn test_update_marks_pending() {
        let temp = TempDir::new().unwrap();
        let ctx = context(&temp, Privilege::Root);
        let backend = MemoryBackend::new().with_package("libbar", "1.0-1");

        fs::create_dir_all(temp.path().join("usr")).unwrap();
        fs::write(temp.path().join("usr/libfoo.rule"), "libbar").unwrap();

        cmd_update(&ctx, &backend, &["libbar".to_string()], false).unwrap();

        let conn = ctx.open_db().unwrap();
        let map = PendingRebuild::load_map(&conn).unwrap();
        assert!(map["libfoo"].contains("libbar"));
    }
}
