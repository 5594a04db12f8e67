// src/commands/pending.rs
//! Inspect and clear pending rebuilds

use super::Context;
use anyhow::{Context as _, Result};
use repkg::{PackageBackend, RebuildResolver};

/// Print pending packages
pub fn cmd_list(ctx: &Context, backend: &dyn PackageBackend, detail: bool) -> Result<()> {
    let lines = pending_lines(ctx, backend, detail)?;
    if detail {
        for line in lines {
            println!("{}", line);
        }
    } else if !lines.is_empty() {
        println!("{}", lines.join(" "));
    }
    Ok(())
}

/// Pending package names, or `name: Triggered by ...` lines with `detail`
fn pending_lines(ctx: &Context, backend: &dyn PackageBackend, detail: bool) -> Result<Vec<String>> {
    let Some(mut conn) = ctx.open_existing_db()? else {
        return Ok(Vec::new());
    };

    let resolver = RebuildResolver::new(&mut conn, backend, ctx.privilege);
    let lines = if detail {
        resolver.list_detail_pkgs()
    } else {
        resolver.list_pkgs()
    };
    lines.context("Failed to read pending rebuilds")
}

/// Forget pending rebuilds of `packages`, or all of them
pub fn cmd_clear(ctx: &Context, backend: &dyn PackageBackend, packages: &[String]) -> Result<()> {
    ctx.privilege.require_root("clear")?;

    let mut conn = ctx.open_db()?;
    RebuildResolver::new(&mut conn, backend, ctx.privilege)
        .clear(packages)
        .context("Failed to clear pending rebuilds")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::context;
    use repkg::db::models::PendingRebuild;
    use repkg::{MemoryBackend, Privilege};
    use tempfile::TempDir;

    #[test]
    fn test_list_without_database() {
        let temp = TempDir::new().unwrap();
        let ctx = context(&temp, Privilege::User);
        let backend = MemoryBackend::new();

        assert!(pending_lines(&ctx, &backend, false).unwrap().is_empty());
        cmd_list(&ctx, &backend, true).unwrap();
    }

    #[test]
    fn test_list_and_clear() {
        let temp = TempDir::new().unwrap();
        let ctx = context(&temp, Privilege::Root);
        let backend = MemoryBackend::new();

        let conn = ctx.open_db().unwrap();
        PendingRebuild::insert(&conn, "libfoo", "libbar").unwrap();
        PendingRebuild::insert(&conn, "libfoo", "glibc").unwrap();
        PendingRebuild::insert(&conn, "app", "qt5-base").unwrap();
        drop(conn);

        assert_eq!(pending_lines(&ctx, &backend, false).unwrap(), vec!["app", "libfoo"]);
        assert_eq!(
            pending_lines(&ctx, &backend, true).unwrap(),
            vec!["app: Triggered by qt5-base", "libfoo: Triggered by glibc, libbar"]
        );

        cmd_clear(&ctx, &backend, &["app".to_string()]).unwrap();
        assert_eq!(pending_lines(&ctx, &backend, false).unwrap(), vec!["libfoo"]);

        cmd_clear(&ctx, &backend, &[]).unwrap();
        assert!(pending_lines(&ctx, &backend, false).unwrap().is_empty());
    }

    #[test]
    fn test_clear_requires_root() {
        let temp = TempDir::new().unwrap();
        let ctx = context(&temp, Privilege::User);
        let backend = MemoryBackend::new();
        assert!(cmd_clear(&ctx, &backend, &[]).is_err());
    }
}
