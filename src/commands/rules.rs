// src/commands/rules.rs
//! Rule file management commands

use super::Context;
use anyhow::{Context as _, Result, bail};
use repkg::PackageBackend;
use tracing::info;

/// Create a rule for `package`
pub fn cmd_create(
    ctx: &Context,
    backend: &dyn PackageBackend,
    package: &str,
    dependencies: &[String],
    auto: bool,
) -> Result<()> {
    if dependencies.is_empty() && !auto {
        bail!(
            "No trigger packages given for {}. Pass them as arguments or use --auto",
            package
        );
    }

    let path = ctx
        .rule_store(backend)
        .create_rule(package, dependencies, auto)
        .with_context(|| format!("Failed to create rule for {}", package))?;

    info!("Rule written to {}", path.display());
    Ok(())
}

/// Remove the caller's rules for `packages`
pub fn cmd_remove(ctx: &Context, backend: &dyn PackageBackend, packages: &[String]) -> Result<()> {
    let mut store = ctx.rule_store(backend);
    for package in packages {
        store
            .remove_rule(package)
            .with_context(|| format!("Failed to remove rule for {}", package))?;
    }
    Ok(())
}

/// Print the loaded rules
pub fn cmd_rules(ctx: &Context, backend: &dyn PackageBackend, short: bool, user_only: bool) -> Result<()> {
    let output = ctx
        .rule_store(backend)
        .list_rules(short, user_only)
        .context("Failed to load rebuild rules")?;
    println!("{}", output);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::context;
    use repkg::{MemoryBackend, Privilege};
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_create_requires_dependencies() {
        let temp = TempDir::new().unwrap();
        let ctx = context(&temp, Privilege::User);
        let backend = MemoryBackend::new();

        assert!(cmd_create(&ctx, &backend, "libfoo", &[], false).is_err());
        assert!(!temp.path().join("user/libfoo.rule").exists());
    }

    #[test]
    fn test_create_auto_without_dependencies_fails() {
        let temp = TempDir::new().unwrap();
        let ctx = context(&temp, Privilege::User);
        let backend = MemoryBackend::new().with_foreign("libfoo", "1.0-1");

        assert!(cmd_create(&ctx, &backend, "libfoo", &[], true).is_err());
    }

    #[test]
    fn test_create_and_remove() {
        let temp = TempDir::new().unwrap();
        let ctx = context(&temp, Privilege::User);
        let backend = MemoryBackend::new();

        cmd_create(&ctx, &backend, "libfoo", &["libbar=v".to_string()], false).unwrap();
        let path = temp.path().join("user/libfoo.rule");
        assert_eq!(fs::read_to_string(&path).unwrap(), "libbar=v");

        cmd_remove(&ctx, &backend, &["libfoo".to_string(), "missing".to_string()]).unwrap();
        assert!(!path.exists());
    }
}
