// src/packages/pacman_query.rs

//! Query installed pacman packages from the system database
//!
//! This module runs the `pacman` command-line tool and parses its output.

use super::PackageBackend;
use crate::error::{Error, Result};
use std::collections::BTreeSet;
use std::process::{Command, Output};
use tracing::debug;

/// Package backend backed by the local pacman database
#[derive(Debug, Clone, Default)]
pub struct Pacman;

impl Pacman {
    pub fn new() -> Self {
        Self
    }

    /// Run pacman with `args`, failing on a non-zero exit
    fn query(&self, args: &[&str]) -> Result<Output> {
        debug!("Running pacman {}", args.join(" "));

        let output = Command::new("pacman")
            .args(args)
            .output()
            .map_err(|e| Error::QueryError(format!("Failed to run pacman: {}. Is pacman installed?", e)))?;

        if !output.status.success() {
            return Err(Error::QueryError(format!(
                "pacman {} failed: {}",
                args.join(" "),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        Ok(output)
    }

    /// Query a single installed package, mapping failure to `NotFoundError`
    fn query_package(&self, flag: &str, name: &str) -> Result<String> {
        let output = Command::new("pacman")
            .args([flag, name])
            .output()
            .map_err(|e| Error::QueryError(format!("Failed to run pacman: {}", e)))?;

        if !output.status.success() {
            return Err(Error::NotFoundError(format!(
                "Package '{}' not found in pacman database",
                name
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl PackageBackend for Pacman {
    fn installed_packages(&self) -> Result<BTreeSet<String>> {
        let output = self.query(&["-Qq"])?;
        let packages = parse_name_list(&String::from_utf8_lossy(&output.stdout));
        debug!("Found {} installed packages", packages.len());
        Ok(packages)
    }

    fn foreign_packages(&self) -> Result<BTreeSet<String>> {
        // pacman exits 1 when there are no foreign packages at all
        let output = Command::new("pacman")
            .args(["-Qqm"])
            .output()
            .map_err(|e| Error::QueryError(format!("Failed to run pacman: {}. Is pacman installed?", e)))?;

        let packages = parse_name_list(&String::from_utf8_lossy(&output.stdout));
        debug!("Found {} foreign packages", packages.len());
        Ok(packages)
    }

    fn package_version(&self, name: &str) -> Result<String> {
        let stdout = self.query_package("-Q", name)?;
        parse_version_line(&stdout, name)
    }

    fn dependencies(&self, name: &str) -> Result<Vec<String>> {
        let stdout = self.query_package("-Qi", name)?;
        let deps = parse_depends_on(&stdout);
        debug!("Found {} dependencies for package {}", deps.len(), name);
        Ok(deps)
    }
}

/// One package name per line, blank lines skipped
fn parse_name_list(stdout: &str) -> BTreeSet<String> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Extract the version from `pacman -Q <name>` output ("name version")
fn parse_version_line(stdout: &str, name: &str) -> Result<String> {
    stdout
        .lines()
        .filter_map(|line| {
            let mut parts = line.split_whitespace();
            match (parts.next(), parts.next()) {
                (Some(pkg), Some(version)) if pkg == name => Some(version.to_string()),
                _ => None,
            }
        })
        .next()
        .ok_or_else(|| Error::QueryError(format!("No version reported for '{}'", name)))
}

/// Extract dependency names from the "Depends On" field of `pacman -Qi` output
fn parse_depends_on(info: &str) -> Vec<String> {
    for line in info.lines() {
        if let Some((key, value)) = line.split_once(':')
            && key.trim() == "Depends On"
        {
            return value
                .split_whitespace()
                .filter(|s| *s != "None")
                .map(|s| {
                    // Remove version constraints like ">=1.0"
                    s.split(['>', '<', '='])
                        .next()
                        .unwrap_or(s)
                        .to_string()
                })
                .collect();
        }
    }
    Vec::new()
}
