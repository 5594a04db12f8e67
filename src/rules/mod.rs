// src/rules/mod.rs

//! Rebuild rules: which packages must be rebuilt when another one changes
//!
//! Rules live in `<name>.rule` files spread over three tiers, read in this
//! order:
//!
//! 1. the caller's user directory
//! 2. the administrator override directory (`/etc/repkg/rules`)
//! 3. the distribution default directory (`/usr/lib/repkg/rules`)
//!
//! The file name is the owner package, the body lists the dependencies whose
//! updates should mark the owner for rebuild (see [`parse`] for the token
//! grammar). For a literal owner name the first tier wins. Names containing
//! glob metacharacters are patterns, matched against installed packages that
//! have no literal rule. A leading `+` marks an extension rule, whose
//! dependencies are added to the matching pattern's set instead of
//! replacing it.
//!
//! Loading produces an immutable [`RuleIndex`] keyed by dependency name, so a
//! lookup for an updated package directly yields the owners to rebuild.

pub mod parse;

use crate::error::{Error, Result};
use crate::packages::PackageBackend;
use crate::privilege::Privilege;
use crate::version::{self, RuleScope, VersionRange};
use glob::Pattern;
use serde::{Deserialize, Serialize};
use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, HashMap};
use std::fmt::Write as _;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// File extension of rule files
pub const RULE_EXTENSION: &str = "rule";

/// A single trigger declaration
///
/// As parsed from a file, `package` is the dependency. Inside a
/// [`RuleIndex`] the roles are swapped and `package` names the owner that
/// needs the rebuild.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub package: String,
    pub scope: RuleScope,
    pub range: Option<VersionRange>,
    /// Leading version segments to compare, only used with `RuleScope::Version`
    pub count: Option<usize>,
}

impl Rule {
    /// A rule that triggers on any change of `package`
    pub fn new(package: &str) -> Self {
        Self {
            package: package.to_string(),
            scope: RuleScope::Any,
            range: None,
            count: None,
        }
    }

    /// Whether a version change from `old` to `new` should trigger this rule
    pub fn is_significant(&self, old: &str, new: &str) -> bool {
        version::decide(old, new, self.scope, self.range, self.count)
    }
}

/// Where a rule file was found
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RuleTier {
    User,
    Override,
    System,
}

impl RuleTier {
    /// Override and distribution rules both belong to the system
    pub fn is_system(&self) -> bool {
        matches!(self, RuleTier::Override | RuleTier::System)
    }

    pub fn label(&self) -> &'static str {
        if self.is_system() { "System" } else { "User" }
    }
}

/// One owner's rule set as seen after loading, for display
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleSource {
    pub owner: String,
    pub tier: RuleTier,
    pub is_extension: bool,
    pub targets: Vec<String>,
}

impl RuleSource {
    pub fn is_system_tier(&self) -> bool {
        self.tier.is_system()
    }
}

/// Which installed packages wildcard rules are matched against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WildcardMatch {
    /// Packages not found in any sync repository (`pacman -Qqm`)
    #[default]
    Foreign,
    /// Every installed package
    Installed,
}

/// The three rule directories, in precedence order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleDirs {
    pub user: PathBuf,
    pub override_dir: PathBuf,
    pub system: PathBuf,
}

impl RuleDirs {
    fn tiers(&self) -> [(RuleTier, &Path); 3] {
        [
            (RuleTier::User, self.user.as_path()),
            (RuleTier::Override, self.override_dir.as_path()),
            (RuleTier::System, self.system.as_path()),
        ]
    }

    /// Directory the caller creates and removes rules in
    pub fn writable_dir(&self, privilege: Privilege) -> &Path {
        if privilege.is_root() {
            &self.override_dir
        } else {
            &self.user
        }
    }
}

/// Rules of one owner while loading
#[derive(Debug, Clone)]
struct RuleSet {
    rules: Vec<Rule>,
    extension: bool,
    tier: RuleTier,
}

struct WildcardRule {
    name: String,
    pattern: Pattern,
    set: RuleSet,
}

/// Immutable lookup table produced by [`RuleStore::load`]
#[derive(Debug, Clone, Default)]
pub struct RuleIndex {
    /// dependency -> rules whose `package` is the owner
    rules: HashMap<String, Vec<Rule>>,
    sources: BTreeMap<String, RuleSource>,
}

impl RuleIndex {
    /// Owners that declared `pkg` as a trigger, with their scopes
    pub fn find_rules(&self, pkg: &str) -> &[Rule] {
        self.rules.get(pkg).map(Vec::as_slice).unwrap_or(&[])
    }

    /// All rule sources, ordered by owner name
    pub fn sources(&self) -> impl Iterator<Item = &RuleSource> {
        self.sources.values()
    }

    pub fn source(&self, owner: &str) -> Option<&RuleSource> {
        self.sources.get(owner)
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Register a parsed `rule` (naming the dependency) for `owner`
    pub fn insert(&mut self, owner: &str, rule: Rule) {
        let dependency = rule.package;
        self.rules.entry(dependency).or_default().push(Rule {
            package: owner.to_string(),
            ..rule
        });
    }
}

/// Loads rule files and manages the caller's own rules
pub struct RuleStore<'a> {
    dirs: RuleDirs,
    backend: &'a dyn PackageBackend,
    privilege: Privilege,
    wildcard_match: WildcardMatch,
    index: Option<RuleIndex>,
}

impl<'a> RuleStore<'a> {
    pub fn new(dirs: RuleDirs, backend: &'a dyn PackageBackend, privilege: Privilege) -> Self {
        Self {
            dirs,
            backend,
            privilege,
            wildcard_match: WildcardMatch::default(),
            index: None,
        }
    }

    /// Choose which packages wildcard rules are matched against
    pub fn with_wildcard_match(mut self, wildcard_match: WildcardMatch) -> Self {
        self.wildcard_match = wildcard_match;
        self
    }

    pub fn dirs(&self) -> &RuleDirs {
        &self.dirs
    }

    /// Read all tiers and build a fresh index
    pub fn load(&self) -> Result<RuleIndex> {
        let mut base: BTreeMap<String, RuleSet> = BTreeMap::new();
        let mut wildcards: Vec<WildcardRule> = Vec::new();

        for (tier, dir) in self.dirs.tiers() {
            for path in rule_files(dir) {
                let Some((name, extension)) = owner_name(&path) else {
                    continue;
                };

                if is_wildcard(&name) {
                    if let Some(existing) = wildcards.iter_mut().find(|w| w.name == name) {
                        // the higher tier keeps the pattern: a complete definition shadows
                        // later tiers instead of being replaced, an extension absorbs them
                        if !existing.set.extension {
                            debug!("Skipping {}: pattern already defined", path.display());
                            continue;
                        }
                        let Some(rules) = read_rule_file(&path) else {
                            continue;
                        };
                        merge_rules(&mut existing.set.rules, &rules);
                        existing.set.extension = extension;
                    } else {
                        let pattern = match Pattern::new(&name) {
                            Ok(p) => p,
                            Err(e) => {
                                warn!("Skipping {}: invalid pattern: {}", path.display(), e);
                                continue;
                            }
                        };
                        let Some(rules) = read_rule_file(&path) else {
                            continue;
                        };
                        wildcards.push(WildcardRule {
                            name,
                            pattern,
                            set: RuleSet { rules, extension, tier },
                        });
                    }
                } else {
                    if base.contains_key(&name) {
                        debug!("Skipping {}: rule already defined", path.display());
                        continue;
                    }
                    let Some(rules) = read_rule_file(&path) else {
                        continue;
                    };
                    base.insert(name, RuleSet { rules, extension, tier });
                }
            }
        }

        if !wildcards.is_empty() {
            self.instantiate_wildcards(&mut base, &wildcards)?;
        }

        // extension rules also pick up every pattern matching their own name
        for (name, set) in base.iter_mut().filter(|(_, set)| set.extension) {
            for wildcard in wildcards.iter().filter(|w| w.pattern.matches(name)) {
                merge_rules(&mut set.rules, &wildcard.set.rules);
            }
        }

        let mut index = RuleIndex::default();
        for wildcard in &wildcards {
            index
                .sources
                .insert(wildcard.name.clone(), rule_source(&wildcard.name, &wildcard.set));
        }
        for (owner, set) in &base {
            index.sources.insert(owner.clone(), rule_source(owner, set));
            for rule in &set.rules {
                index.insert(owner, rule.clone());
            }
        }

        debug!(
            "Loaded {} rule sources ({} patterns) covering {} trigger packages",
            index.sources.len(),
            wildcards.len(),
            index.rules.len()
        );
        Ok(index)
    }

    /// Create concrete rule sets for unclaimed packages matching a pattern
    fn instantiate_wildcards(
        &self,
        base: &mut BTreeMap<String, RuleSet>,
        wildcards: &[WildcardRule],
    ) -> Result<()> {
        let candidates = match self.wildcard_match {
            WildcardMatch::Foreign => self.backend.foreign_packages()?,
            WildcardMatch::Installed => self.backend.installed_packages()?,
        };

        for pkg in candidates {
            let Entry::Vacant(slot) = base.entry(pkg) else {
                continue;
            };

            let mut matched: Option<RuleSet> = None;
            for wildcard in wildcards.iter().filter(|w| w.pattern.matches(slot.key())) {
                match matched.as_mut() {
                    Some(set) => merge_rules(&mut set.rules, &wildcard.set.rules),
                    None => matched = Some(wildcard.set.clone()),
                }
            }

            if let Some(set) = matched {
                debug!("Package {} matched a wildcard rule", slot.key());
                slot.insert(set);
            }
        }

        Ok(())
    }

    /// Drop the cached index; the next lookup reads the files again
    pub fn reload(&mut self) -> Result<&RuleIndex> {
        self.index = None;
        self.index()
    }

    /// The cached index, loading it on first use
    pub fn index(&mut self) -> Result<&RuleIndex> {
        if self.index.is_none() {
            self.index = Some(self.load()?);
        }
        Ok(self.index.get_or_insert_with(RuleIndex::default))
    }

    /// Owners that declared `pkg` as a trigger
    pub fn find_rules(&mut self, pkg: &str) -> Result<Vec<Rule>> {
        Ok(self.index()?.find_rules(pkg).to_vec())
    }

    /// Render the loaded rules
    ///
    /// `pkg_only` yields the space separated owner names, otherwise a table
    /// with origin, extension flag and triggers. `user_only` keeps only the
    /// rules of the caller's own tier.
    pub fn list_rules(&mut self, pkg_only: bool, user_only: bool) -> Result<String> {
        let is_root = self.privilege.is_root();
        let index = self.index()?;
        let sources: Vec<&RuleSource> = index
            .sources()
            .filter(|s| !user_only || s.is_system_tier() == is_root)
            .collect();

        if pkg_only {
            let names: Vec<&str> = sources.iter().map(|s| s.owner.as_str()).collect();
            return Ok(names.join(" "));
        }

        let width = index
            .sources()
            .map(|s| s.owner.chars().count() + 2)
            .fold(9, usize::max);

        let mut out = String::new();
        let _ = writeln!(out, "{:<width$}| Origin | Ext. | Triggers", " Package");
        let _ = write!(
            out,
            "{}|{}|{}|{}",
            "-".repeat(width),
            "-".repeat(8),
            "-".repeat(6),
            "-".repeat(67usize.saturating_sub(width).max(10))
        );
        for source in sources {
            let _ = write!(
                out,
                "\n {:<owner_width$}| {:<7}| {:<5}| {}",
                source.owner,
                source.tier.label(),
                if source.is_extension { "Yes" } else { "No" },
                source.targets.join(" "),
                owner_width = width - 1
            );
        }
        Ok(out)
    }

    /// Write a rule file for `pkg` in the caller's tier
    ///
    /// With `auto_discover` the package's installed dependencies are appended
    /// to `deps`. Returns the path of the written file.
    pub fn create_rule(&mut self, pkg: &str, deps: &[String], auto_discover: bool) -> Result<PathBuf> {
        let discovered = if auto_discover {
            self.backend.dependencies(pkg)?
        } else {
            Vec::new()
        };

        // explicit tokens come first, so their scopes win over discovered names
        let mut seen: Vec<String> = Vec::new();
        let mut targets: Vec<&str> = Vec::new();
        for dep in deps.iter().chain(discovered.iter()) {
            let Some(rule) = parse::parse_token(dep) else {
                continue;
            };
            if !seen.contains(&rule.package) {
                seen.push(rule.package);
                targets.push(dep);
            }
        }
        if targets.is_empty() {
            return Err(Error::NotFoundError(format!(
                "No trigger packages for {}",
                pkg
            )));
        }

        let dir = self.dirs.writable_dir(self.privilege).to_path_buf();
        fs::create_dir_all(&dir).map_err(|source| Error::RuleWriteError {
            path: dir.clone(),
            source,
        })?;

        let path = rule_path(&dir, pkg);
        fs::write(&path, targets.join(" ")).map_err(|source| Error::RuleWriteError {
            path: path.clone(),
            source,
        })?;

        info!("Created rule for {} as {}", pkg, path.display());
        self.index = None;
        Ok(path)
    }

    /// Delete the caller's rule file for `pkg`
    ///
    /// A missing file is only warned about; returns whether a file was removed.
    pub fn remove_rule(&mut self, pkg: &str) -> Result<bool> {
        let path = rule_path(self.dirs.writable_dir(self.privilege), pkg);

        if !path.exists() {
            warn!("Rule for {} does not exist", pkg);
            return Ok(false);
        }

        fs::remove_file(&path).map_err(|source| Error::RuleRemoveError {
            path: path.clone(),
            source,
        })?;

        info!("Removed rule for {} ({})", pkg, path.display());
        self.index = None;
        Ok(true)
    }
}

fn rule_path(dir: &Path, pkg: &str) -> PathBuf {
    dir.join(format!("{}.{}", pkg, RULE_EXTENSION))
}

fn rule_source(owner: &str, set: &RuleSet) -> RuleSource {
    RuleSource {
        owner: owner.to_string(),
        tier: set.tier,
        is_extension: set.extension,
        targets: set.rules.iter().map(|r| r.package.clone()).collect(),
    }
}

/// Rule files in `dir`, sorted by file name; a missing directory is empty
fn rule_files(dir: &Path) -> Vec<PathBuf> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!("Rule directory {} does not exist", dir.display());
            return Vec::new();
        }
        Err(e) => {
            warn!("Failed to read rule directory {}: {}", dir.display(), e);
            return Vec::new();
        }
    };

    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.extension().is_some_and(|ext| ext == RULE_EXTENSION) && path.is_file()
        })
        .collect();
    files.sort();
    files
}

/// Owner name of a rule file and whether it is an extension rule
fn owner_name(path: &Path) -> Option<(String, bool)> {
    let stem = path.file_stem()?.to_str()?;
    let (name, extension) = match stem.strip_prefix('+') {
        Some(rest) => (rest, true),
        None => (stem, false),
    };

    if name.is_empty() {
        warn!("Ignoring rule file without package name: {}", path.display());
        return None;
    }
    Some((name.to_string(), extension))
}

fn is_wildcard(name: &str) -> bool {
    name.contains('*') || name.contains('?') || (name.contains('[') && name.contains(']'))
}

fn read_rule_file(path: &Path) -> Option<Vec<Rule>> {
    match fs::read_to_string(path) {
        Ok(content) => Some(parse::parse_rules(&content)),
        Err(e) => {
            warn!("Failed to read rule file {}: {}", path.display(), e);
            None
        }
    }
}

/// Append rules whose dependency is not in `target` yet
fn merge_rules(target: &mut Vec<Rule>, rules: &[Rule]) {
    for rule in rules {
        if !target.iter().any(|r| r.package == rule.package) {
            target.push(rule.clone());
        }
    }
}
