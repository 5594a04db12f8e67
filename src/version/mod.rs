// src/version/mod.rs

//! Version parsing and rebuild significance checks
//!
//! Package versions follow the pacman layout `[epoch:]upstream-revision`,
//! where `upstream` is a dotted run of numeric segments optionally followed
//! by a free-form suffix (`1.2.3rc1`, `2.0.beta`, ...). A rule decides how
//! sensitive its owner is to a dependency's version change:
//!
//! - `Any` compares the raw strings
//! - `Epoch` compares only the epoch
//! - `Version` adds the numeric segments (optionally only the first `count`)
//! - `Suffix` adds the upstream suffix
//! - `Revision` adds the package revision
//!
//! Each scope includes every broader one below it in that list. Strings that
//! do not follow the layout are compared verbatim.

use regex::Regex;
use std::fmt;
use std::sync::LazyLock;
use thiserror::Error;
use tracing::warn;

static VERSION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:(\d+):)?(\d+(?:\.\d+)*)(.*)-([^-]+)$").unwrap()
});

/// Granularity of a version comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum RuleScope {
    /// Any textual difference
    #[default]
    Any,
    Epoch,
    Version,
    Suffix,
    Revision,
}

impl RuleScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleScope::Any => "any",
            RuleScope::Epoch => "epoch",
            RuleScope::Version => "version",
            RuleScope::Suffix => "suffix",
            RuleScope::Revision => "revision",
        }
    }
}

impl fmt::Display for RuleScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Character window applied to both version strings before comparing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VersionRange {
    pub offset: usize,
    /// `None` extends the window to the end of the string
    pub length: Option<usize>,
}

impl VersionRange {
    pub fn new(offset: usize, length: Option<usize>) -> Self {
        Self { offset, length }
    }

    /// Cut the window out of `version`; out-of-range windows yield an empty string
    pub fn apply(&self, version: &str) -> String {
        let chars = version.chars().skip(self.offset);
        match self.length {
            Some(len) => chars.take(len).collect(),
            None => chars.collect(),
        }
    }
}

/// Version string that does not follow `[epoch:]upstream-revision`
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("'{0}' is not a valid package version")]
pub struct VersionParseError(String);

/// A package version split into the parts rules can compare
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PkgVersion {
    pub epoch: u64,
    pub segments: Vec<u64>,
    pub suffix: String,
    pub revision: String,
}

impl PkgVersion {
    /// Parse a pacman version string
    ///
    /// Examples:
    /// - "1.2.3-1" → epoch=0, segments=[1,2,3], suffix="", revision="1"
    /// - "2:4.1rc2-3" → epoch=2, segments=[4,1], suffix="rc2", revision="3"
    pub fn parse(s: &str) -> Result<Self, VersionParseError> {
        let invalid = || VersionParseError(s.to_string());
        let caps = VERSION_RE.captures(s).ok_or_else(invalid)?;

        let epoch = match caps.get(1) {
            Some(m) => m.as_str().parse().map_err(|_| invalid())?,
            None => 0,
        };

        let segments = caps[2]
            .split('.')
            .map(|seg| seg.parse::<u64>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| invalid())?;

        Ok(Self {
            epoch,
            segments,
            suffix: caps[3].to_string(),
            revision: caps[4].to_string(),
        })
    }

    /// Whether the change from `self` to `other` is visible at `scope`
    ///
    /// Checks run from the requested scope down to the epoch and stop at the
    /// first difference. `Any` is handled by the caller on raw strings.
    fn differs_at(&self, other: &PkgVersion, scope: RuleScope, count: Option<usize>) -> bool {
        if scope >= RuleScope::Revision && self.revision != other.revision {
            return true;
        }
        if scope >= RuleScope::Suffix && self.suffix != other.suffix {
            return true;
        }
        if scope >= RuleScope::Version {
            let differs = match count {
                Some(n) => !self.segments.iter().take(n).eq(other.segments.iter().take(n)),
                None => self.segments != other.segments,
            };
            if differs {
                return true;
            }
        }
        self.epoch != other.epoch
    }
}

impl fmt::Display for PkgVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.epoch > 0 {
            write!(f, "{}:", self.epoch)?;
        }
        let segments: Vec<String> = self.segments.iter().map(u64::to_string).collect();
        write!(f, "{}{}-{}", segments.join("."), self.suffix, self.revision)
    }
}

/// Decide whether moving from `old` to `new` should trigger a rebuild
///
/// Never fails: versions that cannot be parsed are compared as raw strings
/// and a warning is logged.
pub fn decide(
    old: &str,
    new: &str,
    scope: RuleScope,
    range: Option<VersionRange>,
    count: Option<usize>,
) -> bool {
    let (old, new) = match range {
        Some(r) => (r.apply(old), r.apply(new)),
        None => (old.to_string(), new.to_string()),
    };

    if scope == RuleScope::Any {
        return old != new;
    }

    match (PkgVersion::parse(&old), PkgVersion::parse(&new)) {
        (Ok(a), Ok(b)) => a.differs_at(&b, scope, count),
        (Err(e), _) | (_, Err(e)) => {
            warn!("{}, falling back to plain comparison", e);
            old != new
        }
    }
}
