// src/rules/parse.rs

//! Rule file grammar
//!
//! A rule file holds whitespace separated tokens, each either `dep` or
//! `dep=scope`. The scope expression is an optional `:offset[:length]`
//! window, optionally followed by `::tail`, where the tail is a segment
//! count, `v`, `s` or `r`:
//!
//! ```text
//! libfoo            any change
//! libfoo=0          epoch
//! libfoo=v          version
//! libfoo=2          first two version segments
//! libfoo=s          suffix
//! libfoo=r          revision
//! libfoo=:2:3::v    version of the 3 characters starting at offset 2
//! ```

use super::Rule;
use crate::version::{RuleScope, VersionRange};
use regex::Regex;
use std::sync::LazyLock;
use tracing::warn;

// Older releases allowed a `{{regex}}` suffix on tokens; it is dropped.
static COMPAT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.*?)(?:\{\{(.*)\}\})?$").unwrap());
static TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.+?)(?:=([\dvsr:]+))?$").unwrap());
static RANGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^:(\d+)(?::(\d+))?(?:::(.*)$|$)").unwrap());
static TAIL_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(?:\d+|v|s|r)$").unwrap());

/// Parse the body of a rule file into rules, in file order
pub fn parse_rules(content: &str) -> Vec<Rule> {
    content.split_whitespace().filter_map(parse_token).collect()
}

/// Parse a single `dep[=scope]` token
pub fn parse_token(token: &str) -> Option<Rule> {
    let token = match COMPAT_RE.captures(token) {
        Some(caps) => caps.get(1).map_or(token, |m| m.as_str()),
        None => token,
    };

    let caps = TOKEN_RE.captures(token)?;
    let mut rule = Rule::new(&caps[1]);
    if let Some(expr) = caps.get(2) {
        apply_scope(&mut rule, expr.as_str());
    }
    Some(rule)
}

/// Fill scope, range and count of `rule` from a scope expression
fn apply_scope(rule: &mut Rule, expr: &str) {
    let tail = match RANGE_RE.captures(expr) {
        Some(caps) => {
            // digit runs were matched by the regex, only overflow can fail here
            let offset = caps[1].parse().unwrap_or(usize::MAX);
            let length = caps.get(2).and_then(|m| m.as_str().parse().ok());
            rule.range = Some(VersionRange::new(offset, length));
            caps.get(3).map(|m| m.as_str()).filter(|s| !s.is_empty())
        }
        None => Some(expr),
    };

    let Some(tail) = tail else {
        // a bare window compares the epoch of the windowed strings
        rule.scope = RuleScope::Epoch;
        return;
    };

    if !TAIL_RE.is_match(tail) {
        warn!(
            "Ignoring invalid scope '{}' for '{}', any change will trigger",
            tail, rule.package
        );
        return;
    }

    match tail {
        "r" => rule.scope = RuleScope::Revision,
        "s" => rule.scope = RuleScope::Suffix,
        "v" => rule.scope = RuleScope::Version,
        "0" => rule.scope = RuleScope::Epoch,
        digits => match digits.parse::<usize>() {
            Ok(0) => rule.scope = RuleScope::Epoch,
            Ok(count) => {
                rule.scope = RuleScope::Version;
                rule.count = Some(count);
            }
            Err(_) => warn!("Segment count '{}' for '{}' is too large", digits, rule.package),
        },
    }
}
