//! Requirement matching for npm-style ranges
//!
//! npm semantics differ from the `semver` crate's Cargo semantics in a few
//! places, so ranges are normalized before being handed to `VersionReq`:
//! - a bare version is exact (`1.2.3` means `=1.2.3`)
//! - `x`/`X` are wildcards
//! - `a - b` is an inclusive range
//! - `||` separates alternatives
//!
//! Puppet Forge requirements use the same syntax.

use regex::Regex;
use semver::{Version, VersionReq};
use std::sync::LazyLock;

/// An operator followed by whitespace (`>= 1.2.3`)
static SPACED_OP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(>=|<=|>|<|=|\^|~>?)\s+").unwrap());

/// A parsed requirement: satisfied when any alternative is
#[derive(Debug, Clone, PartialEq)]
pub struct RequirementSet {
    alternatives: Vec<VersionReq>,
}

impl RequirementSet {
    /// Parses an npm range; `None` when the syntax is not understood
    pub fn parse(requirement: &str) -> Option<Self> {
        let requirement = requirement.trim();
        if requirement.is_empty() || requirement == "latest" {
            return Some(Self {
                alternatives: vec![VersionReq::STAR],
            });
        }

        let alternatives = requirement
            .split("||")
            .map(parse_alternative)
            .collect::<Option<Vec<_>>>()?;
        Some(Self { alternatives })
    }

    /// Whether `version` satisfies the requirement
    pub fn matches(&self, version: &Version) -> bool {
        self.alternatives.iter().any(|req| req.matches(version))
    }
}

/// Whether `version` satisfies `requirement`; `None` when either cannot be parsed
pub fn satisfies(requirement: &str, version: &str) -> Option<bool> {
    let version = Version::parse(version.trim_start_matches('v')).ok()?;
    Some(RequirementSet::parse(requirement)?.matches(&version))
}

fn parse_alternative(alternative: &str) -> Option<VersionReq> {
    let alternative = SPACED_OP_RE.replace_all(alternative.trim(), "$1");
    let parts: Vec<&str> = alternative.split_whitespace().collect();

    let comparators: Vec<String> = match parts.as_slice() {
        [] => vec!["*".to_string()],
        [low, "-", high] => vec![
            format!(">={}", normalize_version(low)),
            format!("<={}", normalize_version(high)),
        ],
        parts => parts.iter().map(|part| normalize_comparator(part)).collect(),
    };

    VersionReq::parse(&comparators.join(", ")).ok()
}

fn normalize_comparator(comparator: &str) -> String {
    let split = comparator
        .find(|c: char| c.is_ascii_digit() || c == 'x' || c == 'X' || c == '*' || c == 'v')
        .unwrap_or(comparator.len());
    let (op, version) = comparator.split_at(split);
    let version = normalize_version(version);

    match op {
        // Bare versions are exact in npm
        "" if version.contains('*') => version,
        "" => format!("={}", version),
        "~>" => format!("~{}", version),
        _ => format!("{}{}", op, version),
    }
}

fn normalize_version(version: &str) -> String {
    let version = version.trim_start_matches('v');
    let parts: Vec<&str> = version
        .split('.')
        .map(|part| if part == "x" || part == "X" { "*" } else { part })
        .collect();
    // `1.*.*` is not accepted by semver, `1.*` is
    match parts.iter().position(|part| *part == "*") {
        Some(0) => "*".to_string(),
        Some(i) => format!("{}.*", parts[..i].join(".")),
        None => parts.join("."),
    }
}
