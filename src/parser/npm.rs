//! npm/yarn requirement parser
//!
//! Handles requirement formats:
//! - Exact: `1.2.3`, `=1.2.3`, `v1.2.3`
//! - Caret: `^1.2.3`, `^1.2`
//! - Tilde: `~1.2.3`, `~>1.2`
//! - Comparison: `>=1.2.3`, `>1.2.3`, `<=1.2.3`, `<1.2.3`
//! - Wildcard: `*`, `x`, `1.x`, `1.2.*`
//! - Range: `>=1.0.0 <2.0.0`, `1.0.0 - 2.0.0`, `^1.0.0 || ^2.0.0`
//! - Dist-tag: `latest`

use crate::domain::{Ecosystem, VersionSpec, VersionSpecKind};
use crate::parser::VersionParser;
use regex::Regex;
use std::sync::LazyLock;

/// npm/yarn requirement parser
pub struct NpmVersionParser;

/// A single comparator: operator, then a full or partial version
static COMPARATOR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<prefix>(?P<op>\^|~>?|>=|<=|>|<|=)?\s*v?)(?P<version>\d+(?:\.\d+){0,2}(?:-[0-9A-Za-z.-]+)?(?:\+[0-9A-Za-z.-]+)?)$",
    )
    .unwrap()
});
static WILDCARD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:v?\d+(?:\.\d+)?\.)?[xX*]$").unwrap());
static VERSION_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+(?:\.\d+){0,2}").unwrap());

impl VersionParser for NpmVersionParser {
    fn parse(&self, version_str: &str) -> Option<VersionSpec> {
        let trimmed = version_str.trim();

        if trimmed.is_empty() {
            return None;
        }

        if trimmed == "latest" {
            return Some(VersionSpec::new(VersionSpecKind::Any, trimmed, ""));
        }

        if let Some(caps) = COMPARATOR_RE.captures(trimmed) {
            let version = caps.name("version")?.as_str();
            let kind = match caps.name("op").map(|m| m.as_str()) {
                None | Some("=") => VersionSpecKind::Exact,
                Some("^") => VersionSpecKind::Caret,
                Some("~") | Some("~>") => VersionSpecKind::Tilde,
                Some(">=") => VersionSpecKind::GreaterOrEqual,
                Some(">") => VersionSpecKind::Greater,
                Some("<=") => VersionSpecKind::LessOrEqual,
                Some("<") => VersionSpecKind::Less,
                Some(_) => return None,
            };
            let prefix = caps.name("prefix").map_or("", |m| m.as_str());
            let spec = VersionSpec::new(kind, trimmed, version);
            return Some(if prefix.is_empty() {
                spec
            } else {
                spec.with_prefix(prefix)
            });
        }

        if WILDCARD_RE.is_match(trimmed) {
            return Some(VersionSpec::new(VersionSpecKind::Wildcard, trimmed, trimmed));
        }

        // Compound ranges: every part must itself be a comparator or wildcard
        let parts: Vec<&str> = trimmed
            .split("||")
            .flat_map(|alternative| alternative.split_whitespace())
            .filter(|part| *part != "-")
            .collect();
        let is_range = parts.len() > 1
            && parts
                .iter()
                .all(|part| COMPARATOR_RE.is_match(part) || WILDCARD_RE.is_match(part));
        if is_range {
            let first_version = VERSION_RE
                .find(trimmed)
                .map(|m| m.as_str())
                .unwrap_or_default();
            return Some(VersionSpec::new(VersionSpecKind::Range, trimmed, first_version));
        }

        None
    }

    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::NpmAndYarn
    }
}
