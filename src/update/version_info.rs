//! Published releases as seen by the registry oracle
//!
//! A release carries its publish date so the oracle can apply the minimum
//! age before picking the latest stable candidate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// One published release of a package
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionInfo {
    /// The version string (e.g., "1.2.3")
    pub version: String,
    /// When this version was released, if the registry says
    pub released_at: Option<DateTime<Utc>>,
}

impl VersionInfo {
    /// A release with a known publish date
    pub fn new(version: impl Into<String>, released_at: DateTime<Utc>) -> Self {
        Self {
            version: version.into(),
            released_at: Some(released_at),
        }
    }

    /// A release the registry gave no date for
    pub fn undated(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            released_at: None,
        }
    }

    /// Returns true for pre-release versions (`1.0.0-beta.1`)
    pub fn is_prerelease(&self) -> bool {
        is_prerelease_version(&self.version)
    }

    /// Returns true if the version was released at or before `cutoff`.
    ///
    /// Undated versions never qualify.
    pub fn released_before(&self, cutoff: DateTime<Utc>) -> bool {
        self.released_at.is_some_and(|at| at <= cutoff)
    }
}

impl Ord for VersionInfo {
    fn cmp(&self, other: &Self) -> Ordering {
        compare_versions(&self.version, &other.version)
    }
}

impl PartialOrd for VersionInfo {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Returns true if the version string carries a pre-release part
pub fn is_prerelease_version(version: &str) -> bool {
    let version = version.strip_prefix('v').unwrap_or(version);
    match semver::Version::parse(version) {
        Ok(v) => !v.pre.is_empty(),
        Err(_) => version.contains('-'),
    }
}

/// Compare two version strings.
///
/// Valid semantic versions use semver precedence; anything else falls back
/// to comparing the numeric dot/dash separated parts.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let a = a.strip_prefix('v').unwrap_or(a);
    let b = b.strip_prefix('v').unwrap_or(b);

    if let (Ok(va), Ok(vb)) = (semver::Version::parse(a), semver::Version::parse(b)) {
        return va.cmp_precedence(&vb);
    }

    let parse_parts = |s: &str| -> Vec<u64> { s.split(['.', '-']).filter_map(|p| p.parse().ok()).collect() };
    let parts_a = parse_parts(a);
    let parts_b = parse_parts(b);

    for (pa, pb) in parts_a.iter().zip(parts_b.iter()) {
        match pa.cmp(pb) {
            Ordering::Equal => continue,
            other => return other,
        }
    }

    // If all common parts are equal, the longer version is greater
    parts_a.len().cmp(&parts_b.len())
}
