//! Effective version resolution for npm and yarn dependencies
//!
//! The version of a dependency comes from its lockfile entry. Git
//! dependencies resolve to the pinned commit, or to the semantic version of
//! a tag pointing at that commit when the requirement carries a semver
//! constraint.

mod git_metadata;

pub use git_metadata::{parse_ls_remote, GitCliMetadataFetcher, GitMetadataFetcher, GitTag};

use crate::domain::Credentials;
use crate::manifest::lockfile::LockfileParser;
use crate::source::GitReference;
use regex::Regex;
use std::sync::LazyLock;

static COMMIT_SHA_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[0-9a-f]{40}$").unwrap());

static TAG_VERSION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?P<version>[0-9]+\.[0-9]+(?:\.[a-z0-9\-]+)*)$").unwrap()
});

/// Major-only tags such as `v2` or `v3-beta`
static MAJOR_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^v(?P<version>[0-9]+(?:-[a-z0-9]+)?)$").unwrap());

/// One to three numeric components with an optional pre-release part
static LAX_VERSION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^[0-9]+(?:\.[0-9]+){0,2}(?:[-.][0-9a-z]+(?:[-.][0-9a-z]+)*)?$").unwrap()
});

/// Version carried by a tag name, if it looks like a release tag
fn tag_version(name: &str) -> Option<&str> {
    let version = TAG_VERSION_RE
        .captures(name)
        .or_else(|| MAJOR_TAG_RE.captures(name))?
        .name("version")?
        .as_str();
    LAX_VERSION_RE.is_match(version).then_some(version)
}

/// Resolves the effective version of manifest entries
pub struct VersionResolver<'a> {
    lockfiles: &'a LockfileParser,
    git: &'a dyn GitMetadataFetcher,
    credentials: &'a Credentials,
}

impl<'a> VersionResolver<'a> {
    pub fn new(
        lockfiles: &'a LockfileParser,
        git: &'a dyn GitMetadataFetcher,
        credentials: &'a Credentials,
    ) -> Self {
        Self {
            lockfiles,
            git,
            credentials,
        }
    }

    /// Resolves the version of `name` declared with `requirement` in `manifest_name`
    pub fn resolve_version(
        &self,
        name: &str,
        requirement: &str,
        manifest_name: &str,
    ) -> Option<String> {
        match GitReference::parse(requirement) {
            Some(git) if git.has_semver() => {
                if let Some(version) = self.semver_version_for(name, requirement, manifest_name) {
                    return Some(version);
                }
                let revision = self.git_revision_for(name, requirement, manifest_name)?;
                self.version_from_git_revision(&git, &revision)
                    .or(Some(revision))
            }
            Some(_) => self.git_revision_for(name, requirement, manifest_name),
            None => self.semver_version_for(name, requirement, manifest_name),
        }
    }

    /// The 40-hex commit a git dependency is pinned to in the lockfile.
    ///
    /// Looks at the `version` fragment, the `resolved` fragment, then the last
    /// path segment of `resolved`.
    pub fn git_revision_for(
        &self,
        name: &str,
        requirement: &str,
        manifest_name: &str,
    ) -> Option<String> {
        if !GitReference::matches(requirement) {
            return None;
        }
        let details = self
            .lockfiles
            .lockfile_details(name, requirement, manifest_name)?;

        let version = details.version.as_deref();
        let resolved = details.resolved.as_deref();
        let revision = [
            version.and_then(|v| v.rsplit('#').next()),
            resolved.and_then(|r| r.rsplit('#').next()),
            resolved.and_then(|r| r.rsplit('/').next()),
        ]
        .into_iter()
        .flatten()
        .find(|candidate| COMMIT_SHA_RE.is_match(candidate))
        .map(str::to_string);
        revision
    }

    /// The semantic version of the first tag pointing at `revision`
    fn version_from_git_revision(&self, git: &GitReference, revision: &str) -> Option<String> {
        let url = git.url();
        let tags = match self.git.list_tags(&url, self.credentials) {
            Ok(tags) => tags,
            Err(e) => {
                tracing::warn!("Could not list tags of {}: {}", url, e);
                return None;
            }
        };

        tags.iter()
            .filter(|tag| tag.commit_sha == revision || tag.tag_sha == revision)
            .find_map(|tag| tag_version(&tag.name))
            .map(str::to_string)
    }

    /// The plain version recorded in the lockfile.
    ///
    /// Values that are URLs, local paths or carry a fragment are not versions.
    fn semver_version_for(
        &self,
        name: &str,
        requirement: &str,
        manifest_name: &str,
    ) -> Option<String> {
        let version = self
            .lockfiles
            .lockfile_details(name, requirement, manifest_name)?
            .version?;

        let disguised = ["://", "file:", "link:", "#"]
            .iter()
            .any(|marker| version.contains(marker));
        (!disguised).then_some(version)
    }
}
