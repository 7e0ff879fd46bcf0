//! Source classification
//!
//! Turns a raw requirement string and/or a lockfile-resolved URL into a
//! typed [`Source`]:
//! - version-control references (see [`GitReference`])
//! - well-known public registries
//! - private registries, normalized to their root URL

mod git_url;
mod private_registry;

pub use git_url::{GitReference, DEFAULT_REF};
pub use private_registry::registry_url_for;

use crate::domain::{Credentials, Source};

/// Registry URL prefixes treated as public
pub const CENTRAL_REGISTRIES: &[&str] = &[
    "https://registry.npmjs.org",
    "http://registry.npmjs.org",
    "https://registry.yarnpkg.com",
];

const LOCAL_PATH_PREFIXES: &[&str] = &["link:", "file:", "/", "./", "../", "~/"];

/// Returns true for requirements pointing at the local filesystem
pub fn is_local_path(requirement: &str) -> bool {
    LOCAL_PATH_PREFIXES
        .iter()
        .any(|prefix| requirement.starts_with(prefix))
}

/// Returns true for aliased packages (`npm:other@1.0.0`)
pub fn is_alias(requirement: &str) -> bool {
    requirement.starts_with("npm:")
}

/// Returns true for URLs that are not version-control references
pub fn is_non_git_url(requirement: &str) -> bool {
    requirement.contains("://") && !GitReference::matches(requirement)
}

/// Returns true if a manifest entry with this requirement must be skipped
pub fn should_ignore(requirement: &str) -> bool {
    is_local_path(requirement) || is_non_git_url(requirement) || is_alias(requirement)
}

/// The requirement recorded for a manifest entry.
///
/// Git references keep only their semver constraint, which is absent for a
/// reference pinned by a literal ref.
pub fn requirement_for(requirement: &str) -> Option<String> {
    match GitReference::parse(requirement) {
        Some(git) => git.semver().map(str::to_string),
        None => Some(requirement.to_string()),
    }
}

/// Classifies the origin of a dependency.
///
/// Returns None when the origin cannot be told: no resolved URL, or a
/// resolved URL that is not http(s).
pub fn classify(
    name: &str,
    requirement: &str,
    resolved_url: Option<&str>,
    credentials: &Credentials,
) -> Option<Source> {
    if let Some(git) = GitReference::parse(requirement) {
        return Some(git.source());
    }

    let resolved_url = resolved_url?;
    if !resolved_url.starts_with("http") {
        return None;
    }

    if is_public_registry(resolved_url) {
        let root = resolved_url.split('/').take(3).collect::<Vec<_>>().join("/");
        return Some(Source::registry(root));
    }

    Some(Source::private_registry(registry_url_for(
        resolved_url,
        name,
        credentials,
    )))
}

/// Returns true for URLs under a central registry or a code-hosting service
pub fn is_public_registry(resolved_url: &str) -> bool {
    CENTRAL_REGISTRIES
        .iter()
        .any(|registry| resolved_url.starts_with(registry))
        || resolved_url.contains("github")
}
