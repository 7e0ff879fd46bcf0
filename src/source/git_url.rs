//! Version-control requirement recognition
//!
//! Recognizes requirement strings such as:
//! - `user/repo`, `github:user/repo#v1.0.0`
//! - `git+ssh://git@github.com:user/repo.git#semver:^1.0.0`
//! - `bitbucket:user/repo#^2.0`, `gitlab:user/repo`
//! - `https://github.com/user/repo#abc123`

use crate::domain::Source;
use regex::Regex;
use std::sync::LazyLock;

/// Ref used when a git requirement carries no `#` suffix
pub const DEFAULT_REF: &str = "master";

// `semver_op` covers the `#^1.0` form; it is a separate group because the
// operator character is part of the captured constraint.
static GIT_URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(?P<git_prefix>^|^git.*?|^github:|^bitbucket:|^gitlab:|github\.com/)(?P<username>[a-z0-9-]+)/(?P<repo>[a-z0-9_.-]+)(?:(?:#semver:(?P<semver>.+))|(?:#(?P<semver_op>[\^~=<>*].*))|(?:#(?P<ref>.+)))?$",
    )
    .unwrap()
});

static SSH_HOST_SEPARATOR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r":/?").unwrap());

/// A requirement string recognized as a version-control reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitReference {
    raw: String,
    prefix: String,
    username: String,
    repo: String,
    semver: Option<String>,
    reference: Option<String>,
}

impl GitReference {
    /// Parses a requirement, returning None when it is not a git reference
    pub fn parse(requirement: &str) -> Option<Self> {
        let caps = GIT_URL_RE.captures(requirement)?;
        let text = |name: &str| caps.name(name).map(|m| m.as_str().to_string());

        Some(Self {
            raw: requirement.to_string(),
            prefix: text("git_prefix").unwrap_or_default(),
            username: text("username").unwrap_or_default(),
            repo: text("repo").unwrap_or_default(),
            semver: text("semver").or_else(|| text("semver_op")),
            reference: text("ref"),
        })
    }

    /// Returns true if `requirement` is a git reference
    pub fn matches(requirement: &str) -> bool {
        GIT_URL_RE.is_match(requirement)
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn repo(&self) -> &str {
        &self.repo
    }

    /// Semver constraint from a `#semver:` or `#^…` suffix
    pub fn semver(&self) -> Option<&str> {
        self.semver.as_deref()
    }

    /// Literal ref from a `#ref` suffix
    pub fn reference(&self) -> Option<&str> {
        self.reference.as_deref()
    }

    pub fn has_semver(&self) -> bool {
        self.semver.is_some()
    }

    /// Host-qualified url without scheme, e.g. `github.com/user/repo`
    pub fn bare_url(&self) -> String {
        if self.prefix.contains("git@") {
            let after = self.raw.rsplit("git@").next().unwrap_or(&self.raw);
            let replaced = SSH_HOST_SEPARATOR_RE.replace(after, "/");
            strip_fragment(&replaced).to_string()
        } else if self.prefix.contains("://") {
            let after = self
                .raw
                .split_once("://")
                .map(|(_, rest)| rest)
                .unwrap_or(&self.raw);
            strip_fragment(after).to_string()
        } else if self.prefix.contains("bitbucket") {
            format!("bitbucket.org/{}/{}", self.username, self.repo)
        } else if self.prefix.contains("gitlab") {
            format!("gitlab.com/{}/{}", self.username, self.repo)
        } else {
            format!("github.com/{}/{}", self.username, self.repo)
        }
    }

    /// Url of the remote, always `https://`
    pub fn url(&self) -> String {
        format!("https://{}", self.bare_url())
    }

    /// The classified source for this reference
    pub fn source(&self) -> Source {
        Source::git(
            self.url(),
            self.reference.clone().unwrap_or_else(|| DEFAULT_REF.to_string()),
        )
    }
}

fn strip_fragment(url: &str) -> &str {
    url.split('#').next().unwrap_or(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source_of(requirement: &str) -> Source {
        GitReference::parse(requirement).unwrap().source()
    }

    #[test]
    fn test_plain_semver_is_not_git() {
        assert!(!GitReference::matches("^1.0.0"));
        assert!(!GitReference::matches("1.2.3"));
        assert!(!GitReference::matches(">=1.0.0 <2.0.0"));
        assert!(!GitReference::matches("*"));
    }

    #[test]
    fn test_shorthand_defaults_to_github_master() {
        assert_eq!(
            source_of("user/repo"),
            Source::git("https://github.com/user/repo", "master")
        );
    }

    #[test]
    fn test_semver_suffix() {
        let git = GitReference::parse("github:user/repo#semver:^1.2.0").unwrap();
        assert_eq!(git.semver(), Some("^1.2.0"));
        assert_eq!(git.reference(), None);
        assert_eq!(git.source(), Source::git("https://github.com/user/repo", "master"));
    }

    #[test]
    fn test_operator_suffix_is_semver() {
        let git = GitReference::parse("bitbucket:user/repo#^2.0").unwrap();
        assert_eq!(git.semver(), Some("^2.0"));
        assert_eq!(
            git.source(),
            Source::git("https://bitbucket.org/user/repo", "master")
        );
    }

    #[test]
    fn test_ref_suffix() {
        let git = GitReference::parse("gitlab:user/repo#v1.0.0").unwrap();
        assert!(!git.has_semver());
        assert_eq!(git.reference(), Some("v1.0.0"));
        assert_eq!(git.source(), Source::git("https://gitlab.com/user/repo", "v1.0.0"));
    }

    #[test]
    fn test_ssh_url() {
        assert_eq!(
            source_of("git+ssh://git@github.com:user/repo.git#abc"),
            Source::git("https://github.com/user/repo.git", "abc")
        );
        assert_eq!(
            source_of("git@bitbucket.org:/team/repo.git"),
            Source::git("https://bitbucket.org/team/repo.git", "master")
        );
    }

    #[test]
    fn test_scheme_url() {
        assert_eq!(
            source_of("git+https://github.com/user/repo.git#semver:~1.0"),
            Source::git("https://github.com/user/repo.git", "master")
        );
        assert_eq!(
            source_of("https://github.com/user/repo#0123abc"),
            Source::git("https://github.com/user/repo", "0123abc")
        );
    }

    #[test]
    fn test_case_insensitive_prefix() {
        assert!(GitReference::matches("GitHub:User/Repo"));
    }

    #[test]
    fn test_tarball_url_is_not_git() {
        assert!(!GitReference::matches(
            "https://registry.example.com/pkg/-/pkg-1.0.0.tgz"
        ));
    }
}
