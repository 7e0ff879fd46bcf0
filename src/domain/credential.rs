//! Registry and git credentials

use serde::{Deserialize, Serialize};

/// Credential type for npm-compatible registries
pub const NPM_REGISTRY: &str = "npm_registry";

/// Credential type for git hosts
pub const GIT_SOURCE: &str = "git_source";

/// A single credential record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    /// Credential type (`npm_registry`, `git_source`, ...)
    #[serde(rename = "type")]
    pub kind: String,
    /// Host for git credentials
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    /// Registry (host plus optional path) for registry credentials
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registry: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl Credential {
    /// Creates an npm registry credential
    pub fn npm_registry(registry: impl Into<String>, token: Option<String>) -> Self {
        Self {
            kind: NPM_REGISTRY.to_string(),
            host: None,
            registry: Some(registry.into()),
            token,
            username: None,
            password: None,
        }
    }

    /// Creates a git source credential
    pub fn git_source(
        host: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            kind: GIT_SOURCE.to_string(),
            host: Some(host.into()),
            registry: None,
            token: None,
            username: Some(username.into()),
            password: Some(password.into()),
        }
    }
}

/// Ordered credential list
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Credentials(Vec<Credential>);

impl Credentials {
    pub fn new(credentials: Vec<Credential>) -> Self {
        Self(credentials)
    }

    /// Parses a JSON array of credentials
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn push(&mut self, credential: Credential) {
        self.0.push(credential);
    }

    pub fn extend(&mut self, other: Credentials) {
        self.0.extend(other.0);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Credential> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Finds the npm registry credential whose registry is a substring of
    /// `url`, preferring the longest registry string.
    pub fn registry_for_url(&self, url: &str) -> Option<&Credential> {
        self.0
            .iter()
            .filter(|c| c.kind == NPM_REGISTRY)
            .filter_map(|c| c.registry.as_deref().map(|r| (c, r)))
            .filter(|(_, registry)| !registry.is_empty() && url.contains(registry))
            .max_by_key(|(_, registry)| registry.len())
            .map(|(c, _)| c)
    }

    /// Finds the git credential for a host
    pub fn git_for_host(&self, host: &str) -> Option<&Credential> {
        self.0
            .iter()
            .find(|c| c.kind == GIT_SOURCE && c.host.as_deref() == Some(host))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_json() {
        let json = r#"[{"type":"npm_registry","registry":"registry.npmjs.org","token":"123"}]"#;
        let creds = Credentials::from_json(json).unwrap();
        let cred = creds.iter().next().unwrap();
        assert_eq!(cred.kind, NPM_REGISTRY);
        assert_eq!(cred.registry.as_deref(), Some("registry.npmjs.org"));
        assert_eq!(cred.token.as_deref(), Some("123"));
    }

    #[test]
    fn test_registry_for_url_prefers_longest() {
        let creds = Credentials::new(vec![
            Credential::npm_registry("npm.example.com", None),
            Credential::npm_registry("npm.example.com/teams/web", None),
            Credential::git_source("npm.example.com/teams/web/extra", "x", "y"),
        ]);
        let found = creds
            .registry_for_url("https://npm.example.com/teams/web/pkg/-/pkg-1.0.0.tgz")
            .unwrap();
        assert_eq!(found.registry.as_deref(), Some("npm.example.com/teams/web"));
    }

    #[test]
    fn test_registry_for_url_no_match() {
        let creds = Credentials::new(vec![Credential::npm_registry("npm.other.com", None)]);
        assert!(creds.registry_for_url("https://npm.example.com/pkg").is_none());
    }

    #[test]
    fn test_git_for_host() {
        let creds = Credentials::new(vec![Credential::git_source(
            "github.com",
            "x-access-token",
            "secret",
        )]);
        assert!(creds.git_for_host("github.com").is_some());
        assert!(creds.git_for_host("gitlab.com").is_none());
    }
}
