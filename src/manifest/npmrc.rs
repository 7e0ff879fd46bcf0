//! .npmrc settings reader
//!
//! Reads from .npmrc:
//! - registry=https://npm.example.com/
//! - @scope:registry=https://npm.example.com/scope/
//! - //npm.example.com/:_authToken=${NPM_TOKEN}
//! - minimum-release-age=10d

use crate::domain::{find_file, Credential, Credentials, DependencyFile};
use std::collections::BTreeMap;
use std::time::Duration;

/// Settings read from a project's .npmrc
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NpmrcSettings {
    /// Default registry
    pub registry: Option<String>,
    /// Registries for scoped packages, keyed by `@scope`
    pub scoped_registries: BTreeMap<String, String>,
    /// `npm_registry` credentials from `_authToken` lines
    pub credentials: Credentials,
    /// Minimum release age for packages
    pub minimum_release_age: Option<Duration>,
}

impl NpmrcSettings {
    /// Reads the root `.npmrc` of a file set, if present
    pub fn from_files(files: &[DependencyFile]) -> Self {
        find_file(files, ".npmrc")
            .map(|file| Self::parse(file.content()))
            .unwrap_or_default()
    }

    /// Parses .npmrc content
    pub fn parse(content: &str) -> Self {
        let mut settings = NpmrcSettings::default();

        for line in content.lines() {
            let line = line.trim();
            // Skip comments
            if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
                continue;
            }

            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let key = key.trim();
            let value = expand_env(value.trim().trim_matches('"').trim_matches('\''));

            if key == "registry" {
                settings.registry = Some(value);
            } else if key == "minimum-release-age" {
                settings.minimum_release_age = parse_duration(&value);
            } else if let Some(scope) = key.strip_suffix(":registry") {
                settings.scoped_registries.insert(scope.to_string(), value);
            } else if let Some(registry) = key
                .strip_prefix("//")
                .and_then(|k| k.strip_suffix(":_authToken"))
            {
                let registry = registry.trim_end_matches('/');
                settings
                    .credentials
                    .push(Credential::npm_registry(registry, Some(value)));
            }
        }

        settings
    }

    /// Registry to query for `package`, honoring scoped registries
    pub fn registry_for(&self, package: &str) -> Option<&str> {
        package
            .split_once('/')
            .filter(|(scope, _)| scope.starts_with('@'))
            .and_then(|(scope, _)| self.scoped_registries.get(scope))
            .or(self.registry.as_ref())
            .map(String::as_str)
    }
}

/// Replaces a `${VAR}` value with the environment variable it names
fn expand_env(value: &str) -> String {
    value
        .strip_prefix("${")
        .and_then(|v| v.strip_suffix('}'))
        .and_then(|var| std::env::var(var).ok())
        .unwrap_or_else(|| value.to_string())
}

/// Parse duration string in format: Nd (days), Nw (weeks), Nm (months)
pub fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    let (num_str, unit) = if let Some(n) = s.strip_suffix('d') {
        (n, 'd')
    } else if let Some(n) = s.strip_suffix('w') {
        (n, 'w')
    } else if let Some(n) = s.strip_suffix('m') {
        (n, 'm')
    } else {
        return None;
    };

    let num: u64 = num_str.parse().ok()?;

    let seconds = match unit {
        'd' => num * 24 * 60 * 60,      // days
        'w' => num * 7 * 24 * 60 * 60,  // weeks
        'm' => num * 30 * 24 * 60 * 60, // months (30 days)
        _ => return None,
    };

    Some(Duration::from_secs(seconds))
}
