//! npm Registry adapter
//!
//! Fetches package version information from the npm registry, or from the
//! registry a project's .npmrc points at.
//! API endpoint: {registry}/{package}

use crate::domain::{Credentials, Ecosystem};
use crate::error::RegistryError;
use crate::manifest::NpmrcSettings;
use crate::registry::{HttpClient, RegistryAdapter};
use crate::update::VersionInfo;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::HashMap;

/// npm registry base URL
pub const NPM_REGISTRY_URL: &str = "https://registry.npmjs.org";

/// npm Registry adapter
pub struct NpmAdapter {
    client: HttpClient,
    settings: NpmrcSettings,
    credentials: Credentials,
}

/// npm package metadata response
#[derive(Debug, Deserialize)]
struct NpmPackageResponse {
    /// Publish times keyed by version, plus `created`/`modified`
    #[serde(default)]
    time: HashMap<String, String>,
    /// Available versions
    versions: HashMap<String, serde_json::Value>,
}

impl NpmAdapter {
    /// Create a new npm adapter querying the public registry
    pub fn new(client: HttpClient) -> Self {
        Self {
            client,
            settings: NpmrcSettings::default(),
            credentials: Credentials::default(),
        }
    }

    /// Use the registries configured in a project's .npmrc
    pub fn with_settings(mut self, settings: NpmrcSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Use `npm_registry` credentials for authenticated registries
    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = credentials;
        self
    }

    /// Build the URL for a package
    fn build_url(&self, package: &str) -> String {
        let registry = self
            .settings
            .registry_for(package)
            .unwrap_or(NPM_REGISTRY_URL)
            .trim_end_matches('/');
        format!("{}/{}", registry, package)
    }

    /// The token of the credential matching `url`, if any
    fn token_for(&self, url: &str) -> Option<&str> {
        self.credentials
            .registry_for_url(url)
            .and_then(|c| c.token.as_deref())
    }
}

fn versions_from(response: NpmPackageResponse) -> Vec<VersionInfo> {
    let mut versions: Vec<VersionInfo> = response
        .versions
        .into_keys()
        .map(|version| {
            match response
                .time
                .get(&version)
                .and_then(|t| t.parse::<DateTime<Utc>>().ok())
            {
                Some(released_at) => VersionInfo::new(version, released_at),
                None => VersionInfo::undated(version),
            }
        })
        .collect();

    // Sort by version
    versions.sort();
    versions
}

#[async_trait]
impl RegistryAdapter for NpmAdapter {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::NpmAndYarn
    }

    fn registry_name(&self) -> &'static str {
        "npm"
    }

    async fn fetch_versions(&self, package: &str) -> Result<Vec<VersionInfo>, RegistryError> {
        let url = self.build_url(package);
        tracing::debug!("Fetching {}", url);
        let response: NpmPackageResponse = self
            .client
            .get_json_authorized(&url, package, self.registry_name(), self.token_for(&url))
            .await?;

        Ok(versions_from(response))
    }
}
