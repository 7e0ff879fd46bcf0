//! Puppet Forge adapter
//!
//! Fetches module releases from the Forge v3 API.
//! API endpoint: https://forgeapi.puppet.com/v3/releases?module={author-module}

use crate::domain::Ecosystem;
use crate::error::RegistryError;
use crate::manifest::puppetfile::FORGE_URL;
use crate::registry::{HttpClient, RegistryAdapter};
use crate::update::VersionInfo;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Releases requested per page
const PAGE_SIZE: usize = 100;

/// Upper bound on pages followed for one module
const MAX_PAGES: usize = 20;

/// Puppet Forge adapter
pub struct ForgeAdapter {
    client: HttpClient,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct ReleasesResponse {
    pagination: Pagination,
    results: Vec<Release>,
}

#[derive(Debug, Deserialize)]
struct Pagination {
    /// Path of the next page, relative to the API root
    next: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Release {
    version: String,
    created_at: Option<String>,
    deleted_at: Option<String>,
}

impl ForgeAdapter {
    pub fn new(client: HttpClient) -> Self {
        Self {
            client,
            base_url: FORGE_URL.to_string(),
        }
    }

    /// Query a Forge mirror instead of the public Forge
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Build the first-page URL for a module slug (`author-module`)
    fn build_url(&self, module: &str) -> String {
        format!(
            "{}/v3/releases?module={}&limit={}&show_deleted=false",
            self.base_url, module, PAGE_SIZE
        )
    }
}

/// Parses Forge timestamps (`2019-06-24 08:33:02 -0700`), falling back to RFC 3339
fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S %z")
        .or_else(|_| DateTime::parse_from_rfc3339(value))
        .ok()
        .map(|at| at.with_timezone(&Utc))
}

fn versions_from(releases: Vec<Release>) -> impl Iterator<Item = VersionInfo> {
    releases
        .into_iter()
        .filter(|release| release.deleted_at.is_none())
        .map(|release| match release.created_at.as_deref().and_then(parse_timestamp) {
            Some(released_at) => VersionInfo::new(release.version, released_at),
            None => VersionInfo::undated(release.version),
        })
}

#[async_trait]
impl RegistryAdapter for ForgeAdapter {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Puppet
    }

    fn registry_name(&self) -> &'static str {
        "Puppet Forge"
    }

    async fn fetch_versions(&self, package: &str) -> Result<Vec<VersionInfo>, RegistryError> {
        let mut versions = Vec::new();
        let mut url = Some(self.build_url(package));

        for _ in 0..MAX_PAGES {
            let Some(page_url) = url.take() else {
                break;
            };
            tracing::debug!("Fetching {}", page_url);
            let response: ReleasesResponse = self
                .client
                .get_json(&page_url, package, self.registry_name())
                .await?;

            versions.extend(versions_from(response.results));
            url = response
                .pagination
                .next
                .map(|next| format!("{}{}", self.base_url, next));
        }

        if versions.is_empty() {
            return Err(RegistryError::package_not_found(package, self.registry_name()));
        }

        versions.sort();
        Ok(versions)
    }
}
