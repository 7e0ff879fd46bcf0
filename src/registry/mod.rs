//! Registry adapters for fetching package version information
//!
//! This module provides:
//! - HTTP client shared foundation with retry logic
//! - npm Registry adapter (honoring .npmrc registries and tokens)
//! - Puppet Forge adapter

mod client;
mod forge;
mod npm;

pub use client::HttpClient;
pub use forge::ForgeAdapter;
pub use npm::{NpmAdapter, NPM_REGISTRY_URL};

use crate::domain::{Credentials, Ecosystem};
use crate::error::RegistryError;
use crate::manifest::NpmrcSettings;
use crate::update::VersionInfo;
use async_trait::async_trait;

/// Trait for registry adapters
#[async_trait]
pub trait RegistryAdapter: Send + Sync {
    /// Get the ecosystem this adapter handles
    fn ecosystem(&self) -> Ecosystem;

    /// Get the registry name
    fn registry_name(&self) -> &'static str;

    /// Fetch available versions for a package, sorted ascending
    async fn fetch_versions(&self, package: &str) -> Result<Vec<VersionInfo>, RegistryError>;
}

/// Create a registry adapter for the given ecosystem
pub fn create_adapter(
    ecosystem: Ecosystem,
    client: HttpClient,
    npmrc: NpmrcSettings,
    credentials: Credentials,
) -> Box<dyn RegistryAdapter> {
    match ecosystem {
        Ecosystem::NpmAndYarn => Box::new(
            NpmAdapter::new(client)
                .with_settings(npmrc)
                .with_credentials(credentials),
        ),
        Ecosystem::Puppet => Box::new(ForgeAdapter::new(client)),
    }
}
