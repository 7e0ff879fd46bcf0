//! Manifest fetching and parsing
//!
//! This module provides functionality to:
//! - Read the dependency files of a project directory
//! - Parse dependencies from npm/yarn manifests and lockfiles
//! - Parse module declarations from Puppetfiles
//! - Support npm/yarn workspaces

mod detector;
pub mod lockfile;
mod npmrc;
mod package_json;
pub mod puppetfile;

pub use detector::{FileFetcher, LocalFileFetcher};
pub use npmrc::{parse_duration, NpmrcSettings};
pub use package_json::{NpmAndYarnParser, DEPENDENCY_TYPES};
pub use puppetfile::PuppetParser;

use crate::domain::{Credentials, DependencyFile, DependencySet, Ecosystem};
use crate::error::ParseError;
use crate::resolver::{GitCliMetadataFetcher, GitMetadataFetcher};
use std::sync::Arc;

/// Trait for turning a fetched file set into dependencies
pub trait FileParser: Send + Sync {
    /// Parse dependencies from the file set
    fn parse(&self, files: &[DependencyFile]) -> Result<DependencySet, ParseError>;

    /// Returns the ecosystem this parser handles
    fn ecosystem(&self) -> Ecosystem;
}

/// Collaborators shared by the parsers
#[derive(Clone)]
pub struct ParserContext {
    pub credentials: Credentials,
    pub git: Arc<dyn GitMetadataFetcher>,
}

impl ParserContext {
    pub fn new(credentials: Credentials, git: Arc<dyn GitMetadataFetcher>) -> Self {
        Self { credentials, git }
    }
}

impl Default for ParserContext {
    fn default() -> Self {
        Self::new(Credentials::default(), Arc::new(GitCliMetadataFetcher::new()))
    }
}

/// Get a file parser for the specified ecosystem
pub fn get_parser(ecosystem: Ecosystem, context: ParserContext) -> Box<dyn FileParser> {
    match ecosystem {
        Ecosystem::NpmAndYarn => Box::new(NpmAndYarnParser::new(context.credentials, context.git)),
        Ecosystem::Puppet => Box::new(PuppetParser),
    }
}
