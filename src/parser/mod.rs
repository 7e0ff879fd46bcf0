//! Requirement parsers for the supported ecosystems
//!
//! This module provides parsers for requirement strings in:
//! - npm/yarn (package.json)
//! - Puppet (Puppetfile)

mod npm;
mod puppet;

pub use npm::NpmVersionParser;
pub use puppet::PuppetVersionParser;

use crate::domain::{Ecosystem, VersionSpec};

/// Trait for parsing requirement strings
pub trait VersionParser: Send + Sync {
    /// Parse a requirement string
    fn parse(&self, version_str: &str) -> Option<VersionSpec>;

    /// Returns the ecosystem this parser handles
    fn ecosystem(&self) -> Ecosystem;
}

/// Get a version parser for the specified ecosystem
pub fn get_parser(ecosystem: Ecosystem) -> Box<dyn VersionParser> {
    match ecosystem {
        Ecosystem::NpmAndYarn => Box::new(NpmVersionParser),
        Ecosystem::Puppet => Box::new(PuppetVersionParser),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_parser_npm_and_yarn() {
        let parser = get_parser(Ecosystem::NpmAndYarn);
        assert_eq!(parser.ecosystem(), Ecosystem::NpmAndYarn);
    }

    #[test]
    fn test_get_parser_puppet() {
        let parser = get_parser(Ecosystem::Puppet);
        assert_eq!(parser.ecosystem(), Ecosystem::Puppet);
    }
}
