//! Puppetfile version parser
//!
//! Puppetfiles pin Forge modules to an exact release (`4.25.1`) or track
//! the newest one (`:latest`, or no version at all).

use crate::domain::{Ecosystem, VersionSpec, VersionSpecKind};
use crate::parser::VersionParser;

/// Puppet Forge version parser
pub struct PuppetVersionParser;

impl VersionParser for PuppetVersionParser {
    fn parse(&self, version_str: &str) -> Option<VersionSpec> {
        let trimmed = version_str.trim();

        match trimmed {
            "" => None,
            "latest" | ":latest" => Some(VersionSpec::new(VersionSpecKind::Any, trimmed, "")),
            _ => semver::Version::parse(trimmed)
                .ok()
                .map(|_| VersionSpec::new(VersionSpecKind::Exact, trimmed, trimmed)),
        }
    }

    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Puppet
    }
}
