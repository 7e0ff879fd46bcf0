//! Ecosystem (package manager) definitions

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Supported package-manager ecosystems
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ecosystem {
    /// npm and yarn (package.json + package-lock.json / yarn.lock)
    NpmAndYarn,
    /// Puppet modules declared in a Puppetfile
    Puppet,
}

impl Ecosystem {
    /// Returns the primary manifest filename for this ecosystem
    pub fn manifest_filename(&self) -> &'static str {
        match self {
            Ecosystem::NpmAndYarn => "package.json",
            Ecosystem::Puppet => "Puppetfile",
        }
    }

    /// Returns the lock filenames for this ecosystem
    pub fn lock_filenames(&self) -> &'static [&'static str] {
        match self {
            Ecosystem::NpmAndYarn => &["package-lock.json", "npm-shrinkwrap.json", "yarn.lock"],
            Ecosystem::Puppet => &[],
        }
    }

    /// Returns the wire tag used for `package_manager`
    pub fn tag(&self) -> &'static str {
        match self {
            Ecosystem::NpmAndYarn => "npm_and_yarn",
            Ecosystem::Puppet => "puppet",
        }
    }

    /// Returns the display name for this ecosystem
    pub fn display_name(&self) -> &'static str {
        match self {
            Ecosystem::NpmAndYarn => "npm/yarn",
            Ecosystem::Puppet => "Puppet",
        }
    }

    /// Returns all supported ecosystems
    pub fn all() -> &'static [Ecosystem] {
        &[Ecosystem::NpmAndYarn, Ecosystem::Puppet]
    }
}

impl fmt::Display for Ecosystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl FromStr for Ecosystem {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "npm_and_yarn" | "npm" | "yarn" => Ok(Ecosystem::NpmAndYarn),
            "puppet" => Ok(Ecosystem::Puppet),
            other => Err(ConfigError::InvalidEcosystem {
                value: other.to_string(),
            }),
        }
    }
}
