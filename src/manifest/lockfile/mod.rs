//! Lockfile lookup for npm and yarn projects
//!
//! Supports:
//! - `package-lock.json` / `npm-shrinkwrap.json` (lockfileVersion 1-3)
//! - `yarn.lock`

mod package_lock;
mod yarn_lock;

pub use package_lock::PackageLock;
pub use yarn_lock::{YarnEntry, YarnLock};

use crate::domain::{Dependency, DependencyFile, DependencySet, Ecosystem};
use crate::error::ParseError;
use std::path::Path;

const PACKAGE_LOCK: &str = "package-lock.json";
const SHRINKWRAP: &str = "npm-shrinkwrap.json";
const YARN_LOCK: &str = "yarn.lock";

/// What a lockfile records about one dependency
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LockfileDetails {
    pub version: Option<String>,
    pub resolved: Option<String>,
}

#[derive(Debug, Clone)]
enum Lockfile {
    Npm(PackageLock),
    Yarn(YarnLock),
}

/// All lockfiles of a file set, parsed once
#[derive(Debug, Clone, Default)]
pub struct LockfileParser {
    lockfiles: Vec<(String, Lockfile)>,
}

impl LockfileParser {
    /// Parses every lockfile in `files`.
    ///
    /// Invalid JSON in an npm lockfile is fatal.
    pub fn new(files: &[DependencyFile]) -> Result<Self, ParseError> {
        let mut lockfiles = Vec::new();

        for file in files {
            let basename = Path::new(file.name())
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("");

            let lockfile = match basename {
                PACKAGE_LOCK | SHRINKWRAP => PackageLock::parse(file.content())
                    .map(Lockfile::Npm)
                    .map_err(|e| ParseError::json(file.name(), e.to_string()))?,
                YARN_LOCK => Lockfile::Yarn(YarnLock::parse(file.content())),
                _ => continue,
            };
            lockfiles.push((file.name().to_string(), lockfile));
        }

        Ok(Self { lockfiles })
    }

    /// Returns true if no lockfile was found
    pub fn is_empty(&self) -> bool {
        self.lockfiles.is_empty()
    }

    /// Looks up `name` in the lockfiles relevant to `manifest_name`.
    ///
    /// Lockfiles next to the manifest are tried before root lockfiles; the
    /// first lockfile that knows the dependency wins.
    pub fn lockfile_details(
        &self,
        name: &str,
        requirement: &str,
        manifest_name: &str,
    ) -> Option<LockfileDetails> {
        potential_lockfiles(manifest_name)
            .iter()
            .filter_map(|candidate| self.lockfiles.iter().find(|(n, _)| n == candidate))
            .find_map(|(_, lockfile)| match lockfile {
                Lockfile::Npm(lock) => lock.details(name),
                Lockfile::Yarn(lock) => lock.details(name, requirement),
            })
    }

    /// Every lockfile entry with a valid semantic version, as a dependency
    /// without requirements
    pub fn dependencies(&self) -> DependencySet {
        self.lockfiles
            .iter()
            .flat_map(|(_, lockfile)| match lockfile {
                Lockfile::Npm(lock) => lock.entries(),
                Lockfile::Yarn(lock) => lock
                    .entries
                    .iter()
                    .filter_map(|entry| Some((entry.name()?.to_string(), entry.version.clone()?)))
                    .collect(),
            })
            .filter(|(_, version)| semver::Version::parse(version).is_ok())
            .map(|(name, version)| Dependency::locked(name, version, Ecosystem::NpmAndYarn))
            .collect()
    }
}

/// Candidate lockfile names for a manifest, in lookup order
fn potential_lockfiles(manifest_name: &str) -> Vec<String> {
    let dir = Path::new(manifest_name)
        .parent()
        .and_then(|p| p.to_str())
        .unwrap_or("");
    let join = |file: &str| {
        if dir.is_empty() {
            file.to_string()
        } else {
            format!("{}/{}", dir, file)
        }
    };

    let mut names: Vec<String> = [PACKAGE_LOCK, SHRINKWRAP, YARN_LOCK]
        .into_iter()
        .map(join)
        .collect();
    for root in [YARN_LOCK, PACKAGE_LOCK, SHRINKWRAP] {
        if !names.iter().any(|n| n == root) {
            names.push(root.to_string());
        }
    }
    names
}
