//! package.json parser for npm and yarn projects
//!
//! Handles:
//! - dependencies
//! - devDependencies
//! - optionalDependencies
//!
//! Versions and origins are cross-referenced with package-lock.json,
//! npm-shrinkwrap.json and yarn.lock.

use crate::domain::{
    find_file, Credentials, Dependency, DependencyFile, DependencySet, Ecosystem, Requirement,
};
use crate::error::ParseError;
use crate::manifest::lockfile::LockfileParser;
use crate::manifest::FileParser;
use crate::resolver::{GitMetadataFetcher, VersionResolver};
use crate::source;
use serde_json::Value;
use std::sync::Arc;

/// Dependency groups read from each manifest
pub const DEPENDENCY_TYPES: &[&str] = &["dependencies", "devDependencies", "optionalDependencies"];

const MANIFEST: &str = "package.json";

/// Parser for npm and yarn file sets
pub struct NpmAndYarnParser {
    credentials: Credentials,
    git: Arc<dyn GitMetadataFetcher>,
}

struct Manifest<'a> {
    file: &'a DependencyFile,
    json: Value,
}

impl NpmAndYarnParser {
    pub fn new(credentials: Credentials, git: Arc<dyn GitMetadataFetcher>) -> Self {
        Self { credentials, git }
    }

    /// Root package.json first, then every other non-support package.json
    fn package_files<'a>(
        &self,
        files: &'a [DependencyFile],
    ) -> Result<Vec<Manifest<'a>>, ParseError> {
        let root = find_file(files, MANIFEST).ok_or_else(|| ParseError::missing_manifest(MANIFEST))?;
        let nested = files
            .iter()
            .filter(|f| f.name().ends_with(MANIFEST) && f.name() != MANIFEST)
            .filter(|f| !f.is_support_file());

        std::iter::once(root)
            .chain(nested)
            .map(|file| {
                let json = serde_json::from_str(file.content())
                    .map_err(|e| ParseError::json(file.name(), e.to_string()))?;
                Ok(Manifest { file, json })
            })
            .collect()
    }

    fn manifest_dependencies(
        &self,
        manifests: &[Manifest<'_>],
        lockfiles: &LockfileParser,
    ) -> DependencySet {
        let resolver = VersionResolver::new(lockfiles, self.git.as_ref(), &self.credentials);
        let workspace_names: Vec<&str> = manifests
            .iter()
            .filter_map(|m| m.json.get("name").and_then(Value::as_str))
            .collect();

        let mut set = DependencySet::new();
        for manifest in manifests {
            if is_truthy(manifest.json.get("flat")) {
                tracing::debug!("Skipping flat manifest {}", manifest.file.name());
                continue;
            }

            for group in DEPENDENCY_TYPES {
                let Some(deps) = manifest.json.get(*group).and_then(Value::as_object) else {
                    continue;
                };
                for (name, requirement) in deps {
                    let Some(requirement) = requirement.as_str() else {
                        continue;
                    };
                    let requirement = if requirement.is_empty() { "*" } else { requirement };

                    if let Some(dep) = self.build_dependency(
                        manifest.file.name(),
                        group,
                        name,
                        requirement,
                        lockfiles,
                        &resolver,
                        &workspace_names,
                    ) {
                        set.insert(dep);
                    }
                }
            }
        }
        set
    }

    #[allow(clippy::too_many_arguments)]
    fn build_dependency(
        &self,
        file: &str,
        group: &str,
        name: &str,
        requirement: &str,
        lockfiles: &LockfileParser,
        resolver: &VersionResolver<'_>,
        workspace_names: &[&str],
    ) -> Option<Dependency> {
        if source::should_ignore(requirement) {
            tracing::debug!("Skipping {}@{}: unsupported requirement", name, requirement);
            return None;
        }
        if workspace_names.contains(&name) {
            tracing::debug!("Skipping {}: workspace package", name);
            return None;
        }

        let details = lockfiles.lockfile_details(name, requirement, file);
        let version = resolver.resolve_version(name, requirement, file);
        if details.is_some() && version.is_none() {
            tracing::debug!("Skipping {}: no version resolved from lockfile", name);
            return None;
        }

        let resolved = details.as_ref().and_then(|d| d.resolved.as_deref());
        let source = source::classify(name, requirement, resolved, &self.credentials);

        Some(Dependency::new(
            name,
            version,
            Ecosystem::NpmAndYarn,
            vec![Requirement::new(
                source::requirement_for(requirement),
                file,
                group,
                source,
            )],
        ))
    }
}

impl FileParser for NpmAndYarnParser {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::NpmAndYarn
    }

    fn parse(&self, files: &[DependencyFile]) -> Result<DependencySet, ParseError> {
        let manifests = self.package_files(files)?;
        let lockfiles = LockfileParser::new(files)?;

        let mut set = self
            .manifest_dependencies(&manifests, &lockfiles)
            .merge(lockfiles.dependencies());

        set.retain(|dep| !has_mixed_origin(dep));
        Ok(set)
    }
}

/// Git requirements from more than one source, or git next to a non-git
/// requirement
fn has_mixed_origin(dep: &Dependency) -> bool {
    let git_sources: Vec<_> = dep
        .requirements
        .iter()
        .filter(|r| r.is_git())
        .filter_map(|r| r.source.as_ref())
        .collect();
    if git_sources.is_empty() {
        return false;
    }

    let distinct = git_sources.iter().any(|s| *s != git_sources[0]);
    let mixed = distinct || dep.requirements.iter().any(|r| !r.is_git());
    if mixed {
        tracing::debug!("Skipping {}: mixed-origin requirements", dep.name);
    }
    mixed
}

fn is_truthy(value: Option<&Value>) -> bool {
    !matches!(value, None | Some(Value::Null) | Some(Value::Bool(false)))
}
