//! Dependency and requirement structures

use super::{Ecosystem, Source};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// A single declared constraint on a dependency, tied to the file that declared it
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Requirement {
    /// Raw constraint in ecosystem syntax (None for a git dependency pinned by ref)
    pub requirement: Option<String>,
    /// Name of the declaring file
    pub file: String,
    /// Dependency-type tags (membership only)
    pub groups: BTreeSet<String>,
    /// Classified origin
    pub source: Option<Source>,
}

impl Requirement {
    /// Creates a new requirement with a single group
    pub fn new(
        requirement: Option<String>,
        file: impl Into<String>,
        group: impl Into<String>,
        source: Option<Source>,
    ) -> Self {
        Self {
            requirement,
            file: file.into(),
            groups: BTreeSet::from([group.into()]),
            source,
        }
    }

    /// Returns true if the source is a version-control reference
    pub fn is_git(&self) -> bool {
        self.source.as_ref().is_some_and(Source::is_git)
    }
}

/// Represents a package dependency
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    /// Package name
    pub name: String,
    /// Resolved version, absent when it could not be determined
    pub version: Option<String>,
    /// Ecosystem this dependency belongs to
    pub package_manager: Ecosystem,
    /// Declared requirements (empty for lockfile-only dependencies)
    pub requirements: Vec<Requirement>,
    /// Version before an update was applied
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_version: Option<String>,
    /// Requirements before an update was applied
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_requirements: Option<Vec<Requirement>>,
}

impl Dependency {
    /// Creates a new dependency
    pub fn new(
        name: impl Into<String>,
        version: Option<String>,
        package_manager: Ecosystem,
        requirements: Vec<Requirement>,
    ) -> Self {
        Self {
            name: name.into(),
            version,
            package_manager,
            requirements,
            previous_version: None,
            previous_requirements: None,
        }
    }

    /// Creates a lockfile-only dependency with no requirements
    pub fn locked(name: impl Into<String>, version: impl Into<String>, package_manager: Ecosystem) -> Self {
        Self::new(name, Some(version.into()), package_manager, Vec::new())
    }

    /// Records the pre-update state (builder pattern)
    pub fn with_previous(mut self, version: Option<String>, requirements: Vec<Requirement>) -> Self {
        self.previous_version = version;
        self.previous_requirements = Some(requirements);
        self
    }

    /// Returns true if this dependency is declared in a manifest
    pub fn is_top_level(&self) -> bool {
        !self.requirements.is_empty()
    }

    /// Returns the version or an empty string
    pub fn version_str(&self) -> &str {
        self.version.as_deref().unwrap_or("")
    }

    /// Returns true if version and requirements equal `other`'s
    pub fn same_state_as(&self, other: &Dependency) -> bool {
        self.version == other.version && self.requirements == other.requirements
    }

    /// Returns true if the recorded previous state equals the current one.
    ///
    /// Returns None when no previous state was recorded.
    pub fn is_unchanged(&self) -> Option<bool> {
        let previous = self.previous_requirements.as_ref()?;
        Some(self.version == self.previous_version && &self.requirements == previous)
    }

    /// Returns true if any requirement points at a version-control source
    pub fn has_git_requirement(&self) -> bool {
        self.requirements.iter().any(Requirement::is_git)
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version {
            Some(version) => write!(f, "{}@{} [{}]", self.name, version, self.package_manager),
            None => write!(f, "{} [{}]", self.name, self.package_manager),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caret_requirement() -> Requirement {
        Requirement::new(
            Some("^1.0.0".to_string()),
            "package.json",
            "dependencies",
            None,
        )
    }

    #[test]
    fn test_dependency_new() {
        let dep = Dependency::new(
            "lodash",
            Some("1.2.3".to_string()),
            Ecosystem::NpmAndYarn,
            vec![caret_requirement()],
        );
        assert_eq!(dep.name, "lodash");
        assert_eq!(dep.version_str(), "1.2.3");
        assert!(dep.is_top_level());
        assert!(!dep.has_git_requirement());
    }

    #[test]
    fn test_locked_dependency_is_not_top_level() {
        let dep = Dependency::locked("ms", "2.1.2", Ecosystem::NpmAndYarn);
        assert!(!dep.is_top_level());
        assert_eq!(dep.version.as_deref(), Some("2.1.2"));
    }

    #[test]
    fn test_groups_compare_as_set() {
        let mut a = caret_requirement();
        a.groups.insert("devDependencies".to_string());
        let mut b = Requirement::new(
            Some("^1.0.0".to_string()),
            "package.json",
            "devDependencies",
            None,
        );
        b.groups.insert("dependencies".to_string());
        assert_eq!(a, b);
    }

    #[test]
    fn test_is_unchanged() {
        let dep = Dependency::new(
            "lodash",
            Some("1.2.3".to_string()),
            Ecosystem::NpmAndYarn,
            vec![caret_requirement()],
        );
        assert_eq!(dep.is_unchanged(), None);

        let same = dep
            .clone()
            .with_previous(Some("1.2.3".to_string()), vec![caret_requirement()]);
        assert_eq!(same.is_unchanged(), Some(true));

        let bumped = dep.with_previous(Some("1.0.0".to_string()), vec![caret_requirement()]);
        assert_eq!(bumped.is_unchanged(), Some(false));
    }

    #[test]
    fn test_git_requirement() {
        let req = Requirement::new(
            None,
            "package.json",
            "dependencies",
            Some(Source::git("https://github.com/a/b", "master")),
        );
        assert!(req.is_git());
        let dep = Dependency::new("b", None, Ecosystem::NpmAndYarn, vec![req]);
        assert!(dep.has_git_requirement());
    }

    #[test]
    fn test_wire_shape() {
        let dep = Dependency::new(
            "lodash",
            Some("1.2.3".to_string()),
            Ecosystem::NpmAndYarn,
            vec![caret_requirement()],
        );
        let json = serde_json::to_value(&dep).unwrap();
        assert_eq!(json["name"], "lodash");
        assert_eq!(json["version"], "1.2.3");
        assert_eq!(json["package_manager"], "npm_and_yarn");
        assert_eq!(json["requirements"][0]["requirement"], "^1.0.0");
        assert_eq!(json["requirements"][0]["file"], "package.json");
        assert_eq!(json["requirements"][0]["groups"][0], "dependencies");
        assert!(json["requirements"][0]["source"].is_null());
        assert!(json.get("previous_version").is_none());
    }

    #[test]
    fn test_display() {
        let dep = Dependency::locked("ms", "2.1.2", Ecosystem::NpmAndYarn);
        assert_eq!(dep.to_string(), "ms@2.1.2 [npm/yarn]");
        let unresolved = Dependency::new("x", None, Ecosystem::Puppet, Vec::new());
        assert_eq!(unresolved.to_string(), "x [Puppet]");
    }
}
