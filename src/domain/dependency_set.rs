//! Name-keyed dependency accumulator

use super::Dependency;

/// An insertion-ordered collection of dependencies keyed by name.
///
/// Inserting a dependency whose name is already present merges the two
/// entries instead of duplicating them. Consumers must not rely on the
/// iteration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencySet {
    dependencies: Vec<Dependency>,
}

impl DependencySet {
    /// Creates an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a dependency, merging with an existing entry of the same name
    pub fn insert(&mut self, dependency: Dependency) {
        match self
            .dependencies
            .iter_mut()
            .find(|existing| existing.name == dependency.name)
        {
            Some(existing) => *existing = combine(existing, dependency),
            None => self.dependencies.push(dependency),
        }
    }

    /// Folds another set into this one
    pub fn merge(mut self, other: DependencySet) -> Self {
        self.extend(other);
        self
    }

    /// Looks up a dependency by name
    pub fn get(&self, name: &str) -> Option<&Dependency> {
        self.dependencies.iter().find(|d| d.name == name)
    }

    /// Number of distinct dependency names
    pub fn len(&self) -> usize {
        self.dependencies.len()
    }

    /// Returns true if the set is empty
    pub fn is_empty(&self) -> bool {
        self.dependencies.is_empty()
    }

    /// Iterates over the dependencies
    pub fn iter(&self) -> std::slice::Iter<'_, Dependency> {
        self.dependencies.iter()
    }

    /// Keeps only the dependencies matching the predicate
    pub fn retain(&mut self, predicate: impl FnMut(&Dependency) -> bool) {
        self.dependencies.retain(predicate);
    }

    /// Consumes the set, returning the dependencies
    pub fn into_vec(self) -> Vec<Dependency> {
        self.dependencies
    }
}

/// Merges two same-named dependencies: requirements are unioned and the
/// version of the top-level side wins.
fn combine(existing: &Dependency, incoming: Dependency) -> Dependency {
    let version = if existing.is_top_level() {
        existing.version.clone()
    } else if incoming.is_top_level() {
        incoming.version.clone()
    } else {
        existing.version.clone().or_else(|| incoming.version.clone())
    };

    let mut requirements = existing.requirements.clone();
    for requirement in incoming.requirements {
        if !requirements.contains(&requirement) {
            requirements.push(requirement);
        }
    }

    Dependency {
        name: existing.name.clone(),
        version,
        package_manager: existing.package_manager,
        requirements,
        previous_version: existing.previous_version.clone(),
        previous_requirements: existing.previous_requirements.clone(),
    }
}

impl Extend<Dependency> for DependencySet {
    fn extend<I: IntoIterator<Item = Dependency>>(&mut self, iter: I) {
        for dependency in iter {
            self.insert(dependency);
        }
    }
}

impl FromIterator<Dependency> for DependencySet {
    fn from_iter<I: IntoIterator<Item = Dependency>>(iter: I) -> Self {
        let mut set = DependencySet::new();
        set.extend(iter);
        set
    }
}

impl IntoIterator for DependencySet {
    type Item = Dependency;
    type IntoIter = std::vec::IntoIter<Dependency>;

    fn into_iter(self) -> Self::IntoIter {
        self.dependencies.into_iter()
    }
}

impl<'a> IntoIterator for &'a DependencySet {
    type Item = &'a Dependency;
    type IntoIter = std::slice::Iter<'a, Dependency>;

    fn into_iter(self) -> Self::IntoIter {
        self.dependencies.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Ecosystem, Requirement};

    fn requirement(req: &str, file: &str) -> Requirement {
        Requirement::new(Some(req.to_string()), file, "dependencies", None)
    }

    fn declared(name: &str, version: Option<&str>, reqs: Vec<Requirement>) -> Dependency {
        Dependency::new(name, version.map(str::to_string), Ecosystem::NpmAndYarn, reqs)
    }

    #[test]
    fn test_insert_distinct_names() {
        let mut set = DependencySet::new();
        set.insert(declared("a", Some("1.0.0"), vec![requirement("^1.0.0", "package.json")]));
        set.insert(declared("b", Some("2.0.0"), vec![requirement("^2.0.0", "package.json")]));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_insert_same_name_unions_requirements() {
        let mut set = DependencySet::new();
        set.insert(declared("a", Some("1.0.0"), vec![requirement("^1.0.0", "package.json")]));
        set.insert(declared(
            "a",
            Some("1.0.0"),
            vec![requirement("^1.0.0", "packages/x/package.json")],
        ));
        set.insert(declared("a", Some("1.0.0"), vec![requirement("^1.0.0", "package.json")]));

        assert_eq!(set.len(), 1);
        assert_eq!(set.get("a").unwrap().requirements.len(), 2);
    }

    #[test]
    fn test_top_level_version_wins_over_lockfile() {
        let mut set = DependencySet::new();
        set.insert(Dependency::locked("a", "1.0.0", Ecosystem::NpmAndYarn));
        set.insert(declared("a", Some("1.2.3"), vec![requirement("^1.0.0", "package.json")]));

        let dep = set.get("a").unwrap();
        assert_eq!(dep.version.as_deref(), Some("1.2.3"));
        assert_eq!(dep.requirements.len(), 1);
    }

    #[test]
    fn test_declared_unresolved_version_is_kept() {
        let mut set = DependencySet::new();
        set.insert(declared("a", None, vec![requirement("^1.0.0", "package.json")]));
        set.insert(Dependency::locked("a", "1.0.0", Ecosystem::NpmAndYarn));
        assert_eq!(set.get("a").unwrap().version, None);
    }

    #[test]
    fn test_lockfile_only_first_version_wins() {
        let set: DependencySet = vec![
            Dependency::locked("ms", "2.1.2", Ecosystem::NpmAndYarn),
            Dependency::locked("ms", "2.0.0", Ecosystem::NpmAndYarn),
        ]
        .into_iter()
        .collect();
        assert_eq!(set.len(), 1);
        assert_eq!(set.get("ms").unwrap().version.as_deref(), Some("2.1.2"));
    }

    #[test]
    fn test_merge_sets() {
        let left: DependencySet =
            std::iter::once(declared("a", Some("1.0.0"), vec![requirement("^1.0.0", "package.json")]))
                .collect();
        let right: DependencySet = vec![
            Dependency::locked("a", "1.0.0", Ecosystem::NpmAndYarn),
            Dependency::locked("b", "3.0.0", Ecosystem::NpmAndYarn),
        ]
        .into_iter()
        .collect();

        let merged = left.merge(right);
        assert_eq!(merged.len(), 2);
        assert!(merged.get("a").unwrap().is_top_level());
        assert!(!merged.get("b").unwrap().is_top_level());
    }

    #[test]
    fn test_retain() {
        let mut set: DependencySet = vec![
            Dependency::locked("a", "1.0.0", Ecosystem::NpmAndYarn),
            Dependency::locked("b", "1.0.0", Ecosystem::NpmAndYarn),
        ]
        .into_iter()
        .collect();
        set.retain(|d| d.name != "a");
        assert_eq!(set.len(), 1);
        assert!(set.get("a").is_none());
    }
}
