//! Update decision logic for dependencies
//!
//! This module provides:
//! - Package and release-age filters applied before a decision
//! - Version info from registries with release dates
//! - npm-style requirement matching
//! - The escalation procedure that picks how far requirements must be
//!   relaxed for a dependency to move, backed by a capability oracle

mod filter;
mod registry_oracle;
mod requirement;
mod version_info;

pub use filter::UpdateFilter;
pub use registry_oracle::RegistryOracle;
pub use requirement::{satisfies, RequirementSet};
pub use version_info::{compare_versions, is_prerelease_version, VersionInfo};

use crate::domain::{Dependency, RequirementsToUnlock, UpdateResult};
use crate::error::{DecisionError, OracleError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::{self, JoinSet};

/// Default number of dependencies evaluated at once
pub const DEFAULT_CONCURRENCY: usize = 10;

/// Answers capability questions about a dependency.
///
/// Implementations may block on network access; the engine only calls one
/// method at a time per dependency.
#[async_trait]
pub trait CapabilityOracle: Send + Sync {
    /// Whether the dependency's requirements are already flexible or can be
    /// rewritten.
    ///
    /// Version-control requirements without a semver requirement cannot be
    /// rewritten.
    async fn requirements_unlocked_or_can_be(
        &self,
        dependency: &Dependency,
    ) -> Result<bool, OracleError> {
        Ok(!dependency
            .requirements
            .iter()
            .any(|r| r.is_git() && r.requirement.is_none()))
    }

    /// Whether the dependency can move when requirements are relaxed up to `scope`
    async fn can_update(
        &self,
        dependency: &Dependency,
        scope: RequirementsToUnlock,
    ) -> Result<bool, OracleError>;

    /// The dependencies that change when `dependency` is updated within `scope`
    async fn updated_dependencies(
        &self,
        dependency: &Dependency,
        scope: RequirementsToUnlock,
    ) -> Result<Vec<Dependency>, OracleError>;
}

/// The outcome of the escalation procedure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    pub scope: RequirementsToUnlock,
    /// Changed dependencies; empty when no update is possible
    pub updated: Vec<Dependency>,
}

impl Decision {
    fn not_possible() -> Self {
        Self {
            scope: RequirementsToUnlock::UpdateNotPossible,
            updated: Vec::new(),
        }
    }

    /// The updated form of `dependency`, if it changed
    pub fn primary<'a>(&'a self, dependency: &Dependency) -> Option<&'a Dependency> {
        self.updated.iter().find(|d| d.name == dependency.name)
    }
}

/// Decides, per dependency, the least relaxation that lets it move
#[derive(Clone)]
pub struct UpdateEngine {
    oracle: Arc<dyn CapabilityOracle>,
    concurrency: usize,
}

impl UpdateEngine {
    pub fn new(oracle: Arc<dyn CapabilityOracle>) -> Self {
        Self {
            oracle,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    /// Set the number of dependencies evaluated at once (at least one)
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Runs the escalation procedure for one dependency.
    ///
    /// Locked requirements only allow `None`; otherwise `Own` is tried before
    /// `All`. The first scope the oracle accepts wins, and no further scopes
    /// are queried.
    pub async fn decide(&self, dependency: &Dependency) -> Result<Decision, DecisionError> {
        let oracle_error = |source| DecisionError::oracle(&dependency.name, source);

        let unlockable = self
            .oracle
            .requirements_unlocked_or_can_be(dependency)
            .await
            .map_err(oracle_error)?;
        let scopes: &[RequirementsToUnlock] = if unlockable {
            &[RequirementsToUnlock::Own, RequirementsToUnlock::All]
        } else {
            &[RequirementsToUnlock::None]
        };

        for &scope in scopes {
            if !self
                .oracle
                .can_update(dependency, scope)
                .await
                .map_err(oracle_error)?
            {
                continue;
            }

            let candidates = self
                .oracle
                .updated_dependencies(dependency, scope)
                .await
                .map_err(oracle_error)?;
            let updated = drop_unchanged(dependency, candidates);
            check_primary(dependency, &updated)?;

            tracing::debug!(
                "{}: scope {} with {} changed dependencies",
                dependency.name,
                scope,
                updated.len()
            );
            return Ok(Decision { scope, updated });
        }

        tracing::debug!("{}: update not possible", dependency.name);
        Ok(Decision::not_possible())
    }

    /// Decides every dependency concurrently.
    ///
    /// Results come back in completion order. A failing dependency becomes
    /// a `Failed` result and does not affect the others, including when its
    /// decision task panics.
    pub async fn decide_all(&self, dependencies: Vec<Dependency>) -> Vec<UpdateResult> {
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks = JoinSet::new();
        let mut pending: HashMap<task::Id, Dependency> = HashMap::new();

        for dependency in dependencies {
            let engine = self.clone();
            let semaphore = Arc::clone(&semaphore);
            let owned = dependency.clone();
            let handle = tasks.spawn(async move {
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return UpdateResult::failed(owned, "decision engine stopped");
                };
                match engine.decide(&owned).await {
                    Ok(decision) => UpdateResult::decided(owned, decision.scope, decision.updated),
                    Err(e) => UpdateResult::failed(owned, e.to_string()),
                }
            });
            pending.insert(handle.id(), dependency);
        }

        let mut results = Vec::new();
        while let Some(joined) = tasks.join_next_with_id().await {
            match joined {
                Ok((id, result)) => {
                    pending.remove(&id);
                    results.push(result);
                }
                Err(e) => {
                    tracing::warn!("Decision task failed: {}", e);
                    if let Some(dependency) = pending.remove(&e.id()) {
                        results.push(UpdateResult::failed(dependency, e.to_string()));
                    }
                }
            }
        }
        results
    }
}

/// Removes candidates whose version and requirements did not change.
///
/// A candidate without a recorded previous state is compared against the
/// evaluated dependency when it carries the same name.
fn drop_unchanged(dependency: &Dependency, candidates: Vec<Dependency>) -> Vec<Dependency> {
    candidates
        .into_iter()
        .filter(|candidate| {
            let unchanged = match candidate.is_unchanged() {
                Some(unchanged) => unchanged,
                None => candidate.name == dependency.name && candidate.same_state_as(dependency),
            };
            if unchanged {
                tracing::debug!("Dropping unchanged candidate {}", candidate.name);
            }
            !unchanged
        })
        .collect()
}

fn check_primary(dependency: &Dependency, updated: &[Dependency]) -> Result<(), DecisionError> {
    if updated.is_empty() {
        return Ok(());
    }
    match updated.iter().filter(|d| d.name == dependency.name).count() {
        1 => Ok(()),
        0 => Err(DecisionError::MissingPrimary {
            package: dependency.name.clone(),
        }),
        count => Err(DecisionError::DuplicatePrimary {
            package: dependency.name.clone(),
            count,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Ecosystem, Requirement, Source};
    use std::collections::HashSet;
    use std::sync::Mutex;

    /// Scripted oracle that records every query
    #[derive(Default)]
    struct ScriptedOracle {
        locked: bool,
        updatable: HashSet<RequirementsToUnlock>,
        updated: Vec<Dependency>,
        fail: bool,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedOracle {
        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CapabilityOracle for ScriptedOracle {
        async fn requirements_unlocked_or_can_be(
            &self,
            _dependency: &Dependency,
        ) -> Result<bool, OracleError> {
            self.calls.lock().unwrap().push("unlockable".to_string());
            Ok(!self.locked)
        }

        async fn can_update(
            &self,
            dependency: &Dependency,
            scope: RequirementsToUnlock,
        ) -> Result<bool, OracleError> {
            self.calls.lock().unwrap().push(format!("can_update:{}", scope));
            if self.fail {
                return Err(OracleError::unsupported(&dependency.name, "scripted failure"));
            }
            Ok(self.updatable.contains(&scope))
        }

        async fn updated_dependencies(
            &self,
            _dependency: &Dependency,
            scope: RequirementsToUnlock,
        ) -> Result<Vec<Dependency>, OracleError> {
            self.calls.lock().unwrap().push(format!("updated:{}", scope));
            Ok(self.updated.clone())
        }
    }

    fn dependency(name: &str, version: &str) -> Dependency {
        Dependency::new(
            name,
            Some(version.to_string()),
            Ecosystem::NpmAndYarn,
            vec![Requirement::new(
                Some(format!("^{}", version)),
                "package.json",
                "dependencies",
                None,
            )],
        )
    }

    fn bumped(dep: &Dependency, version: &str) -> Dependency {
        let mut new = dependency(&dep.name, version);
        new.requirements[0].groups = dep.requirements[0].groups.clone();
        new.with_previous(dep.version.clone(), dep.requirements.clone())
    }

    fn engine(oracle: ScriptedOracle) -> (UpdateEngine, Arc<ScriptedOracle>) {
        let oracle = Arc::new(oracle);
        (UpdateEngine::new(oracle.clone()), oracle)
    }

    #[tokio::test]
    async fn test_own_scope_wins_without_querying_all() {
        let dep = dependency("lodash", "1.0.0");
        let (engine, oracle) = engine(ScriptedOracle {
            updatable: [RequirementsToUnlock::Own, RequirementsToUnlock::All].into(),
            updated: vec![bumped(&dep, "2.0.0")],
            ..Default::default()
        });

        let decision = engine.decide(&dep).await.unwrap();
        assert_eq!(decision.scope, RequirementsToUnlock::Own);
        assert_eq!(decision.primary(&dep).unwrap().version.as_deref(), Some("2.0.0"));
        assert_eq!(oracle.calls(), vec!["unlockable", "can_update:own", "updated:own"]);
    }

    #[tokio::test]
    async fn test_escalates_to_all() {
        let dep = dependency("lodash", "1.0.0");
        let (engine, oracle) = engine(ScriptedOracle {
            updatable: [RequirementsToUnlock::All].into(),
            updated: vec![bumped(&dep, "2.0.0")],
            ..Default::default()
        });

        let decision = engine.decide(&dep).await.unwrap();
        assert_eq!(decision.scope, RequirementsToUnlock::All);
        assert_eq!(
            oracle.calls(),
            vec!["unlockable", "can_update:own", "can_update:all", "updated:all"]
        );
    }

    #[tokio::test]
    async fn test_locked_requirements_only_try_none() {
        let dep = dependency("lodash", "1.0.0");
        let (engine, oracle) = engine(ScriptedOracle {
            locked: true,
            updatable: [RequirementsToUnlock::Own, RequirementsToUnlock::All].into(),
            ..Default::default()
        });

        let decision = engine.decide(&dep).await.unwrap();
        assert_eq!(decision.scope, RequirementsToUnlock::UpdateNotPossible);
        assert!(decision.updated.is_empty());
        assert_eq!(oracle.calls(), vec!["unlockable", "can_update:none"]);
    }

    #[tokio::test]
    async fn test_locked_requirements_with_none_update() {
        let dep = dependency("lodash", "1.0.0");
        let (engine, _) = engine(ScriptedOracle {
            locked: true,
            updatable: [RequirementsToUnlock::None].into(),
            updated: vec![bumped(&dep, "1.0.1")],
            ..Default::default()
        });

        let decision = engine.decide(&dep).await.unwrap();
        assert_eq!(decision.scope, RequirementsToUnlock::None);
        assert_eq!(decision.updated.len(), 1);
    }

    #[tokio::test]
    async fn test_nothing_updatable() {
        let dep = dependency("lodash", "1.0.0");
        let (engine, oracle) = engine(ScriptedOracle::default());

        let decision = engine.decide(&dep).await.unwrap();
        assert_eq!(decision.scope, RequirementsToUnlock::UpdateNotPossible);
        assert!(decision.updated.is_empty());
        assert!(!oracle.calls().iter().any(|c| c.starts_with("updated")));
    }

    #[tokio::test]
    async fn test_unchanged_candidates_are_dropped() {
        let dep = dependency("react", "18.0.0");
        let sibling = dependency("react-dom", "18.0.0");
        let unchanged_sibling = sibling
            .clone()
            .with_previous(sibling.version.clone(), sibling.requirements.clone());
        let (engine, _) = engine(ScriptedOracle {
            updatable: [RequirementsToUnlock::Own].into(),
            updated: vec![bumped(&dep, "19.0.0"), unchanged_sibling],
            ..Default::default()
        });

        let decision = engine.decide(&dep).await.unwrap();
        let names: Vec<&str> = decision.updated.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["react"]);
    }

    #[tokio::test]
    async fn test_identical_primary_is_dropped() {
        let dep = dependency("react", "18.0.0");
        let (engine, _) = engine(ScriptedOracle {
            updatable: [RequirementsToUnlock::Own].into(),
            updated: vec![dep.clone()],
            ..Default::default()
        });

        let decision = engine.decide(&dep).await.unwrap();
        assert_eq!(decision.scope, RequirementsToUnlock::Own);
        assert!(decision.updated.is_empty());
    }

    #[tokio::test]
    async fn test_missing_primary() {
        let dep = dependency("react", "18.0.0");
        let other = dependency("react-dom", "18.0.0");
        let (engine, _) = engine(ScriptedOracle {
            updatable: [RequirementsToUnlock::Own].into(),
            updated: vec![bumped(&other, "19.0.0")],
            ..Default::default()
        });

        let err = engine.decide(&dep).await.unwrap_err();
        assert!(matches!(err, DecisionError::MissingPrimary { ref package } if package == "react"));
    }

    #[tokio::test]
    async fn test_duplicate_primary() {
        let dep = dependency("react", "18.0.0");
        let (engine, _) = engine(ScriptedOracle {
            updatable: [RequirementsToUnlock::Own].into(),
            updated: vec![bumped(&dep, "19.0.0"), bumped(&dep, "19.1.0")],
            ..Default::default()
        });

        let err = engine.decide(&dep).await.unwrap_err();
        assert!(matches!(err, DecisionError::DuplicatePrimary { count: 2, .. }));
    }

    #[tokio::test]
    async fn test_oracle_error_is_wrapped() {
        let dep = dependency("react", "18.0.0");
        let (engine, _) = engine(ScriptedOracle {
            fail: true,
            ..Default::default()
        });

        let err = engine.decide(&dep).await.unwrap_err();
        assert!(matches!(err, DecisionError::Oracle { ref package, .. } if package == "react"));
    }

    #[tokio::test]
    async fn test_default_unlockable_rejects_bare_git_requirement() {
        struct DefaultOracle;
        #[async_trait]
        impl CapabilityOracle for DefaultOracle {
            async fn can_update(
                &self,
                _: &Dependency,
                _: RequirementsToUnlock,
            ) -> Result<bool, OracleError> {
                Ok(false)
            }
            async fn updated_dependencies(
                &self,
                _: &Dependency,
                _: RequirementsToUnlock,
            ) -> Result<Vec<Dependency>, OracleError> {
                Ok(Vec::new())
            }
        }

        let mut dep = dependency("x", "1.0.0");
        assert!(DefaultOracle.requirements_unlocked_or_can_be(&dep).await.unwrap());

        dep.requirements[0].source = Some(Source::git("https://github.com/a/x.git", "v1.0.0"));
        dep.requirements[0].requirement = None;
        assert!(!DefaultOracle.requirements_unlocked_or_can_be(&dep).await.unwrap());

        dep.requirements[0].requirement = Some("^1.0.0".to_string());
        assert!(DefaultOracle.requirements_unlocked_or_can_be(&dep).await.unwrap());
    }

    #[tokio::test]
    async fn test_decide_all_isolates_failures() {
        struct PerPackageOracle;
        #[async_trait]
        impl CapabilityOracle for PerPackageOracle {
            async fn can_update(
                &self,
                dependency: &Dependency,
                _: RequirementsToUnlock,
            ) -> Result<bool, OracleError> {
                if dependency.name == "broken" {
                    return Err(OracleError::unsupported("broken", "no registry"));
                }
                Ok(dependency.name == "lodash")
            }
            async fn updated_dependencies(
                &self,
                dependency: &Dependency,
                _: RequirementsToUnlock,
            ) -> Result<Vec<Dependency>, OracleError> {
                Ok(vec![bumped(dependency, "9.9.9")])
            }
        }

        let engine = UpdateEngine::new(Arc::new(PerPackageOracle)).with_concurrency(2);
        let mut results = engine
            .decide_all(vec![
                dependency("lodash", "1.0.0"),
                dependency("broken", "1.0.0"),
                dependency("react", "18.0.0"),
            ])
            .await;
        results.sort_by(|a, b| a.package_name().cmp(b.package_name()));

        assert_eq!(results.len(), 3);
        assert!(results[0].is_failure());
        assert_eq!(results[0].package_name(), "broken");
        assert!(results[1].is_update());
        assert_eq!(results[1].primary().unwrap().version.as_deref(), Some("9.9.9"));
        assert!(!results[2].is_update());
        assert!(!results[2].is_failure());
    }

    #[tokio::test]
    async fn test_decide_all_reports_panicked_task() {
        struct PanickingOracle;
        #[async_trait]
        impl CapabilityOracle for PanickingOracle {
            async fn can_update(
                &self,
                dependency: &Dependency,
                _: RequirementsToUnlock,
            ) -> Result<bool, OracleError> {
                if dependency.name == "boom" {
                    panic!("oracle crashed");
                }
                Ok(false)
            }
            async fn updated_dependencies(
                &self,
                _: &Dependency,
                _: RequirementsToUnlock,
            ) -> Result<Vec<Dependency>, OracleError> {
                Ok(Vec::new())
            }
        }

        let engine = UpdateEngine::new(Arc::new(PanickingOracle));
        let mut results = engine
            .decide_all(vec![dependency("boom", "1.0.0"), dependency("calm", "1.0.0")])
            .await;
        results.sort_by(|a, b| a.package_name().cmp(b.package_name()));

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].package_name(), "boom");
        assert!(results[0].is_failure());
        assert!(!results[1].is_failure());
    }

    #[test]
    fn test_with_concurrency_floor() {
        let engine = UpdateEngine::new(Arc::new(ScriptedOracle::default())).with_concurrency(0);
        assert_eq!(engine.concurrency, 1);
    }
}
