//! Capability oracle backed by a package registry
//!
//! The newest stable release (old enough for the minimum release age) is the
//! update target. Scopes map onto requirement rewrites:
//! - `None`: every requirement already admits the target
//! - `Own`: requirements that exclude it are rewritten, keeping their operator
//! - `All`: ranges and wildcards that exclude it are replaced as well
//!
//! Version-control dependencies are never updatable here.

use super::{compare_versions, satisfies, CapabilityOracle};
use crate::domain::{Dependency, Ecosystem, Requirement, RequirementsToUnlock};
use crate::error::OracleError;
use crate::parser::{get_parser, VersionParser};
use crate::registry::RegistryAdapter;
use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::Mutex;

/// Oracle answering from registry release data
pub struct RegistryOracle {
    adapter: Box<dyn RegistryAdapter>,
    parser: Box<dyn VersionParser>,
    min_age: Option<Duration>,
    now: DateTime<Utc>,
    /// Latest eligible version per package
    latest: Mutex<HashMap<String, Option<String>>>,
}

impl RegistryOracle {
    pub fn new(adapter: Box<dyn RegistryAdapter>) -> Self {
        let parser = get_parser(adapter.ecosystem());
        Self {
            adapter,
            parser,
            min_age: None,
            now: Utc::now(),
            latest: Mutex::new(HashMap::new()),
        }
    }

    /// Ignore releases younger than `min_age`
    pub fn with_min_age(mut self, min_age: Option<Duration>) -> Self {
        self.min_age = min_age;
        self
    }

    /// Use a fixed current time (for testing)
    pub fn with_time(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    /// Newest stable release old enough to be considered
    async fn latest_version(&self, package: &str) -> Result<Option<String>, OracleError> {
        if let Some(cached) = self.latest.lock().await.get(package) {
            return Ok(cached.clone());
        }

        let versions = self.adapter.fetch_versions(package).await?;
        let cutoff = self
            .min_age
            .and_then(|age| TimeDelta::from_std(age).ok())
            .and_then(|age| self.now.checked_sub_signed(age));

        let latest = versions
            .into_iter()
            .filter(|v| !v.is_prerelease())
            .filter(|v| cutoff.map_or(true, |cutoff| v.released_before(cutoff)))
            .max()
            .map(|v| v.version);
        tracing::debug!("{}: latest eligible version {:?}", package, latest);

        self.latest
            .lock()
            .await
            .insert(package.to_string(), latest.clone());
        Ok(latest)
    }

    /// The requirement that admits `latest`, or None when `scope` cannot produce one
    fn rewrite(
        &self,
        requirement: &Requirement,
        latest: &str,
        scope: RequirementsToUnlock,
    ) -> Option<Requirement> {
        let Some(current) = requirement.requirement.as_deref() else {
            return Some(requirement.clone());
        };
        if satisfies(current, latest) == Some(true) {
            return Some(requirement.clone());
        }

        let rewritten = match (self.parser.parse(current), scope) {
            (_, RequirementsToUnlock::None | RequirementsToUnlock::UpdateNotPossible) => {
                return None
            }
            (Some(spec), _) if spec.kind.is_rewritable() => spec.format_updated(latest),
            (_, RequirementsToUnlock::All) => self.replacement_requirement(latest),
            (_, RequirementsToUnlock::Own) => return None,
        };

        let mut requirement = requirement.clone();
        requirement.requirement = Some(rewritten);
        Some(requirement)
    }

    fn replacement_requirement(&self, latest: &str) -> String {
        match self.adapter.ecosystem() {
            Ecosystem::NpmAndYarn => format!("^{}", latest),
            Ecosystem::Puppet => latest.to_string(),
        }
    }

    /// The updated dependency within `scope`, if there is one
    async fn candidate(
        &self,
        dependency: &Dependency,
        scope: RequirementsToUnlock,
    ) -> Result<Option<Dependency>, OracleError> {
        if dependency.has_git_requirement() {
            return Ok(None);
        }
        let Some(latest) = self.latest_version(&dependency.name).await? else {
            return Ok(None);
        };

        let ordering = dependency
            .version
            .as_deref()
            .map(|current| compare_versions(&latest, current));
        // Never move backwards from a pre-release or yanked version
        if ordering == Some(Ordering::Less) {
            return Ok(None);
        }
        let newer = ordering == Some(Ordering::Greater);
        if scope == RequirementsToUnlock::None && !newer {
            return Ok(None);
        }

        let Some(requirements) = dependency
            .requirements
            .iter()
            .map(|r| self.rewrite(r, &latest, scope))
            .collect::<Option<Vec<_>>>()
        else {
            return Ok(None);
        };
        if !newer && requirements == dependency.requirements {
            return Ok(None);
        }

        let mut updated = dependency.clone();
        updated.version = Some(latest);
        updated.requirements = requirements;
        Ok(Some(updated.with_previous(
            dependency.version.clone(),
            dependency.requirements.clone(),
        )))
    }
}

#[async_trait]
impl CapabilityOracle for RegistryOracle {
    async fn can_update(
        &self,
        dependency: &Dependency,
        scope: RequirementsToUnlock,
    ) -> Result<bool, OracleError> {
        Ok(self.candidate(dependency, scope).await?.is_some())
    }

    async fn updated_dependencies(
        &self,
        dependency: &Dependency,
        scope: RequirementsToUnlock,
    ) -> Result<Vec<Dependency>, OracleError> {
        Ok(self.candidate(dependency, scope).await?.into_iter().collect())
    }
}
