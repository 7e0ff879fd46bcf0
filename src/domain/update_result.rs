//! Update decision result types

use super::Dependency;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How far requirements must be relaxed for a dependency to be updated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequirementsToUnlock {
    /// Only the resolved version changes
    None,
    /// The dependency's own requirements may be rewritten
    Own,
    /// Requirements of other dependencies may be rewritten too
    All,
    /// No scope permits an update
    UpdateNotPossible,
}

impl RequirementsToUnlock {
    /// Returns true unless no update is possible
    pub fn is_possible(&self) -> bool {
        !matches!(self, RequirementsToUnlock::UpdateNotPossible)
    }
}

impl fmt::Display for RequirementsToUnlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RequirementsToUnlock::None => "none",
            RequirementsToUnlock::Own => "own",
            RequirementsToUnlock::All => "all",
            RequirementsToUnlock::UpdateNotPossible => "update_not_possible",
        };
        write!(f, "{}", name)
    }
}

/// Reason why a dependency was not evaluated
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Package was excluded via --exclude flag
    Excluded,
    /// Package not in --only list
    NotInOnlyList,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Excluded => write!(f, "excluded by --exclude"),
            SkipReason::NotInOnlyList => write!(f, "not in --only list"),
        }
    }
}

/// Outcome of evaluating a single dependency
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UpdateResult {
    /// The decision procedure ran to completion
    Decided {
        dependency: Dependency,
        /// Chosen relaxation scope
        scope: RequirementsToUnlock,
        /// Changed dependencies, the evaluated one included; empty when no
        /// update is possible
        updated: Vec<Dependency>,
    },
    /// Dependency was filtered out before evaluation
    Skip {
        dependency: Dependency,
        reason: SkipReason,
    },
    /// The capability oracle failed for this dependency
    Failed {
        dependency: Dependency,
        message: String,
    },
}

impl UpdateResult {
    /// Creates a Decided result
    pub fn decided(
        dependency: Dependency,
        scope: RequirementsToUnlock,
        updated: Vec<Dependency>,
    ) -> Self {
        UpdateResult::Decided {
            dependency,
            scope,
            updated,
        }
    }

    /// Creates a Skip result
    pub fn skip(dependency: Dependency, reason: SkipReason) -> Self {
        UpdateResult::Skip { dependency, reason }
    }

    /// Creates a Failed result
    pub fn failed(dependency: Dependency, message: impl Into<String>) -> Self {
        UpdateResult::Failed {
            dependency,
            message: message.into(),
        }
    }

    /// Returns true if at least one dependency would change
    pub fn is_update(&self) -> bool {
        matches!(self, UpdateResult::Decided { updated, .. } if !updated.is_empty())
    }

    pub fn is_skip(&self) -> bool {
        matches!(self, UpdateResult::Skip { .. })
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, UpdateResult::Failed { .. })
    }

    /// Returns the evaluated dependency
    pub fn dependency(&self) -> &Dependency {
        match self {
            UpdateResult::Decided { dependency, .. } => dependency,
            UpdateResult::Skip { dependency, .. } => dependency,
            UpdateResult::Failed { dependency, .. } => dependency,
        }
    }

    /// Returns the updated form of the evaluated dependency, if any
    pub fn primary(&self) -> Option<&Dependency> {
        match self {
            UpdateResult::Decided {
                dependency,
                updated,
                ..
            } => updated.iter().find(|d| d.name == dependency.name),
            _ => None,
        }
    }

    /// Returns the package name
    pub fn package_name(&self) -> &str {
        &self.dependency().name
    }
}

impl fmt::Display for UpdateResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpdateResult::Decided { dependency, .. } => match self.primary() {
                Some(new) => write!(
                    f,
                    "{}: {} → {}",
                    dependency.name,
                    dependency.version_str(),
                    new.version_str()
                ),
                None => write!(f, "{}: no update possible", dependency.name),
            },
            UpdateResult::Skip { dependency, reason } => {
                write!(f, "{}: skipped ({})", dependency.name, reason)
            }
            UpdateResult::Failed {
                dependency,
                message,
            } => write!(f, "{}: failed ({})", dependency.name, message),
        }
    }
}
