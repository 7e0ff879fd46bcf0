//! Dependency selection for a run
//!
//! `--exclude` and `--only` decide which dependencies reach the decision
//! engine; `min_age` bounds which registry releases count as candidates.

use crate::domain::SkipReason;
use std::time::Duration;

/// Which dependencies are decided and which releases may be proposed
#[derive(Debug, Clone, Default)]
pub struct UpdateFilter {
    /// Dependencies recorded as skipped
    pub exclude: Vec<String>,
    /// If non-empty, every other dependency is skipped
    pub only: Vec<String>,
    /// Releases younger than this are ignored by the registry oracle
    pub min_age: Option<Duration>,
}

impl UpdateFilter {
    /// A filter that lets every dependency through
    pub fn new() -> Self {
        Self::default()
    }

    /// Set packages to exclude
    pub fn with_exclude(mut self, exclude: Vec<String>) -> Self {
        self.exclude = exclude;
        self
    }

    /// Set packages to include (only list)
    pub fn with_only(mut self, only: Vec<String>) -> Self {
        self.only = only;
        self
    }

    /// Set minimum age for versions
    pub fn with_min_age(mut self, age: Duration) -> Self {
        self.min_age = Some(age);
        self
    }

    /// Why `name` is skipped instead of decided, if it is.
    ///
    /// `--only` takes precedence over `--exclude`.
    pub fn skip_reason(&self, name: &str) -> Option<SkipReason> {
        if !self.only.is_empty() {
            return (!self.only.iter().any(|p| p == name)).then_some(SkipReason::NotInOnlyList);
        }
        self.exclude
            .iter()
            .any(|p| p == name)
            .then_some(SkipReason::Excluded)
    }
}
