//! Run summary types
//!
//! Collects the parsed dependencies and per-dependency decisions of one run.

use super::{Dependency, Ecosystem, UpdateResult};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Overall summary of one extraction and decision run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateSummary {
    /// Project directory
    pub path: PathBuf,
    /// Ecosystem of the project
    pub ecosystem: Ecosystem,
    /// Every dependency the parser extracted
    pub dependencies: Vec<Dependency>,
    /// Decisions, one per evaluated dependency (empty for parse-only runs)
    pub results: Vec<UpdateResult>,
}

impl UpdateSummary {
    /// Creates a new UpdateSummary
    pub fn new(path: impl Into<PathBuf>, ecosystem: Ecosystem) -> Self {
        Self {
            path: path.into(),
            ecosystem,
            dependencies: Vec::new(),
            results: Vec::new(),
        }
    }

    /// Adds a decision result
    pub fn add_result(&mut self, result: UpdateResult) {
        self.results.push(result);
    }

    /// Returns the number of dependencies with an update
    pub fn total_updates(&self) -> usize {
        self.results.iter().filter(|r| r.is_update()).count()
    }

    /// Returns the number of skipped dependencies
    pub fn total_skips(&self) -> usize {
        self.results.iter().filter(|r| r.is_skip()).count()
    }

    /// Returns the number of failed evaluations
    pub fn total_failures(&self) -> usize {
        self.results.iter().filter(|r| r.is_failure()).count()
    }

    /// Returns the number of extracted dependencies
    pub fn total_dependencies(&self) -> usize {
        self.dependencies.len()
    }

    /// Returns true if any evaluation failed
    pub fn has_failures(&self) -> bool {
        self.total_failures() > 0
    }

    /// Returns all results with an update
    pub fn all_updates(&self) -> impl Iterator<Item = &UpdateResult> {
        self.results.iter().filter(|r| r.is_update())
    }

    /// Sorts results by package name for stable output
    pub fn sort_results(&mut self) {
        self.results
            .sort_by(|a, b| a.package_name().cmp(b.package_name()));
    }
}
