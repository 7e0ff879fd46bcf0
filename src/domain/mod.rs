//! Core domain models for deplift
//!
//! This module contains the fundamental types used throughout the application:
//! - Ecosystem types for supported package managers
//! - The canonical dependency model (dependencies, requirements, sources)
//! - Fetched dependency files and credentials
//! - Version specification types for rewriting requirements
//! - Update decision results and run summaries

mod credential;
mod dependency;
mod dependency_file;
mod dependency_set;
mod ecosystem;
mod source;
mod summary;
mod update_result;
mod version_spec;

pub use credential::{Credential, Credentials, GIT_SOURCE, NPM_REGISTRY};
pub use dependency::{Dependency, Requirement};
pub use dependency_file::{find_file, DependencyFile, FileKind};
pub use dependency_set::DependencySet;
pub use ecosystem::Ecosystem;
pub use source::Source;
pub use summary::UpdateSummary;
pub use update_result::{RequirementsToUnlock, SkipReason, UpdateResult};
pub use version_spec::{VersionSpec, VersionSpecKind};
