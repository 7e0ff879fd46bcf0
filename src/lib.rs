//! deplift - Dependency extraction and update-decision library
//!
//! This library provides the core functionality for deciding whether a
//! dependency can be updated and which requirements must be relaxed:
//! - npm/yarn (package.json, package-lock.json, npm-shrinkwrap.json, yarn.lock)
//! - Puppet (Puppetfile)

pub mod cli;
pub mod domain;
pub mod error;
pub mod manifest;
pub mod orchestrator;
pub mod output;
pub mod parser;
pub mod progress;
pub mod registry;
pub mod resolver;
pub mod source;
pub mod update;
