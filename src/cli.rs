//! CLI argument parsing module for deplift

use crate::domain::{Credential, Credentials, Ecosystem};
use crate::error::ConfigError;
use crate::manifest::parse_duration;
use crate::update::{UpdateFilter, DEFAULT_CONCURRENCY};
use clap::{ArgAction, Parser};
use std::path::PathBuf;
use std::time::Duration;

/// Environment variable holding a GitHub token used for git tag lookups
pub const GITHUB_TOKEN_ENV: &str = "LOCAL_GITHUB_ACCESS_TOKEN";

fn parse_age(s: &str) -> Result<Duration, String> {
    parse_duration(s).ok_or_else(|| {
        ConfigError::InvalidDuration {
            value: s.to_string(),
        }
        .to_string()
    })
}

/// Dependency extraction and update-decision engine
#[derive(Parser, Debug, Clone)]
#[command(
    name = "deplift",
    version,
    about = "Dependency extraction and update-decision engine for npm/yarn and Puppetfile projects"
)]
pub struct CliArgs {
    /// Package manager of the project (npm_and_yarn, puppet)
    pub ecosystem: Ecosystem,

    /// Project root (default: current directory)
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Dependency file directory, relative to the project root
    #[arg(long = "dir", default_value = "/")]
    pub directory: String,

    /// Evaluate only this dependency (transitive ones included)
    #[arg(long = "dep")]
    pub dependency: Option<String>,

    // Package filters
    /// Exclude specific packages (can be specified multiple times)
    #[arg(long, action = ArgAction::Append)]
    pub exclude: Vec<String>,

    /// Evaluate only specific packages (can be specified multiple times)
    #[arg(long, action = ArgAction::Append)]
    pub only: Vec<String>,

    /// Registry and git credentials as a JSON array
    #[arg(long, env = "DEPLIFT_CREDENTIALS", hide_env_values = true)]
    pub credentials: Option<String>,

    // Age filter
    /// Only consider versions released at least this long ago (e.g., 2w, 10d, 1m)
    #[arg(long, value_parser = parse_age)]
    pub age: Option<Duration>,

    /// Maximum number of dependencies evaluated at once
    #[arg(long, default_value_t = DEFAULT_CONCURRENCY)]
    pub concurrency: usize,

    /// Only parse dependency files; skip update decisions
    #[arg(long)]
    pub parse_only: bool,

    // Output options
    /// Output results in JSON format
    #[arg(long)]
    pub json: bool,

    /// Enable verbose output (debug logging)
    #[arg(short, long)]
    pub verbose: bool,

    /// Enable quiet mode - minimal output
    #[arg(short, long)]
    pub quiet: bool,
}

impl CliArgs {
    /// Builds the package filter from `--exclude`, `--only` and `--age`
    pub fn build_filter(&self) -> UpdateFilter {
        let filter = UpdateFilter::new()
            .with_exclude(self.exclude.clone())
            .with_only(self.only.clone());
        match self.age {
            Some(age) => filter.with_min_age(age),
            None => filter,
        }
    }

    /// Credentials from `--credentials`, plus a `git_source` credential for
    /// github.com when `LOCAL_GITHUB_ACCESS_TOKEN` is set
    pub fn credentials(&self) -> Result<Credentials, ConfigError> {
        let mut credentials = match self.credentials.as_deref() {
            Some(json) => Credentials::from_json(json).map_err(|e| {
                ConfigError::InvalidCredentials {
                    message: e.to_string(),
                }
            })?,
            None => Credentials::default(),
        };

        if let Ok(token) = std::env::var(GITHUB_TOKEN_ENV) {
            if !token.is_empty() {
                credentials.push(Credential::git_source(
                    "github.com",
                    "x-access-token",
                    token,
                ));
            }
        }
        Ok(credentials)
    }
}
