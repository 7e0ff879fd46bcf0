//! Pipeline orchestrator for one extraction and decision run
//!
//! This module provides:
//! - Workflow coordination: fetch → parse → select → filter → decide
//! - Parsing off the async runtime (git tag lookups block)
//! - .npmrc registries, tokens and minimum release age
//! - Package filter application
//! - Per-dependency failures collected without aborting the run

use crate::cli::CliArgs;
use crate::domain::{
    Credentials, Dependency, DependencyFile, Ecosystem, UpdateResult, UpdateSummary,
};
use crate::error::AppError;
use crate::manifest::{get_parser, FileFetcher, LocalFileFetcher, NpmrcSettings, ParserContext};
use crate::progress::Progress;
use crate::registry::{create_adapter, HttpClient};
use crate::resolver::{GitCliMetadataFetcher, GitMetadataFetcher};
use crate::update::{CapabilityOracle, RegistryOracle, UpdateEngine, UpdateFilter};
use std::sync::Arc;

/// Orchestrator for coordinating one run
pub struct Orchestrator {
    /// CLI arguments for configuration
    args: CliArgs,
    /// Source of the dependency files
    fetcher: Box<dyn FileFetcher>,
    /// Tag lister for git dependencies
    git: Arc<dyn GitMetadataFetcher>,
    /// Capability oracle; built from the registry when not provided
    oracle: Option<Arc<dyn CapabilityOracle>>,
    /// HTTP client for registry requests
    client: HttpClient,
}

impl Orchestrator {
    /// Create a new orchestrator reading from the local checkout at `args.path`
    pub fn new(args: CliArgs) -> Result<Self, AppError> {
        let client = HttpClient::new()?;
        let fetcher = LocalFileFetcher::new(&args.path).with_directory(args.directory.clone());
        Ok(Self {
            args,
            fetcher: Box::new(fetcher),
            git: Arc::new(GitCliMetadataFetcher::new()),
            oracle: None,
            client,
        })
    }

    /// Replace the file fetcher (builder pattern)
    pub fn with_fetcher(mut self, fetcher: Box<dyn FileFetcher>) -> Self {
        self.fetcher = fetcher;
        self
    }

    /// Replace the git tag lister (builder pattern)
    pub fn with_git(mut self, git: Arc<dyn GitMetadataFetcher>) -> Self {
        self.git = git;
        self
    }

    /// Use a fixed capability oracle instead of the registry (builder pattern)
    pub fn with_oracle(mut self, oracle: Arc<dyn CapabilityOracle>) -> Self {
        self.oracle = Some(oracle);
        self
    }

    /// Run the workflow
    pub async fn run(&self) -> Result<UpdateSummary, AppError> {
        self.run_with_progress(!self.args.quiet && !self.args.json)
            .await
    }

    /// Run the workflow with optional progress display
    pub async fn run_with_progress(&self, show_progress: bool) -> Result<UpdateSummary, AppError> {
        let ecosystem = self.args.ecosystem;
        let mut progress = Progress::new(show_progress);
        let mut summary = UpdateSummary::new(&self.args.path, ecosystem);

        let mut credentials = self.args.credentials()?;

        // Step 1: Fetch dependency files
        progress.spinner("Reading dependency files...");
        let fetched = self.fetcher.fetch_files(ecosystem);
        progress.finish_and_clear();
        let files = fetched?;
        tracing::info!("Fetched {} dependency files", files.len());

        let npmrc = match ecosystem {
            Ecosystem::NpmAndYarn => NpmrcSettings::from_files(&files),
            Ecosystem::Puppet => NpmrcSettings::default(),
        };
        credentials.extend(npmrc.credentials.clone());

        // Step 2: Parse
        progress.spinner("Parsing dependency files...");
        let parsed = self.parse(ecosystem, files, credentials.clone()).await;
        progress.finish_and_clear();
        let dependencies = parsed?;
        tracing::info!("Parsed {} dependencies", dependencies.len());
        summary.dependencies = dependencies.clone();

        if self.args.parse_only {
            return Ok(summary);
        }

        // Step 3: Select and filter
        let filter = self.build_filter(&npmrc);
        let mut to_decide = Vec::new();
        for dependency in self.select(dependencies) {
            match filter.skip_reason(&dependency.name) {
                Some(reason) => summary.add_result(UpdateResult::skip(dependency, reason)),
                None => to_decide.push(dependency),
            }
        }

        // Step 4: Decide
        progress.spinner(&format!("Checking {} dependencies...", to_decide.len()));
        let oracle = self
            .oracle
            .clone()
            .unwrap_or_else(|| self.registry_oracle(ecosystem, npmrc, credentials, &filter));
        let engine = UpdateEngine::new(oracle).with_concurrency(self.args.concurrency);
        for result in engine.decide_all(to_decide).await {
            if let UpdateResult::Failed { message, .. } = &result {
                tracing::warn!("{}: {}", result.package_name(), message);
            }
            summary.add_result(result);
        }
        progress.finish_and_clear();

        summary.sort_results();
        Ok(summary)
    }

    /// Parses the file set on the blocking pool
    async fn parse(
        &self,
        ecosystem: Ecosystem,
        files: Vec<DependencyFile>,
        credentials: Credentials,
    ) -> Result<Vec<Dependency>, AppError> {
        let context = ParserContext::new(credentials, Arc::clone(&self.git));
        let parsed = tokio::task::spawn_blocking(move || {
            get_parser(ecosystem, context).parse(&files)
        })
        .await??;
        Ok(parsed.into_vec())
    }

    /// Top-level dependencies, or every dependency named by `--dep`
    fn select(&self, dependencies: Vec<Dependency>) -> Vec<Dependency> {
        match self.args.dependency.as_deref() {
            Some(name) => dependencies.into_iter().filter(|d| d.name == name).collect(),
            None => dependencies
                .into_iter()
                .filter(Dependency::is_top_level)
                .collect(),
        }
    }

    /// Build the update filter; `--age` overrides the .npmrc minimum release age
    fn build_filter(&self, npmrc: &NpmrcSettings) -> UpdateFilter {
        let filter = self.args.build_filter();
        match (filter.min_age, npmrc.minimum_release_age) {
            (None, Some(age)) => filter.with_min_age(age),
            _ => filter,
        }
    }

    fn registry_oracle(
        &self,
        ecosystem: Ecosystem,
        npmrc: NpmrcSettings,
        credentials: Credentials,
        filter: &UpdateFilter,
    ) -> Arc<dyn CapabilityOracle> {
        let adapter = create_adapter(ecosystem, self.client.clone(), npmrc, credentials);
        Arc::new(RegistryOracle::new(adapter).with_min_age(filter.min_age))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RequirementsToUnlock;
    use crate::error::{FetchError, GitMetadataError, OracleError};
    use crate::resolver::GitTag;
    use async_trait::async_trait;
    use clap::Parser;
    use std::time::Duration;

    struct StaticFetcher(Vec<DependencyFile>);

    impl FileFetcher for StaticFetcher {
        fn fetch_files(&self, _ecosystem: Ecosystem) -> Result<Vec<DependencyFile>, FetchError> {
            Ok(self.0.clone())
        }
    }

    struct NoTags;

    impl GitMetadataFetcher for NoTags {
        fn list_tags(
            &self,
            url: &str,
            _credentials: &Credentials,
        ) -> Result<Vec<GitTag>, GitMetadataError> {
            Err(GitMetadataError::unreachable(url, "offline"))
        }
    }

    /// Bumps `lodash` to 4.17.21 within its own requirements
    struct LodashOracle;

    #[async_trait]
    impl CapabilityOracle for LodashOracle {
        async fn can_update(
            &self,
            dependency: &Dependency,
            scope: RequirementsToUnlock,
        ) -> Result<bool, OracleError> {
            Ok(dependency.name == "lodash" && scope == RequirementsToUnlock::Own)
        }

        async fn updated_dependencies(
            &self,
            dependency: &Dependency,
            _scope: RequirementsToUnlock,
        ) -> Result<Vec<Dependency>, OracleError> {
            let mut updated = dependency.clone();
            updated.version = Some("4.17.21".to_string());
            for requirement in &mut updated.requirements {
                requirement.requirement = Some("^4.17.21".to_string());
            }
            Ok(vec![updated.with_previous(
                dependency.version.clone(),
                dependency.requirements.clone(),
            )])
        }
    }

    const PACKAGE_JSON: &str = r#"{
        "name": "app",
        "dependencies": {"lodash": "^4.17.0", "react": "^18.2.0"},
        "devDependencies": {"jest": "^29.0.0"}
    }"#;

    const PACKAGE_LOCK: &str = r#"{
        "name": "app",
        "lockfileVersion": 3,
        "packages": {
            "": {"name": "app"},
            "node_modules/lodash": {"version": "4.17.15", "resolved": "https://registry.npmjs.org/lodash/-/lodash-4.17.15.tgz"},
            "node_modules/react": {"version": "18.2.0", "resolved": "https://registry.npmjs.org/react/-/react-18.2.0.tgz"},
            "node_modules/jest": {"version": "29.7.0", "resolved": "https://registry.npmjs.org/jest/-/jest-29.7.0.tgz"},
            "node_modules/loose-envify": {"version": "1.4.0", "resolved": "https://registry.npmjs.org/loose-envify/-/loose-envify-1.4.0.tgz"}
        }
    }"#;

    fn orchestrator(args: &[&str]) -> Orchestrator {
        let mut argv = vec!["deplift", "npm_and_yarn", "/project"];
        argv.extend(args);
        Orchestrator::new(CliArgs::parse_from(argv))
            .unwrap()
            .with_fetcher(Box::new(StaticFetcher(vec![
                DependencyFile::new("package.json", PACKAGE_JSON),
                DependencyFile::new("package-lock.json", PACKAGE_LOCK),
            ])))
            .with_git(Arc::new(NoTags))
            .with_oracle(Arc::new(LodashOracle))
    }

    #[tokio::test]
    async fn test_run_decides_top_level_dependencies() {
        let summary = orchestrator(&[]).run_with_progress(false).await.unwrap();

        assert_eq!(summary.total_dependencies(), 4);
        let names: Vec<&str> = summary.results.iter().map(|r| r.package_name()).collect();
        assert_eq!(names, vec!["jest", "lodash", "react"]);
        assert_eq!(summary.total_updates(), 1);

        let lodash = summary.all_updates().next().unwrap();
        assert_eq!(lodash.primary().unwrap().version.as_deref(), Some("4.17.21"));
    }

    #[tokio::test]
    async fn test_run_parse_only() {
        let summary = orchestrator(&["--parse-only"])
            .run_with_progress(false)
            .await
            .unwrap();
        assert_eq!(summary.total_dependencies(), 4);
        assert!(summary.results.is_empty());
    }

    #[tokio::test]
    async fn test_run_with_dep_selects_transitive_dependency() {
        let summary = orchestrator(&["--dep", "loose-envify"])
            .run_with_progress(false)
            .await
            .unwrap();
        assert_eq!(summary.results.len(), 1);
        assert_eq!(summary.results[0].package_name(), "loose-envify");
        assert!(!summary.results[0].is_update());
    }

    #[tokio::test]
    async fn test_run_applies_package_filters() {
        let summary = orchestrator(&["--exclude", "lodash"])
            .run_with_progress(false)
            .await
            .unwrap();
        assert_eq!(summary.total_skips(), 1);
        assert_eq!(summary.total_updates(), 0);
    }

    #[tokio::test]
    async fn test_run_missing_manifest_is_fatal() {
        let err = orchestrator(&[])
            .with_fetcher(Box::new(StaticFetcher(Vec::new())))
            .run_with_progress(false)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "no package.json!");
    }

    #[test]
    fn test_build_filter_uses_npmrc_age() {
        let npmrc = NpmrcSettings::parse("minimum-release-age=10d\n");

        let filter = orchestrator(&[]).build_filter(&npmrc);
        assert_eq!(filter.min_age, Some(Duration::from_secs(10 * 86400)));

        let filter = orchestrator(&["--age", "2w"]).build_filter(&npmrc);
        assert_eq!(filter.min_age, Some(Duration::from_secs(14 * 86400)));
    }
}
