//! Application error types using thiserror
//!
//! Error hierarchy:
//! - ParseError: Fatal problems with manifests and lockfiles
//! - PuppetfileError: Syntax errors in a Puppetfile
//! - FetchError: Issues reading project files
//! - RegistryError: Issues with package registry communication
//! - GitMetadataError: Issues listing tags of a git remote
//! - OracleError / DecisionError: Failures of the update decision procedure
//! - ConfigError: Issues with CLI configuration

use std::path::PathBuf;
use thiserror::Error;

use crate::domain::Ecosystem;

/// Application-level error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Manifest or lockfile parsing errors
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// File fetching errors
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// Package registry related errors
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Configuration related errors
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A background task panicked or was cancelled
    #[error("background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Fatal errors raised while parsing a file set
#[derive(Error, Debug)]
pub enum ParseError {
    /// The primary manifest is absent from the file set
    #[error("no {file}!")]
    MissingManifest { file: String },

    /// Invalid JSON in a manifest or lockfile
    #[error("failed to parse JSON in {file}: {message}")]
    Json { file: String, message: String },

    /// Structurally invalid lockfile
    #[error("failed to parse lockfile {file}: {message}")]
    Lockfile { file: String, message: String },

    /// Puppetfile syntax error
    #[error(transparent)]
    Puppetfile(#[from] PuppetfileError),
}

/// Errors raised by the Puppetfile reader
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PuppetfileError {
    #[error("{name}:{line}: syntax error: {message}")]
    Syntax {
        name: String,
        line: usize,
        message: String,
    },
}

/// Errors related to reading project files
#[derive(Error, Debug)]
pub enum FetchError {
    /// Directory not found
    #[error("directory not found: {path}")]
    DirectoryNotFound { path: PathBuf },

    /// Primary manifest missing from the directory
    #[error("{file} not found in {path}")]
    ManifestNotFound { path: PathBuf, file: String },

    /// Failed to read a file
    #[error("failed to read {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors related to package registry communication
#[derive(Error, Debug)]
pub enum RegistryError {
    /// Package not found in registry
    #[error("package '{package}' not found in {registry} registry")]
    PackageNotFound { package: String, registry: String },

    /// Network request failed
    #[error("failed to fetch package '{package}' from {registry}: {message}")]
    NetworkError {
        package: String,
        registry: String,
        message: String,
    },

    /// Rate limit exceeded
    #[error("rate limit exceeded for {registry} registry")]
    RateLimitExceeded { registry: String },

    /// Invalid response from registry
    #[error("invalid response from {registry} for '{package}': {message}")]
    InvalidResponse {
        package: String,
        registry: String,
        message: String,
    },

    /// Timeout
    #[error("timeout while fetching '{package}' from {registry}")]
    Timeout { package: String, registry: String },

    /// Authentication error
    #[error("authentication failed for {registry}: {message}")]
    AuthenticationError { registry: String, message: String },
}

/// Errors raised while listing remote git tags
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GitMetadataError {
    /// The remote could not be reached or refused access
    #[error("git remote {url} is unreachable: {message}")]
    Unreachable { url: String, message: String },

    /// The git executable could not be run
    #[error("failed to run git: {message}")]
    CommandFailed { message: String },
}

/// Errors raised by a capability oracle
#[derive(Error, Debug)]
pub enum OracleError {
    /// Registry lookup failed
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// The dependency cannot be evaluated by this oracle
    #[error("cannot evaluate '{package}': {message}")]
    Unsupported { package: String, message: String },
}

/// Errors raised by the update decision procedure
#[derive(Error, Debug)]
pub enum DecisionError {
    /// The oracle failed while answering a query
    #[error("capability check for '{package}' failed: {source}")]
    Oracle {
        package: String,
        #[source]
        source: OracleError,
    },

    /// No updated candidate carries the input dependency's name
    #[error("no updated dependency named '{package}' was returned")]
    MissingPrimary { package: String },

    /// More than one updated candidate carries the input dependency's name
    #[error("{count} updated dependencies named '{package}' were returned")]
    DuplicatePrimary { package: String, count: usize },
}

/// Errors related to configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Invalid duration format
    #[error("invalid duration format '{value}': expected format like '2w', '10d', '1m'")]
    InvalidDuration { value: String },

    /// Invalid ecosystem
    #[error("invalid ecosystem '{value}': expected 'npm_and_yarn' or 'puppet'")]
    InvalidEcosystem { value: String },

    /// Malformed credentials JSON
    #[error("invalid credentials: {message}")]
    InvalidCredentials { message: String },
}

impl ParseError {
    /// Creates a new MissingManifest error
    pub fn missing_manifest(file: impl Into<String>) -> Self {
        ParseError::MissingManifest { file: file.into() }
    }

    /// Creates a new Json error
    pub fn json(file: impl Into<String>, message: impl Into<String>) -> Self {
        ParseError::Json {
            file: file.into(),
            message: message.into(),
        }
    }

    /// Creates a new Lockfile error
    pub fn lockfile(file: impl Into<String>, message: impl Into<String>) -> Self {
        ParseError::Lockfile {
            file: file.into(),
            message: message.into(),
        }
    }
}

impl PuppetfileError {
    /// Creates a syntax error for the Puppetfile at `line`
    pub fn syntax(line: usize, message: impl Into<String>) -> Self {
        PuppetfileError::Syntax {
            name: "Puppetfile".to_string(),
            line,
            message: message.into(),
        }
    }

    /// Returns the line the error was reported on
    pub fn line(&self) -> usize {
        match self {
            PuppetfileError::Syntax { line, .. } => *line,
        }
    }
}

impl FetchError {
    /// Creates a new DirectoryNotFound error
    pub fn directory_not_found(path: impl Into<PathBuf>) -> Self {
        FetchError::DirectoryNotFound { path: path.into() }
    }

    /// Creates a new ManifestNotFound error
    pub fn manifest_not_found(path: impl Into<PathBuf>, file: impl Into<String>) -> Self {
        FetchError::ManifestNotFound {
            path: path.into(),
            file: file.into(),
        }
    }

    /// Creates a new ReadError
    pub fn read_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        FetchError::ReadError {
            path: path.into(),
            source,
        }
    }
}

impl RegistryError {
    /// Creates a new PackageNotFound error
    pub fn package_not_found(package: impl Into<String>, registry: impl Into<String>) -> Self {
        RegistryError::PackageNotFound {
            package: package.into(),
            registry: registry.into(),
        }
    }

    /// Creates a new NetworkError
    pub fn network_error(
        package: impl Into<String>,
        registry: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        RegistryError::NetworkError {
            package: package.into(),
            registry: registry.into(),
            message: message.into(),
        }
    }

    /// Creates a new RateLimitExceeded error
    pub fn rate_limit_exceeded(registry: impl Into<String>) -> Self {
        RegistryError::RateLimitExceeded {
            registry: registry.into(),
        }
    }

    /// Creates a new Timeout error
    pub fn timeout(package: impl Into<String>, registry: impl Into<String>) -> Self {
        RegistryError::Timeout {
            package: package.into(),
            registry: registry.into(),
        }
    }

    /// Returns the registry name for this ecosystem
    pub fn registry_name(ecosystem: Ecosystem) -> &'static str {
        match ecosystem {
            Ecosystem::NpmAndYarn => "npm",
            Ecosystem::Puppet => "Puppet Forge",
        }
    }
}

impl GitMetadataError {
    /// Creates a new Unreachable error
    pub fn unreachable(url: impl Into<String>, message: impl Into<String>) -> Self {
        GitMetadataError::Unreachable {
            url: url.into(),
            message: message.into(),
        }
    }
}

impl OracleError {
    /// Creates a new Unsupported error
    pub fn unsupported(package: impl Into<String>, message: impl Into<String>) -> Self {
        OracleError::Unsupported {
            package: package.into(),
            message: message.into(),
        }
    }
}

impl DecisionError {
    /// Wraps an oracle failure for `package`
    pub fn oracle(package: impl Into<String>, source: OracleError) -> Self {
        DecisionError::Oracle {
            package: package.into(),
            source,
        }
    }
}
