//! Classified dependency origins

use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a dependency comes from.
///
/// A `Source` is always derived from a requirement string and/or a
/// lockfile-resolved URL by the classifier; it is never edited by hand.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Source {
    /// Version-control reference
    Git {
        url: String,
        #[serde(rename = "ref")]
        reference: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        branch: Option<String>,
    },
    /// Well-known public registry
    Registry { url: String },
    /// Any other registry
    PrivateRegistry { url: String },
}

impl Source {
    /// Creates a git source with no branch
    pub fn git(url: impl Into<String>, reference: impl Into<String>) -> Self {
        Source::Git {
            url: url.into(),
            reference: reference.into(),
            branch: None,
        }
    }

    /// Creates a public registry source
    pub fn registry(url: impl Into<String>) -> Self {
        Source::Registry { url: url.into() }
    }

    /// Creates a private registry source
    pub fn private_registry(url: impl Into<String>) -> Self {
        Source::PrivateRegistry { url: url.into() }
    }

    /// Returns true for version-control sources
    pub fn is_git(&self) -> bool {
        matches!(self, Source::Git { .. })
    }

    /// Returns the source URL
    pub fn url(&self) -> &str {
        match self {
            Source::Git { url, .. } => url,
            Source::Registry { url } => url,
            Source::PrivateRegistry { url } => url,
        }
    }

    /// Returns the wire `type` tag
    pub fn kind(&self) -> &'static str {
        match self {
            Source::Git { .. } => "git",
            Source::Registry { .. } => "registry",
            Source::PrivateRegistry { .. } => "private_registry",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Git { url, reference, .. } => write!(f, "{}#{}", url, reference),
            Source::Registry { url } | Source::PrivateRegistry { url } => write!(f, "{}", url),
        }
    }
}
