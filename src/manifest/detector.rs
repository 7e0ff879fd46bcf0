//! Dependency file fetching with workspace support
//!
//! Features:
//! - Reads package.json, lockfiles and .npmrc for npm/yarn projects
//! - Follows npm/yarn `workspaces` to nested package.json files
//! - Reads Puppetfile for Puppet projects

use crate::domain::{DependencyFile, Ecosystem};
use crate::error::FetchError;
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Trait for fetching the dependency files of a project
pub trait FileFetcher: Send + Sync {
    /// Fetch every file relevant to the ecosystem
    fn fetch_files(&self, ecosystem: Ecosystem) -> Result<Vec<DependencyFile>, FetchError>;
}

/// Fetcher reading from a local checkout
#[derive(Debug, Clone)]
pub struct LocalFileFetcher {
    root: PathBuf,
    directory: String,
}

impl LocalFileFetcher {
    /// Create a fetcher for the repository at `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            directory: "/".to_string(),
        }
    }

    /// Fetch from a subdirectory of the repository (builder pattern)
    pub fn with_directory(mut self, directory: impl Into<String>) -> Self {
        self.directory = directory.into();
        self
    }

    fn base_dir(&self) -> PathBuf {
        self.root.join(self.directory.trim_start_matches('/'))
    }

    fn read(&self, name: &str) -> Result<Option<DependencyFile>, FetchError> {
        let path = self.base_dir().join(name);
        if !path.is_file() {
            return Ok(None);
        }
        let content =
            std::fs::read_to_string(&path).map_err(|e| FetchError::read_error(&path, e))?;
        let mut file = DependencyFile::new(name, content).with_directory(&self.directory);

        if let Ok(target) = std::fs::read_link(&path) {
            file = file.with_symlink_target(target.to_string_lossy());
        }
        Ok(Some(file))
    }

    fn read_required(&self, name: &str) -> Result<DependencyFile, FetchError> {
        self.read(name)?
            .ok_or_else(|| FetchError::manifest_not_found(self.base_dir(), name))
    }

    fn npm_and_yarn_files(&self) -> Result<Vec<DependencyFile>, FetchError> {
        let manifest = self.read_required("package.json")?;
        let workspaces = workspace_dirs(&self.base_dir(), manifest.content());
        let mut files = vec![manifest];

        for lockfile in Ecosystem::NpmAndYarn.lock_filenames() {
            files.extend(self.read(lockfile)?);
        }
        files.extend(self.read(".npmrc")?.map(DependencyFile::as_support_file));

        for dir in workspaces {
            files.extend(self.read(&format!("{}/package.json", dir))?);
            for lockfile in Ecosystem::NpmAndYarn.lock_filenames() {
                files.extend(self.read(&format!("{}/{}", dir, lockfile))?);
            }
        }

        Ok(files)
    }
}

impl FileFetcher for LocalFileFetcher {
    fn fetch_files(&self, ecosystem: Ecosystem) -> Result<Vec<DependencyFile>, FetchError> {
        let base = self.base_dir();
        if !base.is_dir() {
            return Err(FetchError::directory_not_found(base));
        }

        let files = match ecosystem {
            Ecosystem::NpmAndYarn => self.npm_and_yarn_files()?,
            Ecosystem::Puppet => vec![self.read_required(ecosystem.manifest_filename())?],
        };
        tracing::debug!("Fetched {} files from {}", files.len(), base.display());
        Ok(files)
    }
}

/// Workspace package directories, relative to `dir`.
///
/// Reads `workspaces` as an array or as `{ "packages": [...] }`.
fn workspace_dirs(dir: &Path, manifest: &str) -> Vec<String> {
    let Ok(json) = serde_json::from_str::<Value>(manifest) else {
        return Vec::new();
    };
    let patterns = match json.get("workspaces") {
        Some(Value::Array(patterns)) => patterns.clone(),
        Some(Value::Object(obj)) => obj
            .get("packages")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default(),
        _ => Vec::new(),
    };

    let mut dirs = Vec::new();
    for pattern in patterns.iter().filter_map(Value::as_str) {
        let pattern = pattern.trim_end_matches('/');

        // Handle glob patterns like 'packages/*' or 'apps/**'
        let base = pattern
            .strip_suffix("/**")
            .or_else(|| pattern.strip_suffix("/*"));
        if let Some(base) = base {
            let Ok(entries) = std::fs::read_dir(dir.join(base)) else {
                continue;
            };
            let mut children: Vec<String> = entries
                .flatten()
                .filter(|entry| entry.path().is_dir())
                .filter_map(|entry| entry.file_name().to_str().map(str::to_string))
                .map(|child| format!("{}/{}", base, child))
                .collect();
            children.sort();
            dirs.extend(children);
        } else if !pattern.contains('*') && dir.join(pattern).is_dir() {
            // Direct path without glob
            dirs.push(pattern.to_string());
        }
    }

    dirs
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn create_temp_dir() -> TempDir {
        TempDir::new().unwrap()
    }

    fn names(files: &[DependencyFile]) -> Vec<&str> {
        files.iter().map(|f| f.name()).collect()
    }

    #[test]
    fn test_fetch_package_json_only() {
        let dir = create_temp_dir();
        fs::write(dir.path().join("package.json"), "{}").unwrap();

        let files = LocalFileFetcher::new(dir.path())
            .fetch_files(Ecosystem::NpmAndYarn)
            .unwrap();
        assert_eq!(names(&files), vec!["package.json"]);
        assert_eq!(files[0].directory(), "/");
    }

    #[test]
    fn test_fetch_lockfiles_and_npmrc() {
        let dir = create_temp_dir();
        fs::write(dir.path().join("package.json"), "{}").unwrap();
        fs::write(dir.path().join("yarn.lock"), "").unwrap();
        fs::write(dir.path().join(".npmrc"), "registry=https://npm.example.com/").unwrap();

        let files = LocalFileFetcher::new(dir.path())
            .fetch_files(Ecosystem::NpmAndYarn)
            .unwrap();
        assert_eq!(names(&files), vec!["package.json", "yarn.lock", ".npmrc"]);
        assert!(files[2].is_support_file());
        assert!(!files[1].is_support_file());
    }

    #[test]
    fn test_missing_manifest() {
        let dir = create_temp_dir();
        let err = LocalFileFetcher::new(dir.path())
            .fetch_files(Ecosystem::Puppet)
            .unwrap_err();
        assert!(matches!(err, FetchError::ManifestNotFound { ref file, .. } if file == "Puppetfile"));
    }

    #[test]
    fn test_missing_directory() {
        let err = LocalFileFetcher::new("/nonexistent/deplift/project")
            .fetch_files(Ecosystem::NpmAndYarn)
            .unwrap_err();
        assert!(matches!(err, FetchError::DirectoryNotFound { .. }));
    }

    #[test]
    fn test_fetch_from_subdirectory() {
        let dir = create_temp_dir();
        fs::create_dir(dir.path().join("infra")).unwrap();
        fs::write(dir.path().join("infra").join("Puppetfile"), "mod 'a/b'").unwrap();

        let files = LocalFileFetcher::new(dir.path())
            .with_directory("/infra")
            .fetch_files(Ecosystem::Puppet)
            .unwrap();
        assert_eq!(names(&files), vec!["Puppetfile"]);
        assert_eq!(files[0].directory(), "/infra");
    }

    #[test]
    fn test_workspace_packages_detection() {
        let dir = create_temp_dir();
        fs::write(
            dir.path().join("package.json"),
            r#"{"workspaces": ["packages/*", "tools/cli"]}"#,
        )
        .unwrap();

        for pkg in ["packages/pkg-a", "packages/pkg-b", "tools/cli"] {
            fs::create_dir_all(dir.path().join(pkg)).unwrap();
            fs::write(dir.path().join(pkg).join("package.json"), "{}").unwrap();
        }
        fs::write(dir.path().join("packages/pkg-b/yarn.lock"), "").unwrap();

        let files = LocalFileFetcher::new(dir.path())
            .fetch_files(Ecosystem::NpmAndYarn)
            .unwrap();
        assert_eq!(
            names(&files),
            vec![
                "package.json",
                "packages/pkg-a/package.json",
                "packages/pkg-b/package.json",
                "packages/pkg-b/yarn.lock",
                "tools/cli/package.json",
            ]
        );
    }

    #[test]
    fn test_workspace_packages_object_form() {
        let dir = create_temp_dir();
        fs::create_dir_all(dir.path().join("apps/web")).unwrap();
        fs::write(dir.path().join("apps/web/package.json"), "{}").unwrap();

        let dirs = workspace_dirs(dir.path(), r#"{"workspaces": {"packages": ["apps/**"]}}"#);
        assert_eq!(dirs, vec!["apps/web"]);
        assert!(workspace_dirs(dir.path(), "not json").is_empty());
    }
}
