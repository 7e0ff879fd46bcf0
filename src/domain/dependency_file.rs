//! Fetched dependency files

use serde::{Deserialize, Serialize};

/// Kind of a fetched file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileKind {
    /// Regular file
    #[default]
    File,
    /// Symbolic link (see `symlink_target`)
    Symlink,
    /// Git submodule pointer
    Submodule,
}

/// A manifest, lockfile or support file fetched from a project.
///
/// Files are immutable once fetched and are the only input of the parser stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyFile {
    /// Path relative to `directory`, e.g. `packages/web/package.json`
    name: String,
    /// Directory the project was fetched from
    directory: String,
    /// File content
    content: String,
    /// Support files are read for context but never parsed as manifests
    #[serde(default)]
    support_file: bool,
    /// Link target when this file is a symlink
    #[serde(default)]
    symlink_target: Option<String>,
    /// File kind
    #[serde(default, rename = "type")]
    kind: FileKind,
}

impl DependencyFile {
    /// Creates a regular file in the root directory
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            directory: "/".to_string(),
            content: content.into(),
            support_file: false,
            symlink_target: None,
            kind: FileKind::File,
        }
    }

    /// Sets the directory (builder pattern)
    pub fn with_directory(mut self, directory: impl Into<String>) -> Self {
        self.directory = directory.into();
        self
    }

    /// Marks this file as a support file (builder pattern)
    pub fn as_support_file(mut self) -> Self {
        self.support_file = true;
        self
    }

    /// Marks this file as a symlink (builder pattern)
    pub fn with_symlink_target(mut self, target: impl Into<String>) -> Self {
        self.symlink_target = Some(target.into());
        self.kind = FileKind::Symlink;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn directory(&self) -> &str {
        &self.directory
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn is_support_file(&self) -> bool {
        self.support_file
    }

    pub fn symlink_target(&self) -> Option<&str> {
        self.symlink_target.as_deref()
    }

    pub fn kind(&self) -> FileKind {
        self.kind
    }
}

/// Finds a file by exact name
pub fn find_file<'a>(files: &'a [DependencyFile], name: &str) -> Option<&'a DependencyFile> {
    files.iter().find(|f| f.name() == name)
}
