//! package-lock.json / npm-shrinkwrap.json reader

use super::LockfileDetails;
use serde_json::{Map, Value};

/// A parsed npm lockfile (lockfileVersion 1, 2 or 3)
#[derive(Debug, Clone, PartialEq)]
pub struct PackageLock {
    root: Value,
}

impl PackageLock {
    /// Parses lockfile JSON
    pub fn parse(content: &str) -> Result<Self, serde_json::Error> {
        let root: Value = serde_json::from_str(content)?;
        Ok(Self { root })
    }

    fn packages(&self) -> Option<&Map<String, Value>> {
        self.root.get("packages").and_then(Value::as_object)
    }

    fn dependencies(&self) -> Option<&Map<String, Value>> {
        self.root.get("dependencies").and_then(Value::as_object)
    }

    /// Details of the top-level installation of `name`
    pub fn details(&self, name: &str) -> Option<LockfileDetails> {
        let key = format!("node_modules/{}", name);
        self.packages()
            .and_then(|packages| packages.get(&key))
            .or_else(|| self.dependencies().and_then(|deps| deps.get(name)))
            .map(details_of)
    }

    /// Every `(name, version)` recorded in the lockfile, nested installs included
    pub fn entries(&self) -> Vec<(String, String)> {
        let mut entries = Vec::new();

        if let Some(packages) = self.packages() {
            for (path, details) in packages {
                let Some(idx) = path.rfind("node_modules/") else {
                    continue;
                };
                if is_bundled_or_linked(details) {
                    continue;
                }
                if let Some(version) = details.get("version").and_then(Value::as_str) {
                    let name = &path[idx + "node_modules/".len()..];
                    entries.push((name.to_string(), version.to_string()));
                }
            }
        }

        if let Some(dependencies) = self.dependencies() {
            collect_v1(dependencies, &mut entries);
        }

        entries
    }
}

/// Walks the nested `dependencies` tree of lockfileVersion 1
fn collect_v1(dependencies: &Map<String, Value>, entries: &mut Vec<(String, String)>) {
    for (name, details) in dependencies {
        if is_bundled_or_linked(details) {
            continue;
        }
        if let Some(version) = details.get("version").and_then(Value::as_str) {
            entries.push((name.clone(), version.to_string()));
        }
        if let Some(nested) = details.get("dependencies").and_then(Value::as_object) {
            collect_v1(nested, entries);
        }
    }
}

fn is_bundled_or_linked(details: &Value) -> bool {
    let flag = |key: &str| details.get(key).and_then(Value::as_bool).unwrap_or(false);
    flag("bundled") || flag("inBundle") || flag("link")
}

fn details_of(details: &Value) -> LockfileDetails {
    let text = |key: &str| details.get(key).and_then(Value::as_str).map(str::to_string);
    LockfileDetails {
        version: text("version"),
        resolved: text("resolved"),
    }
}
