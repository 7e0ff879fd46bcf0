//! yarn.lock reader
//!
//! Understands the classic (v1) format and the key/value layout of newer
//! lockfiles:
//!
//! ```text
//! "lodash@^4.17.0", lodash@^4.17.21:
//!   version "4.17.21"
//!   resolved "https://registry.yarnpkg.com/lodash/-/lodash-4.17.21.tgz"
//! ```

use super::LockfileDetails;

/// One lockfile block, shared by every `name@requirement` key in its header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YarnEntry {
    /// `(name, requirement)` pairs from the block header
    pub keys: Vec<(String, String)>,
    pub version: Option<String>,
    pub resolved: Option<String>,
}

impl YarnEntry {
    /// Package name of the first key
    pub fn name(&self) -> Option<&str> {
        self.keys.first().map(|(name, _)| name.as_str())
    }

    /// Returns true if a key declares `name` with `requirement`
    pub fn matches(&self, name: &str, requirement: &str) -> bool {
        self.keys.iter().any(|(key_name, key_req)| {
            key_name == name && key_req.strip_prefix("npm:").unwrap_or(key_req) == requirement
        })
    }

    pub fn details(&self) -> LockfileDetails {
        LockfileDetails {
            version: self.version.clone(),
            resolved: self.resolved.clone(),
        }
    }
}

/// A parsed yarn.lock
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct YarnLock {
    pub entries: Vec<YarnEntry>,
}

impl YarnLock {
    /// Parses yarn.lock content; lines that are not understood are ignored
    pub fn parse(content: &str) -> Self {
        let mut entries = Vec::new();
        let mut current: Option<YarnEntry> = None;

        for line in content.lines() {
            let trimmed = line.trim_end();
            if trimmed.trim_start().is_empty() || trimmed.trim_start().starts_with('#') {
                continue;
            }

            let indent = trimmed.len() - trimmed.trim_start().len();
            if indent == 0 {
                if let Some(entry) = current.take() {
                    entries.push(entry);
                }
                let header = trimmed.strip_suffix(':').unwrap_or(trimmed);
                let keys: Vec<(String, String)> =
                    header.split(", ").filter_map(split_key).collect();
                current = (!keys.is_empty()).then(|| YarnEntry {
                    keys,
                    version: None,
                    resolved: None,
                });
                continue;
            }

            // Nested blocks (dependencies:) sit deeper than the entry fields
            if indent != 2 {
                continue;
            }
            let Some(entry) = current.as_mut() else {
                continue;
            };
            let Some((field, value)) = split_field(trimmed.trim_start()) else {
                continue;
            };
            match field {
                "version" => entry.version = Some(value),
                "resolved" | "resolution" if entry.resolved.is_none() => {
                    entry.resolved = Some(value)
                }
                _ => {}
            }
        }

        if let Some(entry) = current {
            entries.push(entry);
        }

        Self { entries }
    }

    /// Finds the entry declaring `name` with `requirement`
    pub fn details(&self, name: &str, requirement: &str) -> Option<LockfileDetails> {
        self.entries
            .iter()
            .find(|entry| entry.matches(name, requirement))
            .map(YarnEntry::details)
    }
}

/// Splits `"@scope/name@^1.0.0"` into name and requirement
fn split_key(key: &str) -> Option<(String, String)> {
    let key = key.trim().trim_matches('"');
    let at = key.char_indices().skip(1).find(|(_, c)| *c == '@')?.0;
    Some((key[..at].to_string(), key[at + 1..].to_string()))
}

/// Splits `version "1.0.0"` or `version: 1.0.0`
fn split_field(line: &str) -> Option<(&str, String)> {
    let (field, value) = line.split_once(char::is_whitespace)?;
    let field = field.trim_end_matches(':').trim_matches('"');
    let value = value.trim().trim_matches('"');
    Some((field, value.to_string()))
}
