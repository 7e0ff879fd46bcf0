//! Puppetfile module declarations and their r10k classification

use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;

/// `author/module` or `author-module`
static FORGE_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9]+[/-][A-Za-z0-9_]+$").unwrap());

/// Ref used when a git module names none
pub const DEFAULT_GIT_REF: &str = "master";

/// A literal argument of a `mod` declaration.
///
/// Anything that is not a literal (variables, method calls, operators) is
/// kept as `Expression`; nothing is evaluated.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    String(String),
    Symbol(String),
    Number(String),
    Boolean(bool),
    Nil,
    Array(Vec<AttributeValue>),
    Hash(BTreeMap<String, AttributeValue>),
    Expression,
}

impl AttributeValue {
    /// The value of a string literal
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttributeValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// The value of a string or the name of a symbol
    pub fn as_name(&self) -> Option<&str> {
        match self {
            AttributeValue::String(s) | AttributeValue::Symbol(s) => Some(s),
            _ => None,
        }
    }

    /// Whether this is the symbol `:name`
    pub fn is_symbol(&self, name: &str) -> bool {
        matches!(self, AttributeValue::Symbol(s) if s == name)
    }

    /// Ruby truthiness: everything but `false` and `nil`
    pub fn is_truthy(&self) -> bool {
        !matches!(self, AttributeValue::Boolean(false) | AttributeValue::Nil)
    }
}

/// How a module is installed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModuleKind {
    /// Puppet Forge release; no version means the latest one
    Forge { version: Option<String> },
    /// Git checkout
    Git {
        url: String,
        reference: String,
        branch: Option<String>,
    },
    /// Subversion checkout
    Svn { url: String, revision: Option<String> },
    /// Module kept inside the control repository
    Local,
    /// Declaration no installer accepts
    Invalid { reason: String },
}

/// One `mod` call of a Puppetfile
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleDeclaration {
    /// Module name as written
    pub name: String,
    /// Line of the declaration
    pub line: usize,
    /// Arguments after the name
    pub args: Vec<AttributeValue>,
}

impl ModuleDeclaration {
    pub fn new(name: impl Into<String>, line: usize, args: Vec<AttributeValue>) -> Self {
        Self {
            name: name.into(),
            line,
            args,
        }
    }

    /// Forge-style slug (`author-module`)
    pub fn slug(&self) -> String {
        self.name.replace('/', "-")
    }

    /// Version given as the sole positional argument
    pub fn version(&self) -> Option<&str> {
        match self.args.as_slice() {
            [value] => value.as_str(),
            _ => None,
        }
    }

    /// Options given as the sole hash argument
    pub fn attributes(&self) -> Option<&BTreeMap<String, AttributeValue>> {
        match self.args.as_slice() {
            [AttributeValue::Hash(map)] => Some(map),
            _ => None,
        }
    }

    fn attribute(&self, key: &str) -> Option<&AttributeValue> {
        self.attributes().and_then(|attrs| attrs.get(key))
    }

    /// Classifies the declaration the way r10k picks an installer:
    /// svn, git, forge, then local.
    pub fn kind(&self) -> ModuleKind {
        if self.args.len() > 1 {
            return ModuleKind::Invalid {
                reason: format!("expected at most one argument, found {}", self.args.len()),
            };
        }

        if let Some(svn) = self.attribute("svn") {
            return match svn.as_str() {
                Some(url) => ModuleKind::Svn {
                    url: url.to_string(),
                    revision: self
                        .attribute("rev")
                        .or_else(|| self.attribute("revision"))
                        .and_then(AttributeValue::as_name)
                        .map(str::to_string),
                },
                None => ModuleKind::Invalid {
                    reason: "`:svn` must be a string".to_string(),
                },
            };
        }

        if let Some(git) = self.attribute("git") {
            let Some(url) = git.as_str() else {
                return ModuleKind::Invalid {
                    reason: "`:git` must be a string".to_string(),
                };
            };
            let reference = ["ref", "tag", "commit", "branch", "default_branch"]
                .iter()
                .find_map(|key| self.attribute(key).and_then(AttributeValue::as_name))
                .unwrap_or(DEFAULT_GIT_REF);
            return ModuleKind::Git {
                url: url.to_string(),
                reference: reference.to_string(),
                branch: self
                    .attribute("branch")
                    .and_then(AttributeValue::as_name)
                    .map(str::to_string),
            };
        }

        if FORGE_NAME_RE.is_match(&self.name) {
            match self.args.first() {
                None => return ModuleKind::Forge { version: None },
                Some(value) if value.is_symbol("latest") => {
                    return ModuleKind::Forge { version: None }
                }
                Some(AttributeValue::String(version)) if semver::Version::parse(version).is_ok() => {
                    return ModuleKind::Forge {
                        version: Some(version.clone()),
                    }
                }
                _ => {}
            }
        }

        let local = match self.args.first() {
            Some(value) if value.is_symbol("local") => true,
            _ => self.attribute("local").is_some_and(AttributeValue::is_truthy),
        };
        if local {
            return ModuleKind::Local;
        }

        ModuleKind::Invalid {
            reason: format!("module {} does not match any installer", self.name),
        }
    }
}
