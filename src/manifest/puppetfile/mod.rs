//! Puppetfile parsing
//!
//! A Puppetfile is Ruby code. It is parsed into a syntax tree which is then
//! walked for `mod` declarations; `forge` and `moduledir` are recognized and
//! ignored, and every other call is skipped. Declarations nested inside
//! conditionals, blocks or literals are found as well.

mod lexer;
mod module;
mod parser;

pub use module::{AttributeValue, ModuleDeclaration, ModuleKind, DEFAULT_GIT_REF};

use super::FileParser;
use crate::domain::{find_file, Dependency, DependencyFile, DependencySet, Ecosystem, Requirement, Source};
use crate::error::{ParseError, PuppetfileError};
use parser::Node;
use std::collections::{BTreeMap, BTreeSet};

/// Puppet Forge API
pub const FORGE_URL: &str = "https://forgeapi.puppet.com";

/// Extracts the module declarations of a Puppetfile
pub fn parse_puppetfile(source: &str) -> Result<Vec<ModuleDeclaration>, PuppetfileError> {
    let program = parser::parse(source)?;
    let mut modules = Vec::new();
    for node in &program {
        collect_modules(node, &mut modules);
    }
    Ok(modules)
}

fn collect_modules(node: &Node, modules: &mut Vec<ModuleDeclaration>) {
    if let Node::Call {
        receiver: None,
        name,
        args,
        line,
        ..
    } = node
    {
        match name.as_str() {
            "mod" => match declaration(args, *line) {
                Some(module) => modules.push(module),
                None => tracing::debug!("Ignoring mod call without a literal name on line {}", line),
            },
            "forge" | "moduledir" => {}
            other => tracing::debug!("Ignoring call to {} on line {}", other, line),
        }
    }

    for child in node.children() {
        collect_modules(child, modules);
    }
}

fn declaration(args: &[Node], line: usize) -> Option<ModuleDeclaration> {
    let (Node::Str(name), rest) = args.split_first()? else {
        return None;
    };
    let args = rest.iter().map(attribute_value).collect();
    Some(ModuleDeclaration::new(name.clone(), line, args))
}

fn attribute_value(node: &Node) -> AttributeValue {
    match node {
        Node::Str(s) => AttributeValue::String(s.clone()),
        Node::Symbol(s) => AttributeValue::Symbol(s.clone()),
        Node::Number(n) => AttributeValue::Number(n.clone()),
        Node::Bool(b) => AttributeValue::Boolean(*b),
        Node::Nil => AttributeValue::Nil,
        Node::Array(items) => AttributeValue::Array(items.iter().map(attribute_value).collect()),
        Node::Hash(pairs) => {
            let map: BTreeMap<String, AttributeValue> = pairs
                .iter()
                .filter_map(|(key, value)| match key {
                    Node::Symbol(k) | Node::Str(k) => Some((k.clone(), attribute_value(value))),
                    _ => None,
                })
                .collect();
            AttributeValue::Hash(map)
        }
        _ => AttributeValue::Expression,
    }
}

/// Parser for Puppetfiles
#[derive(Debug, Clone, Copy, Default)]
pub struct PuppetParser;

impl FileParser for PuppetParser {
    fn parse(&self, files: &[DependencyFile]) -> Result<DependencySet, ParseError> {
        let manifest_name = Ecosystem::Puppet.manifest_filename();
        let puppetfile = find_file(files, manifest_name)
            .ok_or_else(|| ParseError::missing_manifest(manifest_name))?;

        let mut dependencies = DependencySet::new();
        for module in parse_puppetfile(puppetfile.content())? {
            match module_dependency(&module, puppetfile.name()) {
                Some(dependency) => dependencies.insert(dependency),
                None => tracing::debug!(
                    "Skipping module {} on line {}: {:?}",
                    module.name,
                    module.line,
                    module.kind()
                ),
            }
        }
        Ok(dependencies)
    }

    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Puppet
    }
}

fn module_dependency(module: &ModuleDeclaration, file: &str) -> Option<Dependency> {
    let (version, requirement, source) = match module.kind() {
        ModuleKind::Forge { version } => (version.clone(), version, Source::registry(FORGE_URL)),
        ModuleKind::Git {
            url,
            reference,
            branch,
        } => {
            let is_commit = reference.len() == 40 && reference.chars().all(|c| c.is_ascii_hexdigit());
            let version = is_commit.then(|| reference.clone());
            (version, None, Source::Git { url, reference, branch })
        }
        ModuleKind::Svn { .. } | ModuleKind::Local | ModuleKind::Invalid { .. } => return None,
    };

    let requirement = Requirement {
        requirement,
        file: file.to_string(),
        groups: BTreeSet::new(),
        source: Some(source),
    };
    Some(Dependency::new(
        module.slug(),
        version,
        Ecosystem::Puppet,
        vec![requirement],
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PUPPETFILE: &str = r#"
forge "https://forgeapi.puppetlabs.com"
moduledir 'modules'

# Modules from the Puppet Forge
mod "puppetlabs/stdlib", "4.25.1"
mod 'puppetlabs-ntp', :latest

# Modules from Git
mod 'apache',
  :git => 'https://github.com/puppetlabs/puppetlabs-apache',
  :commit => '8ea2c5a7e0e8f5b8d6e0f3c8d1b2a3c4d5e6f7a8'

mod 'site', :local => true
"#;

    #[test]
    fn test_parse_puppetfile_declarations() {
        let modules = parse_puppetfile(PUPPETFILE).unwrap();
        let names: Vec<&str> = modules.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["puppetlabs/stdlib", "puppetlabs-ntp", "apache", "site"]);
        assert_eq!(modules[0].line, 6);
        assert_eq!(modules[0].version(), Some("4.25.1"));
        assert_eq!(modules[3].kind(), ModuleKind::Local);
    }

    #[test]
    fn test_nested_conditional_declaration() {
        let source = r#"
if ENV['USE_GIT']
  unless ENV['OFFLINE']
    mod "x", :git => "https://example.com/x.git"
  end
else
  mod "puppetlabs/x", "1.0.0"
end
"#;
        let modules = parse_puppetfile(source).unwrap();
        assert_eq!(modules.len(), 2);
        assert_eq!(
            modules[0].kind(),
            ModuleKind::Git {
                url: "https://example.com/x.git".to_string(),
                reference: DEFAULT_GIT_REF.to_string(),
                branch: None,
            }
        );
        assert_eq!(modules[1].name, "puppetlabs/x");
    }

    #[test]
    fn test_other_calls_have_no_effect() {
        let source = "forge 'https://forge.example.com'\nmoduledir 'vendor'\nputs 'hello'\nrequire 'json'\n";
        assert!(parse_puppetfile(source).unwrap().is_empty());
    }

    #[test]
    fn test_declarations_inside_blocks_and_literals() {
        let source = "['a', 'b'].each do |m|\n  mod \"puppetlabs/#{m}\"\nend\nextra = [mod('c/d', '2.0.0')]\n";
        let modules = parse_puppetfile(source).unwrap();
        assert_eq!(modules.len(), 2);
        assert_eq!(modules[1].name, "c/d");
    }

    #[test]
    fn test_non_literal_name_is_ignored() {
        let modules = parse_puppetfile("mod name, '1.0.0'\nmod :sym\n").unwrap();
        assert!(modules.is_empty());
    }

    #[test]
    fn test_syntax_error_is_fatal() {
        let err = parse_puppetfile("mod 'a/b', :git => 'x\n").unwrap_err();
        assert_eq!(
            err,
            PuppetfileError::syntax(1, "unterminated string")
        );
        assert_eq!(err.to_string(), "Puppetfile:1: syntax error: unterminated string");
    }

    #[test]
    fn test_puppet_parser_dependencies() {
        let files = vec![DependencyFile::new("Puppetfile", PUPPETFILE)];
        let dependencies = PuppetParser.parse(&files).unwrap();
        assert_eq!(dependencies.len(), 3);

        let stdlib = dependencies.get("puppetlabs-stdlib").unwrap();
        assert_eq!(stdlib.version.as_deref(), Some("4.25.1"));
        assert_eq!(stdlib.package_manager, Ecosystem::Puppet);
        let requirement = &stdlib.requirements[0];
        assert_eq!(requirement.requirement.as_deref(), Some("4.25.1"));
        assert_eq!(requirement.file, "Puppetfile");
        assert!(requirement.groups.is_empty());
        assert_eq!(requirement.source, Some(Source::registry(FORGE_URL)));

        let ntp = dependencies.get("puppetlabs-ntp").unwrap();
        assert_eq!(ntp.version, None);
        assert_eq!(ntp.requirements[0].requirement, None);

        let apache = dependencies.get("apache").unwrap();
        assert_eq!(
            apache.version.as_deref(),
            Some("8ea2c5a7e0e8f5b8d6e0f3c8d1b2a3c4d5e6f7a8")
        );
        assert!(apache.requirements[0].is_git());

        assert!(dependencies.get("site").is_none());
    }

    #[test]
    fn test_puppet_parser_missing_manifest() {
        let files = vec![DependencyFile::new("package.json", "{}")];
        let err = PuppetParser.parse(&files).unwrap_err();
        assert_eq!(err.to_string(), "no Puppetfile!");
    }

    #[test]
    fn test_puppet_parser_syntax_error() {
        let files = vec![DependencyFile::new("Puppetfile", "if true\n  mod 'a/b'\n")];
        let err = PuppetParser.parse(&files).unwrap_err();
        assert!(matches!(err, ParseError::Puppetfile(ref e) if e.line() == 3));
    }
}
