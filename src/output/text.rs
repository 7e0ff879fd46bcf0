//! Text output formatter for human-readable display
//!
//! This module provides:
//! - Extracted dependencies with their requirements and sources
//! - Decisions with the chosen unlock scope and change type (major/minor/patch)
//! - Requirement rewrites and other dependencies moved by an update
//! - Skipped and failed dependencies
//! - Summary with a breakdown by change type

use crate::domain::{Dependency, Requirement, UpdateResult, UpdateSummary};
use crate::output::{OutputFormatter, Verbosity};
use colored::{ColoredString, Colorize};
use std::io::Write;

/// Semantic version change type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionChangeType {
    /// Major version change (breaking)
    Major,
    /// Minor version change (features)
    Minor,
    /// Patch version change (fixes)
    Patch,
    /// Unknown or unparseable
    Unknown,
}

impl VersionChangeType {
    /// Determine the change type between two versions
    pub fn from_versions(old: &str, new: &str) -> Self {
        let parse = |v: &str| -> Option<(u64, u64)> {
            let v = v.strip_prefix('v').unwrap_or(v);
            let mut parts = v.split(['.', '-', '+']);
            let major = parts.next()?.parse().ok()?;
            let minor = parts.next().map_or(Some(0), |p| p.parse().ok())?;
            Some((major, minor))
        };

        match (parse(old), parse(new)) {
            (Some((old_major, _)), Some((new_major, _))) if old_major != new_major => {
                VersionChangeType::Major
            }
            (Some((_, old_minor)), Some((_, new_minor))) if old_minor != new_minor => {
                VersionChangeType::Minor
            }
            (Some(_), Some(_)) => VersionChangeType::Patch,
            _ => VersionChangeType::Unknown,
        }
    }

    /// Get the plain label
    pub fn label(&self) -> &'static str {
        match self {
            VersionChangeType::Major => "major",
            VersionChangeType::Minor => "minor",
            VersionChangeType::Patch => "patch",
            VersionChangeType::Unknown => "?",
        }
    }

    fn colored_label(&self) -> ColoredString {
        match self {
            VersionChangeType::Major => self.label().red().bold(),
            VersionChangeType::Minor => self.label().yellow(),
            VersionChangeType::Patch => self.label().green(),
            VersionChangeType::Unknown => self.label().dimmed(),
        }
    }
}

/// Text formatter for human-readable output
pub struct TextFormatter {
    /// Verbosity level
    verbosity: Verbosity,
    /// Whether the run stopped after parsing
    parse_only: bool,
    /// Whether to use colors
    color: bool,
}

impl TextFormatter {
    /// Create a new text formatter
    pub fn new(verbosity: Verbosity, parse_only: bool) -> Self {
        Self::with_color(verbosity, parse_only, true)
    }

    /// Create a new text formatter with color option
    pub fn with_color(verbosity: Verbosity, parse_only: bool, color: bool) -> Self {
        Self {
            verbosity,
            parse_only,
            color,
        }
    }

    /// Applies `style` when colors are enabled
    fn paint(&self, text: &str, style: impl Fn(&str) -> ColoredString) -> String {
        if self.color {
            style(text).to_string()
        } else {
            text.to_string()
        }
    }

    fn header(&self, summary: &UpdateSummary, writer: &mut dyn Write) -> std::io::Result<()> {
        let path = summary.path.display().to_string();
        let count = summary.total_dependencies();
        writeln!(
            writer,
            "{} {} ({} {})",
            self.paint(&path, |s| s.bold()),
            self.paint(&format!("[{}]", summary.ecosystem), |s| s.dimmed()),
            count,
            if count == 1 { "dependency" } else { "dependencies" }
        )
    }

    fn requirement_line(&self, requirement: &Requirement) -> String {
        let constraint = requirement.requirement.as_deref().unwrap_or("(none)");
        let groups = requirement
            .groups
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", ");
        let mut line = format!("{}: {}", requirement.file, constraint);
        if !groups.is_empty() {
            line.push_str(&format!(" [{}]", groups));
        }
        if let Some(source) = &requirement.source {
            line.push_str(&format!(" {}", self.paint(&source.to_string(), |s| s.dimmed())));
        }
        line
    }

    /// Lists the extracted dependencies
    fn format_dependencies(
        &self,
        summary: &UpdateSummary,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        let (top_level, transitive): (Vec<&Dependency>, Vec<&Dependency>) = summary
            .dependencies
            .iter()
            .partition(|d| d.is_top_level());
        let shown: Vec<&Dependency> = if self.verbosity == Verbosity::Verbose {
            top_level.iter().chain(transitive.iter()).copied().collect()
        } else {
            top_level
        };
        let width = max_name_length(shown.iter().copied()).max(20);

        for dependency in &shown {
            writeln!(
                writer,
                "  {:width$} {}",
                dependency.name,
                self.paint(version_or_dash(dependency), |s| s.bright_white()),
                width = width
            )?;
            for requirement in &dependency.requirements {
                writeln!(writer, "      {}", self.requirement_line(requirement))?;
            }
        }

        if self.verbosity != Verbosity::Verbose && !transitive.is_empty() {
            writeln!(
                writer,
                "  {}",
                self.paint(
                    &format!("(+{} lockfile-only dependencies)", transitive.len()),
                    |s| s.dimmed()
                )
            )?;
        }
        Ok(())
    }

    fn format_update(
        &self,
        dependency: &Dependency,
        updated: &[Dependency],
        scope: &str,
        width: usize,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        let Some(new) = updated.iter().find(|d| d.name == dependency.name) else {
            return Ok(());
        };
        let old_version = version_or_dash(dependency);
        let new_version = version_or_dash(new);
        let change = VersionChangeType::from_versions(old_version, new_version);
        let label = if self.color {
            change.colored_label().to_string()
        } else {
            change.label().to_string()
        };

        writeln!(
            writer,
            "  {:width$} {} {} {} [{}] {}",
            dependency.name,
            self.paint(old_version, |s| s.dimmed()),
            if self.color { "→" } else { "->" },
            self.paint(new_version, |s| s.bright_white().bold()),
            label,
            self.paint(&format!("(unlock: {})", scope), |s| s.dimmed()),
            width = width
        )?;

        let previous = new.previous_requirements.as_deref().unwrap_or_default();
        for (before, after) in previous.iter().zip(&new.requirements) {
            if before.requirement != after.requirement {
                writeln!(
                    writer,
                    "      {}: {} -> {}",
                    after.file,
                    before.requirement.as_deref().unwrap_or("(none)"),
                    after.requirement.as_deref().unwrap_or("(none)")
                )?;
            }
        }

        for other in updated.iter().filter(|d| d.name != dependency.name) {
            writeln!(
                writer,
                "      also updates {} {} -> {}",
                other.name,
                other.previous_version.as_deref().unwrap_or("-"),
                version_or_dash(other)
            )?;
        }
        Ok(())
    }

    /// Lists the decisions
    fn format_results(
        &self,
        summary: &UpdateSummary,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        let width = max_name_length(summary.results.iter().map(UpdateResult::dependency)).max(20);
        let verbose = self.verbosity == Verbosity::Verbose;

        for result in &summary.results {
            match result {
                UpdateResult::Decided {
                    dependency,
                    scope,
                    updated,
                } if !updated.is_empty() => {
                    self.format_update(dependency, updated, &scope.to_string(), width, writer)?
                }
                UpdateResult::Decided { dependency, .. } if verbose => writeln!(
                    writer,
                    "  {:width$} {}",
                    dependency.name,
                    self.paint("(no update available)", |s| s.dimmed()),
                    width = width
                )?,
                UpdateResult::Skip { dependency, reason } if verbose => writeln!(
                    writer,
                    "  {:width$} {}",
                    dependency.name,
                    self.paint(&format!("(skipped: {})", reason), |s| s.dimmed()),
                    width = width
                )?,
                UpdateResult::Failed {
                    dependency,
                    message,
                } => writeln!(
                    writer,
                    "  {:width$} {}",
                    dependency.name,
                    self.paint(&format!("failed: {}", message), |s| s.red()),
                    width = width
                )?,
                _ => {}
            }
        }
        Ok(())
    }

    /// Count updates by change type
    fn count_by_change_type(&self, summary: &UpdateSummary) -> [(VersionChangeType, usize); 4] {
        let mut counts = [
            (VersionChangeType::Major, 0),
            (VersionChangeType::Minor, 0),
            (VersionChangeType::Patch, 0),
            (VersionChangeType::Unknown, 0),
        ];
        for result in summary.all_updates() {
            if let Some(new) = result.primary() {
                let change = VersionChangeType::from_versions(
                    version_or_dash(result.dependency()),
                    version_or_dash(new),
                );
                if let Some(entry) = counts.iter_mut().find(|(kind, _)| *kind == change) {
                    entry.1 += 1;
                }
            }
        }
        counts
    }

    fn format_summary(
        &self,
        summary: &UpdateSummary,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        let updates = summary.total_updates();
        let skips = summary.total_skips();
        let failures = summary.total_failures();

        if self.verbosity == Verbosity::Quiet {
            let mut line = if updates > 0 {
                format!("{} updatable", self.paint(&updates.to_string(), |s| s.green()))
            } else {
                self.paint("No updates", |s| s.dimmed())
            };
            if failures > 0 {
                line.push_str(&format!(
                    ", {} failed",
                    self.paint(&failures.to_string(), |s| s.red())
                ));
            }
            return writeln!(writer, "{}", line);
        }

        writeln!(writer, "{}:", self.paint("Summary", |s| s.bold()))?;
        let breakdown: Vec<String> = self
            .count_by_change_type(summary)
            .iter()
            .filter(|(_, count)| *count > 0)
            .map(|(kind, count)| format!("{} {}", count, kind.label()))
            .collect();
        let mut line = format!(
            "  {} updatable",
            self.paint(&updates.to_string(), |s| s.green())
        );
        if !breakdown.is_empty() {
            line.push_str(&format!(" ({})", breakdown.join(", ")));
        }
        let up_to_date = summary.results.len() - updates - skips - failures;
        line.push_str(&format!(", {} up to date, {} skipped", up_to_date, skips));
        if failures > 0 {
            line.push_str(&format!(
                ", {} failed",
                self.paint(&failures.to_string(), |s| s.red())
            ));
        }
        writeln!(writer, "{}", line)
    }
}

fn version_or_dash(dependency: &Dependency) -> &str {
    dependency.version.as_deref().unwrap_or("-")
}

fn max_name_length<'a>(dependencies: impl Iterator<Item = &'a Dependency>) -> usize {
    dependencies.map(|d| d.name.len()).max().unwrap_or(0)
}

impl OutputFormatter for TextFormatter {
    fn format(&self, summary: &UpdateSummary, writer: &mut dyn Write) -> std::io::Result<()> {
        if self.verbosity == Verbosity::Quiet && !self.parse_only {
            return self.format_summary(summary, writer);
        }

        self.header(summary, writer)?;
        if self.parse_only {
            return self.format_dependencies(summary, writer);
        }

        self.format_results(summary, writer)?;
        writeln!(writer)?;
        self.format_summary(summary, writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Ecosystem, RequirementsToUnlock, SkipReason, Source};

    fn dependency(name: &str, version: &str, requirement: &str) -> Dependency {
        Dependency::new(
            name,
            Some(version.to_string()),
            Ecosystem::NpmAndYarn,
            vec![Requirement::new(
                Some(requirement.to_string()),
                "package.json",
                "dependencies",
                Some(Source::registry("https://registry.npmjs.org")),
            )],
        )
    }

    fn updated(dep: &Dependency, version: &str, requirement: &str) -> Dependency {
        let mut new = dependency(&dep.name, version, requirement);
        new.requirements[0].groups = dep.requirements[0].groups.clone();
        new.with_previous(dep.version.clone(), dep.requirements.clone())
    }

    fn sample_summary() -> UpdateSummary {
        let lodash = dependency("lodash", "1.0.0", "^1.0.0");
        let react = dependency("react", "18.2.0", "^18.0.0");
        let vue = dependency("vue", "3.0.0", "^3.0.0");
        let broken = dependency("broken", "0.1.0", "^0.1.0");

        let mut summary = UpdateSummary::new("/project", Ecosystem::NpmAndYarn);
        summary.dependencies = vec![lodash.clone(), react.clone(), vue.clone(), broken.clone()];
        summary.dependencies.push(Dependency::locked("ms", "2.1.3", Ecosystem::NpmAndYarn));
        let bumped = updated(&lodash, "2.0.0", "^2.0.0");
        summary.add_result(UpdateResult::decided(
            lodash,
            RequirementsToUnlock::Own,
            vec![bumped],
        ));
        summary.add_result(UpdateResult::decided(
            react,
            RequirementsToUnlock::UpdateNotPossible,
            vec![],
        ));
        summary.add_result(UpdateResult::skip(vue, SkipReason::Excluded));
        summary.add_result(UpdateResult::failed(broken, "registry unreachable"));
        summary
    }

    fn render(formatter: TextFormatter, summary: &UpdateSummary) -> String {
        let mut output = Vec::new();
        formatter.format(summary, &mut output).unwrap();
        String::from_utf8(output).unwrap()
    }

    #[test]
    fn test_version_change_type() {
        assert_eq!(
            VersionChangeType::from_versions("1.0.0", "2.0.0"),
            VersionChangeType::Major
        );
        assert_eq!(
            VersionChangeType::from_versions("1.0.0", "1.1.0"),
            VersionChangeType::Minor
        );
        assert_eq!(
            VersionChangeType::from_versions("1.0.0", "1.0.1"),
            VersionChangeType::Patch
        );
        assert_eq!(
            VersionChangeType::from_versions("v1.2", "v1.2.5"),
            VersionChangeType::Patch
        );
        assert_eq!(
            VersionChangeType::from_versions("-", "2.0.0"),
            VersionChangeType::Unknown
        );
    }

    #[test]
    fn test_format_decisions() {
        let output = render(
            TextFormatter::with_color(Verbosity::Normal, false, false),
            &sample_summary(),
        );

        assert!(output.contains("/project [npm/yarn] (5 dependencies)"));
        assert!(output.contains("lodash"));
        assert!(output.contains("1.0.0 -> 2.0.0 [major] (unlock: own)"));
        assert!(output.contains("package.json: ^1.0.0 -> ^2.0.0"));
        assert!(output.contains("failed: registry unreachable"));
        assert!(!output.contains("no update available"));
        assert!(!output.contains("skipped:"));
        assert!(output.contains("1 updatable (1 major), 1 up to date, 1 skipped, 1 failed"));
    }

    #[test]
    fn test_format_decisions_verbose() {
        let output = render(
            TextFormatter::with_color(Verbosity::Verbose, false, false),
            &sample_summary(),
        );
        assert!(output.contains("(no update available)"));
        assert!(output.contains("(skipped: excluded by --exclude)"));
    }

    #[test]
    fn test_format_quiet() {
        let output = render(
            TextFormatter::with_color(Verbosity::Quiet, false, false),
            &sample_summary(),
        );
        assert_eq!(output, "1 updatable, 1 failed\n");
    }

    #[test]
    fn test_format_parse_only() {
        let output = render(
            TextFormatter::with_color(Verbosity::Normal, true, false),
            &sample_summary(),
        );
        assert!(output.contains("package.json: ^1.0.0 [dependencies] https://registry.npmjs.org"));
        assert!(output.contains("(+1 lockfile-only dependencies)"));
        assert!(!output.contains("ms "));
        assert!(!output.contains("Summary"));

        let verbose = render(
            TextFormatter::with_color(Verbosity::Verbose, true, false),
            &sample_summary(),
        );
        assert!(verbose.contains("ms "));
        assert!(!verbose.contains("lockfile-only"));
    }
}
