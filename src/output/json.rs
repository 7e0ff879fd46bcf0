//! JSON output formatter for machine processing
//!
//! This module provides:
//! - Extracted dependencies in their wire shape
//! - Per-dependency decisions (omitted for parse-only runs)
//! - Summary counts

use crate::domain::{Dependency, UpdateResult, UpdateSummary};
use crate::output::OutputFormatter;
use serde::Serialize;
use std::io::Write;

/// JSON formatter for machine-readable output
pub struct JsonFormatter {
    /// Whether the run stopped after parsing
    parse_only: bool,
}

impl JsonFormatter {
    /// Create a new JSON formatter
    pub fn new(parse_only: bool) -> Self {
        Self { parse_only }
    }
}

/// JSON representation of a run
#[derive(Serialize)]
struct JsonOutput<'a> {
    /// Ecosystem wire tag
    package_manager: &'static str,
    /// Project directory
    path: String,
    /// Summary statistics
    summary: JsonSummary,
    /// Every extracted dependency
    dependencies: &'a [Dependency],
    /// Decisions
    #[serde(skip_serializing_if = "Option::is_none")]
    results: Option<&'a [UpdateResult]>,
}

/// JSON representation of summary statistics
#[derive(Serialize)]
struct JsonSummary {
    dependencies: usize,
    updates: usize,
    skips: usize,
    failures: usize,
}

impl JsonFormatter {
    fn to_json<'a>(&self, summary: &'a UpdateSummary) -> JsonOutput<'a> {
        JsonOutput {
            package_manager: summary.ecosystem.tag(),
            path: summary.path.display().to_string(),
            summary: JsonSummary {
                dependencies: summary.total_dependencies(),
                updates: summary.total_updates(),
                skips: summary.total_skips(),
                failures: summary.total_failures(),
            },
            dependencies: &summary.dependencies,
            results: (!self.parse_only).then_some(summary.results.as_slice()),
        }
    }
}

impl OutputFormatter for JsonFormatter {
    fn format(&self, summary: &UpdateSummary, writer: &mut dyn Write) -> std::io::Result<()> {
        let output = self.to_json(summary);
        let json = serde_json::to_string_pretty(&output)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
        writeln!(writer, "{}", json)
    }
}
