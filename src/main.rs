//! deplift - Dependency extraction and update-decision CLI tool
//!
//! Reads a project's dependency files and decides, per dependency, whether
//! it can be moved to the latest release and which requirements must be
//! relaxed to get there.

use clap::Parser;
use deplift::cli::CliArgs;
use deplift::orchestrator::Orchestrator;
use deplift::output::{create_formatter, OutputConfig};
use std::io::{self, Write};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Exit code when at least one dependency could not be evaluated
const EXIT_PARTIAL_FAILURE: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    let args = CliArgs::parse();
    init_tracing(args.verbose);

    match run(args).await {
        Ok(exit_code) => exit_code,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Install the stderr log subscriber; `RUST_LOG` wins over `--verbose`
fn init_tracing(verbose: bool) {
    let default = if verbose { "deplift=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

/// Main application logic
async fn run(args: CliArgs) -> anyhow::Result<ExitCode> {
    if args.verbose {
        eprintln!("deplift v{}", env!("CARGO_PKG_VERSION"));
        eprintln!("Target: {} ({})", args.path.display(), args.ecosystem.tag());
    }

    let summary = Orchestrator::new(args.clone())?.run().await?;

    let output_config = OutputConfig::from_cli(args.json, args.verbose, args.quiet, args.parse_only);
    let formatter = create_formatter(output_config);

    let mut stdout = io::stdout().lock();
    formatter.format(&summary, &mut stdout)?;
    stdout.flush()?;

    if summary.has_failures() {
        return Ok(ExitCode::from(EXIT_PARTIAL_FAILURE));
    }
    Ok(ExitCode::SUCCESS)
}
