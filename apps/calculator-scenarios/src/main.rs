//! Calculator scenario runner
//!
//! Discovers Gherkin `.feature` files, binds each step to the calculator
//! through a regex dispatch table, and reports every scenario as passed or
//! failed. Exits non-zero when any scenario fails or nothing was found.
//!
//! # Usage
//!
//! ```bash
//! # Run every feature under modules/
//! calculator-scenarios
//!
//! # Explicit paths, exclusions and JSON output
//! calculator-scenarios --exclude "**/wip/**" --json modules/calculator
//!
//! # Layered configuration
//! CALC_SCENARIOS_TOLERANCE=1e-6 calculator-scenarios -c scenarios.yaml
//! ```

// CLI tools are expected to print to stdout/stderr
#![allow(clippy::print_stdout, clippy::print_stderr)]

mod config;
mod error;
mod logging;
mod parser;
mod report;
mod runner;
mod scanner;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use calculator::steps::StepRegistry;
use clap::Parser;

use crate::config::{CliOverrides, LogFormat, ScenarioRunnerConfig};
use crate::report::{ScenarioReport, Summary, print_results, render_json};
use crate::runner::{RunSettings, block_on_detached, run_scenarios};
use crate::scanner::find_feature_files;

/// Calculator scenario runner
///
/// Executes Given/When/Then scenarios against the calculator service.
#[derive(Parser, Debug)]
#[command(name = "calculator-scenarios")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Feature files or directories to search (default: modules)
    #[arg(value_name = "PATH")]
    paths: Vec<PathBuf>,

    /// Path to a YAML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Exclude patterns (can be specified multiple times)
    /// Supports glob patterns. Example: --exclude "**/wip/**"
    #[arg(long, short = 'e', action = clap::ArgAction::Append)]
    exclude: Vec<String>,

    /// Output results as JSON
    #[arg(long)]
    json: bool,

    /// Log verbosity level (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Absolute tolerance for numeric result assertions
    #[arg(long)]
    tolerance: Option<f64>,

    /// Per-scenario timeout in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Maximum number of scenarios running at once
    #[arg(long)]
    concurrency: Option<usize>,

    /// Log output format
    #[arg(long, value_enum)]
    log_format: Option<LogFormat>,

    /// Print the step vocabulary and exit
    #[arg(long)]
    list_steps: bool,
}

impl Cli {
    fn overrides(&self) -> CliOverrides {
        CliOverrides {
            paths: self.paths.clone(),
            exclude: self.exclude.clone(),
            tolerance: self.tolerance,
            scenario_timeout_ms: self.timeout_ms,
            concurrency: self.concurrency,
            log_format: self.log_format,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Timed-out scenarios may still hold blocking workers; exit without them.
    let outcome = block_on_detached(run(&cli))
        .context("starting async runtime")
        .and_then(|result| result);

    match outcome {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

/// Returns `Ok(true)` when every scenario passed.
async fn run(cli: &Cli) -> anyhow::Result<bool> {
    // 1) defaults -> 2) YAML (if provided) -> 3) env (CALC_SCENARIOS_*) -> 4) CLI
    let mut config = ScenarioRunnerConfig::load(cli.config.as_deref())?;
    config.apply_cli_overrides(cli.overrides());
    config.validate()?;

    logging::init_logging(&config, cli.verbose);

    let registry = Arc::new(StepRegistry::calculator().context("building step registry")?);

    if cli.list_steps {
        for binding in registry.bindings() {
            println!("{:<6} {}", binding.kind(), binding.pattern());
        }
        return Ok(true);
    }

    let files = find_feature_files(&config.paths, &config.exclude);
    tracing::info!(count = files.len(), "discovered feature files");

    if files.is_empty() {
        eprintln!("No feature files found. Check paths and exclusion patterns.");
        return Ok(false);
    }

    let mut plans = Vec::new();
    let mut unloadable = Vec::new();
    for file in &files {
        match parser::load_feature(file) {
            Ok(mut file_plans) => plans.append(&mut file_plans),
            Err(e) => {
                tracing::warn!(path = %file.display(), error = %e, "skipping feature file");
                unloadable.push(ScenarioReport::unloadable(file, &e));
            }
        }
    }

    let settings = RunSettings {
        tolerance: config.tolerance,
        scenario_timeout: config.scenario_timeout(),
        concurrency: config.concurrency,
    };
    let mut reports = unloadable;
    reports.extend(run_scenarios(plans, &registry, &calculator::client(), settings).await);

    let summary = Summary::from_reports(files.len(), &reports);
    if cli.json {
        println!("{}", render_json(&summary, &reports)?);
    } else {
        print_results(&summary, &reports, cli.verbose > 0);
    }

    Ok(summary.ok())
}
