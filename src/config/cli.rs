//! CLI argument parsing using clap

use super::{ScenarioOverrides, SuiteKind};
use clap::Parser;
use std::path::PathBuf;

/// streambench - streaming throughput benchmark harness
#[derive(Parser, Debug)]
#[command(name = "streambench")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// TOML suite file; the built-in suite runs when omitted
    #[arg(short = 'c', long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Built-in suite to run when the suite file lists no scenarios
    #[arg(long, value_enum)]
    pub suite: Option<SuiteKind>,

    /// Markdown result log (default: BENCHMARKS.md)
    #[arg(short = 'o', long, value_name = "FILE")]
    pub results: Option<PathBuf>,

    /// Also export results as JSON lines
    #[arg(long, value_name = "FILE")]
    pub json: Option<PathBuf>,

    /// Worker pool threads
    #[arg(long)]
    pub pool_capacity: Option<usize>,

    /// Workers for every scenario, replacing configured counts and sweeps
    #[arg(short = 'w', long)]
    pub workers: Option<usize>,

    /// Logical operations for every scenario
    #[arg(short = 'n', long)]
    pub total_operations: Option<u64>,

    /// Only run scenarios whose name contains this text
    #[arg(short = 's', long, value_name = "TEXT")]
    pub scenario: Option<String>,

    /// Base seed for the key samplers
    #[arg(long)]
    pub seed: Option<u64>,

    /// Print the planned scenarios and exit
    #[arg(long)]
    pub dry_run: bool,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,
}

impl Cli {
    /// Per-scenario overrides carried by the command line
    pub fn overrides(&self) -> ScenarioOverrides {
        ScenarioOverrides {
            workers: self.workers,
            total_operations: self.total_operations,
            name_filter: self.scenario.clone(),
        }
    }
}
