//! TOML suite file parsing

use super::*;
use crate::config::cli::Cli;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Parse TOML suite file
pub fn parse_toml_file(path: &Path) -> Result<Config> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    parse_toml_string(&contents)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Parse TOML suite from string
pub fn parse_toml_string(contents: &str) -> Result<Config> {
    let config: Config = ::toml::from_str(contents)
        .context("Failed to parse TOML configuration")?;

    Ok(config)
}

/// Merge CLI arguments with the suite configuration (CLI takes precedence)
///
/// Scenario-level flags are applied later through [`Cli::overrides`].
pub fn merge_cli_with_config(cli: &Cli, mut config: Config) -> Config {
    if let Some(suite) = cli.suite {
        config.suite = suite;
    }
    if let Some(results) = &cli.results {
        config.output.results_file = results.clone();
    }
    if let Some(json) = &cli.json {
        config.output.json_file = Some(json.clone());
    }
    if let Some(capacity) = cli.pool_capacity {
        config.runner.pool_capacity = capacity;
    }
    if let Some(seed) = cli.seed {
        config.sampler.seed = Some(seed);
    }
    config
}

/// Load the suite named on the command line, or the defaults
pub fn load(cli: &Cli) -> Result<Config> {
    let config = match &cli.config {
        Some(path) => parse_toml_file(path)?,
        None => Config::default(),
    };
    Ok(merge_cli_with_config(cli, config))
}
