//! streambench CLI entry point

use anyhow::{Context, Result};
use clap::Parser;
use std::time::Duration;
use streambench::channel::loopback::{LoopbackConfig, LoopbackConnector};
use streambench::config::cli::Cli;
use streambench::config::{toml, validator, Config, PlannedScenario, TargetKind};
use streambench::output::json::JsonLog;
use streambench::output::markdown::ResultLogs;
use streambench::output::summary_line;
use streambench::runner::{BenchmarkRunner, SamplerSettings};
use streambench::util::number::format_number;
use streambench::worker::WorkerPool;

fn main() -> Result<()> {
    let cli = Cli::parse();
    streambench::observability::initialize_tracing(cli.debug);

    let config = toml::load(&cli)?;
    validator::validate_config(&config).context("Configuration validation failed")?;

    let planned = config.plan(&cli.overrides());
    validator::validate_planned(&config, &planned).context("Configuration validation failed")?;
    if planned.is_empty() {
        anyhow::bail!(
            "No scenario matches {:?}",
            cli.scenario.as_deref().unwrap_or_default()
        );
    }

    if cli.dry_run {
        print_plan(&config, &planned);
        return Ok(());
    }

    run_suite(&config, planned)
}

/// Run every planned scenario in order, stopping at the first failure
fn run_suite(config: &Config, planned: Vec<PlannedScenario>) -> Result<()> {
    let connector = match config.target.kind {
        TargetKind::Loopback => LoopbackConnector::new(LoopbackConfig {
            latency: Duration::from_micros(config.target.latency_us),
            ..Default::default()
        }),
    };

    let pool = WorkerPool::new(config.runner.pool_capacity).context("Failed to start worker pool")?;
    let mut runner = BenchmarkRunner::new(connector, pool)
        .with_sampler(SamplerSettings {
            element_count: config.sampler.element_count,
            skew: config.sampler.skew,
            seed: config.sampler.seed,
        })?
        .with_settle(Duration::from_millis(config.runner.settle_ms));
    if let Some(base) = config.runner.write_offset_base {
        runner = runner.with_write_offset_base(base);
    }

    tracing::info!(
        target_kind = %config.target.kind,
        pool_capacity = config.runner.pool_capacity,
        scenarios = planned.len(),
        "starting benchmark suite"
    );

    if let Some(preload) = &config.preload {
        runner
            .preload(preload.records, preload.batch_size)
            .context("Preload failed")?;
    }

    let mut json = match &config.output.json_file {
        Some(path) => Some(
            JsonLog::create(path)
                .with_context(|| format!("Failed to create JSON log: {}", path.display()))?,
        ),
        None => None,
    };

    let mut logs = ResultLogs::create(planned.iter().map(|p| p.results_file.as_path()))
        .context("Failed to create result logs")?;

    for scenario in planned {
        let Some(log) = logs.get_mut(&scenario.results_file) else {
            anyhow::bail!("No result log for {}", scenario.results_file.display());
        };

        let result = runner
            .run(&scenario.spec)
            .with_context(|| format!("Scenario failed: {}", scenario.spec.name))?;

        log.append(&result)
            .with_context(|| format!("Failed to write result log: {}", log.path().display()))?;
        if let Some(json) = json.as_mut() {
            json.append(&result).context("Failed to write JSON log")?;
        }

        println!("{}", summary_line(&result));
    }

    Ok(())
}

/// Print the expanded plan without running anything
fn print_plan(config: &Config, planned: &[PlannedScenario]) {
    println!("streambench v{}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("Target:        {}", config.target.kind);
    println!(
        "Key space:     {} keys, skew {}",
        format_number(config.sampler.element_count),
        config.sampler.skew
    );
    println!("Pool capacity: {}", config.runner.pool_capacity);
    if config.scenarios.is_empty() {
        println!("Suite:         {}", config.suite);
    }
    if let Some(preload) = &config.preload {
        println!("Preload:       {} records", format_number(preload.records));
    }
    println!();

    for scenario in planned {
        let spec = &scenario.spec;
        println!(
            "{} | workers {} | ops {} | batch {} | {} {} | -> {}",
            spec.name,
            spec.workers,
            format_number(spec.total_operations),
            spec.batch_size,
            spec.traffic,
            spec.policy,
            scenario.results_file.display()
        );
    }

    println!();
    println!("Dry run mode - configuration validated successfully");
}
