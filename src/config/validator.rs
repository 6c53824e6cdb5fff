//! Configuration validation

use super::*;
use anyhow::{Context, Result};

/// Validate the suite configuration
pub fn validate_config(config: &Config) -> Result<()> {
    validate_sampler(&config.sampler)?;
    validate_runner(&config.runner)?;

    if let Some(preload) = &config.preload {
        if preload.batch_size == 0 {
            anyhow::bail!("preload batch_size must be at least 1");
        }
    }

    if config.suite != SuiteKind::default() && !config.scenarios.is_empty() {
        tracing::warn!(suite = %config.suite, "explicit scenarios replace the built-in suite");
    }

    for (i, scenario) in config.scenarios.iter().enumerate() {
        validate_scenario_config(scenario)
            .with_context(|| format!("Invalid scenario #{} ({})", i + 1, scenario.name))?;
    }

    Ok(())
}

/// Validate the key space
pub fn validate_sampler(sampler: &SamplerConfig) -> Result<()> {
    if sampler.element_count == 0 {
        anyhow::bail!("element_count must be greater than 0");
    }
    if !(sampler.skew > 0.0 && sampler.skew < 1.0) {
        anyhow::bail!("skew must be strictly between 0 and 1, got {}", sampler.skew);
    }
    Ok(())
}

/// Validate pool settings
pub fn validate_runner(runner: &RunnerConfig) -> Result<()> {
    if runner.pool_capacity == 0 {
        anyhow::bail!("pool_capacity must be at least 1");
    }
    Ok(())
}

/// Validate one scenario entry before expansion
pub fn validate_scenario_config(scenario: &ScenarioConfig) -> Result<()> {
    if scenario.name.trim().is_empty() {
        anyhow::bail!("name must not be empty");
    }
    if scenario.workers.is_some() && !scenario.worker_counts.is_empty() {
        anyhow::bail!("set either workers or worker_counts, not both");
    }
    if scenario.total_operations.is_some() && scenario.operations_per_worker.is_some() {
        anyhow::bail!("set either total_operations or operations_per_worker, not both");
    }
    if scenario.batch_size.is_some() && !scenario.batch_sizes.is_empty() {
        anyhow::bail!("set either batch_size or batch_sizes, not both");
    }
    if scenario.insert_policy.is_some() && scenario.traffic == TrafficMix::Search {
        tracing::warn!(
            scenario = %scenario.name,
            "insert_policy has no effect on search-only traffic"
        );
    }
    Ok(())
}

/// Validate expanded scenarios
pub fn validate_planned(config: &Config, planned: &[PlannedScenario]) -> Result<()> {
    let base = config.write_offset_base();
    for scenario in planned {
        validate_spec(&scenario.spec)
            .and_then(|()| validate_write_offsets(&scenario.spec, base))
            .with_context(|| format!("Invalid scenario: {}", scenario.spec.name))?;
    }
    Ok(())
}

/// Check that every insert worker's identifier range fits in `u64`
pub fn validate_write_offsets(spec: &ScenarioSpec, base: u64) -> Result<()> {
    if spec.traffic == TrafficMix::Search {
        return Ok(());
    }
    let span = spec.operations_per_worker().checked_mul(spec.workers as u64);
    if span.and_then(|span| base.checked_add(span)).is_none() {
        anyhow::bail!(
            "write_offset_base {} leaves no room for {} records of {} workers",
            base,
            spec.operations_per_worker(),
            spec.workers
        );
    }
    Ok(())
}

/// Validate a concrete scenario
pub fn validate_spec(spec: &ScenarioSpec) -> Result<()> {
    if spec.workers == 0 {
        anyhow::bail!("workers must be at least 1");
    }
    if spec.batch_size == 0 {
        anyhow::bail!("batch_size must be at least 1");
    }
    if spec.total_operations < spec.workers as u64 {
        anyhow::bail!(
            "total_operations ({}) must be at least the number of workers ({})",
            spec.total_operations,
            spec.workers
        );
    }
    if spec.traffic == TrafficMix::Split && spec.workers < 2 {
        anyhow::bail!("split traffic needs at least 2 workers, got {}", spec.workers);
    }
    Ok(())
}
