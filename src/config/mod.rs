//! Configuration module
//!
//! Handles CLI argument parsing, TOML suite files, and validation.
//!
//! A suite file describes the target, the key space, the runner, where results
//! go, and a list of scenarios. Scenarios may sweep over batch sizes and worker
//! counts; [`Config::plan`] expands every combination into a concrete
//! [`ScenarioSpec`]. A file without scenarios runs one of the built-in suites
//! selected by `suite`.
//!
//! ```toml
//! [sampler]
//! element_count = 5000000
//! skew = 0.9
//!
//! [[scenarios]]
//! name = "Read Only Bulk {batch}"
//! batch_sizes = [1, 10, 100, 1000]
//! policy = "duplex"
//! ```

pub mod cli;
pub mod toml;
pub mod validator;

use crate::runner::{ScenarioSpec, TrafficMix};
use crate::session::Policy;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Workers per scenario when a scenario does not say
pub const DEFAULT_WORKERS: usize = 50;

/// Operations per scenario when a scenario does not say
pub const DEFAULT_TOTAL_OPERATIONS: u64 = 5_400_000;

/// Batch sizes swept by the built-in suite
pub const DEFAULT_BATCH_SIZES: [usize; 4] = [1, 10, 100, 1000];

/// Bulk batch sizes of the single-stream suite
pub const STREAM_BATCH_SIZES: [usize; 3] = [10, 100, 1000];

/// Largest worker count of the single-stream threading sweep
pub const STREAM_MAX_THREADS: usize = 16;

/// Complete benchmark suite configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub target: TargetConfig,
    #[serde(default)]
    pub sampler: SamplerConfig,
    #[serde(default)]
    pub runner: RunnerConfig,
    #[serde(default)]
    pub output: OutputConfig,
    /// Untimed seeding before the first scenario
    pub preload: Option<PreloadConfig>,
    /// Built-in suite run when `scenarios` is empty
    #[serde(default)]
    pub suite: SuiteKind,
    #[serde(default)]
    pub scenarios: Vec<ScenarioConfig>,
}

/// Built-in scenario suites
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum SuiteKind {
    /// Mixed, read-only, write-only and split traffic at 50 workers
    #[default]
    Cloud,
    /// Single-stream policies per batch size, then a 1..16 worker sweep
    Stream,
}

impl fmt::Display for SuiteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SuiteKind::Cloud => write!(f, "cloud"),
            SuiteKind::Stream => write!(f, "stream"),
        }
    }
}

/// Store under test
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TargetConfig {
    #[serde(default)]
    pub kind: TargetKind,
    /// Simulated per-batch latency in microseconds
    #[serde(default)]
    pub latency_us: u64,
}

/// Kind of store the CLI can drive
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetKind {
    /// In-process echo store
    #[default]
    Loopback,
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetKind::Loopback => write!(f, "loopback"),
        }
    }
}

/// Zipfian key space
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SamplerConfig {
    #[serde(default = "default_element_count")]
    pub element_count: u64,
    #[serde(default = "default_skew")]
    pub skew: f64,
    /// Fixed base seed for reproducible key sequences
    pub seed: Option<u64>,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            element_count: default_element_count(),
            skew: default_skew(),
            seed: None,
        }
    }
}

fn default_element_count() -> u64 {
    5_000_000
}

fn default_skew() -> f64 {
    0.9
}

/// Worker pool and measurement settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunnerConfig {
    #[serde(default = "default_pool_capacity")]
    pub pool_capacity: usize,
    /// Pause before releasing the start latch, in milliseconds
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,
    /// First identifier for inserted records; defaults to `element_count`
    pub write_offset_base: Option<u64>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            pool_capacity: default_pool_capacity(),
            settle_ms: default_settle_ms(),
            write_offset_base: None,
        }
    }
}

fn default_pool_capacity() -> usize {
    DEFAULT_WORKERS
}

fn default_settle_ms() -> u64 {
    200
}

/// Result files
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    /// Markdown result log shared by scenarios without their own file
    #[serde(default = "default_results_file")]
    pub results_file: PathBuf,
    /// Optional JSON-lines export
    pub json_file: Option<PathBuf>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            results_file: default_results_file(),
            json_file: None,
        }
    }
}

fn default_results_file() -> PathBuf {
    PathBuf::from("BENCHMARKS.md")
}

/// Records written before the first scenario
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PreloadConfig {
    pub records: u64,
    #[serde(default = "default_preload_batch")]
    pub batch_size: usize,
}

fn default_preload_batch() -> usize {
    1000
}

/// One `[[scenarios]]` entry, possibly a sweep
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioConfig {
    /// May contain `{batch}` and `{workers}` placeholders
    pub name: String,
    pub workers: Option<usize>,
    /// Sweep over worker counts; overrides `workers`
    #[serde(default)]
    pub worker_counts: Vec<usize>,
    pub total_operations: Option<u64>,
    /// Operations per worker; the total scales with the worker count
    pub operations_per_worker: Option<u64>,
    pub batch_size: Option<usize>,
    /// Sweep over batch sizes; overrides `batch_size`
    #[serde(default)]
    pub batch_sizes: Vec<usize>,
    #[serde(default)]
    pub policy: Policy,
    #[serde(default)]
    pub traffic: TrafficMix,
    pub insert_policy: Option<Policy>,
    /// Result log for this scenario; defaults to `output.results_file`
    pub results_file: Option<PathBuf>,
}

impl ScenarioConfig {
    fn new(name: &str, policy: Policy, traffic: TrafficMix) -> Self {
        Self {
            name: name.to_string(),
            workers: None,
            worker_counts: Vec::new(),
            total_operations: None,
            operations_per_worker: None,
            batch_size: None,
            batch_sizes: Vec::new(),
            policy,
            traffic,
            insert_policy: None,
            results_file: None,
        }
    }

    fn worker_list(&self) -> Vec<usize> {
        if self.worker_counts.is_empty() {
            vec![self.workers.unwrap_or(DEFAULT_WORKERS)]
        } else {
            self.worker_counts.clone()
        }
    }

    fn batch_list(&self) -> Vec<usize> {
        if self.batch_sizes.is_empty() {
            vec![self.batch_size.unwrap_or(1)]
        } else {
            self.batch_sizes.clone()
        }
    }
}

/// Overrides applied to every scenario after expansion
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScenarioOverrides {
    pub workers: Option<usize>,
    pub total_operations: Option<u64>,
    /// Keep only scenarios whose name contains this text (case-insensitive)
    pub name_filter: Option<String>,
}

/// A concrete scenario plus the log it is written to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedScenario {
    pub spec: ScenarioSpec,
    pub results_file: PathBuf,
}

impl Config {
    /// First identifier handed to insert workers
    pub fn write_offset_base(&self) -> u64 {
        self.runner.write_offset_base.unwrap_or(self.sampler.element_count)
    }

    /// Cloud suite
    ///
    /// A 50:50 read/write split, then for each batch size of
    /// [`DEFAULT_BATCH_SIZES`] a read-only, a write-only and a split run.
    pub fn default_scenarios() -> Vec<ScenarioConfig> {
        let general = ScenarioConfig {
            insert_policy: Some(Policy::WriteOnly),
            ..ScenarioConfig::new("General Read:Write 50:50", Policy::Duplex, TrafficMix::Split)
        };

        let mut scenarios = vec![general];
        for batch in DEFAULT_BATCH_SIZES {
            let read_only =
                ScenarioConfig::new("Read Only Bulk {batch}", Policy::Duplex, TrafficMix::Search);
            let write_only = ScenarioConfig::new(
                "Write Only Bulk {batch}",
                Policy::WriteOnly,
                TrafficMix::Insert,
            );
            let dual = ScenarioConfig {
                insert_policy: Some(Policy::WriteOnly),
                ..ScenarioConfig::new(
                    "Dual Message Bulk {batch}",
                    Policy::Duplex,
                    TrafficMix::Split,
                )
            };
            for scenario in [read_only, write_only, dual] {
                scenarios.push(ScenarioConfig {
                    batch_size: Some(batch),
                    ..scenario
                });
            }
        }
        scenarios
    }

    /// Single-stream suite
    ///
    /// One search stream per scenario: read-all, alternate and no-response
    /// runs at batch 1 with a tenth of the operations, then at each of
    /// [`STREAM_BATCH_SIZES`]. Ends with a threading sweep of read-all streams
    /// from 1 to [`STREAM_MAX_THREADS`] workers, each doing a tenth of the
    /// operations. The two groups log to separate files.
    pub fn stream_scenarios() -> Vec<ScenarioConfig> {
        let single = |name: &str, policy: Policy, batch: usize, total: u64| ScenarioConfig {
            workers: Some(1),
            total_operations: Some(total),
            batch_size: Some(batch),
            results_file: Some(PathBuf::from("STREAM_BENCHMARKS.md")),
            ..ScenarioConfig::new(name, policy, TrafficMix::Search)
        };
        let group = |batch: usize, total: u64| {
            [
                ("Send All Receive All - Batch {batch}", Policy::WriteAllReadAll),
                ("Alternate Send Receive - Batch {batch}", Policy::Alternate),
                ("Send All No Response - Batch {batch}", Policy::WriteOnly),
            ]
            .map(|(name, policy)| single(name, policy, batch, total))
        };

        let mut scenarios = group(1, DEFAULT_TOTAL_OPERATIONS / 10).to_vec();
        for batch in STREAM_BATCH_SIZES {
            scenarios.extend(group(batch, DEFAULT_TOTAL_OPERATIONS));
        }
        scenarios.push(ScenarioConfig {
            worker_counts: (1..=STREAM_MAX_THREADS).collect(),
            operations_per_worker: Some(DEFAULT_TOTAL_OPERATIONS / 10),
            results_file: Some(PathBuf::from("STREAM_THREADING_BENCHMARKS.md")),
            ..ScenarioConfig::new(
                "Single Read All Write All - {workers} thread(s)",
                Policy::WriteAllReadAll,
                TrafficMix::Search,
            )
        });
        scenarios
    }

    /// Scenarios of the selected built-in suite
    pub fn builtin_scenarios(&self) -> Vec<ScenarioConfig> {
        match self.suite {
            SuiteKind::Cloud => Self::default_scenarios(),
            SuiteKind::Stream => Self::stream_scenarios(),
        }
    }

    /// Expand sweeps into concrete scenarios in file order
    pub fn plan(&self, overrides: &ScenarioOverrides) -> Vec<PlannedScenario> {
        let builtin;
        let scenarios = if self.scenarios.is_empty() {
            builtin = self.builtin_scenarios();
            &builtin
        } else {
            &self.scenarios
        };

        let filter = overrides.name_filter.as_ref().map(|f| f.to_lowercase());
        let mut planned = Vec::new();
        for scenario in scenarios {
            let worker_list = match overrides.workers {
                Some(workers) => vec![workers],
                None => scenario.worker_list(),
            };
            for workers in worker_list {
                for batch in scenario.batch_list() {
                    let name = scenario
                        .name
                        .replace("{batch}", &batch.to_string())
                        .replace("{workers}", &workers.to_string());
                    if let Some(filter) = &filter {
                        if !name.to_lowercase().contains(filter.as_str()) {
                            continue;
                        }
                    }

                    let per_worker_total = scenario
                        .operations_per_worker
                        .map(|ops| ops.saturating_mul(workers as u64));
                    let total_operations = overrides
                        .total_operations
                        .or(per_worker_total)
                        .or(scenario.total_operations)
                        .unwrap_or(DEFAULT_TOTAL_OPERATIONS);
                    let spec = ScenarioSpec {
                        name,
                        workers,
                        total_operations,
                        batch_size: batch,
                        policy: scenario.policy,
                        traffic: scenario.traffic,
                        insert_policy: scenario.insert_policy,
                    };
                    planned.push(PlannedScenario {
                        spec,
                        results_file: scenario
                            .results_file
                            .clone()
                            .unwrap_or_else(|| self.output.results_file.clone()),
                    });
                }
            }
        }
        planned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.target.kind, TargetKind::Loopback);
        assert_eq!(config.sampler.element_count, 5_000_000);
        assert_eq!(config.sampler.skew, 0.9);
        assert_eq!(config.runner.pool_capacity, 50);
        assert_eq!(config.runner.settle_ms, 200);
        assert_eq!(config.output.results_file, PathBuf::from("BENCHMARKS.md"));
        assert!(config.preload.is_none());
        assert_eq!(config.suite, SuiteKind::Cloud);
    }

    #[test]
    fn test_default_suite_order() {
        let planned = Config::default().plan(&ScenarioOverrides::default());
        let names: Vec<&str> = planned.iter().map(|p| p.spec.name.as_str()).collect();

        assert_eq!(names.len(), 13);
        assert_eq!(names[0], "General Read:Write 50:50");
        assert_eq!(
            &names[1..4],
            &["Read Only Bulk 1", "Write Only Bulk 1", "Dual Message Bulk 1"]
        );
        assert_eq!(names[12], "Dual Message Bulk 1000");

        assert!(planned.iter().all(|p| p.spec.workers == 50));
        assert!(planned.iter().all(|p| p.spec.total_operations == 5_400_000));
        assert!(planned.iter().all(|p| p.results_file == PathBuf::from("BENCHMARKS.md")));

        let write_only = &planned[2].spec;
        assert_eq!(write_only.traffic, TrafficMix::Insert);
        assert_eq!(write_only.policy, Policy::WriteOnly);
        assert_eq!(planned[3].spec.insert_policy, Some(Policy::WriteOnly));
    }

    #[test]
    fn test_stream_suite_order() {
        let config = Config {
            suite: SuiteKind::Stream,
            ..Default::default()
        };
        let planned = config.plan(&ScenarioOverrides::default());
        let names: Vec<&str> = planned.iter().map(|p| p.spec.name.as_str()).collect();

        assert_eq!(names.len(), 12 + STREAM_MAX_THREADS);
        assert_eq!(
            &names[..3],
            &[
                "Send All Receive All - Batch 1",
                "Alternate Send Receive - Batch 1",
                "Send All No Response - Batch 1",
            ]
        );
        assert_eq!(names[11], "Send All No Response - Batch 1000");
        assert_eq!(names[12], "Single Read All Write All - 1 thread(s)");
        assert_eq!(names[27], "Single Read All Write All - 16 thread(s)");

        let policies: Vec<Policy> = planned[..3].iter().map(|p| p.spec.policy).collect();
        assert_eq!(policies, vec![Policy::WriteAllReadAll, Policy::Alternate, Policy::WriteOnly]);

        let single = &planned[..12];
        assert!(single.iter().all(|p| p.spec.workers == 1));
        assert!(single.iter().all(|p| p.spec.traffic == TrafficMix::Search));
        assert!(single.iter().all(|p| p.results_file == PathBuf::from("STREAM_BENCHMARKS.md")));
        assert_eq!(planned[0].spec.total_operations, 540_000);
        assert_eq!(planned[3].spec.batch_size, 10);
        assert_eq!(planned[3].spec.total_operations, 5_400_000);

        let threads = &planned[12..];
        for (index, scenario) in threads.iter().enumerate() {
            assert_eq!(scenario.spec.workers, index + 1);
            assert_eq!(scenario.spec.operations_per_worker(), 540_000);
            assert_eq!(scenario.spec.batch_size, 1);
            assert_eq!(scenario.results_file, PathBuf::from("STREAM_THREADING_BENCHMARKS.md"));
        }
    }

    #[test]
    fn test_stream_suite_ignored_with_explicit_scenarios() {
        let config = Config {
            suite: SuiteKind::Stream,
            scenarios: vec![ScenarioConfig::new("only", Policy::Alternate, TrafficMix::Search)],
            ..Default::default()
        };
        let planned = config.plan(&ScenarioOverrides::default());
        assert_eq!(planned.len(), 1);
        assert_eq!(planned[0].spec.name, "only");
    }

    #[test]
    fn test_sweep_expansion() {
        let config = Config {
            scenarios: vec![ScenarioConfig {
                worker_counts: vec![1, 2],
                batch_sizes: vec![10, 100],
                total_operations: Some(1_000),
                ..ScenarioConfig::new(
                    "Sweep {workers}w {batch}b",
                    Policy::Alternate,
                    TrafficMix::Search,
                )
            }],
            ..Default::default()
        };

        let planned = config.plan(&ScenarioOverrides::default());
        let names: Vec<&str> = planned.iter().map(|p| p.spec.name.as_str()).collect();
        assert_eq!(names, vec!["Sweep 1w 10b", "Sweep 1w 100b", "Sweep 2w 10b", "Sweep 2w 100b"]);
        assert_eq!(planned[3].spec.workers, 2);
        assert_eq!(planned[3].spec.batch_size, 100);
        assert_eq!(planned[3].spec.total_operations, 1_000);
    }

    #[test]
    fn test_overrides() {
        let overrides = ScenarioOverrides {
            workers: Some(4),
            total_operations: Some(400),
            name_filter: Some("read only".to_string()),
        };
        let planned = Config::default().plan(&overrides);

        assert_eq!(planned.len(), 4);
        assert!(planned.iter().all(|p| p.spec.name.starts_with("Read Only Bulk")));
        assert!(planned.iter().all(|p| p.spec.workers == 4 && p.spec.total_operations == 400));
    }

    #[test]
    fn test_operations_per_worker_scales_total() {
        let config = Config {
            scenarios: vec![ScenarioConfig {
                worker_counts: vec![1, 3],
                operations_per_worker: Some(100),
                ..ScenarioConfig::new("{workers}", Policy::WriteAllReadAll, TrafficMix::Search)
            }],
            ..Default::default()
        };

        let planned = config.plan(&ScenarioOverrides::default());
        assert_eq!(planned[0].spec.total_operations, 100);
        assert_eq!(planned[1].spec.total_operations, 300);

        // A command-line total still wins
        let overrides = ScenarioOverrides {
            total_operations: Some(30),
            ..Default::default()
        };
        let planned = config.plan(&overrides);
        assert!(planned.iter().all(|p| p.spec.total_operations == 30));
    }

    #[test]
    fn test_scenario_results_file_override() {
        let config = Config {
            scenarios: vec![ScenarioConfig {
                results_file: Some(PathBuf::from("THREADING.md")),
                ..ScenarioConfig::new("threads", Policy::Alternate, TrafficMix::Search)
            }],
            ..Default::default()
        };
        let planned = config.plan(&ScenarioOverrides::default());
        assert_eq!(planned[0].results_file, PathBuf::from("THREADING.md"));
        assert_eq!(planned[0].spec.batch_size, 1);
    }
}
