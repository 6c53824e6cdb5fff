//! Scenario descriptions

use crate::channel::Traffic;
use crate::session::Policy;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How the workers of a scenario split between lookups and inserts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrafficMix {
    /// Every worker searches
    #[default]
    Search,
    /// Every worker inserts
    Insert,
    /// The first half of the workers search, the rest insert
    Split,
}

impl fmt::Display for TrafficMix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrafficMix::Search => write!(f, "search"),
            TrafficMix::Insert => write!(f, "insert"),
            TrafficMix::Split => write!(f, "split"),
        }
    }
}

/// One benchmark scenario
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenarioSpec {
    /// Label written to the result log
    pub name: String,
    pub workers: usize,
    /// Logical operations across all workers
    pub total_operations: u64,
    pub batch_size: usize,
    pub policy: Policy,
    pub traffic: TrafficMix,
    /// Policy for insert workers; defaults to `policy`
    pub insert_policy: Option<Policy>,
}

impl ScenarioSpec {
    /// Search-only scenario
    pub fn new(
        name: impl Into<String>,
        workers: usize,
        total_operations: u64,
        batch_size: usize,
        policy: Policy,
    ) -> Self {
        Self {
            name: name.into(),
            workers,
            total_operations,
            batch_size,
            policy,
            traffic: TrafficMix::Search,
            insert_policy: None,
        }
    }

    pub fn with_traffic(mut self, traffic: TrafficMix) -> Self {
        self.traffic = traffic;
        self
    }

    pub fn with_insert_policy(mut self, policy: Policy) -> Self {
        self.insert_policy = Some(policy);
        self
    }

    /// Operations each worker performs; the remainder of the division is dropped
    pub fn operations_per_worker(&self) -> u64 {
        if self.workers == 0 {
            0
        } else {
            self.total_operations / self.workers as u64
        }
    }

    /// Traffic carried by worker `worker`
    pub fn traffic_for(&self, worker: usize) -> Traffic {
        match self.traffic {
            TrafficMix::Search => Traffic::Search,
            TrafficMix::Insert => Traffic::Insert,
            TrafficMix::Split if worker < self.workers / 2 => Traffic::Search,
            TrafficMix::Split => Traffic::Insert,
        }
    }

    /// Policy used by a worker carrying `traffic`
    pub fn policy_for(&self, traffic: Traffic) -> Policy {
        match traffic {
            Traffic::Search => self.policy,
            Traffic::Insert => self.insert_policy.unwrap_or(self.policy),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operations_per_worker_truncates() {
        let spec = ScenarioSpec::new("s", 3, 100, 10, Policy::Alternate);
        assert_eq!(spec.operations_per_worker(), 33);

        let spec = ScenarioSpec::new("s", 0, 100, 10, Policy::Alternate);
        assert_eq!(spec.operations_per_worker(), 0);
    }

    #[test]
    fn test_split_assigns_halves() {
        let spec = ScenarioSpec::new("s", 6, 600, 1, Policy::Duplex)
            .with_traffic(TrafficMix::Split)
            .with_insert_policy(Policy::WriteOnly);

        let traffic: Vec<Traffic> = (0..6).map(|w| spec.traffic_for(w)).collect();
        assert_eq!(&traffic[..3], &[Traffic::Search; 3]);
        assert_eq!(&traffic[3..], &[Traffic::Insert; 3]);

        assert_eq!(spec.policy_for(Traffic::Search), Policy::Duplex);
        assert_eq!(spec.policy_for(Traffic::Insert), Policy::WriteOnly);
    }

    #[test]
    fn test_insert_policy_defaults_to_policy() {
        let spec =
            ScenarioSpec::new("s", 2, 2, 1, Policy::Alternate).with_traffic(TrafficMix::Insert);
        assert_eq!(spec.traffic_for(0), Traffic::Insert);
        assert_eq!(spec.policy_for(Traffic::Insert), Policy::Alternate);
    }
}
