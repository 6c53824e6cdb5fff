//! JSON-lines export
//!
//! Each finished scenario becomes one JSON object on its own line:
//!
//! ```json
//! {"name":"Read Only Bulk 10","started_at":"2024-05-01T12:00:00Z","elapsed_seconds":2.0,"read_operations":1000,"write_operations":0,"throughput":500.0,"workers":50,"batch_size":10}
//! ```

use crate::error::HarnessResult;
use crate::runner::BenchmarkResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Serialized form of a [`BenchmarkResult`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub name: String,
    /// RFC 3339 wall-clock start
    pub started_at: DateTime<Utc>,
    pub elapsed_seconds: f64,
    pub read_operations: u64,
    pub write_operations: u64,
    /// Operations per second
    pub throughput: f64,
    pub workers: usize,
    pub batch_size: usize,
}

impl From<&BenchmarkResult> for ResultRecord {
    fn from(result: &BenchmarkResult) -> Self {
        Self {
            name: result.name.clone(),
            started_at: result.started_at,
            elapsed_seconds: result.elapsed_seconds(),
            read_operations: result.read_operations,
            write_operations: result.write_operations,
            throughput: result.throughput(),
            workers: result.workers,
            batch_size: result.batch_size,
        }
    }
}

/// JSON-lines result writer
#[derive(Debug)]
pub struct JsonLog {
    writer: BufWriter<File>,
}

impl JsonLog {
    /// Truncate `path` and start an empty log
    pub fn create(path: impl AsRef<Path>) -> HarnessResult<Self> {
        let file = File::create(path)?;
        Ok(Self {
            writer: BufWriter::new(file),
        })
    }

    /// Append one result line
    pub fn append(&mut self, result: &BenchmarkResult) -> HarnessResult<()> {
        serde_json::to_writer(&mut self.writer, &ResultRecord::from(result))
            .map_err(std::io::Error::from)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::result::tests::result;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_json_lines() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("results.jsonl");

        let mut log = JsonLog::create(&path).unwrap();
        log.append(&result("reads", 2_000, 1_000, 0)).unwrap();
        log.append(&result("writes", 1_000, 0, 300)).unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        let records: Vec<ResultRecord> = contents
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].name, "reads");
        assert_eq!(records[0].read_operations, 1_000);
        assert!((records[0].throughput - 500.0).abs() < 1e-6);
        assert!((records[0].elapsed_seconds - 2.0).abs() < 1e-9);
        assert_eq!(records[1].write_operations, 300);
        assert_eq!(records[1].workers, 4);
        assert_eq!(records[1].batch_size, 10);
    }

    #[test]
    fn test_started_at_is_rfc3339() {
        let result = result("stamp", 1, 0, 0);
        let value = serde_json::to_value(ResultRecord::from(&result)).unwrap();
        let stamp = value["started_at"].as_str().unwrap();
        assert!(DateTime::parse_from_rfc3339(stamp).is_ok());
    }
}
