//! Markdown result log
//!
//! The log is a markdown table with one row per scenario:
//!
//! ```text
//! | Benchmark | Execution Time | Read Ops | Write Ops | Throughput |
//! | --- | --- | --- | --- | ---: |
//! | Read Only Bulk 10 | 2.000 s | 1,000 op | 0 op | 500.00 op/s |
//! ```
//!
//! The file is truncated when the log is created, so each program run starts
//! a fresh table. [`ResultLogs`] creates every log a suite writes to before
//! the first scenario runs.

use crate::error::HarnessResult;
use crate::runner::BenchmarkResult;
use crate::util::number::{format_decimal, format_number};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Header rows of the result table
pub const HEADER: &str = "| Benchmark | Execution Time | Read Ops | Write Ops | Throughput |\n\
                          | --- | --- | --- | --- | ---: |\n";

/// Append-only markdown table of benchmark results
#[derive(Debug)]
pub struct ResultLog {
    path: PathBuf,
    file: File,
}

impl ResultLog {
    /// Truncate `path` and write the table header
    pub fn create(path: impl AsRef<Path>) -> HarnessResult<Self> {
        let path = path.as_ref().to_path_buf();
        let mut file = File::create(&path)?;
        file.write_all(HEADER.as_bytes())?;
        file.flush()?;
        Ok(Self { path, file })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one result row
    pub fn append(&mut self, result: &BenchmarkResult) -> HarnessResult<()> {
        writeln!(self.file, "{}", format_row(result))?;
        self.file.flush()?;
        Ok(())
    }
}

/// One [`ResultLog`] per distinct path
#[derive(Debug, Default)]
pub struct ResultLogs {
    logs: BTreeMap<PathBuf, ResultLog>,
}

impl ResultLogs {
    /// Truncate every distinct path up front
    ///
    /// Fails on the first path that cannot be created.
    pub fn create<'a>(paths: impl IntoIterator<Item = &'a Path>) -> HarnessResult<Self> {
        let mut logs = BTreeMap::new();
        for path in paths {
            if !logs.contains_key(path) {
                logs.insert(path.to_path_buf(), ResultLog::create(path)?);
            }
        }
        Ok(Self { logs })
    }

    pub fn get_mut(&mut self, path: &Path) -> Option<&mut ResultLog> {
        self.logs.get_mut(path)
    }

    pub fn len(&self) -> usize {
        self.logs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.logs.is_empty()
    }
}

/// Table row for one result, without the trailing newline
pub fn format_row(result: &BenchmarkResult) -> String {
    format!(
        "| {} | {} s | {} op | {} op | {} op/s |",
        result.name,
        format_decimal(result.elapsed_seconds(), 3),
        format_number(result.read_operations),
        format_number(result.write_operations),
        format_decimal(result.throughput(), 2),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::result::tests::result;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_format_row() {
        let row = format_row(&result("Read Only Bulk 10", 2_000, 1_000, 0));
        assert_eq!(row, "| Read Only Bulk 10 | 2.000 s | 1,000 op | 0 op | 500.00 op/s |");
    }

    #[test]
    fn test_format_row_groups_large_values() {
        let row = format_row(&result("Write Only Bulk 1", 1_000, 0, 5_400_000));
        assert_eq!(
            row,
            "| Write Only Bulk 1 | 1.000 s | 0 op | 5,400,000 op | 5,400,000.00 op/s |"
        );
    }

    #[test]
    fn test_log_header_once_then_rows() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("BENCHMARKS.md");

        let mut log = ResultLog::create(&path).unwrap();
        log.append(&result("first", 2_000, 1_000, 0)).unwrap();
        log.append(&result("second", 1_000, 10, 10)).unwrap();
        assert_eq!(log.path(), path.as_path());

        let contents = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "| Benchmark | Execution Time | Read Ops | Write Ops | Throughput |");
        assert_eq!(lines[1], "| --- | --- | --- | --- | ---: |");
        assert!(lines[2].starts_with("| first |"));
        assert!(lines[3].starts_with("| second |"));
    }

    #[test]
    fn test_create_truncates_previous_run() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("results.md");
        fs::write(&path, "stale contents\n").unwrap();

        ResultLog::create(&path).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), HEADER);
    }

    #[test]
    fn test_logs_truncated_before_any_row() {
        let dir = TempDir::new().unwrap();
        let first = dir.path().join("STREAM_BENCHMARKS.md");
        let second = dir.path().join("STREAM_THREADING_BENCHMARKS.md");
        fs::write(&first, "stale first\n").unwrap();
        fs::write(&second, "stale second\n").unwrap();

        let paths = [first.as_path(), second.as_path(), first.as_path()];
        let mut logs = ResultLogs::create(paths).unwrap();
        assert_eq!(logs.len(), 2);

        // The second file is fresh even though nothing was written to it yet
        assert_eq!(fs::read_to_string(&second).unwrap(), HEADER);

        logs.get_mut(&first)
            .unwrap()
            .append(&result("row", 1_000, 1, 1))
            .unwrap();
        assert_eq!(fs::read_to_string(&first).unwrap().lines().count(), 3);
        assert!(logs.get_mut(&dir.path().join("other.md")).is_none());
    }

    #[test]
    fn test_create_in_missing_directory_fails() {
        let dir = TempDir::new().unwrap();
        let err = ResultLog::create(dir.path().join("missing").join("results.md")).unwrap_err();
        assert!(matches!(err, crate::HarnessError::Io(_)));
    }
}
