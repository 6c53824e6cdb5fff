//! Result output
//!
//! - **[`markdown`]**: the result log, one table row per scenario
//! - **[`json`]**: optional JSON-lines export for scripts
//!
//! Both writers truncate their file once when created and then append one
//! entry per finished scenario.

pub mod json;
pub mod markdown;

use crate::runner::BenchmarkResult;
use crate::util::number::{format_decimal, format_number};

/// One-line human summary printed after each scenario
pub fn summary_line(result: &BenchmarkResult) -> String {
    format!(
        "{}: {} s, {} reads, {} writes, {} op/s",
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

    #[test]
    fn test_summary_line() {
        let result = result("Read Only Bulk 10", 2_000, 1_000, 0);
        assert_eq!(
            summary_line(&result),
            "Read Only Bulk 10: 2.000 s, 1,000 reads, 0 writes, 500.00 op/s"
        );
    }
}
