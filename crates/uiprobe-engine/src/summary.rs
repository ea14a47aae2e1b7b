#![forbid(unsafe_code)]

//! Run records and machine-readable summaries.
//!
//! Every finished test leaves one [`TestRecord`]; a [`RunSummary`] rolls
//! them up and can serialize the whole run as JSON lines, one record per
//! line, for CI log scraping.

use serde::Serialize;

use crate::error::TestError;
use crate::sched::{LogEntry, TestStatus};

/// Outcome of one finished test run.
#[derive(Debug, Clone, Serialize)]
pub struct TestRecord {
    /// Registration group.
    pub group: String,
    /// Test name.
    pub name: String,
    /// Terminal status.
    pub status: TestStatus,
    /// Frames the run consumed, warm-up included.
    pub frames: u64,
    /// First recorded failure, rendered for humans.
    pub error: Option<String>,
    /// The run's own log.
    pub log: Vec<LogEntry>,
}

impl TestRecord {
    pub(crate) fn new(
        group: &str,
        name: &str,
        status: TestStatus,
        frames: u64,
        error: Option<&TestError>,
        log: Vec<LogEntry>,
    ) -> Self {
        Self {
            group: group.to_owned(),
            name: name.to_owned(),
            status,
            frames,
            error: error.map(ToString::to_string),
            log,
        }
    }

    /// Whether the run ended in success.
    #[must_use]
    pub fn passed(&self) -> bool {
        self.status == TestStatus::Success
    }
}

/// Rollup of a batch of finished runs.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    /// Runs that finished.
    pub total: usize,
    /// Runs that ended in `Success`.
    pub passed: usize,
    /// Runs that ended in `Error`.
    pub failed: usize,
    /// Total frames consumed across all runs.
    pub frames: u64,
    /// Names of the failing tests, in run order.
    pub failing: Vec<String>,
}

impl RunSummary {
    /// Roll up a slice of records.
    #[must_use]
    pub fn from_records(records: &[TestRecord]) -> Self {
        let passed = records.iter().filter(|r| r.passed()).count();
        Self {
            total: records.len(),
            passed,
            failed: records.len() - passed,
            frames: records.iter().map(|r| r.frames).sum(),
            failing: records
                .iter()
                .filter(|r| !r.passed())
                .map(|r| r.name.clone())
                .collect(),
        }
    }

    /// Whether every run passed.
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }
}

/// Render records as JSON lines: one object per record, summary last.
pub fn to_jsonl(records: &[TestRecord]) -> Result<String, serde_json::Error> {
    let mut out = String::new();
    for record in records {
        out.push_str(&serde_json::to_string(record)?);
        out.push('\n');
    }
    out.push_str(&serde_json::to_string(&RunSummary::from_records(records))?);
    out.push('\n');
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, status: TestStatus, frames: u64) -> TestRecord {
        TestRecord::new("suite", name, status, frames, None, Vec::new())
    }

    #[test]
    fn rollup_counts_pass_and_fail() {
        let records = [
            record("a", TestStatus::Success, 10),
            record("b", TestStatus::Error, 7),
            record("c", TestStatus::Success, 3),
        ];
        let summary = RunSummary::from_records(&records);
        assert_eq!(summary.total, 3);
        assert_eq!(summary.passed, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.frames, 20);
        assert_eq!(summary.failing, vec!["b".to_owned()]);
        assert!(!summary.all_passed());
    }

    #[test]
    fn jsonl_has_one_line_per_record_plus_summary() {
        let records = [record("a", TestStatus::Success, 1)];
        let jsonl = to_jsonl(&records).unwrap();
        let lines: Vec<&str> = jsonl.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("\"name\":\"a\""));
        assert!(lines[0].contains("\"status\":\"success\""));
        assert!(lines[1].contains("\"total\":1"));
    }
}
