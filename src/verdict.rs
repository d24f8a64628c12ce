//! Per-sample verdicts and the attempt scoreboard

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use crate::runner::RunOutcome;

/// Outcome of comparing one sample's actual output to its expected output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Pass,
    Fail,
    /// No expected output to compare against; the run still happened
    Indeterminate,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Verdict::Pass => "pass",
            Verdict::Fail => "fail",
            Verdict::Indeterminate => "indeterminate",
        };
        write!(f, "{}", s)
    }
}

/// One (input, expected-output) pair discovered in the sample directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleCase {
    /// Sample input file; always exists
    pub input: PathBuf,
    /// Expected output file, when one was found next to the input
    pub expected: Option<PathBuf>,
}

impl SampleCase {
    /// File name of the input, for display
    pub fn input_name(&self) -> String {
        self.input
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// One evaluated sample in a report
#[derive(Debug)]
pub struct SampleResult {
    pub case: SampleCase,
    pub outcome: RunOutcome,
    pub verdict: Verdict,
}

/// Ordered scoreboard for one solution attempt
#[derive(Debug, Default)]
pub struct TestReport {
    pub results: Vec<SampleResult>,
    pub passed: usize,
    pub total: usize,
}

impl TestReport {
    pub fn new(total: usize) -> Self {
        Self {
            results: Vec::with_capacity(total),
            passed: 0,
            total,
        }
    }

    pub fn record(&mut self, case: SampleCase, outcome: RunOutcome, verdict: Verdict) {
        if verdict == Verdict::Pass {
            self.passed += 1;
        }
        self.results.push(SampleResult {
            case,
            outcome,
            verdict,
        });
    }

    /// All samples passed and there was at least one
    pub fn is_submit_ready(&self) -> bool {
        self.total > 0 && self.passed == self.total
    }
}
