// starlift-core/src/domain/quality/mod.rs

pub mod report;

use serde::Serialize;
use thiserror::Error;

pub use report::{render_failures, render_summary};

/// One declarative check in the quality suite.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum CheckSpec {
    /// Issues `COUNT(*)` and fails only when no result row comes back at
    /// all (a connectivity-shaped failure). A legitimately empty table
    /// passes.
    RowCount { table: String },
    /// Fails when `null_count / total_count * 100 >= threshold`.
    /// Threshold is a percentage in `[0, 100)`, configured per column.
    NullRatio {
        table: String,
        column: String,
        threshold: f64,
    },
}

impl CheckSpec {
    pub fn kind(&self) -> &'static str {
        match self {
            CheckSpec::RowCount { .. } => "row_count_check",
            CheckSpec::NullRatio { .. } => "null_ratio_check",
        }
    }

    pub fn table(&self) -> &str {
        match self {
            CheckSpec::RowCount { table } => table,
            CheckSpec::NullRatio { table, .. } => table,
        }
    }
}

/// The outcome of one check. Immutable once produced.
#[derive(Debug, Clone, Serialize)]
pub struct CheckResult {
    pub check: &'static str,
    pub table: String,
    pub column: Option<String>,
    pub passed: bool,
    /// Human-readable one-liner for the summary blocks.
    pub summary: String,
    /// The measured value (row count, or percent null).
    pub metric: Option<f64>,
}

/// Every check result of one gate invocation, in declaration order.
///
/// Created fresh per invocation, consumed once to decide success and render
/// summaries, then discarded. Never persisted across runs.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    results: Vec<CheckResult>,
}

impl RunReport {
    pub(crate) fn push(&mut self, result: CheckResult) {
        self.results.push(result);
    }

    pub fn results(&self) -> &[CheckResult] {
        &self.results
    }

    pub fn any_failed(&self) -> bool {
        self.results.iter().any(|r| !r.passed)
    }

    pub fn failed_count(&self) -> usize {
        self.results.iter().filter(|r| !r.passed).count()
    }

    pub fn failures(&self) -> impl Iterator<Item = &CheckResult> {
        self.results.iter().filter(|r| !r.passed)
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

/// Terminal verdict of a failed gate: carries the full report so the
/// operator sees every check, not just the first failing one.
#[derive(Debug, Clone, Error)]
#[error("Quality gate failed: {} of {} checks failed", .report.failed_count(), .report.len())]
pub struct QualityFailure {
    pub report: RunReport,
}
