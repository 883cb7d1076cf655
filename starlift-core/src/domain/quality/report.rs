// starlift-core/src/domain/quality/report.rs

// Pure rendering over a RunReport value. The gate itself never accumulates
// display state; these functions are the only place summaries are built.

use super::{CheckResult, RunReport};

const BANNER: &str =
    "*******************************************************************************";

fn render_line(result: &CheckResult) -> String {
    let status = if result.passed { "PASS" } else { "FAIL" };
    format!("[{}] {}", status, result.summary)
}

fn render_block(title: &str, lines: Vec<String>) -> String {
    let mut out = String::new();
    out.push_str(BANNER);
    out.push('\n');
    out.push_str(&format!("**  {title}\n"));
    out.push_str(BANNER);
    out.push('\n');
    for line in lines {
        out.push_str(&line);
        out.push('\n');
    }
    out.push_str(BANNER);
    out
}

/// The "all results" block, in declaration order.
pub fn render_summary(report: &RunReport) -> String {
    let lines = report.results().iter().map(render_line).collect();
    render_block("DATA QUALITY CHECKS SUMMARY", lines)
}

/// The "failures only" block. Empty body when everything passed.
pub fn render_failures(report: &RunReport) -> String {
    let lines = report.failures().map(render_line).collect();
    render_block("FAILED CHECKS SUMMARY", lines)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(check: &'static str, table: &str, passed: bool, summary: &str) -> CheckResult {
        CheckResult {
            check,
            table: table.to_string(),
            column: None,
            passed,
            summary: summary.to_string(),
            metric: None,
        }
    }

    #[test]
    fn test_summary_keeps_declaration_order() {
        let mut report = RunReport::default();
        report.push(result("row_count_check", "users", false, "users empty"));
        report.push(result("row_count_check", "songs", true, "songs ok"));

        let rendered = render_summary(&report);
        let users_at = rendered.find("users empty").unwrap_or(usize::MAX);
        let songs_at = rendered.find("songs ok").unwrap_or(usize::MAX);
        assert!(users_at < songs_at, "results must not be regrouped by status");
        assert!(rendered.contains("[FAIL] users empty"));
        assert!(rendered.contains("[PASS] songs ok"));
    }

    #[test]
    fn test_failures_block_filters_passes() {
        let mut report = RunReport::default();
        report.push(result("row_count_check", "users", true, "users ok"));
        report.push(result("null_ratio_check", "songs", false, "songs too null"));

        let rendered = render_failures(&report);
        assert!(rendered.contains("songs too null"));
        assert!(!rendered.contains("users ok"));
    }
}
