// starlift-core/src/application/quality.rs

use tracing::info;

use crate::domain::quality::{CheckResult, CheckSpec, QualityFailure, RunReport};
use crate::ports::executor::{QueryExecutor, Row};

/// Run every check in the suite and collect the results in declaration
/// order.
///
/// Checks are independent: a failing (or erroring) check never short-circuits
/// the rest of the suite, because the operator needs full-suite visibility to
/// diagnose a bad run. Executor errors are therefore folded into failed
/// results instead of propagating.
pub async fn run_suite(suite: &[CheckSpec], executor: &dyn QueryExecutor) -> RunReport {
    let mut report = RunReport::default();

    for spec in suite {
        info!(check = spec.kind(), table = spec.table(), "Running quality check");
        let result = match spec {
            CheckSpec::RowCount { table } => row_count_check(table, executor).await,
            CheckSpec::NullRatio {
                table,
                column,
                threshold,
            } => null_ratio_check(table, column, *threshold, executor).await,
        };
        report.push(result);
    }

    report
}

/// The run verdict: success iff nothing in the report failed.
pub fn decide(report: &RunReport) -> Result<(), QualityFailure> {
    if report.any_failed() {
        Err(QualityFailure {
            report: report.clone(),
        })
    } else {
        Ok(())
    }
}

async fn row_count_check(table: &str, executor: &dyn QueryExecutor) -> CheckResult {
    let outcome = executor
        .query(&format!("SELECT COUNT(*) FROM {table}"))
        .await;

    let (passed, summary, metric) = match outcome {
        // A count of zero still passes: a legitimately empty table the
        // transformation correctly produced is not a failure of this check.
        Ok(rows) => match first_scalar(&rows) {
            Some(count) => (
                true,
                format!("Row count check on table {table} passed with {count} records"),
                Some(count as f64),
            ),
            None => (
                false,
                format!("Row count check failed: {table} returned no results"),
                None,
            ),
        },
        Err(e) => (
            false,
            format!("Row count check failed: {table} could not be queried ({e})"),
            None,
        ),
    };

    CheckResult {
        check: "row_count_check",
        table: table.to_string(),
        column: None,
        passed,
        summary,
        metric,
    }
}

async fn null_ratio_check(
    table: &str,
    column: &str,
    threshold: f64,
    executor: &dyn QueryExecutor,
) -> CheckResult {
    let null_count = scalar_count(
        executor,
        &format!("SELECT COUNT(*) FROM {table} WHERE {column} IS NULL"),
    )
    .await;
    let total_count = scalar_count(executor, &format!("SELECT COUNT(*) FROM {table}")).await;

    let (passed, summary, metric) = match (null_count, total_count) {
        (Some(_), Some(0)) => (
            false,
            format!("Null ratio check failed: {table} is empty, ratio for {column} is undefined"),
            None,
        ),
        (Some(nulls), Some(total)) => {
            let pct_null = nulls as f64 / total as f64 * 100.0;
            // Boundary included: exactly the threshold fails.
            let passed = pct_null < threshold;
            let summary = if passed {
                format!(
                    "Null ratio check on column {column} in table {table} passed with {:.2}% of records populated",
                    100.0 - pct_null
                )
            } else {
                format!(
                    "Null ratio check on column {column} in table {table} failed: {pct_null:.2}% null (threshold {threshold}%)"
                )
            };
            (passed, summary, Some(pct_null))
        }
        _ => (
            false,
            format!("Null ratio check failed: {table}.{column} could not be counted"),
            None,
        ),
    };

    CheckResult {
        check: "null_ratio_check",
        table: table.to_string(),
        column: Some(column.to_string()),
        passed,
        summary,
        metric,
    }
}

fn first_scalar(rows: &[Row]) -> Option<i64> {
    rows.first()?.first()?.as_i64()
}

async fn scalar_count(executor: &dyn QueryExecutor, sql: &str) -> Option<i64> {
    match executor.query(sql).await {
        Ok(rows) => first_scalar(&rows),
        Err(_) => None,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::{HashMap, HashSet};
    use std::sync::{Arc, Mutex};

    use crate::error::StarliftError;
    use crate::ports::executor::ScalarValue;

    // --- MOCK EXECUTOR ---
    // Answers each exact SQL string with canned rows; listed statements fail
    // outright (simulated connectivity fault).
    #[derive(Default)]
    struct MockExecutor {
        pub executed: Arc<Mutex<Vec<String>>>,
        pub counts: HashMap<String, i64>,
        pub fail_on: HashSet<String>,
    }

    impl MockExecutor {
        fn with_count(mut self, sql: &str, count: i64) -> Self {
            self.counts.insert(sql.to_string(), count);
            self
        }

        fn failing_on(mut self, sql: &str) -> Self {
            self.fail_on.insert(sql.to_string());
            self
        }
    }

    #[async_trait]
    impl QueryExecutor for MockExecutor {
        async fn query(&self, sql: &str) -> Result<Vec<Row>, StarliftError> {
            self.executed.lock().unwrap().push(sql.to_string());
            if self.fail_on.contains(sql) {
                return Err(StarliftError::Internal("connection reset".into()));
            }
            match self.counts.get(sql) {
                Some(count) => Ok(vec![vec![ScalarValue::Int(*count)]]),
                None => Ok(vec![]),
            }
        }
    }

    fn orders_suite(threshold: f64) -> Vec<CheckSpec> {
        vec![
            CheckSpec::RowCount {
                table: "orders".into(),
            },
            CheckSpec::NullRatio {
                table: "orders".into(),
                column: "customer_id".into(),
                threshold,
            },
        ]
    }

    #[tokio::test]
    async fn test_suite_fails_at_12_percent_null_with_threshold_10() {
        let executor = MockExecutor::default()
            .with_count("SELECT COUNT(*) FROM orders", 100)
            .with_count(
                "SELECT COUNT(*) FROM orders WHERE customer_id IS NULL",
                12,
            );

        let report = run_suite(&orders_suite(10.0), &executor).await;

        assert_eq!(report.len(), 2);
        assert!(report.results()[0].passed, "100 rows came back");
        assert!(!report.results()[1].passed, "12.0% >= 10%");
        assert_eq!(report.results()[1].metric, Some(12.0));
        assert!(report.any_failed());
        assert!(decide(&report).is_err());
    }

    #[tokio::test]
    async fn test_suite_passes_at_5_percent_null_with_threshold_10() {
        let executor = MockExecutor::default()
            .with_count("SELECT COUNT(*) FROM orders", 100)
            .with_count("SELECT COUNT(*) FROM orders WHERE customer_id IS NULL", 5);

        let report = run_suite(&orders_suite(10.0), &executor).await;

        assert_eq!(report.len(), 2);
        assert!(!report.any_failed());
        assert!(decide(&report).is_ok());
    }

    #[tokio::test]
    async fn test_null_ratio_boundary_equal_threshold_fails() {
        // Exactly 50% null at threshold 50 must fail.
        let executor = MockExecutor::default()
            .with_count("SELECT COUNT(*) FROM orders", 100)
            .with_count("SELECT COUNT(*) FROM orders WHERE customer_id IS NULL", 50);

        let suite = orders_suite(50.0);
        let report = run_suite(&suite[1..], &executor).await;

        assert!(!report.results()[0].passed);
        assert_eq!(report.results()[0].metric, Some(50.0));
    }

    #[tokio::test]
    async fn test_row_count_zero_rows_passes() {
        // An empty-but-successful result row (count = 0) is not a failure.
        let executor =
            MockExecutor::default().with_count("SELECT COUNT(*) FROM sparse_dim", 0);

        let suite = vec![CheckSpec::RowCount {
            table: "sparse_dim".into(),
        }];
        let report = run_suite(&suite, &executor).await;

        assert!(report.results()[0].passed);
        assert_eq!(report.results()[0].metric, Some(0.0));
    }

    #[tokio::test]
    async fn test_row_count_no_result_set_fails() {
        let executor = MockExecutor::default().failing_on("SELECT COUNT(*) FROM orders");

        let suite = vec![CheckSpec::RowCount {
            table: "orders".into(),
        }];
        let report = run_suite(&suite, &executor).await;

        assert!(!report.results()[0].passed);
    }

    #[tokio::test]
    async fn test_null_ratio_empty_table_reported_not_panicking() {
        let executor = MockExecutor::default()
            .with_count("SELECT COUNT(*) FROM orders", 0)
            .with_count("SELECT COUNT(*) FROM orders WHERE customer_id IS NULL", 0);

        let suite = orders_suite(10.0);
        let report = run_suite(&suite[1..], &executor).await;

        assert!(!report.results()[0].passed);
        assert!(report.results()[0].summary.contains("undefined"));
    }

    #[tokio::test]
    async fn test_failing_check_does_not_short_circuit() {
        // First check errors out; the second must still run.
        let executor = MockExecutor::default()
            .failing_on("SELECT COUNT(*) FROM orders")
            .with_count("SELECT COUNT(*) FROM users", 7);

        let suite = vec![
            CheckSpec::RowCount {
                table: "orders".into(),
            },
            CheckSpec::RowCount {
                table: "users".into(),
            },
        ];
        let report = run_suite(&suite, &executor).await;

        assert_eq!(report.len(), 2);
        assert!(!report.results()[0].passed);
        assert!(report.results()[1].passed);
    }

    #[tokio::test]
    async fn test_report_preserves_declaration_order() {
        let executor = MockExecutor::default()
            .with_count("SELECT COUNT(*) FROM a", 1)
            .with_count("SELECT COUNT(*) FROM c", 3)
            .failing_on("SELECT COUNT(*) FROM b");

        let suite = vec![
            CheckSpec::RowCount { table: "a".into() },
            CheckSpec::RowCount { table: "b".into() },
            CheckSpec::RowCount { table: "c".into() },
        ];
        let report = run_suite(&suite, &executor).await;

        let tables: Vec<&str> = report.results().iter().map(|r| r.table.as_str()).collect();
        assert_eq!(tables, vec!["a", "b", "c"]);
    }
}
