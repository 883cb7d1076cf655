// starlift-core/src/application/stage.rs

use tracing::info;

use crate::domain::context::{RunContext, resolve_template};
use crate::domain::dataset::Dataset;
use crate::error::StarliftError;
use crate::ports::executor::QueryExecutor;

/// Copy externally-staged JSON records for one dataset into its staging
/// table.
///
/// The destination is cleared unconditionally first, so a retry after a
/// partial failure never double-inserts. Template resolution happens before
/// anything touches the warehouse: a missing placeholder issues no
/// statements at all.
pub async fn stage(
    dataset: &Dataset,
    auth_ref: &str,
    ctx: &RunContext,
    executor: &dyn QueryExecutor,
) -> Result<(), StarliftError> {
    let key = resolve_template(&dataset.key_template, ctx)?;
    let path = format!("s3://{}/{}", dataset.bucket, key);

    info!(table = %dataset.table, %path, "Staging dataset");

    executor
        .execute(&format!("DELETE FROM {}", dataset.table))
        .await
        .map_err(|e| StarliftError::Load {
            stage: "clear",
            table: dataset.table.clone(),
            source: Box::new(e),
        })?;

    let copy_sql = build_copy_statement(dataset, &path, auth_ref);
    executor
        .execute(&copy_sql)
        .await
        .map_err(|e| StarliftError::Load {
            stage: "copy",
            table: dataset.table.clone(),
            source: Box::new(e),
        })?;

    Ok(())
}

// Auth reference, format descriptor and options are passed through opaquely;
// the loader does not validate their contents.
fn build_copy_statement(dataset: &Dataset, path: &str, auth_ref: &str) -> String {
    let mut sql = format!(
        "COPY {} FROM '{}' IAM_ROLE '{}' FORMAT AS JSON '{}'",
        dataset.table,
        path,
        auth_ref,
        dataset.json_descriptor()
    );
    if let Some(options) = &dataset.options {
        sql.push(' ');
        sql.push_str(options);
    }
    sql
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use std::sync::{Arc, Mutex};

    use crate::ports::executor::Row;

    // --- MOCK EXECUTOR ---
    #[derive(Clone, Default)]
    struct MockExecutor {
        pub executed: Arc<Mutex<Vec<String>>>,
        pub fail_all: bool,
    }

    #[async_trait]
    impl QueryExecutor for MockExecutor {
        async fn query(&self, sql: &str) -> Result<Vec<Row>, StarliftError> {
            self.executed.lock().unwrap().push(sql.to_string());
            if self.fail_all {
                return Err(StarliftError::Internal("warehouse down".into()));
            }
            Ok(vec![])
        }
    }

    fn events_dataset() -> Dataset {
        Dataset {
            name: "events".into(),
            bucket: "data-lake".into(),
            key_template: "log_data/{run_date}".into(),
            table: "events_stage".into(),
            json_mapping: Some("s3://data-lake/log_json_path.json".into()),
            options: None,
        }
    }

    fn ctx() -> RunContext {
        RunContext::new(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
    }

    #[tokio::test]
    async fn test_stage_clears_then_copies() {
        let executor = MockExecutor::default();
        stage(&events_dataset(), "arn:etl-role", &ctx(), &executor)
            .await
            .unwrap();

        let queries = executor.executed.lock().unwrap();
        assert_eq!(queries.len(), 2);
        assert_eq!(queries[0], "DELETE FROM events_stage");
        assert_eq!(
            queries[1],
            "COPY events_stage FROM 's3://data-lake/log_data/2024-01-01' \
             IAM_ROLE 'arn:etl-role' FORMAT AS JSON 's3://data-lake/log_json_path.json'"
        );
    }

    #[tokio::test]
    async fn test_stage_auto_format_and_options() {
        let executor = MockExecutor::default();
        let dataset = Dataset {
            json_mapping: None,
            options: Some("TRUNCATECOLUMNS".into()),
            ..events_dataset()
        };
        stage(&dataset, "arn:etl-role", &ctx(), &executor)
            .await
            .unwrap();

        let queries = executor.executed.lock().unwrap();
        assert!(queries[1].contains("FORMAT AS JSON 'auto'"));
        assert!(queries[1].ends_with("TRUNCATECOLUMNS"));
    }

    #[tokio::test]
    async fn test_missing_placeholder_issues_no_statements() {
        let executor = MockExecutor::default();
        let dataset = Dataset {
            key_template: "log_data/{shard}".into(),
            ..events_dataset()
        };
        let result = stage(&dataset, "arn:etl-role", &ctx(), &executor).await;

        assert!(matches!(result, Err(StarliftError::Domain(_))));
        assert!(executor.executed.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_executor_failure_becomes_load_error() {
        let executor = MockExecutor {
            fail_all: true,
            ..Default::default()
        };
        let result = stage(&events_dataset(), "arn:etl-role", &ctx(), &executor).await;

        match result {
            Err(StarliftError::Load { stage, table, .. }) => {
                assert_eq!(stage, "clear");
                assert_eq!(table, "events_stage");
            }
            other => panic!("expected Load error, got {other:?}"),
        }
    }
}
