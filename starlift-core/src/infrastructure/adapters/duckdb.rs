// starlift-core/src/infrastructure/adapters/duckdb.rs

use async_trait::async_trait;
use duckdb::{Config, Connection};
use std::sync::{Arc, Mutex};

// Hexagonal imports
use crate::error::StarliftError;
use crate::infrastructure::error::{DatabaseError, InfrastructureError};
use crate::ports::executor::{QueryExecutor, Row, ScalarValue};

/// DuckDB-backed executor for local runs and the demo project.
///
/// Statement access is serialized behind the mutex, which also gives each
/// task an isolated session view: no two statements overlap on the same
/// connection.
pub struct DuckDbExecutor {
    conn: Arc<Mutex<Connection>>,
}

impl DuckDbExecutor {
    pub fn new(db_path: &str) -> Result<Self, InfrastructureError> {
        let config = Config::default();

        let conn = if db_path == ":memory:" {
            Connection::open_in_memory_with_flags(config)?
        } else {
            Connection::open_with_flags(db_path, config)?
        };

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn lock_conn(&self) -> Result<std::sync::MutexGuard<'_, Connection>, StarliftError> {
        self.conn.lock().map_err(|_| {
            StarliftError::Infrastructure(InfrastructureError::Io(std::io::Error::other(
                "DuckDB Mutex Poisoned",
            )))
        })
    }
}

fn db_err(e: duckdb::Error) -> StarliftError {
    StarliftError::Infrastructure(InfrastructureError::Database(DatabaseError::DuckDB(e)))
}

// Typed fallback chain: counts come back as Int, ratios as Float, anything
// unconvertible degrades to Text and finally Null.
fn read_scalar(row: &duckdb::Row<'_>, idx: usize) -> ScalarValue {
    if let Ok(v) = row.get::<_, i64>(idx) {
        return ScalarValue::Int(v);
    }
    if let Ok(v) = row.get::<_, f64>(idx) {
        return ScalarValue::Float(v);
    }
    if let Ok(v) = row.get::<_, bool>(idx) {
        return ScalarValue::Bool(v);
    }
    if let Ok(v) = row.get::<_, String>(idx) {
        return ScalarValue::Text(v);
    }
    ScalarValue::Null
}

#[async_trait]
impl QueryExecutor for DuckDbExecutor {
    async fn query(&self, sql: &str) -> Result<Vec<Row>, StarliftError> {
        let conn = self.lock_conn()?;

        let mut stmt = conn.prepare(sql).map_err(db_err)?;
        let mut rows = stmt.query([]).map_err(db_err)?;

        let mut out: Vec<Row> = Vec::new();
        while let Some(row) = rows.next().map_err(db_err)? {
            let column_count = row.as_ref().column_count();
            let mut scalars = Vec::with_capacity(column_count);
            for idx in 0..column_count {
                scalars.push(read_scalar(row, idx));
            }
            out.push(scalars);
        }

        Ok(out)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use anyhow::Result;

    #[tokio::test]
    async fn test_duckdb_query_rows() -> Result<()> {
        let executor = DuckDbExecutor::new(":memory:")?;

        executor
            .execute("CREATE TABLE users (id INTEGER, name VARCHAR)")
            .await?;
        executor
            .execute("INSERT INTO users VALUES (1, 'jo'), (2, NULL)")
            .await?;

        let rows = executor.query("SELECT COUNT(*) FROM users").await?;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0][0].as_i64(), Some(2));

        let nulls = executor
            .query("SELECT COUNT(*) FROM users WHERE name IS NULL")
            .await?;
        assert_eq!(nulls[0][0].as_i64(), Some(1));
        Ok(())
    }

    #[tokio::test]
    async fn test_duckdb_empty_result_is_success() -> Result<()> {
        let executor = DuckDbExecutor::new(":memory:")?;
        executor.execute("CREATE TABLE t (x INTEGER)").await?;

        let rows = executor.query("SELECT x FROM t").await?;
        assert!(rows.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_duckdb_error() -> Result<()> {
        let executor = DuckDbExecutor::new(":memory:")?;
        // Invalid SQL
        let result = executor.execute("SELECT * FROM non_existent_table").await;
        let err = result.unwrap_err();
        // Engine failures stay eligible for the graph's retry policy.
        assert!(err.is_retryable());
        Ok(())
    }

    #[tokio::test]
    async fn test_replace_load_roundtrip() -> Result<()> {
        let executor = DuckDbExecutor::new(":memory:")?;
        executor
            .execute("CREATE TABLE events_stage (user_id INTEGER)")
            .await?;
        executor
            .execute("INSERT INTO events_stage VALUES (1), (2), (2)")
            .await?;
        executor.execute("CREATE TABLE users (user_id INTEGER)").await?;

        let spec = crate::domain::warehouse::LoadSpec {
            table: "users".into(),
            query: "SELECT DISTINCT user_id FROM events_stage".into(),
            mode: crate::domain::warehouse::LoadMode::Replace,
        };
        crate::application::load::load(&spec, &executor).await?;
        crate::application::load::load(&spec, &executor).await?;

        let rows = executor.query("SELECT COUNT(*) FROM users").await?;
        assert_eq!(rows[0][0].as_i64(), Some(2), "replace is idempotent");
        Ok(())
    }
}
