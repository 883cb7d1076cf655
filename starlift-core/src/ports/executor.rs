// starlift-core/src/ports/executor.rs

// This file defines what the pipeline needs from a warehouse, without knowing
// how it is done. The core only ever talks to this trait; DuckDB (or any
// other engine) plugs in behind it.

use crate::error::StarliftError;
use async_trait::async_trait;

/// A single typed scalar coming back from the warehouse.
#[derive(Debug, Clone, PartialEq)]
pub enum ScalarValue {
    Int(i64),
    Float(f64),
    Text(String),
    Bool(bool),
    Null,
}

impl ScalarValue {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ScalarValue::Int(v) => Some(*v),
            ScalarValue::Float(v) => Some(*v as i64),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ScalarValue::Int(v) => Some(*v as f64),
            ScalarValue::Float(v) => Some(*v),
            _ => None,
        }
    }
}

/// One result row, ordered like the statement's projection.
pub type Row = Vec<ScalarValue>;

#[async_trait]
pub trait QueryExecutor: Send + Sync {
    /// Run a statement and return its result rows.
    ///
    /// An empty `Vec` is a valid success (a query that matched nothing).
    /// A connectivity or engine failure comes back as an `Err`, never as an
    /// empty result set.
    async fn query(&self, sql: &str) -> Result<Vec<Row>, StarliftError>;

    /// Run a statement for its side effect, discarding any rows.
    async fn execute(&self, sql: &str) -> Result<(), StarliftError> {
        self.query(sql).await.map(|_| ())
    }
}
